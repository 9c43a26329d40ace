// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/judge_crops.rs - 仅构建评估集缓存
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use shanan_judge::{
  config::JudgeConfig,
  dataset::{EvaluationSetBuilder, EvaluationSetCache, load_or_build},
};

/// 预先裁剪评估集并写入缓存
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 配置文件路径 (TOML)
  #[arg(long, value_name = "FILE")]
  pub config: PathBuf,

  /// 忽略已有缓存，重新裁剪评估集
  #[arg(long)]
  pub rebuild_cache: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  let config = JudgeConfig::load(&args.config)
    .with_context(|| format!("无法加载配置文件: {}", args.config.display()))?;

  info!("提案文件: {}", config.proposals.display());
  info!("缓存文件: {}", config.cache.display());

  let now = std::time::Instant::now();
  let builder = EvaluationSetBuilder::new(config.normalizer());
  let cache = EvaluationSetCache::new(&config.cache);
  let dataset = load_or_build(&builder, &cache, &config.sources(), args.rebuild_cache)
    .context("评估集构建失败")?;

  info!(
    "评估集就绪: {} 条记录，耗时: {:.2?}",
    dataset.len(),
    now.elapsed()
  );
  Ok(())
}
