// 该文件是 Shanan （山南西风） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use shanan_judge::{
  FromUrl,
  config::JudgeConfig,
  dataset::{EvaluationSetBuilder, EvaluationSetCache, load_or_build},
  output::OutputWrapper,
  task::{CompareTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();
  let mut config = JudgeConfig::load(&args.config)
    .with_context(|| format!("无法加载配置文件: {}", args.config.display()))?;
  args.override_config(&mut config);

  info!("提案文件: {}", config.proposals.display());
  info!("真值文件: {}", config.ground_truth.display());
  info!("图像目录: {}", config.image_dir.display());
  info!("缓存文件: {}", config.cache.display());
  info!(
    "抽样数量: {}, 随机种子: {}, 裁剪边长上限: {}, 扩展比例: {}",
    config.sample_count, config.seed, config.crop.max_side, config.crop.expand
  );

  let output_url = config.output_url()?;
  info!("输出地址: {}", output_url);
  let output = OutputWrapper::from_url(&output_url)?.with_template(config.template.clone());

  let builder = EvaluationSetBuilder::new(config.normalizer());
  let cache = EvaluationSetCache::new(&config.cache);
  let dataset = load_or_build(&builder, &cache, &config.sources(), args.rebuild_cache)
    .context("评估集构建失败")?;

  let models = config.model_configs();
  for model in &models {
    info!(
      "模型 {} ({}): {}",
      model.display_name,
      model.name,
      model.predictions.display()
    );
  }

  CompareTask::default()
    .with_sample_count(config.sample_count)
    .with_seed(config.seed)
    .run_task(dataset.as_slice(), models.as_slice(), output)?;

  info!("处理完成!");
  Ok(())
}
