// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use shanan_judge::config::JudgeConfig;

/// 多模型预测对比报告
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 配置文件路径 (TOML)
  #[arg(long, value_name = "FILE")]
  pub config: PathBuf,

  /// 抽样数量，覆盖配置文件
  #[arg(long, value_name = "COUNT")]
  pub sample_count: Option<usize>,

  /// 随机种子，覆盖配置文件
  #[arg(long, value_name = "SEED")]
  pub seed: Option<u64>,

  /// 输出地址，覆盖配置文件
  /// 支持格式:
  /// - html:///path/to/report.html[?template=/path/to/template.html]
  /// - json:///path/to/report.json
  /// - 普通文件路径（按扩展名选择）
  /// 相对路径（包括 template 参数）以配置文件所在目录为准
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<String>,

  /// HTML 报告模板，覆盖配置文件
  #[arg(long, value_name = "FILE")]
  pub template: Option<PathBuf>,

  /// 忽略已有缓存，重新裁剪评估集
  #[arg(long)]
  pub rebuild_cache: bool,
}

impl Args {
  /// 命令行参数优先于配置文件
  pub fn override_config(&self, config: &mut JudgeConfig) {
    if let Some(sample_count) = self.sample_count {
      config.sample_count = sample_count;
    }
    if let Some(seed) = self.seed {
      config.seed = seed;
    }
    if let Some(output) = &self.output {
      config.output = output.clone();
    }
    if let Some(template) = &self.template {
      config.template = Some(template.clone());
    }
  }
}
