// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 待比较模型及其预测
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

use thiserror::Error;

use crate::input::InputError;

mod predictions;
pub use self::predictions::PredictionStream;

#[derive(Error, Debug)]
pub enum PredictionError {
  #[error("输入错误: {0}")]
  InputError(#[from] InputError),
  #[error("模型 {model} 的预测数量为 {actual}, 评估集大小为 {expected}")]
  CountMismatch {
    model: String,
    expected: usize,
    actual: usize,
  },
}

/// 模型描述，由配置给出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
  pub name: String,
  pub display_name: String,
  pub predictions: PathBuf,
}

impl ModelConfig {
  pub fn new(
    name: impl Into<String>,
    display_name: impl Into<String>,
    predictions: impl Into<PathBuf>,
  ) -> Self {
    Self {
      name: name.into(),
      display_name: display_name.into(),
      predictions: predictions.into(),
    }
  }
}

/// 单个样本的排序预测，`labels` 与 `probabilities` 一一对应
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionEntry {
  pub labels: Vec<String>,
  pub probabilities: Vec<f64>,
}

impl PredictionEntry {
  /// 排名第一的标签及其概率
  pub fn top(&self) -> Option<(&str, f64)> {
    Some((self.labels.first()?.as_str(), *self.probabilities.first()?))
  }
}

/// 与评估集逐条对齐的模型预测
#[derive(Debug, Clone)]
pub struct ModelPredictions {
  pub model: ModelConfig,
  pub entries: Vec<PredictionEntry>,
}

impl ModelPredictions {
  pub fn load(model: ModelConfig, expected_count: usize) -> Result<Self, PredictionError> {
    let entries = PredictionStream::load(&model, expected_count)?;
    Ok(Self { model, entries })
  }
}
