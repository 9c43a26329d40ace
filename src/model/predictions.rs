// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/predictions.rs - 预测文件读取与对齐
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

use serde::Deserialize;
use tracing::info;

use super::{ModelConfig, PredictionEntry, PredictionError};
use crate::input::JsonLines;

/// 预测文件中的一行，可包含多个样本
#[derive(Debug, Deserialize)]
struct PredictionLine {
  predictions: Vec<Vec<String>>,
  probabilities: Vec<Vec<f64>>,
}

pub struct PredictionStream;

impl PredictionStream {
  /// 展开所有行的预测，数量必须与评估集一致
  pub fn load(
    model: &ModelConfig,
    expected_count: usize,
  ) -> Result<Vec<PredictionEntry>, PredictionError> {
    let mut entries = Vec::with_capacity(expected_count);
    for line in JsonLines::<PredictionLine>::open(&model.predictions)? {
      let line = line?;
      entries.extend(
        line
          .predictions
          .into_iter()
          .zip(line.probabilities)
          .map(|(labels, probabilities)| PredictionEntry {
            labels,
            probabilities,
          }),
      );
    }

    if entries.len() != expected_count {
      return Err(PredictionError::CountMismatch {
        model: model.name.clone(),
        expected: expected_count,
        actual: entries.len(),
      });
    }

    info!(
      "模型 {} ({}) 预测加载完成: {} 条",
      model.display_name,
      model.name,
      entries.len()
    );
    Ok(entries)
  }
}
