// 该文件是 Shanan （山南西风） 项目的一部分。
// src/sample.rs - 抽样与报告行组装
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

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::Serialize;
use thiserror::Error;

use crate::{dataset::EvaluationRecord, frame::FrameError, model::ModelPredictions};

pub const DEFAULT_SAMPLE_COUNT: usize = 100;
pub const DEFAULT_SEED: u64 = 0;

#[derive(Error, Debug)]
pub enum SampleError {
  #[error("裁剪编码错误: {0}")]
  FrameError(#[from] FrameError),
  #[error("模型 {model} 缺少第 {index} 个样本的预测")]
  MissingPrediction { model: String, index: usize },
  #[error("模型 {model} 第 {index} 个样本的预测为空")]
  EmptyPrediction { model: String, index: usize },
  #[error("样本索引 {index} 超出评估集大小 {len}")]
  IndexOutOfRange { index: usize, len: usize },
}

/// 使用局部随机数生成器的确定性抽样
pub struct Sampler {
  rng: StdRng,
}

impl Sampler {
  pub fn new(seed: u64) -> Self {
    Self {
      rng: StdRng::seed_from_u64(seed),
    }
  }

  /// 打乱 `0..len` 后取前 `n` 个
  pub fn sample_indices(&mut self, len: usize, n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(&mut self.rng);
    indices.truncate(n);
    indices
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPrediction {
  pub text: String,
  pub prob: String,
}

/// 报告中的一行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
  pub png_base64: String,
  pub ground_truth: String,
  pub models: Vec<ModelPrediction>,
}

/// 交给渲染器的完整上下文
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
  pub models: Vec<String>,
  pub rows: Vec<SampleRecord>,
}

impl Report {
  pub fn new(predictions: &[ModelPredictions], rows: Vec<SampleRecord>) -> Self {
    Self {
      models: predictions
        .iter()
        .map(|p| p.model.display_name.clone())
        .collect(),
      rows,
    }
  }
}

/// 概率转为保留一位小数的百分比，舍入到最近的 0.1%（恰好一半时取偶）
pub fn format_probability(probability: f64) -> String {
  format!("{:.1}%", (probability * 1000.0).round_ties_even() / 10.0)
}

/// 按 `indices` 的顺序组装报告行，模型顺序与 `predictions` 一致
pub fn assemble(
  evaluation_set: &[EvaluationRecord],
  predictions: &[ModelPredictions],
  indices: &[usize],
) -> Result<Vec<SampleRecord>, SampleError> {
  indices
    .iter()
    .map(|&index| {
      let record = evaluation_set
        .get(index)
        .ok_or(SampleError::IndexOutOfRange {
          index,
          len: evaluation_set.len(),
        })?;

      let models = predictions
        .iter()
        .map(|p| {
          let entry = p
            .entries
            .get(index)
            .ok_or_else(|| SampleError::MissingPrediction {
              model: p.model.name.clone(),
              index,
            })?;
          let (text, probability) = entry.top().ok_or_else(|| SampleError::EmptyPrediction {
            model: p.model.name.clone(),
            index,
          })?;
          Ok(ModelPrediction {
            text: text.to_string(),
            prob: format_probability(probability),
          })
        })
        .collect::<Result<Vec<_>, SampleError>>()?;

      Ok(SampleRecord {
        png_base64: record.crop.to_png_base64()?,
        ground_truth: record.ground_truth.text.clone(),
        models,
      })
    })
    .collect()
}

pub fn sample_and_assemble(
  evaluation_set: &[EvaluationRecord],
  predictions: &[ModelPredictions],
  n: usize,
  seed: u64,
) -> Result<Vec<SampleRecord>, SampleError> {
  let indices = Sampler::new(seed).sample_indices(evaluation_set.len(), n);
  assemble(evaluation_set, predictions, &indices)
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  use crate::{
    frame::RgbFrame,
    input::GroundTruth,
    model::{ModelConfig, PredictionEntry},
  };

  fn evaluation_set(len: usize) -> Vec<EvaluationRecord> {
    (0..len)
      .map(|i| EvaluationRecord {
        crop: RgbFrame::try_from(RgbImage::from_pixel(2, 2, Rgb([i as u8, 0, 0]))).unwrap(),
        ground_truth: GroundTruth::new(format!("gt{i}")),
      })
      .collect()
  }

  fn predictions(name: &str, len: usize) -> ModelPredictions {
    ModelPredictions {
      model: ModelConfig::new(name, name.to_uppercase(), format!("{name}.jsonl")),
      entries: (0..len)
        .map(|i| PredictionEntry {
          labels: vec![format!("{name}{i}"), "other".to_string()],
          probabilities: vec![0.8734, 0.1],
        })
        .collect(),
    }
  }

  #[test]
  fn same_seed_gives_same_indices() {
    let first = Sampler::new(0).sample_indices(50, 10);
    let second = Sampler::new(0).sample_indices(50, 10);
    assert_eq!(first, second);
    assert_eq!(first.len(), 10);
  }

  #[test]
  fn oversized_n_returns_full_permutation() {
    let mut indices = Sampler::new(3).sample_indices(7, 100);
    assert_eq!(indices.len(), 7);
    indices.sort_unstable();
    assert_eq!(indices, (0..7).collect::<Vec<_>>());
  }

  #[test]
  fn prefix_of_permutation_is_stable() {
    let full = Sampler::new(11).sample_indices(30, 30);
    let head = Sampler::new(11).sample_indices(30, 5);
    assert_eq!(head, full[..5]);
  }

  #[test]
  fn probability_rounds_to_tenth_of_percent() {
    assert_eq!(format_probability(0.8734), "87.3%");
    assert_eq!(format_probability(0.8735), "87.4%");
    assert_eq!(format_probability(0.0125), "1.2%");
    assert_eq!(format_probability(1.0), "100.0%");
    assert_eq!(format_probability(0.0), "0.0%");
  }

  #[test]
  fn rows_follow_sample_and_model_order() {
    let set = evaluation_set(4);
    let preds = [predictions("b", 4), predictions("a", 4)];
    let rows = assemble(&set, &preds, &[2, 0]).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].ground_truth, "gt2");
    assert_eq!(rows[1].ground_truth, "gt0");
    assert_eq!(
      rows[0].models,
      [
        ModelPrediction {
          text: "b2".into(),
          prob: "87.3%".into()
        },
        ModelPrediction {
          text: "a2".into(),
          prob: "87.3%".into()
        },
      ]
    );
    assert!(!rows[0].png_base64.is_empty());

    let report = Report::new(&preds, rows);
    assert_eq!(report.models, ["B", "A"]);
  }

  #[test]
  fn empty_prediction_is_reported() {
    let set = evaluation_set(1);
    let mut preds = predictions("m", 1);
    preds.entries[0].labels.clear();

    let err = assemble(&set, &[preds], &[0]).unwrap_err();
    assert!(matches!(err, SampleError::EmptyPrediction { index: 0, .. }));
  }

  #[test]
  fn short_prediction_stream_is_reported() {
    let set = evaluation_set(3);
    let err = assemble(&set, &[predictions("m", 2)], &[2]).unwrap_err();
    assert!(matches!(err, SampleError::MissingPrediction { index: 2, .. }));
  }

  #[test]
  fn sample_and_assemble_is_deterministic() {
    let set = evaluation_set(10);
    let preds = [predictions("m", 10)];
    let first = sample_and_assemble(&set, &preds, 4, 0).unwrap();
    let second = sample_and_assemble(&set, &preds, 4, 0).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
  }
}
