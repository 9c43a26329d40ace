// 该文件是 Shanan （山南西风） 项目的一部分。
// src/dataset.rs - 评估集构建
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::{
  crop::{CropError, CropNormalizer},
  frame::RgbFrame,
  input::{
    GroundTruth, GroundTruthLine, ImageFileLoader, InputError, JsonLines, LoadImage, ProposalLine,
  },
};

mod cache;
pub use self::cache::EvaluationSetCache;

const PROGRESS_INTERVAL: usize = 100;

#[derive(Error, Debug)]
pub enum AlignmentError {
  #[error("提案文件共 {proposals} 行, 真值文件共 {ground_truth} 行")]
  LineCount { proposals: usize, ground_truth: usize },
  #[error("第 {line} 行 ({file_name}): {proposals} 个提案, {ground_truth} 个真值")]
  EntryCount {
    line: usize,
    file_name: String,
    proposals: usize,
    ground_truth: usize,
  },
}

#[derive(Error, Debug)]
pub enum DatasetError {
  #[error("输入错误: {0}")]
  InputError(#[from] InputError),
  #[error("提案与真值未对齐: {0}")]
  Alignment(#[from] AlignmentError),
  #[error(
    "图像 {file_name} 尺寸不匹配: 标注为 {expected_height}x{expected_width}, 实际为 {actual_height}x{actual_width}"
  )]
  ImageShapeMismatch {
    file_name: String,
    expected_height: u32,
    expected_width: u32,
    actual_height: u32,
    actual_width: u32,
  },
  #[error("第 {line} 行 ({file_name}) 第 {index} 个提案裁剪失败: {source}")]
  CropError {
    line: usize,
    index: usize,
    file_name: String,
    source: CropError,
  },
  #[error("缓存 I/O 错误 {}: {source}", path.display())]
  CacheIoError {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("缓存编码错误: {0}")]
  CacheEncodeError(#[from] bincode::error::EncodeError),
}

/// 评估集中的一条记录
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct EvaluationRecord {
  pub crop: RgbFrame,
  pub ground_truth: GroundTruth,
}

/// 构建评估集所需的源文件
#[derive(Debug, Clone)]
pub struct EvaluationSources {
  pub proposals: PathBuf,
  pub ground_truth: PathBuf,
  pub image_dir: PathBuf,
}

pub struct EvaluationSetBuilder<L = ImageFileLoader> {
  normalizer: CropNormalizer,
  loader: L,
}

impl EvaluationSetBuilder {
  pub fn new(normalizer: CropNormalizer) -> Self {
    Self {
      normalizer,
      loader: ImageFileLoader,
    }
  }
}

impl<L: LoadImage> EvaluationSetBuilder<L> {
  pub fn with_loader<T: LoadImage>(self, loader: T) -> EvaluationSetBuilder<T> {
    EvaluationSetBuilder {
      normalizer: self.normalizer,
      loader,
    }
  }

  pub fn normalizer(&self) -> &CropNormalizer {
    &self.normalizer
  }

  /// 按（行, 行内位置）顺序展开所有提案，任何一处不一致都使整体失败
  pub fn build(
    &self,
    proposals_path: &Path,
    ground_truth_path: &Path,
    image_dir: &Path,
  ) -> Result<Vec<EvaluationRecord>, DatasetError> {
    let proposal_lines = JsonLines::<ProposalLine>::read_all(proposals_path)?;
    let ground_truth_lines = JsonLines::<GroundTruthLine>::read_all(ground_truth_path)?;
    if proposal_lines.len() != ground_truth_lines.len() {
      return Err(
        AlignmentError::LineCount {
          proposals: proposal_lines.len(),
          ground_truth: ground_truth_lines.len(),
        }
        .into(),
      );
    }

    let total = proposal_lines.len();
    let mut records = Vec::new();
    for (i, (anno, gt_anno)) in proposal_lines
      .into_iter()
      .zip(ground_truth_lines)
      .enumerate()
    {
      let line = i + 1;
      if anno.proposals.len() != gt_anno.ground_truth.len() {
        return Err(
          AlignmentError::EntryCount {
            line,
            file_name: anno.file_name,
            proposals: anno.proposals.len(),
            ground_truth: gt_anno.ground_truth.len(),
          }
          .into(),
        );
      }

      let image = self.loader.load_image(&image_dir.join(&anno.file_name))?;
      let (actual_width, actual_height) = image.dimensions();
      if (actual_height, actual_width) != (anno.height, anno.width) {
        return Err(DatasetError::ImageShapeMismatch {
          file_name: anno.file_name,
          expected_height: anno.height,
          expected_width: anno.width,
          actual_height,
          actual_width,
        });
      }

      for (index, (proposal, ground_truth)) in anno
        .proposals
        .iter()
        .zip(gt_anno.ground_truth)
        .enumerate()
      {
        let crop = self
          .normalizer
          .normalize(&image, proposal.adjusted_bbox)
          .map_err(|source| DatasetError::CropError {
            line,
            index,
            file_name: anno.file_name.clone(),
            source,
          })?;
        records.push(EvaluationRecord { crop, ground_truth });
      }

      if i % PROGRESS_INTERVAL == 0 {
        info!("裁剪进度: {} / {}", i, total);
      }
    }

    info!("评估集构建完成: {} 行, {} 条记录", total, records.len());
    Ok(records)
  }
}

/// 缓存新鲜时直接读取，否则重新构建并覆盖缓存
pub fn load_or_build<L: LoadImage>(
  builder: &EvaluationSetBuilder<L>,
  cache: &EvaluationSetCache,
  sources: &EvaluationSources,
  force_rebuild: bool,
) -> Result<Vec<EvaluationRecord>, DatasetError> {
  if !force_rebuild
    && let Some(records) = cache.load_if_fresh(&sources.proposals, builder.normalizer())?
  {
    info!(
      "使用评估集缓存 {}: {} 条记录",
      cache.path().display(),
      records.len()
    );
    return Ok(records);
  }

  info!("正在创建评估集缓存 {}", cache.path().display());
  let records = builder.build(&sources.proposals, &sources.ground_truth, &sources.image_dir)?;
  cache.store(&records, builder.normalizer())?;
  Ok(records)
}
