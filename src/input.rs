// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input.rs - 标注/预测/图像输入
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

use image::RgbImage;
use thiserror::Error;

mod annotation;
mod json_lines;
mod read_image_file;

pub use self::annotation::{GroundTruth, GroundTruthLine, Proposal, ProposalLine};
pub use self::json_lines::JsonLines;
pub use self::read_image_file::{ImageFileLoader, read_rgb_image};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("I/O 错误 {}: {source}", path.display())]
  IoError {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("{}:{line} JSON 解析错误: {source}", path.display())]
  JsonError {
    path: PathBuf,
    line: usize,
    source: serde_json::Error,
  },
  #[error("图像加载错误 {}: {source}", path.display())]
  ImageLoadError {
    path: PathBuf,
    source: image::ImageError,
  },
  #[error("图像 {} 含透明通道 ({color:?}), 仅接受 RGB 或灰度图像", path.display())]
  AlphaChannel {
    path: PathBuf,
    color: image::ColorType,
  },
}

/// 图像解码接口，评估集构建时按文件名取图
pub trait LoadImage {
  fn load_image(&self, path: &Path) -> Result<RgbImage, InputError>;
}
