// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::path::Path;

use image::{ImageReader, RgbImage};
use tracing::debug;

use super::{InputError, LoadImage};

/// 读取图像文件并转为 RGB8，带透明通道的图像被拒绝
pub fn read_rgb_image(path: &Path) -> Result<RgbImage, InputError> {
  let io_error = |source: std::io::Error| InputError::IoError {
    path: path.to_path_buf(),
    source,
  };

  let image = ImageReader::open(path)
    .map_err(io_error)?
    .with_guessed_format()
    .map_err(io_error)?
    .decode()
    .map_err(|source| InputError::ImageLoadError {
      path: path.to_path_buf(),
      source,
    })?;

  debug!(
    "读取图像 {}: {}x{} {:?}",
    path.display(),
    image.width(),
    image.height(),
    image.color()
  );

  if image.color().has_alpha() {
    return Err(InputError::AlphaChannel {
      path: path.to_path_buf(),
      color: image.color(),
    });
  }

  Ok(image.to_rgb8())
}

/// 从文件系统读取图像
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileLoader;

impl LoadImage for ImageFileLoader {
  fn load_image(&self, path: &Path) -> Result<RgbImage, InputError> {
    read_rgb_image(path)
  }
}
