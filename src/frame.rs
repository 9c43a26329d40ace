// 该文件是 Shanan （山南西风） 项目的一部分。
// src/frame.rs - 方形 RGB 裁剪帧定义
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

use std::io::Cursor;

use base64::Engine;
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use thiserror::Error;

const RGB_CHANNELS: usize = 3;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("裁剪帧必须为方形: 实际尺寸 {width}x{height}")]
  NotSquare { width: u32, height: u32 },
  #[error("PNG 编码错误: {0}")]
  EncodeError(#[from] image::ImageError),
}

pub trait ToRgbImage {
  fn to_rgb_image(&self) -> RgbImage;
}

/// NHWC 排布的方形 RGB 帧
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct RgbFrame {
  side: u32,
  data: Vec<u8>,
}

impl RgbFrame {
  pub fn side(&self) -> u32 {
    self.side
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn as_nhwc(&self) -> &[u8] {
    &self.data
  }

  /// 取 (x, y) 处像素
  pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
    if x >= self.side || y >= self.side {
      return None;
    }
    let idx = (y as usize * self.side as usize + x as usize) * RGB_CHANNELS;
    Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
  }

  /// 编码为 PNG 后再转为 base64 文本，可直接嵌入 `data:image/png;base64,` 中
  pub fn to_png_base64(&self) -> Result<String, FrameError> {
    let mut bytes = Vec::new();
    self
      .to_rgb_image()
      .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
  }
}

impl TryFrom<RgbImage> for RgbFrame {
  type Error = FrameError;

  fn try_from(image: RgbImage) -> Result<Self, Self::Error> {
    let (width, height) = image.dimensions();
    if width != height {
      return Err(FrameError::NotSquare { width, height });
    }

    Ok(Self {
      side: width,
      data: image.into_raw(),
    })
  }
}

impl ToRgbImage for RgbFrame {
  fn to_rgb_image(&self) -> RgbImage {
    let side = self.side as usize;
    let data = self.as_nhwc();

    ImageBuffer::from_fn(self.side, self.side, |x, y| {
      let idx = (y as usize * side + x as usize) * RGB_CHANNELS;
      Rgb([data[idx], data[idx + 1], data[idx + 2]])
    })
  }
}
