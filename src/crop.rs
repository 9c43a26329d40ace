// 该文件是 Shanan （山南西风） 项目的一部分。
// src/crop.rs - 提案框到方形裁剪的归一化
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

use image::{
  Rgb, RgbImage,
  imageops::{self, FilterType},
};
use serde::Deserialize;
use thiserror::Error;

use crate::frame::{FrameError, RgbFrame};

/// 图像外区域的填充灰度
pub const PADDING_VALUE: u8 = 128;
pub const DEFAULT_MAX_SIDE: u32 = 32;
pub const DEFAULT_EXPAND: f64 = 0.0;
/// 方形裁剪在缩放前的最大边长，更大的方框视为无效
pub const MAX_CROP_SIDE: u32 = 16384;
// 超出此范围的坐标无法精确对应到整数像素
const MAX_COORDINATE: f64 = 9_007_199_254_740_992.0;

#[derive(Error, Debug)]
pub enum CropError {
  #[error("无效的边界框: ({x}, {y}, {width}x{height})")]
  InvalidBoundingBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
  },
  #[error(
    "裁剪区域完全位于图像之外: 方框 x=[{x_lo}, {x_hi}), y=[{y_lo}, {y_hi}), 图像 {image_width}x{image_height}"
  )]
  EmptyCrop {
    x_lo: i64,
    y_lo: i64,
    x_hi: i64,
    y_hi: i64,
    image_width: u32,
    image_height: u32,
  },
  #[error("帧错误: {0}")]
  FrameError(#[from] FrameError),
}

/// 图像像素坐标下的边界框，JSON 中写作 `[x, y, w, h]`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 4]")]
pub struct BoundingBox {
  pub x: f64,
  pub y: f64,
  pub width: f64,
  pub height: f64,
}

impl BoundingBox {
  pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// 每边向外扩张自身尺寸的 `expand` 倍
  pub fn expanded(&self, expand: f64) -> Self {
    Self {
      x: self.x - self.width * expand,
      y: self.y - self.height * expand,
      width: self.width + self.width * expand * 2.0,
      height: self.height + self.height * expand * 2.0,
    }
  }

  fn is_finite(&self) -> bool {
    [self.x, self.y, self.width, self.height]
      .iter()
      .all(|v| v.is_finite())
  }
}

impl From<[f64; 4]> for BoundingBox {
  fn from([x, y, width, height]: [f64; 4]) -> Self {
    Self::new(x, y, width, height)
  }
}

/// 整数像素方框，左闭右开
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelBox {
  x_lo: i64,
  y_lo: i64,
  x_hi: i64,
  y_hi: i64,
}

impl PixelBox {
  fn width(&self) -> i64 {
    self.x_hi - self.x_lo
  }

  fn height(&self) -> i64 {
    self.y_hi - self.y_lo
  }

  fn is_empty(&self) -> bool {
    self.x_lo >= self.x_hi || self.y_lo >= self.y_hi
  }
}

/// 裁剪归一化参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropNormalizer {
  expand: f64,
  max_side: u32,
}

impl Default for CropNormalizer {
  fn default() -> Self {
    Self {
      expand: DEFAULT_EXPAND,
      max_side: DEFAULT_MAX_SIDE,
    }
  }
}

impl CropNormalizer {
  pub fn with_expand(mut self, expand: f64) -> Self {
    self.expand = expand;
    self
  }

  pub fn with_max_side(mut self, max_side: u32) -> Self {
    self.max_side = max_side;
    self
  }

  pub fn expand(&self) -> f64 {
    self.expand
  }

  pub fn max_side(&self) -> u32 {
    self.max_side
  }

  /// 裁剪并在超过 `max_side` 时缩放，输出边长不超过 `max_side`
  pub fn normalize(&self, image: &RgbImage, bbox: BoundingBox) -> Result<RgbFrame, CropError> {
    let cropped = self.square_crop(image, bbox)?;
    let cropped = if cropped.width() > self.max_side {
      imageops::resize(&cropped, self.max_side, self.max_side, FilterType::Triangle)
    } else {
      cropped
    };
    Ok(RgbFrame::try_from(cropped)?)
  }

  /// 缩放前的方形裁剪，图像外的部分填充为 [`PADDING_VALUE`]
  pub fn square_crop(&self, image: &RgbImage, bbox: BoundingBox) -> Result<RgbImage, CropError> {
    let bbox = bbox.expanded(self.expand);
    let invalid = || CropError::InvalidBoundingBox {
      x: bbox.x,
      y: bbox.y,
      width: bbox.width,
      height: bbox.height,
    };
    if !bbox.is_finite() {
      return Err(invalid());
    }
    let (x_end, y_end) = (bbox.x + bbox.width, bbox.y + bbox.height);
    if [bbox.x, bbox.y, x_end, y_end]
      .iter()
      .any(|v| v.abs() >= MAX_COORDINATE)
    {
      return Err(invalid());
    }

    let mut square = PixelBox {
      x_lo: bbox.x.floor() as i64,
      y_lo: bbox.y.floor() as i64,
      x_hi: x_end.ceil() as i64,
      y_hi: y_end.ceil() as i64,
    };
    if square.is_empty() {
      return Err(invalid());
    }

    // 宽高相等时以宽为准，短边绕自身中点扩展
    if square.width() >= square.height() {
      let side = square.width();
      square.y_lo = (bbox.y + bbox.height / 2.0 - side as f64 / 2.0).round_ties_even() as i64;
      square.y_hi = square.y_lo + side;
    } else {
      let side = square.height();
      square.x_lo = (bbox.x + bbox.width / 2.0 - side as f64 / 2.0).round_ties_even() as i64;
      square.x_hi = square.x_lo + side;
    }
    let side = u32::try_from(square.width()).map_err(|_| invalid())?;
    if side > MAX_CROP_SIDE {
      return Err(invalid());
    }

    let (image_width, image_height) = image.dimensions();
    let clipped = PixelBox {
      x_lo: square.x_lo.max(0),
      y_lo: square.y_lo.max(0),
      x_hi: square.x_hi.min(image_width as i64),
      y_hi: square.y_hi.min(image_height as i64),
    };
    if clipped.is_empty() {
      return Err(CropError::EmptyCrop {
        x_lo: square.x_lo,
        y_lo: square.y_lo,
        x_hi: square.x_hi,
        y_hi: square.y_hi,
        image_width,
        image_height,
      });
    }

    let region = imageops::crop_imm(
      image,
      clipped.x_lo as u32,
      clipped.y_lo as u32,
      clipped.width() as u32,
      clipped.height() as u32,
    )
    .to_image();

    let mut cropped = RgbImage::from_pixel(side, side, Rgb([PADDING_VALUE; 3]));
    imageops::replace(
      &mut cropped,
      &region,
      clipped.x_lo - square.x_lo,
      clipped.y_lo - square.y_lo,
    );
    Ok(cropped)
  }
}
