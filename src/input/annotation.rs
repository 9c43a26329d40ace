// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/annotation.rs - 提案与真值标注
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

use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::Value;

use crate::crop::BoundingBox;

/// 单个提案，检测器的其余元数据忽略
#[derive(Debug, Clone, Deserialize)]
pub struct Proposal {
  pub adjusted_bbox: BoundingBox,
}

/// 提案文件中的一行，对应一张图像
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalLine {
  pub file_name: String,
  pub height: u32,
  pub width: u32,
  pub proposals: Vec<Proposal>,
}

/// 真值文件中的一行，与提案文件逐行对应
#[derive(Debug, Clone, Deserialize)]
pub struct GroundTruthLine {
  pub ground_truth: Vec<GroundTruth>,
}

/// 真值条目，`raw` 保存原始 JSON 对象
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct GroundTruth {
  pub text: String,
  pub raw: String,
}

impl GroundTruth {
  pub fn new(text: impl Into<String>) -> Self {
    let text = text.into();
    let raw = serde_json::json!({ "text": text }).to_string();
    Self { text, raw }
  }
}

impl<'de> Deserialize<'de> for GroundTruth {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let value = Value::deserialize(deserializer)?;
    let text = value
      .get("text")
      .and_then(Value::as_str)
      .ok_or_else(|| D::Error::missing_field("text"))?
      .to_string();
    Ok(Self {
      text,
      raw: value.to_string(),
    })
  }
}
