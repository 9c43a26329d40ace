// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/json_record.rs - JSON 报告记录
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

use std::{
  fs::File,
  io::{BufWriter, Write},
  path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, output::Render, path_from_url, sample::Report};

#[derive(Error, Debug)]
pub enum JsonRecordError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("路径编码错误: {0}")]
  PathError(#[from] std::string::FromUtf8Error),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 将报告上下文原样写为 JSON
pub struct JsonRecordOutput {
  path: PathBuf,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonRecordError::SchemeMismatch);
    }

    Ok(JsonRecordOutput {
      path: path_from_url(uri)?,
    })
  }
}

impl JsonRecordOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Render<Report> for JsonRecordOutput {
  type Error = JsonRecordError;

  fn render_result(&self, report: &Report) -> Result<(), Self::Error> {
    super::ensure_parent_dir(&self.path)?;
    let mut writer = BufWriter::new(File::create(&self.path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;

    warn!("保存报告记录到文件: {}", self.path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{Value, json};
  use tempfile::tempdir;

  use crate::sample::{ModelPrediction, SampleRecord};

  #[test]
  fn writes_report_context() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("report.json");
    let report = Report {
      models: vec!["AlexNet".into()],
      rows: vec![SampleRecord {
        png_base64: "AAAA".into(),
        ground_truth: "山".into(),
        models: vec![ModelPrediction {
          text: "山".into(),
          prob: "99.0%".into(),
        }],
      }],
    };

    JsonRecordOutput::new(&path).render_result(&report).unwrap();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
      written,
      json!({
        "models": ["AlexNet"],
        "rows": [{
          "png_base64": "AAAA",
          "ground_truth": "山",
          "models": [{"text": "山", "prob": "99.0%"}]
        }]
      })
    );
  }

  #[test]
  fn percent_encoded_path_is_decoded() {
    let url = Url::parse("json:///tmp/my%20report.json").unwrap();
    let output = JsonRecordOutput::from_url(&url).unwrap();
    assert_eq!(output.path(), Path::new("/tmp/my report.json"));
  }
}
