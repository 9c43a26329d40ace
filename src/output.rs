// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 报告输出定义
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
use url::Url;

use crate::FromUrl;
#[cfg(any(feature = "html_report", feature = "json_record"))]
use crate::FromUrlWithScheme;
use crate::sample::Report;

pub trait Render<R>: Sized {
  type Error;
  fn render_result(&self, report: &R) -> Result<(), Self::Error>;
}

#[cfg(feature = "html_report")]
mod html_report;
#[cfg(feature = "html_report")]
pub use self::html_report::{HtmlReportError, HtmlReportOutput};

#[cfg(feature = "json_record")]
mod json_record;
#[cfg(feature = "json_record")]
pub use self::json_record::{JsonRecordError, JsonRecordOutput};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "html_report")]
  #[error("HTML 报告输出错误: {0}")]
  HtmlReportError(#[from] HtmlReportError),
  #[cfg(feature = "json_record")]
  #[error("JSON 记录输出错误: {0}")]
  JsonRecordError(#[from] JsonRecordError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  #[cfg(feature = "html_report")]
  HtmlReportOutput(HtmlReportOutput),
  #[cfg(feature = "json_record")]
  JsonRecordOutput(JsonRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "html_report")]
      HtmlReportOutput::SCHEME => {
        let output = HtmlReportOutput::from_url(url)?;
        Ok(OutputWrapper::HtmlReportOutput(output))
      }
      #[cfg(feature = "json_record")]
      JsonRecordOutput::SCHEME => {
        let output = JsonRecordOutput::from_url(url)?;
        Ok(OutputWrapper::JsonRecordOutput(output))
      }
      scheme => Err(OutputError::SchemeMismatch(scheme.to_string())),
    }
  }
}

impl OutputWrapper {
  /// 替换 HTML 报告模板，对其他输出无效
  pub fn with_template(self, template: Option<PathBuf>) -> Self {
    match self {
      #[cfg(feature = "html_report")]
      OutputWrapper::HtmlReportOutput(output) if template.is_some() => {
        OutputWrapper::HtmlReportOutput(output.with_template(template))
      }
      other => other,
    }
  }

  pub fn path(&self) -> &Path {
    match self {
      #[cfg(feature = "html_report")]
      OutputWrapper::HtmlReportOutput(output) => output.path(),
      #[cfg(feature = "json_record")]
      OutputWrapper::JsonRecordOutput(output) => output.path(),
    }
  }
}

impl Render<Report> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, report: &Report) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "html_report")]
      OutputWrapper::HtmlReportOutput(output) => {
        output.render_result(report).map_err(OutputError::from)
      }
      #[cfg(feature = "json_record")]
      OutputWrapper::JsonRecordOutput(output) => {
        output.render_result(report).map_err(OutputError::from)
      }
    }
  }
}

/// 确保输出文件的父目录存在
fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("rtsp://localhost/report").unwrap();
    let err = OutputWrapper::from_url(&url).err().unwrap();
    assert!(matches!(err, OutputError::SchemeMismatch(ref s) if s == "rtsp"));
  }

  #[cfg(all(feature = "html_report", feature = "json_record"))]
  #[test]
  fn scheme_selects_output() {
    let html = OutputWrapper::from_url(&Url::parse("html:///tmp/out/report.html").unwrap()).unwrap();
    assert!(matches!(html, OutputWrapper::HtmlReportOutput(_)));
    assert_eq!(html.path(), Path::new("/tmp/out/report.html"));

    let json = OutputWrapper::from_url(&Url::parse("json:///tmp/out/report.json").unwrap()).unwrap();
    assert!(matches!(json, OutputWrapper::JsonRecordOutput(_)));
  }
}
