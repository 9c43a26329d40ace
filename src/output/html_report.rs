// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/html_report.rs - HTML 对比报告
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

use minijinja::Environment;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, output::Render, path_from_url, sample::Report};

const DEFAULT_TEMPLATE: &str = include_str!("../../assets/predictions_compare.html");
// 以 .html 结尾时 minijinja 默认开启 HTML 转义
const TEMPLATE_NAME: &str = "predictions_compare.html";

#[derive(Error, Debug)]
pub enum HtmlReportError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("模板错误: {0}")]
  TemplateError(#[from] minijinja::Error),
  #[error("路径编码错误: {0}")]
  PathError(#[from] std::string::FromUtf8Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub struct HtmlReportOutput {
  path: PathBuf,
  template: Option<PathBuf>,
}

impl FromUrlWithScheme for HtmlReportOutput {
  const SCHEME: &'static str = "html";
}

impl FromUrl for HtmlReportOutput {
  type Error = HtmlReportError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(HtmlReportError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let template = uri
      .query_pairs()
      .find(|(k, _)| k == "template")
      .map(|(_, v)| PathBuf::from(v.into_owned()));

    Ok(HtmlReportOutput {
      path: path_from_url(uri)?,
      template,
    })
  }
}

impl HtmlReportOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      template: None,
    }
  }

  pub fn with_template(mut self, template: Option<PathBuf>) -> Self {
    self.template = template;
    self
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn render_html(&self, report: &Report) -> Result<String, HtmlReportError> {
    let source = match &self.template {
      Some(path) => std::fs::read_to_string(path)?,
      None => DEFAULT_TEMPLATE.to_string(),
    };

    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, &source)?;
    let html = env.get_template(TEMPLATE_NAME)?.render(report)?;
    Ok(html)
  }
}

impl Render<Report> for HtmlReportOutput {
  type Error = HtmlReportError;

  fn render_result(&self, report: &Report) -> Result<(), Self::Error> {
    let html = self.render_html(report)?;
    super::ensure_parent_dir(&self.path)?;
    std::fs::write(&self.path, html)?;

    warn!(
      "保存报告到文件: {} ({} 行, {} 个模型)",
      self.path.display(),
      report.rows.len(),
      report.models.len()
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  use crate::sample::{ModelPrediction, SampleRecord};

  fn report() -> Report {
    Report {
      models: vec!["AlexNet".into(), "OverFeat".into()],
      rows: vec![SampleRecord {
        png_base64: "iVBORw0KGgo=".into(),
        ground_truth: "<山>".into(),
        models: vec![
          ModelPrediction {
            text: "<山>".into(),
            prob: "87.3%".into(),
          },
          ModelPrediction {
            text: "出".into(),
            prob: "12.0%".into(),
          },
        ],
      }],
    }
  }

  #[test]
  fn default_template_renders_rows() {
    let html = HtmlReportOutput::new("unused.html")
      .render_html(&report())
      .unwrap();
    assert!(html.contains("AlexNet"));
    assert!(html.contains("OverFeat"));
    assert!(html.contains("data:image/png;base64,iVBORw0KGgo="));
    assert!(html.contains("87.3%"));
    assert!(html.contains("&lt;山&gt;"));
    assert!(!html.contains("<山>"));
  }

  #[test]
  fn custom_template_from_query() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("t.html");
    std::fs::write(
      &template,
      "{% for row in rows %}{{ row.ground_truth }}={% for m in row.models %}{{ m.prob }};{% endfor %}{% endfor %}",
    )
    .unwrap();
    let out = dir.path().join("sub").join("report.html");
    let url = Url::parse(&format!(
      "html://{}?template={}",
      out.display(),
      template.display()
    ))
    .unwrap();

    let output = HtmlReportOutput::from_url(&url).unwrap();
    output.render_result(&report()).unwrap();

    let html = std::fs::read_to_string(&out).unwrap();
    assert_eq!(html, "&lt;山&gt;=87.3%;12.0%;");
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("json:///tmp/report.json").unwrap();
    assert!(matches!(
      HtmlReportOutput::from_url(&url),
      Err(HtmlReportError::SchemeMismatch(_))
    ));
  }
}
