// 该文件是 Shanan （山南西风） 项目的一部分。
// src/config.rs - 配置文件
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
  collections::HashSet,
  path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::{
  crop::{CropNormalizer, DEFAULT_EXPAND, DEFAULT_MAX_SIDE},
  dataset::EvaluationSources,
  model::ModelConfig,
  sample::{DEFAULT_SAMPLE_COUNT, DEFAULT_SEED},
};

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("无法读取配置文件 {}: {source}", path.display())]
  IoError {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("配置解析错误: {0}")]
  TomlError(#[from] toml::de::Error),
  #[error("输出地址错误 {target}: {source}")]
  UrlError {
    target: String,
    source: url::ParseError,
  },
  #[error("配置无效: {0}")]
  Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CropConfig {
  #[serde(default = "default_max_side")]
  pub max_side: u32,
  #[serde(default)]
  pub expand: f64,
}

fn default_max_side() -> u32 {
  DEFAULT_MAX_SIDE
}

fn default_sample_count() -> usize {
  DEFAULT_SAMPLE_COUNT
}

fn default_seed() -> u64 {
  DEFAULT_SEED
}

impl Default for CropConfig {
  fn default() -> Self {
    Self {
      max_side: DEFAULT_MAX_SIDE,
      expand: DEFAULT_EXPAND,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
  pub name: String,
  pub display_name: String,
  /// 缺省时为 `predictions_dir/predictions_{name}.jsonl`
  #[serde(default)]
  pub predictions: Option<PathBuf>,
}

/// 一次对比运行的全部配置
///
/// ```toml
/// proposals = "data/test_cls.jsonl"
/// ground_truth = "data/test_cls.gt.jsonl"
/// image_dir = "data/images"
/// cache = "products/test_cropped.bin"
/// output = "products/predictions.html"
/// predictions_dir = "../benchmark/products"
///
/// [[models]]
/// name = "alexnet_v2"
/// display_name = "AlexNet"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JudgeConfig {
  pub proposals: PathBuf,
  pub ground_truth: PathBuf,
  pub image_dir: PathBuf,
  pub cache: PathBuf,
  /// `html://`、`json://` 地址或普通文件路径
  pub output: String,
  #[serde(default)]
  pub template: Option<PathBuf>,
  #[serde(default = "default_sample_count")]
  pub sample_count: usize,
  #[serde(default = "default_seed")]
  pub seed: u64,
  #[serde(default)]
  pub crop: CropConfig,
  #[serde(default)]
  pub predictions_dir: Option<PathBuf>,
  pub models: Vec<ModelEntry>,
  #[serde(skip)]
  base_dir: PathBuf,
}

impl JudgeConfig {
  /// 读取配置文件，相对路径以配置文件所在目录为准
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
      path: path.to_path_buf(),
      source,
    })?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    Self::from_toml_str(&content, base_dir)
  }

  pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
    let mut config: JudgeConfig = toml::from_str(content)?;
    config.base_dir = base_dir.to_path_buf();
    config.resolve_paths();
    config.validate()?;
    Ok(config)
  }

  fn resolve(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.base_dir.join(path)
    }
  }

  fn resolve_paths(&mut self) {
    self.proposals = self.resolve(&self.proposals);
    self.ground_truth = self.resolve(&self.ground_truth);
    self.image_dir = self.resolve(&self.image_dir);
    self.cache = self.resolve(&self.cache);
    self.template = self.template.as_deref().map(|p| self.resolve(p));
    self.predictions_dir = self.predictions_dir.as_deref().map(|p| self.resolve(p));
    let models = self
      .models
      .iter()
      .map(|m| ModelEntry {
        predictions: m.predictions.as_deref().map(|p| self.resolve(p)),
        ..m.clone()
      })
      .collect();
    self.models = models;
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.models.is_empty() {
      return Err(ConfigError::Invalid("至少需要一个模型".to_string()));
    }

    let mut names = HashSet::new();
    for model in &self.models {
      if !names.insert(model.name.as_str()) {
        return Err(ConfigError::Invalid(format!("模型名称重复: {}", model.name)));
      }
      if model.predictions.is_none() && self.predictions_dir.is_none() {
        return Err(ConfigError::Invalid(format!(
          "模型 {} 未指定预测文件, 且未设置 predictions_dir",
          model.name
        )));
      }
    }

    if self.crop.max_side == 0 {
      return Err(ConfigError::Invalid("crop.max_side 必须大于 0".to_string()));
    }
    if !self.crop.expand.is_finite() || self.crop.expand < 0.0 {
      return Err(ConfigError::Invalid(format!(
        "crop.expand 必须为非负有限数: {}",
        self.crop.expand
      )));
    }
    Ok(())
  }

  pub fn normalizer(&self) -> CropNormalizer {
    CropNormalizer::default()
      .with_max_side(self.crop.max_side)
      .with_expand(self.crop.expand)
  }

  pub fn sources(&self) -> EvaluationSources {
    EvaluationSources {
      proposals: self.proposals.clone(),
      ground_truth: self.ground_truth.clone(),
      image_dir: self.image_dir.clone(),
    }
  }

  /// 按配置顺序给出模型描述
  pub fn model_configs(&self) -> Vec<ModelConfig> {
    self
      .models
      .iter()
      .map(|m| {
        let predictions = match (&m.predictions, &self.predictions_dir) {
          (Some(path), _) => path.clone(),
          (None, Some(dir)) => dir.join(format!("predictions_{}.jsonl", m.name)),
          // validate 已排除
          (None, None) => PathBuf::from(format!("predictions_{}.jsonl", m.name)),
        };
        ModelConfig::new(&m.name, &m.display_name, predictions)
      })
      .collect()
  }

  /// `template` 查询参数与 `template` 字段一样按配置文件所在目录解析
  fn resolve_template_query(&self, mut url: Url) -> Url {
    let pairs: Vec<(String, String)> = url
      .query_pairs()
      .map(|(key, value)| {
        let value = if key == "template" {
          self.resolve(Path::new(value.as_ref())).to_string_lossy().into_owned()
        } else {
          value.into_owned()
        };
        (key.into_owned(), value)
      })
      .collect();
    if !pairs.is_empty() {
      url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url
  }

  /// 输出地址；普通路径按扩展名选择 `json` 或 `html`
  pub fn output_url(&self) -> Result<Url, ConfigError> {
    let url_error = |source: url::ParseError| ConfigError::UrlError {
      target: self.output.clone(),
      source,
    };

    match Url::parse(&self.output) {
      // 单字母方案是 Windows 盘符
      Ok(url) if url.scheme().len() > 1 => Ok(self.resolve_template_query(url)),
      Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
        let path = self.resolve(Path::new(&self.output));
        let path = std::path::absolute(&path).map_err(|source| ConfigError::IoError {
          path: path.clone(),
          source,
        })?;
        let scheme = match path.extension().and_then(|e| e.to_str()) {
          Some("json") => "json",
          _ => "html",
        };
        let mut url = Url::parse(&format!("{scheme}:///")).map_err(url_error)?;
        url.set_path(&path.to_string_lossy());
        Ok(url)
      }
      Err(source) => Err(url_error(source)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const MINIMAL: &str = r#"
    proposals = "data/proposals.jsonl"
    ground_truth = "data/gt.jsonl"
    image_dir = "/srv/images"
    cache = "products/cropped.bin"
    output = "products/predictions.html"
    predictions_dir = "../benchmark/products"

    [[models]]
    name = "alexnet_v2"
    display_name = "AlexNet"

    [[models]]
    name = "overfeat"
    display_name = "OverFeat"
    predictions = "custom/overfeat.jsonl"
  "#;

  #[test]
  fn defaults_are_applied() {
    let config = JudgeConfig::from_toml_str(MINIMAL, Path::new("/work")).unwrap();
    assert_eq!(config.sample_count, 100);
    assert_eq!(config.seed, 0);
    assert_eq!(config.crop, CropConfig::default());
    assert_eq!(config.normalizer(), CropNormalizer::default());
  }

  #[test]
  fn relative_paths_resolve_against_config_dir() {
    let config = JudgeConfig::from_toml_str(MINIMAL, Path::new("/work")).unwrap();
    assert_eq!(config.proposals, Path::new("/work/data/proposals.jsonl"));
    assert_eq!(config.image_dir, Path::new("/srv/images"));

    let models = config.model_configs();
    assert_eq!(
      models,
      [
        ModelConfig::new(
          "alexnet_v2",
          "AlexNet",
          "/work/../benchmark/products/predictions_alexnet_v2.jsonl"
        ),
        ModelConfig::new("overfeat", "OverFeat", "/work/custom/overfeat.jsonl"),
      ]
    );
  }

  #[test]
  fn plain_output_path_becomes_html_url() {
    let config = JudgeConfig::from_toml_str(MINIMAL, Path::new("/work")).unwrap();
    let url = config.output_url().unwrap();
    assert_eq!(url.scheme(), "html");
    assert_eq!(url.path(), "/work/products/predictions.html");
  }

  #[test]
  fn explicit_output_url_is_kept() {
    let content = MINIMAL.replace(
      "output = \"products/predictions.html\"",
      "output = \"json:///tmp/report.json\"",
    );
    let config = JudgeConfig::from_toml_str(&content, Path::new("/work")).unwrap();
    assert_eq!(config.output_url().unwrap().as_str(), "json:///tmp/report.json");
  }

  #[test]
  fn relative_template_query_resolves_against_config_dir() {
    for (template, expected) in [
      ("tpl/report.html", "/work/tpl/report.html"),
      ("/srv/tpl/report.html", "/srv/tpl/report.html"),
    ] {
      let content = MINIMAL.replace(
        "output = \"products/predictions.html\"",
        &format!("output = \"html:///tmp/report.html?template={template}\""),
      );
      let config = JudgeConfig::from_toml_str(&content, Path::new("/work")).unwrap();
      let url = config.output_url().unwrap();
      assert_eq!(url.path(), "/tmp/report.html");
      let resolved = url
        .query_pairs()
        .find(|(k, _)| k == "template")
        .map(|(_, v)| v.into_owned());
      assert_eq!(resolved.as_deref(), Some(expected));
    }
  }

  #[test]
  fn duplicate_model_is_rejected() {
    let content = MINIMAL.replace("name = \"overfeat\"", "name = \"alexnet_v2\"");
    let err = JudgeConfig::from_toml_str(&content, Path::new("/work")).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
  }

  #[test]
  fn missing_prediction_path_is_rejected() {
    let content = MINIMAL.replace("predictions_dir = \"../benchmark/products\"", "");
    let err = JudgeConfig::from_toml_str(&content, Path::new("/work")).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("alexnet_v2")));
  }

  #[test]
  fn invalid_crop_parameters_are_rejected() {
    for crop in ["[crop]\nmax_side = 0", "[crop]\nexpand = -0.5"] {
      let content = format!("{MINIMAL}\n{crop}\n");
      let err = JudgeConfig::from_toml_str(&content, Path::new("/work")).unwrap_err();
      assert!(matches!(err, ConfigError::Invalid(_)), "{crop}");
    }
  }
}
