// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 对比任务
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

use std::time::Instant;

use tracing::info;

use crate::{
  dataset::EvaluationRecord,
  model::{ModelConfig, ModelPredictions},
  output::Render,
  sample::{DEFAULT_SAMPLE_COUNT, DEFAULT_SEED, Report, Sampler, assemble},
};

pub trait Task<D, M, O>: Sized {
  type Error;
  fn run_task(self, dataset: D, models: M, output: O) -> Result<(), Self::Error>;
}

/// 读取各模型预测、抽样并渲染报告
#[derive(Debug, Clone, Copy)]
pub struct CompareTask {
  sample_count: usize,
  seed: u64,
}

impl Default for CompareTask {
  fn default() -> Self {
    Self {
      sample_count: DEFAULT_SAMPLE_COUNT,
      seed: DEFAULT_SEED,
    }
  }
}

impl CompareTask {
  pub fn with_sample_count(mut self, sample_count: usize) -> Self {
    self.sample_count = sample_count;
    self
  }

  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = seed;
    self
  }
}

impl<'a, RE: std::error::Error + Sync + Send + 'static, O: Render<Report, Error = RE>>
  Task<&'a [EvaluationRecord], &'a [ModelConfig], O> for CompareTask
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    dataset: &'a [EvaluationRecord],
    models: &'a [ModelConfig],
    output: O,
  ) -> Result<(), Self::Error> {
    info!("开始对比任务: {} 条评估记录, {} 个模型", dataset.len(), models.len());

    let now = Instant::now();
    let predictions = models
      .iter()
      .map(|model| ModelPredictions::load(model.clone(), dataset.len()))
      .collect::<Result<Vec<_>, _>>()?;
    info!("预测加载完成，耗时: {:.2?}", now.elapsed());

    let now = Instant::now();
    let indices = Sampler::new(self.seed).sample_indices(dataset.len(), self.sample_count);
    let rows = assemble(dataset, &predictions, &indices)?;
    info!(
      "抽样完成: {} / {} (seed = {})，耗时: {:.2?}",
      rows.len(),
      dataset.len(),
      self.seed,
      now.elapsed()
    );

    let now = Instant::now();
    output.render_result(&Report::new(&predictions, rows))?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}
