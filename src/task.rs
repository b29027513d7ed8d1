// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/task.rs - 离线推理任务
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

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::{model::Model, output::Render};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = Instant::now();
    let result = model.infer(&frame)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());
    output.render_result(&frame, &result)?;
    info!("输出完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 对同一帧重复推理，统计平均耗时
#[derive(Debug)]
pub struct RepeatShotTask {
  repeat_times: usize,
}

const WARMUP_TIMES: usize = 2;

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self { repeat_times: 1000 }
  }
}

impl RepeatShotTask {
  pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
    self.repeat_times = repeat_times;
    self
  }
}

/// 去掉预热轮次后的平均耗时
pub fn mean_latency(times: &[Duration]) -> Option<Duration> {
  let measured = times.get(WARMUP_TIMES..)?;
  if measured.is_empty() {
    return None;
  }
  Some(measured.iter().sum::<Duration>() / measured.len() as u32)
}

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let mut times = Vec::with_capacity(self.repeat_times);
    let mut last = None;
    for i in 0..self.repeat_times {
      let now = Instant::now();
      let result = model.infer(&frame)?;
      let elapsed = now.elapsed();
      info!("({})推理完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      last = Some(result);
    }

    if let Some(result) = last {
      output.render_result(&frame, &result)?;
    }

    match mean_latency(&times) {
      Some(mean) => warn!("平均推理时间: {:.2?}", mean),
      None => warn!("重复次数不足 {} 次，无法统计平均推理时间", WARMUP_TIMES + 1),
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use thiserror::Error;

  use super::*;

  #[derive(Debug, Error)]
  #[error("nothing")]
  struct Never;

  struct Doubler {
    calls: Cell<usize>,
  }

  impl Model for &Doubler {
    type Input = u32;
    type Output = u32;
    type Error = Never;

    fn infer(&self, input: &u32) -> Result<u32, Never> {
      self.calls.set(self.calls.get() + 1);
      Ok(input * 2)
    }
  }

  struct Collect {
    seen: Cell<Option<(u32, u32)>>,
  }

  impl Render<u32, u32> for &Collect {
    type Error = Never;

    fn render_result(&self, frame: &u32, result: &u32) -> Result<(), Never> {
      self.seen.set(Some((*frame, *result)));
      Ok(())
    }
  }

  #[test]
  fn test_one_shot_renders_first_frame() {
    let model = Doubler {
      calls: Cell::new(0),
    };
    let output = Collect {
      seen: Cell::new(None),
    };
    OneShotTask
      .run_task(vec![21u32, 5].into_iter(), &model, &output)
      .unwrap();
    assert_eq!(model.calls.get(), 1);
    assert_eq!(output.seen.get(), Some((21, 42)));
  }

  #[test]
  fn test_one_shot_without_input() {
    let model = Doubler {
      calls: Cell::new(0),
    };
    let output = Collect {
      seen: Cell::new(None),
    };
    let err = OneShotTask.run_task(std::iter::empty::<u32>(), &model, &output);
    assert!(err.is_err());
    assert_eq!(model.calls.get(), 0);
  }

  #[test]
  fn test_repeat_shot_runs_model_repeatedly() {
    let model = Doubler {
      calls: Cell::new(0),
    };
    let output = Collect {
      seen: Cell::new(None),
    };
    RepeatShotTask::default()
      .with_repeat_times(5)
      .run_task(std::iter::once(3u32), &model, &output)
      .unwrap();
    assert_eq!(model.calls.get(), 5);
    assert_eq!(output.seen.get(), Some((3, 6)));
  }

  #[test]
  fn test_mean_latency_skips_warmup() {
    let times = [
      Duration::from_millis(100),
      Duration::from_millis(50),
      Duration::from_millis(10),
      Duration::from_millis(20),
    ];
    assert_eq!(mean_latency(&times), Some(Duration::from_millis(15)));
    assert_eq!(mean_latency(&times[..2]), None);
    assert_eq!(mean_latency(&[]), None);
  }
}
