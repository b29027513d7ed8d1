// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 重复推理测速
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use pifu::{
  FromUrl,
  input::InputWrapper,
  model::{DenseNetBuilder, SKIN_INPUT_HEIGHT, SKIN_INPUT_WIDTH, SkinClassifier},
  output::OutputWrapper,
  task::{RepeatShotTask, Task},
};
use tracing::info;

/// Pifu 推理测速
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT", default_value = "stdout:")]
  pub output: Url,
  /// 重复次数
  #[arg(long, default_value_t = 1000, value_name = "COUNT")]
  pub repeat: usize,
  /// ONNX Runtime 算子内线程数
  #[arg(long, value_name = "COUNT")]
  pub intra_threads: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("重复次数: {}", args.repeat);

  let input = InputWrapper::<SKIN_INPUT_WIDTH, SKIN_INPUT_HEIGHT>::from_url(&args.input)?;
  let model: SkinClassifier = DenseNetBuilder::from_url(&args.model)?
    .intra_threads(args.intra_threads)
    .build()?;
  let output = OutputWrapper::from_url(&args.output)?;

  RepeatShotTask::default()
    .with_repeat_times(args.repeat)
    .run_task(input.into_nchw(), model, output)?;

  Ok(())
}
