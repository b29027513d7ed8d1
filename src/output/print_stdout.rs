// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/output/print_stdout.rs - 输出到标准输出
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

use std::io::Write;

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{Classification, WithLabel},
  output::Render,
  pipeline::Prediction,
};

#[derive(Error, Debug)]
pub enum PrintStdoutError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 以单行 JSON 打印结果，便于脚本读取
pub struct PrintStdoutOutput;

impl FromUrlWithScheme for PrintStdoutOutput {
  const SCHEME: &'static str = "stdout";
}

impl FromUrl for PrintStdoutOutput {
  type Error = PrintStdoutError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(PrintStdoutError::SchemeMismatch);
    }
    Ok(PrintStdoutOutput)
  }
}

impl<F, T: WithLabel> Render<F, Classification<T>> for PrintStdoutOutput {
  type Error = PrintStdoutError;

  fn render_result(&self, _frame: &F, result: &Classification<T>) -> Result<(), Self::Error> {
    let predictions = Vec::<Prediction>::from(result);
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &predictions)?;
    writeln!(stdout)?;
    Ok(())
  }
}
