// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/output.rs - 输出定义
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

use crate::model::{Classification, WithLabel};
use crate::{FromUrl, FromUrlWithScheme};
use thiserror::Error;
use url::Url;

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

mod print_stdout;
mod save_json_file;
pub use self::print_stdout::{PrintStdoutError, PrintStdoutOutput};
pub use self::save_json_file::{SaveJsonFileError, SaveJsonFileOutput};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("保存 JSON 文件错误: {0}")]
  SaveJsonFileError(#[from] SaveJsonFileError),
  #[error("标准输出错误: {0}")]
  PrintStdoutError(#[from] PrintStdoutError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  SaveJsonFileOutput(SaveJsonFileOutput),
  PrintStdoutOutput(PrintStdoutOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      SaveJsonFileOutput::SCHEME => {
        let output = SaveJsonFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveJsonFileOutput(output))
      }
      PrintStdoutOutput::SCHEME => {
        let output = PrintStdoutOutput::from_url(url)?;
        Ok(OutputWrapper::PrintStdoutOutput(output))
      }
      scheme => Err(OutputError::SchemeMismatch(scheme.to_string())),
    }
  }
}

impl<F, T: WithLabel> Render<F, Classification<T>> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &F, result: &Classification<T>) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::SaveJsonFileOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      OutputWrapper::PrintStdoutOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}
