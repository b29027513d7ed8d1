// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/lib.rs - 库主文件
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

use std::{path::PathBuf, string::FromUtf8Error};

pub mod frame;
pub mod input;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod task;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 取 URL 的路径部分并做百分号解码
///
/// `scheme:///abs/path` 得到绝对路径，`scheme:relative/path` 得到相对路径。
pub fn url_local_path(url: &url::Url) -> Result<PathBuf, FromUtf8Error> {
  let path = urlencoding::decode(url.path())?;
  Ok(PathBuf::from(path.into_owned()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_url_local_path_decodes_escapes() {
    let url = url::Url::parse("onnx:///srv/皮肤 模型/model.onnx").unwrap();
    assert_eq!(url_local_path(&url).unwrap(), PathBuf::from("/srv/皮肤 模型/model.onnx"));

    let url = url::Url::parse("onnx:models/a%20b.onnx").unwrap();
    assert_eq!(url_local_path(&url).unwrap(), PathBuf::from("models/a b.onnx"));
  }

  #[test]
  fn test_url_local_path_rejects_invalid_utf8() {
    let url = url::Url::parse("onnx:///srv/%FF.onnx").unwrap();
    assert!(url_local_path(&url).is_err());
  }
}
