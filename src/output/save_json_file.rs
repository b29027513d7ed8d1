// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/output/save_json_file.rs - 保存 JSON 结果文件
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

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{Classification, WithLabel},
  output::Render,
  pipeline::Prediction,
  url_local_path,
};

pub struct SaveJsonFileOutput {
  path: PathBuf,
}

#[derive(Error, Debug)]
pub enum SaveJsonFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(serde_json::Error),
  #[error("路径编码无效: {0}")]
  PathEncodingError(std::string::FromUtf8Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveJsonFileOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for SaveJsonFileOutput {
  type Error = SaveJsonFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveJsonFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveJsonFileOutput {
      path: url_local_path(uri).map_err(SaveJsonFileError::PathEncodingError)?,
    })
  }
}

impl SaveJsonFileOutput {
  fn save_json(&self, predictions: &[Prediction]) -> Result<(), SaveJsonFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveJsonFileError::IoError)?;
    }

    let content =
      serde_json::to_string_pretty(predictions).map_err(SaveJsonFileError::JsonError)?;
    std::fs::write(&self.path, content).map_err(SaveJsonFileError::IoError)?;

    info!("保存分类结果到文件: {}", self.path.display());

    Ok(())
  }
}

impl<F, T: WithLabel> Render<F, Classification<T>> for SaveJsonFileOutput {
  type Error = SaveJsonFileError;

  fn render_result(&self, _frame: &F, result: &Classification<T>) -> Result<(), Self::Error> {
    let predictions = Vec::<Prediction>::from(result);
    self.save_json(&predictions)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{ClassifyItem, SkinLabel};

  #[test]
  fn test_save_json_creates_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("result.json");
    let url = Url::parse(&format!("json://{}", path.display())).unwrap();
    let output = SaveJsonFileOutput::from_url(&url).unwrap();

    let result = Classification {
      items: vec![ClassifyItem {
        kind: SkinLabel::MelanocyticNevi,
        score: 0.75,
      }]
      .into_boxed_slice(),
    };
    output.render_result(&(), &result).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let predictions: Vec<Prediction> = serde_json::from_str(&content).unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].class, "Melanocytic Nevi");
    assert_eq!(predictions[0].score, 0.75);
  }

  #[test]
  fn test_save_json_to_escaped_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("识别 结果").join("result.json");
    let url = Url::parse(&format!("json://{}", path.display())).unwrap();
    let output = SaveJsonFileOutput::from_url(&url).unwrap();

    let result = Classification {
      items: vec![ClassifyItem {
        kind: SkinLabel::Eczema,
        score: 0.5,
      }]
      .into_boxed_slice(),
    };
    output.render_result(&(), &result).unwrap();
    assert!(path.exists());
  }
}
