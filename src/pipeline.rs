// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/pipeline.rs - 解码、预处理、推理流水线
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
  frame::NormalizedNchwFrame,
  input::{UploadDecodeError, decode_upload},
  model::{Classification, Model, SKIN_INPUT_HEIGHT, SKIN_INPUT_WIDTH, SkinClassifier, WithLabel},
};

/// 单个预测结果，序列化为 `{"class": ..., "score": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
  pub class: String,
  pub score: f32,
}

impl<T: WithLabel> From<&Classification<T>> for Vec<Prediction> {
  fn from(result: &Classification<T>) -> Self {
    result
      .items
      .iter()
      .map(|item| Prediction {
        class: item.kind.to_label_str(),
        score: item.score,
      })
      .collect()
  }
}

#[derive(Error, Debug)]
pub enum PredictError {
  #[error("{0}")]
  Decode(#[from] UploadDecodeError),
  #[error("{0}")]
  Inference(Box<dyn std::error::Error + Send + Sync>),
}

/// 由上传字节得到预测结果
pub trait Predictor: Send + Sync {
  fn predict(&self, bytes: &[u8]) -> Result<Vec<Prediction>, PredictError>;
}

/// 服务使用的皮肤病分类流水线
pub type SkinPipeline = ClassifyPipeline<SkinClassifier, SKIN_INPUT_WIDTH, SKIN_INPUT_HEIGHT>;

pub struct ClassifyPipeline<M, const W: u32, const H: u32> {
  model: M,
}

impl<M, const W: u32, const H: u32> ClassifyPipeline<M, W, H> {
  pub fn new(model: M) -> Self {
    Self { model }
  }
}

impl<M, T, E, const W: u32, const H: u32> Predictor for ClassifyPipeline<M, W, H>
where
  M: Model<Input = NormalizedNchwFrame<W, H>, Output = Classification<T>, Error = E> + Send + Sync,
  T: WithLabel,
  E: std::error::Error + Send + Sync + 'static,
{
  fn predict(&self, bytes: &[u8]) -> Result<Vec<Prediction>, PredictError> {
    let image = decode_upload(bytes)?;
    let frame = NormalizedNchwFrame::<W, H>::from(&image);

    let now = std::time::Instant::now();
    let result = self
      .model
      .infer(&frame)
      .map_err(|e| PredictError::Inference(Box::new(e)))?;
    debug!("推理完成，{} 个类别，耗时: {:.2?}", result.len(), now.elapsed());

    Ok(Vec::from(&result))
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use image::{ImageFormat, Rgb, RgbImage};

  use super::*;
  use crate::{
    input::AsNchwFrame,
    model::{ClassifyItem, SkinLabel},
  };

  #[derive(Debug, Error)]
  #[error("fake failure")]
  struct FakeError;

  /// 以 R 通道首个像素的符号决定输出
  struct FakeModel;

  impl Model for FakeModel {
    type Input = NormalizedNchwFrame<4, 3>;
    type Output = Classification<SkinLabel>;
    type Error = FakeError;

    fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
      if input.as_nchw()[0] < 0.0 {
        return Err(FakeError);
      }
      Ok(Classification {
        items: vec![
          ClassifyItem {
            kind: SkinLabel::Melanoma,
            score: 0.7,
          },
          ClassifyItem {
            kind: SkinLabel::Eczema,
            score: 0.2,
          },
        ]
        .into_boxed_slice(),
      })
    }
  }

  fn png(color: [u8; 3]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbImage::from_pixel(8, 6, Rgb(color))
      .write_to(&mut buf, ImageFormat::Png)
      .unwrap();
    buf.into_inner()
  }

  #[test]
  fn test_predict_maps_labels() {
    let pipeline = ClassifyPipeline::<_, 4, 3>::new(FakeModel);
    let predictions = pipeline.predict(&png([255, 255, 255])).unwrap();
    assert_eq!(
      predictions,
      vec![
        Prediction {
          class: "Melanoma".to_string(),
          score: 0.7
        },
        Prediction {
          class: "Eczema".to_string(),
          score: 0.2
        },
      ]
    );
  }

  #[test]
  fn test_predict_inference_error_message() {
    let pipeline = ClassifyPipeline::<_, 4, 3>::new(FakeModel);
    let err = pipeline.predict(&png([0, 0, 0])).unwrap_err();
    assert!(matches!(err, PredictError::Inference(_)));
    assert_eq!(err.to_string(), "fake failure");
  }

  #[test]
  fn test_predict_decode_error() {
    let pipeline = ClassifyPipeline::<_, 4, 3>::new(FakeModel);
    let err = pipeline.predict(b"GIF89a-not-really").unwrap_err();
    assert!(matches!(err, PredictError::Decode(_)));
  }

  #[test]
  fn test_prediction_json_shape() {
    let json = serde_json::to_value(Prediction {
      class: "Melanoma".to_string(),
      score: 0.5,
    })
    .unwrap();
    assert_eq!(json, serde_json::json!({"class": "Melanoma", "score": 0.5}));
  }
}
