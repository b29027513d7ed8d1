// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/server/handler.rs - 预测接口
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

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Multipart, State,
    multipart::{MultipartError, MultipartRejection},
  },
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  pipeline::{PredictError, Prediction},
  server::AppState,
};

/// 上传表单中文件字段的名称
const FILE_FIELD: &str = "file";

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("No file part")]
  NoFilePart,
  #[error("No selected file")]
  NoSelectedFile,
  #[error("File too large: upload exceeds {0} bytes")]
  TooLarge(usize),
  #[error("{}", .0.body_text())]
  Upload(MultipartError),
  #[error("{0}")]
  Predict(#[from] PredictError),
  #[error("{0}")]
  Join(#[from] tokio::task::JoinError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NoFilePart | ApiError::NoSelectedFile => StatusCode::BAD_REQUEST,
      ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
      ApiError::Upload(_) | ApiError::Predict(_) | ApiError::Join(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = self.to_string();
    if status.is_server_error() {
      error!("预测失败: {}", message);
    } else {
      warn!("请求无效 ({}): {}", status, message);
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// 超出请求体上限的读取失败单独报告，其余按服务端错误处理
fn upload_error(state: &AppState, err: MultipartError) -> ApiError {
  if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
    ApiError::TooLarge(state.max_upload_bytes)
  } else {
    ApiError::Upload(err)
  }
}

/// `POST /predict`：读取 `file` 字段，返回前若干个类别与得分
pub async fn handle_predict(
  State(state): State<Arc<AppState>>,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<Prediction>>, ApiError> {
  let mut multipart = multipart.map_err(|e| {
    debug!("请求不是 multipart 表单: {}", e);
    ApiError::NoFilePart
  })?;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| upload_error(&state, e))?
  {
    if field.name() != Some(FILE_FIELD) {
      continue;
    }
    // 没有文件名的同名字段是普通表单值，不算文件
    let Some(file_name) = field.file_name().map(str::to_string) else {
      continue;
    };
    if file_name.is_empty() {
      return Err(ApiError::NoSelectedFile);
    }

    let bytes = field.bytes().await.map_err(|e| upload_error(&state, e))?;
    info!("收到上传文件: {} ({} 字节)", file_name, bytes.len());

    let predictor = Arc::clone(&state.predictor);
    let predictions = tokio::task::spawn_blocking(move || predictor.predict(&bytes)).await??;
    debug!("预测结果: {:?}", predictions);

    return Ok(Json(predictions));
  }

  Err(ApiError::NoFilePart)
}
