// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/input/upload.rs - 上传图像解码
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

use std::io::Cursor;

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum UploadDecodeError {
  #[error("cannot identify image file")]
  UnknownFormat,
  #[error("cannot identify image file: empty upload")]
  Empty,
  #[error("{0}")]
  ImageError(#[from] image::ImageError),
}

/// 将上传的原始字节解码为 8 位 RGB 图像
///
/// 容器格式由内容推断，不依赖文件名；透明通道被丢弃，灰度图扩展为三通道。
pub fn decode_upload(bytes: &[u8]) -> Result<RgbImage, UploadDecodeError> {
  if bytes.is_empty() {
    return Err(UploadDecodeError::Empty);
  }

  let reader = ImageReader::new(Cursor::new(bytes))
    .with_guessed_format()
    .map_err(image::ImageError::IoError)?;
  let Some(format) = reader.format() else {
    return Err(UploadDecodeError::UnknownFormat);
  };
  debug!("上传图像格式: {:?}", format);

  let image = reader.decode()?.to_rgb8();
  debug!("上传图像尺寸: {}x{}", image.width(), image.height());

  Ok(image)
}
