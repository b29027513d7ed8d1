// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use crate::{FromUrl, FromUrlWithScheme, frame::NormalizedNchwFrame, url_local_path};

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI scheme mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(image::ImageError),
  #[error("Invalid path encoding: {0}")]
  PathEncodingError(std::string::FromUtf8Error),
}

impl From<std::io::Error> for ImageFileInputError {
  fn from(err: std::io::Error) -> Self {
    ImageFileInputError::IoError(err)
  }
}

impl From<image::ImageError> for ImageFileInputError {
  fn from(err: image::ImageError) -> Self {
    ImageFileInputError::ImageLoadError(err)
  }
}

pub struct ImageFileInput<const W: u32, const H: u32> {
  image: Option<RgbImage>,
}

impl<const W: u32, const H: u32> FromUrlWithScheme for ImageFileInput<W, H> {
  const SCHEME: &'static str = "image";
}

impl<const W: u32, const H: u32> FromUrl for ImageFileInput<W, H> {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = url_local_path(url).map_err(ImageFileInputError::PathEncodingError)?;
    let image = ImageReader::open(&path)?
      .with_guessed_format()?
      .decode()?
      .to_rgb8();
    info!(
      "读取图像文件: {} ({}x{})",
      path.display(),
      image.width(),
      image.height()
    );

    Ok(ImageFileInput { image: Some(image) })
  }
}

impl<const W: u32, const H: u32> ImageFileInput<W, H> {
  pub fn into_nchw(self) -> ImageFileInputNchw<W, H> {
    ImageFileInputNchw { inner: self }
  }
}

pub struct ImageFileInputNchw<const W: u32, const H: u32> {
  inner: ImageFileInput<W, H>,
}

impl<const W: u32, const H: u32> Iterator for ImageFileInputNchw<W, H> {
  type Item = NormalizedNchwFrame<W, H>;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.image.take().map(NormalizedNchwFrame::from)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn test_read_image_file_yields_single_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lesion.png");
    RgbImage::from_pixel(8, 6, Rgb([10, 20, 30]))
      .save(&path)
      .unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let input = ImageFileInput::<4, 3>::from_url(&url).unwrap();

    let mut frames = input.into_nchw();
    let frame = frames.next().unwrap();
    assert_eq!(frame.shape(), [1, 3, 3, 4]);
    assert!(frames.next().is_none());
  }

  #[test]
  fn test_read_image_file_with_escaped_path() {
    let dir = tempfile::tempdir().unwrap();
    let image_dir = dir.path().join("病例 图像");
    std::fs::create_dir_all(&image_dir).unwrap();
    let path = image_dir.join("左臂.png");
    RgbImage::from_pixel(8, 6, Rgb([10, 20, 30]))
      .save(&path)
      .unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let input = ImageFileInput::<4, 3>::from_url(&url).unwrap();
    assert_eq!(input.into_nchw().count(), 1);
  }

  #[test]
  fn test_scheme_mismatch() {
    let url = Url::parse("video:///tmp/a.mp4").unwrap();
    let err = ImageFileInput::<4, 3>::from_url(&url).err().unwrap();
    assert!(matches!(err, ImageFileInputError::SchemaMismatch));
  }

  #[test]
  fn test_missing_file_is_io_error() {
    let url = Url::parse("image:///definitely/not/here.png").unwrap();
    let err = ImageFileInput::<4, 3>::from_url(&url).err().unwrap();
    assert!(matches!(err, ImageFileInputError::IoError(_)));
  }
}
