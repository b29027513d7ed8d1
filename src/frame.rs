// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/frame.rs - 归一化 NCHW 帧定义
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

use image::{
  RgbImage,
  imageops::{self, FilterType},
};
use tracing::debug;

use crate::input::AsNchwFrame;

const RGB_CHANNELS: usize = 3;

/// ImageNet 均值（RGB 顺序）
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet 标准差（RGB 顺序）
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 经过缩放与归一化的 RGB 帧，按 NCHW 排布（N = 1）
///
/// 宽高由类型参数固定，模型与输入的形状在编译期保持一致。
#[derive(Debug, Clone)]
pub struct NormalizedNchwFrame<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> Default for NormalizedNchwFrame<W, H> {
  fn default() -> Self {
    let size = RGB_CHANNELS * (W as usize) * (H as usize);
    let data = vec![0f32; size].into_boxed_slice();
    Self { data }
  }
}

impl<const W: u32, const H: u32> NormalizedNchwFrame<W, H> {
  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  /// 张量形状 `[1, C, H, W]`
  pub fn shape(&self) -> [i64; 4] {
    [1, RGB_CHANNELS as i64, H as i64, W as i64]
  }
}

impl<const W: u32, const H: u32> AsMut<[f32]> for NormalizedNchwFrame<W, H> {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> AsNchwFrame<W, H> for NormalizedNchwFrame<W, H> {
  fn as_nchw(&self) -> &[f32] {
    &self.data
  }
}

impl<const W: u32, const H: u32> From<&RgbImage> for NormalizedNchwFrame<W, H> {
  fn from(image: &RgbImage) -> Self {
    // 双线性缩放到模型输入尺寸，不保持宽高比
    let resized;
    let image = if image.dimensions() == (W, H) {
      image
    } else {
      debug!(
        "缩放图像: {}x{} -> {}x{}",
        image.width(),
        image.height(),
        W,
        H
      );
      resized = imageops::resize(image, W, H, FilterType::Triangle);
      &resized
    };

    let mut frame = Self::default();
    let height = frame.height();
    let width = frame.width();
    let plane = height * width;
    let slice = frame.as_mut();

    for (x, y, pixel) in image.enumerate_pixels() {
      let offset = (y as usize) * width + (x as usize);
      for c in 0..RGB_CHANNELS {
        let value = pixel[c] as f32 / 255.0;
        slice[c * plane + offset] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
      }
    }

    frame
  }
}

impl<const W: u32, const H: u32> From<RgbImage> for NormalizedNchwFrame<W, H> {
  fn from(image: RgbImage) -> Self {
    Self::from(&image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn normalized(value: u8, channel: usize) -> f32 {
    (value as f32 / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel]
  }

  #[test]
  fn test_layout_is_channel_major() {
    let mut image = RgbImage::new(2, 1);
    image.put_pixel(0, 0, Rgb([255, 0, 10]));
    image.put_pixel(1, 0, Rgb([0, 128, 20]));

    let frame: NormalizedNchwFrame<2, 1> = (&image).into();
    let data = frame.as_nchw();

    assert_eq!(data.len(), 6);
    // R 平面
    assert!((data[0] - normalized(255, 0)).abs() < 1e-6);
    assert!((data[1] - normalized(0, 0)).abs() < 1e-6);
    // G 平面
    assert!((data[2] - normalized(0, 1)).abs() < 1e-6);
    assert!((data[3] - normalized(128, 1)).abs() < 1e-6);
    // B 平面
    assert!((data[4] - normalized(10, 2)).abs() < 1e-6);
    assert!((data[5] - normalized(20, 2)).abs() < 1e-6);
  }

  #[test]
  fn test_resize_to_model_shape() {
    let image = RgbImage::from_pixel(640, 480, Rgb([200, 100, 50]));
    let frame: NormalizedNchwFrame<100, 75> = image.into();

    assert_eq!(frame.shape(), [1, 3, 75, 100]);
    assert_eq!(frame.as_nchw().len(), 3 * 75 * 100);

    let plane = 75 * 100;
    for (c, value) in [200u8, 100, 50].into_iter().enumerate() {
      let expected = normalized(value, c);
      for v in &frame.as_nchw()[c * plane..(c + 1) * plane] {
        assert!((v - expected).abs() < 1e-2, "通道 {} 数值偏差: {}", c, v);
      }
    }
  }

  #[test]
  fn test_upscale_small_image() {
    let image = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
    let frame: NormalizedNchwFrame<100, 75> = image.into();
    let first = frame.as_nchw()[0];
    assert!((first - normalized(0, 0)).abs() < 1e-6);
  }
}
