// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/model.rs - 模型
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

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Clone)]
pub struct ClassifyItem<T> {
  pub kind: T,
  pub score: f32,
}

/// 按置信度降序排列的分类结果
#[derive(Debug, Clone)]
pub struct Classification<T> {
  pub items: Box<[ClassifyItem<T>]>,
}

impl<T> Classification<T> {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn from_label_id(id: u32) -> Option<Self>;
}

/// 皮肤病类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinLabel {
  Eczema,
  Melanoma,
  BasalCellCarcinoma,
  MelanocyticNevi,
  BenignKeratosisLikeLesions,
  PsoriasisLichenPlanus,
  SeborrheicKeratoses,
  FungalInfections,
  ViralInfections,
}

impl SkinLabel {
  pub const ALL: [SkinLabel; 9] = [
    SkinLabel::Eczema,
    SkinLabel::Melanoma,
    SkinLabel::BasalCellCarcinoma,
    SkinLabel::MelanocyticNevi,
    SkinLabel::BenignKeratosisLikeLesions,
    SkinLabel::PsoriasisLichenPlanus,
    SkinLabel::SeborrheicKeratoses,
    SkinLabel::FungalInfections,
    SkinLabel::ViralInfections,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      SkinLabel::Eczema => "Eczema",
      SkinLabel::Melanoma => "Melanoma",
      SkinLabel::BasalCellCarcinoma => "Basal Cell Carcinoma",
      SkinLabel::MelanocyticNevi => "Melanocytic Nevi",
      SkinLabel::BenignKeratosisLikeLesions => "Benign Keratosis-like Lesions",
      SkinLabel::PsoriasisLichenPlanus => "Psoriasis pictures Lichen Planus and related diseases",
      SkinLabel::SeborrheicKeratoses => "Seborrheic Keratoses and other Benign Tumors",
      SkinLabel::FungalInfections => "Tinea Ringworm Candidiasis and other Fungal Infections",
      SkinLabel::ViralInfections => "Warts Molluscum and other Viral Infections",
    }
  }
}

impl WithLabel for SkinLabel {
  fn to_label_str(&self) -> String {
    self.as_str().to_string()
  }

  fn from_label_id(id: u32) -> Option<Self> {
    Self::ALL.get(id as usize).copied()
  }
}

mod densenet;
pub use self::densenet::{
  DenseNet, DenseNetBuilder, DenseNetError, SKIN_INPUT_HEIGHT, SKIN_INPUT_WIDTH, SkinClassifier,
};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_label_table_order() {
    assert_eq!(SkinLabel::from_label_id(0), Some(SkinLabel::Eczema));
    assert_eq!(SkinLabel::from_label_id(1), Some(SkinLabel::Melanoma));
    assert_eq!(
      SkinLabel::from_label_id(8).unwrap().to_label_str(),
      "Warts Molluscum and other Viral Infections"
    );
  }

  #[test]
  fn test_label_out_of_range() {
    assert_eq!(SkinLabel::from_label_id(9), None);
    assert_eq!(SkinLabel::from_label_id(u32::MAX), None);
  }

  #[test]
  fn test_label_ids_round_trip() {
    for (id, label) in SkinLabel::ALL.iter().enumerate() {
      assert_eq!(SkinLabel::from_label_id(id as u32), Some(*label));
    }
  }
}
