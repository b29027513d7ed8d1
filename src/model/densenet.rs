// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/model/densenet.rs - DenseNet-121 分类模型
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

use std::{
  marker::PhantomData,
  path::{Path, PathBuf},
  sync::Mutex,
};

use ort::{session::Session, value::TensorRef};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, url_local_path,
  frame::NormalizedNchwFrame,
  input::AsNchwFrame,
  model::{ClassifyItem, Classification, Model, SkinLabel, WithLabel},
};

const DENSENET_NUM_INPUTS: usize = 1;
pub const DENSENET_DEFAULT_TOP_K: usize = 3;

pub const SKIN_INPUT_WIDTH: u32 = 100;
pub const SKIN_INPUT_HEIGHT: u32 = 75;

/// 皮肤病分类模型，输入 100x75
pub type SkinClassifier = DenseNet<SKIN_INPUT_WIDTH, SKIN_INPUT_HEIGHT, SkinLabel>;

/// ONNX Runtime 上的 DenseNet-121 分类器
///
/// 会话在推理期间需要可变借用，用互斥锁包裹后模型可在线程间共享。
pub struct DenseNet<const W: u32, const H: u32, T> {
  session: Mutex<Session>,
  top_k: usize,
  _phantom: PhantomData<fn() -> T>,
}

#[derive(Error, Debug)]
pub enum DenseNetError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(std::io::Error),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(ort::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("推理会话锁已失效")]
  SessionPoisoned,
  #[error("模型输出为空")]
  EmptyOutput,
  #[error("list index out of range: class {0} has no label")]
  UnknownClass(u32),
}

impl From<std::io::Error> for DenseNetError {
  fn from(err: std::io::Error) -> Self {
    DenseNetError::ModelLoadError(err)
  }
}

impl From<ort::Error> for DenseNetError {
  fn from(err: ort::Error) -> Self {
    DenseNetError::OrtError(err)
  }
}

pub struct DenseNetBuilder {
  model_path: PathBuf,
  top_k: usize,
  intra_threads: Option<usize>,
}

impl FromUrlWithScheme for DenseNetBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for DenseNetBuilder {
  type Error = DenseNetError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DenseNetError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    if url.path().is_empty() {
      return Err(DenseNetError::ModelPathError("模型路径为空".to_string()));
    }

    let model_path = url_local_path(url)
      .map_err(|e| DenseNetError::ModelPathError(format!("模型路径编码无效: {}", e)))?;

    Ok(DenseNetBuilder {
      model_path,
      top_k: DENSENET_DEFAULT_TOP_K,
      intra_threads: None,
    })
  }
}

impl DenseNetBuilder {
  pub fn top_k(mut self, top_k: usize) -> Self {
    self.top_k = top_k;
    self
  }

  pub fn intra_threads(mut self, threads: Option<usize>) -> Self {
    self.intra_threads = threads;
    self
  }

  pub fn model_path(&self) -> &Path {
    &self.model_path
  }

  pub fn build<const W: u32, const H: u32, T: WithLabel>(
    self,
  ) -> Result<DenseNet<W, H, T>, DenseNetError> {
    if self.top_k == 0 {
      return Err(DenseNetError::ModelInvalid("top_k 必须大于 0".to_string()));
    }

    info!("加载模型文件: {}", self.model_path.display());
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    info!("创建 ONNX Runtime 推理会话");
    let mut builder = Session::builder()?;
    if let Some(threads) = self.intra_threads {
      debug!("推理线程数: {}", threads);
      builder = builder.with_intra_threads(threads)?;
    }
    let session = builder.commit_from_memory(&model_data)?;

    let num_inputs = session.inputs.len();
    let num_outputs = session.outputs.len();

    if num_inputs != DENSENET_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        DENSENET_NUM_INPUTS, num_inputs
      );
      return Err(DenseNetError::ModelInvalid(format!(
        "预期模型输入数量为 {}, 实际为 {}",
        DENSENET_NUM_INPUTS, num_inputs
      )));
    }

    if num_outputs == 0 {
      error!("模型没有输出");
      return Err(DenseNetError::ModelInvalid("模型没有输出".to_string()));
    }

    for input in &session.inputs {
      debug!("模型输入: {} {:?}", input.name, input.input_type);
    }
    for output in &session.outputs {
      debug!("模型输出: {} {:?}", output.name, output.output_type);
    }
    info!("模型加载完成，输入尺寸 {}x{}", W, H);

    Ok(DenseNet {
      session: Mutex::new(session),
      top_k: self.top_k,
      _phantom: PhantomData,
    })
  }
}

impl<const W: u32, const H: u32, T: WithLabel> Model for DenseNet<W, H, T> {
  type Input = NormalizedNchwFrame<W, H>;
  type Output = Classification<T>;
  type Error = DenseNetError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    // 设置输入
    debug!("设置模型输入");
    let tensor = TensorRef::from_array_view((input.shape().to_vec(), input.as_nchw()))?;

    let mut session = self
      .session
      .lock()
      .map_err(|_| DenseNetError::SessionPoisoned)?;

    // 执行推理
    debug!("执行模型推理");
    let outputs = session.run(ort::inputs![tensor])?;

    // 获取输出
    let (shape, scores) = outputs[0].try_extract_tensor::<f32>()?;
    debug!("模型输出形状: {:?}", shape);

    postprocess(scores, self.top_k)
  }
}

/// 对模型输出做 softmax 并取前 `top_k` 个类别
///
/// 网络末端已经带有 softmax 层，这里再做一次，得分与参考服务保持一致。
pub fn postprocess<T: WithLabel>(
  output: &[f32],
  top_k: usize,
) -> Result<Classification<T>, DenseNetError> {
  debug!("后处理模型输出");
  if output.is_empty() {
    return Err(DenseNetError::EmptyOutput);
  }

  let probs = softmax(output);
  let items = rank(&probs, top_k)
    .into_iter()
    .map(|(class_id, score)| {
      T::from_label_id(class_id)
        .map(|kind| ClassifyItem { kind, score })
        .ok_or(DenseNetError::UnknownClass(class_id))
    })
    .collect::<Result<Vec<_>, _>>()?;

  debug!("分类结果: {:?}", items);

  Ok(Classification {
    items: items.into_boxed_slice(),
  })
}

fn softmax(logits: &[f32]) -> Vec<f32> {
  let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
  let sum: f32 = exps.iter().sum();
  exps.into_iter().map(|e| e / sum).collect()
}

/// 按得分降序返回 `(类别, 得分)`，得分相同时类别编号大的在前
fn rank(probs: &[f32], top_k: usize) -> Vec<(u32, f32)> {
  let mut indices: Vec<usize> = (0..probs.len()).collect();
  indices.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]).then(b.cmp(&a)));
  indices
    .into_iter()
    .take(top_k)
    .map(|i| (i as u32, probs[i]))
    .collect()
}
