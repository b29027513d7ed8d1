// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/main.rs - 皮肤病识别服务主程序
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

mod args;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pifu::{
  FromUrl,
  model::{DenseNetBuilder, SkinClassifier},
  pipeline::SkinPipeline,
  server,
};

#[tokio::main]
async fn main() -> Result<()> {
  let args = args::Args::parse();

  let default_level = if args.debug { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    )
    .with_target(false)
    .compact()
    .init();

  info!("Pifu 皮肤病识别服务");
  info!("模型文件路径: {}", args.model);
  info!("监听地址: {}:{}", args.host, args.port);
  info!("返回类别数: {}", args.top_k);
  info!("上传大小上限: {} 字节", args.max_upload_bytes);

  let builder = DenseNetBuilder::from_url(&args.model)?
    .top_k(args.top_k)
    .intra_threads(args.intra_threads);
  info!("正在加载模型: {}", builder.model_path().display());
  let model: SkinClassifier = builder.build()?;
  let pipeline = SkinPipeline::new(model);

  let app = server::router(Arc::new(pipeline), args.max_upload_bytes);
  let (listener, addr) = server::bind(&args.host, args.port).await?;
  info!("服务已启动: http://{}/predict", addr);

  server::serve(listener, app).await
}
