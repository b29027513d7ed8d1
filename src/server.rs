// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/server.rs - HTTP 服务
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

use std::{net::SocketAddr, sync::Arc};

use axum::{Router, extract::DefaultBodyLimit, routing::post};
use tokio::net::TcpListener;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};
use tracing::{error, info};

use crate::pipeline::Predictor;

mod handler;
pub use self::handler::{ApiError, handle_predict};

/// 上传大小默认上限 16 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// 各请求共享的状态
pub struct AppState {
  pub predictor: Arc<dyn Predictor>,
  pub max_upload_bytes: usize,
}

/// 构建只有 `POST /predict` 一条路由的应用
pub fn router(predictor: Arc<dyn Predictor>, max_upload_bytes: usize) -> Router {
  let state = Arc::new(AppState {
    predictor,
    max_upload_bytes,
  });

  // 浏览器端页面跨域上传
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  Router::new()
    .route("/predict", post(handle_predict))
    .layer(DefaultBodyLimit::max(max_upload_bytes))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// 绑定地址并返回实际监听的地址（端口为 0 时由系统分配）
pub async fn bind(host: &str, port: u16) -> anyhow::Result<(TcpListener, SocketAddr)> {
  let listener = TcpListener::bind((host, port)).await?;
  let addr = listener.local_addr()?;
  Ok((listener, addr))
}

/// 运行服务直到收到中断信号
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
  info!("服务监听于 {}", listener.local_addr()?);
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!("服务已停止");
  Ok(())
}

async fn shutdown_signal() {
  match tokio::signal::ctrl_c().await {
    Ok(()) => info!("收到中断信号，准备退出..."),
    Err(e) => {
      error!("监听中断信号失败: {}", e);
      std::future::pending::<()>().await;
    }
  }
}
