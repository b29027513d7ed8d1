// 该文件是 Pifu （皮肤识别） 项目的一部分。
// src/args.rs - 服务参数配置
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

use clap::Parser;
use url::Url;

use pifu::server::DEFAULT_MAX_UPLOAD_BYTES;

/// Pifu 皮肤病识别服务参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 监听地址
  #[arg(long, env = "PIFU_HOST", default_value = "127.0.0.1")]
  pub host: String,

  /// 监听端口（0 表示由系统分配）
  #[arg(short, long, env = "PIFU_PORT", default_value_t = 5000)]
  pub port: u16,

  /// ONNX 模型路径，例如 onnx:///srv/model.onnx 或 onnx:model.onnx
  #[arg(long, env = "PIFU_MODEL", default_value = "onnx:model.onnx", value_name = "MODEL")]
  pub model: Url,

  /// 返回的类别数量
  #[arg(long, env = "PIFU_TOP_K", default_value_t = 3, value_name = "K")]
  pub top_k: usize,

  /// 上传文件大小上限（字节）
  #[arg(long, env = "PIFU_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES, value_name = "BYTES")]
  pub max_upload_bytes: usize,

  /// ONNX Runtime 算子内线程数，缺省时由运行时决定
  #[arg(long, env = "PIFU_INTRA_THREADS", value_name = "COUNT")]
  pub intra_threads: Option<usize>,

  /// 输出调试日志
  #[arg(short, long)]
  pub debug: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let args = Args::try_parse_from(["pifu-server"]).unwrap();
    assert_eq!(args.host, "127.0.0.1");
    assert_eq!(args.port, 5000);
    assert_eq!(args.model.scheme(), "onnx");
    assert_eq!(args.model.path(), "model.onnx");
    assert_eq!(args.top_k, 3);
    assert_eq!(args.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert_eq!(args.intra_threads, None);
    assert!(!args.debug);
  }

  #[test]
  fn test_overrides() {
    let args = Args::try_parse_from([
      "pifu-server",
      "--port",
      "8080",
      "--model",
      "onnx:///srv/skin.onnx",
      "--intra-threads",
      "2",
      "--debug",
    ])
    .unwrap();
    assert_eq!(args.port, 8080);
    assert_eq!(args.model.path(), "/srv/skin.onnx");
    assert_eq!(args.intra_threads, Some(2));
    assert!(args.debug);
  }

  #[test]
  fn test_rejects_invalid_model_url() {
    assert!(Args::try_parse_from(["pifu-server", "--model", "not a url"]).is_err());
  }
}
