// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 命令行参数
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shanan_adapter::Capability;

/// YOLO 适配层的模型探测与配置检查工具
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 探测模型文件的格式与 YOLO 版本
  Probe {
    /// 模型文件路径
    #[arg(value_name = "MODEL")]
    model: PathBuf,
  },

  /// 按 initialize 的校验顺序检查配置，但不加载模型
  Check {
    /// 配置来源，可以是 URI（yolo:///path/model.onnx?labels=...）或 TOML 文件路径
    #[arg(long, value_name = "URL|TOML")]
    config: String,

    /// 只检查指定能力，默认检查全部五种
    #[arg(long, value_name = "CAPABILITY")]
    capability: Option<Capability>,
  },
}
