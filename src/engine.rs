// 该文件是 Shanan （山南西风） 项目的一部分。
// src/engine.rs - 推理引擎接入点
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

//! 适配层与实际推理引擎之间的接缝。
//!
//! 引擎本身（模型加载、张量执行）由宿主程序静态链接并通过
//! [`install_runtime`] 注册，适配层只依赖这里的 trait。

use std::sync::{Arc, OnceLock};

use ndarray::{Array4, ArrayD};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::ModelFile;

#[derive(Error, Debug)]
pub enum EngineError {
  #[error("没有注册推理运行时")]
  NoRuntime,
  #[error("模型加载错误: {0}")]
  Load(String),
  #[error("设备不可用: {0}")]
  DeviceUnavailable(String),
  #[error("推理执行错误: {0}")]
  Execution(String),
}

/// 推理设备
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
  Cpu,
  /// 在 `initialize` 与 `shutdown` 之间独占
  Gpu,
}

/// 已加载的模型实例
///
/// 每个适配器独占一个引擎，引擎被丢弃时释放全部资源。
pub trait InferenceEngine: Send {
  /// 模型输入尺寸 `(width, height)`
  fn input_size(&self) -> (u32, u32);

  /// 输入为 `[1, 3, H, W]` 的 RGB 张量，数值范围 [0, 1]
  fn run(&mut self, input: Array4<f32>) -> Result<Vec<ArrayD<f32>>, EngineError>;
}

/// 推理运行时，负责把模型文件加载为引擎
pub trait Runtime: Send + Sync {
  fn name(&self) -> &str;

  fn gpu_available(&self) -> bool;

  fn load(&self, model: &ModelFile, device: Device)
  -> Result<Box<dyn InferenceEngine>, EngineError>;
}

/// 未注册运行时时使用，所有加载请求都会失败
#[derive(Debug, Default)]
pub struct MissingRuntime;

impl Runtime for MissingRuntime {
  fn name(&self) -> &str {
    "missing"
  }

  fn gpu_available(&self) -> bool {
    false
  }

  fn load(
    &self,
    model: &ModelFile,
    _device: Device,
  ) -> Result<Box<dyn InferenceEngine>, EngineError> {
    warn!(
      "没有注册推理运行时，无法加载模型: {}",
      model.path().display()
    );
    Err(EngineError::NoRuntime)
  }
}

static RUNTIME: OnceLock<Arc<dyn Runtime>> = OnceLock::new();

/// 注册进程级的默认运行时，只能注册一次
///
/// 重复注册时返回 `false`，已注册的运行时保持不变。
pub fn install_runtime(runtime: Arc<dyn Runtime>) -> bool {
  let name = runtime.name().to_string();
  match RUNTIME.set(runtime) {
    Ok(()) => {
      info!("注册推理运行时: {}", name);
      true
    }
    Err(_) => {
      warn!("推理运行时已注册，忽略: {}", name);
      false
    }
  }
}

/// 当前默认运行时，未注册时为 [`MissingRuntime`]
pub fn default_runtime() -> Arc<dyn Runtime> {
  RUNTIME
    .get()
    .cloned()
    .unwrap_or_else(|| Arc::new(MissingRuntime))
}
