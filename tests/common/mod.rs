// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/common/mod.rs - 集成测试用的脚本化运行时
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{Array, Array4, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use shanan_adapter::{AdapterConfig, Device, EngineError, InferenceEngine, ModelFile, Runtime};

/// 一个输出张量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tensor {
  pub shape: Vec<usize>,
  pub data: Vec<f32>,
}

impl Tensor {
  /// 按候选逐行给出，排列为 `[1, C, N]`（无锚头布局）
  pub fn channel_major(candidates: &[Vec<f32>]) -> Self {
    let channels = candidates.first().map_or(0, Vec::len);
    let mut data = Vec::with_capacity(channels * candidates.len());
    for c in 0..channels {
      data.extend(candidates.iter().map(|row| row[c]));
    }
    Self {
      shape: vec![1, channels, candidates.len()],
      data,
    }
  }

  /// 按候选逐行给出，排列为 `[1, N, C]`
  pub fn row_major(candidates: &[Vec<f32>]) -> Self {
    let channels = candidates.first().map_or(0, Vec::len);
    Self {
      shape: vec![1, candidates.len(), channels],
      data: candidates.concat(),
    }
  }

  pub fn new(shape: &[usize], data: Vec<f32>) -> Self {
    Self {
      shape: shape.to_vec(),
      data,
    }
  }
}

/// 模型文件内容：输入尺寸与每次推理返回的固定输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
  pub input: (u32, u32),
  pub outputs: Vec<Tensor>,
}

pub struct ScriptedEngine {
  script: Script,
}

impl InferenceEngine for ScriptedEngine {
  fn input_size(&self) -> (u32, u32) {
    self.script.input
  }

  fn run(&mut self, input: Array4<f32>) -> Result<Vec<ArrayD<f32>>, EngineError> {
    let (w, h) = self.script.input;
    if input.shape() != [1, 3, h as usize, w as usize] {
      return Err(EngineError::Execution(format!(
        "输入形状错误: {:?}",
        input.shape()
      )));
    }
    self
      .script
      .outputs
      .iter()
      .map(|t| {
        Array::from_shape_vec(IxDyn(&t.shape), t.data.clone())
          .map_err(|e| EngineError::Execution(e.to_string()))
      })
      .collect()
  }
}

/// 把 JSON 脚本当作模型加载的运行时
#[derive(Default)]
pub struct ScriptedRuntime {
  pub gpu: bool,
  pub loads: AtomicUsize,
}

impl ScriptedRuntime {
  pub fn cpu() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn with_gpu() -> Arc<Self> {
    Arc::new(Self {
      gpu: true,
      ..Self::default()
    })
  }

  pub fn load_count(&self) -> usize {
    self.loads.load(Ordering::SeqCst)
  }
}

impl Runtime for ScriptedRuntime {
  fn name(&self) -> &str {
    "scripted"
  }

  fn gpu_available(&self) -> bool {
    self.gpu
  }

  fn load(&self, model: &ModelFile, device: Device) -> Result<Box<dyn InferenceEngine>, EngineError> {
    if device == Device::Gpu && !self.gpu {
      return Err(EngineError::DeviceUnavailable("gpu".to_string()));
    }
    let text =
      std::fs::read_to_string(model.path()).map_err(|e| EngineError::Load(e.to_string()))?;
    let script: Script = serde_json::from_str(&text).map_err(|e| EngineError::Load(e.to_string()))?;
    self.loads.fetch_add(1, Ordering::SeqCst);
    Ok(Box::new(ScriptedEngine { script }))
  }
}

pub fn fixture() -> TempDir {
  tempfile::tempdir().expect("创建临时目录失败")
}

pub fn write_model(dir: &Path, name: &str, script: &Script) -> PathBuf {
  let path = dir.join(name);
  let text = serde_json::to_string(script).expect("序列化脚本失败");
  std::fs::write(&path, text).expect("写入模型失败");
  path
}

pub fn write_labels(dir: &Path, text: &str) -> PathBuf {
  let path = dir.join("labels.txt");
  std::fs::write(&path, text).expect("写入标签失败");
  path
}

/// 三个类别，含空行与首尾空白
pub const THREE_LABELS: &str = "person\n\n  car \ndog\n";

pub fn config(model: &Path, labels: &Path) -> AdapterConfig {
  AdapterConfig::new(model, labels)
}
