// 该文件是 Shanan （山南西风） 项目的一部分。
// src/adapter/lifecycle.rs - 适配器生命周期
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::sync::Arc;

use image::RgbImage;
use ndarray::{Array4, ArrayD};
use tracing::{debug, error, info, warn};

use super::AdapterError;
use crate::config::{AdapterConfig, ConfigError};
use crate::engine::{Device, EngineError, InferenceEngine, Runtime};
use crate::factory::{self, Capability};
use crate::frame::{Letterbox, center_crop};
use crate::labels::ClassNames;
use crate::model::{Head, ModelFile, YoloVersion};

/// 初始化成功后持有的全部后端资源
pub(crate) struct Session {
  engine: Box<dyn InferenceEngine>,
  labels: ClassNames,
  version: YoloVersion,
}

impl Session {
  pub fn head(&self) -> Head {
    self.version.head()
  }

  pub fn labels(&self) -> &ClassNames {
    &self.labels
  }

  pub fn class_name(&self, class_id: usize) -> String {
    self
      .labels
      .get(class_id)
      .map(str::to_string)
      .unwrap_or_default()
  }

  fn execute(&mut self, input: Array4<f32>) -> Result<Vec<ArrayD<f32>>, AdapterError> {
    let outputs = self.engine.run(input)?;
    debug!(
      "推理完成, 输出形状: {:?}",
      outputs.iter().map(|o| o.shape().to_vec()).collect::<Vec<_>>()
    );
    Ok(outputs)
  }

  /// 检测类任务：信箱缩放后推理，返回坐标还原参数与原始输出
  pub fn run_letterboxed(
    &mut self,
    image: &RgbImage,
  ) -> Result<(Letterbox, Vec<ArrayD<f32>>), AdapterError> {
    if image.width() == 0 || image.height() == 0 {
      return Err(AdapterError::EmptyImage);
    }
    let target = self.model_input()?;
    let letterbox = Letterbox::new(image.dimensions(), target);
    let outputs = self.execute(letterbox.apply(image, target))?;
    Ok((letterbox, outputs))
  }

  /// 分类任务：居中裁剪后推理
  pub fn run_center_cropped(&mut self, image: &RgbImage) -> Result<Vec<ArrayD<f32>>, AdapterError> {
    if image.width() == 0 || image.height() == 0 {
      return Err(AdapterError::EmptyImage);
    }
    let target = self.model_input()?;
    self.execute(center_crop(image, target))
  }

  pub fn input_size(&self) -> (u32, u32) {
    self.engine.input_size()
  }

  /// 引擎声明的输入尺寸，任一边为零时无法预处理
  fn model_input(&self) -> Result<(u32, u32), AdapterError> {
    let (width, height) = self.engine.input_size();
    if width == 0 || height == 0 {
      return Err(
        EngineError::Execution(format!("引擎输入尺寸无效: {}x{}", width, height)).into(),
      );
    }
    Ok((width, height))
  }
}

enum State {
  Uninitialized,
  Ready(Session),
  Shutdown,
}

/// 各能力后端共用的状态机
pub(crate) struct Lifecycle {
  capability: Capability,
  runtime: Arc<dyn Runtime>,
  state: State,
}

impl Lifecycle {
  pub fn new(capability: Capability, runtime: Arc<dyn Runtime>) -> Self {
    Self {
      capability,
      runtime,
      state: State::Uninitialized,
    }
  }

  pub fn initialize(&mut self, config: &AdapterConfig) -> Result<(), AdapterError> {
    if self.is_initialized() {
      warn!("{} 适配器已初始化，拒绝重复初始化", self.capability);
      return Err(AdapterError::AlreadyInitialized);
    }

    let session = self.open(config).inspect_err(|e| {
      error!("{} 适配器初始化失败: {}", self.capability, e);
    })?;
    info!(
      "{} 适配器初始化完成: 模型 {}, 版本 {}, {} 个类别, 输入 {:?}",
      self.capability,
      config.model_path.display(),
      session.version,
      session.labels.len(),
      session.input_size()
    );
    self.state = State::Ready(session);
    Ok(())
  }

  /// 按顺序校验配置、模型、标签、版本与设备，全部成功后才加载引擎
  fn open(&self, config: &AdapterConfig) -> Result<Session, AdapterError> {
    config.validate()?;
    let model = ModelFile::open(&config.model_path)?;
    let labels = ClassNames::load(&config.labels_path)?;
    let version = model.resolve(config.version_hint()?)?;

    if !factory::supports(self.capability, version) {
      return Err(
        ConfigError::Unsupported {
          capability: self.capability,
          version,
        }
        .into(),
      );
    }

    let device = if config.use_gpu {
      if !self.runtime.gpu_available() {
        return Err(ConfigError::GpuUnavailable(self.runtime.name().to_string()).into());
      }
      Device::Gpu
    } else {
      Device::Cpu
    };

    debug!(
      "使用运行时 {} 在 {:?} 上加载模型",
      self.runtime.name(),
      device
    );
    let engine = self.runtime.load(&model, device)?;
    Ok(Session {
      engine,
      labels,
      version,
    })
  }

  pub fn is_initialized(&self) -> bool {
    matches!(self.state, State::Ready(_))
  }

  pub fn shutdown(&mut self) {
    if let State::Ready(_) = std::mem::replace(&mut self.state, State::Shutdown) {
      info!("{} 适配器已关闭", self.capability);
    }
  }

  pub fn class_names(&self) -> &[String] {
    match &self.state {
      State::Ready(session) => session.labels.as_slice(),
      State::Uninitialized | State::Shutdown => &[],
    }
  }

  pub fn session_mut(&mut self) -> Result<&mut Session, AdapterError> {
    match &mut self.state {
      State::Ready(session) => Ok(session),
      State::Uninitialized | State::Shutdown => Err(AdapterError::NotInitialized),
    }
  }
}
