// 该文件是 Shanan （山南西风） 项目的一部分。
// src/adapter.rs - 能力接口定义
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

//! 五种能力的稳定接口。
//!
//! 调用方只面向这些 trait 编程，具体后端随推理引擎版本替换。
//! 每个实例同一时间只允许一个调用者（推理接口需要 `&mut self`），
//! 不同实例之间互不共享后端状态，可以并发运行。
//!
//! 状态机：未初始化 --initialize--> 已初始化 --shutdown--> 已关闭。
//! `shutdown` 在任何状态下都可调用且幂等；关闭后可以重新 `initialize`。
//! 已初始化时再次 `initialize` 会被拒绝，原状态保持不变。

use image::RgbImage;
use thiserror::Error;

use crate::config::{AdapterConfig, ConfigError};
use crate::engine::EngineError;
use crate::postprocess::DecodeError;
use crate::result::{Classification, Detection, OrientedDetection, Pose, Segmentation};

/// 为持有 `lifecycle` 字段的后端实现生命周期接口
macro_rules! impl_yolos_adapter {
  ($ty:ty) => {
    impl $crate::adapter::YolosAdapter for $ty {
      fn initialize(
        &mut self,
        config: &$crate::config::AdapterConfig,
      ) -> Result<(), $crate::adapter::AdapterError> {
        self.lifecycle.initialize(config)
      }

      fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
      }

      fn shutdown(&mut self) {
        self.lifecycle.shutdown()
      }

      fn class_names(&self) -> &[String] {
        self.lifecycle.class_names()
      }
    }
  };
}

mod classifier;
mod detector;
mod lifecycle;
mod obb;
mod pose;
mod segmentor;

pub(crate) use self::classifier::YoloClassifier;
pub(crate) use self::detector::YoloDetector;
pub(crate) use self::obb::YoloObbDetector;
pub(crate) use self::pose::YoloPose;
pub(crate) use self::segmentor::YoloSegmentor;

/// 掩码叠加的默认不透明度
pub const DEFAULT_MASK_ALPHA: f32 = 0.5;
/// 关键点默认半径（像素）
pub const DEFAULT_KPT_RADIUS: u32 = 4;
/// 关键点默认绘制阈值
pub const DEFAULT_KPT_THRESHOLD: f32 = 0.5;
/// 旋转框检测默认最大数量
pub const DEFAULT_MAX_DET: usize = 300;

#[derive(Error, Debug)]
pub enum AdapterError {
  #[error("配置错误: {0}")]
  Config(#[from] ConfigError),
  #[error("引擎错误: {0}")]
  Engine(#[from] EngineError),
  #[error(transparent)]
  Decode(#[from] DecodeError),
  #[error("适配器未初始化")]
  NotInitialized,
  #[error("适配器已初始化，请先调用 shutdown")]
  AlreadyInitialized,
  #[error("输入图像为空")]
  EmptyImage,
}

/// 所有能力共有的生命周期接口
pub trait YolosAdapter: Send {
  /// 校验配置、加载标签并准备后端
  ///
  /// 失败时实例保持调用前的状态，不会残留部分资源。
  fn initialize(&mut self, config: &AdapterConfig) -> Result<(), AdapterError>;

  fn is_initialized(&self) -> bool;

  /// 释放全部后端资源，任何状态下都可以调用，重复调用无副作用
  fn shutdown(&mut self);

  /// 初始化时冻结的类别名称表，未初始化时为空
  fn class_names(&self) -> &[String];
}

/// 目标检测
pub trait DetectorAdapter: YolosAdapter {
  /// 返回经过置信度过滤与 NMS 的检测结果，相同输入得到相同顺序
  fn detect(
    &mut self,
    image: &RgbImage,
    conf_threshold: f32,
    nms_threshold: f32,
  ) -> Result<Vec<Detection>, AdapterError>;

  fn draw_detections(&self, image: &mut RgbImage, detections: &[Detection]);
}

/// 实例分割
pub trait SegmentorAdapter: YolosAdapter {
  /// 每个结果的掩码与其边界框同尺寸，并由结果独占
  fn segment(
    &mut self,
    image: &RgbImage,
    conf_threshold: f32,
    nms_threshold: f32,
  ) -> Result<Vec<Segmentation>, AdapterError>;

  /// 按 `mask_alpha` 不透明度叠加掩码，常用值为 [`DEFAULT_MASK_ALPHA`]
  fn draw_segmentations(&self, image: &mut RgbImage, segmentations: &[Segmentation], mask_alpha: f32);
}

/// 姿态估计
pub trait PoseAdapter: YolosAdapter {
  /// 每个实例的关键点数量固定，顺序与骨架拓扑一致
  fn detect(
    &mut self,
    image: &RgbImage,
    conf_threshold: f32,
    nms_threshold: f32,
  ) -> Result<Vec<Pose>, AdapterError>;

  /// 只绘制置信度大于 `kpt_threshold` 的关键点
  fn draw_poses(&self, image: &mut RgbImage, poses: &[Pose], kpt_radius: u32, kpt_threshold: f32);
}

/// 旋转框检测
pub trait ObbAdapter: YolosAdapter {
  /// 最多返回 `max_det` 个结果，NMS 基于旋转几何
  fn detect(
    &mut self,
    image: &RgbImage,
    conf_threshold: f32,
    nms_threshold: f32,
    max_det: usize,
  ) -> Result<Vec<OrientedDetection>, AdapterError>;

  fn draw_detections(&self, image: &mut RgbImage, detections: &[OrientedDetection]);
}

/// 图像分类
pub trait ClassifierAdapter: YolosAdapter {
  /// 恰好返回一个 Top-1 结果
  fn classify(&mut self, image: &RgbImage) -> Result<Classification, AdapterError>;

  fn draw_result(&self, image: &mut RgbImage, result: &Classification);
}
