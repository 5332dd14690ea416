// 该文件是 Shanan （山南西风） 项目的一部分。
// src/lib.rs - 库主文件
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

//! YOLO 系列感知能力的适配层。
//!
//! 调用方面向 [`adapter`] 中的五种能力接口编程，通过 [`factory`]
//! 获取实例；推理引擎通过 [`engine`] 的运行时接口接入，
//! 引擎大版本变化时只替换后端，接口与结果类型保持不变。

pub mod adapter;
pub mod config;
pub mod engine;
pub mod factory;
pub(crate) mod frame;
pub(crate) mod labels;
pub mod model;
pub(crate) mod output;
mod postprocess;
pub mod result;

pub use adapter::{
  AdapterError, ClassifierAdapter, DEFAULT_KPT_RADIUS, DEFAULT_KPT_THRESHOLD, DEFAULT_MASK_ALPHA,
  DEFAULT_MAX_DET, DetectorAdapter, ObbAdapter, PoseAdapter, SegmentorAdapter, YolosAdapter,
};
pub use config::{AdapterConfig, ConfigError};
pub use engine::{Device, EngineError, InferenceEngine, Runtime, install_runtime};
pub use factory::{
  Capability, create_classifier_adapter, create_classifier_adapter_with, create_detector_adapter,
  create_detector_adapter_with, create_obb_adapter, create_obb_adapter_with, create_pose_adapter,
  create_pose_adapter_with, create_segmentor_adapter, create_segmentor_adapter_with,
};
pub use labels::ClassNames;
pub use model::{ModelFile, YoloVersion};
pub use postprocess::DecodeError;
pub use postprocess::pose::{COCO_SKELETON, POSE_KEYPOINTS};
pub use result::{
  BinaryMask, BoundingBox, Classification, Detection, KeyPoint, OrientedBoundingBox,
  OrientedDetection, Pose, Segmentation,
};

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}
