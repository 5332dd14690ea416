// 该文件是 Shanan （山南西风） 项目的一部分。
// src/factory.rs - 适配器工厂与版本支持表
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

//! 每种能力一个工厂函数，返回未初始化的新实例。
//!
//! 构造不做任何 I/O，模型与标签都在 `initialize` 时才加载。
//! 无参数版本绑定 [`install_runtime`](crate::engine::install_runtime)
//! 注册的运行时，`_with` 版本显式指定运行时。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::adapter::{
  ClassifierAdapter, DetectorAdapter, ObbAdapter, PoseAdapter, SegmentorAdapter, YoloClassifier,
  YoloDetector, YoloObbDetector, YoloPose, YoloSegmentor,
};
use crate::engine::{Runtime, default_runtime};
use crate::model::YoloVersion;

/// 五种感知能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
  Detect,
  Segment,
  Pose,
  Obb,
  Classify,
}

impl Capability {
  pub const ALL: [Capability; 5] = [
    Capability::Detect,
    Capability::Segment,
    Capability::Pose,
    Capability::Obb,
    Capability::Classify,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Capability::Detect => "detect",
      Capability::Segment => "segment",
      Capability::Pose => "pose",
      Capability::Obb => "obb",
      Capability::Classify => "classify",
    }
  }
}

impl fmt::Display for Capability {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Capability {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lower = s.trim().to_ascii_lowercase();
    Capability::ALL
      .into_iter()
      .find(|c| c.name() == lower)
      .ok_or_else(|| {
        format!(
          "未知能力 '{}', 可选: detect, segment, pose, obb, classify",
          s
        )
      })
  }
}

/// 能力与引擎代际的静态支持表
///
/// 检测支持全部代际；分割、姿态、旋转框与分类只有 v8、v11 与 v26 提供。
pub fn supports(capability: Capability, version: YoloVersion) -> bool {
  match capability {
    Capability::Detect => true,
    Capability::Segment | Capability::Pose | Capability::Obb | Capability::Classify => matches!(
      version,
      YoloVersion::V8 | YoloVersion::V11 | YoloVersion::V26
    ),
  }
}

pub fn supported_versions(capability: Capability) -> Vec<YoloVersion> {
  YoloVersion::ALL
    .into_iter()
    .filter(|&v| supports(capability, v))
    .collect()
}

pub fn create_detector_adapter() -> Box<dyn DetectorAdapter> {
  create_detector_adapter_with(default_runtime())
}

pub fn create_detector_adapter_with(runtime: Arc<dyn Runtime>) -> Box<dyn DetectorAdapter> {
  Box::new(YoloDetector::new(runtime))
}

pub fn create_segmentor_adapter() -> Box<dyn SegmentorAdapter> {
  create_segmentor_adapter_with(default_runtime())
}

pub fn create_segmentor_adapter_with(runtime: Arc<dyn Runtime>) -> Box<dyn SegmentorAdapter> {
  Box::new(YoloSegmentor::new(runtime))
}

pub fn create_pose_adapter() -> Box<dyn PoseAdapter> {
  create_pose_adapter_with(default_runtime())
}

pub fn create_pose_adapter_with(runtime: Arc<dyn Runtime>) -> Box<dyn PoseAdapter> {
  Box::new(YoloPose::new(runtime))
}

pub fn create_obb_adapter() -> Box<dyn ObbAdapter> {
  create_obb_adapter_with(default_runtime())
}

pub fn create_obb_adapter_with(runtime: Arc<dyn Runtime>) -> Box<dyn ObbAdapter> {
  Box::new(YoloObbDetector::new(runtime))
}

pub fn create_classifier_adapter() -> Box<dyn ClassifierAdapter> {
  create_classifier_adapter_with(default_runtime())
}

pub fn create_classifier_adapter_with(runtime: Arc<dyn Runtime>) -> Box<dyn ClassifierAdapter> {
  Box::new(YoloClassifier::new(runtime))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_capabilities() {
    assert_eq!("Detect".parse::<Capability>(), Ok(Capability::Detect));
    assert_eq!(" obb ".parse::<Capability>(), Ok(Capability::Obb));
    assert!("track".parse::<Capability>().is_err());
  }

  #[test]
  fn detection_covers_every_generation() {
    assert_eq!(supported_versions(Capability::Detect), YoloVersion::ALL.to_vec());
  }

  #[test]
  fn dense_tasks_need_newer_generations() {
    for capability in [Capability::Segment, Capability::Pose, Capability::Obb, Capability::Classify] {
      assert!(!supports(capability, YoloVersion::V7));
      assert!(!supports(capability, YoloVersion::V10));
      assert!(!supports(capability, YoloVersion::Nas));
      assert!(supports(capability, YoloVersion::V11));
    }
  }

  #[test]
  fn factories_return_uninitialized_instances() {
    let detector = create_detector_adapter();
    assert!(!detector.is_initialized());
    assert!(detector.class_names().is_empty());
    assert!(!create_segmentor_adapter().is_initialized());
    assert!(!create_pose_adapter().is_initialized());
    assert!(!create_obb_adapter().is_initialized());
    assert!(!create_classifier_adapter().is_initialized());
  }
}
