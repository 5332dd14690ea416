// 该文件是 Shanan （山南西风） 项目的一部分。
// src/adapter/detector.rs - YOLO 目标检测后端
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::sync::Arc;

use image::RgbImage;
use tracing::debug;

use super::lifecycle::Lifecycle;
use super::{AdapterError, DetectorAdapter};
use crate::config::check_threshold;
use crate::engine::Runtime;
use crate::factory::Capability;
use crate::output::Visualizer;
use crate::postprocess::detect::{self, DecodeSpec};
use crate::postprocess::nms::non_max_suppression;
use crate::result::{BoundingBox, Detection};

/// YOLO 目标检测器
pub(crate) struct YoloDetector {
  lifecycle: Lifecycle,
  visualizer: Visualizer,
}

impl YoloDetector {
  pub fn new(runtime: Arc<dyn Runtime>) -> Self {
    Self {
      lifecycle: Lifecycle::new(Capability::Detect, runtime),
      visualizer: Visualizer::new(),
    }
  }
}

impl_yolos_adapter!(YoloDetector);

impl DetectorAdapter for YoloDetector {
  fn detect(
    &mut self,
    image: &RgbImage,
    conf_threshold: f32,
    nms_threshold: f32,
  ) -> Result<Vec<Detection>, AdapterError> {
    let session = self.lifecycle.session_mut()?;
    check_threshold("conf_threshold", conf_threshold)?;
    check_threshold("nms_threshold", nms_threshold)?;

    let (letterbox, outputs) = session.run_letterboxed(image)?;
    let spec = DecodeSpec {
      num_labels: session.labels().len(),
      extra: 0,
      conf_threshold,
    };
    let candidates = detect::decode(session.head(), &outputs, spec)?;
    let kept = non_max_suppression(candidates, nms_threshold);

    let detections: Vec<Detection> = kept
      .into_iter()
      .filter_map(|candidate| {
        let [x_min, y_min, x_max, y_max] = letterbox.restore_box(&candidate.bbox);
        let bbox = BoundingBox::from_corners(x_min, y_min, x_max, y_max);
        // 完全落在填充区域的框还原后没有面积
        (!bbox.is_empty()).then(|| Detection {
          bbox,
          confidence: candidate.score,
          class_id: candidate.class_id,
          class_name: session.class_name(candidate.class_id),
        })
      })
      .collect();

    debug!("检测到 {} 个目标", detections.len());
    Ok(detections)
  }

  fn draw_detections(&self, image: &mut RgbImage, detections: &[Detection]) {
    self.visualizer.draw_detections(image, detections);
  }
}
