// 该文件是 Shanan （山南西风） 项目的一部分。
// src/adapter/obb.rs - YOLO 旋转框检测后端
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
use super::{AdapterError, ObbAdapter};
use crate::config::check_threshold;
use crate::engine::Runtime;
use crate::factory::Capability;
use crate::output::Visualizer;
use crate::postprocess::nms::non_max_suppression;
use crate::postprocess::obb;
use crate::result::{OrientedBoundingBox, OrientedDetection};

pub(crate) struct YoloObbDetector {
  lifecycle: Lifecycle,
  visualizer: Visualizer,
}

impl YoloObbDetector {
  pub fn new(runtime: Arc<dyn Runtime>) -> Self {
    Self {
      lifecycle: Lifecycle::new(Capability::Obb, runtime),
      visualizer: Visualizer::new(),
    }
  }
}

impl_yolos_adapter!(YoloObbDetector);

impl ObbAdapter for YoloObbDetector {
  fn detect(
    &mut self,
    image: &RgbImage,
    conf_threshold: f32,
    nms_threshold: f32,
    max_det: usize,
  ) -> Result<Vec<OrientedDetection>, AdapterError> {
    let session = self.lifecycle.session_mut()?;
    check_threshold("conf_threshold", conf_threshold)?;
    check_threshold("nms_threshold", nms_threshold)?;

    let (letterbox, outputs) = session.run_letterboxed(image)?;
    let candidates = obb::decode(
      session.head(),
      &outputs,
      session.labels().len(),
      conf_threshold,
    )?;
    let mut kept = non_max_suppression(candidates, nms_threshold);
    kept.truncate(max_det);

    let (w, h) = (letterbox.source.0 as f32, letterbox.source.1 as f32);
    let detections: Vec<OrientedDetection> = kept
      .into_iter()
      .map(|candidate| {
        let (cx, cy) = letterbox.restore(candidate.bbox.center_x, candidate.bbox.center_y);
        OrientedDetection {
          bbox: OrientedBoundingBox {
            center_x: cx.clamp(0.0, w),
            center_y: cy.clamp(0.0, h),
            width: letterbox.restore_length(candidate.bbox.width),
            height: letterbox.restore_length(candidate.bbox.height),
            angle: candidate.bbox.angle,
          },
          confidence: candidate.score,
          class_id: candidate.class_id,
          class_name: session.class_name(candidate.class_id),
        }
      })
      .collect();

    debug!("检测到 {} 个旋转目标", detections.len());
    Ok(detections)
  }

  fn draw_detections(&self, image: &mut RgbImage, detections: &[OrientedDetection]) {
    self.visualizer.draw_oriented(image, detections);
  }
}
