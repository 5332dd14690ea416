// 该文件是 Shanan （山南西风） 项目的一部分。
// src/adapter/segmentor.rs - YOLO 实例分割后端
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
use super::{AdapterError, SegmentorAdapter};
use crate::config::check_threshold;
use crate::engine::Runtime;
use crate::factory::Capability;
use crate::output::Visualizer;
use crate::postprocess::detect::{self, DecodeSpec};
use crate::postprocess::nms::non_max_suppression;
use crate::postprocess::segment::{build_mask, prototypes};
use crate::result::{BoundingBox, Segmentation};

/// YOLO 实例分割器，输出为检测头加原型掩码
pub(crate) struct YoloSegmentor {
  lifecycle: Lifecycle,
  visualizer: Visualizer,
}

impl YoloSegmentor {
  pub fn new(runtime: Arc<dyn Runtime>) -> Self {
    Self {
      lifecycle: Lifecycle::new(Capability::Segment, runtime),
      visualizer: Visualizer::new(),
    }
  }
}

impl_yolos_adapter!(YoloSegmentor);

impl SegmentorAdapter for YoloSegmentor {
  fn segment(
    &mut self,
    image: &RgbImage,
    conf_threshold: f32,
    nms_threshold: f32,
  ) -> Result<Vec<Segmentation>, AdapterError> {
    let session = self.lifecycle.session_mut()?;
    check_threshold("conf_threshold", conf_threshold)?;
    check_threshold("nms_threshold", nms_threshold)?;

    let input_size = session.input_size();
    let (letterbox, outputs) = session.run_letterboxed(image)?;
    let protos = prototypes(&outputs)?;
    let spec = DecodeSpec {
      num_labels: session.labels().len(),
      extra: protos.dim().0,
      conf_threshold,
    };
    let candidates = detect::decode(session.head(), &outputs, spec)?;
    let kept = non_max_suppression(candidates, nms_threshold);

    let mut segmentations = Vec::with_capacity(kept.len());
    for candidate in kept {
      let [x_min, y_min, x_max, y_max] = letterbox.restore_box(&candidate.bbox);
      let bbox = BoundingBox::from_corners(x_min, y_min, x_max, y_max);
      if bbox.is_empty() {
        continue;
      }
      let mask = build_mask(&candidate.extra, &protos, &letterbox, input_size, &bbox);
      segmentations.push(Segmentation {
        bbox,
        confidence: candidate.score,
        class_id: candidate.class_id,
        class_name: session.class_name(candidate.class_id),
        mask,
      });
    }

    debug!("分割得到 {} 个实例", segmentations.len());
    Ok(segmentations)
  }

  fn draw_segmentations(&self, image: &mut RgbImage, segmentations: &[Segmentation], mask_alpha: f32) {
    self
      .visualizer
      .draw_segmentations(image, segmentations, mask_alpha);
  }
}
