// 该文件是 Shanan （山南西风） 项目的一部分。
// src/adapter/pose.rs - YOLO 姿态估计后端
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
use super::{AdapterError, PoseAdapter};
use crate::config::check_threshold;
use crate::engine::Runtime;
use crate::factory::Capability;
use crate::output::Visualizer;
use crate::postprocess::detect::{self, DecodeSpec};
use crate::postprocess::nms::non_max_suppression;
use crate::postprocess::pose::{POSE_EXTRA, keypoints};
use crate::result::{BoundingBox, Pose};

pub(crate) struct YoloPose {
  lifecycle: Lifecycle,
  visualizer: Visualizer,
}

impl YoloPose {
  pub fn new(runtime: Arc<dyn Runtime>) -> Self {
    Self {
      lifecycle: Lifecycle::new(Capability::Pose, runtime),
      visualizer: Visualizer::new(),
    }
  }
}

impl_yolos_adapter!(YoloPose);

impl PoseAdapter for YoloPose {
  fn detect(
    &mut self,
    image: &RgbImage,
    conf_threshold: f32,
    nms_threshold: f32,
  ) -> Result<Vec<Pose>, AdapterError> {
    let session = self.lifecycle.session_mut()?;
    check_threshold("conf_threshold", conf_threshold)?;
    check_threshold("nms_threshold", nms_threshold)?;

    let (letterbox, outputs) = session.run_letterboxed(image)?;
    let spec = DecodeSpec {
      num_labels: session.labels().len(),
      extra: POSE_EXTRA,
      conf_threshold,
    };
    let candidates = detect::decode(session.head(), &outputs, spec)?;
    let kept = non_max_suppression(candidates, nms_threshold);

    let poses: Vec<Pose> = kept
      .into_iter()
      .filter_map(|candidate| {
        let [x_min, y_min, x_max, y_max] = letterbox.restore_box(&candidate.bbox);
        let bbox = BoundingBox::from_corners(x_min, y_min, x_max, y_max);
        (!bbox.is_empty()).then(|| Pose {
          bbox,
          confidence: candidate.score,
          class_id: candidate.class_id,
          class_name: session.class_name(candidate.class_id),
          keypoints: keypoints(&candidate.extra, &letterbox),
        })
      })
      .collect();

    debug!("检测到 {} 个姿态实例", poses.len());
    Ok(poses)
  }

  fn draw_poses(&self, image: &mut RgbImage, poses: &[Pose], kpt_radius: u32, kpt_threshold: f32) {
    self
      .visualizer
      .draw_poses(image, poses, kpt_radius, kpt_threshold);
  }
}
