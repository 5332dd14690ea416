// 该文件是 Shanan （山南西风） 项目的一部分。
// src/adapter/classifier.rs - YOLO 图像分类后端
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
use super::{AdapterError, ClassifierAdapter};
use crate::engine::Runtime;
use crate::factory::Capability;
use crate::output::Visualizer;
use crate::postprocess::classify::top1;
use crate::result::Classification;

pub(crate) struct YoloClassifier {
  lifecycle: Lifecycle,
  visualizer: Visualizer,
}

impl YoloClassifier {
  pub fn new(runtime: Arc<dyn Runtime>) -> Self {
    Self {
      lifecycle: Lifecycle::new(Capability::Classify, runtime),
      visualizer: Visualizer::new(),
    }
  }
}

impl_yolos_adapter!(YoloClassifier);

impl ClassifierAdapter for YoloClassifier {
  fn classify(&mut self, image: &RgbImage) -> Result<Classification, AdapterError> {
    let session = self.lifecycle.session_mut()?;
    let outputs = session.run_center_cropped(image)?;
    let (class_id, confidence) = top1(&outputs, session.labels().len())?;

    let result = Classification {
      class_id,
      confidence,
      class_name: session.class_name(class_id),
    };
    debug!("分类结果: {} ({:.3})", result.class_name, result.confidence);
    Ok(result)
  }

  fn draw_result(&self, image: &mut RgbImage, result: &Classification) {
    self.visualizer.draw_classification(image, result);
  }
}
