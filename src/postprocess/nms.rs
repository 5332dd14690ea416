// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/nms.rs - 非极大值抑制
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use crate::result::OrientedBoundingBox;

pub(crate) trait Suppressible {
  fn score(&self) -> f32;
  fn class_id(&self) -> usize;
  fn overlap(&self, other: &Self) -> f32;
}

/// 按类别的贪心 NMS
///
/// 先按置信度降序稳定排序，重叠度大于 `iou_threshold` 的同类低分目标被抑制。
pub(crate) fn non_max_suppression<T: Suppressible>(mut items: Vec<T>, iou_threshold: f32) -> Vec<T> {
  items.sort_by(|a, b| b.score().total_cmp(&a.score()));

  let mut suppressed = vec![false; items.len()];
  for i in 0..items.len() {
    if suppressed[i] {
      continue;
    }
    for j in (i + 1)..items.len() {
      if suppressed[j] || items[i].class_id() != items[j].class_id() {
        continue;
      }
      if items[i].overlap(&items[j]) > iou_threshold {
        suppressed[j] = true;
      }
    }
  }

  items
    .into_iter()
    .zip(suppressed)
    .filter_map(|(item, dropped)| (!dropped).then_some(item))
    .collect()
}

/// 两个 [x_min, y_min, x_max, y_max] 框的 IoU
pub(crate) fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
  let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
  let union = area_a + area_b - intersection;

  if union > 0.0 {
    intersection / union
  } else {
    0.0
  }
}

const PROBIOU_EPS: f32 = 1e-7;

/// 旋转框的高斯协方差分量 (a, b, c)
fn covariance(obb: &OrientedBoundingBox) -> (f32, f32, f32) {
  let a = obb.width * obb.width / 12.0;
  let b = obb.height * obb.height / 12.0;
  let (sin, cos) = obb.angle.sin_cos();
  (
    a * cos * cos + b * sin * sin,
    a * sin * sin + b * cos * cos,
    (a - b) * cos * sin,
  )
}

/// 旋转框 ProbIoU，基于 Bhattacharyya 距离，取值 [0, 1]
pub(crate) fn probiou(p: &OrientedBoundingBox, q: &OrientedBoundingBox) -> f32 {
  let (a1, b1, c1) = covariance(p);
  let (a2, b2, c2) = covariance(q);
  let (dx, dy) = (p.center_x - q.center_x, p.center_y - q.center_y);

  let det = (a1 + a2) * (b1 + b2) - (c1 + c2).powi(2);
  let t1 = ((a1 + a2) * dy * dy + (b1 + b2) * dx * dx) / (det + PROBIOU_EPS) * 0.25;
  let t2 = ((c1 + c2) * (-dx) * dy) / (det + PROBIOU_EPS) * 0.5;
  let spread = ((a1 * b1 - c1 * c1).max(0.0) * (a2 * b2 - c2 * c2).max(0.0)).sqrt();
  let t3 = (det / (4.0 * spread + PROBIOU_EPS) + PROBIOU_EPS).ln() * 0.5;

  let distance = (t1 + t2 + t3).clamp(PROBIOU_EPS, 100.0);
  let hellinger = (1.0 - (-distance).exp() + PROBIOU_EPS).sqrt();
  (1.0 - hellinger).clamp(0.0, 1.0)
}
