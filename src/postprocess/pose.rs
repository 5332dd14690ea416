// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/pose.rs - 关键点解码
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use super::clamp_score;
use crate::frame::Letterbox;
use crate::result::KeyPoint;

/// COCO 人体骨架的关键点数量
pub const POSE_KEYPOINTS: usize = 17;
/// 每个关键点的通道数 (x, y, conf)
pub(crate) const KEYPOINT_DIMS: usize = 3;
pub(crate) const POSE_EXTRA: usize = POSE_KEYPOINTS * KEYPOINT_DIMS;

/// COCO 骨架连线（关键点索引对）
pub const COCO_SKELETON: [(usize, usize); 19] = [
  (15, 13),
  (13, 11),
  (16, 14),
  (14, 12),
  (11, 12),
  (5, 11),
  (6, 12),
  (5, 6),
  (5, 7),
  (6, 8),
  (7, 9),
  (8, 10),
  (1, 2),
  (0, 1),
  (0, 2),
  (1, 3),
  (2, 4),
  (3, 5),
  (4, 6),
];

/// 把附加通道解释为关键点并还原到原图坐标，顺序与骨架索引一致
pub(crate) fn keypoints(extra: &[f32], letterbox: &Letterbox) -> Vec<KeyPoint> {
  let (w, h) = (letterbox.source.0 as f32, letterbox.source.1 as f32);
  extra
    .chunks_exact(KEYPOINT_DIMS)
    .take(POSE_KEYPOINTS)
    .enumerate()
    .map(|(id, kpt)| {
      let (x, y) = letterbox.restore(kpt[0], kpt[1]);
      KeyPoint {
        x: x.clamp(0.0, w),
        y: y.clamp(0.0, h),
        confidence: clamp_score(kpt[2]),
        id,
      }
    })
    .collect()
}
