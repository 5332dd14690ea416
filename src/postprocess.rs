// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess.rs - 模型输出后处理
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ndarray::{ArrayD, ArrayView2, Axis, Ix2};
use thiserror::Error;

pub(crate) mod classify;
pub(crate) mod detect;
pub(crate) mod nms;
pub(crate) mod obb;
pub(crate) mod pose;
pub(crate) mod segment;

#[derive(Error, Debug)]
#[error("模型输出不符合预期: {0}")]
pub struct DecodeError(pub String);

/// 模型输入坐标系下的候选目标
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
  /// [x_min, y_min, x_max, y_max]
  pub bbox: [f32; 4],
  pub score: f32,
  pub class_id: usize,
  /// 掩码系数、关键点或角度等附加通道
  pub extra: Vec<f32>,
}

impl Candidate {
  pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> [f32; 4] {
    [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]
  }
}

impl nms::Suppressible for Candidate {
  fn score(&self) -> f32 {
    self.score
  }

  fn class_id(&self) -> usize {
    self.class_id
  }

  fn overlap(&self, other: &Self) -> f32 {
    nms::iou(&self.bbox, &other.bbox)
  }
}

pub(crate) fn output(outputs: &[ArrayD<f32>], index: usize) -> Result<&ArrayD<f32>, DecodeError> {
  outputs.get(index).ok_or_else(|| {
    DecodeError(format!(
      "缺少第 {} 个输出, 共 {} 个",
      index,
      outputs.len()
    ))
  })
}

/// 去掉批次维度得到二维视图，批次必须为 1
pub(crate) fn rows(tensor: &ArrayD<f32>) -> Result<ArrayView2<'_, f32>, DecodeError> {
  if tensor.ndim() != 3 || tensor.shape()[0] != 1 {
    return Err(DecodeError(format!(
      "期望形状为 [1, A, B] 的输出, 实际为 {:?}",
      tensor.shape()
    )));
  }
  tensor
    .index_axis(Axis(0), 0)
    .into_dimensionality::<Ix2>()
    .map_err(|e| DecodeError(e.to_string()))
}

/// 最大值及其索引，并列时取较小的索引
pub(crate) fn argmax(values: impl IntoIterator<Item = f32>) -> Option<(usize, f32)> {
  values
    .into_iter()
    .enumerate()
    .fold(None, |best, (idx, value)| match best {
      Some((_, best_value)) if best_value >= value => best,
      _ if value.is_nan() => best,
      _ => Some((idx, value)),
    })
}

pub(crate) fn clamp_score(score: f32) -> f32 {
  if score.is_nan() {
    0.0
  } else {
    score.clamp(0.0, 1.0)
  }
}
