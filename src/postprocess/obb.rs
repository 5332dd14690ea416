// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/obb.rs - 旋转框解码
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ndarray::ArrayD;
use tracing::debug;

use super::detect::{self, DecodeSpec};
use super::nms::{Suppressible, probiou};
use super::{DecodeError, clamp_score, output, rows};
use crate::model::Head;
use crate::result::OrientedBoundingBox;

/// 模型坐标系下的旋转候选
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RotatedCandidate {
  pub bbox: OrientedBoundingBox,
  pub score: f32,
  pub class_id: usize,
}

impl Suppressible for RotatedCandidate {
  fn score(&self) -> f32 {
    self.score
  }

  fn class_id(&self) -> usize {
    self.class_id
  }

  fn overlap(&self, other: &Self) -> f32 {
    probiou(&self.bbox, &other.bbox)
  }
}

/// 无锚头为 `[1, 4 + nc + 1, N]`（角度在最后一行），
/// 端到端头为 `[1, N, 7]`：cx, cy, w, h, score, class, angle
pub(crate) fn decode(
  head: Head,
  outputs: &[ArrayD<f32>],
  num_labels: usize,
  conf_threshold: f32,
) -> Result<Vec<RotatedCandidate>, DecodeError> {
  match head {
    Head::AnchorFree => {
      let spec = DecodeSpec {
        num_labels,
        extra: 1,
        conf_threshold,
      };
      let candidates = detect::decode(head, outputs, spec)?;
      Ok(
        candidates
          .into_iter()
          .map(|c| RotatedCandidate {
            bbox: OrientedBoundingBox {
              center_x: (c.bbox[0] + c.bbox[2]) / 2.0,
              center_y: (c.bbox[1] + c.bbox[3]) / 2.0,
              width: c.bbox[2] - c.bbox[0],
              height: c.bbox[3] - c.bbox[1],
              angle: c.extra[0],
            },
            score: c.score,
            class_id: c.class_id,
          })
          .collect(),
      )
    }
    Head::EndToEnd => decode_end_to_end(outputs, num_labels, conf_threshold),
    other => Err(DecodeError(format!("{:?} 不支持旋转框输出", other))),
  }
}

fn decode_end_to_end(
  outputs: &[ArrayD<f32>],
  num_labels: usize,
  conf_threshold: f32,
) -> Result<Vec<RotatedCandidate>, DecodeError> {
  let view = rows(output(outputs, 0)?)?;
  let (anchors, channels) = view.dim();
  if channels != 7 {
    return Err(DecodeError(format!(
      "端到端旋转框输出期望 7 个通道, 实际为 {}",
      channels
    )));
  }

  let mut items = Vec::new();
  for n in 0..anchors {
    let row = view.row(n);
    let score = clamp_score(row[4]);
    if score <= conf_threshold {
      continue;
    }
    let class = row[5].round();
    if !(class >= 0.0 && (class as usize) < num_labels) {
      debug!("丢弃超出标签表的类别: {}", row[5]);
      continue;
    }
    items.push(RotatedCandidate {
      bbox: OrientedBoundingBox {
        center_x: row[0],
        center_y: row[1],
        width: row[2].max(0.0),
        height: row[3].max(0.0),
        angle: row[6],
      },
      score,
      class_id: class as usize,
    });
  }
  Ok(items)
}
