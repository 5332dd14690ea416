// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/detect.rs - 检测头解码
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ndarray::ArrayD;
use tracing::debug;

use super::{Candidate, DecodeError, argmax, clamp_score, output, rows};
use crate::model::Head;

/// 解码所需的参数
#[derive(Debug, Clone, Copy)]
pub(crate) struct DecodeSpec {
  /// 标签表长度，类别索引不会超出该范围
  pub num_labels: usize,
  /// 每个候选在类别之后附带的通道数
  pub extra: usize,
  /// 严格大于该阈值的候选才保留
  pub conf_threshold: f32,
}

/// 把第一个输出（NAS 为前两个）解码为候选框，未做 NMS
pub(crate) fn decode(
  head: Head,
  outputs: &[ArrayD<f32>],
  spec: DecodeSpec,
) -> Result<Vec<Candidate>, DecodeError> {
  let candidates = match head {
    Head::AnchorFree => decode_anchor_free(outputs, spec)?,
    Head::Objectness => decode_objectness(outputs, spec)?,
    Head::EndToEnd => decode_end_to_end(outputs, spec)?,
    Head::SplitScores => decode_split_scores(outputs, spec)?,
  };
  debug!("{:?} 解码得到 {} 个候选", head, candidates.len());
  Ok(candidates)
}

fn class_count(channels: usize, fixed: usize, spec: &DecodeSpec) -> Result<usize, DecodeError> {
  let classes = channels.saturating_sub(fixed + spec.extra);
  if classes == 0 {
    return Err(DecodeError(format!(
      "通道数 {} 不足以容纳 {} 个固定通道与 {} 个附加通道",
      channels, fixed, spec.extra
    )));
  }
  if classes != spec.num_labels {
    debug!("模型类别数 {} 与标签数 {} 不一致", classes, spec.num_labels);
  }
  Ok(classes)
}

/// `[1, 4 + nc + extra, N]`
fn decode_anchor_free(
  outputs: &[ArrayD<f32>],
  spec: DecodeSpec,
) -> Result<Vec<Candidate>, DecodeError> {
  let view = rows(output(outputs, 0)?)?;
  let (channels, anchors) = view.dim();
  let classes = class_count(channels, 4, &spec)?;
  let usable = classes.min(spec.num_labels);

  let mut items = Vec::new();
  for n in 0..anchors {
    let Some((class_id, score)) = argmax((4..4 + usable).map(|c| view[[c, n]])) else {
      continue;
    };
    let score = clamp_score(score);
    if score <= spec.conf_threshold {
      continue;
    }
    items.push(Candidate {
      bbox: Candidate::from_center(view[[0, n]], view[[1, n]], view[[2, n]], view[[3, n]]),
      score,
      class_id,
      extra: (4 + classes..channels).map(|c| view[[c, n]]).collect(),
    });
  }
  Ok(items)
}

/// `[1, N, 5 + nc + extra]`，分数为物体性乘以类别分数
fn decode_objectness(
  outputs: &[ArrayD<f32>],
  spec: DecodeSpec,
) -> Result<Vec<Candidate>, DecodeError> {
  let view = rows(output(outputs, 0)?)?;
  let (anchors, channels) = view.dim();
  let classes = class_count(channels, 5, &spec)?;
  let usable = classes.min(spec.num_labels);

  let mut items = Vec::new();
  for n in 0..anchors {
    let row = view.row(n);
    let objectness = row[4];
    if objectness <= spec.conf_threshold {
      continue;
    }
    let Some((class_id, class_score)) = argmax((5..5 + usable).map(|c| row[c])) else {
      continue;
    };
    let score = clamp_score(objectness * class_score);
    if score <= spec.conf_threshold {
      continue;
    }
    items.push(Candidate {
      bbox: Candidate::from_center(row[0], row[1], row[2], row[3]),
      score,
      class_id,
      extra: (5 + classes..channels).map(|c| row[c]).collect(),
    });
  }
  Ok(items)
}

/// `[1, N, 6 + extra]`：x_min, y_min, x_max, y_max, score, class
fn decode_end_to_end(
  outputs: &[ArrayD<f32>],
  spec: DecodeSpec,
) -> Result<Vec<Candidate>, DecodeError> {
  let view = rows(output(outputs, 0)?)?;
  let (anchors, channels) = view.dim();
  if channels != 6 + spec.extra {
    return Err(DecodeError(format!(
      "端到端输出期望 {} 个通道, 实际为 {}",
      6 + spec.extra,
      channels
    )));
  }

  let mut items = Vec::new();
  for n in 0..anchors {
    let row = view.row(n);
    let score = clamp_score(row[4]);
    if score <= spec.conf_threshold {
      continue;
    }
    let class = row[5].round();
    if !(class >= 0.0 && (class as usize) < spec.num_labels) {
      debug!("丢弃超出标签表的类别: {}", row[5]);
      continue;
    }
    items.push(Candidate {
      bbox: [row[0], row[1], row[2], row[3]],
      score,
      class_id: class as usize,
      extra: (6..channels).map(|c| row[c]).collect(),
    });
  }
  Ok(items)
}

/// 框 `[1, N, 4]` 与分数 `[1, N, nc]` 两个输出
fn decode_split_scores(
  outputs: &[ArrayD<f32>],
  spec: DecodeSpec,
) -> Result<Vec<Candidate>, DecodeError> {
  if spec.extra != 0 {
    return Err(DecodeError("分离分数输出不支持附加通道".to_string()));
  }
  let boxes = rows(output(outputs, 0)?)?;
  let scores = rows(output(outputs, 1)?)?;
  let (anchors, coords) = boxes.dim();
  let (score_rows, classes) = scores.dim();
  if coords != 4 || score_rows != anchors || classes == 0 {
    return Err(DecodeError(format!(
      "框输出 {:?} 与分数输出 {:?} 不匹配",
      boxes.dim(),
      scores.dim()
    )));
  }
  let usable = classes.min(spec.num_labels);

  let mut items = Vec::new();
  for n in 0..anchors {
    let Some((class_id, score)) = argmax((0..usable).map(|c| scores[[n, c]])) else {
      continue;
    };
    let score = clamp_score(score);
    if score <= spec.conf_threshold {
      continue;
    }
    items.push(Candidate {
      bbox: [boxes[[n, 0]], boxes[[n, 1]], boxes[[n, 2]], boxes[[n, 3]]],
      score,
      class_id,
      extra: Vec::new(),
    });
  }
  Ok(items)
}
