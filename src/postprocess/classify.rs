// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/classify.rs - 分类输出解码
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ndarray::ArrayD;

use super::{DecodeError, argmax, clamp_score, output};

const PROBABILITY_TOLERANCE: f32 = 1e-3;

/// `[1, nc]` 或 `[nc]` 的 Top-1，返回 (class_id, confidence)
///
/// 若输出不是概率分布则先做 softmax；类别被限制在标签表范围内。
pub(crate) fn top1(outputs: &[ArrayD<f32>], num_labels: usize) -> Result<(usize, f32), DecodeError> {
  let logits = output(outputs, 0)?;
  let shape = logits.shape();
  let valid = match shape {
    [_] => true,
    [1, _] => true,
    _ => false,
  };
  if !valid {
    return Err(DecodeError(format!(
      "分类输出期望形状为 [1, nc] 或 [nc], 实际为 {:?}",
      shape
    )));
  }

  let values: Vec<f32> = logits.iter().copied().collect();
  let probs = if is_distribution(&values) {
    values
  } else {
    softmax(&values)
  };

  let usable = probs.len().min(num_labels);
  argmax(probs[..usable].iter().copied())
    .map(|(class_id, score)| (class_id, clamp_score(score)))
    .ok_or_else(|| DecodeError("分类输出为空".to_string()))
}

fn is_distribution(values: &[f32]) -> bool {
  let sum: f32 = values.iter().sum();
  values.iter().all(|v| (0.0..=1.0).contains(v)) && (sum - 1.0).abs() <= PROBABILITY_TOLERANCE
}

fn softmax(values: &[f32]) -> Vec<f32> {
  let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  let exps: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
  let sum: f32 = exps.iter().sum();
  exps.into_iter().map(|e| e / sum).collect()
}
