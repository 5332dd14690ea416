// 该文件是 Shanan （山南西风） 项目的一部分。
// src/postprocess/segment.rs - 分割掩码解码
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ndarray::{ArrayD, ArrayView3, Axis, Ix3};

use super::{DecodeError, output};
use crate::frame::Letterbox;
use crate::result::{BinaryMask, BoundingBox};

/// 第二个输出 `[1, nm, mh, mw]` 的原型掩码视图
pub(crate) fn prototypes(outputs: &[ArrayD<f32>]) -> Result<ArrayView3<'_, f32>, DecodeError> {
  let protos = output(outputs, 1)?;
  if protos.ndim() != 4 || protos.shape()[0] != 1 {
    return Err(DecodeError(format!(
      "原型掩码期望形状为 [1, nm, mh, mw], 实际为 {:?}",
      protos.shape()
    )));
  }
  protos
    .index_axis(Axis(0), 0)
    .into_dimensionality::<Ix3>()
    .map_err(|e| DecodeError(e.to_string()))
}

/// 按掩码系数与原型组合出对齐到 `bbox` 的二值掩码
///
/// 对框内每个原图像素，映射到原型分辨率后取最近邻，
/// 线性组合大于 0（即 sigmoid 大于 0.5）为前景。
pub(crate) fn build_mask(
  coeffs: &[f32],
  protos: &ArrayView3<'_, f32>,
  letterbox: &Letterbox,
  input_size: (u32, u32),
  bbox: &BoundingBox,
) -> BinaryMask {
  let (channels, mh, mw) = protos.dim();
  let mut mask = BinaryMask::new(bbox.width.max(0) as u32, bbox.height.max(0) as u32);
  if channels != coeffs.len() || mh == 0 || mw == 0 {
    return mask;
  }

  let sx = mw as f32 / input_size.0 as f32;
  let sy = mh as f32 / input_size.1 as f32;
  for py in 0..mask.height {
    for px in 0..mask.width {
      let (ix, iy) = letterbox.project(
        bbox.x as f32 + px as f32 + 0.5,
        bbox.y as f32 + py as f32 + 0.5,
      );
      let mx = ((ix * sx) as usize).min(mw - 1);
      let my = ((iy * sy).max(0.0) as usize).min(mh - 1);
      let logit: f32 = coeffs
        .iter()
        .enumerate()
        .map(|(k, c)| c * protos[[k, my, mx]])
        .sum();
      mask.set(px, py, logit > 0.0);
    }
  }
  mask
}
