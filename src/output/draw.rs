// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/draw.rs - 绘制原语
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
  draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
  draw_text_mut, text_size,
};
use imageproc::rect::Rect;

use crate::result::{BinaryMask, BoundingBox};

// 文本渲染常量
pub(super) const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 没有字体时按每字符平均宽度估算
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// 两像素宽的矩形边框，零宽高的框不绘制
pub(super) fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
  if bbox.is_empty() {
    return;
  }
  let (width, height) = (bbox.width as u32, bbox.height as u32);
  draw_hollow_rect_mut(image, Rect::at(bbox.x, bbox.y).of_size(width, height), color);

  // 第二道内框增加可见度
  if width > 2 && height > 2 {
    let inner = Rect::at(bbox.x + 1, bbox.y + 1).of_size(width - 2, height - 2);
    draw_hollow_rect_mut(image, inner, color);
  }
}

/// 在 (x, y) 上方绘制带背景的标签，空间不足时贴着图像顶部
pub(super) fn draw_label(
  image: &mut RgbImage,
  font: Option<&FontArc>,
  scale: PxScale,
  x: i32,
  y: i32,
  text: &str,
  background: Rgb<u8>,
) {
  let text_width = match font {
    Some(font) => text_size(scale, font, text).0 as i32,
    None => (text.chars().count() as f32 * LABEL_CHAR_WIDTH) as i32,
  };
  let label_x = x.clamp(0, image.width() as i32);
  let label_y = (y - LABEL_TEXT_HEIGHT).max(0);
  let label_width = text_width.min(image.width() as i32 - label_x);
  if label_width <= 0 {
    return;
  }

  let rect = Rect::at(label_x, label_y).of_size(label_width as u32, LABEL_TEXT_HEIGHT as u32);
  draw_filled_rect_mut(image, rect, background);
  if let Some(font) = font {
    draw_text_mut(
      image,
      LABEL_TEXT_COLOR,
      label_x,
      label_y + LABEL_TEXT_VERTICAL_PADDING,
      scale,
      font,
      text,
    );
  }
}

/// 以 `alpha` 不透明度把掩码前景叠加到框所在位置
pub(super) fn blend_mask(
  image: &mut RgbImage,
  mask: &BinaryMask,
  bbox: &BoundingBox,
  color: Rgb<u8>,
  alpha: f32,
) {
  let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
  if alpha == 0.0 {
    return;
  }
  let (width, height) = image.dimensions();
  for my in 0..mask.height {
    for mx in 0..mask.width {
      if !mask.get(mx, my) {
        continue;
      }
      let x = bbox.x as i64 + mx as i64;
      let y = bbox.y as i64 + my as i64;
      if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        continue;
      }
      let pixel = image.get_pixel_mut(x as u32, y as u32);
      for c in 0..3 {
        let blended = pixel[c] as f32 * (1.0 - alpha) + color[c] as f32 * alpha;
        pixel[c] = blended.round().clamp(0.0, 255.0) as u8;
      }
    }
  }
}

/// 闭合多边形的轮廓
pub(super) fn draw_polygon_outline(image: &mut RgbImage, corners: &[(f32, f32)], color: Rgb<u8>) {
  for (i, &start) in corners.iter().enumerate() {
    let end = corners[(i + 1) % corners.len()];
    draw_line_segment_mut(image, start, end, color);
  }
}

pub(super) fn draw_disc(image: &mut RgbImage, x: f32, y: f32, radius: u32, color: Rgb<u8>) {
  draw_filled_circle_mut(
    image,
    (x.round() as i32, y.round() as i32),
    radius as i32,
    color,
  );
}

pub(super) fn draw_segment(
  image: &mut RgbImage,
  start: (f32, f32),
  end: (f32, f32),
  color: Rgb<u8>,
) {
  draw_line_segment_mut(image, start, end, color);
}
