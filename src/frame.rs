// 该文件是 Shanan （山南西风） 项目的一部分。
// src/frame.rs - 输入帧预处理
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::{Rgb, RgbImage, imageops::FilterType};
use ndarray::Array4;

const RGB_CHANNELS: usize = 3;
const LETTERBOX_FILL: u8 = 114;

/// 信箱缩放参数，用于把模型坐标还原到原图
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
  pub scale: f32,
  pub pad_x: f32,
  pub pad_y: f32,
  /// 原图宽高
  pub source: (u32, u32),
}

impl Letterbox {
  pub fn new(source: (u32, u32), target: (u32, u32)) -> Self {
    let (sw, sh) = (source.0 as f32, source.1 as f32);
    let (tw, th) = (target.0 as f32, target.1 as f32);
    let scale = (tw / sw).min(th / sh);
    let (nw, nh) = ((sw * scale).round(), (sh * scale).round());
    Self {
      scale,
      pad_x: ((tw - nw) / 2.0).floor(),
      pad_y: ((th - nh) / 2.0).floor(),
      source,
    }
  }

  /// 模型坐标 -> 原图坐标（未截断）
  pub fn restore(&self, x: f32, y: f32) -> (f32, f32) {
    ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
  }

  /// 原图坐标 -> 模型坐标
  pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
    (x * self.scale + self.pad_x, y * self.scale + self.pad_y)
  }

  pub fn restore_length(&self, length: f32) -> f32 {
    length / self.scale
  }

  /// 还原 [x_min, y_min, x_max, y_max] 并截断到原图范围
  pub fn restore_box(&self, bbox: &[f32; 4]) -> [f32; 4] {
    let (w, h) = (self.source.0 as f32, self.source.1 as f32);
    let (x_min, y_min) = self.restore(bbox[0], bbox[1]);
    let (x_max, y_max) = self.restore(bbox[2], bbox[3]);
    [
      x_min.clamp(0.0, w),
      y_min.clamp(0.0, h),
      x_max.clamp(0.0, w),
      y_max.clamp(0.0, h),
    ]
  }

  /// 缩放并居中填充到模型输入，输出 NCHW 张量
  pub fn apply(&self, image: &RgbImage, target: (u32, u32)) -> Array4<f32> {
    let nw = ((image.width() as f32 * self.scale).round() as u32).clamp(1, target.0);
    let nh = ((image.height() as f32 * self.scale).round() as u32).clamp(1, target.1);
    let resized = if (nw, nh) == image.dimensions() {
      image.clone()
    } else {
      image::imageops::resize(image, nw, nh, FilterType::Triangle)
    };

    let mut canvas = RgbImage::from_pixel(target.0, target.1, Rgb([LETTERBOX_FILL; 3]));
    image::imageops::replace(
      &mut canvas,
      &resized,
      self.pad_x as i64,
      self.pad_y as i64,
    );
    to_nchw(&canvas)
  }
}

/// 分类预处理：短边缩放后居中裁剪
pub fn center_crop(image: &RgbImage, target: (u32, u32)) -> Array4<f32> {
  let (w, h) = (image.width() as f32, image.height() as f32);
  let scale = (target.0 as f32 / w).max(target.1 as f32 / h);
  let nw = ((w * scale).round() as u32).max(target.0);
  let nh = ((h * scale).round() as u32).max(target.1);
  let resized = image::imageops::resize(image, nw, nh, FilterType::Triangle);
  let x = (nw - target.0) / 2;
  let y = (nh - target.1) / 2;
  let cropped = image::imageops::crop_imm(&resized, x, y, target.0, target.1).to_image();
  to_nchw(&cropped)
}

/// RGB 图像转为 `[1, 3, H, W]` 张量，数值归一化到 [0, 1]
pub fn to_nchw(image: &RgbImage) -> Array4<f32> {
  let (width, height) = image.dimensions();
  let mut tensor = Array4::<f32>::zeros((1, RGB_CHANNELS, height as usize, width as usize));
  for (x, y, pixel) in image.enumerate_pixels() {
    for c in 0..RGB_CHANNELS {
      tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
    }
  }
  tensor
}
