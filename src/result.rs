// 该文件是 Shanan （山南西风） 项目的一部分。
// src/result.rs - 与推理库无关的结果类型
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

//! 适配层对外返回的结果类型。
//!
//! 这些类型不依赖任何推理后端，调用方拿到后即完全拥有，
//! 适配器内部不保留任何别名。

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// 轴对齐边界框（图像坐标，整数像素）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
  /// 左上角 x 坐标
  pub x: i32,
  /// 左上角 y 坐标
  pub y: i32,
  /// 宽度，不小于 0
  pub width: i32,
  /// 高度，不小于 0
  pub height: i32,
}

impl BoundingBox {
  /// 由 [x_min, y_min, x_max, y_max] 构造，反向的角点会得到零宽高
  pub fn from_corners(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
    let x = x_min.floor() as i32;
    let y = y_min.floor() as i32;
    let width = ((x_max - x_min).round() as i32).max(0);
    let height = ((y_max - y_min).round() as i32).max(0);
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }
}

/// 旋转边界框，角度单位为弧度，不做归一化
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientedBoundingBox {
  pub center_x: f32,
  pub center_y: f32,
  pub width: f32,
  pub height: f32,
  pub angle: f32,
}

impl OrientedBoundingBox {
  /// 四个角点，顺序为顺时针（图像坐标系下）
  pub fn corners(&self) -> [(f32, f32); 4] {
    let (sin, cos) = self.angle.sin_cos();
    let (hw, hh) = (self.width / 2.0, self.height / 2.0);
    [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(dx, dy)| {
      (
        self.center_x + dx * cos - dy * sin,
        self.center_y + dx * sin + dy * cos,
      )
    })
  }
}

/// 姿态关键点
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
  pub x: f32,
  pub y: f32,
  /// 置信度，范围 [0, 1]
  pub confidence: f32,
  /// 骨架拓扑中的关节索引
  pub id: usize,
}

/// 目标检测结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  pub bbox: BoundingBox,
  pub confidence: f32,
  /// `class_names()` 中的索引
  pub class_id: usize,
  pub class_name: String,
}

/// 二值掩码，行优先存储，前景为 255，背景为 0
///
/// 掩码尺寸与所属边界框一致，数据由结果独占。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryMask {
  pub width: u32,
  pub height: u32,
  pub data: Vec<u8>,
}

impl BinaryMask {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      data: vec![0; width as usize * height as usize],
    }
  }

  pub fn get(&self, x: u32, y: u32) -> bool {
    if x >= self.width || y >= self.height {
      return false;
    }
    self.data[(y * self.width + x) as usize] != 0
  }

  pub fn set(&mut self, x: u32, y: u32, value: bool) {
    if x < self.width && y < self.height {
      self.data[(y * self.width + x) as usize] = if value { 255 } else { 0 };
    }
  }

  /// 前景像素数量
  pub fn count(&self) -> usize {
    self.data.iter().filter(|&&v| v != 0).count()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }
}

impl From<&BinaryMask> for GrayImage {
  fn from(mask: &BinaryMask) -> Self {
    GrayImage::from_fn(mask.width, mask.height, |x, y| {
      Luma([if mask.get(x, y) { 255 } else { 0 }])
    })
  }
}

/// 实例分割结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
  pub bbox: BoundingBox,
  pub confidence: f32,
  pub class_id: usize,
  pub class_name: String,
  /// 对齐到 `bbox` 的掩码
  pub mask: BinaryMask,
}

/// 姿态估计结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
  pub bbox: BoundingBox,
  pub confidence: f32,
  pub class_id: usize,
  pub class_name: String,
  /// 按骨架拓扑顺序排列
  pub keypoints: Vec<KeyPoint>,
}

/// 旋转框检测结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientedDetection {
  pub bbox: OrientedBoundingBox,
  pub confidence: f32,
  pub class_id: usize,
  pub class_name: String,
}

/// 图像分类结果（Top-1）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
  pub class_id: usize,
  pub confidence: f32,
  pub class_name: String,
}
