// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 推理结果可视化
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;
use std::sync::OnceLock;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use tracing::{debug, warn};

use crate::postprocess::pose::COCO_SKELETON;
use crate::result::{Classification, Detection, OrientedDetection, Pose, Segmentation};

mod draw;

/// 指定标签字体文件的环境变量
pub const FONT_ENV: &str = "SHANAN_FONT";

const FONT_CANDIDATES: [&str; 5] = [
  "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/TTF/DejaVuSans.ttf",
  "/System/Library/Fonts/Supplemental/Arial.ttf",
  "C:\\Windows\\Fonts\\arial.ttf",
];

const PALETTE_SIZE: usize = 80;
const LABEL_FONT_SIZE: f32 = 20.0;

/// 可视化工具
///
/// 构造时不做任何 I/O，字体在第一次绘制标签时查找；
/// 找不到字体时只绘制标签背景条。
pub struct Visualizer {
  font: OnceLock<Option<FontArc>>,
  font_scale: PxScale,
  /// 按类别索引循环使用的颜色
  colors: Vec<Rgb<u8>>,
}

impl Default for Visualizer {
  fn default() -> Self {
    Self::new()
  }
}

impl Visualizer {
  pub fn new() -> Self {
    // 在色环上均匀取色，80 种足以覆盖 COCO 的类别
    let colors: Vec<Rgb<u8>> = (0..PALETTE_SIZE)
      .map(|i| {
        let hue = (i as f32 / PALETTE_SIZE as f32) * 360.0;
        Self::hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();

    Self {
      font: OnceLock::new(),
      font_scale: PxScale::from(LABEL_FONT_SIZE),
      colors,
    }
  }

  /// HSV 转 RGB
  fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
      (c, x, 0.0)
    } else if h < 120.0 {
      (x, c, 0.0)
    } else if h < 180.0 {
      (0.0, c, x)
    } else if h < 240.0 {
      (0.0, x, c)
    } else if h < 300.0 {
      (x, 0.0, c)
    } else {
      (c, 0.0, x)
    };

    Rgb([
      ((r + m) * 255.0) as u8,
      ((g + m) * 255.0) as u8,
      ((b + m) * 255.0) as u8,
    ])
  }

  pub fn color(&self, class_id: usize) -> Rgb<u8> {
    self.colors[class_id % self.colors.len()]
  }

  fn font(&self) -> Option<&FontArc> {
    self.font.get_or_init(load_font).as_ref()
  }

  fn label(&self, image: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    draw::draw_label(image, self.font(), self.font_scale, x, y, text, color);
  }

  pub fn draw_detections(&self, image: &mut RgbImage, detections: &[Detection]) {
    for detection in detections {
      let color = self.color(detection.class_id);
      draw::draw_box(image, &detection.bbox, color);
      let text = format!("{} {:.2}", detection.class_name, detection.confidence);
      self.label(image, detection.bbox.x, detection.bbox.y, &text, color);
    }
  }

  pub fn draw_segmentations(&self, image: &mut RgbImage, segmentations: &[Segmentation], mask_alpha: f32) {
    // 先叠加全部掩码，再画框和标签，避免标签被后续掩码覆盖
    for segmentation in segmentations {
      let color = self.color(segmentation.class_id);
      draw::blend_mask(image, &segmentation.mask, &segmentation.bbox, color, mask_alpha);
    }
    for segmentation in segmentations {
      let color = self.color(segmentation.class_id);
      draw::draw_box(image, &segmentation.bbox, color);
      let text = format!("{} {:.2}", segmentation.class_name, segmentation.confidence);
      self.label(image, segmentation.bbox.x, segmentation.bbox.y, &text, color);
    }
  }

  pub fn draw_poses(&self, image: &mut RgbImage, poses: &[Pose], kpt_radius: u32, kpt_threshold: f32) {
    for pose in poses {
      let color = self.color(pose.class_id);
      draw::draw_box(image, &pose.bbox, color);

      let visible = |id: usize| {
        pose
          .keypoints
          .get(id)
          .filter(|k| k.confidence > kpt_threshold)
      };
      for (limb, &(a, b)) in COCO_SKELETON.iter().enumerate() {
        if let (Some(start), Some(end)) = (visible(a), visible(b)) {
          draw::draw_segment(image, (start.x, start.y), (end.x, end.y), self.color(limb));
        }
      }
      for keypoint in pose.keypoints.iter().filter(|k| k.confidence > kpt_threshold) {
        draw::draw_disc(image, keypoint.x, keypoint.y, kpt_radius, self.color(keypoint.id));
      }

      let text = format!("{} {:.2}", pose.class_name, pose.confidence);
      self.label(image, pose.bbox.x, pose.bbox.y, &text, color);
    }
  }

  pub fn draw_oriented(&self, image: &mut RgbImage, detections: &[OrientedDetection]) {
    for detection in detections {
      let color = self.color(detection.class_id);
      let corners = detection.bbox.corners();
      draw::draw_polygon_outline(image, &corners, color);

      // 标签放在最上方的角点处
      let (x, y) = corners
        .iter()
        .copied()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((detection.bbox.center_x, detection.bbox.center_y));
      let text = format!("{} {:.2}", detection.class_name, detection.confidence);
      self.label(image, x.round() as i32, y.round() as i32, &text, color);
    }
  }

  /// 在左上角绘制分类结果横幅
  pub fn draw_classification(&self, image: &mut RgbImage, result: &Classification) {
    let text = format!("{} {:.2}", result.class_name, result.confidence);
    self.label(image, 0, draw::LABEL_TEXT_HEIGHT, &text, self.color(result.class_id));
  }
}

fn load_font() -> Option<FontArc> {
  let from_env = std::env::var_os(FONT_ENV).map(PathBuf::from);
  let candidates = from_env
    .into_iter()
    .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

  for path in candidates {
    let Ok(bytes) = std::fs::read(&path) else {
      continue;
    };
    match FontArc::try_from_vec(bytes) {
      Ok(font) => {
        debug!("加载标签字体: {}", path.display());
        return Some(font);
      }
      Err(e) => warn!("无法解析字体 {}: {}", path.display(), e),
    }
  }
  warn!("没有找到可用字体，标签只绘制背景条, 可通过 {} 指定字体", FONT_ENV);
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::result::{BinaryMask, BoundingBox, KeyPoint, OrientedBoundingBox};

  fn canvas() -> RgbImage {
    RgbImage::new(120, 120)
  }

  #[test]
  fn palette_wraps_by_class() {
    let visualizer = Visualizer::new();
    assert_eq!(visualizer.color(3), visualizer.color(3 + PALETTE_SIZE));
    assert_ne!(visualizer.color(0), visualizer.color(1));
  }

  #[test]
  fn detections_draw_their_box() {
    let visualizer = Visualizer::new();
    let mut image = canvas();
    let detection = Detection {
      bbox: BoundingBox {
        x: 20,
        y: 40,
        width: 50,
        height: 30,
      },
      confidence: 0.9,
      class_id: 2,
      class_name: "car".to_string(),
    };
    visualizer.draw_detections(&mut image, &[detection]);
    assert_eq!(*image.get_pixel(40, 69), visualizer.color(2));
    assert_eq!(*image.get_pixel(40, 55), Rgb([0, 0, 0]));
  }

  #[test]
  fn segmentation_mask_is_tinted() {
    let visualizer = Visualizer::new();
    let mut image = canvas();
    let mut mask = BinaryMask::new(20, 20);
    mask.set(10, 10, true);
    let segmentation = Segmentation {
      bbox: BoundingBox {
        x: 50,
        y: 50,
        width: 20,
        height: 20,
      },
      confidence: 0.8,
      class_id: 0,
      class_name: "person".to_string(),
      mask,
    };
    visualizer.draw_segmentations(&mut image, &[segmentation], 1.0);
    assert_eq!(*image.get_pixel(60, 60), visualizer.color(0));
    assert_eq!(*image.get_pixel(61, 61), Rgb([0, 0, 0]));
  }

  #[test]
  fn low_confidence_keypoints_are_skipped() {
    let visualizer = Visualizer::new();
    let mut image = canvas();
    let pose = Pose {
      bbox: BoundingBox::default(),
      confidence: 0.9,
      class_id: 0,
      class_name: "person".to_string(),
      keypoints: vec![
        KeyPoint {
          x: 30.0,
          y: 90.0,
          confidence: 0.9,
          id: 0,
        },
        KeyPoint {
          x: 90.0,
          y: 90.0,
          confidence: 0.1,
          id: 1,
        },
      ],
    };
    visualizer.draw_poses(&mut image, &[pose], 3, 0.5);
    assert_eq!(*image.get_pixel(30, 90), visualizer.color(0));
    assert_eq!(*image.get_pixel(90, 90), Rgb([0, 0, 0]));
  }

  #[test]
  fn oriented_outline_passes_through_corners() {
    let visualizer = Visualizer::new();
    let mut image = canvas();
    let detection = OrientedDetection {
      bbox: OrientedBoundingBox {
        center_x: 60.0,
        center_y: 80.0,
        width: 40.0,
        height: 20.0,
        angle: 0.0,
      },
      confidence: 0.7,
      class_id: 5,
      class_name: "ship".to_string(),
    };
    visualizer.draw_oriented(&mut image, &[detection]);
    assert_eq!(*image.get_pixel(60, 90), visualizer.color(5));
    assert_eq!(*image.get_pixel(60, 80), Rgb([0, 0, 0]));
  }
}
