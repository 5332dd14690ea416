// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/pose.rs - 姿态估计集成测试
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod common;

use image::RgbImage;

use common::{Script, ScriptedRuntime, Tensor, config, fixture, write_labels, write_model};
use shanan_adapter::{
  DEFAULT_KPT_RADIUS, DEFAULT_KPT_THRESHOLD, POSE_KEYPOINTS, PoseAdapter, create_pose_adapter_with,
};

/// 单类别 v11 姿态输出：cx, cy, w, h, score, 17 x (x, y, conf)
fn person(cx: f32, cy: f32, score: f32) -> Vec<f32> {
  let mut row = vec![cx, cy, 20.0, 40.0, score];
  for k in 0..POSE_KEYPOINTS {
    let conf = if k % 2 == 0 { 0.9 } else { 0.2 };
    row.extend([cx - 8.0 + k as f32, cy - 16.0 + 2.0 * k as f32, conf]);
  }
  row
}

/// 端到端姿态输出：x_min, y_min, x_max, y_max, score, class, 17 x (x, y, conf)
fn person_end_to_end(cx: f32, cy: f32, score: f32) -> Vec<f32> {
  let anchor_free = person(cx, cy, score);
  let mut row = vec![cx - 10.0, cy - 20.0, cx + 10.0, cy + 20.0, score, 0.0];
  row.extend_from_slice(&anchor_free[5..]);
  row
}

fn initialized(script: &Script) -> (tempfile::TempDir, Box<dyn PoseAdapter>) {
  initialized_as("yolo11n-pose.onnx", script)
}

fn initialized_as(name: &str, script: &Script) -> (tempfile::TempDir, Box<dyn PoseAdapter>) {
  let dir = fixture();
  let model = write_model(dir.path(), name, script);
  let labels = write_labels(dir.path(), "person\n");
  let mut pose = create_pose_adapter_with(ScriptedRuntime::cpu());
  pose
    .initialize(&config(&model, &labels))
    .expect("初始化失败");
  (dir, pose)
}

#[test]
fn keypoints_follow_skeleton_order() {
  let script = Script {
    input: (64, 64),
    outputs: vec![Tensor::channel_major(&[
      person(30.0, 30.0, 0.8),
      person(31.0, 30.0, 0.6),
    ])],
  };
  let (_dir, mut pose) = initialized(&script);
  let results = pose.detect(&RgbImage::new(64, 64), 0.25, 0.45).unwrap();

  // 第二个实例与第一个高度重叠，被 NMS 抑制
  assert_eq!(results.len(), 1);
  let result = &results[0];
  assert_eq!(result.class_name, "person");
  assert_eq!(result.keypoints.len(), POSE_KEYPOINTS);
  for (i, keypoint) in result.keypoints.iter().enumerate() {
    assert_eq!(keypoint.id, i);
    assert_eq!(keypoint.x, 22.0 + i as f32);
    assert_eq!(keypoint.y, 14.0 + 2.0 * i as f32);
    assert!((0.0..=1.0).contains(&keypoint.confidence));
  }
}

#[test]
fn end_to_end_head_keeps_keypoints() {
  let script = Script {
    input: (64, 64),
    outputs: vec![Tensor::row_major(&[
      person_end_to_end(30.0, 30.0, 0.8),
      person_end_to_end(30.0, 30.0, 0.1),
    ])],
  };
  let (_dir, mut pose) = initialized_as("yolo26n-pose.onnx", &script);
  let results = pose.detect(&RgbImage::new(64, 64), 0.25, 0.45).unwrap();

  assert_eq!(results.len(), 1);
  let result = &results[0];
  assert_eq!(result.class_name, "person");
  assert_eq!((result.bbox.x, result.bbox.y), (20, 10));
  assert_eq!(result.keypoints.len(), POSE_KEYPOINTS);
  for (i, keypoint) in result.keypoints.iter().enumerate() {
    assert_eq!(keypoint.id, i);
    assert_eq!(keypoint.x, 22.0 + i as f32);
    assert_eq!(keypoint.y, 14.0 + 2.0 * i as f32);
  }
}

#[test]
fn keypoints_are_restored_to_image_space() {
  let script = Script {
    input: (64, 64),
    outputs: vec![Tensor::channel_major(&[person(32.0, 32.0, 0.8)])],
  };
  let (_dir, mut pose) = initialized(&script);
  // 32x32 放大两倍填满输入
  let results = pose.detect(&RgbImage::new(32, 32), 0.25, 0.45).unwrap();
  let nose = results[0].keypoints[0];
  assert_eq!((nose.x, nose.y), (12.0, 8.0));
}

#[test]
fn drawing_skips_hidden_keypoints() {
  let script = Script {
    input: (64, 64),
    outputs: vec![Tensor::channel_major(&[person(30.0, 40.0, 0.8)])],
  };
  let (_dir, mut pose) = initialized(&script);
  let blank = RgbImage::new(64, 64);
  let results = pose.detect(&blank, 0.25, 0.45).unwrap();

  let mut canvas = blank.clone();
  pose.draw_poses(&mut canvas, &results, DEFAULT_KPT_RADIUS, DEFAULT_KPT_THRESHOLD);
  assert_ne!(canvas, blank);

  let mut untouched = blank.clone();
  pose.draw_poses(&mut untouched, &[], DEFAULT_KPT_RADIUS, DEFAULT_KPT_THRESHOLD);
  assert_eq!(untouched, blank);
}
