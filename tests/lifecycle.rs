// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/lifecycle.rs - 生命周期与配置校验集成测试
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod common;

use std::path::Path;

use image::RgbImage;

use common::{Script, ScriptedRuntime, THREE_LABELS, Tensor, config, fixture, write_labels, write_model};
use shanan_adapter::{
  AdapterError, ConfigError, DetectorAdapter, EngineError, create_classifier_adapter_with,
  create_detector_adapter, create_detector_adapter_with,
};

fn script() -> Script {
  Script {
    input: (32, 32),
    outputs: vec![Tensor::channel_major(&[vec![
      10.0, 10.0, 6.0, 6.0, 0.9, 0.0, 0.0,
    ]])],
  }
}

struct Fixture {
  _dir: tempfile::TempDir,
  model: std::path::PathBuf,
  labels: std::path::PathBuf,
}

impl Fixture {
  fn new(model_name: &str) -> Self {
    let dir = fixture();
    let model = write_model(dir.path(), model_name, &script());
    let labels = write_labels(dir.path(), THREE_LABELS);
    Self {
      _dir: dir,
      model,
      labels,
    }
  }

  fn dir(&self) -> &Path {
    self._dir.path()
  }
}

fn assert_clean(detector: &dyn DetectorAdapter) {
  assert!(!detector.is_initialized());
  assert!(detector.class_names().is_empty());
}

#[test]
fn successful_initialize_freezes_labels() {
  let fx = Fixture::new("yolov8n.onnx");
  let mut detector = create_detector_adapter_with(ScriptedRuntime::cpu());
  assert_clean(detector.as_ref());

  detector.initialize(&config(&fx.model, &fx.labels)).unwrap();
  assert!(detector.is_initialized());
  assert_eq!(detector.class_names(), ["person", "car", "dog"]);
}

#[test]
fn detect_before_initialize_is_guarded() {
  let mut detector = create_detector_adapter_with(ScriptedRuntime::cpu());
  assert!(matches!(
    detector.detect(&RgbImage::new(32, 32), 0.5, 0.5),
    Err(AdapterError::NotInitialized)
  ));
  assert_clean(detector.as_ref());
}

#[test]
fn shutdown_is_idempotent_and_allows_reinitialize() {
  let fx = Fixture::new("yolov8n.onnx");
  let runtime = ScriptedRuntime::cpu();
  let mut detector = create_detector_adapter_with(runtime.clone());

  // 未初始化时关闭同样安全
  detector.shutdown();
  detector.shutdown();
  assert_clean(detector.as_ref());

  detector.initialize(&config(&fx.model, &fx.labels)).unwrap();
  detector.shutdown();
  detector.shutdown();
  assert_clean(detector.as_ref());
  assert!(matches!(
    detector.detect(&RgbImage::new(32, 32), 0.5, 0.5),
    Err(AdapterError::NotInitialized)
  ));

  detector.initialize(&config(&fx.model, &fx.labels)).unwrap();
  assert!(detector.is_initialized());
  assert_eq!(detector.detect(&RgbImage::new(32, 32), 0.5, 0.5).unwrap().len(), 1);
  assert_eq!(runtime.load_count(), 2);
}

#[test]
fn second_initialize_is_rejected_without_side_effects() {
  let fx = Fixture::new("yolov8n.onnx");
  let runtime = ScriptedRuntime::cpu();
  let mut detector = create_detector_adapter_with(runtime.clone());
  detector.initialize(&config(&fx.model, &fx.labels)).unwrap();

  let other = write_labels(fx.dir(), "a\nb\n");
  assert!(matches!(
    detector.initialize(&config(&fx.model, &other)),
    Err(AdapterError::AlreadyInitialized)
  ));
  assert!(detector.is_initialized());
  assert_eq!(detector.class_names().len(), 3);
  assert_eq!(runtime.load_count(), 1);
}

#[test]
fn failures_leave_no_partial_state() {
  let fx = Fixture::new("yolov8n.onnx");
  let empty = fx.dir().join("empty.txt");
  std::fs::write(&empty, "\n  \n").unwrap();
  let missing = fx.dir().join("missing.onnx");

  let cases = [
    config(&missing, &fx.labels),
    config(&fx.model, &fx.dir().join("missing.txt")),
    config(&fx.model, &empty),
    config(Path::new(""), &fx.labels),
    config(&fx.model, &fx.labels).with_conf_threshold(1.5),
    config(&fx.model, &fx.labels).with_nms_threshold(f32::NAN),
    config(&fx.model, &fx.labels).with_version("bogus-tag"),
    config(&fx.model, &fx.labels).with_gpu(true),
  ];

  let runtime = ScriptedRuntime::cpu();
  for case in &cases {
    let mut detector = create_detector_adapter_with(runtime.clone());
    assert!(detector.initialize(case).is_err(), "应当失败: {:?}", case);
    assert_clean(detector.as_ref());
  }
  assert_eq!(runtime.load_count(), 0);
}

#[test]
fn reports_the_failing_check() {
  let fx = Fixture::new("yolov8n.onnx");
  let mut detector = create_detector_adapter_with(ScriptedRuntime::cpu());

  let err = detector
    .initialize(&config(&fx.model, &fx.labels).with_version("bogus-tag"))
    .unwrap_err();
  assert!(matches!(err, AdapterError::Config(ConfigError::UnknownVersion(_))));

  let err = detector
    .initialize(&config(&fx.model, &fx.labels).with_gpu(true))
    .unwrap_err();
  assert!(matches!(err, AdapterError::Config(ConfigError::GpuUnavailable(_))));

  let err = detector
    .initialize(&config(&fx.dir().join("nope.onnx"), &fx.labels))
    .unwrap_err();
  assert!(matches!(err, AdapterError::Config(ConfigError::NotFound(_))));
}

#[test]
fn gpu_is_used_when_available() {
  let fx = Fixture::new("yolov8n.onnx");
  let mut detector = create_detector_adapter_with(ScriptedRuntime::with_gpu());
  detector
    .initialize(&config(&fx.model, &fx.labels).with_gpu(true))
    .unwrap();
  assert!(detector.is_initialized());
}

#[test]
fn version_auto_detection() {
  // 文件名没有版本标记，必须显式指定
  let fx = Fixture::new("detector.onnx");
  let mut detector = create_detector_adapter_with(ScriptedRuntime::cpu());
  let err = detector.initialize(&config(&fx.model, &fx.labels)).unwrap_err();
  assert!(matches!(
    err,
    AdapterError::Config(ConfigError::UndetectableVersion(_))
  ));
  detector
    .initialize(&config(&fx.model, &fx.labels).with_version("v8"))
    .unwrap();
  detector.shutdown();

  let fx = Fixture::new("yolov8-vs-yolo11.onnx");
  let err = detector.initialize(&config(&fx.model, &fx.labels)).unwrap_err();
  assert!(matches!(
    err,
    AdapterError::Config(ConfigError::AmbiguousVersion(_))
  ));
  assert!(!detector.is_initialized());
}

#[test]
fn unbound_factory_reports_missing_runtime() {
  let fx = Fixture::new("yolov8n.onnx");
  let mut detector = create_detector_adapter();
  let err = detector.initialize(&config(&fx.model, &fx.labels)).unwrap_err();
  assert!(matches!(err, AdapterError::Engine(EngineError::NoRuntime)));
  assert_clean(detector.as_ref());
}

#[test]
fn instances_are_independent() {
  let fx = Fixture::new("yolov8n.onnx");
  let runtime = ScriptedRuntime::cpu();
  let mut first = create_detector_adapter_with(runtime.clone());
  let mut second = create_detector_adapter_with(runtime.clone());
  first.initialize(&config(&fx.model, &fx.labels)).unwrap();
  second.initialize(&config(&fx.model, &fx.labels)).unwrap();

  first.shutdown();
  assert!(!first.is_initialized());
  assert!(second.is_initialized());

  let image = RgbImage::new(32, 32);
  let handle = std::thread::spawn(move || second.detect(&image, 0.5, 0.5).map(|d| d.len()));
  assert_eq!(handle.join().unwrap().unwrap(), 1);
}

#[test]
fn zero_sized_engine_input_is_an_engine_error() {
  let dir = fixture();
  let script = Script {
    input: (0, 0),
    outputs: vec![Tensor::new(&[1, 3], vec![0.1, 0.7, 0.2])],
  };
  let model = write_model(dir.path(), "yolov8n.onnx", &script);
  let labels = write_labels(dir.path(), THREE_LABELS);
  let image = RgbImage::new(32, 32);

  let mut detector = create_detector_adapter_with(ScriptedRuntime::cpu());
  detector.initialize(&config(&model, &labels)).unwrap();
  assert!(matches!(
    detector.detect(&image, 0.5, 0.5),
    Err(AdapterError::Engine(EngineError::Execution(_)))
  ));
  assert!(detector.is_initialized());

  let mut classifier = create_classifier_adapter_with(ScriptedRuntime::cpu());
  classifier.initialize(&config(&model, &labels)).unwrap();
  assert!(matches!(
    classifier.classify(&image),
    Err(AdapterError::Engine(EngineError::Execution(_)))
  ));
}
