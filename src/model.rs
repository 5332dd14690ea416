// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 模型文件与 YOLO 版本
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ConfigError;

mod probe;

/// 推理引擎代际（固定枚举）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YoloVersion {
  V7,
  V8,
  V10,
  V11,
  V26,
  Nas,
}

/// 输出头布局，决定原始张量如何解码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Head {
  /// `[1, N, 5 + nc]`，带物体性分数
  Objectness,
  /// `[1, 4 + nc + extra, N]`，需要 NMS
  AnchorFree,
  /// `[1, N, 6 + extra]`，端到端输出
  EndToEnd,
  /// 框 `[1, N, 4]` 与分数 `[1, N, nc]` 分开输出
  SplitScores,
}

impl YoloVersion {
  pub const ALL: [YoloVersion; 6] = [
    YoloVersion::V7,
    YoloVersion::V8,
    YoloVersion::V10,
    YoloVersion::V11,
    YoloVersion::V26,
    YoloVersion::Nas,
  ];

  pub fn tag(&self) -> &'static str {
    match self {
      YoloVersion::V7 => "v7",
      YoloVersion::V8 => "v8",
      YoloVersion::V10 => "v10",
      YoloVersion::V11 => "v11",
      YoloVersion::V26 => "v26",
      YoloVersion::Nas => "nas",
    }
  }

  pub fn head(&self) -> Head {
    match self {
      YoloVersion::V7 => Head::Objectness,
      YoloVersion::V8 | YoloVersion::V11 => Head::AnchorFree,
      YoloVersion::V10 | YoloVersion::V26 => Head::EndToEnd,
      YoloVersion::Nas => Head::SplitScores,
    }
  }

  pub(crate) fn from_generation(generation: u32) -> Option<Self> {
    match generation {
      7 => Some(YoloVersion::V7),
      8 => Some(YoloVersion::V8),
      10 => Some(YoloVersion::V10),
      11 => Some(YoloVersion::V11),
      26 => Some(YoloVersion::V26),
      _ => None,
    }
  }
}

impl fmt::Display for YoloVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.tag())
  }
}

impl FromStr for YoloVersion {
  type Err = ConfigError;

  /// 接受 `v8`、`V8`、`yolov8`、`yolo8`、`8`、`nas`、`yolo-nas` 等写法
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lower = s.trim().to_ascii_lowercase();
    let rest = lower.strip_prefix("yolo").unwrap_or(&lower);
    let rest = rest.trim_start_matches(['-', '_']);
    if rest == "nas" {
      return Ok(YoloVersion::Nas);
    }
    let digits = rest.strip_prefix('v').unwrap_or(rest);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
      if let Some(version) = digits.parse().ok().and_then(YoloVersion::from_generation) {
        return Ok(version);
      }
    }
    Err(ConfigError::UnknownVersion(s.to_string()))
  }
}

/// 配置中的版本提示：`auto` 或者固定的版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionHint {
  Auto,
  Pinned(YoloVersion),
}

pub const AUTO_VERSION: &str = "auto";

impl FromStr for VersionHint {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.trim().eq_ignore_ascii_case(AUTO_VERSION) {
      Ok(VersionHint::Auto)
    } else {
      s.parse().map(VersionHint::Pinned)
    }
  }
}

/// 按扩展名判断的模型容器格式，仅用于日志与探测报告
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
  Onnx,
  Rknn,
  TensorRt,
  OpenVino,
  TorchScript,
  Unknown,
}

impl ModelFormat {
  pub fn from_path(path: &Path) -> Self {
    let ext = path
      .extension()
      .and_then(|e| e.to_str())
      .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
      Some("onnx") => ModelFormat::Onnx,
      Some("rknn") => ModelFormat::Rknn,
      Some("engine") | Some("trt") | Some("plan") => ModelFormat::TensorRt,
      Some("xml") => ModelFormat::OpenVino,
      Some("torchscript") | Some("pt") => ModelFormat::TorchScript,
      _ => ModelFormat::Unknown,
    }
  }
}

/// 已确认存在且可读的模型文件
#[derive(Debug, Clone)]
pub struct ModelFile {
  path: PathBuf,
  size: u64,
  format: ModelFormat,
}

impl ModelFile {
  /// 检查文件存在且可读，不读取内容
  pub fn open(path: &Path) -> Result<Self, ConfigError> {
    if path.as_os_str().is_empty() {
      return Err(ConfigError::EmptyPath("model_path"));
    }
    let metadata = std::fs::metadata(path).map_err(|source| ConfigError::from_io(path, source))?;
    if !metadata.is_file() {
      return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    File::open(path).map_err(|source| ConfigError::from_io(path, source))?;

    let format = ModelFormat::from_path(path);
    debug!(
      "模型文件: {}, 格式: {:?}, 大小: {:.2} MB",
      path.display(),
      format,
      metadata.len() as f64 / (1024.0 * 1024.0)
    );

    Ok(Self {
      path: path.to_path_buf(),
      size: metadata.len(),
      format,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn size(&self) -> u64 {
    self.size
  }

  pub fn format(&self) -> ModelFormat {
    self.format
  }

  /// 汇总文件名与文件首尾元数据中出现的版本标记
  pub fn version_candidates(&self) -> Result<BTreeSet<YoloVersion>, ConfigError> {
    let mut found = BTreeSet::new();
    if let Some(name) = self.path.file_name().and_then(|n| n.to_str()) {
      found.extend(probe::scan_tokens(name.as_bytes()));
    }
    let windows = probe::read_windows(&self.path, self.size)
      .map_err(|source| ConfigError::from_io(&self.path, source))?;
    found.extend(probe::scan_tokens(&windows));
    Ok(found)
  }

  /// 自动推断版本，只有唯一候选时才成功
  pub fn detect_version(&self) -> Result<YoloVersion, ConfigError> {
    let candidates = self.version_candidates()?;
    let mut iter = candidates.iter();
    match (iter.next(), iter.next()) {
      (Some(&version), None) => {
        info!("自动识别模型版本: {} ({})", version, self.path.display());
        Ok(version)
      }
      (None, _) => {
        warn!("无法识别模型版本: {}", self.path.display());
        Err(ConfigError::UndetectableVersion(self.path.clone()))
      }
      _ => {
        warn!("模型版本不唯一: {:?}", candidates);
        Err(ConfigError::AmbiguousVersion(candidates.into_iter().collect()))
      }
    }
  }

  pub fn resolve(&self, hint: VersionHint) -> Result<YoloVersion, ConfigError> {
    match hint {
      VersionHint::Pinned(version) => Ok(version),
      VersionHint::Auto => self.detect_version(),
    }
  }
}
