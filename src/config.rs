// 该文件是 Shanan （山南西风） 项目的一部分。
// src/config.rs - 适配器配置
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use url::Url;

use crate::FromUrl;
use crate::factory::Capability;
use crate::model::{AUTO_VERSION, VersionHint, YoloVersion};

pub const DEFAULT_CONF_THRESHOLD: f32 = 0.4;
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.45;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("{0} 为空")]
  EmptyPath(&'static str),
  #[error("文件不存在: {}", .0.display())]
  NotFound(PathBuf),
  #[error("无法读取文件 {}: {source}", .path.display())]
  Unreadable {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("标签文件中没有有效标签: {}", .0.display())]
  EmptyLabels(PathBuf),
  #[error("阈值 {name} 超出范围 [0, 1]: {value}")]
  ThresholdOutOfRange { name: &'static str, value: f32 },
  #[error("未知的 YOLO 版本标识: {0}")]
  UnknownVersion(String),
  #[error("无法从模型推断 YOLO 版本: {}", .0.display())]
  UndetectableVersion(PathBuf),
  #[error("模型 YOLO 版本不唯一: {0:?}")]
  AmbiguousVersion(Vec<YoloVersion>),
  #[error("{capability} 不支持 YOLO {version}")]
  Unsupported {
    capability: Capability,
    version: YoloVersion,
  },
  #[error("请求使用 GPU，但运行时 {0} 没有可用的 GPU")]
  GpuUnavailable(String),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("URI 参数 {key} 无效: {value}")]
  InvalidParameter { key: String, value: String },
  #[error("TOML 解析错误: {0}")]
  Toml(#[from] toml::de::Error),
}

impl ConfigError {
  pub(crate) fn from_io(path: &Path, source: std::io::Error) -> Self {
    if source.kind() == std::io::ErrorKind::NotFound {
      ConfigError::NotFound(path.to_path_buf())
    } else {
      ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
      }
    }
  }
}

/// 构建与阈值化后端所需的全部配置
///
/// 由调用方构造，在 `initialize` 时使用一次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
  pub model_path: PathBuf,
  pub labels_path: PathBuf,
  pub use_gpu: bool,
  pub conf_threshold: f32,
  pub nms_threshold: f32,
  /// `auto` 或者固定版本标识，如 `v8`、`v11`、`nas`
  pub yolo_version: String,
}

impl Default for AdapterConfig {
  fn default() -> Self {
    Self {
      model_path: PathBuf::new(),
      labels_path: PathBuf::new(),
      use_gpu: false,
      conf_threshold: DEFAULT_CONF_THRESHOLD,
      nms_threshold: DEFAULT_NMS_THRESHOLD,
      yolo_version: AUTO_VERSION.to_string(),
    }
  }
}

impl AdapterConfig {
  pub fn new(model_path: impl Into<PathBuf>, labels_path: impl Into<PathBuf>) -> Self {
    Self {
      model_path: model_path.into(),
      labels_path: labels_path.into(),
      ..Self::default()
    }
  }

  pub fn with_gpu(mut self, use_gpu: bool) -> Self {
    self.use_gpu = use_gpu;
    self
  }

  pub fn with_conf_threshold(mut self, threshold: f32) -> Self {
    self.conf_threshold = threshold;
    self
  }

  pub fn with_nms_threshold(mut self, threshold: f32) -> Self {
    self.nms_threshold = threshold;
    self
  }

  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.yolo_version = version.into();
    self
  }

  pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(text)?)
  }

  pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::from_io(path, source))?;
    Self::from_toml_str(&text)
  }

  pub fn version_hint(&self) -> Result<VersionHint, ConfigError> {
    self.yolo_version.parse()
  }

  /// 不访问文件系统的静态检查：路径非空、阈值范围、版本标识合法
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.model_path.as_os_str().is_empty() {
      return Err(ConfigError::EmptyPath("model_path"));
    }
    if self.labels_path.as_os_str().is_empty() {
      return Err(ConfigError::EmptyPath("labels_path"));
    }
    check_threshold("conf_threshold", self.conf_threshold)?;
    check_threshold("nms_threshold", self.nms_threshold)?;
    self.version_hint()?;
    Ok(())
  }
}

/// 阈值必须落在 [0, 1]，越界不截断而是报错；NaN 同样报错
pub fn check_threshold(name: &'static str, value: f32) -> Result<(), ConfigError> {
  if (0.0..=1.0).contains(&value) {
    Ok(())
  } else {
    error!("阈值 {} 超出范围: {}", name, value);
    Err(ConfigError::ThresholdOutOfRange { name, value })
  }
}

pub const YOLO_SCHEME: &str = "yolo";

impl FromUrl for AdapterConfig {
  type Error = ConfigError;

  /// `yolo:///models/yolo11n.onnx?labels=/models/coco.txt&gpu=true&conf=0.3&nms=0.5&version=v11`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != YOLO_SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        YOLO_SCHEME,
        url.scheme()
      );
      return Err(ConfigError::SchemeMismatch);
    }

    let mut config = AdapterConfig {
      model_path: PathBuf::from(url.path()),
      ..AdapterConfig::default()
    };

    for (key, value) in url.query_pairs() {
      let invalid = || ConfigError::InvalidParameter {
        key: key.to_string(),
        value: value.to_string(),
      };
      match key.as_ref() {
        "labels" => config.labels_path = PathBuf::from(value.as_ref()),
        "gpu" => config.use_gpu = value.parse().map_err(|_| invalid())?,
        "conf" => config.conf_threshold = value.parse().map_err(|_| invalid())?,
        "nms" => config.nms_threshold = value.parse().map_err(|_| invalid())?,
        "version" => config.yolo_version = value.to_string(),
        _ => return Err(invalid()),
      }
    }

    Ok(config)
  }
}

impl crate::FromUrlWithScheme for AdapterConfig {
  const SCHEME: &'static str = YOLO_SCHEME;
}
