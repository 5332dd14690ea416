// 该文件是 Shanan （山南西风） 项目的一部分。
// src/labels.rs - 类别名称表
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::ConfigError;

/// 有序、去重的类别名称表，初始化后冻结
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNames {
  names: Vec<String>,
}

impl ClassNames {
  /// 每行一个标签，去掉首尾空白，跳过空行，重复项保留第一次出现
  pub fn parse(text: &str) -> Self {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
      if seen.insert(line) {
        names.push(line.to_string());
      } else {
        warn!("忽略重复标签: {}", line);
      }
    }
    Self { names }
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    if path.as_os_str().is_empty() {
      return Err(ConfigError::EmptyPath("labels_path"));
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::from_io(path, source))?;
    let names = Self::parse(&text);
    if names.is_empty() {
      return Err(ConfigError::EmptyLabels(path.to_path_buf()));
    }
    debug!("加载 {} 个类别标签: {}", names.len(), path.display());
    Ok(names)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn get(&self, class_id: usize) -> Option<&str> {
    self.names.get(class_id).map(String::as_str)
  }

  pub fn as_slice(&self) -> &[String] {
    &self.names
  }
}
