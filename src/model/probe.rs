// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/probe.rs - 模型版本标记探测
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::YoloVersion;

/// 文件头尾各读取的字节数；导出工具写入的元数据通常位于文件末尾
pub(crate) const SCAN_WINDOW: u64 = 64 * 1024;

/// 读取文件首尾窗口，小文件直接全部读取
pub(crate) fn read_windows(path: &Path, size: u64) -> std::io::Result<Vec<u8>> {
  let mut file = File::open(path)?;
  if size <= 2 * SCAN_WINDOW {
    let mut data = Vec::with_capacity(size as usize);
    file.read_to_end(&mut data)?;
    return Ok(data);
  }

  let mut data = vec![0u8; 2 * SCAN_WINDOW as usize];
  let (head, tail) = data.split_at_mut(SCAN_WINDOW as usize);
  file.read_exact(head)?;
  file.seek(SeekFrom::End(-(SCAN_WINDOW as i64)))?;
  file.read_exact(tail)?;
  Ok(data)
}

/// 扫描 `yolo[-_]?v?<数字>` 与 `yolo[-_]?nas` 形式的标记，大小写不敏感
pub(crate) fn scan_tokens(bytes: &[u8]) -> BTreeSet<YoloVersion> {
  let mut found = BTreeSet::new();
  let mut i = 0;
  while i + 4 <= bytes.len() {
    if !bytes[i..i + 4].eq_ignore_ascii_case(b"yolo") {
      i += 1;
      continue;
    }
    let mut j = i + 4;
    if j < bytes.len() && matches!(bytes[j], b'-' | b'_') {
      j += 1;
    }
    if j + 3 <= bytes.len() && bytes[j..j + 3].eq_ignore_ascii_case(b"nas") {
      found.insert(YoloVersion::Nas);
    } else {
      if j < bytes.len() && bytes[j].eq_ignore_ascii_case(&b'v') {
        j += 1;
      }
      let start = j;
      while j < bytes.len() && bytes[j].is_ascii_digit() && j - start < 3 {
        j += 1;
      }
      let followed_by_digit = j < bytes.len() && bytes[j].is_ascii_digit();
      if j > start && !followed_by_digit {
        let generation = std::str::from_utf8(&bytes[start..j])
          .ok()
          .and_then(|s| s.parse().ok())
          .and_then(YoloVersion::from_generation);
        if let Some(version) = generation {
          found.insert(version);
        }
      }
    }
    i += 4;
  }
  found
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scan(text: &str) -> Vec<YoloVersion> {
    scan_tokens(text.as_bytes()).into_iter().collect()
  }

  #[test]
  fn finds_common_spellings() {
    assert_eq!(scan("yolov8n.onnx"), vec![YoloVersion::V8]);
    assert_eq!(scan("YOLO11s-pose.onnx"), vec![YoloVersion::V11]);
    assert_eq!(scan("yolov10m.onnx"), vec![YoloVersion::V10]);
    assert_eq!(scan("yolo26n-obb.rknn"), vec![YoloVersion::V26]);
    assert_eq!(scan("yolo_nas_s.onnx"), vec![YoloVersion::Nas]);
    assert_eq!(scan("YOLO-NAS-L"), vec![YoloVersion::Nas]);
    assert_eq!(scan("yolov7-tiny.onnx"), vec![YoloVersion::V7]);
  }

  #[test]
  fn ignores_unknown_generations() {
    assert!(scan("yolov5s.onnx").is_empty());
    assert!(scan("yolov1234").is_empty());
    assert!(scan("detector.onnx").is_empty());
    assert!(scan("yolo").is_empty());
  }

  #[test]
  fn collects_every_marker() {
    assert_eq!(
      scan("converted from yolov8 to yolo11"),
      vec![YoloVersion::V8, YoloVersion::V11]
    );
  }
}
