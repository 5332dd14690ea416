// 该文件是 Shanan （山南西风） 项目的一部分。
// src/main.rs - 项目主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod args;

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Value, json};
use tracing::{error, info};
use url::Url;

use shanan_adapter::factory::{supported_versions, supports};
use shanan_adapter::{AdapterConfig, Capability, ClassNames, FromUrl, FromUrlWithScheme, ModelFile};

use args::{Args, Command};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();
  let args = Args::parse();

  match args.command {
    Command::Probe { model } => probe(&model),
    Command::Check { config, capability } => check(&config, capability),
  }
}

fn probe(path: &Path) -> Result<()> {
  let model = ModelFile::open(path).with_context(|| format!("无法打开模型: {}", path.display()))?;
  let candidates = model.version_candidates()?;

  let mut report = json!({
    "model": model.path(),
    "format": model.format(),
    "size": model.size(),
    "candidates": candidates,
  });
  match model.detect_version() {
    Ok(version) => {
      report["version"] = json!(version);
      report["head"] = json!(format!("{:?}", version.head()));
    }
    Err(e) => report["error"] = json!(e.to_string()),
  }

  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}

fn load_config(source: &str) -> Result<AdapterConfig> {
  match Url::parse(source) {
    Ok(url) if url.scheme() == AdapterConfig::SCHEME => {
      return Ok(AdapterConfig::from_url(&url)?);
    }
    _ => {}
  }
  AdapterConfig::from_toml_file(Path::new(source))
    .with_context(|| format!("无法读取配置文件: {}", source))
}

/// 依次执行静态校验、模型与标签检查、版本解析与能力支持检查
fn check(source: &str, capability: Option<Capability>) -> Result<()> {
  let config = load_config(source)?;
  info!("检查配置: {:?}", config);

  let capabilities: Vec<Capability> = match capability {
    Some(c) => vec![c],
    None => Capability::ALL.to_vec(),
  };

  let mut report = json!({ "config": config });
  let outcome = evaluate(&config, &capabilities, &mut report);
  let passed = match &outcome {
    Ok(all_supported) => *all_supported,
    Err(e) => {
      report["error"] = json!(e.to_string());
      false
    }
  };
  report["ok"] = json!(passed);

  println!("{}", serde_json::to_string_pretty(&report)?);
  if !passed {
    error!("配置检查未通过");
    bail!("配置检查未通过");
  }
  Ok(())
}

fn evaluate(config: &AdapterConfig, capabilities: &[Capability], report: &mut Value) -> Result<bool> {
  config.validate()?;
  let model = ModelFile::open(&config.model_path)?;
  report["format"] = json!(model.format());

  let labels = ClassNames::load(&config.labels_path)?;
  report["labels"] = json!(labels.len());

  let version = model.resolve(config.version_hint()?)?;
  report["version"] = json!(version);

  let mut all_supported = true;
  let mut support = serde_json::Map::new();
  for &capability in capabilities {
    let ok = supports(capability, version);
    all_supported &= ok;
    support.insert(
      capability.to_string(),
      json!({ "supported": ok, "versions": supported_versions(capability) }),
    );
  }
  report["capabilities"] = Value::Object(support);
  Ok(all_supported)
}
