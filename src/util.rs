use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    write_output_file(path, &data)
}

pub fn write_text_file(path: &Path, text: &str) -> Result<()> {
    write_output_file(path, text.as_bytes())
}

/// Creates parent directories and replaces any existing file at `path`.
fn write_output_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let mut file = File::create(path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;
    file.write_all(data)
        .with_context(|| format!("failed to write output file: {}", path.display()))?;
    if !data.ends_with(b"\n") {
        file.write_all(b"\n")
            .with_context(|| format!("failed to finalize output file: {}", path.display()))?;
    }

    Ok(())
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round_opt(value: Option<f64>, decimals: i32) -> Option<f64> {
    value.map(|value| round_to(value, decimals))
}
