pub mod bench;
pub mod calibrate;
pub mod prng;
pub mod report;
pub mod route;
pub mod sample;
pub mod selftest;

use std::io::Write;
use std::path::Path;

use phit_core::PhitConfig;
use serde::Serialize;

/// How numeric output is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Zero-padded hex, one value per line
    Hex,
    /// Decimal, one value per line
    Decimal,
    /// Little-endian bytes, no separators
    Raw,
}

/// Build the effective config: file (if any), then flag overrides.
/// Exits with status 1 when the file cannot be read or the result is invalid.
pub fn load_config(
    path: Option<&str>,
    harvest_iterations: Option<u32>,
    seed_rounds: Option<u32>,
) -> PhitConfig {
    match resolve_config(path, harvest_iterations, seed_rounds) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    }
}

fn resolve_config(
    path: Option<&str>,
    harvest_iterations: Option<u32>,
    seed_rounds: Option<u32>,
) -> Result<PhitConfig, String> {
    let mut config = match path {
        Some(p) => PhitConfig::load(Path::new(p)).map_err(|e| format!("{p}: {e}"))?,
        None => PhitConfig::default(),
    };
    if let Some(n) = harvest_iterations {
        config.harvest_iterations = n;
    }
    if let Some(n) = seed_rounds {
        config.seed_rounds = n;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Write `value` to `out` in `format`. Hex and decimal print one value per
/// line; raw writes `width` little-endian bytes.
pub fn write_value(
    out: &mut impl Write,
    value: u64,
    width: usize,
    format: OutputFormat,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Hex => writeln!(out, "{value:0w$x}", w = width * 2),
        OutputFormat::Decimal => writeln!(out, "{value}"),
        OutputFormat::Raw => out.write_all(&value.to_le_bytes()[..width.min(8)]),
    }
}

/// Serialize `value` as pretty JSON into `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

/// Letter grade for a 0-100 quality score.
pub fn grade_from_score(score: f64) -> char {
    if score >= 80.0 {
        'A'
    } else if score >= 60.0 {
        'B'
    } else if score >= 40.0 {
        'C'
    } else if score >= 20.0 {
        'D'
    } else {
        'F'
    }
}
