//! Readers for the plain-text inputs of a job

use anyhow::{bail, Context, Result};
use bathygrid_core::AreaBounds;
use bathygrid_synthesis::{FeaturePoint, PointFlags, SourcePoint, SynthesisConfig};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse `min_x,min_y,max_x,max_y`
pub fn parse_area(s: &str) -> Result<AreaBounds> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid area: {s}"))?;
    if values.len() != 4 {
        bail!("Area must be 'min_x,min_y,max_x,max_y', got: {}", s);
    }
    Ok(AreaBounds::new(values[0], values[1], values[2], values[3]))
}

/// One sounding per line: `lon lat depth [vertical_error [flags]]`.
///
/// Fields may be separated by whitespace or commas. Blank lines and lines
/// starting with `#` are skipped.
pub fn parse_sounding(line: &str) -> Result<Option<SourcePoint>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let fields: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty())
        .collect();
    if !(3..=5).contains(&fields.len()) {
        bail!("Expected 3 to 5 fields, got {}", fields.len());
    }
    let number = |i: usize| -> Result<f64> {
        fields[i]
            .parse::<f64>()
            .with_context(|| format!("Invalid number: {}", fields[i]))
    };
    let error = if fields.len() > 3 { number(3)? } else { 0.0 };
    let flags = match fields.get(4) {
        Some(f) => PointFlags::from_bits(f.parse().with_context(|| format!("Invalid flags: {f}"))?),
        None => PointFlags::NONE,
    };
    Ok(Some(
        SourcePoint::new(number(0)?, number(1)?, number(2)?, error).with_flags(flags),
    ))
}

pub fn read_soundings(path: &Path) -> Result<Vec<SourcePoint>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut points = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("Failed to read soundings")?;
        if let Some(point) =
            parse_sounding(&line).with_context(|| format!("{}:{}", path.display(), n + 1))?
        {
            points.push(point);
        }
    }
    Ok(points)
}

/// Features as a JSON array
pub fn read_features(path: &Path) -> Result<Vec<FeaturePoint>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).context("Failed to parse features")
}

/// Job configuration; defaults when no file is given
pub fn read_config(path: Option<&Path>) -> Result<SynthesisConfig> {
    let Some(path) = path else {
        return Ok(SynthesisConfig::default());
    };
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).context("Failed to parse configuration")
}
