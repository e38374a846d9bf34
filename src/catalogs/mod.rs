//! Constellation catalogs: the built-in reference set and a plain-text
//! catalog format for supplying custom templates.
//!
//! Text catalogs are pipe-delimited, one record per line:
//!
//! ```text
//! # comment
//! star|Orion|Betelgeuse|200|80|1.0
//! star|Orion|Rigel|400|320|0.9
//! line|Orion|0|1
//! ```
//!
//! `star` records give a constellation, star name, x, y (pixels) and
//! brightness in [0, 1]. `line` records connect two stars of a constellation
//! by their 0-based position among that constellation's `star` records.
//! Constellations keep the order in which they first appear.

pub mod builtin;

use anyhow::{bail, Context, Result};

use crate::Point;

/// A star as listed in a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStar {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub brightness: f64,
}

impl CatalogStar {
    pub fn to_point(&self) -> Point {
        Point::named(self.x, self.y, self.brightness, &self.name)
    }
}

/// Stars and line segments of one constellation, in catalog order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstellationRecord {
    pub name: String,
    pub stars: Vec<CatalogStar>,
    /// Index pairs into `stars`.
    pub lines: Vec<[usize; 2]>,
}

/// Parse a text catalog from an in-memory string.
pub fn parse_catalog(data: &str) -> Result<Vec<ConstellationRecord>> {
    let mut records: Vec<ConstellationRecord> = Vec::new();

    for (lineno, raw) in data.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        let parsed = match fields.first().copied() {
            Some("star") => parse_star_record(&fields, &mut records),
            Some("line") => parse_line_record(&fields, &mut records),
            Some(other) => Err(anyhow::anyhow!("unknown record type '{}'", other)),
            None => Ok(()),
        };
        parsed.with_context(|| format!("catalog line {}: '{}'", lineno + 1, raw))?;
    }

    Ok(records)
}

/// Load a text catalog from a file.
pub fn load_catalog_from_file(
    path: impl AsRef<std::path::Path>,
) -> Result<Vec<ConstellationRecord>> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
    parse_catalog(&data)
}

fn record_for<'a>(
    records: &'a mut Vec<ConstellationRecord>,
    name: &str,
) -> &'a mut ConstellationRecord {
    let idx = match records.iter().position(|r| r.name == name) {
        Some(i) => i,
        None => {
            records.push(ConstellationRecord {
                name: name.to_string(),
                ..Default::default()
            });
            records.len() - 1
        }
    };
    &mut records[idx]
}

fn parse_star_record(fields: &[&str], records: &mut Vec<ConstellationRecord>) -> Result<()> {
    if fields.len() != 6 {
        bail!("star record needs 6 fields, found {}", fields.len());
    }
    let constellation = fields[1];
    if constellation.is_empty() {
        bail!("empty constellation name");
    }
    let x: f64 = fields[3].parse().context("invalid x")?;
    let y: f64 = fields[4].parse().context("invalid y")?;
    let brightness: f64 = fields[5].parse().context("invalid brightness")?;
    anyhow::ensure!(
        x.is_finite() && y.is_finite(),
        "coordinates must be finite"
    );
    anyhow::ensure!(
        (0.0..=1.0).contains(&brightness),
        "brightness {} outside [0, 1]",
        brightness
    );

    record_for(records, constellation).stars.push(CatalogStar {
        name: fields[2].to_string(),
        x,
        y,
        brightness,
    });
    Ok(())
}

fn parse_line_record(fields: &[&str], records: &mut Vec<ConstellationRecord>) -> Result<()> {
    if fields.len() != 4 {
        bail!("line record needs 4 fields, found {}", fields.len());
    }
    let a: usize = fields[2].parse().context("invalid start index")?;
    let b: usize = fields[3].parse().context("invalid end index")?;
    let rec = record_for(records, fields[1]);
    anyhow::ensure!(
        a < rec.stars.len() && b < rec.stars.len(),
        "line {}-{} references a star not yet declared for {}",
        a,
        b,
        rec.name
    );
    rec.lines.push([a, b]);
    Ok(())
}
