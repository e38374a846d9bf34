//! Template library: the read-only collection of reference patterns that
//! every match request is scored against.
//!
//! Templates are built once (from the built-in catalog or a catalog file),
//! never mutated afterwards, and can be persisted with rkyv for fast loading.

use anyhow::Context;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::catalogs::{CatalogStar, ConstellationRecord};
use crate::point::brightness_order;
use crate::{Point, PointSet};

use super::normalize::normalize;

/// One named reference pattern.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    /// Raw star positions, brightest first.
    pub points: PointSet,
    /// `points` after normalization.
    pub normalized: PointSet,
    /// Line segments as index pairs into `points`.
    pub lines: Vec<[u32; 2]>,
}

impl Template {
    /// Build a template from stars in catalog order.
    ///
    /// `lines` index into `points` *as given*. Stars are re-sorted by
    /// brightness and line indices remapped to the sorted order; lines with
    /// an out-of-range endpoint are dropped.
    pub fn new(name: &str, points: Vec<Point>, lines: &[[usize; 2]]) -> Self {
        let n = points.len();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| brightness_order(&points[a], &points[b]));

        // old index -> new index
        let mut remap = vec![0u32; n];
        for (new_idx, &old_idx) in order.iter().enumerate() {
            remap[old_idx] = new_idx as u32;
        }

        let remapped_lines: Vec<[u32; 2]> = lines
            .iter()
            .filter(|l| l[0] < n && l[1] < n)
            .map(|l| [remap[l[0]], remap[l[1]]])
            .collect();

        let mut slots: Vec<Option<Point>> = points.into_iter().map(Some).collect();
        let sorted: Vec<Point> = order.iter().filter_map(|&i| slots[i].take()).collect();
        let points = PointSet::from_sorted(sorted);
        let normalized = normalize(&points);

        Self {
            name: name.to_string(),
            points,
            normalized,
            lines: remapped_lines,
        }
    }

    /// Number of stars in the template.
    pub fn star_count(&self) -> usize {
        self.points.len()
    }

    /// Line segments as coordinate pairs, for rendering.
    pub fn line_segments(&self) -> Vec<[(f64, f64); 2]> {
        self.lines
            .iter()
            .map(|l| {
                let a = &self.points[l[0] as usize];
                let b = &self.points[l[1] as usize];
                [(a.x, a.y), (b.x, b.y)]
            })
            .collect()
    }
}

/// Ordered, immutable collection of templates.
///
/// Order is significant: when two templates score identically the earlier
/// one wins.
#[derive(Debug, Clone, Default, Archive, Serialize, Deserialize)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

impl TemplateLibrary {
    /// Build a library from finished templates. A later template with the
    /// same name as an earlier one is ignored.
    pub fn from_templates(templates: Vec<Template>) -> Self {
        let mut kept: Vec<Template> = Vec::with_capacity(templates.len());
        for t in templates {
            if kept.iter().any(|k| k.name == t.name) {
                tracing::warn!("Duplicate template '{}' ignored", t.name);
                continue;
            }
            kept.push(t);
        }
        info!("Template library built with {} templates", kept.len());
        Self { templates: kept }
    }

    /// Build a library from parsed catalog records.
    pub fn from_records(records: &[ConstellationRecord]) -> Self {
        let templates = records
            .iter()
            .map(|rec| {
                let points = rec.stars.iter().map(CatalogStar::to_point).collect();
                Template::new(&rec.name, points, &rec.lines)
            })
            .collect();
        Self::from_templates(templates)
    }

    /// Library of the built-in reference constellations.
    pub fn builtin() -> Self {
        Self::from_records(&crate::catalogs::builtin::builtin_constellations())
    }

    /// Library from a text catalog file (see [`crate::catalogs::parse_catalog`]).
    pub fn from_catalog_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let records = crate::catalogs::load_catalog_from_file(path)?;
        Ok(Self::from_records(&records))
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// First template whose name occurs in `reference`, ignoring case.
    pub fn find_in_reference(&self, reference: &str) -> Option<&Template> {
        let lower = reference.to_lowercase();
        self.templates
            .iter()
            .find(|t| lower.contains(&t.name.to_lowercase()))
    }
}

// ── Serialization ───────────────────────────────────────────────────────────

impl TemplateLibrary {
    /// Serialize the library to bytes using rkyv.
    pub fn to_rkyv_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| anyhow::anyhow!("rkyv serialization failed: {}", e))?;
        Ok(bytes.to_vec())
    }

    /// Deserialize a library from rkyv bytes.
    pub fn from_rkyv_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))
    }

    /// Save the library to a file using rkyv.
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let bytes = self.to_rkyv_bytes()?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("Failed to write template library: {}", path.display()))?;
        info!("Saved template library to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Load a library from an rkyv file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read template library: {}", path.display()))?;
        let lib = Self::from_rkyv_bytes(&bytes)?;
        info!("Loaded template library: {} templates", lib.len());
        Ok(lib)
    }
}
