//! Detection history: a bounded, newest-first log of successful detections
//! with aggregate statistics.
//!
//! Storage sits behind the [`HistoryStore`] trait so callers get a store
//! injected instead of reaching for global state. [`InMemoryHistory`] keeps
//! entries in a `Vec`; [`FileHistory`] additionally persists them with rkyv
//! after every change.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::detector::DetectionResult;

/// One recorded detection.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub constellation: String,
    pub confidence_score: u8,
    /// Presentation match count.
    pub stars_matched: u32,
    pub total_stars: u32,
    pub processing_time_s: f64,
    pub is_uploaded: bool,
}

impl HistoryEntry {
    /// Entry for a successful detection; `None` if nothing was detected.
    pub fn from_detection(result: &DetectionResult, timestamp_ms: u64) -> Option<Self> {
        let m = &result.match_result;
        Some(Self {
            timestamp_ms,
            constellation: m.constellation.clone()?,
            confidence_score: m.confidence_score?,
            stars_matched: m.matched_stars?,
            total_stars: m.total_stars?,
            processing_time_s: result.processing_time_s(),
            is_uploaded: result.source.is_uploaded(),
        })
    }

    /// `stars_matched / total_stars` as a percentage (0 when the template
    /// is empty).
    pub fn star_match_rate(&self) -> f64 {
        if self.total_stars == 0 {
            0.0
        } else {
            self.stars_matched as f64 / self.total_stars as f64 * 100.0
        }
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Oldest entries are dropped beyond this. Default 50.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 50 }
    }
}

// ── Statistics ──────────────────────────────────────────────────────────────

/// Aggregate statistics over a history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryStats {
    pub total_detections: usize,
    pub average_confidence: f64,
    /// Mean of per-entry match rates, in percent.
    pub average_star_match_rate: f64,
    pub average_processing_time: f64,
    /// Detections per constellation, in order of first appearance
    /// (newest first).
    pub constellation_counts: Vec<(String, usize)>,
    /// Highest count; on a tie the constellation seen most recently.
    pub most_detected: Option<String>,
}

/// Confidence direction for one constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trend {
    Improving,
    Declining,
    #[default]
    Neutral,
}

/// Statistics for one constellation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstellationPerformance {
    pub detection_count: usize,
    pub average_confidence: f64,
    pub average_star_match_rate: f64,
    pub average_processing_time: f64,
    pub trend: Trend,
}

/// Points by which the recent mean must differ from the old mean to count
/// as a trend.
const TREND_MARGIN: f64 = 5.0;

struct Averages {
    confidence: f64,
    match_rate: f64,
    processing_time: f64,
}

fn averages(entries: &[HistoryEntry]) -> Averages {
    let n = entries.len().max(1) as f64;
    Averages {
        confidence: entries.iter().map(|e| e.confidence_score as f64).sum::<f64>() / n,
        match_rate: entries.iter().map(HistoryEntry::star_match_rate).sum::<f64>() / n,
        processing_time: entries.iter().map(|e| e.processing_time_s).sum::<f64>() / n,
    }
}

/// Statistics over newest-first entries.
pub fn compute_stats(entries: &[HistoryEntry]) -> HistoryStats {
    if entries.is_empty() {
        return HistoryStats::default();
    }

    let mut counts: Vec<(String, usize)> = Vec::new();
    for e in entries {
        match counts.iter_mut().find(|(name, _)| *name == e.constellation) {
            Some((_, c)) => *c += 1,
            None => counts.push((e.constellation.clone(), 1)),
        }
    }

    let mut most_detected: Option<&(String, usize)> = None;
    for entry in &counts {
        if most_detected.map_or(true, |m| entry.1 > m.1) {
            most_detected = Some(entry);
        }
    }
    let most_detected = most_detected.map(|(name, _)| name.clone());

    let avg = averages(entries);
    HistoryStats {
        total_detections: entries.len(),
        average_confidence: avg.confidence,
        average_star_match_rate: avg.match_rate,
        average_processing_time: avg.processing_time,
        constellation_counts: counts,
        most_detected,
    }
}

/// Performance over newest-first entries for a single constellation.
///
/// With at least 3 entries the mean confidence of the 2 newest is compared
/// with that of the 2 oldest.
pub fn compute_performance(entries: &[HistoryEntry]) -> ConstellationPerformance {
    if entries.is_empty() {
        return ConstellationPerformance::default();
    }

    let n = entries.len();
    let trend = if n >= 3 {
        let recent = (entries[0].confidence_score as f64 + entries[1].confidence_score as f64) / 2.0;
        let older =
            (entries[n - 1].confidence_score as f64 + entries[n - 2].confidence_score as f64) / 2.0;
        if recent > older + TREND_MARGIN {
            Trend::Improving
        } else if recent < older - TREND_MARGIN {
            Trend::Declining
        } else {
            Trend::Neutral
        }
    } else {
        Trend::Neutral
    };

    let avg = averages(entries);
    ConstellationPerformance {
        detection_count: n,
        average_confidence: avg.confidence,
        average_star_match_rate: avg.match_rate,
        average_processing_time: avg.processing_time,
        trend,
    }
}

// ── Store trait ─────────────────────────────────────────────────────────────

/// Repository of detection history.
pub trait HistoryStore {
    /// Record an entry as the newest, dropping the oldest beyond capacity.
    fn add(&mut self, entry: HistoryEntry) -> Result<()>;

    /// All entries, newest first.
    fn get_all(&self) -> &[HistoryEntry];

    fn clear(&mut self) -> Result<()>;

    fn get_stats(&self) -> HistoryStats {
        compute_stats(self.get_all())
    }

    /// Entries for one constellation, newest first.
    fn for_constellation(&self, constellation: &str) -> Vec<HistoryEntry> {
        self.get_all()
            .iter()
            .filter(|e| e.constellation == constellation)
            .cloned()
            .collect()
    }

    fn performance(&self, constellation: &str) -> ConstellationPerformance {
        compute_performance(&self.for_constellation(constellation))
    }

    /// Record a detection if it succeeded. Returns the stored entry.
    fn record(&mut self, result: &DetectionResult) -> Result<Option<HistoryEntry>> {
        match HistoryEntry::from_detection(result, now_ms()) {
            Some(entry) => {
                self.add(entry.clone())?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }
}

/// History held in memory only.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    entries: Vec<HistoryEntry>,
    config: HistoryConfig,
}

impl InMemoryHistory {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            config,
        }
    }

    fn with_entries(mut entries: Vec<HistoryEntry>, config: HistoryConfig) -> Self {
        entries.truncate(config.max_entries);
        Self { entries, config }
    }
}

impl HistoryStore for InMemoryHistory {
    fn add(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.insert(0, entry);
        self.entries.truncate(self.config.max_entries);
        Ok(())
    }

    fn get_all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

/// History persisted to an rkyv file, rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileHistory {
    path: PathBuf,
    inner: InMemoryHistory,
}

impl FileHistory {
    /// Open a history file, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>, config: HistoryConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read history: {}", path.display()))?;
            let entries = rkyv::from_bytes::<Vec<HistoryEntry>, rkyv::rancor::Error>(&bytes)
                .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))
                .with_context(|| format!("Corrupt history file: {}", path.display()))?;
            info!("Loaded {} history entries from {}", entries.len(), path.display());
            entries
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            inner: InMemoryHistory::with_entries(entries, config),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&self.inner.entries)
            .map_err(|e| anyhow::anyhow!("rkyv serialization failed: {}", e))?;
        std::fs::write(&self.path, &bytes)
            .with_context(|| format!("Failed to write history: {}", self.path.display()))?;
        info!(
            "Saved {} history entries to {}",
            self.inner.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl HistoryStore for FileHistory {
    fn add(&mut self, entry: HistoryEntry) -> Result<()> {
        self.inner.add(entry)?;
        self.save()
    }

    fn get_all(&self) -> &[HistoryEntry] {
        self.inner.get_all()
    }

    fn clear(&mut self) -> Result<()> {
        self.inner.clear()?;
        self.save()
    }
}
