//! Define a point (one star, detected or templated) and a brightness-ordered
//! set of points.
//!
//! Points are the output of point extraction and the input to normalization
//! and matching. Every [`PointSet`] is kept sorted brightest-first so that
//! index 0 is the anchor and index 1 is the reference for normalization.

use rkyv::{Archive, Deserialize, Serialize};

use crate::star_info::{estimate_magnitude, estimate_spectral_type};

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Point {
    /// Position along image columns (pixels, or normalized units after normalization).
    pub x: f64,
    /// Position along image rows. +Y points down in the image.
    pub y: f64,
    /// Relative brightness in [0, 1]. Used only for ordering.
    pub brightness: f64,
    /// Star name, if known.
    pub name: Option<String>,
    /// Rendered marker size in pixels.
    pub size: Option<f64>,
    /// Estimated spectral type (e.g. "B2V").
    pub spectral_type: Option<String>,
    /// Estimated apparent magnitude.
    pub magnitude: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64, brightness: f64) -> Self {
        Self {
            x,
            y,
            brightness,
            name: None,
            size: None,
            spectral_type: None,
            magnitude: None,
        }
    }

    pub fn named(x: f64, y: f64, brightness: f64, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new(x, y, brightness)
        }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Fill every missing optional field from the point's brightness.
    ///
    /// Size defaults to 3 px plus up to 2 px for the brightest stars.
    pub fn with_defaults(mut self) -> Self {
        let b = self.brightness.clamp(0.0, 1.0);
        if self.size.is_none() {
            self.size = Some(3.0 + 2.0 * b);
        }
        if self.spectral_type.is_none() {
            self.spectral_type = Some(estimate_spectral_type(self.brightness).to_string());
        }
        if self.magnitude.is_none() {
            self.magnitude = Some(estimate_magnitude(self.brightness));
        }
        self
    }
}

/// Brightness-ordered sequence of points.
///
/// Invariant: points are sorted by descending brightness. Ties keep their
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Archive, Serialize, Deserialize)]
pub struct PointSet {
    points: Vec<Point>,
}

impl PointSet {
    /// Build a set, sorting brightest-first.
    pub fn new(mut points: Vec<Point>) -> Self {
        sort_by_brightness(&mut points);
        Self { points }
    }

    /// Wrap points that are already in the desired order.
    ///
    /// Used by normalization, which must preserve its input order exactly.
    pub(crate) fn from_sorted(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// Brightest point.
    pub fn anchor(&self) -> Option<&Point> {
        self.points.first()
    }

    /// Second-brightest point.
    pub fn reference(&self) -> Option<&Point> {
        self.points.get(1)
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

impl std::ops::Index<usize> for PointSet {
    type Output = Point;

    fn index(&self, idx: usize) -> &Point {
        &self.points[idx]
    }
}

impl From<Vec<Point>> for PointSet {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Brightest-first ordering. NaN brightness ranks below every number.
pub(crate) fn brightness_order(a: &Point, b: &Point) -> std::cmp::Ordering {
    fn key(p: &Point) -> f64 {
        if p.brightness.is_nan() {
            f64::NEG_INFINITY
        } else {
            p.brightness
        }
    }
    key(b).total_cmp(&key(a))
}

/// Stable sort, brightest first. NaN brightness sorts last.
pub(crate) fn sort_by_brightness(points: &mut [Point]) {
    points.sort_by(brightness_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointset_sorted_brightest_first() {
        let set = PointSet::new(vec![
            Point::new(0.0, 0.0, 0.2),
            Point::new(1.0, 0.0, 0.9),
            Point::new(2.0, 0.0, 0.5),
        ]);
        let b: Vec<f64> = set.iter().map(|p| p.brightness).collect();
        assert_eq!(b, vec![0.9, 0.5, 0.2]);
        assert_eq!(set.anchor().unwrap().x, 1.0);
        assert_eq!(set.reference().unwrap().x, 2.0);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let set = PointSet::new(vec![
            Point::named(0.0, 0.0, 0.7, "Alnitak"),
            Point::named(1.0, 0.0, 0.7, "Alnilam"),
            Point::named(2.0, 0.0, 0.7, "Mintaka"),
        ]);
        let names: Vec<&str> = set.iter().filter_map(|p| p.name.as_deref()).collect();
        assert_eq!(names, vec!["Alnitak", "Alnilam", "Mintaka"]);
    }

    #[test]
    fn test_nan_brightness_sorts_last() {
        let set = PointSet::new(vec![
            Point::named(0.0, 0.0, f64::NAN, "Blank"),
            Point::named(1.0, 0.0, 0.4, "Faint"),
            Point::named(2.0, 0.0, f64::NAN, "Blank 2"),
            Point::named(3.0, 0.0, 0.9, "Bright"),
        ]);
        let names: Vec<&str> = set.iter().filter_map(|p| p.name.as_deref()).collect();
        assert_eq!(names, vec!["Bright", "Faint", "Blank", "Blank 2"]);
    }

    #[test]
    fn test_with_defaults_fills_only_missing() {
        let mut p = Point::new(0.0, 0.0, 0.95);
        p.size = Some(7.0);
        let p = p.with_defaults();
        assert_eq!(p.size, Some(7.0));
        assert_eq!(p.spectral_type.as_deref(), Some("B2V"));
        assert!((p.magnitude.unwrap() - 0.3).abs() < 1e-9);
    }
}
