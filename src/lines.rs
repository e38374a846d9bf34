//! Constellation line figures for detected point sets.
//!
//! Lines are index pairs into a brightness-sorted [`PointSet`]. A pattern
//! derived from a known template keeps the template's figure where both
//! endpoints survived; otherwise a figure is grown from proximity.

use crate::matcher::Template;
use crate::PointSet;

/// Sets this small are drawn as a simple chain.
const CHAIN_MAX_STARS: usize = 5;
/// The brightest star is linked to stars `1..HUB_CANDIDATES` when close.
const HUB_CANDIDATES: usize = 5;
/// "Close" as a fraction of the first-to-last star distance.
const HUB_DISTANCE_FRACTION: f64 = 0.4;
/// Tree growth stops once this many stars are connected.
const MAX_TREE_STARS: usize = 12;

/// Build a line figure from proximity alone.
///
/// Up to 5 stars are chained in brightness order. Larger sets link the
/// brightest star to nearby bright stars, then grow a nearest-neighbour
/// tree from the brightest star until 12 stars are connected.
pub fn generate_lines(points: &PointSet) -> Vec<[usize; 2]> {
    let n = points.len();
    if n <= CHAIN_MAX_STARS {
        return (1..n).map(|i| [i - 1, i]).collect();
    }

    let mut lines: Vec<[usize; 2]> = Vec::new();
    let brightest = &points[0];
    let hub_threshold = brightest.distance(&points[n - 1]) * HUB_DISTANCE_FRACTION;
    for i in 1..HUB_CANDIDATES.min(n) {
        if brightest.distance(&points[i]) < hub_threshold {
            lines.push([0, i]);
        }
    }

    let target = n.min(MAX_TREE_STARS);
    let mut connected: Vec<usize> = vec![0];
    let mut in_tree = vec![false; n];
    in_tree[0] = true;

    while connected.len() < target {
        let mut best: Option<(f64, usize, usize)> = None;
        for &from in &connected {
            for to in (0..n).filter(|&j| !in_tree[j]) {
                let d = points[from].distance(&points[to]);
                if best.map_or(true, |(bd, _, _)| d < bd) {
                    best = Some((d, from, to));
                }
            }
        }
        let Some((_, from, to)) = best else {
            break;
        };
        if !lines.contains(&[from, to]) {
            lines.push([from, to]);
        }
        in_tree[to] = true;
        connected.push(to);
    }

    lines
}

/// Carry a template's line figure over to points derived from it.
///
/// Template stars are matched to detected stars by name. Returns the lines
/// whose endpoints both survived, as indices into `points`.
pub fn template_lines(template: &Template, points: &PointSet) -> Vec<[usize; 2]> {
    let position = |tidx: u32| -> Option<usize> {
        let name = template.points.points().get(tidx as usize)?.name.as_deref()?;
        points.iter().position(|p| p.name.as_deref() == Some(name))
    };
    template
        .lines
        .iter()
        .filter_map(|l| Some([position(l[0])?, position(l[1])?]))
        .collect()
}

/// Template lines when enough of them survived (at least half the point
/// count), otherwise a generated figure.
pub fn lines_for(points: &PointSet, template: Option<&Template>) -> Vec<[usize; 2]> {
    if let Some(t) = template {
        let carried = template_lines(t, points);
        if !carried.is_empty() && carried.len() * 2 >= points.len() {
            return carried;
        }
    }
    generate_lines(points)
}

/// Resolve index pairs to coordinate pairs for rendering.
pub fn line_coordinates(points: &PointSet, lines: &[[usize; 2]]) -> Vec<[(f64, f64); 2]> {
    lines
        .iter()
        .filter(|l| l[0] < points.len() && l[1] < points.len())
        .map(|l| {
            let a = &points[l[0]];
            let b = &points[l[1]];
            [(a.x, a.y), (b.x, b.y)]
        })
        .collect()
}
