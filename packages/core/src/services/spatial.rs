//! Spatial helpers: rubber-band selection hit-testing and group-drag
//! deltas. Pure math consumed by `CanvasService`'s selection and drag
//! actions.

use std::collections::HashMap;

use crate::models::Note;

/// IDs of all notes whose position falls inside the world-space
/// rectangle. The corner order is normalized, so any two opposite
/// corners work.
pub fn notes_in_rect(
    notes: &HashMap<String, Note>,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
) -> Vec<String> {
    let (min_x, max_x) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
    let (min_y, max_y) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };

    notes
        .values()
        .filter(|n| n.x >= min_x && n.x <= max_x && n.y >= min_y && n.y <= max_y)
        .map(|n| n.id.clone())
        .collect()
}

/// Translation applied to every member of a group drag, computed from
/// the anchor note's start position and the pointer's current world
/// position. All dragged notes move by this same delta, preserving
/// relative layout.
pub fn drag_delta(anchor_start: (f64, f64), pointer: (f64, f64)) -> (f64, f64) {
    (pointer.0 - anchor_start.0, pointer.1 - anchor_start.1)
}

/// Arithmetic-mean centroid of the given positions. `None` for an empty
/// set - the caller decides what a childless cluster's position means.
pub fn centroid(positions: &[(f64, f64)]) -> Option<(f64, f64)> {
    if positions.is_empty() {
        return None;
    }
    let n = positions.len() as f64;
    let (sx, sy) = positions
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    Some((sx / n, sy / n))
}
