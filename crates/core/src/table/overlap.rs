//! Overlap measurement and greedy duplicate suppression.

use super::types::{DocRect, PixelRect};

/// Rectangles that can be compared for overlap.
pub trait Overlap {
    fn area(&self) -> f64;
    fn intersection_area(&self, other: &Self) -> f64;

    /// Intersection as a share of the smaller of the two areas.
    fn overlap_fraction(&self, other: &Self) -> f64 {
        let smaller = self.area().min(other.area());
        if smaller <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / smaller
    }
}

impl Overlap for PixelRect {
    fn area(&self) -> f64 {
        PixelRect::area(self)
    }

    fn intersection_area(&self, other: &Self) -> f64 {
        PixelRect::intersection_area(self, other)
    }
}

impl Overlap for DocRect {
    fn area(&self) -> f64 {
        DocRect::area(self)
    }

    fn intersection_area(&self, other: &Self) -> f64 {
        DocRect::intersection_area(self, other)
    }
}

/// Keep the best-scoring items, dropping any that overlap an already kept
/// item by more than `max_overlap` of the smaller box.
///
/// Ties keep their input order.
pub fn remove_overlapping<T, R, S, B>(mut items: Vec<T>, score: S, bbox: B, max_overlap: f64) -> Vec<T>
where
    R: Overlap,
    S: Fn(&T) -> f64,
    B: Fn(&T) -> R,
{
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let rect = bbox(&item);
        if kept
            .iter()
            .all(|k| bbox(k).overlap_fraction(&rect) <= max_overlap)
        {
            kept.push(item);
        }
    }
    kept
}
