//! Outer contours of binary masks.
//!
//! Thin wrapper over `imageproc`'s border following that keeps only the
//! outermost borders (holes and nested shapes are dropped) and precomputes
//! the measurements every detector stage needs.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

use super::types::PixelRect;

/// One outer contour with its bounding box and enclosed area.
#[derive(Clone, Debug)]
pub(crate) struct Region {
    pub points: Vec<Point<i32>>,
    pub bbox: PixelRect,
    /// Polygon area enclosed by the contour (shoelace formula).
    pub area: f64,
}

impl Region {
    /// Mean of the contour points, in local pixel coordinates.
    pub fn centroid(&self) -> (u32, u32) {
        let n = self.points.len().max(1) as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + f64::from(p.x), sy + f64::from(p.y)));
        ((sx / n).round() as u32, (sy / n).round() as u32)
    }
}

/// Outermost contours of every foreground component of `mask`.
pub(crate) fn outer_regions(mask: &GrayImage) -> Vec<Region> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| !c.points.is_empty())
        .map(|c| {
            let bbox = points_bbox(&c.points);
            let area = polygon_area(&c.points);
            Region {
                points: c.points,
                bbox,
                area,
            }
        })
        .collect()
}

/// Inclusive pixel bounding box of a point set.
pub(crate) fn points_bbox(points: &[Point<i32>]) -> PixelRect {
    let mut x0 = i32::MAX;
    let mut y0 = i32::MAX;
    let mut x1 = i32::MIN;
    let mut y1 = i32::MIN;
    for p in points {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    if points.is_empty() {
        return PixelRect::new(0, 0, 0, 0);
    }
    let x0 = x0.max(0) as u32;
    let y0 = y0.max(0) as u32;
    PixelRect::from_corners(x0, y0, x1.max(0) as u32 + 1, y1.max(0) as u32 + 1)
}

/// Area of the closed polygon through `points`.
pub(crate) fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    (twice.abs() as f64) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn outer_regions_skip_nested_shapes() {
        let mut mask = GrayImage::new(60, 60);
        // Hollow square with a dot inside.
        for i in 10..50 {
            mask.put_pixel(i, 10, Luma([255]));
            mask.put_pixel(i, 49, Luma([255]));
            mask.put_pixel(10, i, Luma([255]));
            mask.put_pixel(49, i, Luma([255]));
        }
        mask.put_pixel(30, 30, Luma([255]));
        mask.put_pixel(31, 30, Luma([255]));

        let regions = outer_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, PixelRect::new(10, 10, 40, 40));
        assert!((regions[0].area - 39.0 * 39.0).abs() < 1.0);
    }

    #[test]
    fn polygon_area_of_rectangle() {
        let pts = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(0, 5),
        ];
        assert_eq!(polygon_area(&pts), 50.0);
        assert_eq!(points_bbox(&pts), PixelRect::new(0, 0, 11, 6));
    }
}
