//! Pixel-to-document coordinate mapping.
//!
//! Rasters are rendered at an arbitrary resolution; everything leaving the
//! detector is expressed in document units so results from different
//! resolutions can be compared. Both spaces use a top-left origin.

use super::types::{DocRect, PixelRect};

/// Per-axis scale from raster pixels to document units.
fn scale(pixel_w: u32, pixel_h: u32, doc_w: f64, doc_h: f64) -> (f64, f64) {
    let sx = if pixel_w == 0 { 0.0 } else { doc_w / f64::from(pixel_w) };
    let sy = if pixel_h == 0 { 0.0 } else { doc_h / f64::from(pixel_h) };
    (sx, sy)
}

/// Map a pixel rectangle into document space, clamped to the page.
pub fn to_document(rect: PixelRect, pixel_w: u32, pixel_h: u32, doc_w: f64, doc_h: f64) -> DocRect {
    let (sx, sy) = scale(pixel_w, pixel_h, doc_w, doc_h);
    let doc_w = doc_w.max(0.0);
    let doc_h = doc_h.max(0.0);
    let x0 = (f64::from(rect.x) * sx).clamp(0.0, doc_w);
    let y0 = (f64::from(rect.y) * sy).clamp(0.0, doc_h);
    let x1 = (f64::from(rect.right()) * sx).clamp(0.0, doc_w);
    let y1 = (f64::from(rect.bottom()) * sy).clamp(0.0, doc_h);
    DocRect::new(x0, y0, x1 - x0, y1 - y0)
}

/// Map a pixel position into document space, clamped to the page.
pub fn point_to_document(
    point: (u32, u32),
    pixel_w: u32,
    pixel_h: u32,
    doc_w: f64,
    doc_h: f64,
) -> (f64, f64) {
    let (sx, sy) = scale(pixel_w, pixel_h, doc_w, doc_h);
    (
        (f64::from(point.0) * sx).clamp(0.0, doc_w.max(0.0)),
        (f64::from(point.1) * sy).clamp(0.0, doc_h.max(0.0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_each_axis_independently() {
        let r = to_document(PixelRect::new(100, 50, 200, 100), 1000, 500, 500.0, 1000.0);
        assert_eq!(r, DocRect::new(50.0, 100.0, 100.0, 200.0));
    }

    #[test]
    fn clamps_rectangles_past_the_edge() {
        let r = to_document(PixelRect::new(900, 400, 300, 300), 1000, 500, 500.0, 250.0);
        assert_eq!(r.x, 450.0);
        assert_eq!(r.x + r.width, 500.0);
        assert_eq!(r.y + r.height, 250.0);
    }

    #[test]
    fn points_follow_the_same_scale() {
        assert_eq!(point_to_document((300, 150), 600, 300, 144.0, 72.0), (72.0, 36.0));
        assert_eq!(point_to_document((900, 150), 600, 300, 144.0, 72.0).0, 144.0);
    }
}
