//! Rendered page rasters.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::table::{DocRect, PixelRect};

/// A page rendered at a known resolution.
///
/// Holds the pixels together with the page's size in document units
/// (points), which is what ties pixel coordinates back to the document.
#[derive(Debug, Clone)]
pub struct PageRaster {
    /// Zero-based page index in the source document.
    pub page: usize,
    pub image: RgbImage,
    pub doc_width: f64,
    pub doc_height: f64,
}

impl PageRaster {
    pub fn new(page: usize, image: RgbImage, doc_width: f64, doc_height: f64) -> Self {
        Self {
            page,
            image,
            doc_width,
            doc_height,
        }
    }

    /// Build a raster whose document size follows from the render resolution.
    pub fn from_dpi(page: usize, image: RgbImage, dpi: f64) -> Self {
        let scale = 72.0 / dpi;
        let doc_width = f64::from(image.width()) * scale;
        let doc_height = f64::from(image.height()) * scale;
        Self::new(page, image, doc_width, doc_height)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Pixel area of the whole raster.
    pub fn area(&self) -> f64 {
        f64::from(self.width()) * f64::from(self.height())
    }

    /// The whole raster as a rectangle.
    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width(), self.height())
    }

    /// Pixels per document unit along x and y.
    pub fn pixels_per_unit(&self) -> (f64, f64) {
        if self.doc_width <= 0.0 || self.doc_height <= 0.0 {
            return (1.0, 1.0);
        }
        (
            f64::from(self.width()) / self.doc_width,
            f64::from(self.height()) / self.doc_height,
        )
    }

    /// Single-channel intensity of a sub-region.
    pub fn gray_region(&self, rect: PixelRect) -> GrayImage {
        let rect = rect.clip_to(self.width(), self.height());
        let mut out = GrayImage::new(rect.w, rect.h);
        for (x, y, px) in out.enumerate_pixels_mut() {
            let Rgb([r, g, b]) = *self.image.get_pixel(rect.x + x, rect.y + y);
            // ITU-R BT.601 luma, the weights used by common grayscale conversions.
            let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
            px.0[0] = luma.round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Convert a document-space box to the smallest pixel box covering it.
    pub fn doc_to_pixels(&self, rect: &DocRect) -> Option<PixelRect> {
        let (sx, sy) = self.pixels_per_unit();
        let x0 = (rect.x * sx).floor().max(0.0);
        let y0 = (rect.y * sy).floor().max(0.0);
        let x1 = ((rect.x + rect.width) * sx).ceil().min(f64::from(self.width()));
        let y1 = ((rect.y + rect.height) * sy).ceil().min(f64::from(self.height()));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect::new(
            x0 as u32,
            y0 as u32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        ))
    }

    /// A copy of this raster with every region painted white.
    pub fn masked(&self, regions: &[DocRect]) -> PageRaster {
        let mut image = self.image.clone();
        for region in regions {
            if let Some(px) = self.doc_to_pixels(region) {
                let rect = Rect::at(px.x as i32, px.y as i32).of_size(px.w, px.h);
                draw_filled_rect_mut(&mut image, rect, Rgb([255, 255, 255]));
            }
        }
        PageRaster::new(self.page, image, self.doc_width, self.doc_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_region_uses_luma_weights() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        img.put_pixel(1, 1, Rgb([255, 0, 0]));
        let raster = PageRaster::new(0, img, 4.0, 4.0);
        let gray = raster.gray_region(PixelRect::new(1, 1, 2, 2));
        assert_eq!(gray.dimensions(), (2, 2));
        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
        assert_eq!(gray.get_pixel(1, 1).0[0], 255);
    }

    #[test]
    fn masked_paints_document_region_white() {
        let img = RgbImage::from_pixel(200, 100, Rgb([0, 0, 0]));
        // Two pixels per point.
        let raster = PageRaster::new(3, img, 100.0, 50.0);
        let masked = raster.masked(&[DocRect::new(10.0, 5.0, 20.0, 10.0)]);
        assert_eq!(masked.page, 3);
        assert_eq!(masked.get_rgb(20, 10), [255, 255, 255]);
        assert_eq!(masked.get_rgb(59, 29), [255, 255, 255]);
        assert_eq!(masked.get_rgb(60, 30), [0, 0, 0]);
        assert_eq!(raster.get_rgb(20, 10), [0, 0, 0]);
    }

    #[test]
    fn from_dpi_derives_points() {
        let raster = PageRaster::from_dpi(0, RgbImage::new(300, 150), 150.0);
        assert!((raster.doc_width - 144.0).abs() < 1e-9);
        assert!((raster.doc_height - 72.0).abs() < 1e-9);
    }

    impl PageRaster {
        fn get_rgb(&self, x: u32, y: u32) -> [u8; 3] {
            self.image.get_pixel(x, y).0
        }
    }
}
