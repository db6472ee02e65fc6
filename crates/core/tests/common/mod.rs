//! Synthetic page rasters shared by the integration tests.

#![allow(dead_code)]

use image::{Rgb, RgbImage};
use tabscan_core::PageRaster;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Rendering resolution of the synthetic pages; one point is two pixels.
pub const DPI: f64 = 144.0;

pub fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

pub fn fill(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for yy in y..(y + h).min(img.height()) {
        for xx in x..(x + w).min(img.width()) {
            img.put_pixel(xx, yy, color);
        }
    }
}

/// A ruled grid with glyph-sized blobs in every cell.
#[derive(Clone, Copy, Debug)]
pub struct Grid {
    pub x: u32,
    pub y: u32,
    pub rows: u32,
    pub cols: u32,
    pub cell_w: u32,
    pub cell_h: u32,
    /// Glyph blobs per cell, laid out left to right.
    pub glyphs: u32,
}

impl Grid {
    /// 6 rows × 4 columns of 120 × 50 px cells, three glyphs each.
    pub fn at(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            rows: 6,
            cols: 4,
            cell_w: 120,
            cell_h: 50,
            glyphs: 3,
        }
    }

    /// Outer extent including the 2 px ruling.
    pub fn width(&self) -> u32 {
        self.cols * self.cell_w + 2
    }

    pub fn height(&self) -> u32 {
        self.rows * self.cell_h + 2
    }

    pub fn draw(&self, img: &mut RgbImage) {
        for row in 0..=self.rows {
            fill(img, self.x, self.y + row * self.cell_h, self.width(), 2, BLACK);
        }
        for col in 0..=self.cols {
            fill(img, self.x + col * self.cell_w, self.y, 2, self.height(), BLACK);
        }
        for row in 0..self.rows {
            for col in 0..self.cols {
                for g in 0..self.glyphs {
                    let gx = self.x + col * self.cell_w + 15 + g * 25;
                    let gy = self.y + row * self.cell_h + 20;
                    fill(img, gx, gy, 6, 10, BLACK);
                }
            }
        }
    }
}

pub fn page_with(width: u32, height: u32, grids: &[Grid]) -> PageRaster {
    let mut img = blank(width, height);
    for grid in grids {
        grid.draw(&mut img);
    }
    PageRaster::from_dpi(0, img, DPI)
}

/// A thin rectangular frame around a flat gray picture, no text.
pub fn framed_photo(width: u32, height: u32) -> PageRaster {
    let mut img = blank(width, height);
    let (x, y, w, h) = (100, 150, 560, 300);
    fill(&mut img, x, y, w, 2, BLACK);
    fill(&mut img, x, y + h - 2, w, 2, BLACK);
    fill(&mut img, x, y, 2, h, BLACK);
    fill(&mut img, x + w - 2, y, 2, h, BLACK);
    fill(&mut img, x + 10, y + 10, w - 20, h - 20, Rgb([120, 120, 120]));
    PageRaster::from_dpi(0, img, DPI)
}

/// Assert a record lies inside its page with positive size.
pub fn assert_in_bounds(record: &tabscan_core::TableRecord, raster: &PageRaster) {
    let b = &record.bbox;
    assert!(b.x >= 0.0 && b.y >= 0.0, "{b:?}");
    assert!(b.width > 0.0 && b.height > 0.0, "{b:?}");
    assert!(b.x + b.width <= raster.doc_width + 1e-9, "{b:?}");
    assert!(b.y + b.height <= raster.doc_height + 1e-9, "{b:?}");
}
