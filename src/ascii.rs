//! Camera frames as character grids for the terminal preview.
//!
//! Each cell averages the frame pixels it covers (ITU-R BT.601 luminance,
//! integer math) and maps the brightness onto a density ramp. Cells that the
//! frame asset covers are sampled from the asset image at the same video-space
//! positions the compositor draws it, so the preview and the photo agree to
//! within a pixel of rounding.

use crate::camera::Frame;
use crate::catalog::AssetImage;
use crate::overlay::{OverlayPlacement, Viewport};

/// Terminal cells are about twice as tall as they are wide.
pub const CELL_ASPECT: f64 = 2.0;

/// Density ramp, darkest (space) to brightest (@).
pub const STANDARD_CHARSET: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Glyph for cells covered by the frame asset.
pub const OVERLAY_GLYPH: char = '█';

/// Asset pixels at or above this alpha count as drawn.
const ALPHA_THRESHOLD: u8 = 128;

/// Sample points per cell edge when reading the asset. Thin frame rims would
/// slip between single center samples.
const OVERLAY_SAMPLES: u32 = 3;

/// Y = 0.299 R + 0.587 G + 0.114 B, scaled by 1000.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b)) / 1000) as u8
}

/// Map a brightness (0-255) onto `charset`, ordered darkest to brightest.
pub fn brightness_to_char(brightness: u8, charset: &[char]) -> char {
    if charset.is_empty() {
        return ' ';
    }
    let idx = (usize::from(brightness) * (charset.len() - 1)) / 255;
    charset[idx]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Letterbox bar, or no video at all
    Blank,
    Video(char),
    /// Covered by the frame asset; carries the asset's color there
    Overlay([u8; 3]),
}

/// Row-major grid of rendered cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl CellGrid {
    pub fn blank(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            cells: vec![Cell::Blank; usize::from(cols) * usize::from(rows)],
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn get(&self, col: u16, row: u16) -> Option<Cell> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells
            .get(usize::from(row) * usize::from(self.cols) + usize::from(col))
            .copied()
    }

    pub fn row(&self, row: u16) -> &[Cell] {
        let start = usize::from(row) * usize::from(self.cols);
        let end = start + usize::from(self.cols);
        self.cells.get(start..end).unwrap_or(&[])
    }

    /// `(col, row)` of every overlay cell.
    pub fn overlay_cells(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        let cols = usize::from(self.cols.max(1));
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| matches!(cell, Cell::Overlay(_)))
            .map(move |(i, _)| ((i % cols) as u16, (i / cols) as u16))
    }
}

/// The loaded frame asset and where it goes, in video space.
#[derive(Debug, Clone, Copy)]
pub struct OverlayLayer<'a> {
    pub image: &'a AssetImage,
    pub placement: OverlayPlacement,
}

/// Render `frame` into a `cols` x `rows` grid.
///
/// `viewport` maps video space into display units of one cell width; a cell
/// spans `CELL_ASPECT` units vertically.
pub fn render(
    frame: &Frame,
    viewport: &Viewport,
    cols: u16,
    rows: u16,
    overlay: Option<&OverlayLayer<'_>>,
) -> CellGrid {
    let mut grid = CellGrid::blank(cols, rows);
    if frame.width == 0 || frame.height == 0 || viewport.scale() <= 0.0 {
        return grid;
    }

    // Video pixels spanned by half a cell
    let half_w = 0.5 / viewport.scale();
    let half_h = 0.5 * CELL_ASPECT / viewport.scale();

    for row in 0..rows {
        for col in 0..cols {
            let center_x = f64::from(col) + 0.5;
            let center_y = (f64::from(row) + 0.5) * CELL_ASPECT;
            let Some((vx, vy)) = viewport.to_video(center_x, center_y) else {
                continue;
            };

            let cell = match overlay.and_then(|layer| overlay_color(layer, viewport, col, row)) {
                Some(rgb) => Cell::Overlay(rgb),
                None => {
                    let brightness = average_luma(frame, vx, vy, half_w, half_h);
                    Cell::Video(brightness_to_char(brightness, STANDARD_CHARSET))
                }
            };
            grid.cells[usize::from(row) * usize::from(cols) + usize::from(col)] = cell;
        }
    }
    grid
}

/// Mean luminance of the frame pixels within `half_w`/`half_h` of (vx, vy).
fn average_luma(frame: &Frame, vx: f64, vy: f64, half_w: f64, half_h: f64) -> u8 {
    let (w, h) = (frame.width, frame.height);
    let x0 = ((vx - half_w).floor().max(0.0) as u32).min(w - 1);
    let y0 = ((vy - half_h).floor().max(0.0) as u32).min(h - 1);
    let x1 = ((vx + half_w).ceil() as u32).clamp(x0 + 1, w);
    let y1 = ((vy + half_h).ceil() as u32).clamp(y0 + 1, h);

    let mut sum = 0u32;
    let mut count = 0u32;
    for py in y0..y1 {
        for px in x0..x1 {
            let idx = (py as usize * w as usize + px as usize) * Frame::BYTES_PER_PIXEL;
            if let Some(rgb) = frame.data.get(idx..idx + 3) {
                sum += u32::from(luminance(rgb[0], rgb[1], rgb[2]));
                count += 1;
            }
        }
    }
    if count == 0 {
        0
    } else {
        (sum / count) as u8
    }
}

/// Color of the first opaque asset pixel found under the cell, if any.
fn overlay_color(
    layer: &OverlayLayer<'_>,
    viewport: &Viewport,
    col: u16,
    row: u16,
) -> Option<[u8; 3]> {
    let OverlayPlacement {
        x,
        y,
        width,
        height,
    } = layer.placement;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let image = &layer.image.image;
    let (iw, ih) = image.dimensions();
    if iw == 0 || ih == 0 {
        return None;
    }

    for sy in 0..OVERLAY_SAMPLES {
        for sx in 0..OVERLAY_SAMPLES {
            let dx = f64::from(col) + (f64::from(sx) + 0.5) / f64::from(OVERLAY_SAMPLES);
            let dy =
                (f64::from(row) + (f64::from(sy) + 0.5) / f64::from(OVERLAY_SAMPLES)) * CELL_ASPECT;
            let Some((vx, vy)) = viewport.to_video(dx, dy) else {
                continue;
            };
            if vx < x || vy < y || vx >= x + width || vy >= y + height {
                continue;
            }
            let u = (((vx - x) / width * f64::from(iw)) as u32).min(iw - 1);
            let v = (((vy - y) / height * f64::from(ih)) as u32).min(ih - 1);
            let pixel = image.get_pixel(u, v);
            if pixel[3] >= ALPHA_THRESHOLD {
                return Some([pixel[0], pixel[1], pixel[2]]);
            }
        }
    }
    None
}
