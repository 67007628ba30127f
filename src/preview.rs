//! Live preview output.
//!
//! The render loop publishes one placement per tick; a [`PreviewSink`] shows
//! it. The terminal sink draws the camera frame as characters with the frame
//! asset in color on top, plus a status line; the headless sink only logs.

use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};

use crate::ascii::{self, Cell, CellGrid, OverlayLayer, CELL_ASPECT, OVERLAY_GLYPH};
use crate::camera::Frame;
use crate::catalog::{AssetImage, AssetState};
use crate::overlay::{AdjustmentDelta, OverlayPlacement, Viewport};
use crate::render::TickOutcome;
use crate::terminal::StatusBar;

/// Everything the preview needs to present one tick.
#[derive(Debug, Clone)]
pub struct PreviewUpdate<'a> {
    pub outcome: &'a TickOutcome,
    /// Latest camera frame, if streaming
    pub frame: Option<&'a Frame>,
    pub frame_size: Option<(u32, u32)>,
    /// Placement converted to the sink's display space
    pub display_placement: Option<OverlayPlacement>,
    /// Loaded image of the selected frame
    pub asset: Option<&'a AssetImage>,
    pub camera: &'a str,
    pub asset_name: Option<&'a str>,
    pub asset_state: Option<AssetState>,
    pub delta: AdjustmentDelta,
    pub has_photo: bool,
    /// Transient message (last export result, errors)
    pub notice: Option<&'a str>,
}

pub trait PreviewSink {
    /// Display area in the sink's own units, used to build the viewport.
    fn display_size(&self) -> (f64, f64);

    /// Whether the preview shows the video mirrored (selfie view).
    fn mirrored(&self) -> bool {
        false
    }

    fn present(&mut self, update: &PreviewUpdate<'_>) -> io::Result<()>;

    /// Project `outcome`'s video-space placement into display space.
    fn project(&self, frame_size: Option<(u32, u32)>, outcome: &TickOutcome) -> Option<OverlayPlacement> {
        let TickOutcome::Placed(rect) = outcome else {
            return None;
        };
        let viewport = Viewport::contain(frame_size?, self.display_size(), self.mirrored())?;
        Some(viewport.to_display(rect))
    }
}

/// Full-screen character preview with a status line on the bottom row.
///
/// Display units are one cell wide and half a cell tall, so the contain fit
/// keeps the video's aspect ratio on screen.
pub struct TerminalPreview<W: Write> {
    out: W,
    status_bar: StatusBar,
    mirrored: bool,
    cols: u16,
    rows: u16,
    last_grid: Option<CellGrid>,
    last_line: String,
}

impl TerminalPreview<io::Stdout> {
    /// Frames arrive already mirrored from the camera, so they are drawn
    /// as-is.
    pub fn stdout() -> Self {
        let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        Self::new(io::stdout(), false, cols, rows)
    }
}

impl<W: Write> TerminalPreview<W> {
    pub fn new(out: W, mirrored: bool, cols: u16, rows: u16) -> Self {
        Self {
            out,
            status_bar: StatusBar::new(),
            mirrored,
            cols,
            rows,
            last_grid: None,
            last_line: String::new(),
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.last_grid = None;
        self.last_line.clear();
    }

    pub fn status_bar_mut(&mut self) -> &mut StatusBar {
        &mut self.status_bar
    }

    /// The grid drawn by the last `present`.
    pub fn last_grid(&self) -> Option<&CellGrid> {
        self.last_grid.as_ref()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn video_rows(&self) -> u16 {
        // The last row is the status bar
        self.rows.saturating_sub(1)
    }

    fn render_grid(&self, update: &PreviewUpdate<'_>) -> CellGrid {
        let (cols, rows) = (self.cols, self.video_rows());
        let Some(frame) = update.frame else {
            return CellGrid::blank(cols, rows);
        };
        let Some(viewport) =
            Viewport::contain((frame.width, frame.height), self.display_size(), self.mirrored)
        else {
            return CellGrid::blank(cols, rows);
        };
        let layer = match (update.outcome, update.asset) {
            (TickOutcome::Placed(rect), Some(image)) => Some(OverlayLayer {
                image,
                placement: *rect,
            }),
            _ => None,
        };
        ascii::render(frame, &viewport, cols, rows, layer.as_ref())
    }

    fn draw_row(&mut self, row: u16, cells: &[Cell]) -> io::Result<()> {
        crossterm::queue!(self.out, MoveTo(0, row))?;
        let mut run = String::with_capacity(cells.len());
        for cell in cells {
            match cell {
                Cell::Blank => run.push(' '),
                Cell::Video(ch) => run.push(*ch),
                Cell::Overlay(rgb) => {
                    if !run.is_empty() {
                        crossterm::queue!(self.out, Print(&run))?;
                        run.clear();
                    }
                    let [r, g, b] = visible_color(*rgb);
                    crossterm::queue!(
                        self.out,
                        SetForegroundColor(Color::Rgb { r, g, b }),
                        Print(OVERLAY_GLYPH),
                        ResetColor,
                    )?;
                }
            }
        }
        if !run.is_empty() {
            crossterm::queue!(self.out, Print(&run))?;
        }
        Ok(())
    }

    fn draw_status(&mut self, update: &PreviewUpdate<'_>) -> io::Result<()> {
        if !self.status_bar.visible {
            if !self.last_line.is_empty() {
                let status_row = self.video_rows();
                crossterm::queue!(
                    self.out,
                    MoveTo(0, status_row),
                    Clear(ClearType::CurrentLine),
                )?;
                self.last_line.clear();
            }
            return Ok(());
        }
        let mut line = self.status_bar.format(update);
        let width = usize::from(self.cols);
        if line.chars().count() > width {
            line = line.chars().take(width).collect();
        }
        if line == self.last_line {
            return Ok(());
        }
        let status_row = self.video_rows();
        crossterm::queue!(
            self.out,
            MoveTo(0, status_row),
            Clear(ClearType::CurrentLine),
            Print(&line),
        )?;
        self.last_line = line;
        Ok(())
    }
}

/// Lift near-black frame colors so they stay visible on a dark terminal.
fn visible_color(rgb: [u8; 3]) -> [u8; 3] {
    if ascii::luminance(rgb[0], rgb[1], rgb[2]) >= 64 {
        return rgb;
    }
    rgb.map(|c| c.saturating_add(96))
}

impl<W: Write> PreviewSink for TerminalPreview<W> {
    fn display_size(&self) -> (f64, f64) {
        (
            f64::from(self.cols),
            f64::from(self.video_rows()) * CELL_ASPECT,
        )
    }

    fn mirrored(&self) -> bool {
        self.mirrored
    }

    /// Placement in terminal cells.
    fn project(&self, frame_size: Option<(u32, u32)>, outcome: &TickOutcome) -> Option<OverlayPlacement> {
        let TickOutcome::Placed(rect) = outcome else {
            return None;
        };
        let viewport = Viewport::contain(frame_size?, self.display_size(), self.mirrored)?;
        let rect = viewport.to_display(rect);
        Some(OverlayPlacement {
            y: rect.y / CELL_ASPECT,
            height: rect.height / CELL_ASPECT,
            ..rect
        })
    }

    fn present(&mut self, update: &PreviewUpdate<'_>) -> io::Result<()> {
        let grid = self.render_grid(update);

        let previous = self.last_grid.take();
        if previous.is_none() {
            crossterm::queue!(self.out, Clear(ClearType::All))?;
        }
        for row in 0..grid.rows() {
            let unchanged = previous
                .as_ref()
                .is_some_and(|prev| prev.row(row) == grid.row(row));
            if !unchanged {
                self.draw_row(row, grid.row(row))?;
            }
        }
        self.last_grid = Some(grid);

        self.draw_status(update)?;
        self.out.flush()
    }
}

/// Preview for headless runs: logs placements at debug level.
#[derive(Debug, Default)]
pub struct LogPreview {
    presented: u64,
}

impl LogPreview {
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl PreviewSink for LogPreview {
    fn display_size(&self) -> (f64, f64) {
        (1.0, 1.0)
    }

    fn present(&mut self, update: &PreviewUpdate<'_>) -> io::Result<()> {
        self.presented += 1;
        log::debug!("preview: {:?}", update.outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FrameAsset;
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    fn vga_rect() -> OverlayPlacement {
        OverlayPlacement {
            x: 224.0,
            y: 158.4,
            width: 192.0,
            height: 96.0,
        }
    }

    fn update<'a>(outcome: &'a TickOutcome, sink: &impl PreviewSink) -> PreviewUpdate<'a> {
        let frame_size = Some((640, 480));
        PreviewUpdate {
            outcome,
            frame: None,
            frame_size,
            display_placement: sink.project(frame_size, outcome),
            asset: None,
            camera: "streaming",
            asset_name: Some("Aviator"),
            asset_state: Some(AssetState::Ready),
            delta: AdjustmentDelta::default(),
            has_photo: false,
            notice: None,
        }
    }

    #[test]
    fn test_projection_uses_contain_fit() {
        let sink = TerminalPreview::new(Vec::new(), false, 160, 61);
        let outcome = TickOutcome::Placed(vga_rect());
        // 640x480 into 160x60 cells (160x120 units): scale 0.25, no letterbox
        let rect = sink.project(Some((640, 480)), &outcome).unwrap();
        assert!((rect.x - 56.0).abs() < 1e-9);
        assert!((rect.y - 19.8).abs() < 1e-9);
        assert!((rect.width - 48.0).abs() < 1e-9);
        assert!((rect.height - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_projection_without_placement() {
        let sink = TerminalPreview::new(Vec::new(), false, 80, 24);
        assert!(sink.project(Some((640, 480)), &TickOutcome::NoOverlay).is_none());
        let placed = TickOutcome::Placed(OverlayPlacement {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        });
        assert!(sink.project(None, &placed).is_none());
    }

    #[test]
    fn test_placed_tick_draws_overlay_inside_projected_rect() {
        let mut sink = TerminalPreview::new(Vec::new(), false, 160, 61);
        let frame = Frame::solid(640, 480, [90, 90, 90]);
        let image = AssetImage {
            asset: Arc::new(FrameAsset {
                id: "aviator".to_string(),
                image_url: "aviator.png".to_string(),
                display_name: "Aviator".to_string(),
            }),
            image: RgbaImage::from_pixel(200, 100, Rgba([200, 30, 30, 255])),
        };
        let outcome = TickOutcome::Placed(vga_rect());
        let mut u = update(&outcome, &sink);
        u.frame = Some(&frame);
        u.asset = Some(&image);
        sink.present(&u).unwrap();

        let rect = u.display_placement.unwrap();
        let grid = sink.last_grid().unwrap();
        let cells: Vec<_> = grid.overlay_cells().collect();
        assert!(!cells.is_empty());
        for (col, row) in cells {
            let (col, row) = (f64::from(col), f64::from(row));
            assert!(col + 1.0 > rect.x && col < rect.x + rect.width, "col {}", col);
            assert!(row + 1.0 > rect.y && row < rect.y + rect.height, "row {}", row);
        }
        // Video outside the frame is drawn as characters
        assert!(matches!(grid.get(5, 5), Some(Cell::Video(_))));

        let text = String::from_utf8_lossy(&sink.into_inner()).to_string();
        assert!(text.contains(OVERLAY_GLYPH));
        assert!(text.contains("Aviator"));
    }

    #[test]
    fn test_no_overlay_without_loaded_asset() {
        let mut sink = TerminalPreview::new(Vec::new(), false, 160, 61);
        let frame = Frame::solid(640, 480, [90, 90, 90]);
        let outcome = TickOutcome::Placed(vga_rect());
        let mut u = update(&outcome, &sink);
        u.frame = Some(&frame);
        sink.present(&u).unwrap();

        assert_eq!(sink.last_grid().unwrap().overlay_cells().count(), 0);
        let text = String::from_utf8_lossy(&sink.into_inner()).to_string();
        assert!(!text.contains(OVERLAY_GLYPH));
    }

    #[test]
    fn test_terminal_preview_skips_unchanged_output() {
        let mut sink = TerminalPreview::new(Vec::new(), true, 80, 24);
        let frame = Frame::solid(320, 240, [255, 255, 255]);
        let outcome = TickOutcome::NoOverlay;
        let mut u = update(&outcome, &sink);
        u.frame = Some(&frame);
        sink.present(&u).unwrap();
        let written = sink.out.len();
        assert!(written > 0);
        sink.present(&u).unwrap();
        assert_eq!(sink.out.len(), written);

        let text = String::from_utf8_lossy(&sink.into_inner()).to_string();
        assert!(text.contains("Aviator"));
        assert!(text.contains('@'));
    }

    #[test]
    fn test_hidden_status_bar_keeps_video() {
        let mut sink = TerminalPreview::new(Vec::new(), false, 80, 24);
        sink.status_bar_mut().toggle();
        let frame = Frame::solid(320, 240, [255, 255, 255]);
        let outcome = TickOutcome::NoOverlay;
        let mut u = update(&outcome, &sink);
        u.frame = Some(&frame);
        sink.present(&u).unwrap();

        let text = String::from_utf8_lossy(&sink.into_inner()).to_string();
        assert!(!text.contains("cam:"));
        assert!(text.contains('@'));
    }

    #[test]
    fn test_resize_redraws_everything() {
        let mut sink = TerminalPreview::new(Vec::new(), false, 80, 24);
        let outcome = TickOutcome::NoFrame;
        let u = update(&outcome, &sink);
        sink.present(&u).unwrap();
        sink.resize(40, 12);
        let before = sink.out.len();
        sink.present(&u).unwrap();
        assert!(sink.out.len() > before);
        assert_eq!(sink.last_grid().unwrap().cols(), 40);
        assert_eq!(sink.last_grid().unwrap().rows(), 11);
    }
}
