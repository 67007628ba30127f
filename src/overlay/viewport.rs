//! Video space to display space.
//!
//! The live preview shows the frame letterboxed ("contain" fit) inside an
//! arbitrary display area, optionally mirrored. Placement is always computed
//! in video space; this only converts for presentation and pointer input.

use super::placement::OverlayPlacement;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    video_width: f64,
    video_height: f64,
    /// Display pixels per video pixel
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    mirrored: bool,
}

impl Viewport {
    /// Fit a `video` sized frame inside a `display` sized area.
    ///
    /// Returns `None` when either size is empty.
    pub fn contain(
        video: (u32, u32),
        display: (f64, f64),
        mirrored: bool,
    ) -> Option<Self> {
        let (vw, vh) = (f64::from(video.0), f64::from(video.1));
        let (dw, dh) = display;
        if vw <= 0.0 || vh <= 0.0 || dw <= 0.0 || dh <= 0.0 {
            return None;
        }
        let scale = (dw / vw).min(dh / vh);
        Some(Self {
            video_width: vw,
            video_height: vh,
            scale,
            offset_x: (dw - vw * scale) / 2.0,
            offset_y: (dh - vh * scale) / 2.0,
            mirrored,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_display(&self, rect: &OverlayPlacement) -> OverlayPlacement {
        let x = if self.mirrored {
            self.video_width - (rect.x + rect.width)
        } else {
            rect.x
        };
        OverlayPlacement {
            x: self.offset_x + x * self.scale,
            y: self.offset_y + rect.y * self.scale,
            width: rect.width * self.scale,
            height: rect.height * self.scale,
        }
    }

    /// Display point back to video space. `None` if it falls in the letterbox.
    pub fn to_video(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let vx = (x - self.offset_x) / self.scale;
        let vy = (y - self.offset_y) / self.scale;
        if !(0.0..=self.video_width).contains(&vx) || !(0.0..=self.video_height).contains(&vy) {
            return None;
        }
        let vx = if self.mirrored {
            self.video_width - vx
        } else {
            vx
        };
        Some((vx, vy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> OverlayPlacement {
        OverlayPlacement {
            x: 224.0,
            y: 158.4,
            width: 192.0,
            height: 96.0,
        }
    }

    #[test]
    fn test_identity_when_sizes_match() {
        let vp = Viewport::contain((640, 480), (640.0, 480.0), false).unwrap();
        assert_eq!(vp.to_display(&rect()), rect());
    }

    #[test]
    fn test_pillarbox_offsets() {
        // 4:3 video in a 16:9 display: height-limited, bars left and right.
        let vp = Viewport::contain((640, 480), (1280.0, 720.0), false).unwrap();
        assert_eq!(vp.scale(), 1.5);
        let d = vp.to_display(&rect());
        assert!((d.x - (160.0 + 224.0 * 1.5)).abs() < 1e-9);
        assert!((d.y - 158.4 * 1.5).abs() < 1e-9);
        assert!((d.width / d.height - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_mirrored_rect() {
        let vp = Viewport::contain((640, 480), (640.0, 480.0), true).unwrap();
        let d = vp.to_display(&rect());
        assert_eq!(d.x, 640.0 - (224.0 + 192.0));
    }

    #[test]
    fn test_to_video_inverse_and_letterbox() {
        let vp = Viewport::contain((640, 480), (1280.0, 720.0), false).unwrap();
        assert_eq!(vp.to_video(160.0 + 300.0, 150.0), Some((200.0, 100.0)));
        assert_eq!(vp.to_video(10.0, 10.0), None);
    }

    #[test]
    fn test_empty_sizes() {
        assert!(Viewport::contain((0, 480), (100.0, 100.0), false).is_none());
        assert!(Viewport::contain((640, 480), (0.0, 100.0), false).is_none());
    }
}
