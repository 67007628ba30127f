//! One-line status bar summarising the live try-on state.

use crate::catalog::AssetState;
use crate::preview::PreviewUpdate;
use crate::render::TickOutcome;

/// Status bar drawn on the last terminal row.
///
/// Shows: camera state | frame name and load state | scale | placement | photo
#[derive(Debug, Clone)]
pub struct StatusBar {
    pub visible: bool,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBar {
    pub fn new() -> Self {
        Self { visible: true }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Format the status text. `placement` is already in display cells.
    pub fn format(&self, update: &PreviewUpdate<'_>) -> String {
        let frame = match (update.asset_name, &update.asset_state) {
            (None, _) => "no frame".to_string(),
            (Some(name), Some(AssetState::Loading)) => format!("{} (loading)", name),
            (Some(name), Some(AssetState::Failed(_))) => format!("{} (failed)", name),
            (Some(name), _) => name.to_string(),
        };

        let placement = match (&update.outcome, &update.display_placement) {
            (TickOutcome::Placed(_), Some(rect)) => format!(
                "@{:.0},{:.0} {:.0}x{:.0}",
                rect.x, rect.y, rect.width, rect.height
            ),
            (TickOutcome::Skipped(_), _) => "skipped".to_string(),
            (TickOutcome::NoFrame, _) => "waiting for camera".to_string(),
            _ => "-".to_string(),
        };

        let mut line = format!(
            " cam:{} | {} | x{:.2} | {}",
            update.camera,
            frame,
            update.delta.scale,
            placement,
        );
        if update.has_photo {
            line.push_str(" | photo ready (d/s/x)");
        }
        if let Some(notice) = update.notice {
            line.push_str(" | ");
            line.push_str(notice);
        }
        line.push(' ');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{AdjustmentDelta, OverlayPlacement};

    fn update<'a>(outcome: &'a TickOutcome) -> PreviewUpdate<'a> {
        PreviewUpdate {
            outcome,
            frame: None,
            frame_size: Some((640, 480)),
            display_placement: None,
            asset: None,
            camera: "streaming",
            asset_name: None,
            asset_state: None,
            delta: AdjustmentDelta::default(),
            has_photo: false,
            notice: None,
        }
    }

    #[test]
    fn test_format_without_frame() {
        let outcome = TickOutcome::NoOverlay;
        let text = StatusBar::new().format(&update(&outcome));
        assert_eq!(text, " cam:streaming | no frame | x1.00 | - ");
    }

    #[test]
    fn test_format_with_placement_and_photo() {
        let rect = OverlayPlacement {
            x: 10.0,
            y: 5.0,
            width: 20.0,
            height: 8.0,
        };
        let outcome = TickOutcome::Placed(rect);
        let mut u = update(&outcome);
        u.display_placement = Some(rect);
        u.asset_name = Some("Aviator");
        u.asset_state = Some(AssetState::Ready);
        u.has_photo = true;
        let text = StatusBar::new().format(&u);
        assert!(text.contains("Aviator"));
        assert!(text.contains("@10,5 20x8"));
        assert!(text.contains("photo ready"));
    }

    #[test]
    fn test_format_loading_asset() {
        let outcome = TickOutcome::NoOverlay;
        let mut u = update(&outcome);
        u.asset_name = Some("Round");
        u.asset_state = Some(AssetState::Loading);
        assert!(StatusBar::new().format(&u).contains("Round (loading)"));
    }
}
