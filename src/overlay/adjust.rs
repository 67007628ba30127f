//! Manual fine-tuning layered on top of the computed placement.

/// User override applied to every placement while an asset is selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentDelta {
    pub dx: f64,
    pub dy: f64,
    pub scale: f64,
}

impl AdjustmentDelta {
    pub const MIN_SCALE: f64 = 0.5;
    pub const MAX_SCALE: f64 = 2.0;
}

impl Default for AdjustmentDelta {
    fn default() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            scale: 1.0,
        }
    }
}

/// Nudge direction in video space (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn unit(self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// Owns the [`AdjustmentDelta`] for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentController {
    delta: AdjustmentDelta,
    /// Pixels moved per [`nudge_once`](Self::nudge_once)
    pub nudge_step: f64,
    /// Scale change per [`step_scale`](Self::step_scale) step
    pub scale_step: f64,
}

impl Default for AdjustmentController {
    fn default() -> Self {
        Self::new(10.0, 0.1)
    }
}

impl AdjustmentController {
    pub fn new(nudge_step: f64, scale_step: f64) -> Self {
        Self {
            delta: AdjustmentDelta::default(),
            nudge_step,
            scale_step,
        }
    }

    pub fn delta(&self) -> AdjustmentDelta {
        self.delta
    }

    pub fn scale(&self) -> f64 {
        self.delta.scale
    }

    pub fn nudge(&mut self, direction: Direction, step_pixels: f64) {
        let (ux, uy) = direction.unit();
        self.delta.dx += ux * step_pixels;
        self.delta.dy += uy * step_pixels;
    }

    /// Nudge by the configured step.
    pub fn nudge_once(&mut self, direction: Direction) {
        self.nudge(direction, self.nudge_step);
    }

    /// Store `value` clamped to `[0.5, 2.0]`. NaN is ignored.
    pub fn set_scale(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.delta.scale = value.clamp(AdjustmentDelta::MIN_SCALE, AdjustmentDelta::MAX_SCALE);
    }

    /// Move the scale slider by `steps` increments of `scale_step`.
    pub fn step_scale(&mut self, steps: i32) {
        self.set_scale(self.delta.scale + f64::from(steps) * self.scale_step);
    }

    pub fn reset(&mut self) {
        self.delta = AdjustmentDelta::default();
    }
}
