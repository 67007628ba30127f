//! The per-refresh placement loop.
//!
//! Each tick reads the current frame size, estimates landmarks, places the
//! selected frame and publishes the result for the live preview. The loop is
//! bound to one capture session and halts for good the first time it sees
//! that session is no longer streaming.

use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::camera::SessionWatch;
use crate::catalog::AssetImage;
use crate::landmarks::{HeuristicEstimator, LandmarkEstimator};
use crate::overlay::{AdjustmentDelta, OverlayPlacement, OverlayPositioner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
}

/// What one tick has to work with.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    /// Dimensions of the latest frame, `None` if none has arrived yet
    pub frame_size: Option<(u32, u32)>,
    /// Selected asset, only once its image has loaded
    pub asset: Option<&'a AssetImage>,
    pub delta: AdjustmentDelta,
}

/// What the live preview should draw for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub frame_width: u32,
    pub frame_height: u32,
    pub asset_id: Option<String>,
    pub placement: Option<OverlayPlacement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Session is gone; no work was done and the loop is now stopped
    Halted,
    /// Streaming, but the device has not produced a frame yet
    NoFrame,
    /// Frame published without overlay (nothing selected or not loaded)
    NoOverlay,
    /// Frame published without overlay because estimation or placement failed
    Skipped(String),
    Placed(OverlayPlacement),
}

pub struct RenderLoop<E: LandmarkEstimator = HeuristicEstimator> {
    state: LoopState,
    session: Option<SessionWatch>,
    estimator: E,
    positioner: OverlayPositioner,
    last: Option<Published>,
    ticks: u64,
}

impl<E: LandmarkEstimator> std::fmt::Debug for RenderLoop<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("state", &self.state)
            .field("ticks", &self.ticks)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl<E: LandmarkEstimator> RenderLoop<E> {
    pub fn new(estimator: E, positioner: OverlayPositioner) -> Self {
        Self {
            state: LoopState::Stopped,
            session: None,
            estimator,
            positioner,
            last: None,
            ticks: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Ticks that did placement work since construction.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Most recently published placement, if any.
    pub fn last_published(&self) -> Option<&Published> {
        self.last.as_ref()
    }

    /// Begin ticking for the session behind `session`.
    ///
    /// Does nothing if that session is not streaming.
    pub fn start(&mut self, session: SessionWatch) {
        if !session.is_streaming() {
            log::debug!(
                "render loop not started: session {} is not streaming",
                session.session_id()
            );
            return;
        }
        log::debug!("render loop running for session {}", session.session_id());
        self.session = Some(session);
        self.state = LoopState::Running;
        self.last = None;
    }

    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            log::debug!("render loop stopped");
        }
        self.state = LoopState::Stopped;
        self.session = None;
    }

    /// Run one tick.
    ///
    /// Liveness is checked first, so a tick that was already scheduled when
    /// the session stopped does no placement work.
    pub fn tick(&mut self, input: TickInput<'_>) -> TickOutcome {
        let streaming = self
            .session
            .as_ref()
            .is_some_and(|s| s.is_streaming());
        if self.state != LoopState::Running || !streaming {
            self.stop();
            return TickOutcome::Halted;
        }

        let Some((frame_width, frame_height)) = input.frame_size else {
            return TickOutcome::NoFrame;
        };
        self.ticks += 1;

        let mut published = Published {
            frame_width,
            frame_height,
            asset_id: None,
            placement: None,
        };

        let outcome = match input.asset {
            None => TickOutcome::NoOverlay,
            Some(asset) => match self.place(frame_width, frame_height, asset, &input.delta) {
                Ok(placement) => {
                    published.asset_id = Some(asset.asset.id.clone());
                    published.placement = Some(placement);
                    TickOutcome::Placed(placement)
                }
                Err(reason) => {
                    log::warn!("tick {}: overlay skipped: {}", self.ticks, reason);
                    TickOutcome::Skipped(reason)
                }
            },
        };

        self.last = Some(published);
        outcome
    }

    fn place(
        &self,
        frame_width: u32,
        frame_height: u32,
        asset: &AssetImage,
        delta: &AdjustmentDelta,
    ) -> Result<OverlayPlacement, String> {
        let landmarks = self
            .estimator
            .estimate(frame_width, frame_height)
            .map_err(|e| e.to_string())?;
        self.positioner
            .place_adjusted(&landmarks, asset.aspect_ratio(), delta)
            .map_err(|e| e.to_string())
    }
}

/// Repeating tick schedule standing in for the display refresh.
///
/// Late ticks are dropped rather than bunched up, so ticks never overlap and
/// the loop never tries to catch up.
#[derive(Debug)]
pub struct TickTimer {
    interval: Interval,
}

impl TickTimer {
    pub fn new(fps: u32) -> Self {
        let period = Duration::from_micros(1_000_000 / u64::from(fps.max(1)));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
