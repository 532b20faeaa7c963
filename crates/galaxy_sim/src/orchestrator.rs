use bevy::log::{info, warn};
use galaxy_core::{GalaxyConfig, StarSet};
use galaxy_gpu::{BatchBackend, DrawCall, RenderOptimizer};
use galaxy_physics::procgen::{galaxy_rng, generate_galaxy};
use galaxy_physics::rotation::RotationState;
use std::fmt;

use crate::controls::{OrbitControls, Viewport};
use crate::frame_loop::{CancelToken, FrameId, FrameScheduler};
use crate::quality::{AdaptiveQuality, FrameStats, QualityChange, QualityDirection};

/// Longest delta fed to camera damping, so a stall does not snap the camera
const MAX_CAMERA_DELTA: f64 = 0.1;

/// Lifecycle of the animation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    Uninitialized,
    /// Stars generated, no frame scheduled
    Ready,
    Running,
    Disposed,
}

impl LoopState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::Disposed => "Disposed",
        }
    }

    pub fn can_transition(self, to: LoopState) -> bool {
        use LoopState::*;
        matches!(
            (self, to),
            (Uninitialized, Ready)
                | (Ready, Running)
                | (Uninitialized | Ready | Running, Disposed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// The orchestrator was disposed; nothing more can run
    Disposed,
    InvalidTransition { from: LoopState, to: LoopState },
    /// A frame callback that is not the one currently scheduled
    StaleFrame { expected: Option<FrameId>, got: FrameId },
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::Disposed => write!(f, "Galaxy orchestrator already disposed"),
            OrchestratorError::InvalidTransition { from, to } => {
                write!(f, "Invalid loop transition {} -> {}", from.name(), to.name())
            }
            OrchestratorError::StaleFrame { expected, got } => match expected {
                Some(expected) => write!(f, "Frame {} is stale, expected {}", got.0, expected.0),
                None => write!(f, "Frame {} is stale, no frame scheduled", got.0),
            },
        }
    }
}

impl std::error::Error for OrchestratorError {}

/// What one frame did
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: FrameId,
    /// Animation time of this frame
    pub elapsed: f64,
    pub delta: f64,
    pub draw_calls: Vec<DrawCall>,
    pub visible_stars: usize,
    /// Set when an FPS window closed on this frame
    pub fps: Option<f32>,
    pub quality_change: Option<QualityChange>,
    /// False once the cancellation token is set
    pub rescheduled: bool,
}

/// Owns the galaxy and runs the per-frame sequence: timing, camera damping,
/// rotation, cull and submit, present, frame statistics.
pub struct GalaxyOrchestrator<B: BatchBackend, S: FrameScheduler> {
    /// As supplied by the caller
    config: GalaxyConfig,
    /// Sanitized and scaled by the quality controller
    effective: GalaxyConfig,
    stars: StarSet,
    rotation: RotationState,
    optimizer: RenderOptimizer<B::Handle>,
    backend: B,
    scheduler: S,
    cancel: CancelToken,
    pending: Option<FrameId>,
    controls: OrbitControls,
    viewport: Viewport,
    stats: FrameStats,
    quality: AdaptiveQuality,
    /// Animation time since the current galaxy was generated
    elapsed: f64,
    last_timestamp: Option<f64>,
    /// Bumped on every regeneration
    generation: u64,
    state: LoopState,
}

impl<B: BatchBackend, S: FrameScheduler> GalaxyOrchestrator<B, S> {
    pub fn new(config: GalaxyConfig, backend: B, scheduler: S) -> Self {
        let effective = config.sanitized();
        let mut orchestrator = Self {
            config,
            effective,
            stars: StarSet::new(),
            rotation: RotationState::default(),
            optimizer: RenderOptimizer::default(),
            backend,
            scheduler,
            cancel: CancelToken::new(),
            pending: None,
            controls: OrbitControls::default(),
            viewport: Viewport::default(),
            stats: FrameStats::default(),
            quality: AdaptiveQuality::default(),
            elapsed: 0.0,
            last_timestamp: None,
            generation: 0,
            state: LoopState::Uninitialized,
        };
        orchestrator.regenerate();
        info!("Galaxy loop: Uninitialized -> Ready");
        orchestrator.state = LoopState::Ready;
        orchestrator
    }

    pub fn with_quality(mut self, quality: AdaptiveQuality) -> Self {
        self.replace_quality(quality);
        self
    }

    /// Replace the quality controller, regenerating if its star fraction
    /// differs from the current one
    pub fn set_quality(&mut self, quality: AdaptiveQuality) -> Result<(), OrchestratorError> {
        if self.state == LoopState::Disposed {
            return Err(OrchestratorError::Disposed);
        }
        self.replace_quality(quality);
        Ok(())
    }

    fn replace_quality(&mut self, quality: AdaptiveQuality) {
        let regenerate = quality.star_fraction() != self.quality.star_fraction();
        self.quality = quality;
        if regenerate {
            self.regenerate();
        }
    }

    fn transition(&mut self, to: LoopState) -> Result<(), OrchestratorError> {
        if self.state == LoopState::Disposed {
            return Err(OrchestratorError::Disposed);
        }
        if !self.state.can_transition(to) {
            return Err(OrchestratorError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        info!("Galaxy loop: {} -> {}", self.state.name(), to.name());
        self.state = to;
        Ok(())
    }

    /// Schedule the first frame. No-op while already running, including after
    /// cancellation: only `dispose` ends the loop.
    pub fn start(&mut self) -> Result<(), OrchestratorError> {
        if self.state == LoopState::Running {
            return Ok(());
        }
        self.transition(LoopState::Running)?;
        self.last_timestamp = None;
        self.pending = Some(self.scheduler.request_frame());
        Ok(())
    }

    /// Display refresh callback. `timestamp` is in seconds on any monotonic
    /// clock.
    pub fn on_frame(
        &mut self,
        frame: FrameId,
        timestamp: f64,
    ) -> Result<FrameReport, OrchestratorError> {
        match self.state {
            LoopState::Running => {}
            LoopState::Disposed => return Err(OrchestratorError::Disposed),
            from => {
                return Err(OrchestratorError::InvalidTransition {
                    from,
                    to: LoopState::Running,
                });
            }
        }
        if self.pending != Some(frame) {
            return Err(OrchestratorError::StaleFrame {
                expected: self.pending,
                got: frame,
            });
        }
        self.pending = None;

        let delta = match self.last_timestamp {
            Some(last) if timestamp.is_finite() => (timestamp - last).max(0.0),
            _ => 0.0,
        };
        if timestamp.is_finite() {
            self.last_timestamp = Some(timestamp);
        }
        self.elapsed += delta;

        self.controls.update(delta.min(MAX_CAMERA_DELTA));

        self.rotation.apply(self.stars.positions_mut(), self.elapsed);

        let eye = self.controls.eye();
        let frustum = self.controls.frustum(&self.viewport);
        let draw_calls = self
            .optimizer
            .render(eye, &frustum, &self.stars, &mut self.backend);
        let visible_stars = draw_calls.iter().map(|c| c.instance_count).sum();

        self.backend.present();

        let fps = self.stats.record(delta);
        let mut quality_change = None;
        if let Some(fps) = fps {
            quality_change = self.quality.evaluate(fps, self.config.star_count);
            if let Some(change) = quality_change {
                self.apply_quality(fps, change);
            }
        }

        // A cancelled loop stays Running with nothing scheduled until disposed
        let rescheduled = if self.cancel.is_cancelled() {
            false
        } else {
            self.pending = Some(self.scheduler.request_frame());
            true
        };

        Ok(FrameReport {
            frame,
            elapsed: self.elapsed,
            delta,
            draw_calls,
            visible_stars,
            fps,
            quality_change,
            rescheduled,
        })
    }

    fn apply_quality(&mut self, fps: f32, change: QualityChange) {
        match change.direction {
            QualityDirection::Downgrade => warn!(
                "Quality down at {:.1} fps: pixel ratio {:.2}, stars x{:.2}",
                fps, change.pixel_ratio, change.star_fraction
            ),
            QualityDirection::Upgrade => info!(
                "Quality up at {:.1} fps: pixel ratio {:.2}, stars x{:.2}",
                fps, change.pixel_ratio, change.star_fraction
            ),
        }
        if change.regenerate {
            self.regenerate();
        }
    }

    /// Replace the configuration and regenerate every star
    pub fn set_config(&mut self, config: GalaxyConfig) -> Result<(), OrchestratorError> {
        if self.state == LoopState::Disposed {
            return Err(OrchestratorError::Disposed);
        }
        self.config = config;
        self.regenerate();
        Ok(())
    }

    fn regenerate(&mut self) {
        let mut effective = self.config.sanitized();
        effective.star_count = self.quality.effective_star_count(effective.star_count);

        let mut rng = galaxy_rng(&effective);
        self.stars = generate_galaxy(&effective, &mut rng);
        self.rotation =
            RotationState::from_positions(self.stars.positions(), effective.rotation_speed);
        self.effective = effective;
        self.elapsed = 0.0;
        self.generation += 1;

        info!(
            "Galaxy generated: {} stars, {} arms, radius {:.0}",
            self.stars.len(),
            self.effective.arm_count,
            self.effective.galaxy_radius
        );
    }

    /// Stop the loop and release every batch. Returns the number of batches
    /// released; a second call releases nothing.
    pub fn dispose(&mut self) -> usize {
        if self.state == LoopState::Disposed {
            return 0;
        }
        self.cancel.cancel();
        if let Some(frame) = self.pending.take() {
            self.scheduler.cancel_frame(frame);
        }
        let released = self.optimizer.release_all(&mut self.backend);
        self.stars = StarSet::new();
        self.rotation = RotationState::default();

        info!(
            "Galaxy loop: {} -> Disposed ({} batches released)",
            self.state.name(),
            released
        );
        self.state = LoopState::Disposed;
        released
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &GalaxyConfig {
        &self.config
    }

    pub fn effective_config(&self) -> &GalaxyConfig {
        &self.effective
    }

    pub fn stars(&self) -> &StarSet {
        &self.stars
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Clone of the loop's cancellation token
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn pending_frame(&self) -> Option<FrameId> {
        self.pending
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn quality(&self) -> &AdaptiveQuality {
        &self.quality
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}
