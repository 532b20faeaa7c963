use bevy::prelude::*;
use galaxy_core::{GalaxyConfig, QualityTier};
use galaxy_gpu::DeferredBackend;

use super::frame_loop::DisplayScheduler;
use super::orchestrator::{FrameReport, GalaxyOrchestrator};
use super::quality::AdaptiveQuality;

pub type DisplayOrchestrator = GalaxyOrchestrator<DeferredBackend, DisplayScheduler>;

/// The running galaxy, tracked as a Bevy Resource
#[derive(Resource)]
pub struct GalaxyRuntime {
    pub orchestrator: DisplayOrchestrator,
    pub tier: QualityTier,
}

impl GalaxyRuntime {
    pub fn new(config: GalaxyConfig, tier: QualityTier) -> Self {
        let orchestrator =
            GalaxyOrchestrator::new(config, DeferredBackend::new(), DisplayScheduler::new())
                .with_quality(AdaptiveQuality::for_tier(tier));
        Self { orchestrator, tier }
    }
}

/// Report of the most recent frame (HUD reads it)
#[derive(Resource, Default)]
pub struct LastFrame(pub Option<FrameReport>);

/// Ordering anchor: render systems run after the galaxy frame
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GalaxyFrameSet;

/// Bevy plugin driving the orchestrator from the display refresh
pub struct GalaxySimPlugin;

impl Plugin for GalaxySimPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LastFrame>()
            .add_systems(Startup, start_galaxy)
            .add_systems(Update, drive_galaxy_frame.in_set(GalaxyFrameSet))
            .add_systems(Last, dispose_on_exit);
    }
}

fn start_galaxy(mut runtime: ResMut<GalaxyRuntime>) {
    if let Err(e) = runtime.orchestrator.start() {
        warn!("Galaxy loop failed to start: {}", e);
    }
}

/// One orchestrator frame per update, if one was requested
fn drive_galaxy_frame(
    time: Res<Time>,
    mut runtime: ResMut<GalaxyRuntime>,
    mut last: ResMut<LastFrame>,
) {
    let orchestrator = &mut runtime.orchestrator;
    let Some(frame) = orchestrator.scheduler_mut().take_pending() else {
        return;
    };
    match orchestrator.on_frame(frame, time.elapsed_secs_f64()) {
        Ok(report) => last.0 = Some(report),
        Err(e) => warn!("Galaxy frame skipped: {}", e),
    }
}

fn dispose_on_exit(mut exit: EventReader<AppExit>, mut runtime: ResMut<GalaxyRuntime>) {
    if exit.read().next().is_some() {
        runtime.orchestrator.dispose();
    }
}
