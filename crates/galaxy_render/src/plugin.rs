use bevy::prelude::*;
use galaxy_sim::pipeline::GalaxyFrameSet;

use super::camera;
use super::stars;
use super::ui;

/// Main render plugin for the galaxy
pub struct GalaxyRenderPlugin;

impl Plugin for GalaxyRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ui::HudThrottle>()
            .init_resource::<ui::PaletteCycle>()
            .init_resource::<stars::StarBatches>()
            .add_systems(Startup, (camera::spawn_camera, ui::spawn_hud))
            .add_systems(
                Update,
                (
                    camera::orbit_input_system,
                    camera::track_viewport_system,
                    ui::galaxy_controls_system,
                )
                    .before(GalaxyFrameSet),
            )
            .add_systems(
                Update,
                (
                    stars::apply_batch_changes,
                    camera::sync_camera_system,
                    ui::update_hud.after(stars::apply_batch_changes),
                )
                    .after(GalaxyFrameSet),
            );
    }
}
