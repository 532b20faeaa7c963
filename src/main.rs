use bevy::prelude::*;
use galaxy_core::{GalaxyConfig, QualityTier};
use galaxy_render::plugin::GalaxyRenderPlugin;
use galaxy_sim::pipeline::{GalaxyRuntime, GalaxySimPlugin};

fn main() {
    let tier = QualityTier::Medium;
    let config = GalaxyConfig::for_tier(tier);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Galaxy".into(),
                resolution: (1600.0, 900.0).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.0, 0.0, 0.02)))
        .insert_resource(GalaxyRuntime::new(config, tier))
        .add_plugins(GalaxySimPlugin)
        .add_plugins(GalaxyRenderPlugin)
        .run();
}
