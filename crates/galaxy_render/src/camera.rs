use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use galaxy_sim::pipeline::GalaxyRuntime;

/// Marker for the orbit camera
#[derive(Component)]
pub struct GalaxyCamera;

/// Spawn the perspective camera where the orbit controls start
pub fn spawn_camera(mut commands: Commands, runtime: Res<GalaxyRuntime>) {
    let controls = runtime.orchestrator.controls();
    let viewport = runtime.orchestrator.viewport();
    let eye = controls.eye();

    info!("Camera spawned at ({:.0}, {:.0}, {:.0})", eye.x, eye.y, eye.z);

    commands.spawn((
        Camera3d::default(),
        Camera {
            hdr: true,
            ..default()
        },
        Projection::from(PerspectiveProjection {
            fov: viewport.fov_y,
            aspect_ratio: viewport.aspect,
            far: viewport.far,
            ..default()
        }),
        Transform::from_translation(eye).looking_at(controls.focus, Vec3::Y),
        msaa_for_pixel_ratio(runtime.orchestrator.quality().pixel_ratio()),
        GalaxyCamera,
    ));
}

/// Drag with the left button to orbit, scroll to zoom
pub fn orbit_input_system(
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mut runtime: ResMut<GalaxyRuntime>,
) {
    let drag = mouse_button.pressed(MouseButton::Left) && mouse_motion.delta != Vec2::ZERO;
    let scroll = mouse_scroll.delta.y;
    if !drag && scroll == 0.0 {
        return;
    }

    let controls = runtime.orchestrator.controls_mut();
    if drag {
        controls.rotate(mouse_motion.delta.x, mouse_motion.delta.y);
    }
    if scroll != 0.0 {
        controls.zoom(scroll);
    }
}

/// Keep the culling frustum's aspect in step with the window
pub fn track_viewport_system(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut runtime: ResMut<GalaxyRuntime>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let (width, height) = (window.width(), window.height());
    if height <= 0.0 || (runtime.orchestrator.viewport().aspect - width / height).abs() < 1e-4 {
        return;
    }
    runtime.orchestrator.viewport_mut().set_size(width, height);
}

/// Copy the damped orbit into the camera transform and apply the quality
/// controller's pixel ratio
pub fn sync_camera_system(
    runtime: Res<GalaxyRuntime>,
    mut query: Query<(&mut Transform, &mut Msaa), With<GalaxyCamera>>,
) {
    let Ok((mut transform, mut msaa)) = query.get_single_mut() else {
        return;
    };
    let controls = runtime.orchestrator.controls();
    *transform = Transform::from_translation(controls.eye()).looking_at(controls.focus, Vec3::Y);

    let wanted = msaa_for_pixel_ratio(runtime.orchestrator.quality().pixel_ratio());
    if *msaa != wanted {
        info!("MSAA -> {:?}", wanted);
        *msaa = wanted;
    }
}

/// Pixel ratio maps onto the camera's MSAA sample count
pub fn msaa_for_pixel_ratio(pixel_ratio: f32) -> Msaa {
    if pixel_ratio < 0.75 {
        Msaa::Off
    } else if pixel_ratio < 1.0 {
        Msaa::Sample2
    } else if pixel_ratio < 2.0 {
        Msaa::Sample4
    } else {
        Msaa::Sample8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msaa_follows_pixel_ratio() {
        assert_eq!(msaa_for_pixel_ratio(0.5), Msaa::Off);
        assert_eq!(msaa_for_pixel_ratio(0.75), Msaa::Sample2);
        assert_eq!(msaa_for_pixel_ratio(1.0), Msaa::Sample4);
        assert_eq!(msaa_for_pixel_ratio(2.0), Msaa::Sample8);
    }
}
