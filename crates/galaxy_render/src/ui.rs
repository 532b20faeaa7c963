use bevy::prelude::*;
use galaxy_core::{ColorParseError, GalaxyConfig, QualityTier, Rgb};
use galaxy_sim::AdaptiveQuality;
use galaxy_sim::pipeline::{GalaxyRuntime, LastFrame};

use super::stars::StarBatches;

const MIN_ARMS: u32 = 1;
const MAX_ARMS: u32 = 8;
const STAR_COUNT_STEP: u32 = 5_000;
const MIN_STARS: u32 = 1_000;
const MAX_STARS: u32 = 100_000;
const BRIGHTNESS_STEP: f32 = 0.1;

/// Mid-region palettes cycled with P
const PALETTES: [(&str, &[&str]); 4] = [
    ("Main sequence", &["#9cb0ff", "#cad7ff", "#fff4ea", "#ffd2a1", "#ffcc6f"]),
    ("Starburst", &["#7fa8ff", "#a0c4ff", "#d6e4ff", "#ffffff"]),
    ("Ember", &["#ffb56b", "#ff9a5c", "#ff7b54", "#e8604c"]),
    ("Nebula", &["#c3a6ff", "#9f86ff", "#ff9ee5", "#86e3ff"]),
];

/// Marker for the HUD text
#[derive(Component)]
pub struct HudText;

/// HUD frame counter for throttling
#[derive(Resource, Default)]
pub struct HudThrottle {
    pub frame: u32,
}

/// Index into the palette cycle
#[derive(Resource, Default)]
pub struct PaletteCycle {
    pub index: usize,
}

impl PaletteCycle {
    fn advance(&mut self) -> (&'static str, &'static [&'static str]) {
        self.index = (self.index + 1) % PALETTES.len();
        PALETTES[self.index]
    }
}

fn parse_palette(hexes: &[&str]) -> Result<Vec<Rgb>, ColorParseError> {
    hexes.iter().map(|hex| Rgb::from_hex(hex)).collect()
}

/// Spawn the HUD overlay
pub fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Text::new("Galaxy"),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgba(0.75, 0.85, 1.0, 0.9)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        HudText,
    ));
}

/// Format large numbers in human-readable form
fn fmt_count(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1e3)
    } else {
        format!("{}", n)
    }
}

/// Update HUD text every 10th frame
pub fn update_hud(
    runtime: Res<GalaxyRuntime>,
    last: Res<LastFrame>,
    batches: Res<StarBatches>,
    mut throttle: ResMut<HudThrottle>,
    mut query: Query<&mut Text, With<HudText>>,
) {
    throttle.frame = throttle.frame.wrapping_add(1);
    if throttle.frame % 10 != 0 {
        return;
    }
    let Ok(mut text) = query.get_single_mut() else {
        return;
    };

    let orchestrator = &runtime.orchestrator;
    let config = orchestrator.config();
    let quality = orchestrator.quality();
    let (visible, draws) = last
        .0
        .as_ref()
        .map(|r| (r.visible_stars, r.draw_calls.len()))
        .unwrap_or((0, 0));
    let fps = orchestrator
        .stats()
        .fps()
        .map(|f| format!("{:.0}", f))
        .unwrap_or_else(|| "--".to_string());

    **text = format!(
        "GALAXY | {} tier\n\
         FPS: {} | Pixel ratio: {:.2} | Stars x{:.2}\n\
         Stars: {} | Visible: {} | Draws: {} | Sprites: {} | Upload: {:.1} KB\n\
         Arms: {} | Radius: {:.0} | Brightness: {:.1}\n\
         \n\
         [LMB+Mouse] Orbit  [Scroll] Zoom\n\
         [Up/Down] Arms  [Left/Right] Stars  [B/V] Brightness\n\
         [R] Regenerate  [P] Palette  [1-4] Quality",
        runtime.tier.name(),
        fps,
        quality.pixel_ratio(),
        quality.star_fraction(),
        fmt_count(orchestrator.stars().len()),
        fmt_count(visible),
        draws,
        fmt_count(batches.sprite_count()),
        batches.upload_bytes() as f64 / 1024.0,
        config.arm_count,
        config.galaxy_radius,
        config.brightness,
    );
}

/// Keyboard edits to the configuration; every edit regenerates the galaxy
pub fn galaxy_controls_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut palettes: ResMut<PaletteCycle>,
    mut runtime: ResMut<GalaxyRuntime>,
) {
    let mut config = runtime.orchestrator.config().clone();
    let mut tier = None;

    if keyboard.just_pressed(KeyCode::ArrowUp) {
        config.arm_count = (config.arm_count + 1).min(MAX_ARMS);
    }
    if keyboard.just_pressed(KeyCode::ArrowDown) {
        config.arm_count = config.arm_count.saturating_sub(1).max(MIN_ARMS);
    }
    if keyboard.just_pressed(KeyCode::ArrowRight) {
        config.star_count = (config.star_count + STAR_COUNT_STEP).min(MAX_STARS);
    }
    if keyboard.just_pressed(KeyCode::ArrowLeft) {
        config.star_count = config.star_count.saturating_sub(STAR_COUNT_STEP).max(MIN_STARS);
    }
    if keyboard.just_pressed(KeyCode::KeyB) {
        config.brightness += BRIGHTNESS_STEP;
    }
    if keyboard.just_pressed(KeyCode::KeyV) {
        config.brightness = (config.brightness - BRIGHTNESS_STEP).max(0.0);
    }
    if keyboard.just_pressed(KeyCode::KeyP) {
        let (name, hexes) = palettes.advance();
        match parse_palette(hexes) {
            Ok(colors) => {
                info!("Palette: {}", name);
                config.star_colors = colors;
            }
            Err(e) => warn!("Palette {} rejected: {}", name, e),
        }
    }
    for (key, preset) in [
        (KeyCode::Digit1, QualityTier::Low),
        (KeyCode::Digit2, QualityTier::Medium),
        (KeyCode::Digit3, QualityTier::High),
        (KeyCode::Digit4, QualityTier::Ultra),
    ] {
        if keyboard.just_pressed(key) {
            preset.apply(&mut config);
            tier = Some(preset);
        }
    }

    let reseed = keyboard.just_pressed(KeyCode::KeyR);
    if reseed {
        config.seed = config.seed.map(|s| s.wrapping_add(1));
    }

    if let Some(tier) = tier {
        switch_tier(&mut runtime, tier);
    }
    if !reseed && config == *runtime.orchestrator.config() {
        return;
    }
    apply_config(&mut runtime, config);
}

/// A new tier restarts adaptive quality from that tier's pixel ratio
fn switch_tier(runtime: &mut GalaxyRuntime, tier: QualityTier) {
    runtime.tier = tier;
    if let Err(e) = runtime
        .orchestrator
        .set_quality(AdaptiveQuality::for_tier(tier))
    {
        warn!("Quality reset rejected: {}", e);
    }
}

fn apply_config(runtime: &mut GalaxyRuntime, config: GalaxyConfig) {
    match runtime.orchestrator.set_config(config) {
        Ok(()) => info!(
            "Regenerated: {} arms, {} stars",
            runtime.orchestrator.config().arm_count,
            runtime.orchestrator.stars().len()
        ),
        Err(e) => warn!("Config rejected: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls_app(tier: QualityTier) -> App {
        let config = GalaxyConfig {
            star_count: 2_000,
            seed: Some(5),
            ..GalaxyConfig::for_tier(tier)
        };
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<PaletteCycle>()
            .insert_resource(GalaxyRuntime::new(config, tier))
            .add_systems(Update, galaxy_controls_system);
        app
    }

    fn press(app: &mut App, key: KeyCode) {
        let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keys.release_all();
        keys.clear();
        keys.press(key);
        app.update();
    }

    #[test]
    fn test_palettes_parse() {
        for (name, hexes) in PALETTES {
            let colors = parse_palette(hexes).unwrap_or_else(|e| panic!("{}: {}", name, e));
            assert_eq!(colors.len(), hexes.len());
        }
        assert!(parse_palette(&["#ffffff", "#12"]).is_err());
    }

    #[test]
    fn test_tier_key_resets_quality() {
        let mut app = controls_app(QualityTier::High);
        press(&mut app, KeyCode::Digit1);

        let runtime = app.world().resource::<GalaxyRuntime>();
        assert_eq!(runtime.tier, QualityTier::Low);
        assert_eq!(
            runtime.orchestrator.quality().pixel_ratio(),
            QualityTier::Low.pixel_ratio()
        );
        assert_eq!(runtime.orchestrator.config().star_count, 5_000);
    }

    #[test]
    fn test_palette_key_regenerates() {
        let mut app = controls_app(QualityTier::Medium);
        let generation = app.world().resource::<GalaxyRuntime>().orchestrator.generation();
        press(&mut app, KeyCode::KeyP);

        let runtime = app.world().resource::<GalaxyRuntime>();
        let expected = parse_palette(PALETTES[1].1).unwrap();
        assert_eq!(runtime.orchestrator.config().star_colors, expected);
        assert_eq!(runtime.orchestrator.generation(), generation + 1);
        assert_eq!(app.world().resource::<PaletteCycle>().index, 1);
    }

    #[test]
    fn test_fmt_count() {
        assert_eq!(fmt_count(999), "999");
        assert_eq!(fmt_count(15_000), "15.0K");
        assert_eq!(fmt_count(2_500_000), "2.5M");
    }
}
