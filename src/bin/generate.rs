//! Headless galaxy sweep.
//! Generates galaxies over a range of seeds and arm counts, then drives the
//! frame loop without a window and reports culling and batching statistics.

use galaxy_core::{GalaxyConfig, StarSet};
use galaxy_gpu::DeferredBackend;
use galaxy_physics::procgen::{self, StarRegion};
use galaxy_sim::{GalaxyOrchestrator, ManualScheduler};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Frames simulated per galaxy
const FRAMES: u32 = 180;
const FRAME_DT: f64 = 1.0 / 60.0;

struct Shape {
    mean_radius: f32,
    max_radius: f32,
    region_share: [f32; 3],
    mean_intensity: f32,
}

fn shape_of(config: &GalaxyConfig, stars: &StarSet) -> Shape {
    let mut sum = 0.0f64;
    let mut max_radius = 0.0f32;
    let mut regions = [0u32; 3];

    for i in 0..stars.len() {
        let [x, _, z] = stars.position(i);
        let r = (x * x + z * z).sqrt();
        sum += r as f64;
        max_radius = max_radius.max(r);
        let ratio = if config.galaxy_radius > 0.0 {
            r / config.galaxy_radius
        } else {
            0.0
        };
        let slot = match StarRegion::from_ratio(ratio) {
            StarRegion::Core => 0,
            StarRegion::Mid => 1,
            StarRegion::Outer => 2,
        };
        regions[slot] += 1;
    }

    let n = stars.len().max(1) as f32;
    Shape {
        mean_radius: (sum / stars.len().max(1) as f64) as f32,
        max_radius,
        region_share: regions.map(|c| c as f32 / n),
        mean_intensity: stars.mean_intensity(),
    }
}

fn main() {
    let seeds: Vec<u64> = (0..4).map(|i| 1000 + i * 7919).collect();
    let arm_counts = [1u32, 2, 3, 4, 6];

    eprintln!(
        "Sweeping {} seeds x {} arm counts...",
        seeds.len(),
        arm_counts.len()
    );
    println!(
        "{:>6} {:>5} {:>7} {:>8} {:>8} {:>17} {:>6} {:>8} {:>6} {:>6} {:>9}",
        "seed",
        "arms",
        "stars",
        "mean r",
        "max r",
        "core/mid/outer",
        "glow",
        "visible",
        "draws",
        "allocs",
        "upload KB"
    );

    for &seed in &seeds {
        for &arm_count in &arm_counts {
            let config = GalaxyConfig {
                arm_count,
                seed: Some(seed),
                ..GalaxyConfig::default()
            };

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let stars = procgen::generate_galaxy(&config, &mut rng);
            let shape = shape_of(&config, &stars);

            let mut orchestrator =
                GalaxyOrchestrator::new(config, DeferredBackend::new(), ManualScheduler::new());
            if let Err(e) = orchestrator.start() {
                eprintln!("seed {} arms {}: {}", seed, arm_count, e);
                continue;
            }

            let mut visible = 0usize;
            let mut draws = 0usize;
            let mut upload_bytes = 0usize;
            for frame in 0..FRAMES {
                // Slow orbit so culling sees several angles
                orchestrator.controls_mut().rotate(4.0, 0.0);
                let Some(id) = orchestrator.scheduler_mut().next_frame() else {
                    break;
                };
                match orchestrator.on_frame(id, frame as f64 * FRAME_DT) {
                    Ok(report) => {
                        visible += report.visible_stars;
                        draws += report.draw_calls.len();
                    }
                    Err(e) => {
                        eprintln!("seed {} arms {}: {}", seed, arm_count, e);
                        break;
                    }
                }
                // Stand-in for the GPU side: consume the recorded changes
                upload_bytes += orchestrator.backend_mut().drain().uploaded_bytes();
            }
            let allocations = orchestrator.backend().total_allocations();
            orchestrator.dispose();

            println!(
                "{:>6} {:>5} {:>7} {:>8.1} {:>8.1} {:>5.2}/{:>4.2}/{:>4.2} {:>6.3} {:>8} {:>6.2} \
                 {:>6} {:>9.1}",
                seed,
                arm_count,
                stars.len(),
                shape.mean_radius,
                shape.max_radius,
                shape.region_share[0],
                shape.region_share[1],
                shape.region_share[2],
                shape.mean_intensity,
                visible / FRAMES as usize,
                draws as f32 / FRAMES as f32,
                allocations,
                upload_bytes as f64 / 1024.0 / FRAMES as f64,
            );
        }
    }
}
