use bevy::prelude::*;
use galaxy_core::StarInstance;
use galaxy_gpu::{BatchAllocation, BatchId, GeometryDetail};
use galaxy_sim::pipeline::GalaxyRuntime;
use std::collections::{HashMap, HashSet};

/// World radius of a star of size 1
const STAR_RADIUS_SCALE: f32 = 0.2;

/// Material buckets per unit of channel intensity
const COLOR_STEPS: f32 = 8.0;

/// Channels brighter than 4.0 share the top bucket
const MAX_COLOR_STEP: f32 = 32.0;

const EMISSIVE_GAIN: f32 = 2.0;

/// One instance slot of an LOD batch
#[derive(Component)]
pub struct StarSprite {
    pub batch: BatchId,
    pub slot: usize,
}

/// Shared additive materials keyed by quantized color
#[derive(Default)]
struct MaterialCache(HashMap<[u16; 3], Handle<StandardMaterial>>);

impl MaterialCache {
    fn get(
        &mut self,
        color: [f32; 4],
        materials: &mut Assets<StandardMaterial>,
    ) -> Handle<StandardMaterial> {
        let key = color_key(color);
        self.0
            .entry(key)
            .or_insert_with(|| {
                let [r, g, b] = key.map(|k| k as f32 / COLOR_STEPS);
                materials.add(StandardMaterial {
                    base_color: Color::linear_rgb(r, g, b),
                    emissive: LinearRgba::rgb(r, g, b) * EMISSIVE_GAIN,
                    unlit: true,
                    alpha_mode: AlphaMode::Add,
                    ..default()
                })
            })
            .clone()
    }
}

/// Entity pools standing in for the instanced batches
#[derive(Resource, Default)]
pub struct StarBatches {
    pools: HashMap<BatchId, Vec<Entity>>,
    meshes: HashMap<u32, Handle<Mesh>>,
    materials: MaterialCache,
    upload_bytes: usize,
}

impl StarBatches {
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn sprite_count(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }

    /// Instance bytes uploaded by the last applied frame
    pub fn upload_bytes(&self) -> usize {
        self.upload_bytes
    }

    fn mesh(&mut self, detail: GeometryDetail, meshes: &mut Assets<Mesh>) -> Handle<Mesh> {
        self.meshes
            .entry(detail.segments)
            .or_insert_with(|| {
                meshes.add(Sphere::new(1.0).mesh().uv(detail.segments, detail.rings()))
            })
            .clone()
    }
}

pub fn color_key(color: [f32; 4]) -> [u16; 3] {
    [color[0], color[1], color[2]]
        .map(|c| (c.max(0.0) * COLOR_STEPS).round().min(MAX_COLOR_STEP) as u16)
}

fn star_transform(instance: &StarInstance) -> Transform {
    Transform::from_translation(Vec3::from_array(instance.position))
        .with_scale(Vec3::splat(instance.size * STAR_RADIUS_SCALE))
}

/// Apply the batch changes the orchestrator recorded this frame: despawn
/// released pools, spawn new ones, then move, recolor and show/hide slots.
pub fn apply_batch_changes(
    mut commands: Commands,
    mut runtime: ResMut<GalaxyRuntime>,
    batches: ResMut<StarBatches>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut sprites: Query<
        (&mut Transform, &mut Visibility, &mut MeshMaterial3d<StandardMaterial>),
        With<StarSprite>,
    >,
) {
    let changes = runtime.orchestrator.backend_mut().drain();
    if changes.is_empty() {
        return;
    }
    let batches = batches.into_inner();
    batches.upload_bytes = changes.uploaded_bytes();

    for id in &changes.released {
        if let Some(entities) = batches.pools.remove(id) {
            for entity in entities {
                commands.entity(entity).despawn();
            }
        }
    }

    // Freshly spawned sprites are not queryable until commands apply, so
    // they start out with this frame's data
    let mut fresh = HashSet::new();
    for allocation in &changes.allocated {
        if changes.released.contains(&allocation.id) {
            continue;
        }
        let upload = changes
            .uploads
            .get(&allocation.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let count = changes.draws.get(&allocation.id).copied().unwrap_or(0);
        let entities = spawn_pool(
            &mut commands,
            batches,
            allocation,
            &upload[..count.min(upload.len())],
            &mut meshes,
            &mut materials,
        );
        batches.pools.insert(allocation.id, entities);
        fresh.insert(allocation.id);
    }

    for id in &changes.cleared {
        let Some(entities) = batches.pools.get(id) else {
            continue;
        };
        for &entity in entities {
            if let Ok((_, mut visibility, _)) = sprites.get_mut(entity) {
                *visibility = Visibility::Hidden;
            }
        }
    }

    for (id, upload) in &changes.uploads {
        if fresh.contains(id) {
            continue;
        }
        let Some(entities) = batches.pools.get(id) else {
            continue;
        };
        let count = changes.draws.get(id).copied().unwrap_or(0).min(upload.len());

        for (slot, &entity) in entities.iter().enumerate() {
            let Ok((mut transform, mut visibility, mut material)) = sprites.get_mut(entity)
            else {
                continue;
            };
            if slot < count {
                let instance = &upload[slot];
                *transform = star_transform(instance);
                if *visibility != Visibility::Inherited {
                    *visibility = Visibility::Inherited;
                }
                let handle = batches.materials.get(instance.color, &mut materials);
                if material.0 != handle {
                    material.0 = handle;
                }
            } else if *visibility != Visibility::Hidden {
                *visibility = Visibility::Hidden;
            }
        }
    }
}

fn spawn_pool(
    commands: &mut Commands,
    batches: &mut StarBatches,
    allocation: &BatchAllocation,
    visible: &[StarInstance],
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) -> Vec<Entity> {
    let mesh = batches.mesh(allocation.detail, meshes);
    let entities: Vec<Entity> = (0..allocation.capacity)
        .map(|slot| {
            let (transform, visibility, color) = match visible.get(slot) {
                Some(instance) => (star_transform(instance), Visibility::Inherited, instance.color),
                None => (Transform::default(), Visibility::Hidden, [0.0; 4]),
            };
            commands
                .spawn((
                    Mesh3d(mesh.clone()),
                    MeshMaterial3d(batches.materials.get(color, materials)),
                    transform,
                    visibility,
                    StarSprite {
                        batch: allocation.id,
                        slot,
                    },
                ))
                .id()
        })
        .collect();

    debug!(
        "LOD {} pool spawned: {} sprites, {} segments",
        allocation.level.0,
        entities.len(),
        allocation.detail.segments
    );
    entities
}
