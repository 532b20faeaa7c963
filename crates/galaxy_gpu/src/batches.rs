use bevy::log::debug;
use bevy::math::Vec3;
use galaxy_core::{StarInstance, StarSet};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::frustum::ViewVolume;
use crate::lod::{GeometryDetail, LodBuckets, LodClassifier, LodLevel, LodThresholds};

/// Whatever owns the actual instanced meshes.
///
/// The optimizer decides what to draw; the backend only stores instance data
/// and issues draws. Handles are owned by the [`BatchCache`] and handed back
/// through `release`.
pub trait BatchBackend {
    type Handle;

    fn allocate(&mut self, level: LodLevel, detail: GeometryDetail, capacity: usize)
    -> Self::Handle;

    fn upload(&mut self, handle: &Self::Handle, instances: &[StarInstance]);

    /// One instanced draw of the first `instance_count` uploaded instances
    fn draw(&mut self, handle: &Self::Handle, instance_count: usize);

    /// The level had no visible stars this frame
    fn clear(&mut self, _handle: &Self::Handle) {}

    fn release(&mut self, handle: Self::Handle);

    /// End of frame
    fn present(&mut self) {}
}

/// An allocated batch and how many instances it can hold
#[derive(Debug)]
pub struct Batch<H> {
    pub handle: H,
    pub capacity: usize,
}

/// Batches keyed by LOD level
#[derive(Debug)]
pub struct BatchCache<H> {
    batches: BTreeMap<LodLevel, Batch<H>>,
}

impl<H> Default for BatchCache<H> {
    fn default() -> Self {
        Self {
            batches: BTreeMap::new(),
        }
    }
}

impl<H> BatchCache<H> {
    pub fn get(&self, level: LodLevel) -> Option<&Batch<H>> {
        self.batches.get(&level)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Batch for `level` able to hold `needed` instances. Reused while it
    /// fits, released and recreated with capacity `needed` otherwise.
    pub fn ensure<B>(&mut self, backend: &mut B, level: LodLevel, needed: usize) -> &Batch<H>
    where
        B: BatchBackend<Handle = H>,
    {
        if self.batches.get(&level).is_some_and(|b| b.capacity < needed) {
            if let Some(old) = self.batches.remove(&level) {
                debug!(
                    "LOD {} batch grows {} -> {} instances",
                    level.0, old.capacity, needed
                );
                backend.release(old.handle);
            }
        }
        self.batches.entry(level).or_insert_with(|| Batch {
            handle: backend.allocate(level, level.detail(), needed),
            capacity: needed,
        })
    }

    /// Release every batch; returns how many were released
    pub fn dispose<B>(&mut self, backend: &mut B) -> usize
    where
        B: BatchBackend<Handle = H>,
    {
        let batches = std::mem::take(&mut self.batches);
        let count = batches.len();
        for (_, batch) in batches {
            backend.release(batch.handle);
        }
        count
    }
}

/// One instanced draw issued this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub level: LodLevel,
    pub instance_count: usize,
    pub detail: GeometryDetail,
}

/// Culling, LOD bucketing and batched submission
#[derive(Debug)]
pub struct RenderOptimizer<H> {
    classifier: LodClassifier,
    cache: BatchCache<H>,
    scratch: Vec<StarInstance>,
}

impl<H> Default for RenderOptimizer<H> {
    fn default() -> Self {
        Self::new(LodThresholds::default())
    }
}

impl<H> RenderOptimizer<H> {
    pub fn new(thresholds: LodThresholds) -> Self {
        Self {
            classifier: LodClassifier::new(thresholds),
            cache: BatchCache::default(),
            scratch: Vec::new(),
        }
    }

    pub fn classify<V: ViewVolume + ?Sized>(
        &mut self,
        camera: Vec3,
        view: &V,
        positions: &[f32],
    ) -> &LodBuckets {
        self.classifier.classify(camera, view, positions)
    }

    /// Buckets from the last `classify`
    pub fn buckets(&self) -> &LodBuckets {
        self.classifier.buckets()
    }

    pub fn cache(&self) -> &BatchCache<H> {
        &self.cache
    }

    /// Draw the last classification: one draw per non-empty level, instances
    /// sorted back to front for additive blending.
    pub fn submit<B>(&mut self, stars: &StarSet, backend: &mut B) -> Vec<DrawCall>
    where
        B: BatchBackend<Handle = H>,
    {
        let mut calls = Vec::new();
        let buckets = self.classifier.buckets_mut();

        for i in 0..buckets.level_count() {
            let level = LodLevel(i as u8);
            let Some(bucket) = buckets.level_mut(level) else {
                continue;
            };

            bucket.sort_unstable_by(|a, b| b.distance.total_cmp(&a.distance));
            self.scratch.clear();
            self.scratch.extend(
                bucket
                    .iter()
                    .filter(|e| (e.index as usize) < stars.len())
                    .map(|e| stars.instance(e.index as usize)),
            );

            if self.scratch.is_empty() {
                if let Some(batch) = self.cache.get(level) {
                    backend.clear(&batch.handle);
                }
                continue;
            }

            let batch = self.cache.ensure(backend, level, self.scratch.len());
            backend.upload(&batch.handle, &self.scratch);
            backend.draw(&batch.handle, self.scratch.len());
            calls.push(DrawCall {
                level,
                instance_count: self.scratch.len(),
                detail: level.detail(),
            });
        }

        calls
    }

    /// Classify then submit
    pub fn render<B, V>(
        &mut self,
        camera: Vec3,
        view: &V,
        stars: &StarSet,
        backend: &mut B,
    ) -> Vec<DrawCall>
    where
        B: BatchBackend<Handle = H>,
        V: ViewVolume + ?Sized,
    {
        self.classifier.classify(camera, view, stars.positions());
        self.submit(stars, backend)
    }

    /// Release every cached batch
    pub fn release_all<B>(&mut self, backend: &mut B) -> usize
    where
        B: BatchBackend<Handle = H>,
    {
        self.scratch = Vec::new();
        self.cache.dispose(backend)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchAllocation {
    pub id: BatchId,
    pub level: LodLevel,
    pub detail: GeometryDetail,
    pub capacity: usize,
}

/// Everything that happened to batches since the last drain
#[derive(Debug, Default)]
pub struct BatchChanges {
    pub allocated: Vec<BatchAllocation>,
    /// Latest upload per batch
    pub uploads: HashMap<BatchId, Vec<StarInstance>>,
    pub draws: HashMap<BatchId, usize>,
    pub cleared: Vec<BatchId>,
    pub released: Vec<BatchId>,
}

impl BatchChanges {
    pub fn is_empty(&self) -> bool {
        self.allocated.is_empty()
            && self.uploads.is_empty()
            && self.draws.is_empty()
            && self.cleared.is_empty()
            && self.released.is_empty()
    }

    /// Raw bytes of a batch's upload, as written to its instance buffer
    pub fn upload_bytes(&self, id: BatchId) -> Option<&[u8]> {
        self.uploads
            .get(&id)
            .map(|instances| bytemuck::cast_slice(instances.as_slice()))
    }

    /// Instance bytes uploaded across all batches
    pub fn uploaded_bytes(&self) -> usize {
        self.uploads
            .keys()
            .filter_map(|&id| self.upload_bytes(id))
            .map(<[u8]>::len)
            .sum()
    }
}

/// Backend that records batch operations for a consumer to apply once per
/// frame (the Bevy adapter, the headless binary).
#[derive(Debug, Default)]
pub struct DeferredBackend {
    next_id: u32,
    live: BTreeSet<BatchId>,
    changes: BatchChanges,
    total_allocations: u64,
    total_releases: u64,
    frames_presented: u64,
}

impl DeferredBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending changes
    pub fn drain(&mut self) -> BatchChanges {
        std::mem::take(&mut self.changes)
    }

    pub fn pending(&self) -> &BatchChanges {
        &self.changes
    }

    pub fn live_batches(&self) -> usize {
        self.live.len()
    }

    pub fn total_allocations(&self) -> u64 {
        self.total_allocations
    }

    pub fn total_releases(&self) -> u64 {
        self.total_releases
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl BatchBackend for DeferredBackend {
    type Handle = BatchId;

    fn allocate(&mut self, level: LodLevel, detail: GeometryDetail, capacity: usize) -> BatchId {
        let id = BatchId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.live.insert(id);
        self.total_allocations += 1;
        self.changes.allocated.push(BatchAllocation {
            id,
            level,
            detail,
            capacity,
        });
        id
    }

    fn upload(&mut self, handle: &BatchId, instances: &[StarInstance]) {
        if !self.live.contains(handle) {
            return;
        }
        let buffer = self.changes.uploads.entry(*handle).or_default();
        buffer.clear();
        buffer.extend_from_slice(instances);
    }

    fn draw(&mut self, handle: &BatchId, instance_count: usize) {
        if self.live.contains(handle) {
            self.changes.draws.insert(*handle, instance_count);
        }
    }

    fn clear(&mut self, handle: &BatchId) {
        if self.live.contains(handle) {
            self.changes.uploads.remove(handle);
            self.changes.draws.remove(handle);
            self.changes.cleared.push(*handle);
        }
    }

    fn release(&mut self, handle: BatchId) {
        if !self.live.remove(&handle) {
            return;
        }
        self.total_releases += 1;
        self.changes.uploads.remove(&handle);
        self.changes.draws.remove(&handle);
        self.changes.released.push(handle);
    }

    fn present(&mut self) {
        self.frames_presented += 1;
    }
}
