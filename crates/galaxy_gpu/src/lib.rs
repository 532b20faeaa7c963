pub mod batches;
pub mod frustum;
pub mod lod;

pub use batches::{
    Batch, BatchAllocation, BatchBackend, BatchCache, BatchChanges, BatchId, DeferredBackend,
    DrawCall, RenderOptimizer,
};
pub use frustum::{Frustum, Unbounded, ViewVolume};
pub use lod::{GeometryDetail, LodBuckets, LodClassifier, LodEntry, LodLevel, LodThresholds};
