pub mod controls;
pub mod frame_loop;
pub mod orchestrator;
pub mod pipeline;
pub mod quality;

pub use controls::{OrbitControls, Viewport};
pub use frame_loop::{CancelToken, DisplayScheduler, FrameId, FrameScheduler, ManualScheduler};
pub use orchestrator::{FrameReport, GalaxyOrchestrator, LoopState, OrchestratorError};
pub use quality::{AdaptiveQuality, FrameStats, QualityChange, QualityDirection};
