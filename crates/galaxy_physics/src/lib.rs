pub mod procgen;
pub mod rotation;
