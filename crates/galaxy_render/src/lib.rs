pub mod camera;
pub mod plugin;
pub mod stars;
pub mod ui;
