//! Article reading core: content resolution and rendering, reading progress,
//! interaction state and engagement telemetry for a news article view.

pub mod api;
pub mod config;
pub mod content;
pub mod db;
pub mod interaction;
pub mod model;
pub mod page;
pub mod reading;
pub mod session;
pub mod store;
pub mod telemetry;
