#[macro_use] extern crate maplit;

pub mod engine;
pub mod level;
pub mod platform;

pub use engine::{Engine, EngineConfig, EngineError};
