mod engine;
mod rescan;

pub use engine::{Engine, EngineEvent, LaunchOutcome};
