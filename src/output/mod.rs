pub mod config;
pub mod emit;
pub mod presenter;
pub mod types;

pub use presenter::Emitter;
