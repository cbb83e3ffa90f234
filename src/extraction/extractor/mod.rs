pub mod generic;
pub mod linkedin;
pub mod route;

pub use route::{ExtractionRequest, Route};
