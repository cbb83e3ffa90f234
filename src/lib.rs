//! Best-effort plain-text extraction for web pages and job postings.
//!
//! [`extract_text`] takes any URL and always returns usable text: the page
//! content, a structured job block, or a message telling a human what to do
//! next.

pub mod compare;
pub mod describe;
pub mod extraction;
pub mod llm;
pub mod output;
pub mod parse;
pub mod telemetry;

pub use extraction::extractor::linkedin::describe_job;
pub use extraction::{Extractor, extract_text};
