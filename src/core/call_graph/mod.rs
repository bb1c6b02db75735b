// src/core/call_graph/mod.rs
//! Call-sequence extraction
//!
//! Walks an entry function's body, records every `Module.function` call in
//! discovery order and follows resolvable calls into their definitions.

mod call_record;
mod extractor;

pub use call_record::{CallRecord, ExtractionResult, UNKNOWN_MODULE};
pub use extractor::{CallGraphExtractor, ExtractionOptions};
