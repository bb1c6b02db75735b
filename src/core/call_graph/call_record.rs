use serde::{Deserialize, Serialize};

/// Module name used when a unit declares no module or cannot be read
pub const UNKNOWN_MODULE: &str = "UnknownModule";

/// One discovered invocation edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallRecord {
    /// Module the call is made from
    pub caller: String,
    /// Module being called
    pub callee: String,
    /// Function invoked on the callee
    pub function: String,
}

impl CallRecord {
    pub fn new(caller: impl Into<String>, callee: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
            callee: callee.into(),
            function: function.into(),
        }
    }
}

/// Entry module plus every call record in discovery order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub entry_module: String,
    pub calls: Vec<CallRecord>,
}

impl ExtractionResult {
    pub fn new(entry_module: impl Into<String>, calls: Vec<CallRecord>) -> Self {
        Self {
            entry_module: entry_module.into(),
            calls,
        }
    }

    /// Result for a unit that could not be read
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_MODULE, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
