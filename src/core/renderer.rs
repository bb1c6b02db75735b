//! Mermaid sequence-diagram rendering of extracted call records.

use std::collections::HashSet;
use std::fmt;

use super::call_graph::{CallRecord, ExtractionResult};

const HEADER: [&str; 2] = ["```mermaid", "sequenceDiagram"];
const FOOTER: [&str; 2] = ["```", ""];

/// Rendered diagram as ordered text lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramDocument {
    pub lines: Vec<String>,
}

impl DiagramDocument {
    /// Participant declarations, in order
    pub fn participants(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| line.strip_prefix("participant "))
            .collect()
    }

    /// Request and response lines, in order
    pub fn messages(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(|line| line.contains("->>"))
            .collect()
    }
}

impl fmt::Display for DiagramDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Renders call records as a request/response sequence diagram
#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceDiagramRenderer;

impl SequenceDiagramRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_result(&self, result: &ExtractionResult) -> DiagramDocument {
        self.render(&result.entry_module, &result.calls)
    }

    pub fn render(&self, entry_module: &str, calls: &[CallRecord]) -> DiagramDocument {
        let mut lines: Vec<String> = HEADER.iter().map(|line| line.to_string()).collect();

        for participant in participants(entry_module, calls) {
            lines.push(format!("participant {}", participant));
        }

        for call in calls {
            lines.push(format!("{}->>{}: {}", call.caller, call.callee, call.function));
            lines.push(format!("{}-->>{}: {} response", call.callee, call.caller, call.function));
        }

        lines.extend(FOOTER.iter().map(|line| line.to_string()));
        DiagramDocument { lines }
    }
}

/// Entry module first, then callers and callees in first-seen order
fn participants<'a>(entry_module: &'a str, calls: &'a [CallRecord]) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let candidates = std::iter::once(entry_module)
        .chain(calls.iter().flat_map(|c| [c.caller.as_str(), c.callee.as_str()]));

    candidates.filter(|name| seen.insert(*name)).collect()
}
