//! Serializable snapshot of the parser's registered tree and counters.
//!
//! Diagnostic only: the shape of this output is not part of the
//! compatibility contract.

use crate::limits;
use crate::parser::ScpiParser;
use crate::tree::RegisteredCommand;
use serde::Serialize;

/// Compile-time buffer capacities, echoed for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Capacities {
    /// Message buffer length in bytes.
    pub message: usize,
    /// Lexer token buffer length.
    pub tokens: usize,
    /// Maximum command-tree depth.
    pub depth: usize,
    /// Maximum arguments per command.
    pub params: usize,
    /// Error queue length.
    pub errors: usize,
    /// Maximum registrable command forms.
    pub commands: usize,
}

/// Snapshot produced by [`ScpiParser::debug_dump`].
#[derive(Debug, Clone, Serialize)]
pub struct DebugDump {
    /// Buffer capacities the parser was built with.
    pub capacities: Capacities,
    /// Number of registered command forms.
    pub registered_commands: usize,
    /// Errors currently waiting in the queue.
    pub pending_errors: usize,
    /// Configured input-collection timeout in milliseconds.
    pub timeout_ms: u128,
    /// Every registered command in canonical spelling, ordered by code.
    pub commands: Vec<RegisteredCommand>,
}

impl DebugDump {
    pub(crate) fn capture(parser: &ScpiParser) -> Self {
        let (tree, pending_errors, timeout) = parser.dump_parts();
        Self {
            capacities: Capacities {
                message: limits::MESSAGE_CAPACITY,
                tokens: limits::TOKEN_CAPACITY,
                depth: limits::MAX_DEPTH,
                params: limits::MAX_PARAMS,
                errors: limits::ERROR_CAPACITY,
                commands: limits::MAX_COMMANDS,
            },
            registered_commands: tree.len(),
            pending_errors,
            timeout_ms: timeout.as_millis(),
            commands: tree.dump(),
        }
    }
}

/// Serialize a dump to a pretty-printed JSON string.
pub fn to_pretty_json(dump: &DebugDump) -> String {
    serde_json::to_string_pretty(dump).expect("DebugDump serialization cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_reflects_registrations_and_errors() {
        let mut parser = ScpiParser::new();
        parser.register("*IDN?", |_| {}).unwrap();
        parser.register("SYSTem:ERRor?", |_| {}).unwrap();
        let mut out = Vec::new();
        parser.execute("BOGUS", &mut out);

        let dump = parser.debug_dump();
        assert_eq!(dump.registered_commands, 2);
        assert_eq!(dump.pending_errors, 1);
        let paths: Vec<&str> = dump.commands.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["*IDN?", "SYSTem:ERRor?"]);

        let json = to_pretty_json(&dump);
        assert!(json.contains("\"registered_commands\": 2"));
    }
}
