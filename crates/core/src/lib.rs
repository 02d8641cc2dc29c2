//! SCPI toolkit core library.
//!
//! A command-tree parser and dispatcher for SCPI-style instrument command
//! sets. Register command paths in canonical spelling
//! (`SYSTem:LED:BRIGhtness?`) with handlers, then feed raw transport bytes
//! through [`ScpiParser::process_input`] — completed lines are tokenized,
//! matched against the tree with SCPI's short/long-form rules, and
//! dispatched. Failures are classified into a bounded error queue drained
//! with [`ScpiParser::get_message`].
//!
//! All buffers are fixed-capacity and allocated at construction; the byte
//! path does not touch the heap.

#![warn(missing_docs)]

/// Bounded FIFO error queue and the error-sink seam.
pub mod errors;
/// Line collection and the input-collection timeout.
pub mod input;
/// Lexer — tokenizes one message into borrowed tokens.
pub mod lexer;
/// Fixed buffer capacities.
pub mod limits;
/// Splits a tokenized message into chained command units.
pub mod message;
/// The dispatcher orchestrating tree, handlers, buffers, and timeouts.
pub mod parser;
/// The registered command trie.
pub mod tree;

/// Diagnostic snapshot of the parser state.
pub mod dump;

// ── Convenience re-exports ──────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Dispatcher
pub use parser::{Context, Handler, ScpiParser, SubtreeScope};

// Tree
pub use tree::{CommandCode, CommandTree, RegisteredCommand};

// Tokens and units
pub use lexer::{TokKind, Token, TokenBuffer, tokenize};
pub use message::{Argument, CommandUnit};

// Errors (taxonomy re-exported from the diagnostics crate)
pub use errors::{ErrorQueue, ErrorSink};
pub use scpi_toolkit_diagnostics::{ErrorCode, ErrorReport, RegisterError, Span, explain};

// Input collection
pub use input::{LineCollector, TimeoutGuard};

// Serialization helpers
pub use dump::{DebugDump, to_pretty_json};
