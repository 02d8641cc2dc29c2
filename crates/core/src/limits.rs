//! Fixed capacities for every buffer the parser owns.
//!
//! All storage is sized at compile time and allocated once when the parser is
//! constructed; nothing grows on the byte-processing path. The values mirror
//! the configuration table of classic instrument firmware, scaled for a host
//! with more than 2 KiB of RAM.

/// Capacity of the message buffer collecting one input line, in bytes.
pub const MESSAGE_CAPACITY: usize = 128;

/// Maximum number of lexer tokens for one message.
pub const TOKEN_CAPACITY: usize = 48;

/// Maximum depth of the command tree (keywords per command path).
pub const MAX_DEPTH: usize = 8;

/// Maximum number of arguments after one command header.
pub const MAX_PARAMS: usize = 12;

/// Capacity of the error queue. When full, the oldest entry is evicted.
pub const ERROR_CAPACITY: usize = 8;

/// Maximum number of registrable commands (event and query forms count
/// separately).
pub const MAX_COMMANDS: usize = 256;

/// Default input-collection timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10;
