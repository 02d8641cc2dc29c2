//! The dispatcher: owns the command tree, the handler table, the error
//! queue, and the input-collection state, and wires them together.

use crate::errors::ErrorQueue;
use crate::input::{Feed, LineCollector, TimeoutGuard};
use crate::lexer::{Token, tokenize};
use crate::message::{Argument, units};
use crate::tree::{CommandCode, CommandTree, NodePath};
use scpi_toolkit_diagnostics::{ErrorCode, ErrorReport, RegisterError};
use std::io;
use std::time::{Duration, Instant};

/// User-installed callback invoked whenever an error is raised, in addition
/// to the queryable queue.
pub type ErrorCallback = Box<dyn FnMut(ErrorCode)>;

/// A registered command handler.
///
/// Handlers return nothing; they signal failure only by raising into the
/// error channel of their [`Context`]. They run synchronously on the
/// caller's thread and must return before the next input byte is processed.
pub type Handler = Box<dyn FnMut(Context<'_, '_>)>;

// ── Context ─────────────────────────────────────────────────────────────

/// Everything a handler may touch: the matched command, its arguments, the
/// response writer, and the error channel.
pub struct Context<'a, 'w> {
    /// The matched header tokens, spelled as received (`meas`, `VOLT3?`).
    pub header: &'a [Token<'a>],
    /// Arguments following the command header.
    pub args: &'a [Argument<'a>],
    /// Whether the query form was invoked.
    pub query: bool,
    /// Response sink supplied by the caller of `execute`/`process_input`.
    pub out: &'w mut dyn io::Write,
    errors: ErrorChannel<'a>,
}

impl Context<'_, '_> {
    /// Raise an error: queued, and forwarded to the error callback if one
    /// is installed.
    pub fn raise(&mut self, code: ErrorCode) {
        self.errors.raise(code);
    }

    /// Write one response line.
    pub fn reply(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(b"\n")
    }

    /// Numeric suffix of header keyword `index`, when the input carried one
    /// (`OUTP2` → `Some(2)` for a keyword registered as `OUTPut#`).
    pub fn numeric_suffix(&self, index: usize) -> Option<u32> {
        let text = self.header.get(index)?.text;
        let text = text.strip_suffix('?').unwrap_or(text);
        let digits = text.bytes().rev().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            return None;
        }
        text[text.len() - digits..].parse().ok()
    }
}

/// Fans raised errors into the queue and the optional callback.
struct ErrorChannel<'a> {
    queue: &'a mut ErrorQueue,
    callback: Option<&'a mut ErrorCallback>,
}

impl ErrorChannel<'_> {
    fn raise(&mut self, code: ErrorCode) {
        self.queue.push(code);
        if let Some(cb) = self.callback.as_mut() {
            cb(code);
        }
    }
}

// ── ScpiParser ──────────────────────────────────────────────────────────

/// SCPI command parser and dispatcher.
///
/// Single-threaded and cooperative: feed bytes with
/// [`process_input`](Self::process_input) from one poll loop or receive
/// interrupt; completed lines are tokenized, resolved against the command
/// tree, and dispatched to their handlers synchronously. All buffers are
/// fixed-capacity and allocated once; the byte path performs no heap
/// allocation.
#[derive(Default)]
pub struct ScpiParser {
    tree: CommandTree,
    handlers: Vec<Handler>,
    errors: ErrorQueue,
    on_error: Option<ErrorCallback>,
    collector: LineCollector,
    guard: TimeoutGuard,
}

impl ScpiParser {
    /// Parser with the default input timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser with a specific input-collection timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let mut parser = Self::new();
        parser.guard.set_timeout(timeout);
        parser
    }

    /// Change the input-collection timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.guard.set_timeout(timeout);
    }

    // ── Registration ────────────────────────────────────────────────

    /// Register a command path and its handler; returns the assigned code.
    ///
    /// The path uses canonical SCPI spelling: upper-case short form plus
    /// lower-case long-form tail per keyword (`SYSTem:LED:BRIGhtness`),
    /// `?` for the query form, trailing `#` for a numeric-suffix keyword.
    pub fn register(
        &mut self,
        path: &str,
        handler: impl FnMut(Context<'_, '_>) + 'static,
    ) -> Result<CommandCode, RegisterError> {
        self.register_under(&[], path, Box::new(handler))
    }

    /// Open a registration scope under `path`, creating the nodes if needed.
    ///
    /// Registrations through the scope share the base prefix; dropping the
    /// scope restores registration to the root. Scopes nest.
    pub fn subtree(&mut self, path: &str) -> Result<SubtreeScope<'_>, RegisterError> {
        let base = self.tree.ensure_path(&[], path)?;
        Ok(SubtreeScope { parser: self, base })
    }

    fn register_under(
        &mut self,
        base: &[usize],
        path: &str,
        handler: Handler,
    ) -> Result<CommandCode, RegisterError> {
        let code = self.tree.register(base, path)?;
        debug_assert_eq!(code.index(), self.handlers.len());
        self.handlers.push(handler);
        Ok(code)
    }

    /// Install a callback invoked for every raised error, in addition to
    /// the queue.
    pub fn set_error_handler(&mut self, callback: impl FnMut(ErrorCode) + 'static) {
        self.on_error = Some(Box::new(callback));
    }

    // ── Error queue access ──────────────────────────────────────────

    /// Pop the oldest queued error with its text, or the `NoError`
    /// sentinel when the queue is empty.
    pub fn get_message(&mut self) -> ErrorReport {
        self.errors.get_message()
    }

    /// Number of errors waiting in the queue.
    pub fn pending_errors(&self) -> usize {
        self.errors.len()
    }

    /// The registered command tree (read-only).
    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    // ── Input processing ────────────────────────────────────────────

    /// Feed a chunk of raw bytes, dispatching every completed line.
    ///
    /// The timeout is checked on every invocation, so calling this with an
    /// empty chunk from a poll loop is the way to let a stalled line time
    /// out.
    pub fn process_input(&mut self, bytes: &[u8], out: &mut dyn io::Write) {
        self.process_input_at(bytes, Instant::now(), out);
    }

    /// [`process_input`](Self::process_input) with an explicit clock, for
    /// hosts that own their time source and for deterministic tests.
    pub fn process_input_at(&mut self, bytes: &[u8], now: Instant, out: &mut dyn io::Write) {
        if self.guard.expired(now) {
            self.guard.disarm();
            self.collector.reset();
            self.raise(ErrorCode::Timeout);
        }
        for &byte in bytes {
            match self.collector.push(byte) {
                Feed::Pending => {}
                Feed::Overflow => self.raise(ErrorCode::BufferOverflow),
                Feed::Line => {
                    let line = self.collector.take_line();
                    let text = String::from_utf8_lossy(&line);
                    self.execute(&text, out);
                }
            }
            if self.collector.is_idle() {
                self.guard.disarm();
            } else {
                self.guard.arm(now);
            }
        }
    }

    /// Execute one complete message (terminator already removed).
    ///
    /// Commands chained with `;` are dispatched in order. The first unit
    /// resolves from the root; later units resolve relative to the previous
    /// successful unit's parent path unless they carry a leading `:` or a
    /// `*` common-command header, which anchor back to the root.
    pub fn execute(&mut self, message: &str, out: &mut dyn io::Write) {
        let toks = match tokenize(message) {
            Ok(toks) => toks,
            Err(_) => {
                self.raise(ErrorCode::BufferOverflow);
                return;
            }
        };

        let mut anchor: Option<NodePath> = None;
        let Self {
            tree,
            handlers,
            errors,
            on_error,
            ..
        } = self;

        for unit in units(message, &toks) {
            let unit = match unit {
                Ok(unit) => unit,
                Err(_) => {
                    raise_into(errors, on_error, ErrorCode::BufferOverflow);
                    continue;
                }
            };
            let keywords = unit.keywords();
            if keywords.is_empty() {
                raise_into(errors, on_error, ErrorCode::UnknownCommand);
                continue;
            }

            let common = keywords[0].starts_with('*');
            let base: &[usize] = match (&anchor, unit.absolute || common) {
                (Some(path), false) => path,
                _ => &[],
            };

            match tree.resolve_from(base, &keywords, unit.is_query()) {
                Some(resolved) => {
                    // The next relative unit anchors at this command's
                    // parent. Common commands leave the anchor untouched.
                    if !common {
                        let mut parent = resolved.path;
                        parent.pop();
                        anchor = Some(parent);
                    }

                    let ctx = Context {
                        header: &unit.header,
                        args: &unit.args,
                        query: unit.is_query(),
                        out: &mut *out,
                        errors: ErrorChannel {
                            queue: errors,
                            callback: on_error.as_mut(),
                        },
                    };
                    (handlers[resolved.code.index()])(ctx);
                }
                None => raise_into(errors, on_error, ErrorCode::UnknownCommand),
            }
        }
    }

    /// Snapshot of the registered tree and internal counters.
    pub fn debug_dump(&self) -> crate::dump::DebugDump {
        crate::dump::DebugDump::capture(self)
    }

    pub(crate) fn dump_parts(&self) -> (&CommandTree, usize, Duration) {
        (&self.tree, self.errors.len(), self.guard.timeout())
    }

    fn raise(&mut self, code: ErrorCode) {
        raise_into(&mut self.errors, &mut self.on_error, code);
    }
}

/// Shared raise path usable while `self` is split-borrowed in `execute`.
fn raise_into(queue: &mut ErrorQueue, callback: &mut Option<ErrorCallback>, code: ErrorCode) {
    queue.push(code);
    if let Some(cb) = callback.as_mut() {
        cb(code);
    }
}

// ── SubtreeScope ────────────────────────────────────────────────────────

/// Scoped registration cursor positioned on an interior tree node.
///
/// Replaces a mutable "tree base" setting: the scope borrows the parser
/// mutably, so the repositioning cannot leak past the scope's lifetime, and
/// dropping it restores root-relative registration.
pub struct SubtreeScope<'p> {
    parser: &'p mut ScpiParser,
    base: NodePath,
}

impl core::fmt::Debug for SubtreeScope<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubtreeScope")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl SubtreeScope<'_> {
    /// Register `path` relative to this scope's base.
    pub fn register(
        &mut self,
        path: &str,
        handler: impl FnMut(Context<'_, '_>) + 'static,
    ) -> Result<CommandCode, RegisterError> {
        self.parser
            .register_under(&self.base, path, Box::new(handler))
    }

    /// Open a nested scope relative to this one.
    pub fn subtree(&mut self, path: &str) -> Result<SubtreeScope<'_>, RegisterError> {
        let base = self.parser.tree.ensure_path(&self.base, path)?;
        Ok(SubtreeScope {
            parser: self.parser,
            base,
        })
    }
}
