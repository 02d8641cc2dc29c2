//! The registered command vocabulary: a bounded, arena-backed trie.
//!
//! Each node stores one keyword in its canonical `MEASure` spelling: the
//! leading upper-case run is the short form, the whole word the long form.
//! Input matches a node when it equals either form case-insensitively —
//! no other abbreviation is accepted. A node may carry terminal codes for
//! its event form, its query form, or both, and may still have children
//! (`MEAS` and `MEAS:VOLT` can both be commands).
//!
//! The tree is built by registration calls before execution starts and is
//! read-only afterwards.

use crate::limits::{MAX_COMMANDS, MAX_DEPTH};
use arrayvec::ArrayVec;
use scpi_toolkit_diagnostics::RegisterError;
use serde::Serialize;

/// Integer identifier of one registered command form.
///
/// Codes are assigned sequentially at registration time and index the
/// dispatcher's handler table directly, so dispatch after resolution is a
/// single array access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CommandCode(u16);

impl CommandCode {
    /// Handler-table index for this code.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl std::fmt::Display for CommandCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index path from the root to a node; the anchor for relative resolution.
pub(crate) type NodePath = ArrayVec<usize, MAX_DEPTH>;

// ── Keyword ─────────────────────────────────────────────────────────────

/// Canonical spelling of one tree level, split into short and long forms.
#[derive(Debug, Clone)]
struct Keyword {
    /// Canonical text as registered, without `?` or `#` markers.
    text: Box<str>,
    /// Byte length of the short form (the leading upper-case run).
    short_len: usize,
    /// Whether input may carry a trailing numeric suffix (`OUTPut#`).
    numeric_suffix: bool,
}

impl Keyword {
    fn parse(spec: &str) -> Result<Self, RegisterError> {
        let invalid = || RegisterError::InvalidKeyword {
            keyword: spec.to_string(),
        };
        let (body, numeric_suffix) = match spec.strip_suffix('#') {
            Some(rest) => (rest, true),
            None => (spec, false),
        };
        if body.is_empty() {
            return Err(invalid());
        }
        for (i, c) in body.chars().enumerate() {
            let star_ok = c == '*' && i == 0;
            if !(c.is_ascii_alphanumeric() || c == '_' || star_ok) {
                return Err(invalid());
            }
        }
        // Digits and '*' belong to the short form; the first lower-case
        // character starts the long-form tail. A keyword with no upper-case
        // head has no abbreviation at all.
        let short_len = match body.bytes().position(|b| b.is_ascii_lowercase()) {
            Some(0) | None => body.len(),
            Some(n) => n,
        };
        Ok(Self {
            text: body.into(),
            short_len,
            numeric_suffix,
        })
    }

    /// Case-insensitive match against the short or long form, exactly.
    fn matches(&self, input: &str) -> bool {
        let mut input = input;
        if self.numeric_suffix {
            let trimmed = input.trim_end_matches(|c: char| c.is_ascii_digit());
            // `OUTP2` and plain `OUTP` both match `OUTPut#`.
            input = trimmed;
        }
        input.eq_ignore_ascii_case(&self.text)
            || input.eq_ignore_ascii_case(&self.text[..self.short_len])
    }

    /// Canonical display spelling (`MEASure`, `OUTPut#`).
    fn display(&self) -> String {
        if self.numeric_suffix {
            format!("{}#", self.text)
        } else {
            self.text.to_string()
        }
    }
}

// ── CommandNode / CommandTree ───────────────────────────────────────────

/// One segment of a registered command path.
#[derive(Debug)]
struct CommandNode {
    keyword: Keyword,
    children: Vec<usize>,
    /// Terminal code for the event (non-query) form.
    event: Option<CommandCode>,
    /// Terminal code for the query (`?`) form.
    query: Option<CommandCode>,
}

/// The command registry: maps header keyword sequences to [`CommandCode`]s.
#[derive(Debug, Default)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    roots: Vec<usize>,
    registered: usize,
}

/// Outcome of resolving one header against the tree.
pub(crate) struct Resolved {
    /// Code of the matched terminal form.
    pub(crate) code: CommandCode,
    /// Node index path of the matched command, root first.
    pub(crate) path: NodePath,
}

impl CommandTree {
    /// Number of registered command forms.
    pub fn len(&self) -> usize {
        self.registered
    }

    /// Whether no command has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }

    /// Split a `:`-separated path spec, validating depth against `base`.
    fn split_path<'s>(
        &self,
        base: &[usize],
        path: &'s str,
    ) -> Result<(ArrayVec<&'s str, MAX_DEPTH>, bool), RegisterError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(RegisterError::EmptyPath);
        }
        let (body, is_query) = match trimmed.strip_suffix('?') {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };
        let mut segments = ArrayVec::new();
        for segment in body.split(':') {
            if segment.is_empty() {
                return Err(RegisterError::EmptyKeyword {
                    path: path.to_string(),
                });
            }
            segments.try_push(segment).map_err(|_| {
                RegisterError::DepthExceeded {
                    depth: base.len() + body.split(':').count(),
                    max: MAX_DEPTH,
                }
            })?;
        }
        if base.len() + segments.len() > MAX_DEPTH {
            return Err(RegisterError::DepthExceeded {
                depth: base.len() + segments.len(),
                max: MAX_DEPTH,
            });
        }
        Ok((segments, is_query))
    }

    /// Find or create the child of `parent` (or a root) spelled `spec`.
    fn child_for(&mut self, parent: Option<usize>, spec: &str) -> Result<usize, RegisterError> {
        let keyword = Keyword::parse(spec)?;
        let siblings = match parent {
            Some(p) => &self.nodes[p].children,
            None => &self.roots,
        };
        if let Some(&idx) = siblings
            .iter()
            .find(|&&i| self.nodes[i].keyword.text.eq_ignore_ascii_case(&keyword.text))
        {
            return Ok(idx);
        }
        let idx = self.nodes.len();
        self.nodes.push(CommandNode {
            keyword,
            children: Vec::new(),
            event: None,
            query: None,
        });
        match parent {
            Some(p) => self.nodes[p].children.push(idx),
            None => self.roots.push(idx),
        }
        Ok(idx)
    }

    /// Descend/create nodes for `path` under `base`, without registering a
    /// terminal. Used for subtree scopes.
    pub(crate) fn ensure_path(
        &mut self,
        base: &[usize],
        path: &str,
    ) -> Result<NodePath, RegisterError> {
        let (segments, is_query) = self.split_path(base, path)?;
        if is_query {
            return Err(RegisterError::InvalidKeyword {
                keyword: path.to_string(),
            });
        }
        let mut node_path: NodePath = base.iter().copied().collect();
        let mut parent = base.last().copied();
        for spec in &segments {
            let idx = self.child_for(parent, spec)?;
            node_path.push(idx);
            parent = Some(idx);
        }
        Ok(node_path)
    }

    /// Register `path` under `base` and return the new code.
    pub(crate) fn register(
        &mut self,
        base: &[usize],
        path: &str,
    ) -> Result<CommandCode, RegisterError> {
        if self.registered >= MAX_COMMANDS {
            return Err(RegisterError::TooManyCommands { max: MAX_COMMANDS });
        }
        let (segments, is_query) = self.split_path(base, path)?;
        let mut node_path: NodePath = base.iter().copied().collect();
        let mut parent = base.last().copied();
        for spec in &segments {
            let idx = self.child_for(parent, spec)?;
            node_path.push(idx);
            parent = Some(idx);
        }
        let leaf = *node_path.last().expect("validated non-empty path");
        let slot = if is_query {
            &mut self.nodes[leaf].query
        } else {
            &mut self.nodes[leaf].event
        };
        if slot.is_some() {
            return Err(RegisterError::Duplicate {
                path: self.spelled_path(&node_path, is_query),
            });
        }
        let code = CommandCode(self.registered as u16);
        *slot = Some(code);
        self.registered += 1;
        Ok(code)
    }

    /// Resolve a header (query marker already stripped) starting from the
    /// children of `base` (the roots when `base` is empty).
    ///
    /// The whole header must match down to a node carrying the requested
    /// terminal form; anything else is an unknown command.
    pub(crate) fn resolve_from(
        &self,
        base: &[usize],
        keywords: &[&str],
        is_query: bool,
    ) -> Option<Resolved> {
        if keywords.is_empty() || base.len() + keywords.len() > MAX_DEPTH {
            return None;
        }
        let mut path: NodePath = base.iter().copied().collect();
        let mut siblings = match base.last() {
            Some(&p) => self.nodes[p].children.as_slice(),
            None => self.roots.as_slice(),
        };
        for keyword in keywords {
            // First registered sibling wins; registration already collapses
            // identical spellings into one node.
            let &idx = siblings
                .iter()
                .find(|&&i| self.nodes[i].keyword.matches(keyword))?;
            path.push(idx);
            siblings = self.nodes[idx].children.as_slice();
        }
        let leaf = &self.nodes[*path.last().expect("non-empty header")];
        let code = if is_query { leaf.query } else { leaf.event }?;
        Some(Resolved { code, path })
    }

    /// Canonical `A:B:C` spelling of a node path.
    fn spelled_path(&self, path: &[usize], is_query: bool) -> String {
        let mut out = path
            .iter()
            .map(|&i| self.nodes[i].keyword.display())
            .collect::<Vec<_>>()
            .join(":");
        if is_query {
            out.push('?');
        }
        out
    }

    /// Depth-first dump of every registered command form, in canonical
    /// spelling, with its code.
    pub fn dump(&self) -> Vec<RegisteredCommand> {
        // Recursion depth is bounded by MAX_DEPTH.
        fn walk(
            tree: &CommandTree,
            idx: usize,
            prefix: &mut Vec<usize>,
            out: &mut Vec<RegisteredCommand>,
        ) {
            prefix.push(idx);
            let node = &tree.nodes[idx];
            if let Some(code) = node.event {
                out.push(RegisteredCommand {
                    path: tree.spelled_path(prefix, false),
                    code,
                });
            }
            if let Some(code) = node.query {
                out.push(RegisteredCommand {
                    path: tree.spelled_path(prefix, true),
                    code,
                });
            }
            for &child in &node.children {
                walk(tree, child, prefix, out);
            }
            prefix.pop();
        }

        let mut out = Vec::with_capacity(self.registered);
        let mut prefix = Vec::new();
        for &root in &self.roots {
            walk(self, root, &mut prefix, &mut out);
        }
        out.sort_by_key(|c| c.code.index());
        out
    }
}

/// One registered command form, as reported by [`CommandTree::dump`].
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredCommand {
    /// Canonical spelling, e.g. `SYSTem:LED:BRIGhtness?`.
    pub path: String,
    /// The code assigned at registration.
    pub code: CommandCode,
}
