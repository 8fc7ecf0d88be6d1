//! Query optimizer — normalizes a raw query before it is embedded.
//!
//! Two passes, in order:
//!
//! 1. **Marker collapse** — upstream prompt builders sometimes inject the same
//!    reminder boilerplate several times in a row. Every contiguous run of two
//!    or more occurrences of a known marker is replaced by one canonical
//!    marker. Nothing else in the text is touched.
//! 2. **Length bound** — text longer than the configured maximum is cut at
//!    exactly `max_length` characters and [`TRUNCATION_MARKER`] is appended.
//!    The cut ignores word boundaries, so the output is deterministic.
//!
//! Optimization is a total function: every input (including `""`) yields a
//! result, and the optimizer holds no mutable state.

use regex_lite::{NoExpand, Regex};
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{Error, Result};

/// Default maximum query length, in characters.
pub const MAX_LENGTH: usize = 1000;

/// Appended to a query that was cut at the length bound.
pub const TRUNCATION_MARKER: &str = "...";

/// Canonical form of the reminder boilerplate collapsed by default.
pub const REMINDER_MARKER: &str = "[Reminder: previous turn context, no action needed]";

const REMINDER_PATTERN: &str =
    r"(?i:\[\s*reminder:\s*previous\s+turn\s+context,\s*no\s+action\s+needed\.?\s*\])";

/// Whitespace allowed between markers of one run. Adds the no-break and
/// ideographic spaces, which `\s` does not cover.
const RUN_SEPARATOR: &str = r"[\s\x{A0}\x{3000}]*";

static DEFAULT_MARKERS: LazyLock<Vec<RedundantMarker>> = LazyLock::new(|| {
    vec![RedundantMarker::new(REMINDER_PATTERN, REMINDER_MARKER).unwrap()]
});

/// A boilerplate pattern whose repeated runs collapse to one canonical marker.
#[derive(Debug, Clone)]
pub struct RedundantMarker {
    run: Regex,
    canonical: String,
}

impl RedundantMarker {
    /// Build a marker from a regex matching a single occurrence.
    ///
    /// A run is two or more occurrences separated only by whitespace,
    /// including no-break and ideographic spaces. An invalid pattern, or one
    /// that matches the empty string, is a deployment fault and is reported
    /// as [`Error::Config`].
    pub fn new(pattern: &str, canonical: impl Into<String>) -> Result<Self> {
        let invalid = |reason: String| Error::Config {
            message: format!("invalid redundant-marker pattern `{pattern}`: {reason}"),
        };

        let single = Regex::new(pattern).map_err(|e| invalid(e.to_string()))?;
        if single.is_match("") {
            return Err(invalid("pattern matches the empty string".into()));
        }

        let run = Regex::new(&format!("(?:{pattern})(?:{RUN_SEPARATOR}(?:{pattern}))+"))
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            run,
            canonical: canonical.into(),
        })
    }

    /// The text each run is replaced with.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    fn collapse(&self, text: &str) -> (String, usize) {
        let runs = self.run.find_iter(text).count();
        if runs == 0 {
            return (text.to_string(), 0);
        }
        let collapsed = self
            .run
            .replace_all(text, NoExpand(self.canonical.as_str()))
            .into_owned();
        (collapsed, runs)
    }
}

/// A query after marker collapse and length bounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizedQuery {
    text: String,
    #[serde(skip)]
    truncated: bool,
}

impl OptimizedQuery {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_inner(self) -> String {
        self.text
    }

    /// Whether the length bound cut this query.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl AsRef<str> for OptimizedQuery {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for OptimizedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<OptimizedQuery> for String {
    fn from(query: OptimizedQuery) -> Self {
        query.text
    }
}

/// Stateless query optimizer; safe to share across threads and tasks.
#[derive(Debug, Clone)]
pub struct QueryOptimizer {
    max_length: usize,
    markers: Vec<RedundantMarker>,
}

impl QueryOptimizer {
    /// An optimizer with the built-in reminder marker and [`MAX_LENGTH`].
    pub fn new() -> Self {
        Self {
            max_length: MAX_LENGTH,
            markers: DEFAULT_MARKERS.clone(),
        }
    }

    /// Override the maximum length (in characters).
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Register an additional marker pattern. Markers apply in registration order.
    pub fn with_marker(mut self, pattern: &str, canonical: impl Into<String>) -> Result<Self> {
        self.markers.push(RedundantMarker::new(pattern, canonical)?);
        Ok(self)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn markers(&self) -> &[RedundantMarker] {
        &self.markers
    }

    /// Collapse marker runs, then bound the length.
    pub fn optimize(&self, query: &str) -> OptimizedQuery {
        let mut text = query.to_string();
        let mut collapsed_runs = 0;
        for marker in &self.markers {
            let (next, runs) = marker.collapse(&text);
            text = next;
            collapsed_runs += runs;
        }

        // Cut on a char boundary so multi-byte text never splits mid-sequence.
        let truncated = match text.char_indices().nth(self.max_length) {
            Some((cut, _)) => {
                text.truncate(cut);
                text.push_str(TRUNCATION_MARKER);
                true
            }
            None => false,
        };

        if collapsed_runs > 0 || truncated {
            debug!(
                input_chars = query.chars().count(),
                output_chars = text.chars().count(),
                collapsed_runs,
                truncated,
                "Query optimized"
            );
        }

        OptimizedQuery { text, truncated }
    }
}

impl Default for QueryOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Optimize a query with the default markers and [`MAX_LENGTH`].
pub fn optimize(query: &str) -> String {
    QueryOptimizer::new().optimize(query).into_inner()
}
