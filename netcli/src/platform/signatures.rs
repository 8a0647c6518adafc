//! Error signatures: per-family patterns that mark command output as a
//! device-side failure.

use std::fmt;

use regex::Regex;

use crate::channel::patterns::compile_text;
use crate::error::PlatformError;

/// Ordered set of error patterns for one device family.
///
/// The first pattern (in insertion order) that matches anywhere in the
/// output decides the classification.
#[derive(Debug, Clone, Default)]
pub struct ErrorSignatureSet {
    patterns: Vec<Regex>,
}

impl ErrorSignatureSet {
    /// Compile a set of error patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self, PlatformError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| compile_text(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// A set that never matches.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a pattern; it is checked after all existing ones.
    pub fn push(&mut self, pattern: &str) -> Result<(), PlatformError> {
        self.patterns.push(compile_text(pattern)?);
        Ok(())
    }

    /// Pattern sources, in match order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Classify `output`; `None` means success.
    pub fn classify(&self, output: &str) -> Option<ErrorDescription> {
        self.patterns.iter().find_map(|re| {
            re.find(output).map(|m| ErrorDescription {
                pattern: re.as_str().to_string(),
                matched: line_around(output, m.start(), m.end()).to_string(),
                output: output.to_string(),
            })
        })
    }
}

/// Classify command output against a family's error signatures.
///
/// Pure: the same output and set always yield the same answer.
pub fn classify(output: &str, signatures: &ErrorSignatureSet) -> Option<ErrorDescription> {
    signatures.classify(output)
}

/// The line of `text` that contains the byte range `start..end`.
fn line_around(text: &str, start: usize, end: usize) -> &str {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[end..].find('\n').map_or(text.len(), |i| end + i);
    text[line_start..line_end].trim()
}

/// Details of a classified device error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescription {
    /// Source of the pattern that matched.
    pub pattern: String,

    /// The output line the pattern matched on.
    pub matched: String,

    /// The full output that was classified.
    pub output: String,
}

impl fmt::Display for ErrorDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.matched)
    }
}
