use serde::{Deserialize, Serialize};
use text_size::{TextRange, TextSize};

/// A span of source text in a particular file.
///
/// Offsets are byte offsets into the file contents the external parser saw.
/// `start_line` is carried along for reporting only and takes no part in
/// containment checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeRange {
    pub file: String,
    pub range: TextRange,
    #[serde(default)]
    pub start_line: u32,
}

impl CodeRange {
    pub fn new(file: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            file: file.into(),
            range: TextRange::new(TextSize::from(start), TextSize::from(end)),
            start_line: 0,
        }
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.start_line = line;
        self
    }

    #[inline]
    pub fn start(&self) -> u32 {
        self.range.start().into()
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.range.end().into()
    }

    /// Returns `true` if `other` lies completely inside `self` (same file,
    /// inclusive bounds).
    pub fn subsumes(&self, other: &CodeRange) -> bool {
        self.file == other.file && self.range.contains_range(other.range)
    }
}

impl std::fmt::Display for CodeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}..{}", self.file, self.start(), self.end())
    }
}
