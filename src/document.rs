//! Line-oriented subtitle documents.
//!
//! Every pipeline stage consumes one `Document` and produces a new one;
//! nothing is edited in place.

use std::fmt;

/// Pipeline stage whose output is persisted as an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Merged,
    Cleaned,
    Translated,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merged => "merged",
            Self::Cleaned => "cleaned",
            Self::Translated => "translated",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered sequence of subtitle lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Split text on `\n`, dropping one trailing `\r` per line.
    /// A trailing newline yields a final empty line so `to_text` restores it.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }

        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();

        Self { lines }
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
