use crate::config::NormalizeConfig;

/// Whether a line carries translatable text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Header, cue index, timing or blank line; passed through untouched
    Structural,
    /// Dialogue or caption text
    Textual,
}

/// Stateless, whole-line classifier for cue-based subtitle lines
#[derive(Debug, Clone)]
pub struct LineClassifier {
    header: String,
    timestamp_separator: String,
}

impl LineClassifier {
    pub fn new(header: impl Into<String>, timestamp_separator: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            timestamp_separator: timestamp_separator.into(),
        }
    }

    pub fn from_config(config: &NormalizeConfig) -> Self {
        Self::new(config.header.clone(), config.timestamp_separator.clone())
    }

    pub fn classify(&self, line: &str) -> LineKind {
        let trimmed = line.trim();

        if line.contains(self.timestamp_separator.as_str())
            || trimmed.is_empty()
            || trimmed.bytes().all(|b| b.is_ascii_digit())
            || trimmed == self.header
        {
            LineKind::Structural
        } else {
            LineKind::Textual
        }
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::from_config(&NormalizeConfig::default())
    }
}
