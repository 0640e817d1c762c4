use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::NormalizeConfig;
use crate::document::Document;

/// Removes repeated headers, noise and boundary duplicates from a merged document
#[derive(Debug, Clone)]
pub struct Normalizer {
    header: String,
    noise_markers: Vec<String>,
    noise_prefixes: Vec<String>,
    preserve_blank_lines: bool,
}

/// Counts of lines dropped by one `clean` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub kept: usize,
    pub headers: usize,
    pub noise: usize,
    pub duplicates: usize,
}

impl Normalizer {
    pub fn new(config: &NormalizeConfig) -> Self {
        Self {
            header: config.header.clone(),
            noise_markers: config.noise_markers.clone(),
            noise_prefixes: config.noise_prefixes.clone(),
            preserve_blank_lines: config.preserve_blank_lines,
        }
    }

    /// Produce the cleaned document from the raw one
    pub fn clean(&self, raw: &Document) -> Document {
        let (cleaned, stats) = self.clean_with_stats(raw);
        info!(
            "Cleaned {} lines down to {} (dropped {} headers, {} noise, {} duplicates)",
            raw.len(),
            stats.kept,
            stats.headers,
            stats.noise,
            stats.duplicates
        );
        cleaned
    }

    /// Same as `clean`, also reporting what was dropped.
    ///
    /// Duplicate detection is exact-match over the whole document, not per
    /// cue: identical dialogue in two different cues keeps only the first.
    pub fn clean_with_stats(&self, raw: &Document) -> (Document, CleanStats) {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut header_emitted = false;
        let mut stats = CleanStats::default();
        let mut cleaned = Vec::with_capacity(raw.len());

        for line in raw.iter().map(str::trim) {
            if line == self.header {
                if header_emitted {
                    stats.headers += 1;
                    continue;
                }
                header_emitted = true;
            } else if self.is_noise(line) {
                debug!("Dropping noise line: {}", line);
                stats.noise += 1;
                continue;
            } else if !(self.preserve_blank_lines && line.is_empty()) && !seen.insert(line) {
                stats.duplicates += 1;
                continue;
            }

            cleaned.push(line.to_string());
        }

        stats.kept = cleaned.len();
        (Document::new(cleaned), stats)
    }

    fn is_noise(&self, line: &str) -> bool {
        self.noise_markers.iter().any(|marker| line.contains(marker.as_str()))
            || self.noise_prefixes.iter().any(|prefix| line.starts_with(prefix.as_str()))
    }
}
