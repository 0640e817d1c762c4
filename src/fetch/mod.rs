// Fragment ingestion
//
// - FragmentSource: one fragment per index, reporting content, empty or end
// - SequenceFetcher: probes indices in order and assembles the raw document
// - http: reqwest-backed source addressed by a URL template

pub mod http;

use async_trait::async_trait;
use tracing::{info, warn};

pub use http::HttpFragmentSource;

use crate::config::SourceConfig;
use crate::document::Document;
use crate::error::{Result, VttError};

/// Outcome of fetching a single fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Fragment body as received
    Content(Vec<u8>),
    /// Transient failure; the index is skipped but probing continues
    Empty,
    /// Not-found: no fragment at this index or any later one
    EndOfSequence,
}

/// Source of numbered subtitle fragments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FragmentSource: Send + Sync {
    /// Fetch the fragment at `index`. Failures are reported as `Empty`, never as errors.
    async fn fetch(&self, index: u64) -> FetchResult;
}

/// Bounds that stop a misbehaving remote from looping forever
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub max_fragments: u64,
    pub max_consecutive_failures: u32,
}

impl From<&SourceConfig> for FetchLimits {
    fn from(config: &SourceConfig) -> Self {
        Self {
            max_fragments: config.max_fragments,
            max_consecutive_failures: config.max_consecutive_failures,
        }
    }
}

/// Lossy UTF-8 decoding; invalid sequences become U+FFFD
pub fn decode_fragment(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Drives a `FragmentSource` from index 0 until end-of-sequence
pub struct SequenceFetcher {
    source: Box<dyn FragmentSource>,
    limits: FetchLimits,
}

impl SequenceFetcher {
    pub fn new(source: Box<dyn FragmentSource>, limits: FetchLimits) -> Self {
        Self { source, limits }
    }

    /// Fetch every fragment in order and merge them into the raw document.
    ///
    /// Fetches are strictly sequential. Content payloads are joined with a
    /// single newline; empty results add nothing but still advance the index.
    pub async fn fetch_all(&self) -> Result<Document> {
        let mut parts: Vec<String> = Vec::new();
        let mut index: u64 = 0;
        let mut consecutive_failures: u32 = 0;
        let mut skipped: u64 = 0;

        loop {
            match self.source.fetch(index).await {
                FetchResult::Content(bytes) => {
                    parts.push(decode_fragment(&bytes));
                    consecutive_failures = 0;
                    info!("Fetched fragment-{} ({} bytes)", index, bytes.len());
                }
                FetchResult::Empty => {
                    consecutive_failures += 1;
                    skipped += 1;
                    warn!(
                        "Fragment-{} contributed nothing ({} failed in a row)",
                        index, consecutive_failures
                    );
                    if consecutive_failures >= self.limits.max_consecutive_failures {
                        return Err(VttError::FetchFuse {
                            index,
                            reason: format!("{} consecutive failed fragments", consecutive_failures),
                        });
                    }
                }
                FetchResult::EndOfSequence => {
                    info!(
                        "End of sequence at fragment-{}: merged {} fragments, skipped {}",
                        index,
                        parts.len(),
                        skipped
                    );
                    break;
                }
            }

            // Index `max_fragments` is still probed; only a non-end answer there trips.
            if index >= self.limits.max_fragments {
                return Err(VttError::FetchFuse {
                    index,
                    reason: format!(
                        "no end-of-sequence after {} fragments",
                        self.limits.max_fragments
                    ),
                });
            }

            index += 1;
        }

        Ok(Document::from_text(&parts.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT_0: &str = "WEBVTT\n1\n00:00:00.000 --> 00:00:01.000\nTere\n";
    const FRAGMENT_1: &str = "WEBVTT\n2\n00:00:01.000 --> 00:00:02.000\nTere\n";

    fn limits() -> FetchLimits {
        FetchLimits {
            max_fragments: 100,
            max_consecutive_failures: 5,
        }
    }

    fn scripted(results: Vec<FetchResult>) -> MockFragmentSource {
        let mut source = MockFragmentSource::new();
        source.expect_fetch().returning(move |index| {
            results
                .get(index as usize)
                .cloned()
                .unwrap_or(FetchResult::EndOfSequence)
        });
        source
    }

    #[tokio::test]
    async fn test_merges_fragments_in_order() {
        let source = scripted(vec![
            FetchResult::Content(FRAGMENT_0.as_bytes().to_vec()),
            FetchResult::Content(FRAGMENT_1.as_bytes().to_vec()),
        ]);

        let raw = SequenceFetcher::new(Box::new(source), limits())
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(raw.to_text(), format!("{}\n{}", FRAGMENT_0, FRAGMENT_1));
    }

    #[tokio::test]
    async fn test_empty_fragments_are_skipped_not_terminal() {
        let source = scripted(vec![
            FetchResult::Empty,
            FetchResult::Content(b"a".to_vec()),
            FetchResult::Empty,
            FetchResult::Empty,
            FetchResult::Content(b"b".to_vec()),
        ]);

        let raw = SequenceFetcher::new(Box::new(source), limits())
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(raw.lines(), &["a", "b"]);
    }

    #[tokio::test]
    async fn test_stops_at_first_end_of_sequence() {
        let mut source = MockFragmentSource::new();
        source
            .expect_fetch()
            .withf(|index| *index < 2)
            .times(2)
            .returning(|index| FetchResult::Content(format!("frag {}", index).into_bytes()));
        source
            .expect_fetch()
            .withf(|index| *index == 2)
            .times(1)
            .returning(|_| FetchResult::EndOfSequence);

        let raw = SequenceFetcher::new(Box::new(source), limits())
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(raw.lines(), &["frag 0", "frag 1"]);
    }

    #[tokio::test]
    async fn test_immediate_end_yields_empty_document() {
        let raw = SequenceFetcher::new(Box::new(scripted(vec![])), limits())
            .fetch_all()
            .await
            .unwrap();

        assert!(raw.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let source = scripted(vec![FetchResult::Content(vec![b'T', b'e', 0xff, b'r', b'e'])]);

        let raw = SequenceFetcher::new(Box::new(source), limits())
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(raw.lines(), &["Te\u{fffd}re"]);
    }

    #[tokio::test]
    async fn test_consecutive_failures_trip_the_fuse() {
        let mut source = MockFragmentSource::new();
        source.expect_fetch().returning(|_| FetchResult::Empty);

        let err = SequenceFetcher::new(Box::new(source), limits())
            .fetch_all()
            .await
            .unwrap_err();

        assert!(matches!(err, VttError::FetchFuse { index: 4, .. }));
    }

    #[tokio::test]
    async fn test_endless_content_trips_the_fuse() {
        let mut source = MockFragmentSource::new();
        source
            .expect_fetch()
            .times(4)
            .returning(|_| FetchResult::Content(b"x".to_vec()));

        let limits = FetchLimits {
            max_fragments: 3,
            max_consecutive_failures: 5,
        };
        let err = SequenceFetcher::new(Box::new(source), limits)
            .fetch_all()
            .await
            .unwrap_err();

        assert!(matches!(err, VttError::FetchFuse { index: 3, .. }));
    }

    #[tokio::test]
    async fn test_end_exactly_at_fragment_limit_is_accepted() {
        let source = scripted(vec![
            FetchResult::Content(b"a".to_vec()),
            FetchResult::Content(b"b".to_vec()),
            FetchResult::Content(b"c".to_vec()),
        ]);
        let limits = FetchLimits {
            max_fragments: 3,
            max_consecutive_failures: 5,
        };

        let raw = SequenceFetcher::new(Box::new(source), limits)
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(raw.lines(), &["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_crlf_fragments_merge_with_bare_newlines() {
        let source = scripted(vec![
            FetchResult::Content(b"WEBVTT\r\n1\r\n".to_vec()),
            FetchResult::Content(b"Tere\r\n".to_vec()),
        ]);

        let raw = SequenceFetcher::new(Box::new(source), limits())
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(raw.to_text(), "WEBVTT\n1\n\nTere\n");
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let source = scripted(vec![
            FetchResult::Empty,
            FetchResult::Empty,
            FetchResult::Content(b"a".to_vec()),
            FetchResult::Empty,
            FetchResult::Empty,
        ]);
        let limits = FetchLimits {
            max_fragments: 100,
            max_consecutive_failures: 3,
        };

        let raw = SequenceFetcher::new(Box::new(source), limits)
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(raw.lines(), &["a"]);
    }
}
