use crate::handoff::HandoffSender;
use airgrab_core::{air, ResourceLocator};
use futures::{Stream, StreamExt};

/// Snippets are only considered when they start with this, case-insensitively.
/// Stricter than the parser, which also takes `urn:` and `air:`.
pub const CANDIDATE_PREFIX: &str = "urn:air";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceSummary {
    /// Snippets observed
    pub seen: usize,
    /// Locators handed to the orchestrator
    pub forwarded: usize,
    /// Candidates that failed to parse
    pub rejected: usize,
}

pub fn is_candidate(snippet: &str) -> bool {
    let head: String = snippet.chars().take(CANDIDATE_PREFIX.len()).collect();
    head.to_lowercase() == CANDIDATE_PREFIX
}

/// Watch a stream of text snippets (clipboard contents) and forward every
/// well-formed `urn:air` identifier. Ends with the stream, or when the
/// receiving side goes away.
pub async fn watch<S>(snippets: S, sender: HandoffSender<ResourceLocator>) -> SourceSummary
where
    S: Stream<Item = String>,
{
    log::info!("Starting clipboard watcher");
    pump(snippets, sender, is_candidate).await
}

/// Forward identifiers given explicitly, e.g. on the command line. Every
/// prefix the parser accepts is allowed.
pub async fn forward<S>(identifiers: S, sender: HandoffSender<ResourceLocator>) -> SourceSummary
where
    S: Stream<Item = String>,
{
    pump(identifiers, sender, |_| true).await
}

async fn pump<S>(
    snippets: S,
    mut sender: HandoffSender<ResourceLocator>,
    admit: fn(&str) -> bool,
) -> SourceSummary
where
    S: Stream<Item = String>,
{
    let mut summary = SourceSummary::default();
    futures::pin_mut!(snippets);

    while let Some(text) = snippets.next().await {
        summary.seen += 1;
        if !admit(&text) {
            continue;
        }

        match air::parse(&text) {
            Ok(locator) => {
                log::debug!("Queueing {}", locator);
                if sender.send(locator).await.is_err() {
                    log::warn!("Downloader has stopped, no longer forwarding identifiers");
                    break;
                }
                summary.forwarded += 1;
            }
            Err(e) => {
                log::error!("Invalid AIR: {} ({})", text.trim(), e);
                summary.rejected += 1;
            }
        }
    }

    summary
}
