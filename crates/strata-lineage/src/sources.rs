//! Token sources and the reconciliation fold.
//!
//! All the ad hoc places a lineage token can hide — the current location's
//! query string, its fragment, a registry of previously seen payload URLs,
//! URLs nested inside other URLs — are unified behind the [`TokenSource`]
//! sequence. [`collect_lineage`] depends only on that sequence, not on
//! where tokens came from.

use std::collections::HashSet;

use strata_types::ContentHash;
use tracing::debug;
use url::Url;

use crate::set::LineageSet;
use crate::token::{LINEAGE_PARAM, decode_token};

/// How deep nested-URL token extraction will recurse.
const MAX_NESTED_DEPTH: usize = 3;

/// A lazy sequence of opaque token strings.
///
/// Sources are scanned in order and each is independently non-fatal:
/// a source that yields nothing (or garbage) simply contributes nothing.
pub trait TokenSource {
    /// Yield this source's tokens.
    fn tokens(&self) -> Box<dyn Iterator<Item = String> + '_>;
}

/// Extract all values of the `param` query/fragment parameter from a URL
/// string, recursing into values that are themselves URLs carrying the
/// same parameter.
///
/// Unparseable input yields no tokens (skipped silently).
pub fn extract_tokens(location: &str, param: &str) -> Vec<String> {
    let url = match Url::parse(location) {
        Ok(url) => url,
        Err(e) => {
            debug!(location, error = %e, "unparseable location, no tokens");
            return Vec::new();
        }
    };
    let mut tokens = Vec::new();
    extract_from_url(&url, param, MAX_NESTED_DEPTH, &mut tokens);
    tokens
}

fn extract_from_url(url: &Url, param: &str, depth: usize, out: &mut Vec<String>) {
    let mut values: Vec<String> = url
        .query_pairs()
        .filter(|(k, _)| k == param)
        .map(|(_, v)| v.into_owned())
        .collect();

    // The fragment is parsed as its own query string: tokens arriving via
    // `#lineage=...` must not be lost to servers that never see fragments.
    if let Some(fragment) = url.fragment() {
        values.extend(
            url::form_urlencoded::parse(fragment.as_bytes())
                .filter(|(k, _)| k == param)
                .map(|(_, v)| v.into_owned()),
        );
    }

    for value in values {
        if depth > 0
            && let Ok(nested) = Url::parse(&value)
            && carries_param(&nested, param)
        {
            extract_from_url(&nested, param, depth - 1, out);
            continue;
        }
        out.push(value);
    }
}

fn carries_param(url: &Url, param: &str) -> bool {
    url.query_pairs().any(|(k, _)| k == param)
        || url.fragment().is_some_and(|fragment| {
            url::form_urlencoded::parse(fragment.as_bytes()).any(|(k, _)| k == param)
        })
}

/// Tokens embedded in the current location's query or fragment.
pub struct LocationTokens {
    location: String,
}

impl LocationTokens {
    /// Scan the given location URL.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl TokenSource for LocationTokens {
    fn tokens(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(extract_tokens(&self.location, LINEAGE_PARAM).into_iter())
    }
}

/// A registry of previously seen payload URLs.
///
/// Deduplicates across its two feeds — URLs persisted under legacy
/// storage keys and URLs recorded in the current session — preserving
/// first-seen order, then extracts tokens from each URL (including URLs
/// nested under the same parameter).
pub struct PayloadRegistry {
    urls: Vec<String>,
}

impl PayloadRegistry {
    /// Build a registry from the persisted and in-memory URL feeds.
    pub fn from_feeds(
        legacy: impl IntoIterator<Item = String>,
        session: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for url in legacy.into_iter().chain(session) {
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }
        Self { urls }
    }

    /// Number of distinct registered URLs.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl TokenSource for PayloadRegistry {
    fn tokens(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(
            self.urls
                .iter()
                .flat_map(|url| extract_tokens(url, LINEAGE_PARAM)),
        )
    }
}

/// Fold every decodable capsule matching `origin` from the given sources
/// into one [`LineageSet`].
///
/// Sources are scanned in order; entries from later sources overwrite
/// same-keyed entries from earlier ones. Undecodable tokens and capsules
/// for other origins are skipped with a debug log.
pub fn collect_lineage(origin: &ContentHash, sources: &[&dyn TokenSource]) -> LineageSet {
    let mut set = LineageSet::new();
    for source in sources {
        for token in source.tokens() {
            match decode_token(&token) {
                Ok(capsule) if capsule.file_hash == *origin => {
                    debug!(entries = capsule.entries.len(), "folding lineage capsule");
                    set.merge(capsule.entries);
                }
                Ok(capsule) => {
                    debug!(found = %capsule.file_hash, "capsule for different origin, skipping");
                }
                Err(e) => {
                    debug!(error = %e, "undecodable lineage token, skipping");
                }
            }
        }
    }
    set
}
