//! Lineage reconciliation for Strata.
//!
//! Lineage records for one origin can arrive from several places: the
//! local storage layer, tokens embedded in a page location, and a registry
//! of previously seen payload URLs. This crate merges them into one
//! deduplicated [`LineageSet`]:
//!
//! - [`merge_lineage`] / [`LineageSet`] — keyed merge by
//!   `(tier, chunkIndex)`, incoming entries win, iteration sorted.
//! - [`LineageCapsule`] tokens — `strata:v1:<base64url-json>` blobs that
//!   carry lineage entries out of band.
//! - [`TokenSource`] — the one seam the reconciler reads tokens through;
//!   [`LocationTokens`] and [`PayloadRegistry`] are the two shipped
//!   sources.
//! - [`collect_lineage`] — folds every decodable capsule matching an
//!   origin into a set, skipping the rest silently.

mod set;
mod sources;
mod token;

pub use set::{LineageSet, merge_lineage};
pub use sources::{LocationTokens, PayloadRegistry, TokenSource, collect_lineage, extract_tokens};
pub use token::{LINEAGE_PARAM, LineageCapsule, TOKEN_PREFIX, TokenError, decode_token, encode_token};
