//! Opaque lineage capsule tokens.
//!
//! A capsule carries lineage entries for one origin out of band, e.g.
//! embedded in a share link. Wire format is
//! `strata:v1:<base64url-encoded-json>` (unpadded), so a token survives
//! being pasted into a URL query parameter unescaped.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use strata_types::{ContentHash, LineageKey};

/// Prefix identifying a lineage capsule token.
pub const TOKEN_PREFIX: &str = "strata:v1:";

/// Query/fragment parameter that carries capsule tokens.
pub const LINEAGE_PARAM: &str = "lineage";

/// Capsule format version inside the JSON body.
const CAPSULE_VERSION: u8 = 1;

/// A decoded lineage capsule: which origin it belongs to plus the lineage
/// entries it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageCapsule {
    /// Capsule format version.
    pub version: u8,
    /// Whole-file hash of the origin these entries belong to.
    pub file_hash: ContentHash,
    /// The lineage entries being shared.
    pub entries: Vec<LineageKey>,
}

impl LineageCapsule {
    /// Build a capsule for an origin.
    pub fn new(file_hash: ContentHash, entries: Vec<LineageKey>) -> Self {
        Self {
            version: CAPSULE_VERSION,
            file_hash,
            entries,
        }
    }
}

/// Errors produced while decoding a capsule token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token does not start with [`TOKEN_PREFIX`].
    #[error("not a lineage token")]
    Format,

    /// The payload is not valid unpadded base64url.
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded payload is not a valid capsule.
    #[error("capsule decode failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The capsule declares an unknown version.
    #[error("unsupported capsule version {0}")]
    UnsupportedVersion(u8),
}

/// Encode a capsule as a `strata:v1:` token.
pub fn encode_token(capsule: &LineageCapsule) -> String {
    // Serialization of these record types cannot fail.
    let json = serde_json::to_string(capsule).unwrap_or_default();
    format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(json.as_bytes()))
}

/// Decode a token back into a capsule.
pub fn decode_token(token: &str) -> Result<LineageCapsule, TokenError> {
    let body = token.strip_prefix(TOKEN_PREFIX).ok_or(TokenError::Format)?;
    let json = URL_SAFE_NO_PAD.decode(body)?;
    let capsule: LineageCapsule = serde_json::from_slice(&json)?;
    if capsule.version != CAPSULE_VERSION {
        return Err(TokenError::UnsupportedVersion(capsule.version));
    }
    Ok(capsule)
}
