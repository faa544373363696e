use std::path::PathBuf;

use thiserror::Error;

/// Faults raised while seeding the session from the record store.
///
/// These are fatal during startup: the dashboard never starts without both
/// order collections. During an optional per-cycle reload the engine treats
/// them as recoverable and keeps the previous records.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unreachable: {}", .path.display())]
    Unreachable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("collection '{collection}' is not a JSON array of documents")]
    Malformed {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("collection '{collection}' returned no documents")]
    Empty { collection: String },
}

/// Faults from the quote feed. Always recoverable: a failed fetch degrades the
/// affected snapshot fields for one cycle and the loop proceeds to its next
/// tick.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed answered HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("response is missing the '{0}' pair")]
    MissingPair(String),

    #[error("unusable bid value '{0}'")]
    BadBid(String),

    #[error("unusable history timestamp {0}")]
    BadTimestamp(i64),

    #[error("history response is empty")]
    EmptyHistory,
}
