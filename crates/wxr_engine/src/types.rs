use std::fmt;

/// Body of one downloaded media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    /// URL as requested.
    pub url: String,
    /// URL that served the body, after redirects.
    pub final_url: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} ({message})")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failures worth another attempt: the same request may succeed later.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            FailureKind::Timeout | FailureKind::Network => true,
            FailureKind::HttpStatus(code) => code == 408 || code == 429 || code >= 500,
            FailureKind::InvalidUrl
            | FailureKind::RedirectLimitExceeded
            | FailureKind::TooLarge { .. } => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    /// Body longer than the configured cap; `received` is the byte count
    /// announced or read when the fetch stopped.
    TooLarge { limit: u64, received: u64 },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl => f.write_str("unparseable media url"),
            Self::HttpStatus(code) => write!(f, "server answered {code}"),
            Self::Timeout => f.write_str("request timed out"),
            Self::RedirectLimitExceeded => f.write_str("too many redirects"),
            Self::TooLarge { limit, received } => {
                write!(f, "media larger than {limit} bytes (got {received})")
            }
            Self::Network => f.write_str("network failure"),
        }
    }
}
