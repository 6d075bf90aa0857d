//! Adapter boundary: the trait every venue implements and its error type.
//!
//! Adapters own authentication and HTTP. They hand back venue-native
//! records untouched; interpreting fields is the normalization layer's job.

use std::fmt;

use pdk_schemas::RawAccountRecord;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`VenueAdapter`] may return. Messages never carry credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Network failure or timeout.
    Transport(String),
    /// The venue answered with a non-success HTTP status.
    Api { status: u16, message: String },
    /// A response body was not the JSON shape expected.
    Decode(String),
    /// Login failed or the session was rejected.
    Auth(String),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::Transport(msg) => write!(f, "transport error: {msg}"),
            AdapterError::Api { status, message } => {
                write!(f, "venue api error status={status}: {message}")
            }
            AdapterError::Decode(msg) => write!(f, "decode error: {msg}"),
            AdapterError::Auth(msg) => write!(f, "auth error: {msg}"),
        }
    }
}

impl std::error::Error for AdapterError {}

impl From<reqwest::Error> for AdapterError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AdapterError::Decode(e.without_url().to_string())
        } else {
            AdapterError::Transport(e.without_url().to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Adapter trait
// ---------------------------------------------------------------------------

/// One exchange, all of its configured accounts.
#[async_trait::async_trait]
pub trait VenueAdapter: Send + Sync {
    /// Stable venue id from config (e.g. `"grvt"`).
    fn venue_id(&self) -> &str;

    /// Label used in reports (e.g. `"GRVT"`).
    fn display_name(&self) -> &str;

    /// One record per configured account, in account order.
    ///
    /// An account that cannot be reached still yields a record (all
    /// sub-fields empty) so it shows up in the report. `Err` means the
    /// venue as a whole contributed nothing.
    async fn fetch_accounts(&self) -> Result<Vec<RawAccountRecord>, AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAdapter {
        records: Vec<RawAccountRecord>,
    }

    #[async_trait::async_trait]
    impl VenueAdapter for FixedAdapter {
        fn venue_id(&self) -> &str {
            "fixed"
        }

        fn display_name(&self) -> &str {
            "Fixed"
        }

        async fn fetch_accounts(&self) -> Result<Vec<RawAccountRecord>, AdapterError> {
            Ok(self.records.clone())
        }
    }

    #[tokio::test]
    async fn adapter_is_object_safe() {
        let adapter: Box<dyn VenueAdapter> = Box::new(FixedAdapter {
            records: vec![RawAccountRecord::unreachable(); 2],
        });
        assert_eq!(adapter.venue_id(), "fixed");
        assert_eq!(adapter.fetch_accounts().await.unwrap().len(), 2);
    }

    #[test]
    fn error_display() {
        let e = AdapterError::Api {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(e.to_string(), "venue api error status=401: unauthorized");
        assert_eq!(
            AdapterError::Auth("missing session cookie".to_string()).to_string(),
            "auth error: missing session cookie"
        );
    }
}
