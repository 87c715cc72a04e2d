use serde::Deserialize;

pub(crate) mod bill;
pub(crate) mod config;
pub(crate) mod draft;

/// identity the bills are scoped to
pub(crate) type UserId = i64;

/// Error payload returned by the bill service on non-2xx responses
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
