use derive_more::{Display, Error};

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub(crate) enum ServiceError {
    /// no response could be obtained at all
    #[display("{message}")]
    Transport { message: String },
    /// the service answered with a non-2xx status
    #[display("{message}")]
    Status { code: u16, message: String },
    #[display("unexpected response body, {message}")]
    Decode { message: String },
}

impl ServiceError {
    pub fn transport(e: impl std::fmt::Display) -> Self {
        Self::Transport { message: e.to_string() }
    }
}
