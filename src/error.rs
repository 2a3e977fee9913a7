use thiserror::Error;

/// Coarse wire-level classification of an [`Error`], mirroring the two kinds
/// a transport reply can carry (§4.A / §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Misconfigured or unavailable broker; not worth retrying blindly.
    Default,
    /// Transient protocol/network hiccup; safe to retry.
    InvalidReply,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("transport error: {0}")]
    TransportTransient(String),

    #[error("transport unavailable: {0}")]
    TransportFatal(String),

    #[error("unknown object '{0}'")]
    UnknownObject(String),

    #[error("object '{path}' does not implement {interface}")]
    CapabilityMissing { path: String, interface: String },

    #[error("index {index} out of range (0..{len})")]
    InvalidIndex { index: i32, len: i32 },

    #[error("tts engine error: {0}")]
    EngineError(String),
}

impl Error {
    pub fn kind(&self) -> Kind {
        match self {
            Error::TransportTransient(_) => Kind::InvalidReply,
            Error::TransportFatal(_)
            | Error::UnknownObject(_)
            | Error::CapabilityMissing { .. }
            | Error::InvalidIndex { .. }
            | Error::EngineError(_) => Kind::Default,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
