use derive_more::Display;

use crate::types::Point;

pub type Result<T> = core::result::Result<T, StreamError>;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum StreamError {
    /// A caller-supplied parameter can never produce a trace.
    #[display("invalid configuration: {_0}")]
    InvalidConfiguration(&'static str),
    /// A required position lies outside the sampled domain.
    #[display("position {position} lies outside the field domain")]
    OutOfDomain { position: Point },
}

impl std::error::Error for StreamError {}
