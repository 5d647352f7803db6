//! Crate error type.
//!
//! Only the sensor fetch and bitmap output can fail. Fetch failures
//! ([`Error::Fetch`], [`Error::HttpStatus`]) and malformed payloads
//! ([`Error::Parse`]) stop at the engine's tick boundary: the tick is dropped,
//! logged, and the next tick is the retry. Values that cannot be drawn are not
//! errors at all; see [`RenderSkip`](crate::render::RenderSkip).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure reaching the sensor endpoint (refused, timed out, reset).
    #[error("sensor endpoint unreachable: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The endpoint answered with something other than 200 OK.
    #[error("sensor endpoint returned {0}")]
    HttpStatus(reqwest::StatusCode),

    /// The body was not a sensor tree.
    #[error("malformed sensor catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// PNG encoding of a key bitmap failed.
    #[error("failed to encode key bitmap: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the fetch-side failures that cause a tick to be skipped.
    pub const fn is_fetch(&self) -> bool { matches!(self, Self::Fetch(_) | Self::HttpStatus(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
