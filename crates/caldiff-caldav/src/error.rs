//! Error types for multistatus decoding.
//!
//! Only structural failures surface as errors: an undecodable XML document
//! or one whose root is not `multistatus`. Without the top-level structure
//! there are no record boundaries, so there is no partial result to return.
//! Per-record failures inside an otherwise valid document are logged and
//! skipped by the extraction layer instead.

use thiserror::Error;

/// A structural failure while decoding a multistatus response body.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The response body is not well-formed XML.
    #[error("malformed multistatus XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document parsed but its root element is not `multistatus`.
    #[error("unexpected root element <{0}>, expected <multistatus>")]
    NotMultistatus(String),

    /// The document ended before the root element was closed.
    #[error("truncated multistatus document")]
    Truncated,
}

/// A specialized Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
