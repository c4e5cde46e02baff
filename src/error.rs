use thiserror::Error;

/// Errors that can occur when using a TypedMap
///
/// Reads never fail: a value that can't be coerced resolves to the target
/// type's zero value. Only the byte-level codec can report an error.
#[derive(Debug, Error)]
pub enum MapError {
    /// The payload handed to a decode hook was not a JSON object
    #[error("failed to decode typed map: {0}")]
    Decode(#[source] serde_json::Error),
    /// The serializer rejected the current entries
    #[error("failed to encode typed map: {0}")]
    Encode(#[source] serde_json::Error),
}
