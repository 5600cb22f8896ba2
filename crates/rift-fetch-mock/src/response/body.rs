//! Response bodies.

use crate::error::FetchMockError;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, Stream, StreamExt};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

pub type BodyStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Body of a [`super::MockResponse`].
///
/// Buffered bodies can be read any number of times. A streamed body is
/// consumed by its first reader; clones share the same stream.
#[derive(Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Full(Bytes),
    Stream(Arc<Mutex<Option<BodyStream>>>),
}

impl Body {
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    {
        Body::Stream(Arc::new(Mutex::new(Some(stream.boxed()))))
    }

    /// Byte length, `None` for streams.
    pub fn len(&self) -> Option<usize> {
        match self {
            Body::Empty => Some(0),
            Body::Full(bytes) => Some(bytes.len()),
            Body::Stream(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Body::Stream(_))
    }

    /// Whether a streamed body has already been consumed.
    pub fn is_used(&self) -> bool {
        match self {
            Body::Stream(slot) => slot.lock().is_none(),
            _ => false,
        }
    }

    /// Read the whole body into memory.
    pub async fn read(&self) -> Result<Bytes, FetchMockError> {
        match self {
            Body::Empty => Ok(Bytes::new()),
            Body::Full(bytes) => Ok(bytes.clone()),
            Body::Stream(slot) => {
                let mut stream = slot
                    .lock()
                    .take()
                    .ok_or_else(|| FetchMockError::Body("body already used".to_string()))?;
                let mut buffer = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(|e| FetchMockError::Body(e.to_string()))?;
                    buffer.extend_from_slice(&chunk);
                }
                Ok(buffer.freeze())
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Body::Empty"),
            Body::Full(bytes) => f.debug_tuple("Body::Full").field(bytes).finish(),
            Body::Stream(_) => f.write_str("Body::Stream(..)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Full(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Full(Bytes::from(text))
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Full(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Full(Bytes::from(bytes))
    }
}
