//! Immutable byte payload held by the cache.

use std::fmt;

use bytes::Bytes;

use crate::cache::lru::Weighted;

/// An immutable view over a cached value.
///
/// Cloning is cheap (reference counted). Callers can never mutate the cached
/// payload: [`ByteBuffer::to_vec`] hands out a fresh copy.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteBuffer {
    payload: Bytes,
}

impl ByteBuffer {
    /// Build a buffer by copying `data`.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            payload: Bytes::copy_from_slice(data),
        }
    }

    /// Number of bytes in the payload.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// An owned copy of the payload; mutating it leaves the cached value intact.
    pub fn to_vec(&self) -> Vec<u8> {
        self.payload.to_vec()
    }

    /// The payload decoded as UTF-8 (lossy).
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// A shared handle to the payload, suitable for an HTTP response body.
    pub(crate) fn to_bytes(&self) -> Bytes {
        self.payload.clone()
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self {
            payload: Bytes::from(data),
        }
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(payload: Bytes) -> Self {
        Self { payload }
    }
}

impl From<&str> for ByteBuffer {
    fn from(s: &str) -> Self {
        Self::copy_from_slice(s.as_bytes())
    }
}

impl fmt::Display for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.payload))
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.payload.len())
            .finish()
    }
}

impl Weighted for ByteBuffer {
    fn weight(&self) -> usize {
        self.len()
    }
}
