//! Image bytes accepted by the OCR provider.

use std::fmt;

use bytes::Bytes;

use crate::{Error, Result};

/// Largest image the provider accepts: 20 MiB.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Raw bytes of an encoded image, validated against the provider's limits.
///
/// A payload is never empty and never larger than [`MAX_IMAGE_BYTES`], so
/// holding one means the request may be attempted. Cloning is cheap because
/// the bytes are reference counted.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Bytes,
}

impl ImagePayload {
    /// Validates `bytes` and wraps them.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidPayload`](crate::ErrorKind::InvalidPayload) error
    /// when `bytes` is empty or longer than [`MAX_IMAGE_BYTES`].
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();

        if bytes.is_empty() {
            return Err(Error::invalid_payload().with_message("image is empty"));
        }

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(Error::invalid_payload().with_message(format!(
                "image is {} bytes, limit is {} bytes",
                bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }

        Ok(Self { bytes })
    }

    /// Returns the image size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; kept for parity with `len`.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns a cheap clone of the underlying buffer.
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl AsRef<[u8]> for ImagePayload {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_empty_payload_rejected() {
        let err = ImagePayload::new(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let err = ImagePayload::new(vec![0u8; MAX_IMAGE_BYTES + 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
    }

    #[test]
    fn test_boundary_sizes_accepted() {
        assert_eq!(ImagePayload::new(vec![0xFF]).unwrap().len(), 1);
        assert_eq!(
            ImagePayload::new(vec![0u8; MAX_IMAGE_BYTES]).unwrap().len(),
            MAX_IMAGE_BYTES
        );
    }

    #[test]
    fn test_debug_hides_contents() {
        let payload = ImagePayload::new(vec![1, 2, 3]).unwrap();
        assert_eq!(format!("{payload:?}"), "ImagePayload { len: 3 }");
    }
}
