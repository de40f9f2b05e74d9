//! Fixed-width binary vector codec.
//!
//! Embedding vectors are stored as opaque blobs: each element is a 4-byte
//! little-endian IEEE-754 single-precision float, concatenated in sequence
//! order. Decoding reverses this; a blob whose length is not a multiple of 4
//! truncates the final partial element.

/// Encode a vector as a little-endian f32 byte blob.
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for v in vector {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a little-endian f32 byte blob back into a vector.
///
/// Trailing bytes that do not form a complete element are dropped.
pub fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
