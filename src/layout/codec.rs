//! Layout codec
//!
//! Framing for the manifest: header, bincode body, CRC footer.

use crate::error::{Result, SparseError};

use super::{Layout, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Encode a layout into manifest bytes
pub fn encode(layout: &Layout) -> Result<Vec<u8>> {
    let body = bincode::serialize(layout)?;
    let body_len = u32::try_from(body.len())
        .map_err(|_| SparseError::Layout(format!("body too large: {} bytes", body.len())))?;

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&body);
    let crc = hasher.finalize();

    let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len() + FOOTER_SIZE);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&VERSION.to_le_bytes());
    bytes.extend_from_slice(&body_len.to_le_bytes());
    bytes.extend_from_slice(&body);
    bytes.extend_from_slice(&crc.to_le_bytes());

    Ok(bytes)
}

/// Decode and validate manifest bytes
pub fn decode(bytes: &[u8]) -> Result<Layout> {
    if bytes.len() < HEADER_SIZE + FOOTER_SIZE {
        return Err(SparseError::Layout(format!(
            "manifest too short: {} bytes",
            bytes.len()
        )));
    }

    if &bytes[0..4] != MAGIC {
        return Err(SparseError::Layout(format!(
            "Invalid layout magic: expected SFAL, got {:?}",
            &bytes[0..4]
        )));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(SparseError::Layout(format!(
            "Unsupported layout version: {}",
            version
        )));
    }

    let body_len = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    if bytes.len() != HEADER_SIZE + body_len + FOOTER_SIZE {
        return Err(SparseError::Layout(format!(
            "body length {} does not match manifest size {}",
            body_len,
            bytes.len()
        )));
    }

    let body = &bytes[HEADER_SIZE..HEADER_SIZE + body_len];
    let footer = &bytes[HEADER_SIZE + body_len..];
    let expected = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(body);
    let actual = hasher.finalize();

    if actual != expected {
        return Err(SparseError::Layout(format!(
            "CRC mismatch: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }

    Ok(bincode::deserialize(body)?)
}
