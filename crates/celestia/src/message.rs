//! Namespaced messages and their share framing.
//!
//! A message is written as `uvarint(len) || data` across consecutive shares
//! that all carry the message's namespace tag; the last share is zero padded
//! and the next message starts on a fresh share. A share whose length prefix
//! reads as zero is padding.

use dalc_types::{NamespaceId, RollupBlock, Share, MESSAGE_SHARE_DATA_SIZE};

use crate::square::merkle_root;
use crate::{DaError, Result};

/// A namespaced message as stored in the DA layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Namespace tag.
    pub namespace: NamespaceId,
    /// Message payload.
    pub data: Vec<u8>,
}

impl Message {
    /// Create a message.
    #[must_use]
    pub fn new(namespace: NamespaceId, data: Vec<u8>) -> Self {
        Self { namespace, data }
    }

    /// Split this message into shares.
    #[must_use]
    pub fn to_shares(&self) -> Vec<Share> {
        let mut framed = Vec::with_capacity(self.data.len() + 10);
        write_uvarint(self.data.len() as u64, &mut framed);
        framed.extend_from_slice(&self.data);

        framed
            .chunks(MESSAGE_SHARE_DATA_SIZE)
            .filter_map(|chunk| Share::new(self.namespace, chunk))
            .collect()
    }
}

/// Encode a rollup block as message data.
///
/// # Errors
///
/// Returns an error if the block cannot be serialized.
pub fn encode_block(block: &RollupBlock) -> Result<Vec<u8>> {
    bincode::serialize(block).map_err(|e| DaError::EncodeFailed(e.to_string()))
}

/// Decode message data back to a rollup block.
///
/// # Errors
///
/// Returns an error if the data is not a serialized block.
pub fn decode_block(data: &[u8]) -> Result<RollupBlock> {
    bincode::deserialize(data).map_err(|e| DaError::DecodeFailed(e.to_string()))
}

/// Split messages into shares, in order.
#[must_use]
pub fn split_messages(messages: &[Message]) -> Vec<Share> {
    messages.iter().flat_map(Message::to_shares).collect()
}

/// Reassemble messages from an ordered run of shares.
///
/// # Errors
///
/// Returns [`DaError::Consistency`] if a length prefix is malformed, or a
/// message is cut short by a namespace change or the end of the shares.
pub fn parse_messages(shares: &[Share]) -> Result<Vec<Message>> {
    let mut messages = Vec::new();
    let mut i = 0;

    while i < shares.len() {
        let first = &shares[i];
        let namespace = first.namespace();
        let (len, prefix) = read_uvarint(first.data())?;
        i += 1;

        if len == 0 {
            continue;
        }

        let capacity = (shares.len() - i + 1) * MESSAGE_SHARE_DATA_SIZE;
        let len = usize::try_from(len)
            .ok()
            .filter(|len| *len <= capacity)
            .ok_or_else(|| {
                DaError::Consistency(format!(
                    "message length {len} exceeds the {capacity} bytes left in the share run"
                ))
            })?;

        let mut data = Vec::with_capacity(len);
        take_into(&mut data, &first.data()[prefix..], len);

        while data.len() < len {
            let Some(next) = shares.get(i) else {
                return Err(DaError::Consistency(format!(
                    "message truncated: expected {len} bytes, got {}",
                    data.len()
                )));
            };
            if next.namespace() != namespace {
                return Err(DaError::Consistency(format!(
                    "message in namespace {namespace} interrupted by namespace {}",
                    next.namespace()
                )));
            }
            take_into(&mut data, next.data(), len);
            i += 1;
        }

        messages.push(Message { namespace, data });
    }

    Ok(messages)
}

/// Commitment to a message's shares laid out in rows of `square_size` shares.
///
/// Each row is reduced to the merkle root of its share hashes; the commitment
/// is the merkle root of the row roots.
#[must_use]
pub fn share_commitment(shares: &[Share], square_size: u64) -> [u8; 32] {
    let width = usize::try_from(square_size.max(1)).unwrap_or(usize::MAX);
    let row_roots: Vec<[u8; 32]> = shares
        .chunks(width)
        .map(|row| merkle_root(row.iter().map(Share::as_bytes)))
        .collect();
    merkle_root(row_roots.iter().map(<[u8; 32]>::as_slice))
}

fn take_into(out: &mut Vec<u8>, src: &[u8], len: usize) {
    let n = (len - out.len()).min(src.len());
    out.extend_from_slice(&src[..n]);
}

/// Append `value` as an unsigned LEB128 varint.
fn write_uvarint(mut value: u64, out: &mut Vec<u8>) {
    while value > 0x7F {
        out.push(0x80 | (value & 0x7F) as u8);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Read an unsigned LEB128 varint, returning the value and bytes consumed.
fn read_uvarint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, byte) in buf.iter().enumerate().take(10) {
        let data = u64::from(byte & 0x7F);
        let shift = 7 * i as u32;
        if shift == 63 && data > 1 {
            return Err(DaError::Consistency("length prefix overflows u64".into()));
        }
        value |= data << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(DaError::Consistency("unterminated length prefix".into()))
}
