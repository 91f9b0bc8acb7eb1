use tracing::{debug, trace};

use crate::x3f::common::bytes::u32_at;
use crate::x3f::common::error::{DecodeError, FormatError, Result};
use crate::x3f::container::tags;
use crate::x3f::huffman::{BitReader, HuffmanTree, read_true_table, true_diff};

pub const CAMF_HEADER_SIZE: usize = 28;

/// Bits of a Huffman-coded CAMF payload start this far into the payload,
/// after the code table and a `decoding_size` word at offset 28.
const HUFFMAN_BITS_OFFSET: usize = 32;

/// The 28-byte header in front of every CAMF payload.
///
/// Offsets 12..28 are reused: types 4 and 5 read them as decode parameters,
/// type 2 takes its key from offset 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CamfHeader {
    pub tag: u32,
    pub version: u32,
    pub camf_type: u32,
    pub decoded_size: u32,
    pub decode_bias: u32,
    pub block_size: u32,
    pub block_count: u32,
}

impl CamfHeader {
    pub fn parse(data: &[u8]) -> std::result::Result<Self, FormatError> {
        Ok(Self {
            tag: u32_at(data, 0, "CAMF header")?,
            version: u32_at(data, 4, "CAMF header")?,
            camf_type: u32_at(data, 8, "CAMF header")?,
            decoded_size: u32_at(data, 12, "CAMF header")?,
            decode_bias: u32_at(data, 16, "CAMF header")?,
            block_size: u32_at(data, 20, "CAMF header")?,
            block_count: u32_at(data, 24, "CAMF header")?,
        })
    }

    pub fn crypt_key(&self) -> u32 {
        self.block_count
    }
}

/// Obfuscation scheme selected by `camf_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CamfScheme {
    XorStream,
    Huffman12Bit,
    HuffmanAccumulator,
}

impl TryFrom<u32> for CamfScheme {
    type Error = DecodeError;

    fn try_from(camf_type: u32) -> std::result::Result<Self, Self::Error> {
        match camf_type {
            2 => Ok(CamfScheme::XorStream),
            4 => Ok(CamfScheme::Huffman12Bit),
            5 => Ok(CamfScheme::HuffmanAccumulator),
            other => Err(DecodeError::UnsupportedCamfType(other)),
        }
    }
}

/// Splits a raw CAMF section into its header and the deobfuscated buffer.
pub fn decrypt(section: &[u8]) -> Result<(CamfHeader, Vec<u8>)> {
    let header = CamfHeader::parse(section)?;
    if header.tag != tags::SECC && header.tag != tags::CAMF {
        debug!(tag = format_args!("{:#010x}", header.tag), "CAMF section without a SECc header");
    }
    let payload = &section[CAMF_HEADER_SIZE..];

    let scheme = CamfScheme::try_from(header.camf_type)?;
    debug!(
        camf_type = header.camf_type,
        payload = payload.len(),
        decoded_size = header.decoded_size,
        "Decrypting CAMF"
    );

    let decoded = match scheme {
        CamfScheme::XorStream => xor_stream(header.crypt_key(), payload),
        CamfScheme::Huffman12Bit => huffman_12bit(payload, &header)?,
        CamfScheme::HuffmanAccumulator => huffman_accumulator(payload, &header)?,
    };
    Ok((header, decoded))
}

/// Type 2: XOR with a keystream from a linear congruential generator.
/// Applying it twice restores the input.
pub fn xor_stream(key: u32, data: &[u8]) -> Vec<u8> {
    let mut key = key;
    data.iter()
        .map(|&byte| {
            key = key.wrapping_mul(1597).wrapping_add(51749) % 244_944;
            let tmp = ((u64::from(key) * 301_593_171) >> 24) as u32;
            let mask = (((key << 8).wrapping_sub(tmp) >> 1).wrapping_add(tmp)) >> 17;
            byte ^ mask as u8
        })
        .collect()
}

fn huffman_payload(payload: &[u8]) -> std::result::Result<(HuffmanTree, &[u8]), DecodeError> {
    if payload.len() <= HUFFMAN_BITS_OFFSET {
        return Err(DecodeError::CamfPayloadTooShort {
            needed: HUFFMAN_BITS_OFFSET,
            available: payload.len(),
        });
    }
    let (table, _, _) = read_true_table(payload);
    trace!(codes = table.len(), "CAMF Huffman table");
    let tree = HuffmanTree::from_true_table(&table);
    if tree.is_empty() {
        return Err(DecodeError::EmptyHuffmanTable);
    }
    Ok((tree, &payload[HUFFMAN_BITS_OFFSET..]))
}

/// Type 4: quadrant-predicted DPCM producing 12-bit values packed two per
/// three bytes.
pub fn huffman_12bit(payload: &[u8], header: &CamfHeader) -> std::result::Result<Vec<u8>, DecodeError> {
    let (tree, bits) = huffman_payload(payload)?;
    trace!(
        decoding_size = u32_at(payload, 28, "CAMF decoding size").unwrap_or(0),
        "CAMF type 4"
    );

    let mut out = vec![0u8; header.decoded_size as usize];
    let mut reader = BitReader::new(bits);
    let seed = header.decode_bias as i32;
    let mut row_start = [[seed; 2]; 2];
    let mut dst = 0usize;
    let mut odd_dst = false;

    'rows: for row in 0..header.block_count as usize {
        if dst >= out.len() {
            break;
        }
        let mut col_acc = [0i32; 2];
        for col in 0..header.block_size as usize {
            if dst >= out.len() {
                break 'rows;
            }
            let diff = true_diff(&mut reader, &tree);
            let prev = if col < 2 {
                row_start[row & 1][col & 1]
            } else {
                col_acc[col & 1]
            };
            let value = prev.wrapping_add(diff);
            col_acc[col & 1] = value;
            if col < 2 {
                row_start[row & 1][col & 1] = value;
            }

            if !odd_dst {
                out[dst] = ((value >> 4) & 0xff) as u8;
                dst += 1;
                if dst >= out.len() {
                    break 'rows;
                }
                out[dst] = ((value << 4) & 0xf0) as u8;
            } else {
                out[dst] |= ((value >> 8) & 0x0f) as u8;
                dst += 1;
                if dst >= out.len() {
                    break 'rows;
                }
                out[dst] = (value & 0xff) as u8;
                dst += 1;
            }
            odd_dst = !odd_dst;
        }
    }
    Ok(out)
}

/// Type 5: a single running accumulator, emitting its low byte per step.
pub fn huffman_accumulator(payload: &[u8], header: &CamfHeader) -> std::result::Result<Vec<u8>, DecodeError> {
    let (tree, bits) = huffman_payload(payload)?;
    let mut reader = BitReader::new(bits);
    let mut acc = header.decode_bias as i32;
    let out = (0..header.decoded_size)
        .map(|_| {
            acc = acc.wrapping_add(true_diff(&mut reader, &tree));
            (acc & 0xff) as u8
        })
        .collect();
    Ok(out)
}
