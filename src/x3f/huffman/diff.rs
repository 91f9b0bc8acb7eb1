use crate::x3f::huffman::bit_reader::BitReader;
use crate::x3f::huffman::tree::HuffmanTree;

/// Legacy tables store the difference itself as the leaf value.
pub fn legacy_diff(reader: &mut BitReader<'_>, tree: &HuffmanTree) -> i32 {
    tree.decode_symbol(reader).map_or(0, |leaf| leaf as i32)
}

/// TRUE-engine difference: the leaf is a bit count `n`, followed by `n`
/// magnitude bits. A leading zero bit marks a negative value offset by
/// `2^n - 1`.
pub fn true_diff(reader: &mut BitReader<'_>, tree: &HuffmanTree) -> i32 {
    let Some(leaf) = tree.decode_symbol(reader) else {
        return 0;
    };
    let bits = u32::from(leaf as u8);
    if bits == 0 {
        return 0;
    }

    let first = i32::from(reader.bit());
    let mut diff = first;
    for _ in 1..bits {
        diff = diff.wrapping_shl(1).wrapping_add(i32::from(reader.bit()));
    }
    if first == 0 {
        let span = 1i32.checked_shl(bits).unwrap_or(0).wrapping_sub(1);
        diff = diff.wrapping_sub(span);
    }
    diff
}
