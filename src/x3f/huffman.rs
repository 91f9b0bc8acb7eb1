//! Huffman decoding primitives
//!
//! Bit cursor, arena decode tree and the two difference decoders shared by
//! the image codecs and the CAMF Huffman schemes.

mod bit_reader;
mod diff;
mod tree;


pub use bit_reader::BitReader;
pub use diff::{legacy_diff, true_diff};
pub use tree::{HuffmanTree, TrueCode};

/// Reads `(code_size, code)` pairs up to and including the first entry with
/// a zero code size. Returns the table (terminator excluded) and the number
/// of bytes consumed. A table cut short by the end of `data` is returned as
/// read so far, with `terminated == false`.
pub fn read_true_table(data: &[u8]) -> (Vec<TrueCode>, usize, bool) {
    let mut table = Vec::new();
    for (index, pair) in data.chunks_exact(2).enumerate() {
        if pair[0] == 0 {
            return (table, (index + 1) * 2, true);
        }
        table.push(TrueCode {
            code_size: pair[0],
            code: pair[1],
        });
    }
    let consumed = table.len() * 2;
    (table, consumed, false)
}
