use tracing::warn;

use crate::x3f::huffman::bit_reader::BitReader;

/// One `(code_size, code)` pair of a TRUE-engine table. `code` is stored
/// left-aligned in its byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrueCode {
    pub code_size: u8,
    pub code: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Node {
    branch: [Option<u32>; 2],
    leaf: Option<u32>,
}

impl Node {
    fn is_branch(&self) -> bool {
        self.branch[0].is_some() || self.branch[1].is_some()
    }
}

/// Arena-allocated binary decode tree.
///
/// Nodes are handed out in insertion order from a fixed budget of
/// `2 * 2^bits - 1`; once the budget is spent further insertions are dropped,
/// matching how vendor tables are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    capacity: usize,
    conflicts: usize,
}

impl HuffmanTree {
    pub fn with_bits(bits: u32) -> Self {
        let capacity = (2usize << bits.min(24)) - 1;
        Self {
            nodes: vec![Node::default()],
            capacity,
            conflicts: 0,
        }
    }

    /// Builds an 8-bit tree from a TRUE table. The leaf value of entry `i`
    /// is `i`, which the TRUE diff decoder reads as a bit count.
    pub fn from_true_table(table: &[TrueCode]) -> Self {
        let mut tree = Self::with_bits(8);
        for (index, element) in table.iter().enumerate() {
            let length = u32::from(element.code_size);
            if length == 0 || length > 8 {
                continue;
            }
            let code = u32::from(element.code >> (8 - length));
            tree.insert(length, code, index as u32);
        }
        tree.report_conflicts("TRUE");
        tree
    }

    /// Builds a 16-bit tree from packed `(length:5, code:27)` words. Zero
    /// words are empty slots; the leaf is the slot index or `mapping[i]`
    /// when a mapping of the same length is supplied.
    pub fn from_legacy_table(words: &[u32], mapping: Option<&[u16]>) -> Self {
        let mapping = mapping.filter(|m| m.len() == words.len());
        let mut tree = Self::with_bits(16);
        for (index, &word) in words.iter().enumerate() {
            if word == 0 {
                continue;
            }
            let length = (word >> 27) & 0x1f;
            let code = word & 0x07ff_ffff;
            let value = mapping.map_or(index as u32, |m| u32::from(m[index]));
            tree.insert(length, code, value);
        }
        tree.report_conflicts("legacy");
        tree
    }

    /// Inserts the `length` low bits of `code`, MSB first.
    pub fn insert(&mut self, length: u32, code: u32, value: u32) {
        let mut node = 0usize;
        for i in (0..length).rev() {
            if self.nodes[node].leaf.is_some() {
                self.conflicts += 1;
            }
            let bit = ((code >> i.min(31)) & 1) as usize;
            let existing = self.nodes[node].branch[bit];
            let next = match existing {
                Some(next) => next as usize,
                None => match self.alloc() {
                    Some(next) => {
                        self.nodes[node].branch[bit] = Some(next as u32);
                        next
                    }
                    None => return,
                },
            };
            node = next;
        }
        let target = &mut self.nodes[node];
        if target.leaf.is_some() || target.is_branch() {
            self.conflicts += 1;
        }
        target.leaf = Some(value);
    }

    fn alloc(&mut self) -> Option<usize> {
        if self.nodes.len() >= self.capacity {
            return None;
        }
        self.nodes.push(Node::default());
        Some(self.nodes.len() - 1)
    }

    fn report_conflicts(&self, kind: &str) {
        if self.conflicts > 0 {
            warn!(
                conflicts = self.conflicts,
                "{} Huffman table is not prefix-free; decoding follows insertion order", kind
            );
        }
    }

    /// Follows bits until a node without branches. `None` means the stream
    /// hit a missing branch or a terminal node that never received a leaf.
    pub fn decode_symbol(&self, reader: &mut BitReader<'_>) -> Option<u32> {
        let mut node = &self.nodes[0];
        while node.is_branch() {
            let bit = reader.bit() as usize;
            node = &self.nodes[node.branch[bit]? as usize];
        }
        node.leaf
    }

    pub fn is_empty(&self) -> bool {
        !self.nodes[0].is_branch()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of insertions that landed on, or passed through, an existing
    /// leaf.
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }
}
