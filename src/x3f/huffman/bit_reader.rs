/// MSB-first bit cursor that buffers one byte at a time.
///
/// Reading past the end yields zero bits forever; callers bound their loops
/// by pixel counts, never by stream length.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    current: u8,
    left: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            current: 0,
            left: 0,
        }
    }

    pub fn bit(&mut self) -> u8 {
        if self.left == 0 {
            let Some(&byte) = self.data.get(self.pos) else {
                return 0;
            };
            self.current = byte;
            self.pos += 1;
            self.left = 8;
        }
        self.left -= 1;
        (self.current >> self.left) & 1
    }

    /// Reads `count` bits (at most 32) as an unsigned big-endian value.
    pub fn bits(&mut self, count: u32) -> u32 {
        (0..count.min(32)).fold(0u32, |acc, _| (acc << 1) | u32::from(self.bit()))
    }

    pub fn is_exhausted(&self) -> bool {
        self.left == 0 && self.pos >= self.data.len()
    }

    pub fn bytes_consumed(&self) -> usize {
        self.pos
    }
}
