/// A cursor over a byte buffer that never fails.
///
/// Reads past the end of the buffer are satisfied with zero bytes and mark the reader as
/// short. The cursor only ever moves forward and never beyond `data.len()`.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
    short: bool,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            short: false,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Whether any read so far asked for more bytes than were available.
    pub fn is_short(&self) -> bool {
        self.short
    }

    /// Reads `N` bytes. Missing bytes are zero, so a little-endian value is filled from its
    /// least-significant byte upward.
    pub fn read_array<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0u8; N];
        let available = std::cmp::min(N, self.remaining());
        bytes[..available].copy_from_slice(&self.data[self.position..self.position + available]);
        self.position += available;
        if available < N {
            self.short = true;
        }
        bytes
    }

    /// Records a shortfall detected by the caller, for values that synthesize a default
    /// instead of reading.
    pub fn mark_short(&mut self) {
        self.short = true;
    }

    pub fn read_u8(&mut self) -> u8 {
        let [byte] = self.read_array::<1>();
        byte
    }

    pub fn read_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.read_array())
    }

    /// Reads up to `len` bytes, returning fewer if the buffer ends first.
    pub fn read_bytes(&mut self, len: usize) -> &'a [u8] {
        let available = std::cmp::min(len, self.remaining());
        let bytes = &self.data[self.position..self.position + available];
        self.position += available;
        if available < len {
            self.short = true;
        }
        bytes
    }
}
