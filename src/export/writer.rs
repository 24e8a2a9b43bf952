//! Append-only binary writer for the glTF buffer payload.

/// Sequential little-endian byte sink.
///
/// Storage grows geometrically ahead of the cursor; only the bytes in
/// `[0, byte_offset)` are ever handed out.
#[derive(Debug, Clone)]
pub struct BinaryWriter {
    buffer: Vec<u8>,
    byte_offset: usize,
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl BinaryWriter {
    /// Create a writer with `capacity` bytes preallocated.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            byte_offset: 0,
        }
    }

    /// Number of bytes written so far.
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// The bytes written so far, without trailing spare capacity.
    pub fn output_data(&self) -> &[u8] {
        &self.buffer[..self.byte_offset]
    }

    /// Consume the writer and return exactly the bytes written.
    pub fn into_output_data(mut self) -> Vec<u8> {
        self.buffer.truncate(self.byte_offset);
        self.buffer
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.buffer[self.byte_offset..self.byte_offset + bytes.len()].copy_from_slice(bytes);
        self.byte_offset += bytes.len();
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Zero-fill up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        let padding = (alignment - self.byte_offset % alignment) % alignment;
        for _ in 0..padding {
            self.write_u8(0);
        }
    }

    fn reserve(&mut self, additional: usize) {
        let needed = self.byte_offset + additional;
        if needed <= self.buffer.len() {
            return;
        }
        let mut new_len = self.buffer.len().max(1);
        while new_len < needed {
            new_len *= 2;
        }
        self.buffer.resize(new_len, 0);
    }
}
