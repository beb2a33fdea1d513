use arrayvec::ArrayVec;

// Room for a couple of complete frames
const CAPACITY: usize = 64;

#[derive(Debug, Default)]
pub(crate) struct Buffer {
    data: ArrayVec<u8, CAPACITY>,
    read_pos: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len() - self.read_pos
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn consume(&mut self, len: usize) {
        assert!(len <= self.len());
        self.read_pos += len;
        if self.read_pos == self.data.len() {
            self.clear();
        }
    }

    /// Append `bytes`. When the buffer is full the oldest bytes are dropped.
    pub fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            if self.data.is_full() {
                if self.read_pos > 0 {
                    self.data.drain(..self.read_pos);
                    self.read_pos = 0;
                } else {
                    self.data.remove(0);
                }
            }
            self.data.push(*byte);
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.read_pos = 0;
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data[self.read_pos..]
    }
}
