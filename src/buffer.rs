// Growable append-only byte buffer with geometric capacity growth, as used
// for both the per-connection read and write staging areas.

const DEFAULT_CAPACITY: usize = 4096;

pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity.max(1)),
        }
    }

    /// Append `bytes` to the buffer, growing capacity geometrically (≥2x)
    /// if needed. A zero-length append is a no-op failure.
    pub fn append(&mut self, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return false;
        }
        let needed = self.data.len() + bytes.len();
        if needed > self.data.capacity() {
            let mut new_capacity = self.data.capacity().max(1) * 2;
            while new_capacity < needed {
                new_capacity *= 2;
            }
            self.data.reserve(new_capacity - self.data.len());
        }
        self.data.extend_from_slice(bytes);
        true
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Reset length to zero without releasing the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Drop the first `n` bytes, shifting the remainder down to index 0.
    /// Used after a partial write to keep the undrained tail at the front.
    pub fn consume(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        if n >= self.data.len() {
            self.data.clear();
            return;
        }
        self.data.drain(0..n);
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_grows_len_and_preserves_bytes() {
        let mut buf = Buffer::new();
        assert!(buf.append(b"hello"));
        assert!(buf.append(b" world"));
        assert_eq!(buf.as_slice(), b"hello world");
        assert_eq!(buf.len(), 11);
    }

    #[test]
    fn append_doubles_capacity_past_initial_size() {
        let mut buf = Buffer::with_capacity(4);
        let initial_cap = buf.capacity();
        buf.append(b"abcdefghij");
        assert!(buf.capacity() >= initial_cap * 2 || buf.capacity() >= 10);
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn zero_length_append_is_a_no_op() {
        let mut buf = Buffer::new();
        assert!(!buf.append(b""));
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn consume_shifts_remaining_bytes_to_front() {
        let mut buf = Buffer::new();
        buf.append(b"0123456789");
        buf.consume(4);
        assert_eq!(buf.as_slice(), b"456789");
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn consume_past_end_clears() {
        let mut buf = Buffer::new();
        buf.append(b"abc");
        buf.consume(100);
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn clear_preserves_capacity() {
        let mut buf = Buffer::with_capacity(64);
        buf.append(b"abc");
        let cap = buf.capacity();
        buf.clear();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), cap);
    }
}
