//! Command buffer: an owned byte region with a write cursor.

use tracing::debug;

use vramgov_core::BufferId;

/// Where a buffer came from. Tracked buffers return to the pool on release;
/// overflow buffers are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOrigin {
    Tracked { alloc_id: BufferId },
    Overflow,
}

/// Fixed-capacity reusable buffer for serialized command data. The pool never
/// interprets the contents.
#[derive(Debug)]
pub struct CommandBuffer {
    data: Vec<u8>,
    cursor: usize,
    origin: BufferOrigin,
}

impl CommandBuffer {
    pub(crate) fn with_capacity(size: usize, origin: BufferOrigin) -> Self {
        Self {
            data: vec![0; size],
            cursor: 0,
            origin,
        }
    }

    pub fn origin(&self) -> BufferOrigin {
        self.origin
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self.origin, BufferOrigin::Overflow)
    }

    /// Current write position.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn has_space(&self, len: usize) -> bool {
        self.cursor + len <= self.data.len()
    }

    /// Bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.cursor]
    }

    /// Rewind the cursor for reuse. Capacity is kept.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Append at the cursor. If capacity is insufficient the buffer doubles
    /// (or grows to `cursor + len` if that is larger) before copying. This is
    /// the only allocation permitted outside acquire/expand, and only on the
    /// cold path of an undersized buffer.
    pub fn write(&mut self, bytes: &[u8]) {
        if !self.has_space(bytes.len()) {
            let new_size = (self.data.len() * 2).max(self.cursor + bytes.len());
            self.data.resize(new_size, 0);
            debug!(new_size, "command buffer auto-expanded");
        }
        self.data[self.cursor..self.cursor + bytes.len()].copy_from_slice(bytes);
        self.cursor += bytes.len();
    }
}

#[cfg(test)]
mod tests {
    use super::{BufferOrigin, CommandBuffer};

    #[test]
    fn write_advances_cursor() {
        let mut buf = CommandBuffer::with_capacity(8, BufferOrigin::Overflow);
        buf.write(&[1, 2, 3]);
        assert_eq!(buf.position(), 3);
        assert_eq!(buf.remaining(), 5);
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn undersized_buffer_grows() {
        let mut buf = CommandBuffer::with_capacity(4, BufferOrigin::Overflow);
        buf.write(&[0xAB; 10]);
        assert!(buf.capacity() >= 10);
        assert_eq!(buf.as_slice(), &[0xAB; 10]);
    }

    #[test]
    fn reset_keeps_capacity() {
        let mut buf = CommandBuffer::with_capacity(4, BufferOrigin::Overflow);
        buf.write(&[0; 16]);
        let grown = buf.capacity();
        buf.reset();
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.capacity(), grown);
    }
}
