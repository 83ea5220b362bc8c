//! The per-object source slot and its growable write buffer.
//!
//! The slot serves both directions of the pipeline: after a read it holds
//! the raw bytes the parser consumes, during a write it is the sink the
//! serializer appends to. Closing the slot releases the bytes either way.

use std::fmt;

use lode_types::{ObjectKind, RawObject};

/// Initial capacity of a freshly prepared write buffer.
const INITIAL_CAPACITY: usize = 4096;

/// Growable byte sink used by object serializers.
///
/// Capacity doubles whenever an append would reach it, so a serializer can
/// stream output without sizing anything up front. Formatted appends go
/// through [`std::fmt::Write`] and grow the same way, re-rendering is never
/// needed.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    data: Vec<u8>,
}

impl WriteBuffer {
    /// An empty buffer with no backing allocation.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// An empty buffer pre-sized for a typical object serialization.
    pub fn with_initial_capacity() -> Self {
        Self {
            data: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Wrap existing bytes (the as-read direction of the slot).
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Append raw bytes, growing capacity as needed.
    pub fn write(&mut self, bytes: &[u8]) {
        self.grow_for(bytes.len());
        self.data.extend_from_slice(bytes);
    }

    /// Append formatted text. Infallible: the sink always accepts.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) {
        fmt::Write::write_fmt(self, args).expect("writes to a byte buffer cannot fail");
    }

    /// Bytes written so far.
    pub fn written(&self) -> usize {
        self.data.len()
    }

    /// Current capacity, for growth-schedule introspection.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// View of the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Take the written bytes, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    fn grow_for(&mut self, extra: usize) {
        let mut target = self.data.capacity().max(INITIAL_CAPACITY);
        while self.data.len() + extra >= target {
            target *= 2;
        }
        if target > self.data.capacity() {
            self.data.reserve_exact(target - self.data.len());
        }
    }
}

impl fmt::Write for WriteBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes());
        Ok(())
    }
}

/// The source slot embedded in every object.
#[derive(Debug)]
pub(crate) struct Source {
    kind: ObjectKind,
    buf: WriteBuffer,
    open: bool,
}

impl Source {
    /// A closed slot stamped with an object kind.
    pub fn for_kind(kind: ObjectKind) -> Self {
        Self {
            kind,
            buf: WriteBuffer::new(),
            open: false,
        }
    }

    /// Install as-read raw bytes and open the slot.
    pub fn open_read(raw: RawObject) -> Self {
        Self {
            kind: raw.kind,
            buf: WriteBuffer::from_vec(raw.data),
            open: true,
        }
    }

    /// Discard any prior buffer and open a fresh write buffer.
    pub fn prepare_write(&mut self, kind: ObjectKind) {
        self.kind = kind;
        self.buf = WriteBuffer::with_initial_capacity();
        self.open = true;
    }

    /// The stamped object kind.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Whether the slot currently holds meaningful bytes.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The bytes currently in the slot.
    pub fn bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Mutable access to the write buffer for serializers.
    pub fn writer(&mut self) -> &mut WriteBuffer {
        &mut self.buf
    }

    /// Take the written bytes out of an open slot, trimmed to what was
    /// actually written.
    pub fn take_written(&mut self) -> Vec<u8> {
        self.buf.take()
    }

    /// Release the slot's bytes and mark it closed.
    pub fn close(&mut self) {
        self.buf = WriteBuffer::new();
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_buffer_starts_at_initial_capacity() {
        let buf = WriteBuffer::with_initial_capacity();
        assert_eq!(buf.capacity(), INITIAL_CAPACITY);
        assert_eq!(buf.written(), 0);
    }

    #[test]
    fn appends_accumulate() {
        let mut buf = WriteBuffer::with_initial_capacity();
        buf.write(b"hello ");
        buf.write(b"world");
        assert_eq!(buf.as_slice(), b"hello world");
        assert_eq!(buf.written(), 11);
    }

    #[test]
    fn capacity_doubles_before_a_filling_append() {
        let mut buf = WriteBuffer::with_initial_capacity();
        buf.write(&vec![0u8; INITIAL_CAPACITY]);
        assert!(buf.capacity() >= INITIAL_CAPACITY * 2);
        assert_eq!(buf.written(), INITIAL_CAPACITY);
    }

    #[test]
    fn large_append_grows_in_one_step() {
        let mut buf = WriteBuffer::with_initial_capacity();
        buf.write(&vec![7u8; INITIAL_CAPACITY * 5]);
        assert_eq!(buf.written(), INITIAL_CAPACITY * 5);
        assert!(buf.capacity() > INITIAL_CAPACITY * 5);
    }

    #[test]
    fn resize_preserves_written_bytes() {
        let mut buf = WriteBuffer::with_initial_capacity();
        buf.write(b"prefix-");
        buf.write(&vec![b'x'; INITIAL_CAPACITY * 2]);
        assert_eq!(&buf.as_slice()[..7], b"prefix-");
        assert_eq!(buf.written(), 7 + INITIAL_CAPACITY * 2);
    }

    #[test]
    fn formatted_appends() {
        let mut buf = WriteBuffer::with_initial_capacity();
        write!(buf, "tree {}\n", "a".repeat(40));
        write!(buf, "parent count {}\n", 2);
        let text = String::from_utf8(buf.take()).unwrap();
        assert!(text.starts_with("tree aaaa"));
        assert!(text.ends_with("count 2\n"));
    }

    #[test]
    fn formatted_append_larger_than_capacity() {
        let mut buf = WriteBuffer::with_initial_capacity();
        let long = "y".repeat(INITIAL_CAPACITY * 3);
        write!(buf, "{long}");
        assert_eq!(buf.written(), INITIAL_CAPACITY * 3);
    }

    #[test]
    fn slot_read_lifecycle() {
        let raw = RawObject::new(ObjectKind::Blob, b"payload".to_vec());
        let mut slot = Source::open_read(raw);
        assert!(slot.is_open());
        assert_eq!(slot.kind(), ObjectKind::Blob);
        assert_eq!(slot.bytes(), b"payload");

        slot.close();
        assert!(!slot.is_open());
        assert!(slot.bytes().is_empty());
    }

    #[test]
    fn prepare_write_discards_prior_bytes() {
        let raw = RawObject::new(ObjectKind::Tag, b"old bytes".to_vec());
        let mut slot = Source::open_read(raw);
        slot.prepare_write(ObjectKind::Tag);
        assert!(slot.is_open());
        assert_eq!(slot.bytes(), b"");
        assert_eq!(slot.writer().capacity(), INITIAL_CAPACITY);

        slot.writer().write(b"new bytes");
        assert_eq!(slot.take_written(), b"new bytes");
    }
}
