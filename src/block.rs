use std::{fmt, mem, ptr::NonNull};

use crate::list::Node;

/// Bytes set aside for a block's diagnostic label, including the
/// terminator.
pub(crate) const NAME_CAPACITY: usize = 32;

/// Size of a full block header as it sits in memory: the list's link fields
/// plus [`Block`]'s own fields. Every block — free or used — pays this
/// overhead.
pub(crate) const BLOCK_HEADER_SIZE: usize = mem::size_of::<Node<Block>>();

/// Metadata carried at the start of every block. The payload starts
/// immediately after. `prev`/`next` live one level up, in the enclosing
/// [`Node`].
///
/// ```text
/// +----------------+    +
/// |      size      |    |
/// +----------------+    |
/// |   free (1b)    |    | -> header (Node<Block>)
/// +----------------+    |
/// |   region_id    |    |
/// +----------------+    |
/// |      name      |    |
/// +----------------+    +
/// |     payload    |
/// +----------------+
/// ```
pub(crate) struct Block {
    pub size: usize,
    pub free: bool,
    pub region_id: u64,
    pub name: [u8; NAME_CAPACITY],
}

impl Block {
    pub fn new(size: usize, free: bool, region_id: u64) -> Self {
        Self {
            size,
            free,
            region_id,
            name: [0; NAME_CAPACITY],
        }
    }

    /// Overwrites the label with `label`, truncated to fit, always
    /// nul-terminated.
    pub fn set_label(&mut self, label: &str) {
        self.name = [0; NAME_CAPACITY];
        let bytes = label.as_bytes();
        let n = bytes.len().min(NAME_CAPACITY - 1);
        self.name[..n].copy_from_slice(&bytes[..n]);
    }

    /// Formats `args` directly into the fixed-size label buffer. Unlike
    /// [`Block::set_label`], this never builds an intermediate `String`, so
    /// it is safe to call from inside the allocator's own hot path even
    /// when this crate is installed as the process's global allocator.
    pub fn set_label_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.name = [0; NAME_CAPACITY];
        let mut writer = FixedWriter {
            buf: &mut self.name,
            len: 0,
        };
        let _ = fmt::Write::write_fmt(&mut writer, args);
    }

    pub fn label(&self) -> &str {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        std::str::from_utf8(&self.name[..end]).unwrap_or("")
    }
}

/// Writes into a `[u8; NAME_CAPACITY]` slot, silently truncating once it
/// runs out of room, and never allocating. Backs [`Block::set_label_fmt`].
struct FixedWriter<'a> {
    buf: &'a mut [u8; NAME_CAPACITY],
    len: usize,
}

impl fmt::Write for FixedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let capacity = NAME_CAPACITY - 1;
        let room = capacity.saturating_sub(self.len);
        let n = s.len().min(room);
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}

/// Address of a block's payload, given the address of its header.
#[inline]
pub(crate) unsafe fn payload_ptr(header: NonNull<Node<Block>>) -> NonNull<u8> {
    unsafe { NonNull::new_unchecked((header.as_ptr() as *mut u8).add(BLOCK_HEADER_SIZE)) }
}

/// Recovers a block header from a payload pointer this allocator previously
/// handed out. The caller-opaque contract is that the bytes immediately
/// preceding `payload` form a valid header of exactly [`BLOCK_HEADER_SIZE`]
/// bytes — never a literal offset.
#[inline]
pub(crate) unsafe fn header_from_payload(payload: NonNull<u8>) -> NonNull<Node<Block>> {
    unsafe { NonNull::new_unchecked(payload.as_ptr().sub(BLOCK_HEADER_SIZE)).cast() }
}

/// Address one byte past the end of a block, given its header.
#[inline]
pub(crate) unsafe fn block_end(header: NonNull<Node<Block>>) -> *mut u8 {
    unsafe { (header.as_ptr() as *mut u8).add(header.as_ref().data.size) }
}
