//
// buffer.rs - Read-Side Byte Buffer
//
// Purpose:
//   A growable byte buffer used on the stream-receive path to batch small
//   reads. One chunked recv syscall fills the buffer; subsequent recv calls
//   with small maxlen drain it without touching the kernel.
//
// How it works:
//   Bytes live in a Vec with a consume offset. fill_from() appends up to one
//   chunk read straight off the descriptor; take() drains from the front and
//   resets the storage once fully consumed. The raw syscall result is handed
//   back untouched so the caller classifies 0 (peer shutdown) and -1 (errno)
//   itself.
//

use std::os::fd::RawFd;

/// Bytes pulled off the descriptor per fill.
pub const CHUNK: usize = 8192;

/// Growable FIFO byte buffer over a consume offset.
#[derive(Debug, Default)]
pub struct ReadBuffer {
    data: Vec<u8>,
    start: usize,
}

impl ReadBuffer {
    pub fn new() -> Self {
        ReadBuffer::default()
    }

    pub fn len(&self) -> usize {
        self.data.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains up to `max` bytes from the front.
    ///
    /// Storage is reset (not shrunk) once everything buffered has been
    /// consumed, so the allocation is reused across fills.
    pub fn take(&mut self, max: usize) -> Vec<u8> {
        let n = max.min(self.len());
        let out = self.data[self.start..self.start + n].to_vec();
        self.start += n;
        if self.start == self.data.len() {
            self.data.clear();
            self.start = 0;
        }
        out
    }

    /// Appends up to [`CHUNK`] bytes read from `fd` with one recv syscall.
    ///
    /// Returns the raw syscall result: positive byte count, `0` on orderly
    /// peer shutdown, `-1` with errno set on failure. The buffer only grows
    /// by the bytes actually received.
    pub fn fill_from(&mut self, fd: RawFd) -> isize {
        let old = self.data.len();
        self.data.resize(old + CHUNK, 0);
        let rc = unsafe {
            libc::recv(
                fd,
                self.data[old..].as_mut_ptr() as *mut libc::c_void,
                CHUNK,
                0,
            )
        };
        let got = if rc > 0 { rc as usize } else { 0 };
        self.data.truncate(old + got);
        rc
    }
}
