use std::cell::RefCell;
use std::io::{Cursor, Read, Result as IoResult, Write};
use std::process::Stdio;
use std::rc::Rc;

/// Memory-backed reader, used by tests that feed commands a fixed input.
pub struct MemReader {
    cursor: Cursor<Vec<u8>>,
}

impl MemReader {
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }
}

impl Read for MemReader {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(out)
    }
}

impl crate::command::Stdin for MemReader {
    /// An in-memory buffer has no OS handle to pass down, so a spawned child
    /// gets a closed stdin.
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::null()
    }
}

/// Memory-backed writer for capturing what a command prints.
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self {
            buf: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Create a writer together with a handle for reading the collected
    /// bytes after the command has consumed the writer.
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let writer = MemWriter::new();
        let handle = writer.buf.clone();
        (writer, handle)
    }
}

impl Default for MemWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl crate::command::Stdout for MemWriter {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::null()
    }
}
