use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

/// Seekable cursor over an in-memory byte buffer.
///
/// Binary container readers need `Read + Seek`; input records arrive as
/// byte slices. The buffer is shared, so [`SeekableBytes::new_stream`]
/// hands out independent cursors without copying.
#[derive(Debug, Clone)]
pub struct SeekableBytes {
    data: Arc<[u8]>,
    pos: u64,
}

impl SeekableBytes {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into(), pos: 0 }
    }

    pub fn length(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Fresh cursor at offset 0 over the same buffer.
    pub fn new_stream(&self) -> Self {
        Self { data: Arc::clone(&self.data), pos: 0 }
    }

    fn remaining(&self) -> &[u8] {
        let start = usize::try_from(self.pos).unwrap_or(usize::MAX).min(self.data.len());
        &self.data[start..]
    }
}

impl Read for SeekableBytes {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.remaining().read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for SeekableBytes {
    fn seek(&mut self, target: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match target {
            SeekFrom::Start(n) => {
                self.pos = n;
                return Ok(n);
            }
            SeekFrom::End(n) => (self.length(), n),
            SeekFrom::Current(n) => (self.pos, n),
        };
        match base.checked_add_signed(offset) {
            Some(n) => {
                self.pos = n;
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}
