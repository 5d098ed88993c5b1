use blobkeep_core::{Error, Result};
use bytes::Bytes;
use std::io::Cursor;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

/// A readable payload that knows its length before the first byte is read.
///
/// Ownership moves into [`BlockStore::put_block`](crate::BlockStore::put_block);
/// the underlying buffer or file handle is released when the reader is dropped.
pub trait BlockReader: AsyncRead + Send + Unpin {
    /// Exact number of bytes produced by reading to the end. Never changes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct BytesReader {
    inner: Cursor<Bytes>,
}

impl BytesReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            inner: Cursor::new(data.into()),
        }
    }

    pub fn boxed(data: impl Into<Bytes>) -> Box<dyn BlockReader> {
        Box::new(Self::new(data))
    }
}

impl AsyncRead for BytesReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl BlockReader for BytesReader {
    fn len(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }
}

/// Streams a block from a file; the length is the file size at open time.
pub struct FileReader {
    file: File,
    len: u64,
}

impl FileReader {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).await?;
        let len = file.metadata().await?.len();
        Ok(Self { file, len })
    }
}

impl AsyncRead for FileReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

impl BlockReader for FileReader {
    fn len(&self) -> u64 {
        self.len
    }
}

const MAX_PREALLOCATION: u64 = 8 * 1024 * 1024;

/// Reads exactly the declared length, rejecting short and over-long payloads.
/// The reader is dropped before returning on every path.
pub async fn read_declared(reader: Box<dyn BlockReader>) -> Result<Bytes> {
    let expected = reader.len();
    // Declared lengths are untrusted until the bytes arrive.
    let mut buf = Vec::with_capacity(expected.min(MAX_PREALLOCATION) as usize);
    let mut limited = reader.take(expected);
    limited.read_to_end(&mut buf).await?;

    let actual = buf.len() as u64;
    if actual < expected {
        return Err(Error::LengthMismatch { expected, actual });
    }

    let mut rest = limited.into_inner();
    let mut extra = [0u8; 1];
    if rest.read(&mut extra).await? > 0 {
        return Err(Error::LengthMismatch {
            expected,
            actual: expected.saturating_add(1),
        });
    }

    Ok(Bytes::from(buf))
}
