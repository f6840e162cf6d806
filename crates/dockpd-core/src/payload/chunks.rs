//! Fixed-page partitioning of a wrapped firmware buffer.
//!
//! The EC accepts one data page per transport write, so a wrapped buffer of
//! length `L` becomes `ceil(L / page_sz)` chunks covering `[0, L)` exactly
//! once, every chunk except possibly the last of full page length.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Chunk index {index} out of range (total {total})")]
    IndexOutOfRange { index: usize, total: usize },
}

/// One transport unit: a bounded slice of the wrapped buffer plus its
/// sequence index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    index: usize,
    bytes: &'a [u8],
}

impl<'a> Chunk<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The chunk set for one buffer at a fixed page size.
#[derive(Debug)]
pub struct ChunkArray<'a> {
    data: &'a [u8],
    page_sz: usize,
}

impl<'a> ChunkArray<'a> {
    /// Partition `data` into pages of at most `page_sz` bytes.
    ///
    /// `page_sz` must be non-zero.
    pub fn new(data: &'a [u8], page_sz: usize) -> Self {
        debug_assert!(page_sz > 0, "page size must be non-zero");
        Self { data, page_sz }
    }

    /// Number of chunks: `ceil(len / page_sz)`, zero for an empty buffer.
    pub fn len(&self) -> usize {
        self.data.len().div_ceil(self.page_sz)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Resolve the chunk at `index`.
    pub fn get(&self, index: usize) -> Result<Chunk<'a>, ChunkError> {
        let total = self.len();
        if index >= total {
            return Err(ChunkError::IndexOutOfRange { index, total });
        }
        let start = index * self.page_sz;
        let end = (start + self.page_sz).min(self.data.len());
        Ok(Chunk {
            index,
            bytes: &self.data[start..end],
        })
    }

    /// Iterate chunks in ascending sequence order.
    pub fn iter(&self) -> impl Iterator<Item = Chunk<'a>> + '_ {
        (0..self.len()).map(|i| {
            let start = i * self.page_sz;
            let end = (start + self.page_sz).min(self.data.len());
            Chunk {
                index: i,
                bytes: &self.data[start..end],
            }
        })
    }
}
