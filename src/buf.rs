use {
    crate::{
        error::Result,
        io::{read_full, Read},
        BLOCK_SIZE,
    },
    alloc::vec::Vec,
    core::{cmp, ops::Drop},
    zeroize::Zeroize,
};

/// A fixed-length buffer.
#[derive(Clone, Debug)]
pub(crate) struct Buf<const N: usize> {
    /// Contents are data[..len].
    data: [u8; N],
    len: usize,
}

impl<const N: usize> Default for Buf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Buf<N> {
    pub const fn new() -> Self {
        Self {
            data: [0u8; N],
            len: 0,
        }
    }

    /// Reports whether the buffer is full and no more data can
    /// be written.
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Resets the buffer to empty.
    pub fn reset(&mut self) {
        self.data.zeroize();
        self.len = 0;
    }

    /// Returns the buffered bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Reads from `src` until the buffer is full or `src`
    /// reaches EOF.
    pub fn read_from<R: Read + ?Sized>(
        &mut self,
        src: &mut R,
    ) -> Result<usize> {
        let n = read_full(src, &mut self.data[self.len..])?;
        self.len += n;
        Ok(n)
    }

    /// Moves the buffered bytes onto the end of `dst`.
    pub fn drain_into(&mut self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(self.as_slice());
        self.reset();
    }
}

impl<const N: usize> Drop for Buf<N> {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

/// A run of bytes pulled from the source.
///
/// Interior chunks are always a non-zero multiple of
/// [`BLOCK_SIZE`] and are known to be followed by at least one
/// more block. The final chunk holds everything up to EOF: a
/// block-aligned body followed by a tail of `len % BLOCK_SIZE`
/// bytes.
#[derive(Debug)]
pub(crate) struct Chunk {
    pub data: Vec<u8>,
    pub is_final: bool,
}

impl Chunk {
    /// Length of the block-aligned prefix.
    pub fn body_len(&self) -> usize {
        self.data.len() - self.data.len() % BLOCK_SIZE
    }

    /// The bytes after the block-aligned prefix.
    pub fn tail(&self) -> &[u8] {
        &self.data[self.body_len()..]
    }
}

/// Splits a source into block-aligned chunks while holding back
/// at most one block, so the final chunk can be told apart from
/// an interior one without knowing the source's length.
#[derive(Debug, Default)]
pub(crate) struct Lookahead {
    carry: Buf<BLOCK_SIZE>,
}

impl Lookahead {
    pub const fn new() -> Self {
        Self { carry: Buf::new() }
    }

    /// Forgets any carried bytes.
    pub fn reset(&mut self) {
        self.carry.reset();
    }

    /// Pulls at least `min` bytes (rounded up to a whole number
    /// of blocks, never less than one block) from `src`, unless
    /// `src` ends first.
    pub fn fill<R: Read + ?Sized>(
        &mut self,
        src: &mut R,
        min: usize,
    ) -> Result<Chunk> {
        let want = round_up(min.max(1));
        let mut data =
            Vec::with_capacity(cmp::min(want, READ_WINDOW) + BLOCK_SIZE);
        self.carry.drain_into(&mut data);

        // Grow one window at a time so a large `min` over a short
        // source only costs what the source actually holds.
        while data.len() < want {
            let have = data.len();
            let n = cmp::min(want - have, READ_WINDOW);
            data.resize(have + n, 0);
            let got = read_full(src, &mut data[have..])?;
            data.truncate(have + got);
            if got < n {
                break;
            }
        }

        if data.len() % BLOCK_SIZE != 0 {
            // Short read, so this is the end.
            return Ok(Chunk {
                data,
                is_final: true,
            });
        }

        // Block-aligned: read ahead one more block.
        self.carry.read_from(src)?;
        if self.carry.is_full() {
            return Ok(Chunk {
                data,
                is_final: false,
            });
        }
        self.carry.drain_into(&mut data);
        Ok(Chunk {
            data,
            is_final: true,
        })
    }
}

/// The most bytes [`Lookahead::fill`] reserves ahead of a read.
const READ_WINDOW: usize = 64 * 1024;

/// Rounds `n` up to a multiple of [`BLOCK_SIZE`].
pub(crate) const fn round_up(n: usize) -> usize {
    n.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}
