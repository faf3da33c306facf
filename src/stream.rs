use {
    crate::{
        decrypt::Decrypt,
        encrypt::Encrypt,
        error::{Error, Result},
        io::{Read, Rewind},
        keys::{MediaKeys, MediaType, DEFAULT_APP_INFO},
        session::{Phase, Session},
        BLOCK_SIZE, DEFAULT_CHUNK_SIZE,
    },
    alloc::{vec, vec::Vec},
    core::{cmp, marker::PhantomData},
};

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// The direction of a [`MediaStream`]: [`Encrypt`] or
/// [`Decrypt`].
///
/// This trait is sealed.
pub trait Direction: sealed::Sealed {
    /// Transforms at least `min` more bytes of output, or the
    /// final chunk, into the session's pending queue.
    #[doc(hidden)]
    fn refill<R: Read>(session: &mut Session<R>, min: usize) -> Result<()>;

    /// Predicts the total output length before the final chunk
    /// has been seen.
    #[doc(hidden)]
    fn output_len<R: Rewind>(source: &mut R) -> Result<Option<u64>>;
}

/// Options for configuring a [`MediaStream`].
#[derive(Clone, Copy, Debug)]
pub struct StreamOpts<'a> {
    app: &'a str,
    chunk_size: usize,
}

impl Default for StreamOpts<'_> {
    fn default() -> Self {
        StreamOpts::new()
    }
}

impl<'a> StreamOpts<'a> {
    /// Create the default set of options.
    pub const fn new() -> Self {
        Self {
            app: DEFAULT_APP_INFO,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the prefix of the HKDF 'info' parameter used when
    /// expanding the media key.
    ///
    /// By default, [`DEFAULT_APP_INFO`] is used.
    pub fn with_app_info(&mut self, app: &'a str) -> &mut Self {
        self.app = app;
        self
    }

    /// Set the read size used by [`MediaStream::contents`].
    ///
    /// It is never smaller than one block. By default,
    /// [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn with_chunk_size(&mut self, n: usize) -> &mut Self {
        self.chunk_size = n.max(BLOCK_SIZE);
        self
    }

    /// Build the options.
    pub fn build(self) -> Self {
        self
    }
}

/// A pull-based reader that encrypts or decrypts an underlying
/// source.
///
/// Use the [`EncryptStream`] and [`DecryptStream`] aliases.
pub struct MediaStream<R, D> {
    session: Session<R>,
    chunk_size: usize,
    _direction: PhantomData<D>,
}

/// Reads plaintext from `R` and produces `ciphertext || tag`.
pub type EncryptStream<R> = MediaStream<R, Encrypt>;

/// Reads `ciphertext || tag` from `R` and produces plaintext.
///
/// The tag is checked when the end of `R` is reached. Plaintext
/// released before then is not yet authenticated.
pub type DecryptStream<R> = MediaStream<R, Decrypt>;

impl<R, D: Direction> MediaStream<R, D> {
    /// Creates a [`MediaStream`] over `source` with keys
    /// expanded from `media_key`.
    pub fn new(
        source: R,
        media_key: &[u8],
        media_type: MediaType,
    ) -> Result<Self> {
        Self::new_with(source, media_key, media_type, StreamOpts::default())
    }

    /// Creates a [`MediaStream`] over `source` with the provided
    /// options.
    pub fn new_with(
        source: R,
        media_key: &[u8],
        media_type: MediaType,
        opts: StreamOpts<'_>,
    ) -> Result<Self> {
        let keys = MediaKeys::derive_with(media_key, media_type, opts.app)?;
        Self::from_keys(source, keys, opts)
    }

    /// Creates a [`MediaStream`] over `source` from already
    /// expanded keys. The app info in `opts` is ignored.
    pub fn from_keys(
        source: R,
        keys: MediaKeys,
        opts: StreamOpts<'_>,
    ) -> Result<Self> {
        Ok(MediaStream {
            session: Session::new(source, keys)?,
            chunk_size: opts.chunk_size,
            _direction: PhantomData,
        })
    }

    /// The key material in use.
    pub fn keys(&self) -> &MediaKeys {
        &self.session.keys
    }

    /// The number of bytes returned by reads so far.
    pub fn position(&self) -> u64 {
        self.session.position
    }

    /// Reports whether every output byte has been read.
    pub fn is_eof(&self) -> bool {
        self.session.is_done() && self.session.pending.is_empty()
    }

    /// Gets a reference to the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.session.source
    }

    /// Gets a mutable reference to the underlying source.
    ///
    /// Reading from it directly will corrupt the stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.session.source
    }

    /// Unwraps the underlying source, discarding any output not
    /// yet read.
    pub fn into_inner(self) -> R {
        self.session.source
    }
}

impl<R: Read, D: Direction> MediaStream<R, D> {
    fn do_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.session.pending.len() < buf.len() {
            match self.session.phase {
                Phase::Active(_) => (),
                Phase::Failed => return Err(Error::Aborted),
                _ => break,
            }
            let want = buf.len() - self.session.pending.len();
            if let Err(err) = D::refill(&mut self.session, want) {
                self.session.abort();
                return Err(err);
            }
        }
        if matches!(self.session.phase, Phase::Failed) {
            return Err(Error::Aborted);
        }
        Ok(self.session.drain(buf))
    }

    /// Reads up to `n` bytes.
    ///
    /// Fewer than `n` bytes are only returned at the end of the
    /// stream.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; cmp::min(n, self.chunk_size)];
        while out.len() < n {
            let m = cmp::min(n - out.len(), buf.len());
            let got = self.do_read(&mut buf[..m])?;
            if got == 0 {
                break;
            }
            out.extend_from_slice(&buf[..got]);
        }
        Ok(out)
    }

    /// Reads everything that remains.
    pub fn contents(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = self.do_read(&mut buf)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }
}

impl<R: Rewind, D: Direction> MediaStream<R, D> {
    /// Moves the stream and its source back to the start.
    ///
    /// This also clears a previous failure.
    pub fn rewind(&mut self) -> Result<()> {
        self.session.source.rewind()?;
        self.session.reset()
    }

    /// Seeks to `offset`, which must be zero.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset != 0 {
            return Err(Error::UnsupportedSeek);
        }
        self.rewind()
    }

    /// Returns the total length of the output, if known.
    ///
    /// Once the final chunk has been processed the exact length
    /// is returned. Before that, encryption computes it from the
    /// source's length and decryption returns `None`. A source
    /// that cannot report its length also yields `None`.
    ///
    /// The length is that of the whole source. If the source was
    /// not at its start when the stream was built, the first pass
    /// produces less than this; every pass after
    /// [`rewind`][Self::rewind] matches it.
    pub fn size(&mut self) -> Result<Option<u64>> {
        if self.session.is_done() {
            let pending = self.session.pending.len() as u64;
            return Ok(Some(self.session.position + pending));
        }
        D::output_len(&mut self.session.source)
    }
}

#[cfg(not(feature = "std"))]
#[cfg_attr(docsrs, doc(cfg(not(feature = "std"))))]
impl<R: Read, D: Direction> Read for MediaStream<R, D> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.do_read(buf)
    }
}

#[cfg(not(feature = "std"))]
#[cfg_attr(docsrs, doc(cfg(not(feature = "std"))))]
impl<R: Rewind, D: Direction> Rewind for MediaStream<R, D> {
    fn rewind(&mut self) -> Result<()> {
        MediaStream::rewind(self)
    }
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl<R: Read, D: Direction> std::io::Read for MediaStream<R, D> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        crate::error::map_res(self.do_read(buf))
    }
}

/// Only `SeekFrom::Start(0)` (rewind) and `SeekFrom::Current(0)`
/// (position query) are supported.
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl<R: Rewind, D: Direction> std::io::Seek for MediaStream<R, D> {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        use std::io::SeekFrom;

        match pos {
            SeekFrom::Start(0) => {
                crate::error::map_res(MediaStream::rewind(self))?;
                Ok(0)
            }
            SeekFrom::Current(0) => Ok(self.position()),
            _ => crate::error::map_res(Err(Error::UnsupportedSeek)),
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use {super::*, std::io::Cursor};

    const KEY: [u8; 32] = [0u8; 32];

    fn encrypt(plaintext: &[u8]) -> Vec<u8> {
        EncryptStream::new(plaintext, &KEY, MediaType::Document)
            .unwrap()
            .contents()
            .unwrap()
    }

    #[test]
    fn test_opts() {
        let opts = StreamOpts::new().with_chunk_size(1).build();
        assert_eq!(opts.chunk_size, BLOCK_SIZE);
        assert_eq!(opts.app, DEFAULT_APP_INFO);

        let opts = StreamOpts::new().with_app_info("Other").build();
        let a = EncryptStream::new(&b""[..], &KEY, MediaType::Image).unwrap();
        let b =
            EncryptStream::new_with(&b""[..], &KEY, MediaType::Image, opts)
                .unwrap();
        assert_ne!(a.keys(), b.keys());
    }

    #[test]
    fn test_eof_and_position() {
        let mut s = EncryptStream::new(&b"hi"[..], &KEY, MediaType::Audio)
            .unwrap();
        assert!(!s.is_eof());
        assert!(s.read_bytes(0).unwrap().is_empty());
        assert_eq!(s.read_bytes(20).unwrap().len(), 20);
        assert_eq!(s.position(), 20);
        assert!(!s.is_eof());
        assert_eq!(s.read_bytes(20).unwrap().len(), 6);
        assert_eq!(s.position(), 26);
        assert!(s.is_eof());
        assert!(s.read_bytes(20).unwrap().is_empty());
    }

    #[test]
    fn test_size() {
        let src = Cursor::new(vec![1u8; 16]);
        let mut s = EncryptStream::new(src, &KEY, MediaType::Video).unwrap();
        assert_eq!(s.size().unwrap(), Some(42));
        s.read_bytes(1).unwrap();
        assert_eq!(s.size().unwrap(), Some(42));

        let ct = encrypt(&[1u8; 16]);
        let mut s =
            DecryptStream::new(Cursor::new(ct), &KEY, MediaType::Document)
                .unwrap();
        assert_eq!(s.size().unwrap(), None);
        assert_eq!(s.contents().unwrap(), [1u8; 16]);
        assert_eq!(s.size().unwrap(), Some(16));
    }

    #[test]
    fn test_size_with_offset_source() {
        let mut src = Cursor::new(vec![1u8; 32]);
        src.set_position(16);
        let mut s = EncryptStream::new(src, &KEY, MediaType::Video).unwrap();
        assert_eq!(s.size().unwrap(), Some(58));
        assert_eq!(s.get_ref().position(), 16);
        assert_eq!(s.contents().unwrap().len(), 42);

        s.rewind().unwrap();
        assert_eq!(s.contents().unwrap().len(), 58);
        assert_eq!(s.size().unwrap(), Some(58));
    }

    #[test]
    fn test_seek() {
        let ct = encrypt(b"hello world");
        let mut s =
            DecryptStream::new(Cursor::new(ct), &KEY, MediaType::Document)
                .unwrap();
        assert_eq!(s.read_bytes(5).unwrap(), b"hello");
        assert!(matches!(s.seek(3), Err(Error::UnsupportedSeek)));
        s.seek(0).unwrap();
        assert_eq!(s.position(), 0);
        assert_eq!(s.contents().unwrap(), b"hello world");

        let err = std::io::Seek::seek(&mut s, std::io::SeekFrom::End(0))
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        assert_eq!(std::io::Seek::stream_position(&mut s).unwrap(), 11);
    }

    #[test]
    fn test_failure_is_sticky_until_rewind() {
        let mut ct = encrypt(b"hello world");
        let last = ct.len() - 1;
        ct[last] ^= 1;
        let mut s =
            DecryptStream::new(Cursor::new(ct), &KEY, MediaType::Document)
                .unwrap();
        assert!(matches!(s.read_bytes(1), Err(Error::Authentication)));
        assert!(matches!(s.read_bytes(1), Err(Error::Aborted)));
        assert!(!s.is_eof());

        s.get_mut().get_mut()[last] ^= 1;
        s.rewind().unwrap();
        assert_eq!(s.contents().unwrap(), b"hello world");
    }

    #[test]
    fn test_into_inner() {
        let src = Cursor::new(vec![7u8; 3]);
        let s = EncryptStream::new(src, &KEY, MediaType::Image).unwrap();
        assert_eq!(s.get_ref().get_ref(), &vec![7u8; 3]);
        assert_eq!(s.into_inner().into_inner(), vec![7u8; 3]);
    }
}
