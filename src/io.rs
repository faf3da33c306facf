use crate::error::Result;

/// Read is roughly equivalent to [`std::io::Read`], but works
/// with `no_std`.
///
/// When the `std` feature is enabled, all types that implement
/// [`std::io::Read`] also implement [`Read`].
pub trait Read {
    /// Equivalent to [`std::io::Read::read`].
    ///
    /// Returning zero bytes for a non-empty `buf` signals the end
    /// of the stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Reads until `buf` is full or `r` reaches EOF, returning the
/// number of bytes read.
pub(crate) fn read_full<R: Read + ?Sized>(
    r: &mut R,
    buf: &mut [u8],
) -> Result<usize> {
    let mut i = 0;
    while i < buf.len() {
        let n = r.read(&mut buf[i..])?;
        if n == 0 {
            break;
        }
        i += n;
    }
    Ok(i)
}

/// A source that can be moved back to its start.
///
/// When the `std` feature is enabled, all types that implement
/// [`std::io::Seek`] also implement [`Rewind`].
pub trait Rewind {
    /// Moves the stream back to its first byte.
    fn rewind(&mut self) -> Result<()>;

    /// Returns the total length of the stream, if known.
    ///
    /// Sources that cannot seek to their end report `None`.
    fn stream_len(&mut self) -> Result<Option<u64>> {
        Ok(None)
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        mod std_io {
            use {
                crate::{Read, Result, Rewind},
                std::io::{self, ErrorKind, SeekFrom},
            };

            /// Maps [`ErrorKind::Unsupported`] to `None`.
            fn supported<T>(res: io::Result<T>) -> Result<Option<T>> {
                match res {
                    Ok(v) => Ok(Some(v)),
                    Err(e) if e.kind() == ErrorKind::Unsupported => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }

            impl<T: std::io::Read> Read for T {
                #[inline]
                fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
                    loop {
                        match io::Read::read(self, buf) {
                            Ok(n) => return Ok(n),
                            Err(e) if e.kind() == ErrorKind::Interrupted => {}
                            Err(e) => return Err(e.into()),
                        }
                    }
                }
            }

            impl<T: io::Seek> Rewind for T {
                fn rewind(&mut self) -> Result<()> {
                    io::Seek::seek(self, SeekFrom::Start(0))?;
                    Ok(())
                }

                fn stream_len(&mut self) -> Result<Option<u64>> {
                    let Some(pos) = supported(io::Seek::stream_position(self))?
                    else {
                        return Ok(None);
                    };
                    let Some(end) =
                        supported(io::Seek::seek(self, SeekFrom::End(0)))?
                    else {
                        return Ok(None);
                    };
                    if end != pos {
                        io::Seek::seek(self, SeekFrom::Start(pos))?;
                    }
                    Ok(Some(end))
                }
            }
        }
    } else {
        mod no_std_io {
            use {
                crate::{Read, Result},
                core::cmp,
            };

            impl Read for &[u8] {
                #[inline]
                fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
                    let n = cmp::min(buf.len(), self.len());
                    let (head, tail) = self.split_at(n);
                    buf[..n].copy_from_slice(head);
                    *self = tail;
                    Ok(n)
                }
            }
        }
    }
}
