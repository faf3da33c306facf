use {
    alloc::{boxed::Box, string::String},
    core::{convert::From, error, fmt, result},
};

/// Result is a specialized [`result::Result`] for this module.
pub type Result<T> = result::Result<T, Error>;

#[cfg(feature = "std")]
pub(crate) fn map_res<T>(res: Result<T>) -> std::io::Result<T> {
    res.map_err(|err| match err {
        Error::Io(err) => err,
        Error::Authentication | Error::Padding => {
            std::io::Error::new(std::io::ErrorKind::InvalidData, err)
        }
        Error::UnsupportedSeek => {
            std::io::Error::new(std::io::ErrorKind::Unsupported, err)
        }
        Error::InvalidMediaType(_) | Error::InvalidKeyLength => {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
        }
        err => std::io::Error::new(std::io::ErrorKind::Other, err),
    })
}

/// An arbitrary error raised by a custom [`Read`][crate::Read]
/// source.
#[derive(Debug)]
pub struct OtherError {
    inner: Box<dyn error::Error + Send + Sync>,
}

impl OtherError {
    /// Allocate an [`OtherError`].
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Self { inner: err.into() }
    }
}

impl fmt::Display for OtherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl error::Error for OtherError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.inner.source()
    }
}

/// Error is the error type returned by this module.
#[derive(Debug)]
pub enum Error {
    /// The media type name is not one of `IMAGE`, `VIDEO`,
    /// `AUDIO` or `DOCUMENT`.
    InvalidMediaType(String),
    /// HKDF or HMAC rejected the key length.
    InvalidKeyLength,
    /// The tag did not match the ciphertext, or the trailer was
    /// truncated.
    Authentication,
    /// The final block was authentic but its padding was not.
    Padding,
    /// The block engine was handed a buffer that is not a
    /// multiple of the block size.
    Encryption,
    /// Only rewinding to the start of the stream is supported.
    UnsupportedSeek,
    /// The stream already failed and must be rewound before it
    /// can be read again.
    Aborted,
    /// The underlying stream failed.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    Io(std::io::Error),
    /// Some other error occurred.
    Other(OtherError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidMediaType(t) => {
                write!(f, "invalid media type: {}", t)
            }
            Error::InvalidKeyLength => write!(f, "invalid key length"),
            Error::Authentication => write!(f, "authentication error"),
            Error::Padding => write!(f, "invalid padding"),
            Error::Encryption => write!(f, "misaligned cipher input"),
            Error::UnsupportedSeek => {
                write!(f, "only rewinding to the start is supported")
            }
            Error::Aborted => write!(f, "stream previously failed"),
            #[cfg(feature = "std")]
            Error::Io(err) => write!(f, "{}", err),
            Error::Other(err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            #[cfg(feature = "std")]
            Error::Io(err) => Some(err),
            Error::Other(err) => Some(err),
            _ => None,
        }
    }
}

impl From<hkdf::InvalidLength> for Error {
    fn from(_: hkdf::InvalidLength) -> Self {
        Error::InvalidKeyLength
    }
}

impl From<hmac::digest::InvalidLength> for Error {
    fn from(_: hmac::digest::InvalidLength) -> Self {
        Error::InvalidKeyLength
    }
}

impl From<OtherError> for Error {
    fn from(value: OtherError) -> Self {
        Error::Other(value)
    }
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}
