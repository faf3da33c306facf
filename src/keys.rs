use {
    crate::error::{Error, Result},
    alloc::string::ToString,
    core::{fmt, result, str::FromStr},
    hkdf::Hkdf,
    hmac::{Hmac, Mac},
    sha2::Sha256,
    zeroize::Zeroize,
};

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// The size in bytes of the expanded media key.
pub const DERIVED_KEY_SIZE: usize = 112;

/// The HKDF info prefix used unless overridden with
/// [`StreamOpts::with_app_info`][crate::StreamOpts::with_app_info].
pub const DEFAULT_APP_INFO: &str = "WhatsApp";

/// The kind of media being encrypted.
///
/// Each kind derives a distinct set of keys from the same media
/// key.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MediaType {
    /// Still images.
    Image,
    /// Video, including animated images.
    Video,
    /// Audio and voice notes.
    Audio,
    /// Everything else.
    Document,
}

impl MediaType {
    /// All recognized media types.
    pub const ALL: [MediaType; 4] = [
        MediaType::Image,
        MediaType::Video,
        MediaType::Audio,
        MediaType::Document,
    ];

    /// Returns the canonical upper-case name, e.g. `IMAGE`.
    pub const fn name(&self) -> &'static str {
        match self {
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
            MediaType::Audio => "AUDIO",
            MediaType::Document => "DOCUMENT",
        }
    }

    /// The word used in the HKDF info string.
    const fn label(&self) -> &'static str {
        match self {
            MediaType::Image => "Image",
            MediaType::Video => "Video",
            MediaType::Audio => "Audio",
            MediaType::Document => "Document",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> result::Result<Self, Self::Err> {
        MediaType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::InvalidMediaType(s.to_string()))
    }
}

impl TryFrom<&str> for MediaType {
    type Error = Error;

    fn try_from(s: &str) -> result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// Key material expanded from a media key.
///
/// The same media key and [`MediaType`] always produce the same
/// material. The contents are wiped on drop.
#[derive(Clone, Eq, PartialEq)]
pub struct MediaKeys {
    iv: [u8; 16],
    cipher_key: [u8; 32],
    mac_key: [u8; 32],
    ref_key: [u8; 32],
}

impl MediaKeys {
    /// Expands `media_key` for `media_type` using the default
    /// HKDF info prefix.
    pub fn derive(media_key: &[u8], media_type: MediaType) -> Result<Self> {
        Self::derive_with(media_key, media_type, DEFAULT_APP_INFO)
    }

    /// Parses `media_type` and expands `media_key` for it.
    ///
    /// An unrecognized name fails with
    /// [`Error::InvalidMediaType`] before any key derivation.
    pub fn derive_named(media_key: &[u8], media_type: &str) -> Result<Self> {
        Self::derive(media_key, media_type.parse()?)
    }

    /// Expands `media_key` with HKDF-SHA256 using the info string
    /// `"{app} {Label} Keys"`.
    pub fn derive_with(
        media_key: &[u8],
        media_type: MediaType,
        app: &str,
    ) -> Result<Self> {
        let kdf = Hkdf::<Sha256>::new(None, media_key);
        let mut okm = [0u8; DERIVED_KEY_SIZE];
        kdf.expand_multi_info(
            &[
                app.as_bytes(),
                b" ",
                media_type.label().as_bytes(),
                b" Keys",
            ],
            &mut okm,
        )?;

        let mut keys = MediaKeys {
            iv: [0u8; 16],
            cipher_key: [0u8; 32],
            mac_key: [0u8; 32],
            ref_key: [0u8; 32],
        };
        keys.iv.copy_from_slice(&okm[..16]);
        keys.cipher_key.copy_from_slice(&okm[16..48]);
        keys.mac_key.copy_from_slice(&okm[48..80]);
        keys.ref_key.copy_from_slice(&okm[80..]);
        okm.zeroize();
        Ok(keys)
    }

    /// The initial CBC IV.
    pub fn iv(&self) -> &[u8; 16] {
        &self.iv
    }

    /// The AES-256 key.
    pub fn cipher_key(&self) -> &[u8; 32] {
        &self.cipher_key
    }

    /// The HMAC-SHA256 key.
    pub fn mac_key(&self) -> &[u8; 32] {
        &self.mac_key
    }

    /// The reference key. It is not used by the stream transform.
    pub fn ref_key(&self) -> &[u8; 32] {
        &self.ref_key
    }

    /// Returns a fresh MAC already fed with the IV.
    pub(crate) fn mac(&self) -> Result<HmacSha256> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.mac_key)?;
        mac.update(&self.iv);
        Ok(mac)
    }
}

impl fmt::Debug for MediaKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaKeys").finish_non_exhaustive()
    }
}

impl Drop for MediaKeys {
    fn drop(&mut self) {
        self.iv.zeroize();
        self.cipher_key.zeroize();
        self.mac_key.zeroize();
        self.ref_key.zeroize();
    }
}
