//! **media-stream** encrypts and decrypts media payloads one
//! bounded chunk at a time.
//!
//! A single 32-byte media key is expanded with [HKDF] into an
//! IV, an AES-256 key, an HMAC-SHA256 key and a reference key.
//! The payload is encrypted with AES-256-CBC, padded with PKCS#7
//! on the final block only, and followed by a 10-byte tag:
//!
//! ```text
//!    ciphertext = AES-256-CBC(plaintext, cipherKey, iv)
//!    tag        = HMAC-SHA256(macKey, iv || ciphertext)[..10]
//!    output     = ciphertext || tag
//! ```
//!
//! Both directions are exposed as pull-based readers
//! ([`EncryptStream`] and [`DecryptStream`]) that never hold the
//! whole payload in memory. The CBC chaining value and the HMAC
//! state are carried from chunk to chunk, so the tag still covers
//! the entire ciphertext.
//!
//! The tag is only checked once the end of the ciphertext is
//! reached. Plaintext from earlier chunks is released before
//! then, so it is not a good idea to act on a plaintext until the
//! stream has reported EOF without error.
//!
//! [HKDF]: https://tools.ietf.org/html/rfc5869

#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

extern crate alloc;

mod buf;
mod chain;
mod decrypt;
mod encrypt;
mod error;
mod io;
mod keys;
mod session;
mod stream;

pub use decrypt::Decrypt;
pub use encrypt::Encrypt;
pub use error::*;
pub use io::*;
pub use keys::*;
pub use stream::*;

use {aes::Aes256, cipher::BlockSizeUser, typenum::Unsigned};

/// The cipher block size in bytes.
pub const BLOCK_SIZE: usize = <Aes256 as BlockSizeUser>::BlockSize::USIZE;

/// The size in bytes of the truncated HMAC-SHA256 tag appended to
/// every ciphertext.
pub const TAG_SIZE: usize = 10;

/// The default read size used by [`MediaStream::contents`].
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Returns the exact size in bytes of the encrypted form of an
/// `n`-byte plaintext, tag included.
///
/// PKCS#7 always adds at least one byte, so a block-aligned
/// plaintext grows by a full block.
pub const fn encrypted_len(n: u64) -> u64 {
    (n / BLOCK_SIZE as u64 + 1) * BLOCK_SIZE as u64 + TAG_SIZE as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypted_len() {
        assert_eq!(encrypted_len(0), 26);
        assert_eq!(encrypted_len(11), 26);
        assert_eq!(encrypted_len(15), 26);
        assert_eq!(encrypted_len(16), 42);
        assert_eq!(encrypted_len(17), 42);
    }
}
