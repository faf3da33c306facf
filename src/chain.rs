//! AES-256-CBC with the chaining value kept outside the mode
//! object, so blocks can be processed a chunk at a time.

use {
    crate::{
        buf::round_up,
        error::{Error, Result},
        keys::MediaKeys,
        BLOCK_SIZE,
    },
    aes::{Aes256, Block},
    alloc::vec::Vec,
    cbc::{Decryptor, Encryptor},
    cipher::{
        block_padding::{NoPadding, Pkcs7},
        BlockDecryptMut, BlockEncryptMut, InnerIvInit, KeyInit,
    },
    generic_array::GenericArray,
};

pub(crate) struct Chain {
    /// Expanded once per session.
    cipher: Aes256,
    /// IV for the next block: the session IV, then the most
    /// recent ciphertext block.
    iv: Block,
    initial: Block,
}

impl Chain {
    pub fn new(keys: &MediaKeys) -> Self {
        let initial = *GenericArray::from_slice(keys.iv());
        Self {
            cipher: Aes256::new(GenericArray::from_slice(keys.cipher_key())),
            iv: initial,
            initial,
        }
    }

    /// Restores the session IV.
    pub fn reset(&mut self) {
        self.iv = self.initial;
    }

    /// Encrypts whole blocks in place without padding.
    pub fn encrypt_blocks(&mut self, buf: &mut [u8]) -> Result<()> {
        let len = aligned_len(buf)?;
        if len == 0 {
            return Ok(());
        }
        Encryptor::<Aes256>::inner_iv_init(self.cipher.clone(), &self.iv)
            .encrypt_padded_mut::<NoPadding>(buf, len)
            .map_err(|_| Error::Encryption)?;
        self.iv.copy_from_slice(&buf[len - BLOCK_SIZE..]);
        Ok(())
    }

    /// Pads `buf` with PKCS#7 and encrypts it in place.
    ///
    /// `buf` may be empty, in which case it becomes one block of
    /// padding.
    pub fn encrypt_final(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        let len = buf.len();
        buf.resize(round_up(len + 1), 0);
        let n = Encryptor::<Aes256>::inner_iv_init(
            self.cipher.clone(),
            &self.iv,
        )
        .encrypt_padded_mut::<Pkcs7>(buf, len)
        .map_err(|_| Error::Encryption)?
        .len();
        debug_assert_eq!(n, buf.len());
        self.iv.copy_from_slice(&buf[n - BLOCK_SIZE..]);
        Ok(())
    }

    /// Decrypts whole blocks in place without removing padding.
    pub fn decrypt_blocks(&mut self, buf: &mut [u8]) -> Result<()> {
        let len = aligned_len(buf)?;
        if len == 0 {
            return Ok(());
        }
        let next = *Block::from_slice(&buf[len - BLOCK_SIZE..]);
        Decryptor::<Aes256>::inner_iv_init(self.cipher.clone(), &self.iv)
            .decrypt_padded_mut::<NoPadding>(buf)
            .map_err(|_| Error::Encryption)?;
        self.iv = next;
        Ok(())
    }

    /// Decrypts `buf` in place and strips its PKCS#7 padding.
    ///
    /// An empty `buf` is left as is.
    pub fn decrypt_final(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        let len = aligned_len(buf)?;
        if len == 0 {
            return Ok(());
        }
        let next = *Block::from_slice(&buf[len - BLOCK_SIZE..]);
        let n = Decryptor::<Aes256>::inner_iv_init(
            self.cipher.clone(),
            &self.iv,
        )
        .decrypt_padded_mut::<Pkcs7>(buf)
        .map_err(|_| Error::Padding)?
        .len();
        buf.truncate(n);
        self.iv = next;
        Ok(())
    }
}

fn aligned_len(buf: &[u8]) -> Result<usize> {
    if buf.len() % BLOCK_SIZE != 0 {
        return Err(Error::Encryption);
    }
    Ok(buf.len())
}

#[cfg(test)]
mod tests {
    use {super::*, crate::keys::MediaType, cipher::KeyIvInit};

    fn keys() -> MediaKeys {
        MediaKeys::derive(&[3u8; 32], MediaType::Video).unwrap()
    }

    fn one_shot(plaintext: &[u8]) -> Vec<u8> {
        let keys = keys();
        let mut buf = plaintext.to_vec();
        buf.resize(round_up(plaintext.len() + 1), 0);
        Encryptor::<Aes256>::new(
            GenericArray::from_slice(keys.cipher_key()),
            GenericArray::from_slice(keys.iv()),
        )
        .encrypt_padded_mut::<Pkcs7>(&mut buf, plaintext.len())
        .unwrap()
        .to_vec()
    }

    #[test]
    fn test_blockwise_matches_one_shot() {
        let plaintext: Vec<u8> = (0..100u8).collect();
        let want = one_shot(&plaintext);

        // 100 = 16 + 48 + 36
        let mut chain = Chain::new(&keys());
        let mut got = Vec::new();
        for part in [&plaintext[..16], &plaintext[16..64]] {
            let mut b = part.to_vec();
            chain.encrypt_blocks(&mut b).unwrap();
            got.extend_from_slice(&b);
        }
        let mut last = plaintext[64..].to_vec();
        chain.encrypt_final(&mut last).unwrap();
        got.extend_from_slice(&last);
        assert_eq!(got, want);

        let mut chain = Chain::new(&keys());
        let mut head = want[..64].to_vec();
        chain.decrypt_blocks(&mut head[..32]).unwrap();
        chain.decrypt_blocks(&mut head[32..]).unwrap();
        let mut tail = want[64..].to_vec();
        chain.decrypt_final(&mut tail).unwrap();
        head.extend_from_slice(&tail);
        assert_eq!(head, plaintext);
    }

    #[test]
    fn test_empty_final_block_is_all_padding() {
        let mut chain = Chain::new(&keys());
        let mut b = Vec::new();
        chain.encrypt_final(&mut b).unwrap();
        assert_eq!(b.len(), BLOCK_SIZE);
        assert_eq!(b, one_shot(&[]));
    }

    #[test]
    fn test_reset_restores_iv() {
        let mut chain = Chain::new(&keys());
        let mut a = [5u8; 32];
        chain.encrypt_blocks(&mut a).unwrap();
        chain.reset();
        let mut b = [5u8; 32];
        chain.encrypt_blocks(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_misaligned_input() {
        let mut chain = Chain::new(&keys());
        assert!(matches!(
            chain.encrypt_blocks(&mut [0u8; 15]),
            Err(Error::Encryption)
        ));
        assert!(matches!(
            chain.decrypt_final(&mut vec![0u8; 17]),
            Err(Error::Encryption)
        ));
    }

    #[test]
    fn test_bad_padding() {
        let mut chain = Chain::new(&keys());
        let mut b = vec![0u8; 16];
        // Encrypt a block whose last byte is not valid padding.
        chain.encrypt_blocks(&mut b).unwrap();
        chain.reset();
        assert!(matches!(chain.decrypt_final(&mut b), Err(Error::Padding)));
    }
}
