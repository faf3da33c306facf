use {
    crate::{
        encrypted_len,
        error::Result,
        io::{Read, Rewind},
        session::Session,
        stream::{sealed::Sealed, Direction},
        TAG_SIZE,
    },
    hmac::Mac,
};

/// Marker for a [`MediaStream`][crate::MediaStream] that reads
/// plaintext and produces `ciphertext || tag`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Encrypt;

impl Sealed for Encrypt {}

impl Direction for Encrypt {
    fn refill<R: Read>(session: &mut Session<R>, min: usize) -> Result<()> {
        let mut chunk = session.next_chunk(min)?;

        if !chunk.is_final {
            session.chain.encrypt_blocks(&mut chunk.data)?;
            session.mac_mut()?.update(&chunk.data);
            session.pending.extend(&chunk.data);
            return Ok(());
        }

        let mut mac = session.finish()?;
        session.chain.encrypt_final(&mut chunk.data)?;
        mac.update(&chunk.data);
        let tag = mac.finalize().into_bytes();

        session.pending.extend(&chunk.data);
        session.pending.extend(&tag[..TAG_SIZE]);
        session.complete();
        Ok(())
    }

    fn output_len<R: Rewind>(source: &mut R) -> Result<Option<u64>> {
        Ok(source.stream_len()?.map(encrypted_len))
    }
}
