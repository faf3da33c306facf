use {
    crate::{
        error::{Error, Result},
        io::{Read, Rewind},
        session::Session,
        stream::{sealed::Sealed, Direction},
        TAG_SIZE,
    },
    hmac::Mac,
    tracing::warn,
};

/// Marker for a [`MediaStream`][crate::MediaStream] that reads
/// `ciphertext || tag` and produces verified plaintext.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Decrypt;

impl Sealed for Decrypt {}

impl Direction for Decrypt {
    fn refill<R: Read>(session: &mut Session<R>, min: usize) -> Result<()> {
        let mut chunk = session.next_chunk(min)?;

        if !chunk.is_final {
            // The MAC covers ciphertext, so feed it before
            // decrypting in place.
            session.mac_mut()?.update(&chunk.data);
            session.chain.decrypt_blocks(&mut chunk.data)?;
            session.pending.extend(&chunk.data);
            return Ok(());
        }

        let mut mac = session.finish()?;
        let body = chunk.body_len();
        if chunk.tail().len() != TAG_SIZE {
            // The stream has been truncated, so it clearly
            // cannot be authenticated.
            warn!(trailer = chunk.tail().len(), "malformed trailer");
            return Err(Error::Authentication);
        }
        mac.update(&chunk.data[..body]);
        if mac.verify_truncated_left(chunk.tail()).is_err() {
            warn!("tag mismatch");
            return Err(Error::Authentication);
        }

        chunk.data.truncate(body);
        if let Err(err) = session.chain.decrypt_final(&mut chunk.data) {
            warn!(%err, "final block");
            return Err(err);
        }
        session.pending.extend(&chunk.data);
        session.complete();
        Ok(())
    }

    /// The plaintext length depends on padding that is only
    /// seen at the end.
    fn output_len<R: Rewind>(_source: &mut R) -> Result<Option<u64>> {
        Ok(None)
    }
}
