use {
    crate::{
        buf::{Chunk, Lookahead},
        chain::Chain,
        error::{Error, Result},
        io::Read,
        keys::{HmacSha256, MediaKeys},
    },
    alloc::collections::VecDeque,
    core::{cmp::min, mem},
    tracing::{debug, trace},
};

/// Where a session is in its lifetime.
///
/// Only `Active` carries a MAC; taking it out for finalization
/// moves the session to `Finishing`, so a tag can never be
/// computed twice.
pub enum Phase {
    /// Interior chunks are being processed.
    Active(HmacSha256),
    /// The final chunk has been read and the tag is being
    /// computed or checked.
    Finishing,
    /// The final chunk was processed successfully.
    Done,
    /// A refill failed. Nothing more is produced until rewind.
    Failed,
}

/// Per-stream state shared by both directions.
pub struct Session<R> {
    pub(crate) source: R,
    pub(crate) keys: MediaKeys,
    pub(crate) lookahead: Lookahead,
    pub(crate) chain: Chain,
    pub(crate) phase: Phase,
    /// Transformed bytes not yet handed to the caller.
    pub(crate) pending: VecDeque<u8>,
    /// Bytes handed to the caller.
    pub(crate) position: u64,
}

impl<R> Session<R> {
    pub(crate) fn new(source: R, keys: MediaKeys) -> Result<Self> {
        Ok(Session {
            phase: Phase::Active(keys.mac()?),
            chain: Chain::new(&keys),
            lookahead: Lookahead::new(),
            pending: VecDeque::new(),
            position: 0,
            source,
            keys,
        })
    }

    /// Reports whether the final chunk has been processed.
    pub(crate) fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    /// Takes the MAC out of an active session, leaving it in
    /// `Finishing`.
    pub(crate) fn finish(&mut self) -> Result<HmacSha256> {
        match mem::replace(&mut self.phase, Phase::Finishing) {
            Phase::Active(mac) => Ok(mac),
            phase => {
                self.phase = phase;
                Err(Error::Aborted)
            }
        }
    }

    /// Returns the running MAC of an active session.
    pub(crate) fn mac_mut(&mut self) -> Result<&mut HmacSha256> {
        match &mut self.phase {
            Phase::Active(mac) => Ok(mac),
            _ => Err(Error::Aborted),
        }
    }

    /// Marks the final chunk as processed.
    pub(crate) fn complete(&mut self) {
        debug!(produced = self.position + self.pending.len() as u64, "done");
        self.phase = Phase::Done;
    }

    /// Moves to `Failed` and drops anything not yet delivered.
    pub(crate) fn abort(&mut self) {
        self.phase = Phase::Failed;
        self.pending.clear();
    }

    /// Moves up to `buf.len()` pending bytes into `buf`.
    pub(crate) fn drain(&mut self, buf: &mut [u8]) -> usize {
        let n = min(buf.len(), self.pending.len());
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *dst = src;
        }
        self.position += n as u64;
        n
    }

    /// Resets everything but the source and keys.
    pub(crate) fn reset(&mut self) -> Result<()> {
        debug!(position = self.position, "rewind");
        self.lookahead.reset();
        self.chain.reset();
        self.pending.clear();
        self.position = 0;
        self.phase = Phase::Active(self.keys.mac()?);
        Ok(())
    }
}

impl<R: Read> Session<R> {
    /// Pulls the next chunk from the source.
    pub(crate) fn next_chunk(&mut self, min: usize) -> Result<Chunk> {
        let chunk = self.lookahead.fill(&mut self.source, min)?;
        trace!(len = chunk.data.len(), is_final = chunk.is_final, "chunk");
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::keys::MediaType};

    fn session() -> Session<&'static [u8]> {
        let keys = MediaKeys::derive(&[0u8; 32], MediaType::Image).unwrap();
        let src = &b"0123456789abcdef0123456789abcdef0123"[..];
        Session::new(src, keys).unwrap()
    }

    #[test]
    fn test_finish_only_once() {
        let mut s = session();
        assert!(s.finish().is_ok());
        assert!(matches!(s.phase, Phase::Finishing));
        assert!(matches!(s.finish(), Err(Error::Aborted)));
        assert!(matches!(s.phase, Phase::Finishing));
    }

    #[test]
    fn test_drain_tracks_position() {
        let mut s = session();
        s.pending.extend([1u8, 2, 3, 4, 5]);
        let mut buf = [0u8; 3];
        assert_eq!(s.drain(&mut buf), 3);
        assert_eq!(buf, [1u8, 2, 3]);
        assert_eq!(s.drain(&mut buf), 2);
        assert_eq!(buf[..2], [4u8, 5]);
        assert_eq!(s.drain(&mut buf), 0);
        assert_eq!(s.position, 5);
    }

    #[test]
    fn test_abort_discards_pending() {
        let mut s = session();
        s.pending.extend([1u8, 2, 3]);
        s.abort();
        assert!(s.pending.is_empty());
        assert!(matches!(s.phase, Phase::Failed));

        s.reset().unwrap();
        assert!(matches!(s.phase, Phase::Active(_)));
        assert_eq!(s.position, 0);
    }

    #[test]
    fn test_next_chunk() {
        let mut s = session();
        let c = s.next_chunk(1).unwrap();
        assert!(!c.is_final);
        assert_eq!(c.data, b"0123456789abcdef");
        let c = s.next_chunk(1).unwrap();
        assert!(c.is_final);
        assert_eq!(c.data, b"0123456789abcdef0123");
        assert!(!s.is_done());
    }
}
