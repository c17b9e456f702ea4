use sha3::{Digest, Keccak256 as Keccak256Core};

/// Single-shot Keccak-256 (the pre-standard padding used by Ethereum, not SHA3-256).
pub fn keccak_hash(data: impl AsRef<[u8]>) -> [u8; 32] {
    Keccak256Core::digest(data.as_ref()).into()
}

/// Streaming Keccak-256 hasher.
#[derive(Clone, Default)]
pub struct Keccak256(Keccak256Core);

impl Keccak256 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(mut self, data: impl AsRef<[u8]>) -> Self {
        self.0.update(data.as_ref());
        self
    }

    pub fn finalize(self) -> [u8; 32] {
        self.0.finalize().into()
    }
}

impl core::fmt::Debug for Keccak256 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Keccak256").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::array;

    const BLOCK_SIZE: usize = 136;

    #[test]
    fn keccak_empty() {
        assert_eq!(
            hex::encode(keccak_hash(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470",
        );
    }

    #[test]
    fn keccak_half_block() {
        let buf: [u8; BLOCK_SIZE >> 1] =
            array::from_fn(|i| (i << 5 & 0xF0 | ((i << 1) + 1) & 0x0F) as u8);

        assert_eq!(
            hex::encode(keccak_hash(buf)),
            "337bf14237b641240bd3204e9991c8b96a5349613735ade90a5c2b8806355c11",
        );
    }

    #[test]
    fn keccak_full_block() {
        let buf: [u8; BLOCK_SIZE] =
            array::from_fn(|i| (i << 5 & 0xF0 | ((i << 1) + 1) & 0x0F) as u8);

        assert_eq!(
            hex::encode(keccak_hash(buf)),
            "3f7424fa94a2f8c5a733b86dac312d85685f9af3dea919694cc6a8abfc075460",
        );
    }

    #[test]
    fn keccak_almost_full_block() {
        let buf: [u8; BLOCK_SIZE - 1] =
            array::from_fn(|i| (i << 5 & 0xF0 | ((i << 1) + 1) & 0x0F) as u8);

        assert_eq!(
            hex::encode(keccak_hash(buf)),
            "3e4916729e2522af4937548f5848a5b49067eec910a0a6a890b0c71dde08854e",
        );
    }

    #[test]
    fn streaming_matches_single_shot() {
        let streamed = Keccak256::new().update(b"hello").update(b" world").finalize();
        assert_eq!(streamed, keccak_hash(b"hello world"));
        assert_eq!(
            hex::encode(streamed),
            "47173285a8d7341e5e972fc677286384f802f8ef42a5ec5f03bbfa254cb01fad"
        );
    }
}
