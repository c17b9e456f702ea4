//! Conversion between the raw recovery bit of a signature and the `v` value
//! carried on the wire.
//!
//! Three encodings exist:
//! - [`VEncoding::Parity`]: `v` is the bit itself (typed transactions).
//! - [`VEncoding::Electrum`]: `v = 27 + bit` (unprotected legacy transactions, signed messages).
//! - [`VEncoding::Eip155`]: `v = chain_id * 2 + 35 + bit` (replay-protected legacy transactions).
//!
//! [`encode_v`] and [`decode_v`] are inverse of each other for a given encoding.

use ethereum_types::U256;

use crate::provider::CryptoError;

const ELECTRUM_OFFSET: u64 = 27;
const EIP155_OFFSET: u64 = 35;

/// The y-parity of the signature's ephemeral point. Only 0 and 1 are accepted:
/// ids 2 and 3 (overflowed `r`) never come out of a compliant signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoveryId(u8);

impl RecoveryId {
    pub const EVEN: Self = Self(0);
    pub const ODD: Self = Self(1);

    pub fn new(id: u8) -> Result<Self, CryptoError> {
        match id {
            0 | 1 => Ok(Self(id)),
            _ => Err(CryptoError::InvalidRecoveryId),
        }
    }

    pub fn from_parity(odd: bool) -> Self {
        if odd { Self::ODD } else { Self::EVEN }
    }

    pub const fn to_u8(self) -> u8 {
        self.0
    }

    pub const fn is_odd(self) -> bool {
        self.0 == 1
    }
}

impl TryFrom<U256> for RecoveryId {
    type Error = CryptoError;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        if value > U256::one() {
            return Err(CryptoError::InvalidRecoveryId);
        }
        Self::new(value.low_u32() as u8)
    }
}

impl From<RecoveryId> for U256 {
    fn from(value: RecoveryId) -> Self {
        U256::from(value.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VEncoding {
    Parity,
    Electrum,
    Eip155 { chain_id: U256 },
}

impl VEncoding {
    /// Legacy transactions carry `27/28` without a chain id and EIP-155 values with one.
    pub fn legacy(chain_id: Option<U256>) -> Self {
        match chain_id {
            Some(chain_id) => Self::Eip155 { chain_id },
            None => Self::Electrum,
        }
    }

    /// Infers the encoding a legacy `v` was produced with.
    pub fn from_legacy_v(v: U256) -> Result<Self, CryptoError> {
        let electrum = U256::from(ELECTRUM_OFFSET);
        if v == electrum || v == electrum + U256::one() {
            return Ok(Self::Electrum);
        }
        if v < U256::from(EIP155_OFFSET) {
            return Err(CryptoError::InvalidRecoveryId);
        }
        let chain_id = (v - U256::from(EIP155_OFFSET)) / U256::from(2);
        Ok(Self::Eip155 { chain_id })
    }

    pub fn chain_id(&self) -> Option<U256> {
        match self {
            Self::Eip155 { chain_id } => Some(*chain_id),
            _ => None,
        }
    }

    fn offset(&self) -> Result<U256, CryptoError> {
        match self {
            Self::Parity => Ok(U256::zero()),
            Self::Electrum => Ok(U256::from(ELECTRUM_OFFSET)),
            Self::Eip155 { chain_id } => chain_id
                .checked_mul(U256::from(2))
                .and_then(|doubled| doubled.checked_add(U256::from(EIP155_OFFSET)))
                .ok_or(CryptoError::InvalidRecoveryId),
        }
    }
}

/// Folds the recovery bit into a wire `v`.
pub fn encode_v(recovery_id: RecoveryId, encoding: VEncoding) -> Result<U256, CryptoError> {
    encoding
        .offset()?
        .checked_add(recovery_id.into())
        .ok_or(CryptoError::InvalidRecoveryId)
}

/// Extracts the recovery bit from a wire `v`, failing if `v` was not produced
/// with `encoding`.
pub fn decode_v(v: U256, encoding: VEncoding) -> Result<RecoveryId, CryptoError> {
    let offset = encoding.offset()?;
    let bit = v
        .checked_sub(offset)
        .ok_or(CryptoError::InvalidRecoveryId)?;
    RecoveryId::try_from(bit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(value: u64) -> U256 {
        U256::from(value)
    }

    #[test]
    fn parity_is_identity() {
        assert_eq!(encode_v(RecoveryId::ODD, VEncoding::Parity).unwrap(), u(1));
        assert_eq!(decode_v(u(0), VEncoding::Parity).unwrap(), RecoveryId::EVEN);
        assert!(decode_v(u(27), VEncoding::Parity).is_err());
    }

    #[test]
    fn electrum_adds_27() {
        assert_eq!(encode_v(RecoveryId::EVEN, VEncoding::Electrum).unwrap(), u(27));
        assert_eq!(decode_v(u(28), VEncoding::Electrum).unwrap(), RecoveryId::ODD);
        assert!(decode_v(u(1), VEncoding::Electrum).is_err());
        assert!(decode_v(u(29), VEncoding::Electrum).is_err());
    }

    #[test]
    fn eip155_folds_chain_id() {
        let mainnet = VEncoding::Eip155 { chain_id: u(1) };
        assert_eq!(encode_v(RecoveryId::EVEN, mainnet).unwrap(), u(37));
        assert_eq!(encode_v(RecoveryId::ODD, mainnet).unwrap(), u(38));
        assert_eq!(decode_v(u(38), mainnet).unwrap(), RecoveryId::ODD);

        let other = VEncoding::Eip155 {
            chain_id: u(3151908),
        };
        assert!(decode_v(u(37), other).is_err());
        assert_eq!(decode_v(u(6303851), other).unwrap(), RecoveryId::EVEN);
    }

    #[test]
    fn infer_legacy_encoding() {
        assert_eq!(VEncoding::from_legacy_v(u(27)).unwrap(), VEncoding::Electrum);
        assert_eq!(
            VEncoding::from_legacy_v(u(6303851)).unwrap(),
            VEncoding::Eip155 {
                chain_id: u(3151908)
            }
        );
        assert_eq!(
            VEncoding::from_legacy_v(u(36)).unwrap().chain_id(),
            Some(U256::zero())
        );
        assert!(VEncoding::from_legacy_v(u(1)).is_err());
        assert!(VEncoding::from_legacy_v(u(30)).is_err());
    }

    #[test]
    fn reject_chain_id_overflow() {
        let huge = VEncoding::Eip155 { chain_id: U256::MAX };
        assert_eq!(
            encode_v(RecoveryId::EVEN, huge),
            Err(CryptoError::InvalidRecoveryId)
        );
    }

    #[test]
    fn reject_recovery_ids_above_one() {
        assert_eq!(RecoveryId::new(2), Err(CryptoError::InvalidRecoveryId));
        assert_eq!(
            RecoveryId::try_from(u(256)),
            Err(CryptoError::InvalidRecoveryId)
        );
    }
}
