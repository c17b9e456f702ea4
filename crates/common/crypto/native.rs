use ethereum_types::{H512, U256};
use secp256k1::{
    Message, PublicKey, SECP256K1, SecretKey,
    ecdsa::{RecoverableSignature as Secp256k1Signature, RecoveryId as Secp256k1RecoveryId},
};
use tracing::debug;

use crate::{
    provider::{Crypto, CryptoError},
    recovery::RecoveryId,
    signature::RecoverableSignature,
};

/// Native crypto implementation on top of libsecp256k1.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCrypto;

impl NativeCrypto {
    fn to_secp256k1(sig: &RecoverableSignature) -> Result<Secp256k1Signature, CryptoError> {
        sig.validate()?;
        let recovery_id = Secp256k1RecoveryId::from_i32(sig.recovery_id.to_u8() as i32)
            .map_err(|_| CryptoError::InvalidRecoveryId)?;
        Secp256k1Signature::from_compact(&sig.to_compact(), recovery_id)
            .map_err(|_| CryptoError::InvalidSignature("not a valid secp256k1 signature"))
    }
}

fn encode_public_key(public_key: &PublicKey) -> H512 {
    H512::from_slice(&public_key.serialize_uncompressed()[1..])
}

fn decode_public_key(public_key: &H512) -> Result<PublicKey, CryptoError> {
    let mut uncompressed = [0u8; 65];
    uncompressed[0] = 0x04;
    uncompressed[1..].copy_from_slice(public_key.as_bytes());
    PublicKey::from_slice(&uncompressed).map_err(|_| CryptoError::InvalidPublicKey)
}

impl Crypto for NativeCrypto {
    fn sign(
        &self,
        msg: &[u8; 32],
        private_key: &[u8; 32],
    ) -> Result<RecoverableSignature, CryptoError> {
        let secret_key =
            SecretKey::from_slice(private_key).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let (recovery_id, compact) = SECP256K1
            .sign_ecdsa_recoverable(&Message::from_digest(*msg), &secret_key)
            .serialize_compact();

        // libsecp256k1 only emits normalized (low-s) signatures
        let signature = RecoverableSignature {
            recovery_id: RecoveryId::new(recovery_id.to_i32() as u8)?,
            r: U256::from_big_endian(&compact[..32]),
            s: U256::from_big_endian(&compact[32..]),
        };
        signature.validate()?;
        Ok(signature)
    }

    fn recover_public_key(
        &self,
        msg: &[u8; 32],
        sig: &RecoverableSignature,
    ) -> Result<H512, CryptoError> {
        let signature = Self::to_secp256k1(sig)?;
        let public_key = SECP256K1
            .recover_ecdsa(&Message::from_digest(*msg), &signature)
            .map_err(|_| CryptoError::RecoveryFailed)?;
        Ok(encode_public_key(&public_key))
    }

    fn verify(&self, msg: &[u8; 32], sig: &RecoverableSignature, public_key: &H512) -> bool {
        let Ok(expected) = decode_public_key(public_key) else {
            debug!("Rejecting signature check against an invalid public key");
            return false;
        };
        let Ok(signature) = Self::to_secp256k1(sig) else {
            return false;
        };
        let message = Message::from_digest(*msg);
        if SECP256K1
            .verify_ecdsa(&message, &signature.to_standard(), &expected)
            .is_err()
        {
            return false;
        }
        // the recovery id must point back at the same key
        SECP256K1
            .recover_ecdsa(&message, &signature)
            .is_ok_and(|recovered| recovered == expected)
    }

    fn public_key(&self, private_key: &[u8; 32]) -> Result<H512, CryptoError> {
        let secret_key =
            SecretKey::from_slice(private_key).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(encode_public_key(&secret_key.public_key(SECP256K1)))
    }
}
