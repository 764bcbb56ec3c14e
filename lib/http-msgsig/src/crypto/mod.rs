//!
//! Signature algorithms and the keys they verify with
//!

use miette::Diagnostic;
use ring::{
    hmac,
    signature::{UnparsedPublicKey, ECDSA_P256_SHA256_ASN1},
};
use rsa::{pkcs1::DecodeRsaPublicKey, RsaPublicKey};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

mod verify;

pub mod parse;

pub use self::verify::{EcdsaP256Sha256, HmacSha256, RsaPssSha512, VerifierInstance};

/// Verification error
#[derive(Debug, Diagnostic, Error)]
#[error("Verification failed")]
pub struct VerifyError;

/// Signature algorithm
#[derive(AsRefStr, Clone, Copy, Debug, Display, EnumString, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Algorithm {
    /// HMAC using SHA-256
    #[strum(serialize = "hmac-sha256")]
    HmacSha256,

    /// RSASSA-PSS using SHA-512
    #[strum(serialize = "rsa-pss-sha512")]
    RsaPssSha512,

    /// ECDSA using curve P-256 and SHA-256
    #[strum(serialize = "ecdsa-p256-sha256")]
    EcdsaP256Sha256,
}

/// Single-use verification state
///
/// Absorbs the signature base (in one or multiple ordered writes) and is consumed by checking the signature
pub trait Accumulator {
    /// Feed bytes of the signature base
    fn absorb(&mut self, bytes: &[u8]);

    /// Check the absorbed bytes against the raw (already Base64-decoded) signature
    fn finalize(self, signature: &[u8]) -> Result<(), VerifyError>;
}

/// Enum dispatch over the keys of the supported algorithms
#[derive(Debug)]
#[non_exhaustive]
pub enum VerifyingKey {
    /// Shared HMAC-SHA256 secret
    HmacSha256(hmac::Key),

    /// RSA public key
    RsaPssSha512(RsaPublicKey),

    /// P-256 public key
    EcdsaP256Sha256(UnparsedPublicKey<Vec<u8>>),
}

impl VerifyingKey {
    /// HMAC-SHA256 key from a shared secret
    #[must_use]
    pub fn hmac_sha256(secret: &[u8]) -> Self {
        Self::HmacSha256(hmac::Key::new(hmac::HMAC_SHA256, secret))
    }

    /// RSA-PSS-SHA512 key from a DER-encoded `RSAPublicKey` structure
    ///
    /// Moduli of up to 4096 bits are accepted
    pub fn rsa_pss_sha512(public_key: &[u8]) -> Result<Self, parse::Error> {
        RsaPublicKey::from_pkcs1_der(public_key)
            .map(Self::RsaPssSha512)
            .map_err(parse::Error::from)
    }

    /// ECDSA-P256-SHA256 key from an uncompressed SEC1 point
    #[must_use]
    pub fn ecdsa_p256_sha256(public_key: impl Into<Vec<u8>>) -> Self {
        Self::EcdsaP256Sha256(UnparsedPublicKey::new(
            &ECDSA_P256_SHA256_ASN1,
            public_key.into(),
        ))
    }

    /// Algorithm this key verifies
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::HmacSha256(..) => Algorithm::HmacSha256,
            Self::RsaPssSha512(..) => Algorithm::RsaPssSha512,
            Self::EcdsaP256Sha256(..) => Algorithm::EcdsaP256Sha256,
        }
    }

    /// Fresh verification state bound to this key
    #[must_use]
    pub fn verifier(&self) -> VerifierInstance<'_> {
        match self {
            Self::HmacSha256(key) => VerifierInstance::HmacSha256(HmacSha256::new(key)),
            Self::RsaPssSha512(key) => VerifierInstance::RsaPssSha512(RsaPssSha512::new(key)),
            Self::EcdsaP256Sha256(key) => {
                VerifierInstance::EcdsaP256Sha256(EcdsaP256Sha256::new(key))
            }
        }
    }
}
