use super::{Accumulator, VerifyError};
use itertools::Itertools;
use ring::{hmac, signature::UnparsedPublicKey};
use rsa::{pss::Pss, traits::PublicKeyParts, RsaPublicKey};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// HMAC-SHA256 verification state
///
/// Streams the signature base into the MAC and compares the tags in constant time
pub struct HmacSha256 {
    context: hmac::Context,
}

impl HmacSha256 {
    pub(super) fn new(key: &hmac::Key) -> Self {
        Self {
            context: hmac::Context::with_key(key),
        }
    }
}

impl Accumulator for HmacSha256 {
    fn absorb(&mut self, bytes: &[u8]) {
        self.context.update(bytes);
    }

    fn finalize(self, signature: &[u8]) -> Result<(), VerifyError> {
        let tag = self.context.sign();
        if tag.as_ref().ct_eq(signature).into() {
            Ok(())
        } else {
            Err(VerifyError)
        }
    }
}

/// RSA-PSS-SHA512 verification state
///
/// Streams the signature base into SHA-512. The signature is accepted with a salt as long as the digest
/// or with the longest salt the modulus allows.
pub struct RsaPssSha512<'a> {
    key: &'a RsaPublicKey,
    digest: Sha512,
}

impl<'a> RsaPssSha512<'a> {
    pub(super) fn new(key: &'a RsaPublicKey) -> Self {
        Self {
            key,
            digest: Sha512::new(),
        }
    }

    fn salt_lengths(&self) -> [usize; 2] {
        let digest_len = <Sha512 as Digest>::output_size();
        let encoded_len = (self.key.n().bits() + 6) / 8;

        [digest_len, encoded_len.saturating_sub(digest_len + 2)]
    }
}

impl Accumulator for RsaPssSha512<'_> {
    fn absorb(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    fn finalize(self, signature: &[u8]) -> Result<(), VerifyError> {
        let salt_lengths = self.salt_lengths();
        let hashed = self.digest.finalize();

        let verified = salt_lengths.into_iter().dedup().any(|salt_len| {
            self.key
                .verify(Pss::new_with_salt::<Sha512>(salt_len), &hashed, signature)
                .is_ok()
        });

        if verified {
            Ok(())
        } else {
            Err(VerifyError)
        }
    }
}

/// ECDSA-P256-SHA256 verification state
///
/// Expects ASN.1 DER encoded signatures. `ring` verifies complete messages, so the signature base is buffered.
pub struct EcdsaP256Sha256<'a> {
    key: &'a UnparsedPublicKey<Vec<u8>>,
    message: Vec<u8>,
}

impl<'a> EcdsaP256Sha256<'a> {
    pub(super) fn new(key: &'a UnparsedPublicKey<Vec<u8>>) -> Self {
        Self {
            key,
            message: Vec::new(),
        }
    }
}

impl Accumulator for EcdsaP256Sha256<'_> {
    fn absorb(&mut self, bytes: &[u8]) {
        self.message.extend_from_slice(bytes);
    }

    fn finalize(self, signature: &[u8]) -> Result<(), VerifyError> {
        self.key
            .verify(&self.message, signature)
            .map_err(|_| VerifyError)
    }
}

/// Verification state of any supported algorithm
#[non_exhaustive]
pub enum VerifierInstance<'a> {
    /// HMAC-SHA256
    HmacSha256(HmacSha256),

    /// RSA-PSS-SHA512
    RsaPssSha512(RsaPssSha512<'a>),

    /// ECDSA-P256-SHA256
    EcdsaP256Sha256(EcdsaP256Sha256<'a>),
}

impl Accumulator for VerifierInstance<'_> {
    fn absorb(&mut self, bytes: &[u8]) {
        match self {
            Self::HmacSha256(inner) => inner.absorb(bytes),
            Self::RsaPssSha512(inner) => inner.absorb(bytes),
            Self::EcdsaP256Sha256(inner) => inner.absorb(bytes),
        }
    }

    fn finalize(self, signature: &[u8]) -> Result<(), VerifyError> {
        match self {
            Self::HmacSha256(inner) => inner.finalize(signature),
            Self::RsaPssSha512(inner) => inner.finalize(signature),
            Self::EcdsaP256Sha256(inner) => inner.finalize(signature),
        }
    }
}
