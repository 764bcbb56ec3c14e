//!
//! Parse public keys for use with the verifier
//!

use super::VerifyingKey;
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1};
use miette::Diagnostic;
use pkcs8::{Document, SubjectPublicKeyInfoRef};
use thiserror::Error;

/// Key parsing error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Malformed DER structure
    #[error(transparent)]
    Der(#[from] pkcs8::der::Error),

    /// Malformed algorithm parameters
    #[error(transparent)]
    Spki(#[from] pkcs8::spki::Error),

    /// Malformed RSA public key
    #[error(transparent)]
    Rsa(#[from] rsa::pkcs1::Error),

    /// Malformed key
    #[error("Malformed key")]
    MalformedKey,

    /// Elliptic curve other than P-256
    #[error("Unsupported curve")]
    UnsupportedCurve,

    /// Unknown key type
    #[error("Unknown key type")]
    UnknownKeyType,
}

/// Parse a public key from its SPKI PEM form
///
/// Currently supported algorithms:
///
/// - RSA (verifies RSA-PSS-SHA512)
/// - EC on curve P-256 (verifies ECDSA-P256-SHA256)
#[inline]
pub fn public_key(pem: &str) -> Result<VerifyingKey, Error> {
    let (_pem_tag, document) = Document::from_pem(pem)?;
    let spki: SubjectPublicKeyInfoRef<'_> = document.decode_msg()?;

    let raw_bytes = spki
        .subject_public_key
        .as_bytes()
        .ok_or(Error::MalformedKey)?;

    if spki.algorithm.oid == RSA_ENCRYPTION {
        VerifyingKey::rsa_pss_sha512(raw_bytes)
    } else if spki.algorithm.oid == ID_EC_PUBLIC_KEY {
        if spki.algorithm.parameters_oid()? != SECP_256_R_1 {
            return Err(Error::UnsupportedCurve);
        }

        Ok(VerifyingKey::ecdsa_p256_sha256(raw_bytes))
    } else {
        Err(Error::UnknownKeyType)
    }
}
