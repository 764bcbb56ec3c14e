use crate::{crypto::Algorithm, params::parse::ParseError};
use http::header::ToStrError;
use miette::Diagnostic;
use strum::AsRefStr;
use thiserror::Error;

/// Kind of a verification failure
///
/// Use this (or the `is_*` predicates on [`Error`]) to branch on failures instead of matching on messages
#[derive(AsRefStr, Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Neither of the signature headers is present
    NotSigned,

    /// The signature headers are present but can't be interpreted
    MalformedSignature,

    /// None of the declared key IDs is registered
    UnknownKey,

    /// The declared algorithm doesn't match the algorithm registered for the key
    AlgMismatch,

    /// The cryptographic check failed
    InvalidSignature,

    /// The signature is past its expiry
    SignatureExpired,
}

/// Reason the signature headers couldn't be interpreted
#[derive(Debug, Diagnostic, Error)]
pub enum Malformed {
    /// Only one of the two signature headers is present
    #[error("Missing '{0}' header")]
    MissingHeader(&'static str),

    /// Header value contains characters outside of visible ASCII
    #[error(transparent)]
    HeaderValue(#[from] ToStrError),

    /// `Signature` and `Signature-Input` declare a different amount of signatures
    #[error("Signature headers declare {signatures} signatures but {inputs} inputs")]
    LengthMismatch {
        /// Amount of members in the `Signature` header
        signatures: usize,

        /// Amount of members in the `Signature-Input` header
        inputs: usize,
    },

    /// Structured header value failed to parse
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// `Signature` header has no value for the selected signature ID
    #[error("No signature value for '{0}'")]
    MissingSignatureValue(String),

    /// Signature value isn't valid Base64
    #[error(transparent)]
    Base64(#[from] base64_simd::Error),

    /// Signature base couldn't be constructed from the message
    #[error(transparent)]
    #[diagnostic(transparent)]
    SignatureBase(#[from] crate::signature_base::Error),
}

/// Verification error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Neither `Signature` nor `Signature-Input` is present
    #[error("Signature headers not found")]
    NotSigned,

    /// Signature headers are present but malformed
    #[error(transparent)]
    #[diagnostic(transparent)]
    MalformedSignature(#[from] Malformed),

    /// No declared key ID is registered
    #[error("Unknown key ID")]
    UnknownKey,

    /// Declared algorithm differs from the registered one
    #[error("Key '{key_id}' is registered for {expected} but the signature declares '{declared}'")]
    AlgMismatch {
        /// Key ID of the selected signature
        key_id: String,

        /// Algorithm registered for the key
        expected: Algorithm,

        /// Algorithm declared by the signature
        declared: String,
    },

    /// Cryptographic verification failed
    #[error("Invalid signature for key '{key_id}'")]
    InvalidSignature {
        /// Key ID of the selected signature
        key_id: String,
    },

    /// Signature expired
    #[error("Signature for key '{key_id}' expired at {expires}")]
    SignatureExpired {
        /// Key ID of the selected signature
        key_id: String,

        /// Expiry as a UNIX timestamp
        expires: u64,
    },
}

impl Error {
    /// Kind of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotSigned => ErrorKind::NotSigned,
            Self::MalformedSignature(..) => ErrorKind::MalformedSignature,
            Self::UnknownKey => ErrorKind::UnknownKey,
            Self::AlgMismatch { .. } => ErrorKind::AlgMismatch,
            Self::InvalidSignature { .. } => ErrorKind::InvalidSignature,
            Self::SignatureExpired { .. } => ErrorKind::SignatureExpired,
        }
    }

    /// Neither signature header was present
    #[must_use]
    pub fn is_not_signed(&self) -> bool {
        self.kind() == ErrorKind::NotSigned
    }

    /// Signature headers couldn't be interpreted
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.kind() == ErrorKind::MalformedSignature
    }

    /// No key ID was registered
    #[must_use]
    pub fn is_unknown_key(&self) -> bool {
        self.kind() == ErrorKind::UnknownKey
    }

    /// Declared and registered algorithm differ
    #[must_use]
    pub fn is_alg_mismatch(&self) -> bool {
        self.kind() == ErrorKind::AlgMismatch
    }

    /// Cryptographic check failed
    #[must_use]
    pub fn is_invalid_signature(&self) -> bool {
        self.kind() == ErrorKind::InvalidSignature
    }

    /// Signature is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.kind() == ErrorKind::SignatureExpired
    }
}

impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Self::MalformedSignature(value.into())
    }
}

impl From<crate::signature_base::Error> for Error {
    fn from(value: crate::signature_base::Error) -> Self {
        Self::MalformedSignature(value.into())
    }
}

impl From<base64_simd::Error> for Error {
    fn from(value: base64_simd::Error) -> Self {
        Self::MalformedSignature(value.into())
    }
}

impl From<ToStrError> for Error {
    fn from(value: ToStrError) -> Self {
        Self::MalformedSignature(value.into())
    }
}
