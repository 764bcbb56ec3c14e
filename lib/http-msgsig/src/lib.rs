//!
//! HTTP message signature verification
//!
//! Verifies the `Signature`/`Signature-Input` header pair against a registry of keys.
//! Supported algorithms are HMAC-SHA256, RSA-PSS-SHA512 and ECDSA-P256-SHA256.
//!
//! ```
//! use http_msgsig::{KeyEntry, KeyRegistry, Verifier};
//!
//! let registry = KeyRegistry::new().with("key1", KeyEntry::hmac_sha256(b"secret"));
//! let verifier = Verifier::builder().registry(registry).build();
//!
//! let request = http::Request::get("/foo").body(()).unwrap();
//! let error = verifier.verify(&request).unwrap_err();
//! assert!(error.is_not_signed());
//! ```
//!

#![forbid(rust_2018_idioms, unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use http::HeaderName;

pub use self::{
    error::{Error, ErrorKind, Malformed},
    message::SignableMessage,
    params::{Component, SignatureParams},
    registry::{KeyEntry, KeyRegistry},
    verifier::{Verified, Verifier},
};

pub mod clock;
pub mod crypto;
pub mod params;
pub mod signature_base;

mod error;
mod message;
mod registry;
mod verifier;

type Result<T, E = Error> = std::result::Result<T, E>;

/// Name of the header carrying the encoded signatures
pub static SIGNATURE: HeaderName = HeaderName::from_static("signature");

/// Name of the header carrying the signature parameters
pub static SIGNATURE_INPUT: HeaderName = HeaderName::from_static("signature-input");
