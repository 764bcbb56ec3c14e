//!
//! Signature parameters and their canonical serialisation
//!

use http::HeaderName;
use itertools::Itertools;
use std::fmt::{self, Display, Write};

pub mod parse;

/// Wire token of the request target pseudo-component
pub const REQUEST_TARGET: &str = "@request-target";

/// Component covered by a signature
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Component {
    /// Lowercased method and path-and-query of the request
    RequestTarget,

    /// Value(s) of the named header
    Header(HeaderName),
}

impl Component {
    /// Identifier of the component as it appears in the covered component list
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::RequestTarget => REQUEST_TARGET,
            Self::Header(name) => name.as_str(),
        }
    }
}

/// Parameters of one signature, as declared in a `Signature-Input` member
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureParams {
    /// Covered components, in signing order
    pub components: Vec<Component>,

    /// Identifier of the key the signature was produced with
    pub key_id: String,

    /// Declared algorithm. An absent or empty value means "infer from the key"
    pub algorithm: Option<String>,

    /// Creation time as a UNIX timestamp
    pub created: Option<u64>,

    /// Expiry time as a UNIX timestamp
    pub expires: Option<u64>,

    /// Nonce chosen by the signer
    pub nonce: Option<String>,

    /// Application-specific tag
    pub tag: Option<String>,
}

impl SignatureParams {
    /// Parameters covering the given components, signed with the given key
    #[must_use]
    pub fn new<I>(key_id: impl Into<String>, components: I) -> Self
    where
        I: IntoIterator<Item = Component>,
    {
        Self {
            components: components.into_iter().collect(),
            key_id: key_id.into(),
            algorithm: None,
            created: None,
            expires: None,
            nonce: None,
            tag: None,
        }
    }

    /// Declared algorithm, with an empty value treated as absent
    #[must_use]
    pub fn declared_algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref().filter(|algorithm| !algorithm.is_empty())
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            f.write_char('\\')?;
        }
        f.write_char(ch)?;
    }
    f.write_char('"')
}

/// Canonical serialisation
///
/// Used for the `Signature-Input` member value and for the `@signature-params` line of the signature base.
/// Parameters are always emitted in the same order, independent of the order they were parsed in.
impl Display for SignatureParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({})",
            self.components
                .iter()
                .format_with(" ", |component, write| write(&format_args!(
                    "\"{}\"",
                    component.as_str()
                )))
        )?;

        f.write_str(";keyid=")?;
        write_string(f, &self.key_id)?;

        if let Some(ref algorithm) = self.algorithm {
            f.write_str(";alg=")?;
            write_string(f, algorithm)?;
        }

        if let Some(created) = self.created {
            write!(f, ";created={created}")?;
        }

        if let Some(expires) = self.expires {
            write!(f, ";expires={expires}")?;
        }

        if let Some(ref nonce) = self.nonce {
            f.write_str(";nonce=")?;
            write_string(f, nonce)?;
        }

        if let Some(ref tag) = self.tag {
            f.write_str(";tag=")?;
            write_string(f, tag)?;
        }

        Ok(())
    }
}
