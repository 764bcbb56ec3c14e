use crate::crypto::{parse, Algorithm, VerifierInstance, VerifyingKey};
use std::collections::HashMap;

/// Registered key
#[derive(Debug)]
pub struct KeyEntry {
    key: VerifyingKey,
    algorithm: Option<Algorithm>,
}

impl KeyEntry {
    /// Entry for the key, expecting signatures to declare the key's algorithm (if they declare one)
    #[must_use]
    pub fn new(key: VerifyingKey) -> Self {
        Self {
            algorithm: Some(key.algorithm()),
            key,
        }
    }

    /// Entry for an HMAC-SHA256 shared secret
    #[must_use]
    pub fn hmac_sha256(secret: &[u8]) -> Self {
        Self::new(VerifyingKey::hmac_sha256(secret))
    }

    /// Entry for a DER-encoded RSA public key
    pub fn rsa_pss_sha512(public_key: &[u8]) -> Result<Self, parse::Error> {
        VerifyingKey::rsa_pss_sha512(public_key).map(Self::new)
    }

    /// Entry for an uncompressed P-256 public key
    #[must_use]
    pub fn ecdsa_p256_sha256(public_key: impl Into<Vec<u8>>) -> Self {
        Self::new(VerifyingKey::ecdsa_p256_sha256(public_key))
    }

    /// Don't compare the algorithm declared by signatures with the key's algorithm
    #[must_use]
    pub fn without_algorithm_check(mut self) -> Self {
        self.algorithm = None;
        self
    }

    /// Algorithm signatures have to declare, if any
    #[must_use]
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    /// Key of the entry
    #[must_use]
    pub fn key(&self) -> &VerifyingKey {
        &self.key
    }

    /// Fresh single-use verification state for one message
    #[must_use]
    pub fn verifier(&self) -> VerifierInstance<'_> {
        self.key.verifier()
    }
}

/// Immutable mapping of key IDs to keys
///
/// Built once, then shared between any amount of concurrent verifications
#[derive(Debug, Default)]
pub struct KeyRegistry {
    entries: HashMap<String, KeyEntry>,
}

impl KeyRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any previous entry with the same key ID
    #[must_use]
    pub fn with(mut self, key_id: impl Into<String>, entry: KeyEntry) -> Self {
        self.insert(key_id, entry);
        self
    }

    /// Add an entry, returning the entry it replaced
    pub fn insert(&mut self, key_id: impl Into<String>, entry: KeyEntry) -> Option<KeyEntry> {
        self.entries.insert(key_id.into(), entry)
    }

    /// Look up the entry of a key ID
    #[must_use]
    pub fn get(&self, key_id: &str) -> Option<&KeyEntry> {
        self.entries.get(key_id)
    }

    /// Amount of registered keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K> FromIterator<(K, KeyEntry)> for KeyRegistry
where
    K: Into<String>,
{
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (K, KeyEntry)>,
    {
        Self {
            entries: iter
                .into_iter()
                .map(|(key_id, entry)| (key_id.into(), entry))
                .collect(),
        }
    }
}
