use crate::{
    clock::Clock,
    crypto::Accumulator,
    error::Malformed,
    message::SignableMessage,
    params::{parse, SignatureParams},
    registry::KeyRegistry,
    signature_base, Error, Result, SIGNATURE, SIGNATURE_INPUT,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::{sync::Arc, time::Duration};
use tracing::{debug, instrument};
use typed_builder::TypedBuilder;

/// Successfully verified signature
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Verified {
    /// ID of the signature inside of the dictionary headers
    pub signature_id: String,

    /// ID of the key the signature was verified with
    pub key_id: String,

    /// Parameters of the verified signature
    pub params: SignatureParams,
}

/// Values of all header lines with the name, joined with `", "`
///
/// Empty values count as absent
fn combined_header(headers: &HeaderMap, name: &HeaderName) -> Result<Option<String>> {
    let value = headers
        .get_all(name)
        .iter()
        .map(HeaderValue::to_str)
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");

    Ok((!value.trim().is_empty()).then_some(value))
}

/// HTTP message signature verifier
///
/// Cheap to clone and safe to share between threads. Every call to [`Verifier::verify`] reads the clock anew.
#[derive(Clone, Debug, TypedBuilder)]
pub struct Verifier {
    /// Keys signatures can be verified with
    #[builder(setter(into))]
    registry: Arc<KeyRegistry>,

    /// Clock used for the expiry check
    ///
    /// Defaults to the system clock
    #[builder(default)]
    clock: Clock,

    /// Grace period after the declared expiry during which the signature is still accepted
    ///
    /// Defaults to zero
    #[builder(default)]
    expiry_leeway: Duration,
}

impl Verifier {
    /// Registry of this verifier
    #[must_use]
    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    /// Verify the signature of an HTTP message
    ///
    /// When the headers carry multiple signatures, the first one (in header order) whose key ID is registered gets verified.
    /// The remaining signatures are ignored.
    #[instrument(skip_all, fields(method = %message.method(), uri = %message.uri()))]
    pub fn verify<M>(&self, message: &M) -> Result<Verified>
    where
        M: SignableMessage + ?Sized,
    {
        self.verify_message(message).inspect_err(|error| {
            debug!(kind = error.kind().as_ref(), %error, "signature verification failed");
        })
    }

    fn verify_message<M>(&self, message: &M) -> Result<Verified>
    where
        M: SignableMessage + ?Sized,
    {
        let headers = message.headers();
        let (signature, signature_input) = match (
            combined_header(headers, &SIGNATURE)?,
            combined_header(headers, &SIGNATURE_INPUT)?,
        ) {
            (None, None) => return Err(Error::NotSigned),
            (Some(..), None) => return Err(Malformed::MissingHeader("Signature-Input").into()),
            (None, Some(..)) => return Err(Malformed::MissingHeader("Signature").into()),
            (Some(signature), Some(signature_input)) => (signature, signature_input),
        };

        let signatures = parse::members(&signature)?;
        let inputs = parse::members(&signature_input)?;
        if signatures.len() != inputs.len() {
            return Err(Malformed::LengthMismatch {
                signatures: signatures.len(),
                inputs: inputs.len(),
            }
            .into());
        }

        let inputs = inputs
            .into_iter()
            .map(|member| {
                parse::params(member.value)
                    .map(|params| (member, params))
                    .map_err(|error| error.offset_by(member.offset))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let Some((member, params, entry)) = inputs.into_iter().find_map(|(member, params)| {
            let entry = self.registry.get(&params.key_id);
            if entry.is_none() {
                debug!(signature_id = member.id, key_id = %params.key_id, "skipping signature with unknown key");
            }

            entry.map(|entry| (member, params, entry))
        }) else {
            return Err(Error::UnknownKey);
        };
        debug!(signature_id = member.id, key_id = %params.key_id, "selected signature");

        let encoded = signatures
            .iter()
            .find(|signature| signature.id == member.id)
            .ok_or_else(|| Malformed::MissingSignatureValue(member.id.to_string()))?;
        let encoded_value =
            parse::byte_sequence(encoded.value).map_err(|error| error.offset_by(encoded.offset))?;
        let raw_signature = base64_simd::STANDARD.decode_to_vec(encoded_value)?;

        if let (Some(expected), Some(declared)) = (entry.algorithm(), params.declared_algorithm()) {
            if declared != expected.as_ref() {
                return Err(Error::AlgMismatch {
                    key_id: params.key_id.clone(),
                    expected,
                    declared: declared.to_string(),
                });
            }
        }

        let signature_base = signature_base::construct_received(message, &params, member.value)?;

        let mut verifier = entry.verifier();
        verifier.absorb(signature_base.as_bytes());
        verifier
            .finalize(&raw_signature)
            .map_err(|_| Error::InvalidSignature {
                key_id: params.key_id.clone(),
            })?;

        if let Some(expires) = params.expires {
            let deadline = expires.saturating_add(self.expiry_leeway.as_secs());
            if deadline < self.clock.unix_timestamp() {
                return Err(Error::SignatureExpired {
                    key_id: params.key_id.clone(),
                    expires,
                });
            }
        }

        Ok(Verified {
            signature_id: member.id.to_string(),
            key_id: params.key_id.clone(),
            params,
        })
    }
}
