use crate::{args::VerifyArgs, verdict::Verdict};
use http::Request;
use http_msgsig::{crypto, KeyEntry, KeyRegistry, Verifier, SIGNATURE, SIGNATURE_INPUT};
use miette::{miette, IntoDiagnostic, WrapErr};
use std::fs;

fn registry(args: &VerifyArgs) -> miette::Result<KeyRegistry> {
    let mut registry = KeyRegistry::new();
    for (key_id, secret) in &args.hmac_keys {
        registry.insert(key_id.as_str(), KeyEntry::hmac_sha256(secret.as_bytes()));
    }

    for (key_id, path) in &args.public_keys {
        let pem = fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read the public key of '{key_id}' from {path}"))?;
        let key = crypto::parse::public_key(&pem)
            .wrap_err_with(|| format!("Failed to parse the public key of '{key_id}'"))?;

        registry.insert(key_id.as_str(), KeyEntry::new(key));
    }

    Ok(registry)
}

fn request(args: &VerifyArgs) -> miette::Result<Request<()>> {
    let mut builder = Request::builder()
        .method(args.method.as_str())
        .uri(args.uri.as_str());

    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| miette!("Malformed header '{header}', expected 'Name: value'"))?;
        builder = builder.header(name.trim(), value.trim());
    }

    if let Some(ref signature_input) = args.signature_input {
        builder = builder.header(&SIGNATURE_INPUT, signature_input.as_str());
    }
    if let Some(ref signature) = args.signature {
        builder = builder.header(&SIGNATURE, signature.as_str());
    }

    builder
        .body(())
        .into_diagnostic()
        .wrap_err("Failed to assemble the request")
}

pub fn do_it(args: &VerifyArgs) -> miette::Result<()> {
    let registry = registry(args)?;
    if registry.is_empty() {
        tracing::warn!("no keys registered, every signature will be rejected");
    }

    let request = request(args)?;
    let verifier = Verifier::builder().registry(registry).build();

    match verifier.verify(&request) {
        Ok(verified) => {
            println!(
                "{}",
                Verdict::Pass(format!(
                    "Signature '{}' verified with key '{}'",
                    verified.signature_id, verified.key_id
                ))
            );

            Ok(())
        }
        Err(error) => {
            eprintln!("{}", Verdict::Fail(error.kind().as_ref()));
            Err(error.into())
        }
    }
}
