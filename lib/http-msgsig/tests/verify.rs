use self::data::{DATE, HMAC_KEY_ID, HMAC_SECRET, PATH};
use http::{
    header::{CONTENT_TYPE, DATE as DATE_HEADER, HOST},
    HeaderValue, Method, Request,
};
use http_msgsig::{
    Component, Error, ErrorKind, KeyEntry, KeyRegistry, Malformed, SignatureParams, Verifier,
    SIGNATURE, SIGNATURE_INPUT,
};
use std::{sync::Arc, thread};


fn registry() -> KeyRegistry {
    KeyRegistry::new().with(HMAC_KEY_ID, KeyEntry::hmac_sha256(HMAC_SECRET))
}

fn verifier() -> Verifier {
    Verifier::builder().registry(registry()).build()
}

fn hmac_params(key_id: &str) -> SignatureParams {
    SignatureParams::new(
        key_id,
        [Component::Header(DATE_HEADER), Component::RequestTarget],
    )
}

fn signed_get() -> Request<()> {
    let request = Request::get("/foo")
        .header("Date", DATE)
        .body(())
        .unwrap();

    data::sign(request, "sig1", &hmac_params(HMAC_KEY_ID), |msg| {
        data::sign_hmac(HMAC_SECRET, msg)
    })
}

#[test]
fn sign_then_verify() {
    let verified = verifier().verify(&signed_get()).unwrap();
    assert_eq!(verified.signature_id, "sig1");
    assert_eq!(verified.key_id, HMAC_KEY_ID);
    assert_eq!(verified.params, hmac_params(HMAC_KEY_ID));
}

#[test]
fn tampered_date() {
    let mut request = signed_get();
    request.headers_mut().insert(
        DATE_HEADER,
        HeaderValue::from_static("Sun, 05 Jan 2014 21:31:41 GMT"),
    );

    let error = verifier().verify(&request).unwrap_err();
    assert!(error.is_invalid_signature());
    assert!(matches!(error, Error::InvalidSignature { ref key_id } if key_id == HMAC_KEY_ID));
}

#[test]
fn not_signed() {
    let request = data::request(Method::GET);
    let error = verifier().verify(&request).unwrap_err();

    assert!(error.is_not_signed());
    assert_eq!(error.kind(), ErrorKind::NotSigned);
}

#[test]
fn one_header_only() {
    let mut request = signed_get();
    request.headers_mut().remove(&SIGNATURE);
    let error = verifier().verify(&request).unwrap_err();
    assert!(matches!(
        error,
        Error::MalformedSignature(Malformed::MissingHeader("Signature"))
    ));

    let mut request = signed_get();
    request.headers_mut().remove(&SIGNATURE_INPUT);
    let error = verifier().verify(&request).unwrap_err();
    assert!(matches!(
        error,
        Error::MalformedSignature(Malformed::MissingHeader("Signature-Input"))
    ));
}

#[test]
fn length_mismatch() {
    let mut request = signed_get();
    request.headers_mut().append(
        &SIGNATURE_INPUT,
        HeaderValue::from_static(r#"sig2=("date");keyid="other""#),
    );

    let error = verifier().verify(&request).unwrap_err();
    assert!(matches!(
        error,
        Error::MalformedSignature(Malformed::LengthMismatch {
            signatures: 1,
            inputs: 2,
        })
    ));
}

#[test]
fn malformed_input_anywhere() {
    let request = data::sign(
        data::request(Method::GET),
        "sig1",
        &hmac_params(HMAC_KEY_ID),
        |msg| data::sign_hmac(HMAC_SECRET, msg),
    );
    let request = data::with_headers(request, r#"sig2=("date");keyid=42"#, "sig2=:AAAA:");

    let error = verifier().verify(&request).unwrap_err();
    assert!(error.is_malformed(), "{error:?}");
}

#[test]
fn unknown_key() {
    let request = data::sign(
        data::request(Method::GET),
        "sig1",
        &hmac_params("unregistered"),
        |msg| data::sign_hmac(HMAC_SECRET, msg),
    );

    let error = verifier().verify(&request).unwrap_err();
    assert!(error.is_unknown_key());
}

#[test]
fn first_registered_key_wins() {
    let sign_known = |request| {
        data::sign(request, "known", &hmac_params(HMAC_KEY_ID), |msg| {
            data::sign_hmac(HMAC_SECRET, msg)
        })
    };
    let sign_unknown = |request| {
        data::sign(request, "unknown", &hmac_params("other"), |msg| {
            data::sign_hmac(b"other", msg)
        })
    };

    let unknown_first = sign_known(sign_unknown(data::request(Method::GET)));
    let known_first = sign_unknown(sign_known(data::request(Method::GET)));

    for request in [unknown_first, known_first] {
        let verified = verifier().verify(&request).unwrap();
        assert_eq!(verified.signature_id, "known");
    }
}

#[test]
fn only_first_registered_key_is_checked() {
    let registry = registry().with("key2", KeyEntry::hmac_sha256(b"t"));
    let verifier = Verifier::builder().registry(registry).build();

    let request = data::sign(
        data::request(Method::GET),
        "first",
        &hmac_params(HMAC_KEY_ID),
        |msg| data::sign_hmac(b"wrong secret", msg),
    );
    let request = data::sign(request, "second", &hmac_params("key2"), |msg| {
        data::sign_hmac(b"t", msg)
    });

    let error = verifier.verify(&request).unwrap_err();
    assert!(error.is_invalid_signature());
}

#[test]
fn alg_mismatch() {
    let mut params = hmac_params(HMAC_KEY_ID);
    params.algorithm = Some("rsa-pss-sha512".into());

    // Signed correctly, so only the algorithm check can reject it
    let request = data::sign(data::request(Method::GET), "sig1", &params, |msg| {
        data::sign_hmac(HMAC_SECRET, msg)
    });

    let error = verifier().verify(&request).unwrap_err();
    assert!(error.is_alg_mismatch());
    assert_eq!(
        error.to_string(),
        "Key 'key1' is registered for hmac-sha256 but the signature declares 'rsa-pss-sha512'"
    );
}

#[test]
fn alg_mismatch_precedes_signature_check() {
    let request = data::with_headers(
        data::request(Method::GET),
        r#"sig1=("date");keyid="key1";alg="rsa-pss-sha512""#,
        "sig1=:AAAA:",
    );

    let error = verifier().verify(&request).unwrap_err();
    assert!(error.is_alg_mismatch(), "{error:?}");
    assert!(matches!(
        error,
        Error::AlgMismatch { ref declared, .. } if declared == "rsa-pss-sha512"
    ));
}

#[test]
fn alg_check_can_be_disabled() {
    let registry = KeyRegistry::new().with(
        HMAC_KEY_ID,
        KeyEntry::hmac_sha256(HMAC_SECRET).without_algorithm_check(),
    );
    let verifier = Verifier::builder().registry(registry).build();

    let mut params = hmac_params(HMAC_KEY_ID);
    params.algorithm = Some("hs2019".into());
    let request = data::sign(data::request(Method::GET), "sig1", &params, |msg| {
        data::sign_hmac(HMAC_SECRET, msg)
    });

    verifier.verify(&request).unwrap();
}

#[test]
fn component_order_matters() {
    let signed = hmac_params(HMAC_KEY_ID);
    let request = data::sign(data::request(Method::GET), "sig1", &signed, |msg| {
        data::sign_hmac(HMAC_SECRET, msg)
    });

    let mut reordered = signed.clone();
    reordered.components.reverse();
    let mut request = request;
    request.headers_mut().insert(
        &SIGNATURE_INPUT,
        HeaderValue::from_str(&format!("sig1={reordered}")).unwrap(),
    );

    let error = verifier().verify(&request).unwrap_err();
    assert!(error.is_invalid_signature());
}

#[test]
fn params_are_signed_as_received() {
    let input = r#"("@request-target" "date");created=0001402170695;alg="hmac-sha256";keyid="key1""#;
    let signature_base =
        format!("@request-target: get {PATH}\ndate: {DATE}\n@signature-params: {input}");
    let signature = data::sign_hmac(HMAC_SECRET, signature_base.as_bytes());

    let request = data::with_headers(
        data::request(Method::GET),
        &format!("sig1={input}"),
        &format!(
            "sig1=:{}:",
            base64_simd::STANDARD.encode_to_string(signature)
        ),
    );

    let verified = verifier().verify(&request).unwrap();
    assert_eq!(verified.key_id, HMAC_KEY_ID);
    assert_eq!(verified.params.created, Some(1_402_170_695));
}

#[test]
fn missing_covered_header() {
    let params = SignatureParams::new(
        HMAC_KEY_ID,
        [Component::Header(HOST), Component::Header(CONTENT_TYPE)],
    );
    let mut request = data::request(Method::POST);
    request
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let mut request = data::sign(request, "sig1", &params, |msg| {
        data::sign_hmac(HMAC_SECRET, msg)
    });
    request.headers_mut().remove(CONTENT_TYPE);

    let error = verifier().verify(&request).unwrap_err();
    assert!(error.is_malformed());
}

#[test]
fn signature_without_colons() {
    let request = data::with_headers(
        data::request(Method::GET),
        r#"sig1=("date");keyid="key1""#,
        "sig1=AAAA",
    );

    let error = verifier().verify(&request).unwrap_err();
    assert!(error.is_malformed());
}

#[test]
fn invalid_base64() {
    let request = data::with_headers(
        data::request(Method::GET),
        r#"sig1=("date");keyid="key1""#,
        "sig1=:AAA:",
    );

    let error = verifier().verify(&request).unwrap_err();
    assert!(matches!(
        error,
        Error::MalformedSignature(Malformed::Base64(..))
    ));
}

#[test]
fn concurrent_verification() {
    let verifier = Arc::new(verifier());
    let signed = signed_get();
    let unsigned = data::request(Method::GET);

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..32 {
                    verifier.verify(&signed).unwrap();
                    assert!(verifier.verify(&unsigned).unwrap_err().is_not_signed());
                }
            });
        }
    });
}
