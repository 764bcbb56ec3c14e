//!
//! Construction of the signature base, the exact byte string a signature covers
//!

use crate::{
    message::SignableMessage,
    params::{Component, SignatureParams, REQUEST_TARGET},
};
use http::{header::ToStrError, HeaderName};
use miette::Diagnostic;
use std::fmt::Write;
use thiserror::Error;

const SIGNATURE_PARAMS: &str = "@signature-params";

/// Signature base error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Header had an invalid value (non visible ASCII value)
    #[error(transparent)]
    InvalidHeaderValue(#[from] ToStrError),

    /// Covered header is missing from the message
    #[error("Covered header '{0}' is missing from the message")]
    MissingHeader(HeaderName),

    /// URI has neither a path nor a query
    #[error("Request target can't be represented")]
    UnrepresentableTarget,
}

fn write_request_target<M>(buffer: &mut String, message: &M) -> Result<(), Error>
where
    M: SignableMessage + ?Sized,
{
    let uri = message.uri();
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |path_and_query| path_and_query.as_str());

    if target.is_empty() {
        return Err(Error::UnrepresentableTarget);
    }

    let method = message.method().as_str().to_lowercase();
    let _ = writeln!(buffer, "{REQUEST_TARGET}: {method} {target}");

    Ok(())
}

fn write_header<M>(buffer: &mut String, message: &M, name: &HeaderName) -> Result<(), Error>
where
    M: SignableMessage + ?Sized,
{
    let mut values = message.headers().get_all(name).iter().peekable();
    if values.peek().is_none() {
        return Err(Error::MissingHeader(name.clone()));
    }

    let _ = write!(buffer, "{name}: ");
    for (idx, value) in values.enumerate() {
        if idx > 0 {
            buffer.push_str(", ");
        }

        buffer.push_str(value.to_str()?.trim_matches([' ', '\t']));
    }
    buffer.push('\n');

    Ok(())
}

fn write_components<M>(message: &M, params: &SignatureParams) -> Result<String, Error>
where
    M: SignableMessage + ?Sized,
{
    let mut signature_base = String::new();
    for component in &params.components {
        match component {
            Component::RequestTarget => write_request_target(&mut signature_base, message)?,
            Component::Header(name) => write_header(&mut signature_base, message, name)?,
        }
    }

    Ok(signature_base)
}

/// Construct the signature base of a message for the given signature parameters
///
/// One line per covered component, in the listed order, followed by the `@signature-params` line.
/// Multiple values of the same header are trimmed and joined with `", "`.
/// The parameters are serialised in their canonical order.
///
/// ```text
/// date: Sun, 05 Jan 2014 21:31:40 GMT
/// @request-target: get /foo?param=value&pet=dog
/// @signature-params: ("date" "@request-target");keyid="key1"
/// ```
pub fn construct<M>(message: &M, params: &SignatureParams) -> Result<String, Error>
where
    M: SignableMessage + ?Sized,
{
    let mut signature_base = write_components(message, params)?;

    // The parameters line doesn't end with a new-line
    let _ = write!(signature_base, "{SIGNATURE_PARAMS}: {params}");

    Ok(signature_base)
}

/// Construct the signature base of a message for parameters parsed from a `Signature-Input` member
///
/// Same as [`construct`], except that the `@signature-params` line carries `serialised`, the member value
/// the parameters were parsed from, byte for byte. Parameter order and integer formatting stay as the signer chose them.
pub fn construct_received<M>(
    message: &M,
    params: &SignatureParams,
    serialised: &str,
) -> Result<String, Error>
where
    M: SignableMessage + ?Sized,
{
    let mut signature_base = write_components(message, params)?;
    signature_base.push_str(SIGNATURE_PARAMS);
    signature_base.push_str(": ");
    signature_base.push_str(serialised);

    Ok(signature_base)
}

#[cfg(test)]
mod test {
    use super::Error;
    use crate::params::{parse, Component, SignatureParams};
    use http::{
        header::{CONTENT_TYPE, DATE, HOST},
        HeaderName, HeaderValue, Method, Request, Uri,
    };

    const BASIC_SIGNATURE_BASE: &str = "@request-target: get /foo?param=value&pet=dog\nhost: example.com\ndate: Sun, 05 Jan 2014 21:31:40 GMT\n@signature-params: (\"@request-target\" \"host\" \"date\");keyid=\"Test\"";

    fn request(method: Method) -> Request<()> {
        Request::builder()
            .method(method)
            .uri(Uri::from_static("/foo?param=value&pet=dog"))
            .header("Host", "example.com")
            .header("Date", "Sun, 05 Jan 2014 21:31:40 GMT")
            .header("Content-Type", "application/json")
            .body(())
            .unwrap()
    }

    #[test]
    fn basic_signature_base() {
        let params = SignatureParams::new(
            "Test",
            [
                Component::RequestTarget,
                Component::Header(HOST),
                Component::Header(DATE),
            ],
        );
        let signature_base = super::construct(&request(Method::GET), &params).unwrap();

        assert_eq!(signature_base, BASIC_SIGNATURE_BASE);
    }

    #[test]
    fn order_is_preserved() {
        let params = SignatureParams::new(
            "Test",
            [Component::Header(DATE), Component::RequestTarget],
        );
        let signature_base = super::construct(&request(Method::POST), &params).unwrap();

        assert_eq!(
            signature_base,
            "date: Sun, 05 Jan 2014 21:31:40 GMT\n@request-target: post /foo?param=value&pet=dog\n@signature-params: (\"date\" \"@request-target\");keyid=\"Test\""
        );
    }

    #[test]
    fn multiple_values_are_joined() {
        let mut request = request(Method::GET);
        let custom = HeaderName::from_static("x-custom");
        request
            .headers_mut()
            .append(&custom, HeaderValue::from_static("  first "));
        request
            .headers_mut()
            .append(&custom, HeaderValue::from_static("\tsecond, third"));
        request
            .headers_mut()
            .append(&custom, HeaderValue::from_static(""));

        let params = SignatureParams::new("Test", [Component::Header(custom)]);
        let signature_base = super::construct(&request, &params).unwrap();

        assert_eq!(
            signature_base,
            "x-custom: first, second, third, \n@signature-params: (\"x-custom\");keyid=\"Test\""
        );
    }

    #[test]
    fn received_params_line_is_verbatim() {
        let serialised = r#"("date" "@request-target");created=0001618884473;keyid="Test""#;
        let params = parse::params(serialised).unwrap();

        let signature_base =
            super::construct_received(&request(Method::GET), &params, serialised).unwrap();
        assert_eq!(
            signature_base,
            "date: Sun, 05 Jan 2014 21:31:40 GMT\n@request-target: get /foo?param=value&pet=dog\n@signature-params: (\"date\" \"@request-target\");created=0001618884473;keyid=\"Test\""
        );

        let canonical = super::construct(&request(Method::GET), &params).unwrap();
        assert!(canonical.ends_with(
            r#"@signature-params: ("date" "@request-target");keyid="Test";created=1618884473"#
        ));
    }

    #[test]
    fn missing_header() {
        let mut request = request(Method::GET);
        request.headers_mut().remove(CONTENT_TYPE);

        let params = SignatureParams::new("Test", [Component::Header(CONTENT_TYPE)]);
        let error = super::construct(&request, &params).unwrap_err();

        assert!(matches!(error, Error::MissingHeader(name) if name == CONTENT_TYPE));
    }

    #[test]
    fn non_ascii_header_value() {
        let mut request = request(Method::GET);
        request.headers_mut().insert(
            DATE,
            HeaderValue::from_bytes(b"Sun, 05 Jan 2014 \xff").unwrap(),
        );

        let params = SignatureParams::new("Test", [Component::Header(DATE)]);
        let error = super::construct(&request, &params).unwrap_err();

        assert!(matches!(error, Error::InvalidHeaderValue(..)));
    }

    #[test]
    fn authority_form_target() {
        let request = Request::builder()
            .method(Method::CONNECT)
            .uri("example.com:443")
            .body(())
            .unwrap();

        let params = SignatureParams::new("Test", [Component::RequestTarget]);
        let error = super::construct(&request, &params).unwrap_err();

        assert!(matches!(error, Error::UnrepresentableTarget));
    }

    #[test]
    fn absolute_uri_target() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("https://example.com/resource/1?force=true")
            .body(())
            .unwrap();

        let params = SignatureParams::new("Test", [Component::RequestTarget]);
        let signature_base = super::construct(&request, &params).unwrap();

        assert!(signature_base.starts_with("@request-target: delete /resource/1?force=true\n"));
    }
}
