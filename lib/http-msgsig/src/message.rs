use http::{request::Parts, HeaderMap, Method, Request, Uri};

/// Message that carries HTTP signatures
///
/// The verifier only ever reads from it
pub trait SignableMessage {
    /// HTTP method of the request
    fn method(&self) -> &Method;

    /// Request URI
    fn uri(&self) -> &Uri;

    /// Header map (case-insensitive, multi-valued lookup)
    fn headers(&self) -> &HeaderMap;
}

impl SignableMessage for Parts {
    fn method(&self) -> &Method {
        &self.method
    }

    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl<B> SignableMessage for Request<B> {
    fn method(&self) -> &Method {
        self.method()
    }

    fn uri(&self) -> &Uri {
        self.uri()
    }

    fn headers(&self) -> &HeaderMap {
        self.headers()
    }
}
