//! Rejection responses substituted for blocked requests

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::Response;

use crate::policy::Rejection;

pub type RejectionResponse = Response<Full<Bytes>>;

/// Build the canned `text/plain` response for a rejection
pub fn rejection_response(rejection: &Rejection) -> RejectionResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(rejection.body.as_bytes())));
    *response.status_mut() = rejection.status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers.insert("x-blocked-by", HeaderValue::from_static("openclaw-gate"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{DOMAIN_REJECTION, OPERATION_REJECTION};
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    #[tokio::test]
    async fn test_domain_rejection_response() {
        let resp = rejection_response(&DOMAIN_REJECTION);
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(resp.headers()["x-blocked-by"], "openclaw-gate");

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Access Denied by OpenClaw Proxy");
    }

    #[tokio::test]
    async fn test_operation_rejection_response() {
        let resp = rejection_response(&OPERATION_REJECTION);
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(
            &body[..],
            b"Gmail write operation blocked by OpenClaw Proxy (read-only mode)"
        );
    }
}
