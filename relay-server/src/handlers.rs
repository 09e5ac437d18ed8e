use command_relay::Envelope;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};

/// Returns an response body with contents of `chunk` which can be some type convertible into Bytes, e.g. &str.
pub(crate) fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into()).map_err(|never| match never {}).boxed()
}

/// Converts the envelope into a JSON response with the HTTP status mirroring `statusCode`.
pub(crate) fn envelope_response(envelope: &Envelope) -> Response<BoxBody<Bytes, hyper::Error>> {
    let status = StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(full(envelope.to_json()))
        .expect("Failed to create a response")
}
