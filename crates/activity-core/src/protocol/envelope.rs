//! Envelope codec: requests and results carried as strings and URL fragments.
//!
//! Fragment rules:
//! - The fragment is `&`-separated `key=value` pairs, each value
//!   percent-encoded with the `encodeURIComponent` set. `+` is a literal plus,
//!   never a space.
//! - Unrelated keys are left alone; only the reserved keys are ours.
//! - Appending a result never rewrites existing query or fragment bytes.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{ActivityError, Result};
use crate::protocol::request::{ActivityRequest, ActivityResult, ResultCode};

/// Fragment key carrying the serialized request into the dialog.
pub const REQUEST_FRAGMENT_KEY: &str = "__WA__";
/// Fragment key carrying the result back to the caller's return URL.
pub const RESULT_FRAGMENT_KEY: &str = "__WA_RES__";

/// Everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Connect input: a request object or its serialized form.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestInput {
    Request(ActivityRequest),
    Serialized(String),
}

impl From<ActivityRequest> for RequestInput {
    fn from(r: ActivityRequest) -> Self {
        RequestInput::Request(r)
    }
}

impl From<String> for RequestInput {
    fn from(s: String) -> Self {
        RequestInput::Serialized(s)
    }
}

impl From<&str> for RequestInput {
    fn from(s: &str) -> Self {
        RequestInput::Serialized(s.to_string())
    }
}

/// Result record appended to the return URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub request_id: String,
    /// Origin of the context that produced the result.
    pub origin: String,
    pub code: ResultCode,
    pub data: Value,
}

/// Serialize a request to its compact JSON string.
pub fn encode(request: &ActivityRequest) -> Result<String> {
    serde_json::to_string(request)
        .map_err(|e| ActivityError::MalformedRequest(format!("encode failed: {e}")))
}

/// Resolve connect input into a validated request.
pub fn decode(input: impl Into<RequestInput>) -> Result<ActivityRequest> {
    let request = match input.into() {
        RequestInput::Request(r) => r,
        RequestInput::Serialized(s) => serde_json::from_str::<ActivityRequest>(&s)
            .map_err(|e| ActivityError::MalformedRequest(format!("invalid request json: {e}")))?,
    };
    origin_of(&request.return_url)?;
    Ok(request)
}

/// Pull a request out of the fragment of `location`.
///
/// `Ok(None)` when the fragment does not carry the request key.
pub fn extract_from_location(location: &str) -> Result<Option<ActivityRequest>> {
    let Some(raw) = fragment_value(location, REQUEST_FRAGMENT_KEY) else {
        tracing::trace!("no request key in location fragment");
        return Ok(None);
    };
    decode(RequestInput::Serialized(raw)).map(Some)
}

/// Append the encoded result to `return_url`'s fragment.
pub fn build_result_url(
    return_url: &str,
    request_id: &str,
    origin: &str,
    result: &ActivityResult,
) -> Result<String> {
    let record = ResultEnvelope {
        request_id: request_id.to_string(),
        origin: origin.to_string(),
        code: result.code,
        data: result.data.clone(),
    };
    let json = serde_json::to_string(&record)
        .map_err(|e| ActivityError::Internal(format!("result encode failed: {e}")))?;
    let encoded = encode_component(&json);

    let mut out = String::with_capacity(return_url.len() + RESULT_FRAGMENT_KEY.len() + encoded.len() + 2);
    out.push_str(return_url);
    match return_url.find('#') {
        None => out.push('#'),
        Some(idx) if idx + 1 == return_url.len() => {}
        Some(_) => out.push('&'),
    }
    out.push_str(RESULT_FRAGMENT_KEY);
    out.push('=');
    out.push_str(&encoded);
    Ok(out)
}

/// Read a result record back from a return URL.
pub fn extract_result(location: &str) -> Result<Option<ResultEnvelope>> {
    let Some(raw) = fragment_value(location, RESULT_FRAGMENT_KEY) else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| ActivityError::MalformedRequest(format!("invalid result json: {e}")))
}

/// ASCII origin of an absolute URL (`https://example.com` for `https://example.com/opener`).
pub fn origin_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| ActivityError::MalformedRequest(format!("invalid url {url:?}: {e}")))?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(ActivityError::MalformedRequest(format!(
            "url {url:?} has an opaque origin"
        )));
    }
    Ok(origin.ascii_serialization())
}

/// Percent-encode a fragment value the way browsers' `encodeURIComponent` does.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

fn fragment_value(location: &str, key: &str) -> Option<String> {
    let (_, fragment) = location.split_once('#')?;
    fragment
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| percent_decode_str(k).decode_utf8_lossy() == key)
        .map(|(_, v)| percent_decode_str(v).decode_utf8_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::{json, Map};

    fn request() -> ActivityRequest {
        let mut args = Map::new();
        args.insert("a".into(), json!(1));
        ActivityRequest::new("request1", "https://example.com/opener").with_args(args)
    }

    #[test]
    fn decode_inverts_encode() {
        let r = request();
        assert_eq!(decode(encode(&r).unwrap()).unwrap(), r);

        let bare = ActivityRequest::new("r2", "https://example.com/a?b=c#d");
        assert_eq!(decode(encode(&bare).unwrap()).unwrap(), bare);
    }

    #[test]
    fn missing_marker_is_not_an_error() {
        assert_eq!(extract_from_location("https://pub.com/dialog").unwrap(), None);
        assert_eq!(extract_from_location("https://pub.com/dialog#tab=2").unwrap(), None);
    }

    #[test]
    fn marker_among_unrelated_fragment_keys() {
        let r = request();
        let enc = encode_component(&encode(&r).unwrap());
        let loc = format!("https://pub.com/dialog?x=1#tab=2&{REQUEST_FRAGMENT_KEY}={enc}");
        assert_eq!(extract_from_location(&loc).unwrap(), Some(r));
    }

    #[test]
    fn result_url_preserves_existing_fragment() {
        let res = ActivityResult::ok(json!("abc"));
        let url = build_result_url("https://example.com/opener?q=1#keep=me", "request1", "https://dialog.com", &res).unwrap();
        assert!(url.starts_with("https://example.com/opener?q=1#keep=me&__WA_RES__="));

        let url = build_result_url("https://example.com/opener#", "request1", "https://dialog.com", &res).unwrap();
        assert!(url.starts_with("https://example.com/opener#__WA_RES__="));

        let back = extract_result(&url).unwrap().unwrap();
        assert_eq!(back.request_id, "request1");
        assert_eq!(back.origin, "https://dialog.com");
        assert_eq!(back.code, ResultCode::Ok);
        assert_eq!(back.data, json!("abc"));
    }

    #[test]
    fn result_url_matches_browser_component_encoding() {
        let res = ActivityResult {
            code: ResultCode::Ok,
            data: json!("a+b c"),
        };
        let url = build_result_url("https://example.com/opener", "request1", "https://dialog.example", &res).unwrap();
        assert_eq!(
            url,
            "https://example.com/opener#__WA_RES__=%7B%22requestId%22%3A%22request1%22%2C%22origin%22%3A%22https%3A%2F%2Fdialog.example%22%2C%22code%22%3A%22ok%22%2C%22data%22%3A%22a%2Bb%20c%22%7D"
        );
        assert_eq!(extract_result(&url).unwrap().unwrap().data, json!("a+b c"));
    }

    #[test]
    fn fragment_plus_is_not_a_space() {
        let loc = format!(
            "https://pub.com/dialog#{REQUEST_FRAGMENT_KEY}={}",
            "%7B%22requestId%22%3A%22a+b%22%2C%22returnUrl%22%3A%22https%3A%2F%2Fexample.com%2Fopener%22%7D"
        );
        let req = extract_from_location(&loc).unwrap().unwrap();
        assert_eq!(req.request_id, "a+b");
    }

    #[test]
    fn component_encoding_keeps_unreserved_marks() {
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
        assert_eq!(encode_component("a b+c&d=e#"), "a%20b%2Bc%26d%3De%23");
    }

    #[test]
    fn origin_drops_path_and_default_port() {
        assert_eq!(origin_of("https://example.com/opener").unwrap(), "https://example.com");
        assert_eq!(origin_of("https://example.com:443/x").unwrap(), "https://example.com");
        assert_eq!(origin_of("http://localhost:8000/x").unwrap(), "http://localhost:8000");
        assert!(origin_of("/relative/path").is_err());
        assert!(origin_of("data:text/plain,hi").is_err());
    }
}
