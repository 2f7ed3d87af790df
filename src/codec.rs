//! Mapping between [`VocValue`] and the SimpleVOC HTTP wire format
//!
//! Requests are described by [`RequestParts`] and handed to the transport
//! unchanged; successful responses are decoded by the `decode_*` functions.
//! Nothing in here performs I/O, so the blocking and async connections share
//! every rule defined in this module.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{Error, Result};
use crate::types::VocValue;

/// Server-assigned creation time (required on read)
pub const HEADER_CREATED: &str = "x-voc-created";
/// Expiration time, ISO-8601 UTC (optional)
pub const HEADER_EXPIRES: &str = "x-voc-expires";
/// Numeric flags (required)
pub const HEADER_FLAGS: &str = "x-voc-flags";
/// Extended attributes as a JSON object (optional)
pub const HEADER_EXTENDED: &str = "x-voc-extended";

/// Content type sent with every request
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
/// User agent sent with every request
pub const USER_AGENT: &str = concat!("simplevoc-client/", env!("CARGO_PKG_VERSION"));

const EXPIRES_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Characters allowed unencoded in URI path segments per RFC 3986.
/// Everything else (including spaces, `#`, `?`, `%`, non-ASCII) gets percent-encoded.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@')
    .remove(b'/');

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// An outgoing request, relative to the connection's endpoint
#[derive(Debug, Clone)]
pub struct RequestParts {
    /// HTTP method
    pub method: Method,
    /// Path and query, starting with `/`
    pub path: String,
    /// Operation-specific headers
    pub headers: HeaderMap,
    /// Request body, empty when there is none
    pub body: Bytes,
}

impl RequestParts {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// `GET /version`
pub fn version_request() -> RequestParts {
    RequestParts::new(Method::GET, "/version".to_string())
}

/// `GET /keys/{prefix}[?filter=...]`
pub fn keys_request(prefix: &str, filter: Option<&str>) -> RequestParts {
    let mut path = format!("/keys/{}", encode_segment(prefix));
    if let Some(filter) = filter {
        path.push_str("?filter=");
        path.extend(url::form_urlencoded::byte_serialize(filter.as_bytes()));
    }
    RequestParts::new(Method::GET, path)
}

/// `GET /value/{key}`
pub fn get_request(key: &str) -> RequestParts {
    RequestParts::new(Method::GET, value_path(key))
}

/// `POST /value/{key}` carrying the value's metadata as headers and its data as body
pub fn set_request(value: &VocValue) -> Result<RequestParts> {
    let mut parts = RequestParts::new(Method::POST, value_path(&value.key));

    parts
        .headers
        .insert(HeaderName::from_static(HEADER_FLAGS), HeaderValue::from(value.flags));

    if let Some(expires) = &value.expires {
        parts.headers.insert(
            HeaderName::from_static(HEADER_EXPIRES),
            header_value(&format_timestamp(expires))?,
        );
    }

    if let Some(extended) = value.non_empty_extended() {
        parts.headers.insert(
            HeaderName::from_static(HEADER_EXTENDED),
            header_value(&encode_extended(extended)?)?,
        );
    }

    if let Some(data) = &value.data {
        parts.body = Bytes::from(data.clone());
    }

    Ok(parts)
}

/// `POST /flush`
pub fn flush_request() -> RequestParts {
    RequestParts::new(Method::POST, "/flush".to_string())
}

fn value_path(key: &str) -> String {
    format!("/value/{}", encode_segment(key))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::InvalidArgument(format!("Value not allowed in a header: {}", e)))
}

/// Format a timestamp the way the server expects it: UTC, second precision
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(EXPIRES_FORMAT).to_string()
}

/// Parse a timestamp header. Accepts RFC 3339, RFC 2822 and offset-less
/// `YYYY-MM-DD[T ]HH:MM:SS`, the latter taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Serialize extended attributes as a JSON object that is also a legal
/// header value: non-ASCII characters are written as `\uXXXX` escapes.
fn encode_extended(extended: &BTreeMap<String, String>) -> Result<String> {
    let json = serde_json::to_string(extended)
        .map_err(|e| Error::InvalidArgument(format!("Cannot encode extended attributes: {}", e)))?;

    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}

fn decode_extended(raw: &str) -> Result<BTreeMap<String, String>> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
        .map_err(|e| malformed(format!("{} is not a JSON object: {}", HEADER_EXTENDED, e)))?;

    Ok(object
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}

fn malformed(message: String) -> Error {
    Error::MalformedResponse(message)
}

/// Header text, or `None` when absent or blank
fn optional_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => {
            let text = std::str::from_utf8(value.as_bytes())
                .map_err(|e| malformed(format!("{} header is not UTF-8: {}", name, e)))?
                .trim();
            Ok((!text.is_empty()).then_some(text))
        }
    }
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    optional_header(headers, name)?.ok_or_else(|| malformed(format!("missing {} header", name)))
}

fn timestamp_header(name: &str, raw: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(raw).ok_or_else(|| malformed(format!("unparsable {} header: {:?}", name, raw)))
}

/// Build the value returned by `GET /value/{key}` from its headers and body
pub fn decode_value(headers: &HeaderMap, body: &[u8], key: &str) -> Result<VocValue> {
    let created = timestamp_header(HEADER_CREATED, required_header(headers, HEADER_CREATED)?)?;

    let expires = match optional_header(headers, HEADER_EXPIRES)? {
        Some(raw) => Some(timestamp_header(HEADER_EXPIRES, raw)?),
        None => None,
    };

    let flags_raw = required_header(headers, HEADER_FLAGS)?;
    let flags = flags_raw
        .parse::<i32>()
        .map_err(|e| malformed(format!("unparsable {} header {:?}: {}", HEADER_FLAGS, flags_raw, e)))?;

    let extended = optional_header(headers, HEADER_EXTENDED)?
        .map(decode_extended)
        .transpose()?;

    let data = std::str::from_utf8(body)
        .map_err(|e| malformed(format!("value body is not UTF-8: {}", e)))?;

    Ok(VocValue {
        key: key.to_string(),
        data: Some(data.to_string()),
        created: Some(created),
        expires,
        flags,
        extended,
    })
}

/// Decode the JSON array of keys returned by `GET /keys/{prefix}`
pub fn decode_key_list(body: &[u8]) -> Result<Vec<String>> {
    serde_json::from_slice(body).map_err(|e| malformed(format!("key list is not a JSON string array: {}", e)))
}

/// Decode the `{"version": ...}` object returned by `GET /version`
pub fn decode_version(body: &[u8]) -> Result<String> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(body)
        .map_err(|e| malformed(format!("version body is not a JSON object: {}", e)))?;

    match object.get("version") {
        Some(serde_json::Value::String(version)) => Ok(version.clone()),
        Some(serde_json::Value::Number(version)) => Ok(version.to_string()),
        _ => Err(malformed("version body has no version field".to_string())),
    }
}
