//! Push envelope decoding and request rewriting.
//!
//! Wire shape of a push delivery:
//!
//! ```json
//! { "message": { "attributes": {"k": "v"}, "data": "<base64>", "message_id": "<id>" },
//!   "subscription": "<name>" }
//! ```
//!
//! Unknown fields (`publishTime`, `messageId`, ...) are ignored and `null`
//! reads as the empty value.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::request::{Request, full_body};

/// Header prefix for message attributes.
pub const ATTRIBUTE_HEADER_PREFIX: &str = "X-Pubsub-";

pub const MESSAGE_ID_HEADER: HeaderName = HeaderName::from_static("x-pubsub-message-id");
pub const SUBSCRIPTION_HEADER: HeaderName = HeaderName::from_static("x-pubsub-subscription");

/// A decoded push delivery.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: Message,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subscription: String,
}

/// The published message inside an [`Envelope`].
#[derive(Debug, Default, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "attributes")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, with = "base64_bytes")]
    pub data: Bytes,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_id: String,
}

impl Envelope {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Rewrites `req` into the request the publisher originally meant to send.
    ///
    /// The request is consumed; its method, URI, version, remaining headers
    /// and extensions carry over. Every attribute becomes an
    /// `X-Pubsub-<key>` header, and a `content-type` attribute (any casing)
    /// also replaces `Content-Type`. The body becomes `message.data`, and the
    /// stale `Content-Length` header is dropped; the new body reports its own
    /// exact length.
    pub fn apply(self, req: Request) -> Request {
        let (mut parts, _drained) = req.into_parts();
        let headers = &mut parts.headers;

        for (key, value) in &self.message.attributes {
            let Ok(value) = HeaderValue::from_str(value) else {
                debug!(attribute = %key, "skipping attribute with invalid header value");
                continue;
            };
            if key.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                headers.insert(CONTENT_TYPE, value.clone());
            }
            set_attribute(headers, key, value);
        }

        if let Some(id) = non_empty_value(&self.message.message_id) {
            headers.insert(MESSAGE_ID_HEADER, id);
        }
        if let Some(sub) = non_empty_value(&self.subscription) {
            headers.insert(SUBSCRIPTION_HEADER, sub);
        }

        headers.remove(CONTENT_LENGTH);
        Request::from_parts(parts, full_body(self.message.data))
    }
}

fn set_attribute(headers: &mut HeaderMap, key: &str, value: HeaderValue) {
    let name = format!("{ATTRIBUTE_HEADER_PREFIX}{key}");
    match HeaderName::from_bytes(name.as_bytes()) {
        Ok(name) => {
            headers.insert(name, value);
        }
        Err(_) => debug!(attribute = %key, "skipping attribute with invalid header name"),
    }
}

fn non_empty_value(s: &str) -> Option<HeaderValue> {
    if s.is_empty() {
        return None;
    }
    match HeaderValue::from_str(s) {
        Ok(v) => Some(v),
        Err(_) => {
            debug!(value = %s, "skipping envelope field with invalid header value");
            None
        }
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// A `null` map or a `null` value inside it both read as empty.
fn attributes<'de, D>(d: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<String>>> = Option::deserialize(d)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}

/// `data` travels as standard (padded) base64 text.
mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, de};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(text) => STANDARD.decode(text).map(Bytes::from).map_err(de::Error::custom),
            None => Ok(Bytes::new()),
        }
    }
}
