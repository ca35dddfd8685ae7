//! Binary-mode wire codec for event envelopes.
//!
//! Event metadata travels as individual `ce-*` transport headers and
//! the JSON payload as the raw request body. `decode` exists for the
//! round-trip property and for sink-side test assertions; the dispatch
//! path only encodes.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{header::HeaderName, HeaderMap, HeaderValue};
use uuid::Uuid;

use ormcast_core::{envelope::EventData, EventEnvelope, EventId};

use crate::error::{DeliveryError, Result};

/// Structured-event specification version carried on every request.
pub const SPEC_VERSION: &str = "1.0";

const HEADER_SPECVERSION: &str = "ce-specversion";
const HEADER_ID: &str = "ce-id";
const HEADER_TYPE: &str = "ce-type";
const HEADER_SOURCE: &str = "ce-source";
const HEADER_SUBJECT: &str = "ce-subject";
const HEADER_TIME: &str = "ce-time";
const HEADER_CONTENT_TYPE: &str = "content-type";
const EXTENSION_PREFIX: &str = "ce-";

/// Encodes an envelope into binary-mode headers and a JSON body.
///
/// # Errors
///
/// Returns `DeliveryError::Codec` when a header value is not valid for
/// the wire or the payload cannot be serialized.
pub fn encode(envelope: &EventEnvelope) -> Result<(HeaderMap, Bytes)> {
    let mut headers = HeaderMap::new();
    put(&mut headers, HEADER_SPECVERSION, SPEC_VERSION)?;
    put(&mut headers, HEADER_ID, &envelope.id.to_string())?;
    put(&mut headers, HEADER_TYPE, &envelope.event_type)?;
    put(&mut headers, HEADER_SOURCE, &envelope.source)?;
    put(&mut headers, HEADER_SUBJECT, &envelope.subject)?;
    put(&mut headers, HEADER_TIME, &envelope.time.to_rfc3339())?;
    put(&mut headers, HEADER_CONTENT_TYPE, &envelope.content_type)?;

    for (name, value) in &envelope.extensions {
        let key = format!("{EXTENSION_PREFIX}{}", name.to_lowercase());
        put(&mut headers, &key, value)?;
    }

    let body = serde_json::to_vec(&envelope.data)
        .map_err(|e| DeliveryError::codec(format!("payload serialization failed: {e}")))?;

    Ok((headers, Bytes::from(body)))
}

/// Decodes binary-mode headers and body back into an envelope.
///
/// Header lookup is case-insensitive per the wire convention; unknown
/// `ce-*` headers become extensions.
///
/// # Errors
///
/// Returns `DeliveryError::Codec` when a required header is missing or
/// malformed, or the body is not a valid payload.
pub fn decode(headers: &HeaderMap, body: &[u8]) -> Result<EventEnvelope> {
    let id = required(headers, HEADER_ID)?
        .parse::<Uuid>()
        .map(EventId::from)
        .map_err(|e| DeliveryError::codec(format!("invalid {HEADER_ID}: {e}")))?;
    let event_type = required(headers, HEADER_TYPE)?;
    let source = required(headers, HEADER_SOURCE)?;
    let subject = required(headers, HEADER_SUBJECT)?;
    let time = DateTime::parse_from_rfc3339(&required(headers, HEADER_TIME)?)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DeliveryError::codec(format!("invalid {HEADER_TIME}: {e}")))?;
    let content_type = required(headers, HEADER_CONTENT_TYPE)?;

    let mut extensions = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str();
        if let Some(extension) = name.strip_prefix(EXTENSION_PREFIX) {
            if matches!(
                name,
                HEADER_SPECVERSION | HEADER_ID | HEADER_TYPE | HEADER_SOURCE | HEADER_SUBJECT
                    | HEADER_TIME
            ) {
                continue;
            }
            let value = value
                .to_str()
                .map_err(|e| DeliveryError::codec(format!("invalid header {name}: {e}")))?;
            extensions.insert(extension.to_string(), value.to_string());
        }
    }

    let data: EventData = serde_json::from_slice(body)
        .map_err(|e| DeliveryError::codec(format!("invalid payload: {e}")))?;

    Ok(EventEnvelope { id, source, subject, event_type, time, content_type, extensions, data })
}

fn put(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| DeliveryError::codec(format!("invalid header name {name}: {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| DeliveryError::codec(format!("invalid value for header {name}: {e}")))?;
    headers.insert(name, value);
    Ok(())
}

fn required(headers: &HeaderMap, name: &str) -> Result<String> {
    headers
        .get(name)
        .ok_or_else(|| DeliveryError::codec(format!("missing required header {name}")))?
        .to_str()
        .map(str::to_string)
        .map_err(|e| DeliveryError::codec(format!("invalid header {name}: {e}")))
}
