//! Request body translation.
//!
//! The body of a POST-like request is classified once from its content type
//! and then re-serialized under one of three encodings:
//!
//! ```text
//! multipart/*                       → Multipart (fresh boundary)
//! x-www-form-urlencoded, or none    → Form (flattened name/value pairs)
//! anything else                     → Raw (text, optionally origin-rewritten)
//! ```

use std::borrow::Cow;

use axum::http::{header, HeaderMap, HeaderValue};
use bytes::Bytes;
use encoding_rs::{Encoding, REPLACEMENT, UTF_16BE, UTF_16LE, WINDOWS_1252};
use percent_encoding::percent_decode;
use url::form_urlencoded;

use crate::proxy::error::TranslateError;
use crate::proxy::inbound::InboundRequest;
use crate::proxy::multipart::MultipartBody;
use crate::routing::{host_and_port, RouteConfig};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Which encoding an inbound body is translated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Multipart,
    Form,
    Raw,
}

impl BodyKind {
    /// Classify a body from its content type. Multipart takes precedence,
    /// then url-encoded (or absent), then everything else.
    pub fn classify(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return BodyKind::Form;
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();

        let is_multipart = essence
            .get(..10)
            .is_some_and(|p| p.eq_ignore_ascii_case("multipart/"));
        if is_multipart {
            BodyKind::Multipart
        } else if essence.eq_ignore_ascii_case(FORM_URLENCODED) {
            BodyKind::Form
        } else {
            BodyKind::Raw
        }
    }
}

/// A decoded inbound body.
#[derive(Debug)]
pub enum RequestBody {
    Form(FormBody),
    Multipart(MultipartBody),
    Raw(RawBody),
}

impl RequestBody {
    /// Decode the body of `inbound` according to its content type.
    pub async fn decode(
        inbound: &InboundRequest,
        route: &RouteConfig,
    ) -> Result<Self, TranslateError> {
        match BodyKind::classify(inbound.content_type()) {
            BodyKind::Multipart => MultipartBody::decode(
                inbound.content_type().unwrap_or_default(),
                inbound.body.clone(),
                route.max_upload_bytes,
                &route.upload_dir,
            )
            .await
            .map(RequestBody::Multipart),
            BodyKind::Form => FormBody::decode(inbound).map(RequestBody::Form),
            BodyKind::Raw => RawBody::decode(inbound, route).map(RequestBody::Raw),
        }
    }

    /// The encoding this body was decoded under.
    pub fn kind(&self) -> BodyKind {
        match self {
            RequestBody::Form(_) => BodyKind::Form,
            RequestBody::Multipart(_) => BodyKind::Multipart,
            RequestBody::Raw(_) => BodyKind::Raw,
        }
    }

    /// Serialize the body for the upstream request.
    pub async fn encode(self) -> Result<EncodedBody, TranslateError> {
        match self {
            RequestBody::Form(form) => Ok(EncodedBody {
                bytes: Bytes::from(encode_form(&form.pairs, form.encoding)),
                content_type: FORM_URLENCODED.to_string(),
                replace_content_type: false,
            }),
            RequestBody::Multipart(body) => {
                let content_type = body.content_type();
                Ok(EncodedBody {
                    bytes: body.encode().await?,
                    content_type,
                    replace_content_type: true,
                })
            }
            RequestBody::Raw(body) => Ok(body.encode()),
        }
    }
}

/// A serialized outbound body and its content type.
#[derive(Debug, Clone)]
pub struct EncodedBody {
    pub bytes: Bytes,
    pub content_type: String,
    /// Whether `content_type` overrides a forwarded `Content-Type` header.
    replace_content_type: bool,
}

impl EncodedBody {
    /// Set the outbound `Content-Type`: always for multipart bodies, only when
    /// absent otherwise.
    pub fn apply_content_type(&self, headers: &mut HeaderMap) -> Result<(), TranslateError> {
        if !self.replace_content_type && headers.contains_key(header::CONTENT_TYPE) {
            return Ok(());
        }
        let value = HeaderValue::from_str(&self.content_type)
            .map_err(|e| TranslateError::Encoding(format!("invalid content type: {e}")))?;
        headers.insert(header::CONTENT_TYPE, value);
        Ok(())
    }
}

/// A url-encoded form and the charset its escapes are read in.
#[derive(Debug, Clone)]
pub struct FormBody {
    pub encoding: &'static Encoding,
    /// Ordered name/value pairs, one pair per value.
    pub pairs: Vec<(String, String)>,
}

impl FormBody {
    /// Parse the body of `inbound` in its declared charset (ISO-8859-1 when
    /// none).
    pub fn decode(inbound: &InboundRequest) -> Result<Self, TranslateError> {
        let encoding = resolve_encoding(inbound.character_encoding().as_deref())?;
        Ok(Self {
            encoding,
            pairs: decode_form(&inbound.body, encoding),
        })
    }
}

/// Flatten a url-encoded form into one pair per value, grouped by name in
/// order of first appearance. Percent-escapes are decoded to bytes and then
/// read in `encoding`.
pub fn decode_form(body: &[u8], encoding: &'static Encoding) -> Vec<(String, String)> {
    let mut params: Vec<(String, Vec<String>)> = Vec::new();
    for pair in body.split(|b| *b == b'&').filter(|p| !p.is_empty()) {
        let (name, value) = match pair.iter().position(|b| *b == b'=') {
            Some(eq) => (&pair[..eq], &pair[eq + 1..]),
            None => (pair, &[][..]),
        };
        let name = decode_component(name, encoding);
        let value = decode_component(value, encoding);
        match params.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => params.push((name, vec![value])),
        }
    }

    params
        .into_iter()
        .flat_map(|(name, values)| values.into_iter().map(move |v| (name.clone(), v)))
        .collect()
}

fn decode_component(raw: &[u8], encoding: &'static Encoding) -> String {
    let unplussed: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    let bytes: Cow<'_, [u8]> = percent_decode(&unplussed).into();
    encoding.decode_without_bom_handling(&bytes).0.into_owned()
}

/// Serialize pairs as `application/x-www-form-urlencoded`, escaping the
/// bytes of each name and value in `encoding`.
pub fn encode_form(pairs: &[(String, String)], encoding: &'static Encoding) -> String {
    let component = |text: &str| -> String {
        form_urlencoded::byte_serialize(&encode_text(encoding, text)).collect()
    };
    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", component(name), component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Encode `text` in `encoding`. The UTF-16 variants are written by hand since
/// `encoding_rs` only decodes them.
fn encode_text(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    if encoding == UTF_16LE {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    } else if encoding == UTF_16BE {
        text.encode_utf16().flat_map(u16::to_be_bytes).collect()
    } else {
        encoding.encode(text).0.into_owned()
    }
}

/// An arbitrary text body (JSON, XML, RPC payloads, ...).
#[derive(Debug, Clone)]
pub struct RawBody {
    pub content_type: String,
    pub encoding: &'static Encoding,
    pub text: String,
}

impl RawBody {
    /// Read the body as text in its declared charset (ISO-8859-1 when none).
    ///
    /// Line terminators are dropped. Bodies whose content type starts with
    /// the route's rewrite MIME type get the caller's origin replaced by the
    /// target's.
    pub fn decode(inbound: &InboundRequest, route: &RouteConfig) -> Result<Self, TranslateError> {
        let content_type = inbound.content_type().unwrap_or_default().to_string();
        let encoding = resolve_encoding(inbound.character_encoding().as_deref())?;

        let (decoded, _) = encoding.decode_without_bom_handling(&inbound.body);
        let mut text: String = decoded.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();

        if content_type.starts_with(&route.rewrite_mime_type) {
            let (client_url, server_url) = origin_rewrite(inbound, route);
            tracing::trace!(
                client_url = %client_url,
                server_url = %server_url,
                "Rewriting caller origin in body"
            );
            text = text.replace(&client_url, &server_url);
        }

        Ok(Self {
            content_type,
            encoding,
            text,
        })
    }

    pub fn encode(self) -> EncodedBody {
        EncodedBody {
            bytes: Bytes::from(encode_text(self.encoding, &self.text)),
            content_type: self.content_type,
            replace_content_type: false,
        }
    }
}

fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding, TranslateError> {
    match label {
        None => Ok(WINDOWS_1252),
        Some(label) => Encoding::for_label(label.trim().as_bytes())
            .filter(|encoding| *encoding != REPLACEMENT)
            .ok_or_else(|| TranslateError::Encoding(label.to_string())),
    }
}

/// The caller-facing origin and the target origin it is replaced with.
pub fn origin_rewrite(inbound: &InboundRequest, route: &RouteConfig) -> (String, String) {
    let client_host = match inbound.local_name.as_str() {
        "127.0.0.1" | "::1" | "0:0:0:0:0:0:0:1" => "localhost",
        other => other,
    };
    let client_url = host_and_port(client_host, inbound.local_port);
    let server_url = format!("{}{}", route.target_authority(), route.proxy_path_prefix);

    if route.use_tls {
        (format!("http://{client_url}"), format!("https://{server_url}"))
    } else {
        (client_url, server_url)
    }
}
