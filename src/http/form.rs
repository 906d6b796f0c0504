//! `application/x-www-form-urlencoded` decoding for query strings and bodies.

use percent_encoding::percent_decode_str;
use thiserror::Error;

use super::Request;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Errors produced while decoding form data.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("invalid percent-escape in {segment:?}")]
    InvalidEscape { segment: String },

    #[error("invalid semicolon separator in {segment:?}")]
    Semicolon { segment: String },

    #[error("form data is not valid UTF-8")]
    InvalidUtf8,
}

/// Decoded form values in source order.
///
/// Body values (for methods that carry a form body) come before query-string
/// values, so [`Form::value`] prefers the body when a key appears in both.
#[derive(Debug, Clone, Default)]
pub struct Form {
    pairs: Vec<(String, String)>,
}

impl Form {
    /// Decodes a URL-encoded string such as `item_id=B000X&x=1`.
    ///
    /// `+` decodes to a space and `%XX` to the escaped byte. Empty segments
    /// are skipped; a key without `=` gets an empty value.
    pub fn parse_urlencoded(input: &str) -> Result<Self, FormError> {
        let mut form = Self::default();
        form.extend_from(input)?;
        Ok(form)
    }

    /// Collects the form values of a request: the URL-encoded body (POST,
    /// PUT and PATCH with a matching `Content-Type`), then the query string.
    pub fn from_request(request: &Request) -> Result<Self, FormError> {
        let mut form = Self::default();

        if request.method().may_carry_form_body() && has_form_content_type(request) {
            let body = std::str::from_utf8(request.body()).map_err(|_| FormError::InvalidUtf8)?;
            form.extend_from(body)?;
        }

        if let Some(query) = request.query_string() {
            form.extend_from(query)?;
        }

        Ok(form)
    }

    /// Returns the first value for `key`, if present.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn extend_from(&mut self, input: &str) -> Result<(), FormError> {
        for segment in input.split('&') {
            if segment.is_empty() {
                continue;
            }
            if segment.contains(';') {
                return Err(FormError::Semicolon {
                    segment: segment.to_owned(),
                });
            }
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            self.pairs.push((decode(key)?, decode(value)?));
        }
        Ok(())
    }
}

fn has_form_content_type(request: &Request) -> bool {
    request
        .headers()
        .get("content-type")
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

fn decode(component: &str) -> Result<String, FormError> {
    let bytes = component.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return Err(FormError::InvalidEscape {
                    segment: component.to_owned(),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| FormError::InvalidUtf8)
}
