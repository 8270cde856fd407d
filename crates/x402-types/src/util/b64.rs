//! Base64 header values.
//!
//! Payment proofs travel across the HTTP boundary as the base64 form of their JSON
//! representation. [`Base64Bytes`] holds such a value. Encoding always produces standard
//! padded base64; decoding also accepts the URL-safe alphabet and missing padding, since
//! HTTP stacks in the wild emit both.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::Display;

/// Base64 text, borrowed from a header or owned after encoding.
///
/// # Example
///
/// ```rust
/// use x402_types::util::Base64Bytes;
///
/// let encoded = Base64Bytes::encode(br#"{"x402Version":1}"#);
/// assert_eq!(encoded.to_string(), "eyJ4NDAyVmVyc2lvbiI6MX0=");
///
/// let decoded = Base64Bytes::from("eyJ4NDAyVmVyc2lvbiI6MX0").decode().unwrap();
/// assert_eq!(decoded, br#"{"x402Version":1}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes<'a>(pub Cow<'a, [u8]>);

impl Base64Bytes<'_> {
    /// Decodes the text, trying the standard alphabet first.
    ///
    /// # Errors
    ///
    /// Returns the standard-alphabet error if no accepted variant decodes the text.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let text = self.0.as_ref();
        STANDARD.decode(text).or_else(|error| {
            [URL_SAFE, STANDARD_NO_PAD, URL_SAFE_NO_PAD]
                .iter()
                .find_map(|engine| engine.decode(text).ok())
                .ok_or(error)
        })
    }

    pub fn encode<T: AsRef<[u8]>>(input: T) -> Base64Bytes<'static> {
        Base64Bytes(Cow::Owned(STANDARD.encode(input.as_ref()).into_bytes()))
    }

    /// Encodes the JSON form of `value`.
    pub fn encode_json<T: Serialize>(value: &T) -> Result<Base64Bytes<'static>, serde_json::Error> {
        let json = serde_json::to_vec(value)?;
        Ok(Self::encode(json))
    }
}

impl AsRef<[u8]> for Base64Bytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<'a> From<&'a str> for Base64Bytes<'a> {
    fn from(value: &'a str) -> Self {
        Base64Bytes(Cow::Borrowed(value.trim().as_bytes()))
    }
}

impl Display for Base64Bytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.0.as_ref()))
    }
}
