//! Percent-encoding of URI components.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except the RFC 3986 unreserved marks that map apps accept
/// literally inside a `geo:` query.
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

/// Encodes and decodes URI components.
///
/// For every string `s`, `decode(&encode(s)) == s`.
pub trait UriQuote {
    fn encode(&self, s: &str) -> String;

    /// Reverses [`UriQuote::encode`]. Malformed `%` sequences are kept as-is
    /// and invalid UTF-8 is replaced rather than rejected.
    fn decode(&self, s: &str) -> String;
}

/// The default [`UriQuote`], backed by `percent-encoding`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentQuote;

impl UriQuote for PercentQuote {
    fn encode(&self, s: &str) -> String {
        utf8_percent_encode(s, COMPONENT).to_string()
    }

    fn decode(&self, s: &str) -> String {
        percent_decode_str(s).decode_utf8_lossy().into_owned()
    }
}
