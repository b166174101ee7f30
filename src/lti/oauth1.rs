//! Two-legged OAuth 1.0a signing
//!
//! Builds the signature base string and HMAC-SHA1 signature used both to
//! verify inbound LTI 1.1 launches and to sign outbound Outcomes requests.
//! There is no token secret in the LTI profile, so the signing key is always
//! `percent_encode(consumer_secret) + "&"`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha1::{Digest, Sha1};

type HmacSha1 = Hmac<Sha1>;

/// Percent-encode per RFC 3986 (unreserved characters pass through)
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Build the normalized parameter string: drop any `oauth_signature`,
/// sort the rest by key (then value), and join encoded `key=value` pairs.
pub fn normalized_params(params: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .filter(|(k, _)| k != "oauth_signature")
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the OAuth 1.0a signature base string
pub fn base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&normalized_params(params))
    )
}

/// Sign a request: HMAC-SHA1 over the base string, base64-encoded.
///
/// Output is byte-identical for identical inputs; verification relies on
/// recomputing and comparing this value.
pub fn sign_params(
    method: &str,
    url: &str,
    params: &[(String, String)],
    consumer_secret: &str,
) -> String {
    let base = base_string(method, url, params);
    let key = format!("{}&", percent_encode(consumer_secret));

    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(base.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// base64(SHA-1) of a raw request body, for the `oauth_body_hash` extension
pub fn body_hash(body: &[u8]) -> String {
    let digest = Sha1::digest(body);
    BASE64.encode(digest)
}

/// Render signed OAuth parameters as an `Authorization: OAuth ...` header value
pub fn authorization_header(params: &[(String, String)]) -> String {
    let parts: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, percent_encode(v)))
        .collect();
    format!("OAuth {}", parts.join(", "))
}

/// Constant-time byte comparison for credentials and signatures
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
