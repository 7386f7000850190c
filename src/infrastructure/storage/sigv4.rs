//! AWS Signature Version 4 for the S3 REST API.
//!
//! Supports query-string presigning (for URLs handed to clients) and
//! `Authorization` header signing (for calls made by the server itself).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// Hex SHA-256 of an empty body.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Payload hash marker for presigned requests.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Longest validity S3 accepts for a presigned URL (7 days).
pub const MAX_PRESIGN_SECONDS: u64 = 604_800;

/// Access key pair and region used for signing.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Headers to attach to a header-signed request.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: String,
}

fn hmac(key: &[u8], data: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key of any length");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// Percent-encode per RFC 3986 as S3 expects. `/` is kept when `keep_slash` is set.
pub fn uri_encode(input: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Derive the per-day signing key.
pub fn signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{}", secret_key).as_bytes(), date);
    let k_region = hmac(&k_date, region);
    let k_service = hmac(&k_region, service);
    hmac(&k_service, "aws4_request")
}

struct Scope {
    amz_date: String,
    scope: String,
    date: String,
}

impl Scope {
    fn new(credentials: &Credentials, now: DateTime<Utc>) -> Self {
        let date = now.format("%Y%m%d").to_string();
        Self {
            amz_date: now.format("%Y%m%dT%H%M%SZ").to_string(),
            scope: format!("{}/{}/{}/aws4_request", date, credentials.region, SERVICE),
            date,
        }
    }

    fn sign(&self, credentials: &Credentials, canonical_request: &str) -> String {
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            self.amz_date,
            self.scope,
            sha256_hex(canonical_request)
        );
        let key = signing_key(&credentials.secret_key, &self.date, &credentials.region, SERVICE);
        hex::encode(hmac(&key, &string_to_sign))
    }
}

/// Build the signed query string for a presigned URL.
///
/// `path` is the already-encoded canonical URI (e.g. `/bucket/key`).
/// The returned string does not include the leading `?`.
pub fn presign_query(
    credentials: &Credentials,
    method: &str,
    host: &str,
    path: &str,
    expires_seconds: u64,
    now: DateTime<Utc>,
) -> String {
    let scope = Scope::new(credentials, now);
    let credential = format!("{}/{}", credentials.access_key, scope.scope);
    let expires = expires_seconds.clamp(1, MAX_PRESIGN_SECONDS).to_string();

    // already in lexicographic order
    let params = [
        ("X-Amz-Algorithm", ALGORITHM),
        ("X-Amz-Credential", credential.as_str()),
        ("X-Amz-Date", scope.amz_date.as_str()),
        ("X-Amz-Expires", expires.as_str()),
        ("X-Amz-SignedHeaders", "host"),
    ];
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode(k, false), uri_encode(v, false)))
        .collect::<Vec<_>>()
        .join("&");

    let canonical_request = format!(
        "{}\n{}\n{}\nhost:{}\n\nhost\n{}",
        method, path, query, host, UNSIGNED_PAYLOAD
    );
    let signature = scope.sign(credentials, &canonical_request);

    format!("{}&X-Amz-Signature={}", query, signature)
}

/// Sign a body-less request with the `Authorization` header.
pub fn sign_headers(
    credentials: &Credentials,
    method: &str,
    host: &str,
    path: &str,
    now: DateTime<Utc>,
) -> SignedHeaders {
    let scope = Scope::new(credentials, now);
    let signed_headers = "host;x-amz-content-sha256;x-amz-date";

    let canonical_request = format!(
        "{}\n{}\n\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
        method,
        path,
        host,
        EMPTY_PAYLOAD_SHA256,
        scope.amz_date,
        signed_headers,
        EMPTY_PAYLOAD_SHA256
    );
    let signature = scope.sign(credentials, &canonical_request);

    SignedHeaders {
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key, scope.scope, signed_headers, signature
        ),
        amz_date: scope.amz_date,
        content_sha256: EMPTY_PAYLOAD_SHA256.to_string(),
    }
}
