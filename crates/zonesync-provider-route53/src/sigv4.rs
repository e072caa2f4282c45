//! AWS Signature Version 4 request signing
//!
//! Route 53 requests are signed over the `host` and `x-amz-date` headers
//! and the SHA-256 of the request body.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use zonesync_core::{Error, Result};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "route53";
const SIGNED_HEADERS: &str = "host;x-amz-date";

/// The parts of a request that go into its signature
#[derive(Debug, Clone, Copy)]
pub struct SigningRequest<'a> {
    /// Uppercase HTTP method
    pub method: &'a str,
    /// Request host, e.g. `route53.amazonaws.com`
    pub host: &'a str,
    /// URI path
    pub path: &'a str,
    /// Canonical (sorted, encoded) query string, may be empty
    pub query: &'a str,
    /// Request body
    pub payload: &'a [u8],
}

/// SigV4 credentials for one region
#[derive(Clone)]
pub struct Signer {
    access_key_id: String,
    secret_access_key: String,
    region: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field("region", &self.region)
            .finish()
    }
}

impl Signer {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// `Authorization` header value for `request` sent at `now`
    ///
    /// The request must carry `X-Amz-Date: amz_date(now)`.
    pub fn authorization(&self, request: &SigningRequest<'_>, now: DateTime<Utc>) -> Result<String> {
        let date = now.format("%Y%m%d").to_string();
        let amz_date = amz_date(now);

        let canonical_headers = format!("host:{}\nx-amz-date:{}\n", request.host, amz_date);
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method,
            request.path,
            request.query,
            canonical_headers,
            SIGNED_HEADERS,
            hex_sha256(request.payload)
        );

        let credential_scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signature = self.signature(&date, &string_to_sign)?;
        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key_id, credential_scope, SIGNED_HEADERS, signature
        ))
    }

    fn signature(&self, date: &str, string_to_sign: &str) -> Result<String> {
        let k_date = hmac_sha256(
            format!("AWS4{}", self.secret_access_key).as_bytes(),
            date.as_bytes(),
        )?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
        let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
        Ok(hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?))
    }
}

/// `X-Amz-Date` header value
pub fn amz_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Encode a query parameter for the canonical query string
pub fn uri_encode(value: &str) -> String {
    use std::fmt::Write;
    let mut result = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                let _ = write!(result, "%{:02X}", byte);
            }
        }
    }
    result
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| Error::Other(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn signer() -> Signer {
        Signer::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "us-east-1",
        )
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_amz_date_format() {
        assert_eq!(amz_date(timestamp()), "20240115T120000Z");
    }

    #[test]
    fn test_authorization_header() {
        let request = SigningRequest {
            method: "GET",
            host: "route53.amazonaws.com",
            path: "/2013-04-01/hostedzone/Z123/rrset",
            query: "",
            payload: b"",
        };
        let header = signer().authorization(&request, timestamp()).unwrap();
        assert_eq!(
            header,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240115/us-east-1/route53/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=f32c4f35454d8085bd756f7701816aebc77375a6c1a02f947f82c2c32bdfa44d"
        );
    }

    #[test]
    fn test_payload_changes_signature() {
        let mut request = SigningRequest {
            method: "POST",
            host: "route53.amazonaws.com",
            path: "/2013-04-01/hostedzone/Z123/rrset",
            query: "",
            payload: b"<a/>",
        };
        let first = signer().authorization(&request, timestamp()).unwrap();
        request.payload = b"<b/>";
        let second = signer().authorization(&request, timestamp()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("www.example.com."), "www.example.com.");
        assert_eq!(uri_encode("\\052.example.com."), "%5C052.example.com.");
        assert_eq!(uri_encode("a b"), "a%20b");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", signer());
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("wJalrXUtnFEMI"));
    }
}
