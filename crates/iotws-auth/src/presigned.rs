//! Inspection and self-verification of signed handshake paths.
//!
//! A device caches its signed path and reuses it across reconnects, so it is
//! useful to be able to look inside one: which key and scope it was signed
//! for, when it stops being valid, and whether it verifies against an
//! identity. Only the exact parameter set produced by
//! [`presign_path`](crate::presign::presign_path) is accepted.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::SCOPE_TERMINATOR;
use crate::clock::SigningTime;
use crate::error::AuthError;
use crate::identity::ConnectionIdentity;
use crate::presign::{SERVICE, presign_path};
use crate::sigv4::ALGORITHM;

/// Every query parameter a signed handshake path carries.
const PARAM_NAMES: [&str; 6] = [
    "X-Amz-Algorithm",
    "X-Amz-Credential",
    "X-Amz-Date",
    "X-Amz-Expires",
    "X-Amz-SignedHeaders",
    "X-Amz-Signature",
];

/// Parsed components of a signed handshake path.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedParams {
    /// The resource path before `?`.
    pub resource: String,
    /// The signing algorithm.
    pub algorithm: String,
    /// The access key ID.
    pub access_key_id: String,
    /// The date component of the credential scope (`yyyyMMdd`).
    pub date: String,
    /// The region from the credential scope.
    pub region: String,
    /// The service from the credential scope.
    pub service: String,
    /// The ISO 8601 basic format timestamp.
    pub timestamp: String,
    /// Validity duration in seconds.
    pub expires: u64,
    /// The signed header names.
    pub signed_headers: Vec<String>,
    /// The hex-encoded signature.
    pub signature: String,
}

impl PresignedParams {
    /// Parse a signed path such as `/mqtt?X-Amz-Algorithm=...`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingQueryParam`] if a parameter is absent,
    /// duplicated or malformed, [`AuthError::UnexpectedQueryParam`] for any
    /// extra parameter, [`AuthError::UnsupportedAlgorithm`] for an algorithm
    /// other than `AWS4-HMAC-SHA256`, or [`AuthError::InvalidCredential`] for
    /// a malformed credential.
    pub fn parse(path: &str) -> Result<Self, AuthError> {
        let (resource, query) = path.split_once('?').unwrap_or(("", path));

        let mut params: HashMap<&str, String> = HashMap::new();
        for param in query.split('&').filter(|s| !s.is_empty()) {
            let (key, value) = param.split_once('=').unwrap_or((param, ""));
            if !PARAM_NAMES.contains(&key) {
                return Err(AuthError::UnexpectedQueryParam(key.to_owned()));
            }
            if params.insert(key, url_decode(value)).is_some() {
                return Err(AuthError::MissingQueryParam(format!("{key} (duplicated)")));
            }
        }

        let algorithm = get_required_param(&params, "X-Amz-Algorithm")?;
        if algorithm != ALGORITHM {
            return Err(AuthError::UnsupportedAlgorithm(algorithm));
        }

        let credential = get_required_param(&params, "X-Amz-Credential")?;
        let timestamp = get_required_param(&params, "X-Amz-Date")?;
        let expires_str = get_required_param(&params, "X-Amz-Expires")?;
        let signed_headers_str = get_required_param(&params, "X-Amz-SignedHeaders")?;
        let signature = get_required_param(&params, "X-Amz-Signature")?;

        // AKID/date/region/service/aws4_request
        let cred_parts: Vec<&str> = credential.splitn(5, '/').collect();
        if cred_parts.len() != 5 || cred_parts[4] != SCOPE_TERMINATOR {
            return Err(AuthError::InvalidCredential);
        }

        let expires: u64 = expires_str
            .parse()
            .map_err(|_| AuthError::MissingQueryParam("X-Amz-Expires (invalid integer)".to_owned()))?;

        Ok(Self {
            resource: resource.to_owned(),
            algorithm,
            access_key_id: cred_parts[0].to_owned(),
            date: cred_parts[1].to_owned(),
            region: cred_parts[2].to_owned(),
            service: cred_parts[3].to_owned(),
            timestamp,
            expires,
            signed_headers: signed_headers_str
                .split(';')
                .map(ToOwned::to_owned)
                .collect(),
            signature,
        })
    }

    /// The signing instant.
    ///
    /// # Errors
    /// Returns [`AuthError::MissingQueryParam`] if `X-Amz-Date` is malformed.
    pub fn signed_at(&self) -> Result<DateTime<Utc>, AuthError> {
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y%m%dT%H%M%SZ")
            .map(|t| t.and_utc())
            .map_err(|_| AuthError::MissingQueryParam("X-Amz-Date (invalid format)".to_owned()))
    }

    /// The instant after which the broker rejects this path.
    ///
    /// # Errors
    /// Returns [`AuthError::MissingQueryParam`] if `X-Amz-Date` is malformed,
    /// or [`AuthError::RequestExpired`] if the expiry overflows.
    pub fn expires_at(&self) -> Result<DateTime<Utc>, AuthError> {
        let secs = i64::try_from(self.expires).map_err(|_| AuthError::RequestExpired)?;
        let delta = chrono::Duration::try_seconds(secs).ok_or(AuthError::RequestExpired)?;
        self.signed_at()?
            .checked_add_signed(delta)
            .ok_or(AuthError::RequestExpired)
    }

    /// Check that the path is still valid at `now`.
    ///
    /// # Errors
    /// Returns [`AuthError::RequestExpired`] when `now` is past the expiry.
    pub fn check_expiration(&self, now: DateTime<Utc>) -> Result<(), AuthError> {
        if now > self.expires_at()? {
            return Err(AuthError::RequestExpired);
        }
        Ok(())
    }

    /// Whether the path is no longer valid at `now`. Unreadable timestamps count as expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.check_expiration(now).is_err()
    }
}

/// Verify that `path` is a handshake path signed by `identity`.
///
/// The signature is recomputed from the path's own timestamp and compared in
/// constant time. Expiry is not checked here; see
/// [`PresignedParams::check_expiration`].
///
/// # Errors
///
/// Returns an [`AuthError`] if the path does not parse, was issued for a
/// different key, region or service, or carries a wrong signature.
pub fn verify_presigned_path(
    identity: &ConnectionIdentity,
    path: &str,
) -> Result<PresignedParams, AuthError> {
    let parsed = PresignedParams::parse(path)?;

    debug!(
        access_key_id = %parsed.access_key_id,
        date = %parsed.date,
        region = %parsed.region,
        service = %parsed.service,
        "Verifying signed handshake path"
    );

    if parsed.access_key_id != identity.access_key_id
        || parsed.region != identity.region.as_str()
        || parsed.service != SERVICE
    {
        return Err(AuthError::InvalidCredential);
    }

    let stamp = parsed.timestamp.replace(['T', 'Z'], "");
    let time = SigningTime::parse(&stamp)?;
    if time.date() != parsed.date {
        return Err(AuthError::InvalidCredential);
    }

    let expected = presign_path(identity, &time);
    if expected.as_bytes().ct_eq(path.as_bytes()).into() {
        Ok(parsed)
    } else {
        debug!("Signed handshake path mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

/// Perform basic percent-decoding of a URL-encoded string.
fn url_decode(input: &str) -> String {
    percent_encoding::percent_decode_str(input)
        .decode_utf8_lossy()
        .into_owned()
}

/// Extract a required query parameter, returning an error if missing.
fn get_required_param(params: &HashMap<&str, String>, name: &str) -> Result<String, AuthError> {
    params
        .get(name)
        .cloned()
        .ok_or_else(|| AuthError::MissingQueryParam(name.to_owned()))
}
