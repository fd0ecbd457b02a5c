//! Canonical request construction for presigned WebSocket handshakes.
//!
//! The handshake is always a `GET` of one fixed resource with an empty body,
//! signed over the `host` header only, so the canonical request has a fixed
//! shape:
//!
//! ```text
//! GET\n
//! /mqtt\n
//! X-Amz-Algorithm=...&X-Amz-Credential=...&X-Amz-Date=...&X-Amz-Expires=...&X-Amz-SignedHeaders=host\n
//! host:<host>:<port>\n
//! \n
//! host\n
//! <hex sha256 of the empty payload>
//! ```
//!
//! The query parameters are emitted in their canonical (sorted) order
//! directly, so no re-sorting pass is needed.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters that must be percent-encoded in a query parameter value.
///
/// Everything except the RFC 3986 unreserved set (`A-Z a-z 0-9 - _ . ~`) is
/// encoded, so the `/` separators of the credential become `%2F`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The terminator of every SigV4 credential scope.
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// Build the credential scope `<date>/<region>/<service>/aws4_request`.
///
/// # Examples
///
/// ```
/// use iotws_auth::canonical::build_credential_scope;
///
/// assert_eq!(
///     build_credential_scope("20170508", "us-east-1", "iotdevicegateway"),
///     "20170508/us-east-1/iotdevicegateway/aws4_request"
/// );
/// ```
#[must_use]
pub fn build_credential_scope(date: &str, region: &str, service: &str) -> String {
    format!("{date}/{region}/{service}/{SCOPE_TERMINATOR}")
}

/// Build the URI-escaped `X-Amz-Credential` value, `<akid>/<scope>` with `/` as `%2F`.
///
/// # Examples
///
/// ```
/// use iotws_auth::canonical::build_credential;
///
/// assert_eq!(
///     build_credential("AKID", "20170508/us-east-1/iotdevicegateway/aws4_request"),
///     "AKID%2F20170508%2Fus-east-1%2Fiotdevicegateway%2Faws4_request"
/// );
/// ```
#[must_use]
pub fn build_credential(access_key_id: &str, credential_scope: &str) -> String {
    uri_encode(&format!("{access_key_id}/{credential_scope}"))
}

/// Build the canonical query string of a presigned handshake (without signature).
#[must_use]
pub fn build_presign_query(
    algorithm: &str,
    credential: &str,
    amz_date: &str,
    expires: u64,
    signed_headers: &str,
) -> String {
    format!(
        "X-Amz-Algorithm={algorithm}\
         &X-Amz-Credential={credential}\
         &X-Amz-Date={amz_date}\
         &X-Amz-Expires={expires}\
         &X-Amz-SignedHeaders={signed_headers}"
    )
}

/// Build the canonical request for a bodiless request signed over `host` only.
///
/// The `host` header value carries the port, `host:<host>:<port>`, because the
/// broker verifies against the `Host` header the WebSocket client sends.
#[must_use]
pub fn build_canonical_request(
    method: &str,
    uri: &str,
    query: &str,
    host: &str,
    port: u16,
    payload_hash: &str,
) -> String {
    format!("{method}\n{uri}\n{query}\nhost:{host}:{port}\n\nhost\n{payload_hash}")
}

/// Percent-encode a query parameter value using the SigV4 rules.
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, QUERY_ENCODE_SET).to_string()
}
