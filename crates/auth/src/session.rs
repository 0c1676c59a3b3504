//! Session lifetime inspection.
//!
//! This module only reads the *claimed* expiry of a credential so the client
//! can send an expired holder back to login before a request fails. It does
//! not verify signatures; the issuing service remains the authority on whether
//! a credential is actually trusted.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("credential is malformed: {0}")]
    Malformed(String),

    #[error("credential carries no usable expiry")]
    MissingExpiry,
}

/// Claims this layer cares about once a credential has been decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCredential {
    pub expires_at: DateTime<Utc>,
}

/// Turns an opaque credential into its claimed expiry.
///
/// Implementations must not panic on hostile input; any failure is a
/// [`DecodeError`].
pub trait CredentialDecoder: Send + Sync {
    fn decode(&self, credential: &str) -> Result<DecodedCredential, DecodeError>;
}

/// Reads the `exp` claim of a JWT without checking its signature.
///
/// The header only has to be a JSON object; its `alg` is never consulted.
/// Every payload claim other than `exp` is ignored, and a fractional `exp`
/// is truncated to whole seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtExpiryDecoder;

impl CredentialDecoder for JwtExpiryDecoder {
    fn decode(&self, credential: &str) -> Result<DecodedCredential, DecodeError> {
        let mut parts = credential.split('.');
        let (Some(header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(DecodeError::Malformed(
                "expected three dot-separated segments".to_string(),
            ));
        };

        decode_segment("header", header)?;
        let claims = decode_segment("payload", payload)?;

        let expires_at = claims
            .get("exp")
            .and_then(Value::as_f64)
            .and_then(instant_from_secs)
            .ok_or(DecodeError::MissingExpiry)?;

        Ok(DecodedCredential { expires_at })
    }
}

fn decode_segment(name: &str, segment: &str) -> Result<Map<String, Value>, DecodeError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| DecodeError::Malformed(format!("{name}: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| DecodeError::Malformed(format!("{name}: {e}")))
}

fn instant_from_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    // Out-of-range values saturate here and are rejected by chrono.
    Utc.timestamp_opt(secs.trunc() as i64, 0).single()
}

/// Decode the expiry instant of `credential`.
pub fn expiry_of(
    decoder: &dyn CredentialDecoder,
    credential: &str,
) -> Result<DateTime<Utc>, DecodeError> {
    decoder.decode(credential).map(|d| d.expires_at)
}

/// Opaque session credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The holder's proof of authentication plus its decoded expiry.
///
/// `expires_at` is `None` when the credential could not be decoded; such a
/// session is never live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    credential: Credential,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(credential: Credential, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            credential,
            expires_at,
        }
    }

    /// Build a session by decoding the expiry out of `credential`.
    ///
    /// Never fails: an undecodable credential yields a session that is not live.
    pub fn from_credential(credential: impl Into<String>, decoder: &dyn CredentialDecoder) -> Self {
        let credential = Credential::new(credential);
        let expires_at = match decoder.decode(credential.expose()) {
            Ok(decoded) => Some(decoded.expires_at),
            Err(e) => {
                tracing::debug!(error = %e, "session credential could not be decoded");
                None
            }
        };
        Self::new(credential, expires_at)
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        is_live(self, now)
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }
}

/// A session is live strictly before its expiry instant.
pub fn is_live(session: &Session, now: DateTime<Utc>) -> bool {
    session.expires_at.is_some_and(|expires_at| now < expires_at)
}
