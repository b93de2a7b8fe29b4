use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Header the processor uses for the signed timestamp and digests.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

const DEFAULT_TOLERANCE_SECS: u64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a webhook delivery is refused before its body is trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("webhook secret is not configured")]
    MissingSecret,
    #[error("signature header is missing")]
    MissingHeader,
    #[error("signature header is malformed")]
    MalformedHeader,
    #[error("no signature matches the payload")]
    NoMatchingSignature,
    #[error("signature timestamp is outside the tolerance window")]
    TimestampOutsideTolerance,
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// `t=<unix>,v1=<hex>[,v1=<hex>...]`; other schemes are skipped.
    fn parse(raw: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for element in raw.split(',') {
            let (key, value) = element
                .trim()
                .split_once('=')
                .ok_or(SignatureError::MalformedHeader)?;
            match key {
                "t" => {
                    let parsed = value
                        .parse::<i64>()
                        .map_err(|_| SignatureError::MalformedHeader)?;
                    timestamp = Some(parsed);
                }
                "v1" => {
                    if let Ok(bytes) = hex::decode(value) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(SignatureError::NoMatchingSignature);
        }
        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verifies processor signatures against the shared webhook secret. Fails closed.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
    tolerance_secs: u64,
}

impl WebhookVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|secret| !secret.is_empty()),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn verify(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let secret = self.secret.as_deref().ok_or(SignatureError::MissingSecret)?;
        let header = header
            .filter(|value| !value.trim().is_empty())
            .ok_or(SignatureError::MissingHeader)?;
        let parsed = SignatureHeader::parse(header)?;

        let mac = keyed_mac(secret, parsed.timestamp, payload)?;
        let matched = parsed
            .signatures
            .iter()
            .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
        if !matched {
            return Err(SignatureError::NoMatchingSignature);
        }

        if now.timestamp().abs_diff(parsed.timestamp) > self.tolerance_secs {
            return Err(SignatureError::TimestampOutsideTolerance);
        }
        Ok(())
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("configured", &self.secret.is_some())
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

fn keyed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::MissingSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Builds a header value the way the processor does; used by local tooling and tests.
pub fn signature_header(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let digest = keyed_mac(secret, timestamp, payload)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("t={timestamp},v1={digest}")
}
