//! Webhook secret validation.
//!
//! Telegram echoes the secret given to `setWebhook` back in the
//! `X-Telegram-Bot-Api-Secret-Token` header of every update. Updates without
//! the matching header are rejected. With no secret configured nothing can
//! match, so every update is rejected.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header Telegram uses to carry the webhook secret.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// The configured webhook secret. `None` rejects every update.
#[derive(Clone, Default)]
pub struct SecretToken {
    secret: Option<String>,
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretToken")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl SecretToken {
    /// An empty secret is treated the same as no secret.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Check the header value presented with an update.
    ///
    /// Both sides are run through HMAC-SHA256 keyed by the secret so the final
    /// comparison is over equal-length digests via `verify_slice`, which is
    /// constant-time.
    pub fn matches(&self, presented: Option<&str>) -> bool {
        let Some(secret) = &self.secret else {
            return false;
        };
        let Some(presented) = presented else {
            return false;
        };

        let digest = |input: &[u8]| {
            HmacSha256::new_from_slice(secret.as_bytes()).map(|mut mac| {
                mac.update(input);
                mac
            })
        };

        match (digest(secret.as_bytes()), digest(presented.as_bytes())) {
            (Ok(expected), Ok(candidate)) => {
                let expected = expected.finalize().into_bytes();
                candidate.verify_slice(&expected).is_ok()
            }
            _ => false,
        }
    }
}
