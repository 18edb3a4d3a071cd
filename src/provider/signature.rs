use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a callback signature is rejected. Missing header and mismatch are
/// deliberately separate so operators can tell misconfigured senders from
/// forgery attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("malformed signature header")]
    InvalidFormat,
    #[error("signature mismatch")]
    Mismatch,
}

impl SignatureError {
    /// Short label used on rejection metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            SignatureError::Missing => "missing",
            SignatureError::InvalidFormat => "format",
            SignatureError::Mismatch => "mismatch",
        }
    }
}

/// Verifies provider callback signatures: HMAC-SHA256 under the provider
/// private key, computed over the exact raw body bytes, sent as lowercase
/// hex in the signature header.
#[derive(Clone)]
pub struct SignatureVerifier {
    private_key: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(private_key: impl AsRef<[u8]>) -> Self {
        Self {
            private_key: private_key.as_ref().to_vec(),
        }
    }

    fn keyed_mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.private_key).expect("HMAC can take key of any size")
    }

    /// Checks `signature` against the MAC of `body`. The underlying
    /// comparison is constant time; never replace it with a byte loop.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        let signature = signature.ok_or(SignatureError::Missing)?;
        let provided = hex::decode(signature.trim()).map_err(|_| SignatureError::InvalidFormat)?;

        let mut mac = self.keyed_mac();
        mac.update(body);
        mac.verify_slice(&provided)
            .map_err(|_| SignatureError::Mismatch)
    }

    /// Computes the hex signature for a body, exactly as the provider does.
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = self.keyed_mac();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }
}
