//! Response Signing Service
//!
//! Signs API responses with a SECP256K1 key held by the ROFL keymanager
//! (or a locally generated mock key in development). Signatures are
//! recoverable ECDSA over the SHA-256 digest of the canonical JSON encoding
//! of the payload, so any third party can reconstruct the digest, recover
//! the public key, and check it against the one published in the response
//! and in the ROFL metadata.

use std::collections::HashMap;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{error, info};

use crate::config::SigningMode;
use crate::services::canonical::canonical_json;
use crate::services::keymanager::KeyManager;

/// Key label registered with the ROFL keymanager.
const SIGNING_KEY_ID: &str = "rofl-x402-signing-key-v1";

/// Fields appended to a signed envelope; always stripped before hashing so
/// a signature never covers itself.
const ENVELOPE_FIELDS: [&str; 2] = ["signature", "public_key"];

#[derive(Error, Debug)]
pub enum SigningError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("failed to sign payload: {0}")]
    SignatureFailed(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Signing key material held in process memory for the process lifetime.
#[derive(Clone)]
pub struct SigningKeyMaterial {
    /// 32-byte private scalar, hex encoded
    pub private_key_hex: String,
    /// 33-byte compressed public key, hex encoded
    pub public_key_hex: String,
}

/// Service for signing API responses.
pub struct SigningService {
    key: Option<SigningKeyMaterial>,
}

impl SigningService {
    /// Signing disabled; `sign_response` becomes a passthrough.
    pub fn disabled() -> Self {
        Self { key: None }
    }

    /// Locally generated random key, for development and testing.
    pub fn with_generated_key() -> Result<Self, SigningError> {
        let secret: [u8; 32] = rand::random();
        Self::from_key_hex(&hex::encode(secret))
    }

    /// Build from an existing hex-encoded private scalar.
    pub fn from_key_hex(private_key_hex: &str) -> Result<Self, SigningError> {
        let public_key_hex = derive_public_key(private_key_hex)?;
        Ok(Self {
            key: Some(SigningKeyMaterial {
                private_key_hex: private_key_hex.to_string(),
                public_key_hex,
            }),
        })
    }

    /// Initialize key material according to the configured mode.
    ///
    /// Called once at startup; never fails. Any provisioning error is
    /// logged and the service continues with signing disabled, because the
    /// paid endpoint must not depend on signing being available.
    pub async fn initialize(mode: SigningMode, key_manager: &dyn KeyManager) -> Self {
        match mode {
            SigningMode::Disabled => {
                info!("Response signing disabled");
                Self::disabled()
            }
            SigningMode::Mock => match Self::with_generated_key() {
                Ok(service) => {
                    info!(
                        public_key = %service.public_key_hex().unwrap_or_default(),
                        "Using mock signing key"
                    );
                    service
                }
                Err(e) => {
                    error!(error = %e, "Failed to generate mock signing key");
                    Self::disabled()
                }
            },
            SigningMode::Attested => match Self::provision(key_manager).await {
                Ok(service) => service,
                Err(e) => {
                    error!(error = %e, "Failed to initialize TEE signing, continuing unsigned");
                    Self::disabled()
                }
            },
        }
    }

    /// Request a key from the keymanager and publish the derived public key
    /// as discoverability metadata.
    async fn provision(key_manager: &dyn KeyManager) -> anyhow::Result<Self> {
        info!("Generating SECP256K1 signing key via keymanager");
        let private_key_hex = key_manager.generate_key(SIGNING_KEY_ID).await?;

        let service = Self::from_key_hex(&private_key_hex)?;
        let public_key_hex = service
            .public_key_hex()
            .unwrap_or_default()
            .to_string();
        info!(public_key = %public_key_hex, "Signing key generated");

        let mut metadata = HashMap::new();
        metadata.insert("signing_public_key".to_string(), public_key_hex);
        key_manager.set_metadata(metadata).await?;
        info!("Signing public key published to metadata");

        Ok(service)
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Hex-encoded compressed public key, if signing is enabled.
    pub fn public_key_hex(&self) -> Option<&str> {
        self.key.as_ref().map(|k| k.public_key_hex.as_str())
    }

    /// Sign a response payload, attaching `signature` and `public_key`.
    ///
    /// Returns the payload unchanged when no key material is available or
    /// when signing fails internally; attestation is best-effort and must
    /// never turn a successful job result into an error.
    pub fn sign_response(&self, payload: &Value) -> Value {
        let Some(key) = &self.key else {
            return payload.clone();
        };

        match sign_envelope(payload, key) {
            Ok(signed) => signed,
            Err(e) => {
                error!(error = %e, "Failed to sign response");
                payload.clone()
            }
        }
    }
}

/// Derive the compressed SECP256K1 public key for a hex-encoded private
/// scalar.
pub fn derive_public_key(private_key_hex: &str) -> Result<String, SigningError> {
    let signing_key = signing_key_from_hex(private_key_hex)?;
    let point = signing_key.verifying_key().to_encoded_point(true);
    Ok(hex::encode(point.as_bytes()))
}

/// Verify a signed envelope: recompute the canonical digest with the
/// envelope fields removed, recover the public key from the signature, and
/// compare it against the `public_key` field.
pub fn verify_response(envelope: &Value) -> bool {
    let Some(obj) = envelope.as_object() else {
        return false;
    };
    let (Some(sig_hex), Some(pk_hex)) = (
        obj.get("signature").and_then(Value::as_str),
        obj.get("public_key").and_then(Value::as_str),
    ) else {
        return false;
    };

    let Ok(sig_bytes) = hex::decode(sig_hex) else {
        return false;
    };
    // 64-byte (r,s) plus 1-byte recovery id
    if sig_bytes.len() != 65 {
        return false;
    }
    let Ok(signature) = Signature::from_slice(&sig_bytes[..64]) else {
        return false;
    };
    let Some(recovery_id) = RecoveryId::from_byte(sig_bytes[64]) else {
        return false;
    };

    let digest = envelope_digest(envelope);
    let Ok(recovered) = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
    else {
        return false;
    };

    hex::encode(recovered.to_encoded_point(true).as_bytes()) == pk_hex
}

fn signing_key_from_hex(private_key_hex: &str) -> Result<SigningKey, SigningError> {
    let secret =
        hex::decode(private_key_hex).map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;
    SigningKey::from_slice(&secret).map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))
}

fn sign_envelope(payload: &Value, key: &SigningKeyMaterial) -> Result<Value, SigningError> {
    let obj = payload.as_object().ok_or(SigningError::NotAnObject)?;

    let digest = envelope_digest(payload);
    let signing_key = signing_key_from_hex(&key.private_key_hex)?;
    // Sign the digest directly; no secondary hash pass.
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| SigningError::SignatureFailed(e.to_string()))?;

    let mut sig_bytes = signature.to_bytes().to_vec();
    sig_bytes.push(recovery_id.to_byte());

    // Attach to a copy; the input payload is never mutated.
    let mut signed = obj.clone();
    signed.insert("signature".to_string(), Value::String(hex::encode(sig_bytes)));
    signed.insert(
        "public_key".to_string(),
        Value::String(key.public_key_hex.clone()),
    );
    Ok(Value::Object(signed))
}

/// SHA-256 over the canonical encoding of the payload with the envelope
/// fields removed.
fn envelope_digest(payload: &Value) -> [u8; 32] {
    let stripped = match payload {
        Value::Object(map) => {
            let mut map = map.clone();
            for field in ENVELOPE_FIELDS {
                map.remove(field);
            }
            Value::Object(map)
        }
        other => other.clone(),
    };
    Sha256::digest(canonical_json(&stripped)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::keymanager::KeyManagerError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_derive_public_key_generator_vector() {
        // Private scalar 1 maps to the secp256k1 generator point.
        let private_key_hex =
            "0000000000000000000000000000000000000000000000000000000000000001";
        let public_key = derive_public_key(private_key_hex).unwrap();
        assert_eq!(
            public_key,
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let service = SigningService::with_generated_key().unwrap();
        let payload = json!({
            "status": "completed",
            "summary": "This is a test summary",
            "word_count": 100,
            "reading_time_minutes": 1,
        });

        let signed = service.sign_response(&payload);
        assert!(signed.get("signature").is_some());
        assert_eq!(
            signed.get("public_key").and_then(Value::as_str),
            service.public_key_hex()
        );
        // 64-byte (r,s) + recovery id, hex encoded
        assert_eq!(
            signed.get("signature").and_then(Value::as_str).unwrap().len(),
            130
        );
        assert!(verify_response(&signed));
    }

    #[test]
    fn test_tampered_field_fails_verification() {
        let service = SigningService::with_generated_key().unwrap();
        let payload = json!({"status": "completed", "summary": "x", "word_count": 1});
        let signed = service.sign_response(&payload);

        let mut tampered = signed.clone();
        tampered["word_count"] = json!(2);
        assert!(!verify_response(&tampered));

        let mut extra = signed.clone();
        extra["injected"] = json!("field");
        assert!(!verify_response(&extra));

        assert!(verify_response(&signed));
    }

    #[test]
    fn test_signature_invariant_under_key_order() {
        let service = SigningService::from_key_hex(
            "1111111111111111111111111111111111111111111111111111111111111111",
        )
        .unwrap();

        let mut a = serde_json::Map::new();
        a.insert("word_count".to_string(), json!(1));
        a.insert("status".to_string(), json!("completed"));

        let mut b = serde_json::Map::new();
        b.insert("status".to_string(), json!("completed"));
        b.insert("word_count".to_string(), json!(1));

        let signed_a = service.sign_response(&Value::Object(a));
        let signed_b = service.sign_response(&Value::Object(b));
        assert_eq!(signed_a["signature"], signed_b["signature"]);
    }

    #[test]
    fn test_resigning_excludes_envelope_fields() {
        // Signing an already-signed envelope must strip the old signature
        // first, so the result is identical (RFC 6979 nonces are
        // deterministic).
        let service = SigningService::with_generated_key().unwrap();
        let payload = json!({"status": "completed", "summary": "x"});

        let signed_once = service.sign_response(&payload);
        let signed_twice = service.sign_response(&signed_once);
        assert_eq!(signed_once["signature"], signed_twice["signature"]);
    }

    #[test]
    fn test_disabled_service_is_passthrough() {
        let service = SigningService::disabled();
        let payload = json!({"status": "completed"});
        let result = service.sign_response(&payload);
        assert_eq!(result, payload);
        assert!(result.get("signature").is_none());
        assert!(!service.is_enabled());
    }

    #[test]
    fn test_input_payload_not_mutated() {
        let service = SigningService::with_generated_key().unwrap();
        let payload = json!({"status": "completed"});
        let before = payload.clone();
        let _ = service.sign_response(&payload);
        assert_eq!(payload, before);
    }

    #[test]
    fn test_missing_envelope_fields_fail_verification() {
        assert!(!verify_response(&json!({"status": "completed"})));
        assert!(!verify_response(&json!("not an object")));
        assert!(!verify_response(&json!({
            "status": "completed",
            "signature": "zz",
            "public_key": "zz",
        })));
    }

    /// Keymanager double that hands out a fixed key and records published
    /// metadata.
    struct MockKeyManager {
        key: String,
        metadata: Mutex<Vec<HashMap<String, String>>>,
    }

    impl MockKeyManager {
        fn new(key: &str) -> Self {
            Self {
                key: key.to_string(),
                metadata: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl KeyManager for MockKeyManager {
        async fn generate_key(&self, _key_id: &str) -> Result<String, KeyManagerError> {
            Ok(self.key.clone())
        }

        async fn set_metadata(
            &self,
            metadata: HashMap<String, String>,
        ) -> Result<(), KeyManagerError> {
            self.metadata.lock().unwrap().push(metadata);
            Ok(())
        }
    }

    /// Keymanager double that is always unreachable.
    struct UnreachableKeyManager;

    #[async_trait]
    impl KeyManager for UnreachableKeyManager {
        async fn generate_key(&self, _key_id: &str) -> Result<String, KeyManagerError> {
            Err(KeyManagerError::Status(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ))
        }

        async fn set_metadata(
            &self,
            _metadata: HashMap<String, String>,
        ) -> Result<(), KeyManagerError> {
            Err(KeyManagerError::Status(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ))
        }
    }

    #[tokio::test]
    async fn test_attested_provisioning_publishes_public_key() {
        let key_manager = MockKeyManager::new(
            "0000000000000000000000000000000000000000000000000000000000000001",
        );
        let service = SigningService::initialize(SigningMode::Attested, &key_manager).await;

        assert!(service.is_enabled());
        assert_eq!(
            service.public_key_hex().unwrap(),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );

        let published = key_manager.metadata.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].get("signing_public_key").map(String::as_str),
            service.public_key_hex()
        );
    }

    #[tokio::test]
    async fn test_provisioning_failure_degrades_to_unsigned() {
        let service =
            SigningService::initialize(SigningMode::Attested, &UnreachableKeyManager).await;
        assert!(!service.is_enabled());

        // Responses still go out, just unsigned.
        let payload = json!({"status": "completed"});
        assert_eq!(service.sign_response(&payload), payload);
    }

    #[tokio::test]
    async fn test_disabled_mode_skips_keymanager() {
        let service =
            SigningService::initialize(SigningMode::Disabled, &UnreachableKeyManager).await;
        assert!(!service.is_enabled());
    }
}
