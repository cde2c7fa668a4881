//! Credential encryption module
//!
//! AES-256-GCM with a PBKDF2-HMAC-SHA256 key derived from the process secret.
//! Every encryption draws a fresh salt and IV, and the key is re-derived on
//! every call; derived keys are never kept around.

mod redact;

pub use redact::{mask_secret, redact_secrets, sanitize_for_log};

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac_array;
use rand::RngCore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{CoreError, CoreResult};

/// Environment variable holding the process secret.
pub const ENCRYPTION_KEY_ENV: &str = "MAIL_DNS_ENCRYPTION_KEY";

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LENGTH: usize = 16;
const IV_LENGTH: usize = 12;
const KEY_LENGTH: usize = 32; // AES-256

/// Encrypted blob, every part lowercase hex
///
/// Deserializes from either the three-field object or the compact
/// `salt:iv:ciphertext` string; serializes as the object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EnvelopeRepr")]
pub struct EncryptedEnvelope {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
}

impl EncryptedEnvelope {
    /// `salt:iv:ciphertext`
    pub fn to_compact(&self) -> String {
        format!("{}:{}:{}", self.salt, self.iv, self.ciphertext)
    }

    pub fn from_compact(s: &str) -> CoreResult<Self> {
        let mut parts = s.trim().split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(salt), Some(iv), Some(ciphertext), None)
                if !salt.is_empty() && !iv.is_empty() && !ciphertext.is_empty() =>
            {
                Ok(Self {
                    ciphertext: ciphertext.to_string(),
                    iv: iv.to_string(),
                    salt: salt.to_string(),
                })
            }
            _ => Err(CoreError::DecryptionFailed),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvelopeRepr {
    Parts {
        ciphertext: String,
        iv: String,
        salt: String,
    },
    Compact(String),
}

impl TryFrom<EnvelopeRepr> for EncryptedEnvelope {
    type Error = String;

    fn try_from(repr: EnvelopeRepr) -> Result<Self, Self::Error> {
        match repr {
            EnvelopeRepr::Parts {
                ciphertext,
                iv,
                salt,
            } => Ok(Self {
                ciphertext,
                iv,
                salt,
            }),
            EnvelopeRepr::Compact(s) => {
                Self::from_compact(&s).map_err(|_| "malformed compact envelope".to_string())
            }
        }
    }
}

/// Symmetric cipher for provider credentials at rest
#[derive(Clone)]
pub struct CredentialCipher {
    secret: String,
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl CredentialCipher {
    pub fn new(secret: impl Into<String>) -> CoreResult<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(CoreError::Configuration(
                "encryption secret must not be empty".to_string(),
            ));
        }
        Ok(Self { secret })
    }

    /// Read the process secret from `MAIL_DNS_ENCRYPTION_KEY`.
    pub fn from_env() -> CoreResult<Self> {
        let secret = std::env::var(ENCRYPTION_KEY_ENV)
            .map_err(|_| CoreError::Configuration(format!("{ENCRYPTION_KEY_ENV} is not set")))?;
        Self::new(secret)
    }

    fn derive_key(&self, salt: &[u8]) -> [u8; KEY_LENGTH] {
        pbkdf2_hmac_array::<Sha256, KEY_LENGTH>(self.secret.as_bytes(), salt, PBKDF2_ITERATIONS)
    }

    pub fn encrypt(&self, plaintext: &str) -> CoreResult<EncryptedEnvelope> {
        let mut salt = [0u8; SALT_LENGTH];
        let mut iv = [0u8; IV_LENGTH];
        rand::rng().fill_bytes(&mut salt);
        rand::rng().fill_bytes(&mut iv);

        let key = self.derive_key(&salt);
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CoreError::Crypto(format!("Failed to create cipher: {e}")))?;

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|e| CoreError::Crypto(format!("Encryption failed: {e}")))?;

        Ok(EncryptedEnvelope {
            ciphertext: hex::encode(ciphertext),
            iv: hex::encode(iv),
            salt: hex::encode(salt),
        })
    }

    /// Any failure (bad hex, wrong key, tampered data) is [`CoreError::DecryptionFailed`].
    pub fn decrypt(&self, envelope: &EncryptedEnvelope) -> CoreResult<String> {
        let salt = hex::decode(&envelope.salt).map_err(|_| CoreError::DecryptionFailed)?;
        let iv = hex::decode(&envelope.iv).map_err(|_| CoreError::DecryptionFailed)?;
        let ciphertext =
            hex::decode(&envelope.ciphertext).map_err(|_| CoreError::DecryptionFailed)?;
        if iv.len() != IV_LENGTH || salt.is_empty() {
            return Err(CoreError::DecryptionFailed);
        }

        let key = self.derive_key(&salt);
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CoreError::Crypto(format!("Failed to create cipher: {e}")))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
            .map_err(|_| CoreError::DecryptionFailed)?;
        String::from_utf8(plaintext).map_err(|_| CoreError::DecryptionFailed)
    }

    /// Serialize `value` to JSON and encrypt it.
    pub fn encrypt_json<T: Serialize>(&self, value: &T) -> CoreResult<EncryptedEnvelope> {
        let json =
            serde_json::to_string(value).map_err(|e| CoreError::Serialization(e.to_string()))?;
        self.encrypt(&json)
    }

    /// Decrypt and parse JSON; a blob that decrypts but does not parse is also corrupted.
    pub fn decrypt_json<T: DeserializeOwned>(&self, envelope: &EncryptedEnvelope) -> CoreResult<T> {
        let json = self.decrypt(envelope)?;
        serde_json::from_str(&json).map_err(|_| CoreError::DecryptionFailed)
    }
}
