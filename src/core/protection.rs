//! Data Protection
//!
//! Purpose-scoped authenticated encryption for everything written to a cookie.
//!
//! A protector created for one purpose cannot open payloads sealed for another:
//! the purpose selects the derived key and is bound as associated data.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::hkdf;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, Secret};
use std::sync::{Arc, Mutex};

use crate::error::{ConfigurationError, ProtectionError, TokenResult};

/// Purpose of the state cookie protector.
pub const STATE_PROTECTION_PURPOSE: &str = "StateProtection";

/// Purpose of the token cookie protector.
pub const TOKEN_PROTECTION_PURPOSE: &str = "TokenProtection";

const KEY_DERIVATION_SALT: &[u8] = b"delegated-token.data-protection.v1";

/// Encrypt/decrypt capability bound to one purpose.
pub trait DataProtector: Send + Sync {
    /// Purpose this protector was created for.
    fn purpose(&self) -> &str;

    /// Seal plaintext.
    fn protect(&self, plaintext: &[u8]) -> TokenResult<Vec<u8>>;

    /// Open a payload sealed by a protector with the same purpose and key.
    ///
    /// Tampered or foreign payloads fail; they never decode to garbage.
    fn unprotect(&self, protected: &[u8]) -> TokenResult<Vec<u8>>;
}

/// Factory of purpose-scoped protectors (for dependency injection).
pub trait DataProtectionProvider: Send + Sync {
    fn create_protector(&self, purpose: &str) -> TokenResult<Arc<dyn DataProtector>>;
}

/// AES-256-GCM protection keyed by HKDF-SHA256 over a master key.
pub struct AesGcmDataProtectionProvider {
    master_key: Secret<Vec<u8>>,
    rng: SystemRandom,
}

impl AesGcmDataProtectionProvider {
    /// Create a provider from a 32-byte master key.
    pub fn new(master_key: Vec<u8>) -> Result<Self, ConfigurationError> {
        if master_key.len() != 32 {
            return Err(ConfigurationError::InvalidKey {
                message: format!("master key must be 32 bytes, got {}", master_key.len()),
            });
        }
        Ok(Self {
            master_key: Secret::new(master_key),
            rng: SystemRandom::new(),
        })
    }

    /// Generate a random 32-byte master key.
    pub fn generate_key() -> Result<Vec<u8>, ConfigurationError> {
        let mut key = vec![0u8; 32];
        SystemRandom::new()
            .fill(&mut key)
            .map_err(|_| ConfigurationError::InvalidKey {
                message: "system random source unavailable".to_string(),
            })?;
        Ok(key)
    }

    fn derive_key(&self, purpose: &str) -> Result<LessSafeKey, ProtectionError> {
        let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, KEY_DERIVATION_SALT);
        let prk = salt.extract(self.master_key.expose_secret());
        let info = [purpose.as_bytes()];
        let okm = prk
            .expand(&info, &AES_256_GCM)
            .map_err(|_| ProtectionError::EncryptionFailed {
                purpose: purpose.to_string(),
            })?;
        Ok(LessSafeKey::new(UnboundKey::from(okm)))
    }
}

impl DataProtectionProvider for AesGcmDataProtectionProvider {
    fn create_protector(&self, purpose: &str) -> TokenResult<Arc<dyn DataProtector>> {
        let key = self.derive_key(purpose)?;
        Ok(Arc::new(AesGcmDataProtector {
            purpose: purpose.to_string(),
            key,
            rng: self.rng.clone(),
        }))
    }
}

/// Protector produced by [`AesGcmDataProtectionProvider`].
///
/// Payload layout: `nonce (12 bytes) || ciphertext || tag`.
pub struct AesGcmDataProtector {
    purpose: String,
    key: LessSafeKey,
    rng: SystemRandom,
}

impl DataProtector for AesGcmDataProtector {
    fn purpose(&self) -> &str {
        &self.purpose
    }

    fn protect(&self, plaintext: &[u8]) -> TokenResult<Vec<u8>> {
        let failed = || ProtectionError::EncryptionFailed {
            purpose: self.purpose.clone(),
        };

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng.fill(&mut nonce_bytes).map_err(|_| failed())?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut data = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::from(self.purpose.as_bytes()), &mut data)
            .map_err(|_| failed())?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(data);
        Ok(combined)
    }

    fn unprotect(&self, protected: &[u8]) -> TokenResult<Vec<u8>> {
        let min_len = NONCE_LEN + AES_256_GCM.tag_len();
        if protected.len() < min_len {
            return Err(ProtectionError::MalformedPayload {
                purpose: self.purpose.clone(),
                message: format!("payload shorter than {} bytes", min_len),
            }
            .into());
        }

        let (nonce_bytes, sealed) = protected.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| {
            ProtectionError::MalformedPayload {
                purpose: self.purpose.clone(),
                message: "invalid nonce".to_string(),
            }
        })?;

        let mut data = sealed.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::from(self.purpose.as_bytes()), &mut data)
            .map_err(|_| ProtectionError::DecryptionFailed {
                purpose: self.purpose.clone(),
            })?;
        Ok(plaintext.to_vec())
    }
}

/// Mock protection provider for testing.
///
/// Protect prefixes the plaintext with `purpose:`; unprotect strips it and
/// fails for any other prefix. Every call is recorded.
#[derive(Default)]
pub struct MockDataProtectionProvider {
    created: Arc<Mutex<Vec<String>>>,
    protected: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    unprotected: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MockDataProtectionProvider {
    /// Create new mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Purposes passed to `create_protector`.
    pub fn get_created_purposes(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    /// `(purpose, plaintext)` passed to `protect`.
    pub fn get_protect_history(&self) -> Vec<(String, Vec<u8>)> {
        self.protected.lock().unwrap().clone()
    }

    /// `(purpose, payload)` passed to `unprotect`.
    pub fn get_unprotect_history(&self) -> Vec<(String, Vec<u8>)> {
        self.unprotected.lock().unwrap().clone()
    }

    /// Payload the mock would produce for a plaintext.
    pub fn seal(purpose: &str, plaintext: &[u8]) -> Vec<u8> {
        let mut sealed = format!("{}:", purpose).into_bytes();
        sealed.extend_from_slice(plaintext);
        sealed
    }
}

impl DataProtectionProvider for MockDataProtectionProvider {
    fn create_protector(&self, purpose: &str) -> TokenResult<Arc<dyn DataProtector>> {
        self.created.lock().unwrap().push(purpose.to_string());
        Ok(Arc::new(MockDataProtector {
            purpose: purpose.to_string(),
            protected: Arc::clone(&self.protected),
            unprotected: Arc::clone(&self.unprotected),
        }))
    }
}

struct MockDataProtector {
    purpose: String,
    protected: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    unprotected: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl DataProtector for MockDataProtector {
    fn purpose(&self) -> &str {
        &self.purpose
    }

    fn protect(&self, plaintext: &[u8]) -> TokenResult<Vec<u8>> {
        self.protected
            .lock()
            .unwrap()
            .push((self.purpose.clone(), plaintext.to_vec()));
        Ok(MockDataProtectionProvider::seal(&self.purpose, plaintext))
    }

    fn unprotect(&self, protected: &[u8]) -> TokenResult<Vec<u8>> {
        self.unprotected
            .lock()
            .unwrap()
            .push((self.purpose.clone(), protected.to_vec()));

        let prefix = format!("{}:", self.purpose);
        protected
            .strip_prefix(prefix.as_bytes())
            .map(|plaintext| plaintext.to_vec())
            .ok_or_else(|| {
                ProtectionError::DecryptionFailed {
                    purpose: self.purpose.clone(),
                }
                .into()
            })
    }
}
