//! Private key envelope: password wrapping for remote storage.
//!
//! The private key is serialized as PKCS#8 and sealed in an encrypted PKCS#8
//! container (PBES2: PBKDF2-SHA-256 + AES-256-CBC) whose passphrase is the
//! key derived from the user's password. The derivation salt travels next to
//! the ciphertext; the password itself never leaves the device.

use pkcs5::pbes2;
use pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding, PrivateKeyInfo};
use rsa::RsaPrivateKey;

use super::derivation::{derive, generate_random_bytes, SALT_LEN};
use crate::types::{E2eeError, PrivateKey, Result};

/// PEM label of an encrypted PKCS#8 container
pub const ENCRYPTED_PEM_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// PBKDF2 rounds inside the container, applied on top of the derived key
const CONTAINER_KDF_ROUNDS: u32 = 2048;

/// AES block size, used as the container IV length
const AES_IV_LEN: usize = 16;

// =============================================================================
// Wrapped Private Key
// =============================================================================

/// A private key encrypted under a password-derived key.
///
/// Immutable once produced.
#[derive(Clone, PartialEq, Eq)]
pub struct WrappedPrivateKey {
    ciphertext: String,
    salt: [u8; SALT_LEN],
}

impl WrappedPrivateKey {
    /// Rebuild from the wire form: PEM container text and a lowercase hex salt.
    pub fn from_wire(ciphertext: impl Into<String>, salt_hex: &str) -> Result<Self> {
        let salt_bytes = hex::decode(salt_hex.trim())
            .map_err(|e| E2eeError::KeyUnwrap(format!("Invalid salt encoding: {e}")))?;

        let salt: [u8; SALT_LEN] = salt_bytes.try_into().map_err(|bytes: Vec<u8>| {
            E2eeError::KeyUnwrap(format!(
                "Invalid salt length: expected {SALT_LEN}, got {}",
                bytes.len()
            ))
        })?;

        Ok(Self {
            ciphertext: ciphertext.into(),
            salt,
        })
    }

    /// The encrypted PKCS#8 PEM text.
    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Salt as lowercase hex, as sent on the wire.
    pub fn salt_hex(&self) -> String {
        hex::encode(self.salt)
    }
}

impl std::fmt::Debug for WrappedPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedPrivateKey")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("salt", &self.salt_hex())
            .finish()
    }
}

// =============================================================================
// Wrap / Unwrap
// =============================================================================

/// Wrap `private_key` under `password` with a fresh random salt.
pub fn wrap(private_key: &PrivateKey, password: &str) -> Result<WrappedPrivateKey> {
    // 1. Serialize to PKCS#8
    let der = private_key
        .as_rsa()
        .to_pkcs8_der()
        .map_err(|e| E2eeError::Encoding(format!("PKCS#8 encoding failed: {e}")))?;
    let info = PrivateKeyInfo::try_from(der.as_bytes())
        .map_err(|e| E2eeError::Encoding(format!("PKCS#8 encoding failed: {e}")))?;

    // 2. Fresh salt
    let salt: [u8; SALT_LEN] = generate_random_bytes();

    // 3. Derive the passphrase
    let derived = derive(password, &salt);

    // 4. Seal the container
    let container_salt: [u8; SALT_LEN] = generate_random_bytes();
    let iv: [u8; AES_IV_LEN] = generate_random_bytes();
    let params = pbes2::Parameters::pbkdf2_sha256_aes256cbc(
        CONTAINER_KDF_ROUNDS,
        &container_salt,
        &iv,
    )
    .map_err(|e| E2eeError::Encoding(format!("Invalid container parameters: {e}")))?;

    let sealed = info
        .encrypt_with_params(params, derived.as_bytes())
        .map_err(|e| E2eeError::Encoding(format!("Container encryption failed: {e}")))?;

    let pem = sealed
        .to_pem(ENCRYPTED_PEM_LABEL, LineEnding::LF)
        .map_err(|e| E2eeError::Encoding(format!("Container PEM encoding failed: {e}")))?;

    // 5. Ciphertext + salt
    Ok(WrappedPrivateKey {
        ciphertext: pem.to_string(),
        salt,
    })
}

/// Unwrap a private key with `password`.
///
/// # Errors
///
/// Returns [`E2eeError::KeyUnwrap`] if the password is wrong or the container
/// is corrupt.
pub fn unwrap(wrapped: &WrappedPrivateKey, password: &str) -> Result<PrivateKey> {
    let derived = derive(password, &wrapped.salt);

    RsaPrivateKey::from_pkcs8_encrypted_pem(wrapped.ciphertext.trim(), derived.as_bytes())
        .map(PrivateKey::new)
        .map_err(|e| E2eeError::KeyUnwrap(format!("wrong password or corrupt container ({e})")))
}
