//! Asymmetric codec: RSA-OAEP over text payloads and public key text encoding.
//!
//! - **Padding**: OAEP with SHA-256 as both hash and MGF1 digest, no label
//! - **Ciphertext encoding**: standard base64
//! - **Public key encoding**: SubjectPublicKeyInfo PEM

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;

use crate::types::{E2eeError, PrivateKey, PublicKey, Result};

/// Encode a public key as SubjectPublicKeyInfo PEM.
pub fn encode_public(key: &PublicKey) -> Result<String> {
    key.as_rsa()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| E2eeError::Encoding(format!("Public key PEM encoding failed: {e}")))
}

/// Decode a SubjectPublicKeyInfo PEM public key.
pub fn decode_public(pem: &str) -> Result<PublicKey> {
    RsaPublicKey::from_public_key_pem(pem.trim())
        .map(PublicKey::new)
        .map_err(|e| E2eeError::Encoding(format!("Invalid public key PEM: {e}")))
}

/// Encrypt `plaintext` to `public_key`, returning base64 ciphertext.
pub fn encrypt(public_key: &PublicKey, plaintext: &str) -> Result<String> {
    let ciphertext = public_key
        .as_rsa()
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext.as_bytes())
        .map_err(|e| E2eeError::Encoding(format!("Encryption failed: {e}")))?;

    Ok(BASE64.encode(ciphertext))
}

/// Decrypt base64 `ciphertext` with `private_key`.
///
/// # Errors
///
/// Returns [`E2eeError::Decryption`] if the ciphertext is not valid base64,
/// was not produced for this key pair, or does not decrypt to UTF-8.
pub fn decrypt(private_key: &PrivateKey, ciphertext: &str) -> Result<String> {
    let bytes = BASE64
        .decode(ciphertext)
        .map_err(|e| E2eeError::Decryption(format!("Invalid ciphertext encoding: {e}")))?;

    let plaintext = private_key
        .as_rsa()
        .decrypt(Oaep::new::<Sha256>(), &bytes)
        .map_err(|e| E2eeError::Decryption(e.to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| E2eeError::Decryption(format!("Plaintext is not UTF-8: {e}")))
}
