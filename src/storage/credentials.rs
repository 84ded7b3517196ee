//! Saved login details with the password sealed at rest.
//!
//! The key is derived from a constant compiled into the binary, so this only
//! keeps the password out of casual view of the file.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::digest::{SHA256, digest};
use ring::rand::{SecureRandom, SystemRandom};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{StorageError, read_json, write_json};
use crate::rcon::Credentials;

const APP_KEY: &str = "rcon-admin:credential-store:2f9c41d7";

fn sealing_key() -> Result<LessSafeKey, StorageError> {
    let key_bytes = digest(&SHA256, APP_KEY.as_bytes());
    let unbound = UnboundKey::new(&AES_256_GCM, key_bytes.as_ref())
        .map_err(|_| StorageError::Crypto("invalid key length".into()))?;
    Ok(LessSafeKey::new(unbound))
}

/// base64(nonce || ciphertext || tag)
pub fn encrypt(plaintext: &str) -> Result<String, StorageError> {
    let key = sealing_key()?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| StorageError::Crypto("random source unavailable".into()))?;

    let mut in_out = plaintext.as_bytes().to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| StorageError::Crypto("seal failed".into()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&in_out);
    Ok(STANDARD.encode(sealed))
}

pub fn decrypt(encoded: &str) -> Result<String, StorageError> {
    let sealed = STANDARD
        .decode(encoded.trim())
        .map_err(|e| StorageError::Crypto(format!("invalid base64: {}", e)))?;
    if sealed.len() < NONCE_LEN {
        return Err(StorageError::Crypto("ciphertext too short".into()));
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| StorageError::Crypto("invalid nonce".into()))?;

    let key = sealing_key()?;
    let mut in_out = ciphertext.to_vec();
    let plain = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| StorageError::Crypto("ciphertext rejected".into()))?;

    String::from_utf8(plain.to_vec())
        .map_err(|_| StorageError::Crypto("decrypted password is not UTF-8".into()))
}

/// File-backed store for a single set of credentials.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, credentials: &Credentials) -> Result<(), StorageError> {
        let sealed = Credentials {
            password: encrypt(&credentials.password)?,
            ..credentials.clone()
        };
        write_json(&self.path, &sealed)?;
        info!("Saved credentials for {}", credentials.address());
        Ok(())
    }

    /// `None` when nothing has been saved yet
    pub fn load(&self) -> Result<Option<Credentials>, StorageError> {
        if !self.path.exists() {
            debug!("No saved credentials at {}", self.path.display());
            return Ok(None);
        }

        let mut credentials: Credentials = read_json(&self.path)?;
        credentials.password = decrypt(&credentials.password)?;
        Ok(Some(credentials))
    }

    /// Returns whether a file was removed
    pub fn delete(&self) -> Result<bool, StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}
