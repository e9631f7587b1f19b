//! Reversible encryption of secret fields under a single configured key.
//!
//! Client secrets, access tokens, and refresh tokens are sealed with AES-256-GCM before they
//! reach a store and opened again on the way out; plaintext never touches persistence or logs.
//! Losing the configured key invalidates every stored secret; decryption failures surface as
//! [`EncryptionError::Decrypt`] instead of being silently worked around.

// crates.io
use aes_gcm::{
	Aes256Gcm, Nonce,
	aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
// self
use crate::_prelude::*;

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;

/// Redacted plaintext secret kept out of logs and serialized payloads.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);
impl SecretString {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for SecretString {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for SecretString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SecretString").field(&"<redacted>").finish()
	}
}
impl Display for SecretString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Opaque ciphertext blob as persisted by the stores.
///
/// The random nonce is prepended to the ciphertext and the whole blob is base64 encoded, so one
/// string column is enough to round-trip a sealed secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sealed(String);
impl Sealed {
	/// Wraps an already-encoded ciphertext blob (e.g., read back from a store).
	pub fn from_encoded(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the encoded ciphertext for persistence.
	pub fn encoded(&self) -> &str {
		&self.0
	}
}
impl Debug for Sealed {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Sealed").field(&"<ciphertext>").finish()
	}
}

/// Error type produced by [`SecretCipher`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum EncryptionError {
	/// Configured key is not valid base64.
	#[error("Encryption key is not valid base64.")]
	InvalidKeyEncoding,
	/// Configured key has the wrong length once decoded.
	#[error("Encryption key must be {expected} bytes once decoded, got {actual}.")]
	InvalidKeyLength {
		/// Required key size in bytes.
		expected: usize,
		/// Size of the supplied key in bytes.
		actual: usize,
	},
	/// Sealing a secret failed.
	#[error("Failed to encrypt secret material.")]
	Encrypt,
	/// Stored ciphertext is not valid base64.
	#[error("Stored ciphertext is not valid base64.")]
	CiphertextEncoding,
	/// Stored ciphertext is shorter than the nonce prefix.
	#[error("Stored ciphertext is truncated.")]
	CiphertextTruncated,
	/// The configured key does not match the key that sealed the value, or the ciphertext was
	/// tampered with. Not retryable.
	#[error("Failed to decrypt stored secret; the configured key does not match or the ciphertext is corrupt.")]
	Decrypt,
	/// Decrypted bytes were not valid UTF-8.
	#[error("Decrypted secret is not valid UTF-8.")]
	NotUtf8,
}

/// Reversible encrypt/decrypt pair applied around every secret field read or write.
pub trait SecretCipher
where
	Self: Send + Sync,
{
	/// Encrypts a plaintext secret for storage.
	fn seal(&self, secret: &SecretString) -> Result<Sealed, EncryptionError>;

	/// Decrypts a stored blob back into the plaintext secret.
	fn open(&self, sealed: &Sealed) -> Result<SecretString, EncryptionError>;
}

/// AES-256-GCM [`SecretCipher`] keyed by one configured 256-bit key.
#[derive(Clone)]
pub struct AesGcmCipher(Aes256Gcm);
impl AesGcmCipher {
	/// Builds a cipher from raw 32-byte key material.
	pub fn from_key_bytes(key: [u8; KEY_SIZE]) -> Self {
		Self(Aes256Gcm::new(&key.into()))
	}

	/// Builds a cipher from a base64-encoded 32-byte key, e.g. sourced from the environment.
	pub fn from_base64_key(key: &str) -> Result<Self, EncryptionError> {
		let bytes = BASE64.decode(key).map_err(|_| EncryptionError::InvalidKeyEncoding)?;
		let key: [u8; KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
			EncryptionError::InvalidKeyLength { expected: KEY_SIZE, actual: bytes.len() }
		})?;

		Ok(Self::from_key_bytes(key))
	}
}
impl Debug for AesGcmCipher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AesGcmCipher").field(&"<key>").finish()
	}
}
impl SecretCipher for AesGcmCipher {
	fn seal(&self, secret: &SecretString) -> Result<Sealed, EncryptionError> {
		let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
		let ciphertext = self
			.0
			.encrypt(&nonce, secret.expose().as_bytes())
			.map_err(|_| EncryptionError::Encrypt)?;
		let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());

		blob.extend_from_slice(&nonce);
		blob.extend_from_slice(&ciphertext);

		Ok(Sealed(BASE64.encode(blob)))
	}

	fn open(&self, sealed: &Sealed) -> Result<SecretString, EncryptionError> {
		let blob =
			BASE64.decode(sealed.encoded()).map_err(|_| EncryptionError::CiphertextEncoding)?;

		if blob.len() <= NONCE_SIZE {
			return Err(EncryptionError::CiphertextTruncated);
		}

		let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
		let plaintext = self
			.0
			.decrypt(Nonce::from_slice(nonce), ciphertext)
			.map_err(|_| EncryptionError::Decrypt)?;

		String::from_utf8(plaintext).map(SecretString::new).map_err(|_| EncryptionError::NotUtf8)
	}
}
