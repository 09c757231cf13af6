//! Cipher backends implementing the [`Backend`](crate::Backend) contract.
//!
//! Each backend wraps one cryptographic library. A backend is picked at
//! startup by [`BackendKind`] and then driven through static dispatch by
//! [`run_backend`].

mod rustcrypto;
#[cfg(feature = "ring")]
mod ring;
#[cfg(feature = "openssl")]
mod openssl;

pub use rustcrypto::{RustCryptoBackend, RustCryptoContext};
#[cfg(feature = "ring")]
pub use self::ring::{RingBackend, RingContext};
#[cfg(feature = "openssl")]
pub use self::openssl::{OpenSslBackend, OpenSslContext};

use crate::backend::{Backend, CipherId};
use crate::config::CipherSuite;
use crate::cycles::CycleSource;
use crate::engine::Engine;
use crate::error::{ConfigError, EngineError};
use crate::result::RunSummary;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Associated data attached to every AEAD encryption.
pub(crate) const AEAD_ASSOCIATED_DATA: &[u8; 16] = b"ADADADADADADADAD";

/// IV length for block and stream modes.
pub(crate) const IV_SIZE: usize = 16;

/// Nonce length for AEAD modes.
pub(crate) const AEAD_NONCE_SIZE: usize = 12;

/// Selectable backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Pure Rust AES implementations from the RustCrypto project.
    #[default]
    RustCrypto,
    /// The `ring` library.
    Ring,
    /// The system OpenSSL library.
    OpenSsl,
}

impl BackendKind {
    /// Every backend, compiled in or not.
    pub const ALL: [Self; 3] = [Self::RustCrypto, Self::Ring, Self::OpenSsl];

    /// Configuration name of the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RustCrypto => "rustcrypto",
            Self::Ring => "ring",
            Self::OpenSsl => "openssl",
        }
    }

    /// Whether this build includes the backend.
    #[must_use]
    pub const fn is_available(self) -> bool {
        match self {
            Self::RustCrypto => true,
            Self::Ring => cfg!(feature = "ring"),
            Self::OpenSsl => cfg!(feature = "openssl"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rustcrypto" | "rust-crypto" => Ok(Self::RustCrypto),
            "ring" => Ok(Self::Ring),
            "openssl" => Ok(Self::OpenSsl),
            other => Err(ConfigError::Backend(other.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and cipher list of a backend, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendInfo {
    /// Selection key.
    pub kind: BackendKind,
    /// Name reported by the backend.
    pub name: String,
    /// Advertised ciphers in benchmark order.
    pub ciphers: Vec<CipherId>,
}

impl BackendInfo {
    fn of<B: Backend>(kind: BackendKind, backend: &B) -> Self {
        Self {
            kind,
            name: backend.name().to_string(),
            ciphers: backend.ciphers().to_vec(),
        }
    }
}

/// Describes a backend, or `None` if it is not compiled in.
#[must_use]
pub fn describe(kind: BackendKind, suite: CipherSuite) -> Option<BackendInfo> {
    match kind {
        BackendKind::RustCrypto => Some(BackendInfo::of(kind, &RustCryptoBackend::new(suite))),
        #[cfg(feature = "ring")]
        BackendKind::Ring => Some(BackendInfo::of(kind, &RingBackend::new(suite))),
        #[cfg(feature = "openssl")]
        BackendKind::OpenSsl => Some(BackendInfo::of(kind, &OpenSslBackend::new(suite))),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// Describes every backend compiled into this build.
#[must_use]
pub fn available(suite: CipherSuite) -> Vec<BackendInfo> {
    BackendKind::ALL
        .into_iter()
        .filter_map(|kind| describe(kind, suite))
        .collect()
}

/// Builds the backend selected by `kind` and runs `engine` against it.
pub fn run_backend<C: CycleSource>(
    kind: BackendKind,
    suite: CipherSuite,
    engine: &Engine<C>,
) -> Result<RunSummary, EngineError> {
    match kind {
        BackendKind::RustCrypto => engine.run(&RustCryptoBackend::new(suite)),
        #[cfg(feature = "ring")]
        BackendKind::Ring => engine.run(&RingBackend::new(suite)),
        #[cfg(feature = "openssl")]
        BackendKind::OpenSsl => engine.run(&OpenSslBackend::new(suite)),
        #[allow(unreachable_patterns)]
        other => Err(EngineError::BackendUnavailable(other.to_string())),
    }
}
