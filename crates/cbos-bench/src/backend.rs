//! The capability contract every cipher backend implements.
//!
//! A backend wraps one cryptographic library. The engine is written once
//! against [`Backend`] and drives any implementation through the same seven
//! operations: `name`, `ciphers`, `init`, `free`, `random`, `set_cipher` and
//! `encrypt`.
//!
//! Backend state lives in the associated [`Backend::Context`]. `init` hands
//! ownership of a fresh context to the caller, the mutating operations borrow
//! it, and `free` consumes it, so a context can neither be used after it is
//! released nor released twice.

use crate::error::BackendResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque name of a cipher advertised by a backend.
///
/// Identifiers are only meaningful to the backend that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CipherId(String);

impl CipherId {
    /// Creates an identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CipherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CipherId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Capability contract for a cipher backend.
pub trait Backend {
    /// Backend-owned state: keys, IVs, library handles.
    type Context;

    /// Returns a short identifying string, usually library and version.
    fn name(&self) -> &str;

    /// Returns the ciphers to benchmark, in benchmark order.
    ///
    /// An empty slice is valid and results in an empty run.
    fn ciphers(&self) -> &[CipherId];

    /// Allocates a fresh context.
    fn init(&self) -> BackendResult<Self::Context>;

    /// Releases a context and everything it owns.
    fn free(&self, ctx: Self::Context) -> BackendResult<()>;

    /// Fills `dst` with random bytes.
    fn random(&self, ctx: &mut Self::Context, dst: &mut [u8]) -> BackendResult<()>;

    /// Makes `cipher` the active cipher for subsequent [`Backend::encrypt`] calls.
    fn set_cipher(&self, ctx: &mut Self::Context, cipher: &CipherId) -> BackendResult<()>;

    /// Encrypts `src` into `dst` with the active cipher.
    ///
    /// Both buffers have the configured message size. Returns the number of
    /// bytes written, which is non-zero on success.
    fn encrypt(&self, ctx: &mut Self::Context, dst: &mut [u8], src: &[u8]) -> BackendResult<usize>;
}
