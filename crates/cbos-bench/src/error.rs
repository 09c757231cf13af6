//! Error types for backends, configuration and the benchmark engine.

use thiserror::Error;

/// Errors reported by a [`Backend`](crate::Backend) implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Context allocation or library setup failed.
    #[error("backend initialization failed: {0}")]
    Init(String),

    /// The random generator could not fill the buffer.
    #[error("random generation failed: {0}")]
    Random(String),

    /// The identifier is not one this backend can run.
    #[error("unsupported cipher: {0}")]
    UnsupportedCipher(String),

    /// Key, IV or cipher context setup failed for a supported cipher.
    #[error("failed to set up {cipher}: {reason}")]
    CipherSetup {
        /// Cipher being activated.
        cipher: String,
        /// Library-specific reason.
        reason: String,
    },

    /// `encrypt` was called before any cipher was activated.
    #[error("no cipher is active")]
    NoActiveCipher,

    /// Source and destination buffers differ in length.
    #[error("buffer length mismatch: src={src} dst={dst}")]
    BufferMismatch {
        /// Source length in bytes.
        src: usize,
        /// Destination length in bytes.
        dst: usize,
    },

    /// The message size is not a multiple of the cipher block size.
    #[error("message size {size} is not a multiple of the {block}-byte block size")]
    UnalignedMessage {
        /// Message size in bytes.
        size: usize,
        /// Block size in bytes.
        block: usize,
    },

    /// The cipher reported an error while encrypting.
    #[error("encryption failed: {0}")]
    Encrypt(String),

    /// Releasing the context failed.
    #[error("backend teardown failed: {0}")]
    Free(String),
}

/// Invalid run configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Iteration count must be positive.
    #[error("the number of iterations must be greater than zero")]
    ZeroIterations,

    /// Message size must be positive.
    #[error("the message size must be greater than zero")]
    ZeroMessageSize,

    /// Progress tick must be positive.
    #[error("the progress interval must be greater than zero")]
    ZeroProgressInterval,

    /// Report period must be positive.
    #[error("the progress report period must be greater than zero ticks")]
    ZeroReportPeriod,

    /// Key size is not 128, 192 or 256 bits.
    #[error("unsupported key size {0}, expected 128, 192 or 256")]
    KeySize(u16),

    /// Unknown cipher family name.
    #[error("unknown cipher family '{0}', expected 'modes' or 'ecb'")]
    Family(String),

    /// Unknown backend name.
    #[error("unknown backend '{0}', expected 'rustcrypto', 'ring' or 'openssl'")]
    Backend(String),
}

/// Errors that abort a whole benchmark run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configuration was rejected before any backend call.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The selected backend is not compiled into this build.
    #[error("backend '{0}' is not available in this build")]
    BackendUnavailable(String),

    /// Backend `init` failed.
    #[error("[{backend}] cipher parameters initialization failed: {source}")]
    Init {
        /// Backend name.
        backend: String,
        /// Underlying failure.
        #[source]
        source: BackendError,
    },
}

/// Result alias for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
