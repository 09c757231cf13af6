//! ring backend.
//!
//! ring only offers AEAD ciphers. It has no AES-192, so an AES-192 suite
//! still advertises `AES-192-GCM` and rejects it in `set_cipher`.

use super::{AEAD_ASSOCIATED_DATA, AEAD_NONCE_SIZE};
use crate::backend::{Backend, CipherId};
use crate::config::{CipherFamily, CipherSuite, KeySize};
use crate::error::{BackendError, BackendResult};
use ::ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey};
use ::ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroize;

const CHACHA20_POLY1305: &str = "CHACHA20-POLY1305";

/// Sealing key and nonce of the active ring cipher.
pub struct RingContext {
    rng: SystemRandom,
    nonce: [u8; AEAD_NONCE_SIZE],
    active: Option<(CipherId, LessSafeKey)>,
}

impl RingContext {
    /// The cipher selected by the last successful `set_cipher`.
    #[must_use]
    pub fn active_cipher(&self) -> Option<&CipherId> {
        self.active.as_ref().map(|(id, _)| id)
    }
}

impl Drop for RingContext {
    fn drop(&mut self) {
        self.nonce.zeroize();
    }
}

/// Backend over the ring AEAD API.
#[derive(Debug, Clone)]
pub struct RingBackend {
    key_size: KeySize,
    ciphers: Vec<CipherId>,
}

impl RingBackend {
    /// Creates the backend for `suite`.
    #[must_use]
    pub fn new(suite: CipherSuite) -> Self {
        let ciphers = match suite.family {
            CipherFamily::Modes => vec![
                CipherId::new(format!("AES-{}-GCM", suite.key_size.bits())),
                CipherId::from(CHACHA20_POLY1305),
            ],
            CipherFamily::Ecb => Vec::new(),
        };
        Self {
            key_size: suite.key_size,
            ciphers,
        }
    }

    fn algorithm(&self, cipher: &CipherId) -> BackendResult<&'static aead::Algorithm> {
        if !self.ciphers.contains(cipher) {
            return Err(BackendError::UnsupportedCipher(cipher.to_string()));
        }
        if cipher.as_str() == CHACHA20_POLY1305 {
            return Ok(&aead::CHACHA20_POLY1305);
        }
        match self.key_size {
            KeySize::Aes128 => Ok(&aead::AES_128_GCM),
            KeySize::Aes256 => Ok(&aead::AES_256_GCM),
            KeySize::Aes192 => Err(BackendError::UnsupportedCipher(cipher.to_string())),
        }
    }
}

impl Backend for RingBackend {
    type Context = RingContext;

    fn name(&self) -> &str {
        "ring"
    }

    fn ciphers(&self) -> &[CipherId] {
        &self.ciphers
    }

    fn init(&self) -> BackendResult<Self::Context> {
        Ok(RingContext {
            rng: SystemRandom::new(),
            nonce: [0u8; AEAD_NONCE_SIZE],
            active: None,
        })
    }

    fn free(&self, ctx: Self::Context) -> BackendResult<()> {
        drop(ctx);
        Ok(())
    }

    fn random(&self, ctx: &mut Self::Context, dst: &mut [u8]) -> BackendResult<()> {
        ctx.rng
            .fill(dst)
            .map_err(|_| BackendError::Random("SystemRandom::fill failed".to_string()))
    }

    fn set_cipher(&self, ctx: &mut Self::Context, cipher: &CipherId) -> BackendResult<()> {
        ctx.active = None;
        let algorithm = self.algorithm(cipher)?;

        let setup_error = |reason: &str| BackendError::CipherSetup {
            cipher: cipher.to_string(),
            reason: reason.to_string(),
        };

        let mut key = vec![0u8; algorithm.key_len()];
        ctx.rng
            .fill(&mut key)
            .and_then(|()| ctx.rng.fill(&mut ctx.nonce))
            .map_err(|_| setup_error("random key generation failed"))?;

        let unbound = UnboundKey::new(algorithm, &key);
        key.zeroize();
        let unbound = unbound.map_err(|_| setup_error("key rejected"))?;

        ctx.active = Some((cipher.clone(), LessSafeKey::new(unbound)));
        Ok(())
    }

    fn encrypt(&self, ctx: &mut Self::Context, dst: &mut [u8], src: &[u8]) -> BackendResult<usize> {
        let (_, key) = ctx.active.as_ref().ok_or(BackendError::NoActiveCipher)?;
        if dst.len() != src.len() {
            return Err(BackendError::BufferMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }

        dst.copy_from_slice(src);
        key.seal_in_place_separate_tag(
            Nonce::assume_unique_for_key(ctx.nonce),
            Aad::from(AEAD_ASSOCIATED_DATA),
            dst,
        )
        .map_err(|_| BackendError::Encrypt("seal_in_place_separate_tag failed".to_string()))?;
        Ok(dst.len())
    }
}
