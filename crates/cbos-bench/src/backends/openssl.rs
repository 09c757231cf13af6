//! OpenSSL backend.
//!
//! Uses the EVP cipher interface with padding disabled. Every `encrypt`
//! re-initializes the EVP context with the key and IV chosen in
//! `set_cipher`, then updates and finalizes, so each call measures a full
//! one-shot encryption and equal inputs give equal outputs.
//!
//! `cipher_update` needs one spare block of output and `cipher_final` one
//! more, hence the scratch buffer in the context.

use super::IV_SIZE;
use crate::backend::{Backend, CipherId};
use crate::config::{CipherFamily, CipherSuite, KeySize};
use crate::error::{BackendError, BackendResult};
use ::openssl::cipher::{Cipher, CipherRef};
use ::openssl::cipher_ctx::CipherCtx;
use ::openssl::rand::rand_bytes;
use zeroize::Zeroize;

/// Key material, the EVP context and the active cipher.
pub struct OpenSslContext {
    evp: CipherCtx,
    key: Vec<u8>,
    iv: [u8; IV_SIZE],
    scratch: Vec<u8>,
    active: Option<(CipherId, &'static CipherRef)>,
}

impl OpenSslContext {
    /// The cipher selected by the last successful `set_cipher`.
    #[must_use]
    pub fn active_cipher(&self) -> Option<&CipherId> {
        self.active.as_ref().map(|(id, _)| id)
    }

    fn reset(&mut self, cipher: &'static CipherRef) -> Result<(), ::openssl::error::ErrorStack> {
        let iv = match cipher.iv_length() {
            0 => None,
            len => Some(&self.iv[..len]),
        };
        self.evp.encrypt_init(Some(cipher), Some(self.key.as_slice()), iv)?;
        self.evp.set_padding(false);
        Ok(())
    }
}

impl Drop for OpenSslContext {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
    }
}

/// Backend over the system OpenSSL library.
#[derive(Debug, Clone)]
pub struct OpenSslBackend {
    name: String,
    key_size: KeySize,
    ciphers: Vec<CipherId>,
}

impl OpenSslBackend {
    /// Creates the backend for `suite`.
    #[must_use]
    pub fn new(suite: CipherSuite) -> Self {
        let bits = suite.key_size.bits();
        let modes: &[&str] = match suite.family {
            CipherFamily::Modes => &["ECB", "CBC", "CTR", "CFB"],
            CipherFamily::Ecb => &["ECB"],
        };
        Self {
            name: ::openssl::version::version().to_string(),
            key_size: suite.key_size,
            ciphers: modes
                .iter()
                .map(|mode| CipherId::new(format!("AES-{bits}-{mode}")))
                .collect(),
        }
    }

    fn cipher(&self, id: &CipherId) -> BackendResult<&'static CipherRef> {
        if !self.ciphers.contains(id) {
            return Err(BackendError::UnsupportedCipher(id.to_string()));
        }
        let mode = id.as_str().rsplit('-').next().unwrap_or_default();
        let cipher = match (self.key_size, mode) {
            (KeySize::Aes128, "ECB") => Cipher::aes_128_ecb(),
            (KeySize::Aes128, "CBC") => Cipher::aes_128_cbc(),
            (KeySize::Aes128, "CTR") => Cipher::aes_128_ctr(),
            (KeySize::Aes128, "CFB") => Cipher::aes_128_cfb128(),
            (KeySize::Aes192, "ECB") => Cipher::aes_192_ecb(),
            (KeySize::Aes192, "CBC") => Cipher::aes_192_cbc(),
            (KeySize::Aes192, "CTR") => Cipher::aes_192_ctr(),
            (KeySize::Aes192, "CFB") => Cipher::aes_192_cfb128(),
            (KeySize::Aes256, "ECB") => Cipher::aes_256_ecb(),
            (KeySize::Aes256, "CBC") => Cipher::aes_256_cbc(),
            (KeySize::Aes256, "CTR") => Cipher::aes_256_ctr(),
            (KeySize::Aes256, "CFB") => Cipher::aes_256_cfb128(),
            _ => return Err(BackendError::UnsupportedCipher(id.to_string())),
        };
        Ok(cipher)
    }
}

impl Backend for OpenSslBackend {
    type Context = OpenSslContext;

    fn name(&self) -> &str {
        &self.name
    }

    fn ciphers(&self) -> &[CipherId] {
        &self.ciphers
    }

    fn init(&self) -> BackendResult<Self::Context> {
        let evp = CipherCtx::new().map_err(|e| BackendError::Init(e.to_string()))?;
        Ok(OpenSslContext {
            evp,
            key: vec![0u8; self.key_size.bytes()],
            iv: [0u8; IV_SIZE],
            scratch: Vec::new(),
            active: None,
        })
    }

    fn free(&self, ctx: Self::Context) -> BackendResult<()> {
        drop(ctx);
        Ok(())
    }

    fn random(&self, _ctx: &mut Self::Context, dst: &mut [u8]) -> BackendResult<()> {
        rand_bytes(dst).map_err(|e| BackendError::Random(e.to_string()))
    }

    fn set_cipher(&self, ctx: &mut Self::Context, cipher: &CipherId) -> BackendResult<()> {
        ctx.active = None;
        let evp = self.cipher(cipher)?;

        let setup_error = |reason: String| BackendError::CipherSetup {
            cipher: cipher.to_string(),
            reason,
        };

        rand_bytes(&mut ctx.key)
            .and_then(|()| rand_bytes(&mut ctx.iv))
            .map_err(|e| setup_error(e.to_string()))?;
        ctx.reset(evp).map_err(|e| setup_error(e.to_string()))?;

        ctx.active = Some((cipher.clone(), evp));
        Ok(())
    }

    fn encrypt(&self, ctx: &mut Self::Context, dst: &mut [u8], src: &[u8]) -> BackendResult<usize> {
        let evp = ctx
            .active
            .as_ref()
            .map(|(_, evp)| *evp)
            .ok_or(BackendError::NoActiveCipher)?;
        if dst.len() != src.len() {
            return Err(BackendError::BufferMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }

        let block = evp.block_size();
        if src.len() % block != 0 {
            return Err(BackendError::UnalignedMessage {
                size: src.len(),
                block,
            });
        }

        let needed = src.len() + 2 * block;
        if ctx.scratch.len() < needed {
            ctx.scratch.resize(needed, 0);
        }

        let encrypt_error = |e: ::openssl::error::ErrorStack| BackendError::Encrypt(e.to_string());
        ctx.reset(evp).map_err(encrypt_error)?;
        let updated = ctx
            .evp
            .cipher_update(src, Some(ctx.scratch.as_mut_slice()))
            .map_err(encrypt_error)?;
        let finalized = ctx
            .evp
            .cipher_final(&mut ctx.scratch[updated..])
            .map_err(encrypt_error)?;

        let written = (updated + finalized).min(dst.len());
        dst[..written].copy_from_slice(&ctx.scratch[..written]);
        Ok(written)
    }
}
