//! RustCrypto backend.
//!
//! Covers the raw AES block cipher (ECB) and the CTR, CBC, CFB, GCM, OCB and
//! CCM modes for every key size. Chaining and stream modes keep their state
//! between calls, so consecutive encryptions continue the same stream.

use super::{AEAD_ASSOCIATED_DATA, AEAD_NONCE_SIZE, IV_SIZE};
use crate::backend::{Backend, CipherId};
use crate::config::{CipherFamily, CipherSuite, KeySize};
use crate::error::{BackendError, BackendResult};
use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::consts::{U12, U16};
use aes_gcm::aead::{AeadCore, AeadInPlace, Nonce};
use aes_gcm::AesGcm;
use ccm::Ccm;
use cipher::generic_array::GenericArray;
use cipher::{
    BlockEncrypt, BlockEncryptMut, BlockSizeUser, InvalidLength, KeyInit, KeyIvInit, StreamCipher,
};
use ocb3::Ocb3;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ecb,
    Ctr,
    Cbc,
    Cfb,
    Gcm,
    Ocb,
    Ccm,
}

impl Mode {
    const CHAINED: [Self; 6] = [Self::Ctr, Self::Cbc, Self::Cfb, Self::Gcm, Self::Ocb, Self::Ccm];

    fn cipher_id(self, key_size: KeySize) -> CipherId {
        let bits = key_size.bits();
        let suffix = match self {
            Self::Ecb => return CipherId::new(format!("AES-{bits}")),
            Self::Ctr => "CTR",
            Self::Cbc => "CBC",
            Self::Cfb => "CFB",
            Self::Gcm => "GCM",
            Self::Ocb => "OCB",
            Self::Ccm => "CCM",
        };
        CipherId::new(format!("AES-{bits}/{suffix}"))
    }
}

/// One initialized cipher ready to encrypt.
trait ModeEncryptor {
    fn encrypt(&mut self, dst: &mut [u8], src: &[u8]) -> BackendResult<usize>;
}

fn check_buffers(dst: &[u8], src: &[u8], block: usize) -> BackendResult<()> {
    if dst.len() != src.len() {
        return Err(BackendError::BufferMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    if src.len() % block != 0 {
        return Err(BackendError::UnalignedMessage {
            size: src.len(),
            block,
        });
    }
    Ok(())
}

/// Independent blocks under one key.
struct Ecb<C>(C);

impl<C: BlockEncrypt> ModeEncryptor for Ecb<C> {
    fn encrypt(&mut self, dst: &mut [u8], src: &[u8]) -> BackendResult<usize> {
        let block = C::block_size();
        check_buffers(dst, src, block)?;
        for (input, output) in src.chunks_exact(block).zip(dst.chunks_exact_mut(block)) {
            self.0
                .encrypt_block_b2b(GenericArray::from_slice(input), GenericArray::from_mut_slice(output));
        }
        Ok(dst.len())
    }
}

/// Block modes carrying chaining state (CBC, CFB).
struct Chained<E>(E);

impl<E: BlockEncryptMut> ModeEncryptor for Chained<E> {
    fn encrypt(&mut self, dst: &mut [u8], src: &[u8]) -> BackendResult<usize> {
        let block = E::block_size();
        check_buffers(dst, src, block)?;
        for (input, output) in src.chunks_exact(block).zip(dst.chunks_exact_mut(block)) {
            self.0
                .encrypt_block_b2b_mut(GenericArray::from_slice(input), GenericArray::from_mut_slice(output));
        }
        Ok(dst.len())
    }
}

/// Keystream modes (CTR).
struct Stream<S>(S);

impl<S: StreamCipher> ModeEncryptor for Stream<S> {
    fn encrypt(&mut self, dst: &mut [u8], src: &[u8]) -> BackendResult<usize> {
        check_buffers(dst, src, 1)?;
        self.0
            .apply_keystream_b2b(src, dst)
            .map_err(|e| BackendError::Encrypt(e.to_string()))?;
        Ok(dst.len())
    }
}

/// AEAD modes with a fixed nonce and a discarded tag.
struct Aead<A: AeadCore> {
    aead: A,
    nonce: Nonce<A>,
}

impl<A: AeadCore> Aead<A> {
    fn new(aead: A, iv: &[u8]) -> Result<Self, InvalidLength> {
        let nonce = Nonce::<A>::from_exact_iter(iv.iter().copied().take(AEAD_NONCE_SIZE))
            .ok_or(InvalidLength)?;
        Ok(Self { aead, nonce })
    }
}

impl<A: AeadInPlace> ModeEncryptor for Aead<A> {
    fn encrypt(&mut self, dst: &mut [u8], src: &[u8]) -> BackendResult<usize> {
        check_buffers(dst, src, 1)?;
        dst.copy_from_slice(src);
        self.aead
            .encrypt_in_place_detached(&self.nonce, AEAD_ASSOCIATED_DATA, dst)
            .map_err(|e| BackendError::Encrypt(e.to_string()))?;
        Ok(dst.len())
    }
}

macro_rules! build_mode {
    ($aes:ty, $mode:expr, $key:expr, $iv:expr) => {{
        let encryptor: Box<dyn ModeEncryptor> = match $mode {
            Mode::Ecb => Box::new(Ecb(<$aes>::new_from_slice($key)?)),
            Mode::Ctr => Box::new(Stream(ctr::Ctr128BE::<$aes>::new_from_slices($key, $iv)?)),
            Mode::Cbc => Box::new(Chained(cbc::Encryptor::<$aes>::new_from_slices($key, $iv)?)),
            Mode::Cfb => Box::new(Chained(cfb_mode::Encryptor::<$aes>::new_from_slices(
                $key, $iv,
            )?)),
            Mode::Gcm => Box::new(Aead::new(AesGcm::<$aes, U12>::new_from_slice($key)?, $iv)?),
            Mode::Ocb => Box::new(Aead::new(Ocb3::<$aes, U12>::new_from_slice($key)?, $iv)?),
            Mode::Ccm => Box::new(Aead::new(
                Ccm::<$aes, U16, U12>::new_from_slice($key)?,
                $iv,
            )?),
        };
        encryptor
    }};
}

fn build(
    key_size: KeySize,
    mode: Mode,
    key: &[u8],
    iv: &[u8],
) -> Result<Box<dyn ModeEncryptor>, InvalidLength> {
    Ok(match key_size {
        KeySize::Aes128 => build_mode!(Aes128, mode, key, iv),
        KeySize::Aes192 => build_mode!(Aes192, mode, key, iv),
        KeySize::Aes256 => build_mode!(Aes256, mode, key, iv),
    })
}

/// Key material and the active cipher of a RustCrypto session.
pub struct RustCryptoContext {
    key: Vec<u8>,
    iv: [u8; IV_SIZE],
    active: Option<(CipherId, Box<dyn ModeEncryptor>)>,
}

impl RustCryptoContext {
    /// The cipher selected by the last successful `set_cipher`.
    #[must_use]
    pub fn active_cipher(&self) -> Option<&CipherId> {
        self.active.as_ref().map(|(id, _)| id)
    }
}

impl Drop for RustCryptoContext {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
    }
}

/// Backend over the RustCrypto AES crates.
#[derive(Debug, Clone)]
pub struct RustCryptoBackend {
    key_size: KeySize,
    modes: Vec<Mode>,
    ciphers: Vec<CipherId>,
}

impl RustCryptoBackend {
    /// Creates the backend for `suite`.
    #[must_use]
    pub fn new(suite: CipherSuite) -> Self {
        let modes = match suite.family {
            CipherFamily::Modes => Mode::CHAINED.to_vec(),
            CipherFamily::Ecb => vec![Mode::Ecb],
        };
        let ciphers = modes.iter().map(|m| m.cipher_id(suite.key_size)).collect();
        Self {
            key_size: suite.key_size,
            modes,
            ciphers,
        }
    }

    fn mode_of(&self, cipher: &CipherId) -> Option<Mode> {
        self.ciphers
            .iter()
            .position(|c| c == cipher)
            .map(|i| self.modes[i])
    }
}

impl Backend for RustCryptoBackend {
    type Context = RustCryptoContext;

    fn name(&self) -> &str {
        "RustCrypto"
    }

    fn ciphers(&self) -> &[CipherId] {
        &self.ciphers
    }

    fn init(&self) -> BackendResult<Self::Context> {
        Ok(RustCryptoContext {
            key: vec![0u8; self.key_size.bytes()],
            iv: [0u8; IV_SIZE],
            active: None,
        })
    }

    fn free(&self, ctx: Self::Context) -> BackendResult<()> {
        drop(ctx);
        Ok(())
    }

    fn random(&self, _ctx: &mut Self::Context, dst: &mut [u8]) -> BackendResult<()> {
        OsRng
            .try_fill_bytes(dst)
            .map_err(|e| BackendError::Random(e.to_string()))
    }

    fn set_cipher(&self, ctx: &mut Self::Context, cipher: &CipherId) -> BackendResult<()> {
        ctx.active = None;
        let mode = self
            .mode_of(cipher)
            .ok_or_else(|| BackendError::UnsupportedCipher(cipher.to_string()))?;

        let setup_error = |reason: String| BackendError::CipherSetup {
            cipher: cipher.to_string(),
            reason,
        };

        OsRng
            .try_fill_bytes(&mut ctx.key)
            .and_then(|()| OsRng.try_fill_bytes(&mut ctx.iv))
            .map_err(|e| setup_error(e.to_string()))?;

        let encryptor =
            build(self.key_size, mode, &ctx.key, &ctx.iv).map_err(|e| setup_error(e.to_string()))?;
        ctx.active = Some((cipher.clone(), encryptor));
        Ok(())
    }

    fn encrypt(&self, ctx: &mut Self::Context, dst: &mut [u8], src: &[u8]) -> BackendResult<usize> {
        let (_, encryptor) = ctx.active.as_mut().ok_or(BackendError::NoActiveCipher)?;
        encryptor.encrypt(dst, src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [KeySize; 3] = [KeySize::Aes128, KeySize::Aes192, KeySize::Aes256];

    fn backend(key_size: KeySize, family: CipherFamily) -> RustCryptoBackend {
        RustCryptoBackend::new(CipherSuite::new(key_size, family))
    }

    #[test]
    fn test_cipher_names() {
        let names: Vec<String> = backend(KeySize::Aes192, CipherFamily::Modes)
            .ciphers()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            names,
            [
                "AES-192/CTR",
                "AES-192/CBC",
                "AES-192/CFB",
                "AES-192/GCM",
                "AES-192/OCB",
                "AES-192/CCM"
            ]
        );

        let ecb = backend(KeySize::Aes256, CipherFamily::Ecb);
        assert_eq!(ecb.ciphers(), [CipherId::from("AES-256")]);
    }

    #[test]
    fn test_every_advertised_cipher_encrypts() {
        for key_size in SIZES {
            for family in [CipherFamily::Modes, CipherFamily::Ecb] {
                let backend = backend(key_size, family);
                let mut ctx = backend.init().unwrap();
                let mut src = vec![0u8; 256];
                backend.random(&mut ctx, &mut src).unwrap();

                for cipher in backend.ciphers() {
                    let mut dst = vec![0u8; 256];
                    backend.set_cipher(&mut ctx, cipher).unwrap();
                    assert_eq!(ctx.active_cipher(), Some(cipher));
                    assert_eq!(backend.encrypt(&mut ctx, &mut dst, &src).unwrap(), 256);
                    assert_ne!(dst, src, "{cipher} left the plaintext unchanged");
                }

                backend.free(ctx).unwrap();
            }
        }
    }

    #[test]
    fn test_unknown_cipher_rejected() {
        let backend = backend(KeySize::Aes128, CipherFamily::Modes);
        let mut ctx = backend.init().unwrap();
        let err = backend
            .set_cipher(&mut ctx, &CipherId::from("AES-256/CBC"))
            .unwrap_err();
        assert!(matches!(err, BackendError::UnsupportedCipher(_)));
        assert!(ctx.active_cipher().is_none());
    }

    #[test]
    fn test_encrypt_requires_active_cipher() {
        let backend = backend(KeySize::Aes128, CipherFamily::Modes);
        let mut ctx = backend.init().unwrap();
        let mut dst = [0u8; 32];
        let err = backend.encrypt(&mut ctx, &mut dst, &[1u8; 32]).unwrap_err();
        assert!(matches!(err, BackendError::NoActiveCipher));
    }

    #[test]
    fn test_block_modes_need_aligned_messages() {
        let backend = backend(KeySize::Aes128, CipherFamily::Modes);
        let mut ctx = backend.init().unwrap();
        let src = [7u8; 33];
        let mut dst = [0u8; 33];

        backend.set_cipher(&mut ctx, &CipherId::from("AES-128/CBC")).unwrap();
        let err = backend.encrypt(&mut ctx, &mut dst, &src).unwrap_err();
        assert!(matches!(err, BackendError::UnalignedMessage { size: 33, block: 16 }));

        backend.set_cipher(&mut ctx, &CipherId::from("AES-128/CTR")).unwrap();
        assert_eq!(backend.encrypt(&mut ctx, &mut dst, &src).unwrap(), 33);
    }

    #[test]
    fn test_stream_state_carries_between_calls() {
        let backend = backend(KeySize::Aes128, CipherFamily::Modes);
        let mut ctx = backend.init().unwrap();
        let src = [0u8; 64];
        let mut first = [0u8; 64];
        let mut second = [0u8; 64];

        backend.set_cipher(&mut ctx, &CipherId::from("AES-128/CTR")).unwrap();
        backend.encrypt(&mut ctx, &mut first, &src).unwrap();
        backend.encrypt(&mut ctx, &mut second, &src).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_ecb_is_deterministic_per_key() {
        let backend = backend(KeySize::Aes128, CipherFamily::Ecb);
        let mut ctx = backend.init().unwrap();
        let src = [9u8; 32];
        let mut first = [0u8; 32];
        let mut second = [0u8; 32];

        backend.set_cipher(&mut ctx, &CipherId::from("AES-128")).unwrap();
        backend.encrypt(&mut ctx, &mut first, &src).unwrap();
        backend.encrypt(&mut ctx, &mut second, &src).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[..16], first[16..]);
    }

    #[test]
    fn test_mismatched_buffers() {
        let backend = backend(KeySize::Aes256, CipherFamily::Modes);
        let mut ctx = backend.init().unwrap();
        backend.set_cipher(&mut ctx, &CipherId::from("AES-256/GCM")).unwrap();
        let mut dst = [0u8; 16];
        let err = backend.encrypt(&mut ctx, &mut dst, &[0u8; 32]).unwrap_err();
        assert!(matches!(err, BackendError::BufferMismatch { src: 32, dst: 16 }));
    }
}
