//! AES-256 ECB over coalesced payloads.
//!
//! Payloads are zero-padded to the block size and encrypted block by block
//! with a key baked into the build. The placeholder key (thirty-two `x`
//! bytes) means "no encryption": blobs are written plain and without the
//! magic prefix.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;

pub const AES_BLOCK_SIZE: usize = 16;

/// The placeholder key shipped in unencrypted builds.
pub const SENTINEL_KEY: [u8; 32] = *b"xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

/// The build's coalesced-file key. Games replace this at build time.
pub const COALESCED_KEY: [u8; 32] = SENTINEL_KEY;

/// Whether `key` is a real key rather than the placeholder.
pub fn encryption_enabled(key: &[u8; 32]) -> bool {
    *key != SENTINEL_KEY
}

/// Zero-pad `data` up to a multiple of the block size.
pub fn pad_to_block(data: &mut Vec<u8>) {
    let remainder = data.len() % AES_BLOCK_SIZE;
    if remainder != 0 {
        data.resize(data.len() + AES_BLOCK_SIZE - remainder, 0);
    }
}

/// Encrypt `data` in place. The length must be a multiple of the block size.
pub fn encrypt(data: &mut [u8], key: &[u8; 32]) {
    debug_assert_eq!(data.len() % AES_BLOCK_SIZE, 0);
    let cipher = Aes256::new(GenericArray::from_slice(key));
    for chunk in data.chunks_exact_mut(AES_BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
    }
}

/// Decrypt `data` in place. The length must be a multiple of the block size.
pub fn decrypt(data: &mut [u8], key: &[u8; 32]) {
    debug_assert_eq!(data.len() % AES_BLOCK_SIZE, 0);
    let cipher = Aes256::new(GenericArray::from_slice(key));
    for chunk in data.chunks_exact_mut(AES_BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
    }
}
