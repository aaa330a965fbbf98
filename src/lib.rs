//! Pure Rust implementation of the [Salsa20](https://cr.yp.to/snuffle/spec.pdf) stream cipher,
//! and of [XSalsa20](https://cr.yp.to/snuffle/xsalsa-20081128.pdf), the variant with an eXtended
//! (24-byte) nonce.
//!
//! A stream cipher generates an arbitrary amount of pseudorandom data (the keystream) from a key
//! and a nonce. The keystream is combined with the plaintext via an XOR operation to produce
//! ciphertext, and with the ciphertext to recover the plaintext: Encryption and decryption are
//! the same operation.
//!
//! Salsa20 is message-oriented rather than byte-oriented: Keystream blocks are not preserved
//! between calls, so each side of a channel must encrypt/decrypt data with the same segmentation
//! (or manage the block counter explicitly, see
//! [`stream::encrypt_ic`](crate::stream::encrypt_ic)).
//!
//! The cipher functions are exposed in the [`stream`] module, and are re-exported at the crate
//! root. Simply passing a 24-byte nonce rather than an 8-byte nonce selects XSalsa20.
//!
//! # Which Nonce Length Should I Use?
//! For XSalsa20 (24-byte nonces), the nonce size is sufficient that a random nonce can be
//! generated for every message, and the possibility of nonce reuse is negligible. With the basic
//! 8-byte Salsa20 nonce, random generation is *not* safe: Use a counter, incremented for every
//! message sent ([`stream::increment_nonce`] may help here). Unless you have a specific
//! compatibility requirement, prefer the 24-byte nonce.
//!
//! # Security Considerations
//! This crate exposes *unauthenticated* stream ciphers, low-level constructions which are not
//! suited to general use. There is no way to detect if an attacker has modified the ciphertext,
//! and no protection against nonce reuse: A nonce must *never* be used more than once with the
//! same key, as encrypting two messages with the same (key, nonce) pair leads to trivial
//! plaintext recovery.
//!
//! # Example
//! ```rust
//! use snuffle::{decrypt, encrypt, Key, XNONCE_LENGTH};
//! use rand::RngCore;
//!
//! let key = Key::generate(&mut rand::rngs::OsRng);
//!
//! // XSalsa20 nonces are long enough to be chosen randomly per message
//! let mut nonce = [0u8; XNONCE_LENGTH];
//! rand::rngs::OsRng.fill_bytes(&mut nonce);
//!
//! let message = b"Encrypt and decrypt are the same operation";
//! let mut ciphertext = [0u8; 42];
//! encrypt(message, &key, &nonce, &mut ciphertext)?;
//!
//! let mut plaintext = [0u8; 42];
//! decrypt(&ciphertext, &key, &nonce, &mut plaintext)?;
//! assert_eq!(&plaintext, message);
//! # Ok::<(), snuffle::SnuffleError>(())
//! ```

#![warn(missing_docs, rust_2018_idioms, trivial_casts, unused_qualifications)]
#![forbid(unsafe_code)]

use thiserror::Error;

mod core;
pub mod stream;
pub mod util;

pub use crate::core::Rounds;
pub use crate::stream::{
    decrypt, decrypt_ic, decrypt_in_place, decrypt_with_rounds, encrypt, encrypt_ic,
    encrypt_in_place, encrypt_with_rounds, hsalsa20, keystream, Key, Nonce, XNonce,
};

/// The length of a key, in bytes.
pub const KEY_LENGTH: usize = 32;

/// The length of a short key accepted by the rounds-configurable functions, in bytes.
///
/// A short key is expanded to [`KEY_LENGTH`] bytes by duplicating it into both halves of the
/// cipher state, with a distinct set of domain-separation constants.
pub const SHORT_KEY_LENGTH: usize = 16;

/// The length of a basic Salsa20 nonce, in bytes.
pub const NONCE_LENGTH: usize = 8;

/// The length of an extended (XSalsa20) nonce, in bytes.
pub const XNONCE_LENGTH: usize = 24;

/// The length of one keystream block, in bytes.
pub const BLOCK_LENGTH: usize = 64;

/// General error type used in snuffle.
///
/// Every variant here represents a configuration error: Invalid arguments which cannot succeed on
/// retry. Validation is performed before any output is written, so an `Err` return guarantees the
/// output buffer was not touched.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum SnuffleError {
    /// The supplied nonce is neither [`NONCE_LENGTH`] (basic Salsa20) nor [`XNONCE_LENGTH`]
    /// (XSalsa20) bytes long.
    ///
    /// The contained value is the length which was actually supplied.
    #[error("nonce must be 8 or 24 bytes, found {0}")]
    NonceLengthInvalid(usize),

    /// The supplied key is neither [`KEY_LENGTH`] nor [`SHORT_KEY_LENGTH`] bytes long.
    ///
    /// The contained value is the length which was actually supplied.
    #[error("key must be 32 or 16 bytes, found {0}")]
    KeyLengthInvalid(usize),

    /// The supplied round count is not one of 8, 12 or 20 (or 0, meaning the default of 20).
    ///
    /// The contained value is the round count which was actually supplied.
    #[error("rounds must be 8, 12 or 20, found {0}")]
    RoundsInvalid(usize),

    /// Tried to create a [`Key`] from an incorrectly sized slice.
    ///
    /// The 0th item is the expected length, the 1st item is the actual length of the slice.
    #[error("incorrect slice length: expected {0}, found {1}")]
    IncorrectSliceLength(usize, usize),
}
