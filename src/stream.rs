//! The Salsa20 & XSalsa20 stream cipher API.
//!
//! Stream ciphers are a low-level building block of many modern cryptosystems. Essentially, a
//! stream cipher just generates an arbitrary amount of pseudorandom data based on a key and a
//! nonce, which is then combined with the plaintext via an XOR operation to produce ciphertext.
//!
//! Every function in this module accepts either an 8-byte nonce (basic Salsa20) or a 24-byte
//! nonce (XSalsa20): Passing a 24-byte nonce derives a fresh session key via the
//! [`hsalsa20`] pseudorandom function from the key and the first 16 nonce bytes, and runs
//! Salsa20 under that derived key with the trailing 8 nonce bytes. Any other nonce length is a
//! configuration error.
//!
//! # Message Segmentation
//! Keystream blocks are not preserved between calls: Two calls with the same key and nonce each
//! start the block counter at zero and regenerate identical keystream from the start. Both sides
//! of a channel must therefore segment messages identically, or use [`encrypt_ic`]/[`decrypt_ic`]
//! to continue a keystream across calls by passing the block counter explicitly (one block covers
//! [`BLOCK_LENGTH`] bytes).
//!
//! # Truncation
//! The `encrypt`/`decrypt` functions write `min(message.len(), output.len())` bytes and return
//! the number written: If the output buffer is shorter than the message, the excess message bytes
//! are silently ignored. This is a documented contract, not an error condition.
//!
//! # Security Considerations
//! This is an *unauthenticated* stream cipher, which is not suited to general use: There is no
//! way to detect if an attacker has modified the ciphertext. Use it only as part of a wider
//! authenticated protocol.
//!
//! Nonces must *never* be used more than once with the same key. For XSalsa20 (24-byte nonces),
//! random nonces are safe; for the basic 8-byte nonce, use a message counter (see
//! [`increment_nonce`]).

use crate::core::{self, Rounds, SIGMA, TAU};
use crate::{
    util, SnuffleError, BLOCK_LENGTH, KEY_LENGTH, NONCE_LENGTH, SHORT_KEY_LENGTH, XNONCE_LENGTH,
};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// The length of the input to [`hsalsa20`], in bytes.
///
/// Generally this is the first half of a 24-byte XSalsa20 nonce.
pub const HSALSA_INPUT_LENGTH: usize = 16;

/// The length of custom constants for [`hsalsa20`], in bytes.
pub const HSALSA_CONSTANTS_LENGTH: usize = 16;

/// The length of the output of [`hsalsa20`], in bytes.
pub const HSALSA_OUTPUT_LENGTH: usize = 32;

/// A basic Salsa20 nonce.
///
/// Nonces must never be used for multiple messages with the same key. At this size, random
/// generation is not safe: Use a counter.
pub type Nonce = [u8; NONCE_LENGTH];

/// An extended (XSalsa20) nonce, long enough to be generated randomly for every message.
pub type XNonce = [u8; XNONCE_LENGTH];

/// The input to [`hsalsa20`], generally the first 16 bytes of an [`XNonce`].
pub type HSalsaInput = [u8; HSALSA_INPUT_LENGTH];

/// Custom domain-separation constants for [`hsalsa20`].
pub type HSalsaConstants = [u8; HSALSA_CONSTANTS_LENGTH];

/// A secret key for this stream cipher.
///
/// There are no *technical* constraints on the contents of a key, but it should be
/// indistinguishable from random noise. A random key can be securely generated via
/// [`Key::generate`].
///
/// A secret key must not be made public. The key material is zeroed on drop, in such a way that
/// the compiler will not optimise away the operation.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key([u8; KEY_LENGTH]);

impl Key {
    /// The length of a key, in bytes.
    pub const LENGTH: usize = KEY_LENGTH;

    /// Generate a new, random key for use with this stream cipher.
    ///
    /// Any cryptographically secure RNG can be supplied, e.g: `rand::rngs::OsRng`.
    pub fn generate(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        let mut key = [0u8; KEY_LENGTH];
        rng.fill_bytes(&mut key);
        Self(key)
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = SnuffleError;

    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        let key: [u8; KEY_LENGTH] = buf
            .try_into()
            .map_err(|_| SnuffleError::IncorrectSliceLength(KEY_LENGTH, buf.len()))?;
        Ok(Self(key))
    }
}

impl From<[u8; KEY_LENGTH]> for Key {
    fn from(buf: [u8; KEY_LENGTH]) -> Self {
        Self(buf)
    }
}

impl AsRef<[u8; KEY_LENGTH]> for Key {
    fn as_ref(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key([u8; 32])")
    }
}

/// Treat `nonce` as a little-endian unsigned integer, and increment it by one.
///
/// This is useful for ensuring a different nonce is used for every message: Increment the nonce
/// for every message sent. Runs in constant time for a given nonce length.
pub fn increment_nonce(nonce: &mut [u8]) {
    util::increment_le(nonce);
}

/// Encrypt `message` using the provided [`Key`], writing the result to `output`.
///
/// `nonce` must be either 8 bytes (basic Salsa20) or 24 bytes (XSalsa20); any other length is a
/// configuration error. Nonces must *never* be used more than once with the same key: See the
/// [module documentation](self#security-considerations).
///
/// Writes `min(message.len(), output.len())` bytes of ciphertext to `output`, and returns the
/// number of bytes written. A shorter output buffer is not an error: The excess message bytes
/// are ignored (see [Truncation](self#truncation)).
pub fn encrypt(
    message: &[u8],
    key: &Key,
    nonce: &[u8],
    output: &mut [u8],
) -> Result<usize, SnuffleError> {
    encrypt_ic(message, 0, key, nonce, output)
}

/// Decrypt `ciphertext` using the provided [`Key`], writing the plaintext to `output`.
///
/// `key` and `nonce` should be the key and nonce used to encrypt the ciphertext. Writes
/// `min(ciphertext.len(), output.len())` bytes and returns the number written.
pub fn decrypt(
    ciphertext: &[u8],
    key: &Key,
    nonce: &[u8],
    output: &mut [u8],
) -> Result<usize, SnuffleError> {
    // Encryption and decryption are the same operation
    encrypt(ciphertext, key, nonce, output)
}

/// Encrypt `message`, customising the initial value of the block counter.
///
/// `ic` is the starting value of the 64-bit block counter, rather than zero. This allows direct
/// access to any block of the keystream without first computing all previous blocks, and allows a
/// keystream to be continued across calls: Encrypting a message in two segments gives the same
/// result as one call if the second segment passes `ic` equal to the number of whole 64-byte
/// blocks consumed by the first (which must therefore be a multiple of [`BLOCK_LENGTH`] long).
///
/// Otherwise identical to [`encrypt`].
pub fn encrypt_ic(
    message: &[u8],
    ic: u64,
    key: &Key,
    nonce: &[u8],
    output: &mut [u8],
) -> Result<usize, SnuffleError> {
    xor_into(message, ic, key.as_ref(), nonce, SIGMA, Rounds::R20, output)
}

/// Decrypt `ciphertext`, customising the initial value of the block counter.
///
/// See [`encrypt_ic`].
pub fn decrypt_ic(
    ciphertext: &[u8],
    ic: u64,
    key: &Key,
    nonce: &[u8],
    output: &mut [u8],
) -> Result<usize, SnuffleError> {
    // Encryption and decryption are the same operation
    encrypt_ic(ciphertext, ic, key, nonce, output)
}

/// Encrypt `buf` in place using the provided [`Key`].
///
/// This is the in-place counterpart of [`encrypt`]: The plaintext in `buf` is replaced with
/// ciphertext of the same length. Sharing one buffer between plaintext and ciphertext is the only
/// form of overlap this API supports; partially overlapping buffers cannot be expressed.
pub fn encrypt_in_place(buf: &mut [u8], key: &Key, nonce: &[u8]) -> Result<(), SnuffleError> {
    let (mut subkey, subnonce, constants) = resolve(key.as_ref(), nonce, SIGMA, Rounds::R20)?;
    xor_key_stream_in_place(buf, &subnonce, &subkey, &constants, Rounds::R20, 0);
    subkey.zeroize();
    Ok(())
}

/// Decrypt `buf` in place using the provided [`Key`].
///
/// See [`encrypt_in_place`].
pub fn decrypt_in_place(buf: &mut [u8], key: &Key, nonce: &[u8]) -> Result<(), SnuffleError> {
    // Encryption and decryption are the same operation
    encrypt_in_place(buf, key, nonce)
}

/// Derive the keystream for the given [`Key`] and nonce, filling `output`.
///
/// This function fills `output` with the raw keystream for the key & nonce: It is equivalent to
/// encrypting a message of all zeroes. The standard concerns about nonce reuse apply: Do not
/// reuse nonces with the same key if the keystream is to be used to encrypt messages, and treat
/// the keystream itself as sensitive in that case.
pub fn keystream(key: &Key, nonce: &[u8], output: &mut [u8]) -> Result<(), SnuffleError> {
    let (mut subkey, subnonce, constants) = resolve(key.as_ref(), nonce, SIGMA, Rounds::R20)?;
    output.fill(0);
    xor_key_stream_in_place(output, &subnonce, &subkey, &constants, Rounds::R20, 0);
    subkey.zeroize();
    Ok(())
}

/// Encrypt `message` with a configurable round count and key length.
///
/// `rounds` must be 8, 12 or 20; a value of 0 selects the default of 20. `key` must be either 32
/// bytes, or 16 bytes, in which case it is expanded by duplication into both halves of the cipher
/// state with a distinct constant set (so a 16-byte key is *not* equivalent to the 32-byte key
/// formed by repeating it). Any other round count or key length is a configuration error.
///
/// The reduced-round variants Salsa20/12 and Salsa20/8 trade security margin for speed, and are
/// *not recommended* unless compatibility with an existing system requires them.
///
/// Otherwise identical to [`encrypt`], including the nonce-length and truncation contracts.
pub fn encrypt_with_rounds(
    message: &[u8],
    key: &[u8],
    nonce: &[u8],
    rounds: usize,
    output: &mut [u8],
) -> Result<usize, SnuffleError> {
    let rounds = Rounds::from_count(rounds)?;
    let (mut expanded, constants) = expand_key(key)?;
    let result = xor_into(message, 0, &expanded, nonce, constants, rounds, output);
    expanded.zeroize();
    result
}

/// Decrypt `ciphertext` with a configurable round count and key length.
///
/// See [`encrypt_with_rounds`].
pub fn decrypt_with_rounds(
    ciphertext: &[u8],
    key: &[u8],
    nonce: &[u8],
    rounds: usize,
    output: &mut [u8],
) -> Result<usize, SnuffleError> {
    // Encryption and decryption are the same operation
    encrypt_with_rounds(ciphertext, key, nonce, rounds, output)
}

/// The raw HSalsa20 function.
///
/// This is the HSalsa20 function detailed in section 2 of the paper [*Extending the Salsa20
/// nonce*](https://cr.yp.to/snuffle/xsalsa-20081128.pdf). HSalsa20 is a key component in the
/// definition of XSalsa20: The key and first 16 bytes of the 24-byte nonce are used as input for
/// HSalsa20, which outputs a 32-byte value. This value is then used as the key for the Salsa20
/// cipher, with the final 8 bytes of the XSalsa20 nonce as the Salsa20 nonce.
///
/// `constants` can be used to specify custom constants: These are the sigma values from the
/// original Salsa20 definition, defaulting to the ASCII representation of `expand 32-byte k`.
/// There is generally no reason to change them.
///
/// # Security Considerations
/// This is a very low-level function, and generally does not need to be used directly.
///
/// The output of this function is the key which will be used for Salsa20 as part of XSalsa20's
/// encryption calculation, so it should be treated as sensitive data. The [`HSalsaInput`] should
/// never be used more than once with the same key.
pub fn hsalsa20(
    key: &Key,
    input: &HSalsaInput,
    constants: Option<&HSalsaConstants>,
) -> [u8; HSALSA_OUTPUT_LENGTH] {
    let constants = match constants {
        Some(bytes) => constant_words(bytes),
        None => SIGMA,
    };

    core::hsalsa(Rounds::R20, key.as_ref(), input, &constants)
}

/// Interpret a 16-byte constant string as four little-endian state words.
fn constant_words(bytes: &[u8; HSALSA_CONSTANTS_LENGTH]) -> [u32; 4] {
    let mut words = [0u32; 4];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    words
}

/// Expand a caller-supplied key slice to 32 bytes, selecting the matching constant set.
///
/// This is the single key-length validation path for the rounds-configurable entry points: 32-byte
/// keys are used as-is with the "expand 32-byte k" constants, 16-byte keys are duplicated into
/// both halves with the "expand 16-byte k" constants.
fn expand_key(key: &[u8]) -> Result<([u8; KEY_LENGTH], [u32; 4]), SnuffleError> {
    match key.len() {
        KEY_LENGTH => {
            let mut expanded = [0u8; KEY_LENGTH];
            expanded.copy_from_slice(key);
            Ok((expanded, SIGMA))
        }
        SHORT_KEY_LENGTH => {
            let mut expanded = [0u8; KEY_LENGTH];
            expanded[..SHORT_KEY_LENGTH].copy_from_slice(key);
            expanded[SHORT_KEY_LENGTH..].copy_from_slice(key);
            Ok((expanded, TAU))
        }
        length => Err(SnuffleError::KeyLengthInvalid(length)),
    }
}

/// Resolve a (key, nonce) pair to the effective key, 8-byte nonce and constants for the
/// keystream generator.
///
/// An 8-byte nonce passes the key through unchanged. A 24-byte nonce derives a subkey via
/// HSalsa20 from the first 16 nonce bytes; derived subkeys are always full 256-bit keys, so the
/// generator then runs with the "expand 32-byte k" constants regardless of how the original key
/// was expanded. The caller is responsible for zeroizing the returned key material.
fn resolve(
    key: &[u8; KEY_LENGTH],
    nonce: &[u8],
    constants: [u32; 4],
    rounds: Rounds,
) -> Result<([u8; KEY_LENGTH], Nonce, [u32; 4]), SnuffleError> {
    match nonce.len() {
        NONCE_LENGTH => {
            let mut subnonce = [0u8; NONCE_LENGTH];
            subnonce.copy_from_slice(nonce);
            Ok((*key, subnonce, constants))
        }
        XNONCE_LENGTH => {
            let mut input = [0u8; HSALSA_INPUT_LENGTH];
            input.copy_from_slice(&nonce[..HSALSA_INPUT_LENGTH]);
            let subkey = core::hsalsa(rounds, key, &input, &constants);
            let mut subnonce = [0u8; NONCE_LENGTH];
            subnonce.copy_from_slice(&nonce[HSALSA_INPUT_LENGTH..]);
            Ok((subkey, subnonce, SIGMA))
        }
        length => Err(SnuffleError::NonceLengthInvalid(length)),
    }
}

/// Copy `message` into `output` (truncating to the shorter of the two) and XOR the keystream over
/// it. Validation happens before any byte of `output` is written.
fn xor_into(
    message: &[u8],
    ic: u64,
    key: &[u8; KEY_LENGTH],
    nonce: &[u8],
    constants: [u32; 4],
    rounds: Rounds,
    output: &mut [u8],
) -> Result<usize, SnuffleError> {
    let (mut subkey, subnonce, constants) = resolve(key, nonce, constants, rounds)?;

    let length = message.len().min(output.len());
    output[..length].copy_from_slice(&message[..length]);
    xor_key_stream_in_place(&mut output[..length], &subnonce, &subkey, &constants, rounds, ic);

    subkey.zeroize();
    Ok(length)
}

/// The keystream generator: XOR the Salsa20 keystream over `buf`, one 64-byte block at a time.
///
/// The final block is truncated to however many bytes remain. The block counter starts at `ic`
/// and increments once per block; no state survives this call.
fn xor_key_stream_in_place(
    buf: &mut [u8],
    nonce: &Nonce,
    key: &[u8; KEY_LENGTH],
    constants: &[u32; 4],
    rounds: Rounds,
    ic: u64,
) {
    let mut state = core::init_state(key, nonce, constants);
    let mut keystream = [0u8; BLOCK_LENGTH];
    let mut counter = ic;

    for chunk in buf.chunks_mut(BLOCK_LENGTH) {
        core::set_counter(&mut state, counter);
        core::block(rounds, &state, &mut keystream);

        for (byte, mask) in chunk.iter_mut().zip(keystream.iter()) {
            *byte ^= mask;
        }

        counter = counter.wrapping_add(1);
    }

    state.zeroize();
    keystream.zeroize();
}
