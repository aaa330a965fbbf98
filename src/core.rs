//! The Salsa20 core permutation.
//!
//! Everything in this module operates on the 16-word (64-byte) cipher state: Four words of
//! domain-separation constants, eight words of key material, two words of nonce and two words of
//! block counter. One application of [`block`] produces one 64-byte keystream block; [`hsalsa`]
//! is the feed-forward-free variant used to derive XSalsa20 subkeys.
//!
//! None of these functions branch or index on secret data: The amount of work performed is a
//! fixed function of the round count alone.

use crate::{SnuffleError, BLOCK_LENGTH, KEY_LENGTH, NONCE_LENGTH};

/// Number of 32-bit words in the cipher state.
pub(crate) const STATE_WORDS: usize = 16;

/// Domain-separation constants for 32-byte keys ("expand 32-byte k", little-endian).
pub(crate) const SIGMA: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// Domain-separation constants for 16-byte keys ("expand 16-byte k", little-endian).
pub(crate) const TAU: [u32; 4] = [0x6170_7865, 0x3120_646e, 0x7962_2d36, 0x6b20_6574];

/// Positions of the state words extracted as the HSalsa20 subkey.
const HSALSA_OUTPUT_WORDS: [usize; 8] = [0, 5, 10, 15, 6, 7, 8, 9];

/// The number of double-rounds applied by the permutation.
///
/// Salsa20/20 is the full-security variant, and the default everywhere a round count is not
/// explicitly specified. Salsa20/12 and Salsa20/8 trade security margin for speed; their output
/// is well-defined (and covered by test vectors), but their reduced margin should be understood
/// before use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rounds {
    /// Salsa20/8: 8 rounds (4 double-rounds), *not recommended*.
    R8,
    /// Salsa20/12: 12 rounds (6 double-rounds), *not recommended*.
    R12,
    /// Salsa20/20: 20 rounds (10 double-rounds), **recommended**.
    R20,
}

impl Rounds {
    /// Parse a round count supplied by a caller.
    ///
    /// `0` selects the default of 20 rounds. Any value other than 0, 8, 12 or 20 is a
    /// configuration error.
    pub fn from_count(count: usize) -> Result<Self, SnuffleError> {
        match count {
            0 | 20 => Ok(Rounds::R20),
            8 => Ok(Rounds::R8),
            12 => Ok(Rounds::R12),
            count => Err(SnuffleError::RoundsInvalid(count)),
        }
    }

    /// The number of rounds this variant applies.
    pub fn count(self) -> usize {
        match self {
            Rounds::R8 => 8,
            Rounds::R12 => 12,
            Rounds::R20 => 20,
        }
    }

    fn double_rounds(self) -> usize {
        self.count() / 2
    }
}

impl Default for Rounds {
    fn default() -> Self {
        Rounds::R20
    }
}

/// The Salsa20 quarter-round: The cipher's atomic mixing operation.
///
/// Mixes the four state words at positions `a`, `b`, `c`, `d` via wrapping 32-bit addition,
/// fixed-distance left rotation, and XOR. Wrapping on overflow is required behaviour, not an
/// error condition.
#[inline]
fn quarter_round(a: usize, b: usize, c: usize, d: usize, state: &mut [u32; STATE_WORDS]) {
    state[b] ^= state[a].wrapping_add(state[d]).rotate_left(7);
    state[c] ^= state[b].wrapping_add(state[a]).rotate_left(9);
    state[d] ^= state[c].wrapping_add(state[b]).rotate_left(13);
    state[a] ^= state[d].wrapping_add(state[c]).rotate_left(18);
}

/// One double-round: A column round followed by a diagonal round.
///
/// The index sets here come straight from the Salsa20 specification. Getting them wrong is a
/// silent correctness bug, not a crash: The output is covered by the reference vectors in
/// [`crate::stream`]'s tests.
#[inline]
fn double_round(state: &mut [u32; STATE_WORDS]) {
    // column round
    quarter_round(0, 4, 8, 12, state);
    quarter_round(5, 9, 13, 1, state);
    quarter_round(10, 14, 2, 6, state);
    quarter_round(15, 3, 7, 11, state);

    // diagonal round
    quarter_round(0, 1, 2, 3, state);
    quarter_round(5, 6, 7, 4, state);
    quarter_round(10, 11, 8, 9, state);
    quarter_round(15, 12, 13, 14, state);
}

fn permute(rounds: Rounds, state: &mut [u32; STATE_WORDS]) {
    for _ in 0..rounds.double_rounds() {
        double_round(state);
    }
}

/// Build the initial cipher state from an (expanded) key, basic nonce and constants.
///
/// The counter words (positions 8 and 9) are left at zero; [`set_counter`] updates them per
/// block.
pub(crate) fn init_state(
    key: &[u8; KEY_LENGTH],
    nonce: &[u8; NONCE_LENGTH],
    constants: &[u32; 4],
) -> [u32; STATE_WORDS] {
    let mut state = [0u32; STATE_WORDS];

    state[0] = constants[0];
    state[5] = constants[1];
    state[10] = constants[2];
    state[15] = constants[3];

    for (i, chunk) in key[..16].chunks_exact(4).enumerate() {
        state[1 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }

    for (i, chunk) in key[16..].chunks_exact(4).enumerate() {
        state[11 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }

    for (i, chunk) in nonce.chunks_exact(4).enumerate() {
        state[6 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }

    state
}

/// Set the 64-bit block counter (low word at position 8, high word at position 9).
#[inline]
pub(crate) fn set_counter(state: &mut [u32; STATE_WORDS], counter: u64) {
    state[8] = counter as u32;
    state[9] = (counter >> 32) as u32;
}

/// Run the permutation over `state` and serialize one keystream block into `keystream`.
///
/// After the configured rounds, the input state is added word-wise (wrapping) to the permuted
/// state: This feed-forward is what makes the block function one-way rather than an invertible
/// permutation. `state` itself is not modified.
pub(crate) fn block(
    rounds: Rounds,
    state: &[u32; STATE_WORDS],
    keystream: &mut [u8; BLOCK_LENGTH],
) {
    let mut working = *state;
    permute(rounds, &mut working);

    for ((word, input), chunk) in working
        .iter()
        .zip(state.iter())
        .zip(keystream.chunks_exact_mut(4))
    {
        chunk.copy_from_slice(&word.wrapping_add(*input).to_le_bytes());
    }
}

/// The HSalsa20 function: Derive a 32-byte subkey from a key and a 16-byte input.
///
/// Builds the state with the 16-byte input at the nonce/counter positions (words 6 through 9),
/// runs the permutation *without* the feed-forward addition, and extracts the words at positions
/// 0, 5, 10, 15, 6, 7, 8 and 9 as the subkey. Omitting the feed-forward is deliberate: It is
/// what makes HSalsa20 a pseudorandom function suitable for key derivation.
pub(crate) fn hsalsa(
    rounds: Rounds,
    key: &[u8; KEY_LENGTH],
    input: &[u8; 16],
    constants: &[u32; 4],
) -> [u8; KEY_LENGTH] {
    let mut state = init_state(key, &[0u8; NONCE_LENGTH], constants);

    for (i, chunk) in input.chunks_exact(4).enumerate() {
        state[6 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }

    permute(rounds, &mut state);

    let mut subkey = [0u8; KEY_LENGTH];
    for (position, chunk) in HSALSA_OUTPUT_WORDS
        .iter()
        .zip(subkey.chunks_exact_mut(4))
    {
        chunk.copy_from_slice(&state[*position].to_le_bytes());
    }

    subkey
}

#[cfg(test)]
mod tests {
    use super::{block, double_round, quarter_round, Rounds, SIGMA, STATE_WORDS, TAU};
    use crate::SnuffleError;

    // Example from section 3 of the Salsa20 specification.
    #[test]
    fn quarter_round_vectors() {
        let mut state = [0u32; STATE_WORDS];
        quarter_round(0, 1, 2, 3, &mut state);
        assert_eq!(&state[..4], &[0, 0, 0, 0]);

        let mut state = [0u32; STATE_WORDS];
        state[0] = 1;
        quarter_round(0, 1, 2, 3, &mut state);
        assert_eq!(&state[..4], &[0x0800_8145, 0x0000_0080, 0x0001_0200, 0x2050_0000]);
    }

    #[test]
    fn constants_spell_expansion_strings() {
        let sigma: Vec<u8> = SIGMA.iter().flat_map(|w| w.to_le_bytes()).collect();
        let tau: Vec<u8> = TAU.iter().flat_map(|w| w.to_le_bytes()).collect();
        assert_eq!(&sigma, b"expand 32-byte k");
        assert_eq!(&tau, b"expand 16-byte k");
    }

    #[test]
    fn round_count_parsing() {
        assert_eq!(Rounds::from_count(0), Ok(Rounds::R20));
        assert_eq!(Rounds::from_count(8), Ok(Rounds::R8));
        assert_eq!(Rounds::from_count(12), Ok(Rounds::R12));
        assert_eq!(Rounds::from_count(20), Ok(Rounds::R20));

        for count in [1, 7, 9, 13, 16, 21, 24] {
            assert_eq!(Rounds::from_count(count), Err(SnuffleError::RoundsInvalid(count)));
        }
    }

    #[test]
    fn double_round_changes_every_word() {
        let mut state = [0u32; STATE_WORDS];
        state[0] = 1;
        for _ in 0..2 {
            double_round(&mut state);
        }
        assert!(state.iter().all(|&word| word != 0));
    }

    #[test]
    fn block_applies_feed_forward() {
        // With a fixed input state, the block output must not equal the bare permutation of that
        // state serialized: The feed-forward addition must be present.
        let state = [0x0100_0000u32; STATE_WORDS];
        let mut keystream = [0u8; crate::BLOCK_LENGTH];
        block(Rounds::R20, &state, &mut keystream);

        let mut bare = state;
        super::permute(Rounds::R20, &mut bare);
        let first_word = u32::from_le_bytes([keystream[0], keystream[1], keystream[2], keystream[3]]);
        assert_eq!(first_word, bare[0].wrapping_add(state[0]));
        assert_ne!(first_word, bare[0]);
    }
}
