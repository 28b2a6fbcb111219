//! Seed texts for new games.
//! A seed is ten characters over the base64 alphabet, e.g. `q3Zx+0aP/B`.

use rand::Rng;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Characters in a generated seed.
pub const SEED_LEN: usize = 10;

/// Deterministic core of [`generate_seed_text`]: six bits of entropy per character.
#[must_use]
pub fn seed_text_from_entropy(entropy: u64) -> String {
    (0..SEED_LEN)
        .map(|i| {
            let index = (entropy >> (i * 6)) & 0x3F;
            char::from(ALPHABET[index as usize])
        })
        .collect()
}

/// Fresh seed from the thread-local entropy source.
#[must_use]
pub fn generate_seed_text() -> String {
    seed_text_from_entropy(rand::thread_rng().r#gen())
}
