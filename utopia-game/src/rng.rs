//! Seeded dice.
//!
//! The generator never lives inside the aggregate. The aggregate stores an
//! exported [`RngState`] and every draw imports it, draws, and exports it back,
//! so a serialized game resumes with exactly the same future dice.
use hmac::{Hmac, Mac};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::constants::DIE_FACES;

const DICE_DOMAIN: &[u8] = b"utopia.dice";

/// Serializable position of a dice stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RngState {
    pub seed: [u8; 32],
    pub stream: u64,
    #[serde(with = "serde_u128_string")]
    pub word_pos: u128,
}

/// Deterministic dice source keyed by a seed text.
#[derive(Debug, Clone)]
pub struct DiceRng {
    rng: ChaCha20Rng,
}

impl DiceRng {
    #[must_use]
    pub fn from_seed_text(seed: &str) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(derive_stream_seed(seed, DICE_DOMAIN)),
        }
    }

    /// Rebuild a generator positioned exactly where `state` was exported.
    #[must_use]
    pub fn import(state: &RngState) -> Self {
        let mut rng = ChaCha20Rng::from_seed(state.seed);
        rng.set_stream(state.stream);
        rng.set_word_pos(state.word_pos);
        Self { rng }
    }

    #[must_use]
    pub fn export(&self) -> RngState {
        RngState {
            seed: self.rng.get_seed(),
            stream: self.rng.get_stream(),
            word_pos: self.rng.get_word_pos(),
        }
    }

    /// Uniform draw in `lo..=hi`.
    pub fn draw_in_range(&mut self, lo: u8, hi: u8) -> u8 {
        let value = self.rng.gen_range(lo..=hi);
        log::trace!("drew {value} in {lo}..={hi}");
        value
    }

    pub fn roll_die(&mut self) -> u8 {
        self.draw_in_range(1, DIE_FACES)
    }
}

fn derive_stream_seed(seed: &str, domain_tag: &[u8]) -> [u8; 32] {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(seed.as_bytes()).expect("HMAC accepts any key length");
    mac.update(domain_tag);
    mac.finalize().into_bytes().into()
}

mod serde_u128_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Number(number) => Ok(u128::from(number)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_text_gives_same_dice() {
        let mut a = DiceRng::from_seed_text("testing");
        let mut b = DiceRng::from_seed_text("testing");
        let left: Vec<u8> = (0..32).map(|_| a.roll_die()).collect();
        let right: Vec<u8> = (0..32).map(|_| b.roll_die()).collect();
        assert_eq!(left, right);
        assert!(left.iter().all(|d| (1..=6).contains(d)));
    }

    #[test]
    fn different_seed_texts_diverge() {
        let mut a = DiceRng::from_seed_text("testing");
        let mut b = DiceRng::from_seed_text("testing2");
        let left: Vec<u8> = (0..32).map(|_| a.roll_die()).collect();
        let right: Vec<u8> = (0..32).map(|_| b.roll_die()).collect();
        assert_ne!(left, right);
    }

    #[test]
    fn export_import_resumes_the_stream() {
        let mut original = DiceRng::from_seed_text("resume");
        for _ in 0..7 {
            original.roll_die();
        }
        let state = original.export();
        let mut resumed = DiceRng::import(&state);
        for _ in 0..20 {
            assert_eq!(original.roll_die(), resumed.roll_die());
        }
    }

    #[test]
    fn state_serializes_word_pos_as_text() {
        let mut rng = DiceRng::from_seed_text("json");
        rng.roll_die();
        let state = rng.export();
        let json = serde_json::to_value(state).unwrap();
        assert!(json["word_pos"].is_string());
        let back: RngState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);

        let mut numeric = serde_json::to_value(state).unwrap();
        numeric["word_pos"] = serde_json::json!(0);
        let back: RngState = serde_json::from_value(numeric).unwrap();
        assert_eq!(back.word_pos, 0);
    }

    #[test]
    fn draws_stay_in_range() {
        let mut rng = DiceRng::from_seed_text("range");
        for _ in 0..200 {
            let v = rng.draw_in_range(2, 4);
            assert!((2..=4).contains(&v));
        }
        assert_eq!(rng.draw_in_range(3, 3), 3);
    }
}
