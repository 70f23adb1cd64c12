//! Two-word naming prefix shared by every bot of one fleet load.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

/// Words the prefix is drawn from. Must never be empty.
pub const WORD_LIST: &[&str] = &[
    "amber", "arctic", "autumn", "bold", "brave", "bright", "calm", "cedar", "clever", "cobalt",
    "coral", "cosmic", "crimson", "crystal", "dancing", "dawn", "desert", "dusty", "eager",
    "ember", "fancy", "fern", "fierce", "frosty", "gentle", "gilded", "golden", "granite",
    "happy", "hazel", "hidden", "hollow", "humble", "icy", "ivory", "jade", "jolly", "lively",
    "lucky", "lunar", "maple", "marble", "meadow", "mellow", "misty", "mossy", "noble", "ocean",
    "olive", "onyx", "pebble", "pine", "polar", "proud", "quiet", "rapid", "raven", "rustic",
    "sage", "scarlet", "shadow", "silent", "silver", "sleepy", "solar", "spruce", "stormy",
    "sunny", "swift", "tidal", "timber", "twilight", "velvet", "violet", "wandering", "willow",
    "windy", "winter", "wise", "zesty",
];

/// Draw two words from [`WORD_LIST`] with replacement and join them with a space.
pub fn generate_prefix<R: Rng + ?Sized>(rng: &mut R) -> String {
    // WORD_LIST is a non-empty constant, so choose() always yields a word.
    let first = WORD_LIST.choose(rng).copied().unwrap_or("fleet");
    let second = WORD_LIST.choose(rng).copied().unwrap_or("fleet");
    let prefix = format!("{} {}", first, second);
    info!("🏷️  Generated prefix: {}", prefix);
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_prefix_is_two_known_words() {
        let mut rng = StdRng::seed_from_u64(7);
        let prefix = generate_prefix(&mut rng);

        let words: Vec<&str> = prefix.split(' ').collect();
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|w| WORD_LIST.contains(w)));
    }

    #[test]
    fn test_prefix_is_deterministic_for_seed() {
        let a = generate_prefix(&mut StdRng::seed_from_u64(42));
        let b = generate_prefix(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_word_list_has_no_spaces() {
        assert!(!WORD_LIST.is_empty());
        assert!(WORD_LIST.iter().all(|w| !w.contains(' ') && !w.is_empty()));
    }
}
