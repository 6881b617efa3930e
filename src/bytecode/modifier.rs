//! Modifier word packing (spec.md §3, §6, §8 law 7).
//!
//! `public`, `private`, `protected`, `static`, `final`, `abstract`,
//! `native`, `synchronized`, `default`, `volatile`, `transient` map to a
//! stable bit order in a 32-bit mask. `from_words` and `words` are inverse
//! on the recognized set — presence survives the round trip, insertion
//! order does not.

use std::fmt;

pub const MODIFIER_ORDER: [&str; 11] = [
    "public",
    "private",
    "protected",
    "static",
    "final",
    "abstract",
    "native",
    "synchronized",
    "default",
    "volatile",
    "transient",
];

const STATIC_BIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    pub fn empty() -> Modifiers {
        Modifiers(0)
    }

    /// Packs a list of modifier words into a mask. Fails on the first word
    /// outside the recognized set.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Result<Modifiers, String> {
        let mut mask = 0u32;
        for word in words {
            let word = word.as_ref();
            let bit = MODIFIER_ORDER
                .iter()
                .position(|candidate| *candidate == word)
                .ok_or_else(|| word.to_string())?;
            mask |= 1 << bit;
        }
        Ok(Modifiers(mask))
    }

    /// Unpacks the mask back into its recognized words, in canonical
    /// (`MODIFIER_ORDER`) order.
    pub fn words(&self) -> Vec<String> {
        MODIFIER_ORDER
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.0 & (1 << bit) != 0)
            .map(|(_, word)| word.to_string())
            .collect()
    }

    pub fn contains(&self, word: &str) -> bool {
        match MODIFIER_ORDER.iter().position(|candidate| *candidate == word) {
            Some(bit) => self.0 & (1 << bit) != 0,
            None => false,
        }
    }

    pub fn is_static(&self) -> bool {
        self.0 & (1 << STATIC_BIT) != 0
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words().join(" "))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn modifier_packing_bijection() {
        let words = vec!["public".to_string(), "static".to_string(), "final".to_string()];
        let packed = Modifiers::from_words(&words).unwrap();
        let mut unpacked = packed.words();
        let mut expected = words.clone();
        unpacked.sort();
        expected.sort();
        assert_eq!(unpacked, expected);
    }

    #[test]
    fn unknown_word_is_rejected() {
        assert!(Modifiers::from_words(&["public", "frobnicate"]).is_err());
    }

    #[test]
    fn static_bit_drives_nested_separator() {
        let with_static = Modifiers::from_words(&["static"]).unwrap();
        let without = Modifiers::empty();
        assert!(with_static.is_static());
        assert!(!without.is_static());
    }
}
