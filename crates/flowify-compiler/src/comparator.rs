//! Magnitude comparison by pattern matching.
//!
//! The engine cannot compare numbers, only match patterns, so "is the
//! total bigger than `H`" becomes a disjunction of digit patterns. With a
//! threshold of `1 2 3 4` (most significant first) the bigger patterns are:
//!
//! ```text
//!   [2-9]  any    any    any
//!   1      [3-9]  any    any
//!   1      2      [4-9]  any
//!   1      2      3      [5-9]
//! ```
//!
//! A pivot whose threshold digit is already `BASE - 1` has no bigger digit,
//! so its pattern is dropped.

use flowify_ir::GlyphSet;

use crate::alphabet::{Alphabet, EncodedValue};
use crate::error::FlowResult;

/// Patterns recognising totals strictly greater than a threshold.
#[derive(Debug, Clone)]
pub struct Comparator {
    threshold: i64,
    encoded: EncodedValue,
    /// Each pattern holds one set per place, least significant first.
    patterns: Vec<Vec<GlyphSet>>,
}

impl Comparator {
    pub fn new(alphabet: &Alphabet, threshold: i64) -> FlowResult<Self> {
        let encoded = alphabet.radix().encode(threshold)?;
        let places = alphabet.radix().places();
        let mut patterns = Vec::with_capacity(places as usize);

        for pivot in (0..places).rev() {
            let mut pattern = Vec::with_capacity(places as usize);
            for place in (0..places).rev() {
                let digit = encoded.digits()[place as usize];
                let set = if place > pivot {
                    GlyphSet::single(digit.intermediate_name())
                } else if place == pivot {
                    alphabet.digits_above(digit.value, place)
                } else {
                    alphabet.place(place).clone()
                };
                pattern.push(set);
            }
            if pattern.iter().all(|set| !set.is_empty()) {
                pattern.reverse();
                patterns.push(pattern);
            }
        }

        Ok(Self {
            threshold,
            encoded,
            patterns,
        })
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    pub fn encoded_threshold(&self) -> &EncodedValue {
        &self.encoded
    }

    /// Patterns ordered from the most significant pivot down.
    pub fn patterns(&self) -> &[Vec<GlyphSet>] {
        &self.patterns
    }

    /// Whether a total, given as intermediate digit names least significant
    /// first, matches any pattern.
    ///
    /// Digits are read as an unsigned residue modulo `BASE^PLACES`. A total
    /// driven below zero by kerning lands in the upper half of the range and
    /// is therefore bigger than any admissible threshold.
    pub fn is_bigger(&self, digits: &[String]) -> bool {
        self.patterns.iter().any(|pattern| {
            pattern.len() == digits.len()
                && pattern.iter().zip(digits).all(|(set, glyph)| set.contains(glyph))
        })
    }
}
