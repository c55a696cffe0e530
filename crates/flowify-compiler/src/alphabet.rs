//! Digit alphabet and fixed-width integer encoding.
//!
//! A width `v` is written as `PLACES` digit glyphs, least significant first,
//! one glyph per exponent. Negative values use the radix complement
//! `BASE^PLACES + v`, so adding a negative value rolls the sum over exactly
//! like fixed-width unsigned arithmetic.
//!
//! In a debugging build (base 10, four places) a glyph of width 553 encodes
//! as `_w.3e0 _w.5e1 _w.5e2 _w.0e3`: read it backwards to get `0553`.

use flowify_ir::GlyphSet;

use crate::error::{FlowError, FlowResult};

/// Boundary mark inserted before a run.
pub const START: &str = "_start";
/// Boundary mark inserted after a run.
pub const END: &str = "_end";
/// Start cap of a pill-shaped slug.
pub const SLUG_LEFT: &str = "slug.left";
/// End cap of a pill-shaped slug.
pub const SLUG_RIGHT: &str = "slug.right";

// ── Radix ────────────────────────────────────────────────────────────

/// A `(BASE, PLACES)` number system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Radix {
    base: u32,
    places: u32,
    modulus: i64,
}

impl Radix {
    pub fn new(base: u32, places: u32) -> FlowResult<Self> {
        if base < 2 {
            return Err(FlowError::Configuration(format!(
                "number base must be at least 2, got {}",
                base
            )));
        }
        if places < 1 {
            return Err(FlowError::Configuration("at least one digit place is required".into()));
        }
        let modulus = i64::from(base).checked_pow(places).ok_or_else(|| {
            FlowError::Configuration(format!("{}^{} does not fit in 64 bits", base, places))
        })?;
        Ok(Self {
            base,
            places,
            modulus,
        })
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn places(&self) -> u32 {
        self.places
    }

    /// `BASE^PLACES`.
    pub fn modulus(&self) -> i64 {
        self.modulus
    }

    /// Value of one unit at `exponent`.
    pub fn place_value(&self, exponent: u32) -> i64 {
        i64::from(self.base).pow(exponent)
    }

    /// Smallest value `encode` accepts: `-(BASE^PLACES)/2`.
    pub fn min_value(&self) -> i64 {
        -(self.modulus / 2)
    }

    /// Largest value `encode` accepts: `BASE^PLACES - 1`.
    pub fn max_value(&self) -> i64 {
        self.modulus - 1
    }

    /// Largest value that cannot collide with a complemented negative one.
    pub fn max_admissible(&self) -> i64 {
        self.modulus - self.modulus / 2 - 1
    }

    /// Widest single result glyph: the top digit at the top place.
    pub fn widest_digit(&self) -> i64 {
        i64::from(self.base - 1) * self.place_value(self.places - 1)
    }

    /// Encode `value` into `PLACES` digits, least significant first.
    ///
    /// Values outside `[min_value, max_value]` would silently wrap onto
    /// another encoding and are rejected instead.
    pub fn encode(&self, value: i64) -> FlowResult<EncodedValue> {
        if value < self.min_value() || value > self.max_value() {
            return Err(FlowError::OverflowRisk {
                value,
                min: self.min_value(),
                max: self.max_value(),
            });
        }
        let mut residue = value.rem_euclid(self.modulus);
        let base = i64::from(self.base);
        let mut digits = Vec::with_capacity(self.places as usize);
        for exponent in 0..self.places {
            digits.push(DigitGlyph {
                value: (residue % base) as u32,
                exponent,
            });
            residue /= base;
        }
        Ok(EncodedValue { digits })
    }

    /// Check that `value` encodes without aliasing: inside
    /// `[min_value, max_admissible]`, where the complement of a negative value
    /// can never equal the encoding of a positive one.
    pub fn check_admissible(&self, value: i64, what: &str) -> FlowResult<()> {
        if value < self.min_value() || value > self.max_admissible() {
            return Err(FlowError::Configuration(format!(
                "{} ({}) does not fit base {} with {} places (admissible range {}..={})",
                what,
                value,
                self.base,
                self.places,
                self.min_value(),
                self.max_admissible()
            )));
        }
        Ok(())
    }

    /// The residue an encoding stands for, in `[0, BASE^PLACES)`.
    pub fn decode(&self, encoded: &EncodedValue) -> i64 {
        encoded
            .digits
            .iter()
            .map(|d| i64::from(d.value) * self.place_value(d.exponent))
            .sum()
    }
}

// ── Digit Glyph ──────────────────────────────────────────────────────

/// One base-`BASE` digit at one exponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DigitGlyph {
    pub value: u32,
    pub exponent: u32,
}

impl DigitGlyph {
    pub fn new(value: u32, exponent: u32) -> Self {
        Self { value, exponent }
    }

    /// Zero-width working form, e.g. `_w.3e1`.
    pub fn intermediate_name(&self) -> String {
        intermediate_name(self.value, self.exponent)
    }

    /// Visible result form, e.g. `_W.3E1`.
    pub fn result_name(&self) -> String {
        self.intermediate_name().to_uppercase()
    }

    /// Invisible result form of the same width, e.g. `_W.3E1.blank`.
    pub fn blank_name(&self) -> String {
        format!("{}.blank", self.result_name())
    }

    /// Advance width of the result forms.
    pub fn width(&self, radix: &Radix) -> i64 {
        i64::from(self.value) * radix.place_value(self.exponent)
    }
}

fn intermediate_name(value: u32, exponent: u32) -> String {
    format!("_w.{}e{}", value, exponent)
}

/// Name of the carry mark telling `exponent` to add one.
pub fn carry_name(exponent: u32) -> String {
    format!("_carry.e{}", exponent)
}

// ── Encoded Value ────────────────────────────────────────────────────

/// Exactly `PLACES` digits, least significant first.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EncodedValue {
    digits: Vec<DigitGlyph>,
}

impl EncodedValue {
    pub fn digits(&self) -> &[DigitGlyph] {
        &self.digits
    }

    pub fn digit(&self, exponent: u32) -> Option<DigitGlyph> {
        self.digits.get(exponent as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// One singleton glyph set per digit, ready to splice into a rule.
    pub fn to_sets(&self) -> Vec<GlyphSet> {
        self.digits
            .iter()
            .map(|d| GlyphSet::single(d.intermediate_name()))
            .collect()
    }
}

// ── Alphabet ─────────────────────────────────────────────────────────

/// Every glyph class the compiler's routines are written against.
#[derive(Clone, Debug)]
pub struct Alphabet {
    radix: Radix,
    /// Intermediate digits per exponent, ordered by value.
    places: Vec<GlyphSet>,
    calculation: GlyphSet,
    carries: GlyphSet,
}

impl Alphabet {
    pub fn new(radix: Radix) -> Self {
        let mut places = Vec::with_capacity(radix.places() as usize);
        let mut calculation = GlyphSet::new();
        let mut carries = GlyphSet::new();
        for exponent in 0..radix.places() {
            let place: GlyphSet = (0..radix.base())
                .map(|value| intermediate_name(value, exponent))
                .collect();
            calculation.extend_from(&place);
            places.push(place);
            if exponent > 0 {
                carries.insert(carry_name(exponent));
            }
        }
        Self {
            radix,
            places,
            calculation,
            carries,
        }
    }

    pub fn radix(&self) -> &Radix {
        &self.radix
    }

    /// Every `(value, exponent)` digit, exponent-major.
    pub fn digits(&self) -> impl Iterator<Item = DigitGlyph> + '_ {
        (0..self.radix.places())
            .flat_map(move |e| (0..self.radix.base()).map(move |v| DigitGlyph::new(v, e)))
    }

    /// Intermediate digits at `exponent`.
    pub fn place(&self, exponent: u32) -> &GlyphSet {
        &self.places[exponent as usize]
    }

    /// Intermediate digit sets for every exponent, least significant first.
    pub fn places(&self) -> &[GlyphSet] {
        &self.places
    }

    pub fn digit(&self, value: u32, exponent: u32) -> String {
        intermediate_name(value, exponent)
    }

    /// Intermediate digits at `exponent` strictly greater than `value`.
    pub fn digits_above(&self, value: u32, exponent: u32) -> GlyphSet {
        (value + 1..self.radix.base())
            .map(|v| intermediate_name(v, exponent))
            .collect()
    }

    /// All intermediate digits.
    pub fn calculation_glyphs(&self) -> &GlyphSet {
        &self.calculation
    }

    /// Result forms, positionally aligned with `calculation_glyphs`.
    pub fn result_glyphs(&self) -> GlyphSet {
        self.calculation.map_names(|g| g.to_uppercase())
    }

    /// Blanked result forms, positionally aligned with `calculation_glyphs`.
    pub fn blank_glyphs(&self) -> GlyphSet {
        self.calculation
            .map_names(|g| format!("{}.blank", g.to_uppercase()))
    }

    /// Carry marks for exponents 1 and up.
    pub fn carries(&self) -> &GlyphSet {
        &self.carries
    }

    /// The carry into `exponent`, if that exponent can receive one.
    pub fn carry(&self, exponent: u32) -> Option<String> {
        (exponent > 0 && exponent < self.radix.places()).then(|| carry_name(exponent))
    }

    /// Encode `value` as singleton digit sets.
    pub fn encode(&self, value: i64) -> FlowResult<Vec<GlyphSet>> {
        Ok(self.radix.encode(value)?.to_sets())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debugging() -> Radix {
        Radix::new(10, 4).unwrap()
    }

    fn production() -> Radix {
        Radix::new(4, 7).unwrap()
    }

    #[test]
    fn encode_is_least_significant_first() {
        let encoded = debugging().encode(553).unwrap();
        let names: Vec<String> = encoded.digits().iter().map(|d| d.intermediate_name()).collect();
        assert_eq!(names, vec!["_w.3e0", "_w.5e1", "_w.5e2", "_w.0e3"]);
    }

    #[test]
    fn negative_values_use_radix_complement() {
        // -10 in four decimal places is 9990
        let encoded = debugging().encode(-10).unwrap();
        let values: Vec<u32> = encoded.digits().iter().map(|d| d.value).collect();
        assert_eq!(values, vec![0, 9, 9, 9]);
        assert_eq!(debugging().decode(&encoded), 9990);
    }

    #[test]
    fn encode_has_exactly_places_digits() {
        let radix = production();
        for v in [0, 1, 500, -500, radix.max_value(), radix.min_value()] {
            assert_eq!(radix.encode(v).unwrap().len(), 7);
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let radix = production();
        assert_eq!(radix.modulus(), 16384);
        assert!(matches!(
            radix.encode(16384),
            Err(FlowError::OverflowRisk { value: 16384, .. })
        ));
        assert!(radix.encode(-8193).is_err());
        assert!(radix.encode(-8192).is_ok());
    }

    #[test]
    fn admissible_window_excludes_aliasing_values() {
        let radix = production();
        assert_eq!(radix.max_admissible(), 8191);
        assert!(radix.check_admissible(8191, "width").is_ok());
        // 8192 encodes like -8192
        assert_eq!(radix.encode(8192).unwrap(), radix.encode(-8192).unwrap());
        let err = radix.check_admissible(8192, "width of 'W'").unwrap_err();
        assert!(matches!(err, FlowError::Configuration(ref m) if m.contains("width of 'W'")));
    }

    #[test]
    fn invalid_radix_is_a_configuration_error() {
        assert!(matches!(Radix::new(1, 4), Err(FlowError::Configuration(_))));
        assert!(matches!(Radix::new(4, 0), Err(FlowError::Configuration(_))));
        assert!(matches!(Radix::new(10, 40), Err(FlowError::Configuration(_))));
    }

    #[test]
    fn digit_glyph_names() {
        let d = DigitGlyph::new(3, 1);
        assert_eq!(d.intermediate_name(), "_w.3e1");
        assert_eq!(d.result_name(), "_W.3E1");
        assert_eq!(d.blank_name(), "_W.3E1.blank");
        assert_eq!(d.width(&production()), 12);
    }

    #[test]
    fn alphabet_sizes() {
        let alphabet = Alphabet::new(production());
        assert_eq!(alphabet.digits().count(), 28);
        assert_eq!(alphabet.calculation_glyphs().len(), 28);
        assert_eq!(alphabet.places().len(), 7);
        assert_eq!(alphabet.carries().len(), 6);
        assert_eq!(alphabet.carry(0), None);
        assert_eq!(alphabet.carry(6), Some("_carry.e6".into()));
        assert_eq!(alphabet.carry(7), None);
    }

    #[test]
    fn result_glyphs_align_with_calculation_glyphs() {
        let alphabet = Alphabet::new(Radix::new(2, 2).unwrap());
        assert_eq!(
            alphabet.calculation_glyphs().as_slice(),
            &["_w.0e0", "_w.1e0", "_w.0e1", "_w.1e1"]
        );
        assert_eq!(
            alphabet.result_glyphs().as_slice(),
            &["_W.0E0", "_W.1E0", "_W.0E1", "_W.1E1"]
        );
        assert_eq!(alphabet.blank_glyphs().get(3), Some("_W.1E1.blank"));
    }

    #[test]
    fn digits_above() {
        let alphabet = Alphabet::new(debugging());
        assert_eq!(alphabet.digits_above(7, 2).as_slice(), &["_w.8e2", "_w.9e2"]);
        assert!(alphabet.digits_above(9, 2).is_empty());
    }

    #[test]
    fn widest_digit_fits_production_ceiling() {
        assert_eq!(production().widest_digit(), 3 * 4096);
        assert_eq!(debugging().widest_digit(), 9000);
    }
}
