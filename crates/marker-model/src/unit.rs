//! Decimal-scaled units for labeling and time-delta arithmetic.
//!
//! A unit is a symbol plus a power-of-ten exponent: `ms` is `("s", -3)`,
//! `ns` is `("s", -9)`. Values are stored in the unit they were recorded in;
//! the exponent is applied only when a value has to be expressed in the base
//! unit (for example when dividing by a time delta).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A measurement unit with a decimal exponent relative to its base symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Power of ten relative to the base unit.
    pub base_exponent: i32,
    /// Base unit symbol (e.g., "s", "m").
    pub symbol: String,
}

impl Unit {
    pub fn new(symbol: impl Into<String>, base_exponent: i32) -> Self {
        Self {
            base_exponent,
            symbol: symbol.into(),
        }
    }

    pub fn seconds() -> Self {
        Self::new("s", 0)
    }

    pub fn milliseconds() -> Self {
        Self::new("s", -3)
    }

    pub fn nanoseconds() -> Self {
        Self::new("s", -9)
    }

    /// Multiplier that converts a value in this unit to the base unit.
    pub fn scale_factor(&self) -> f64 {
        10f64.powi(self.base_exponent)
    }

    /// Express `value` (in this unit) in the base unit.
    pub fn to_base(&self, value: f64) -> f64 {
        value * self.scale_factor()
    }

    /// Express `value` (in the base unit) in this unit.
    pub fn from_base(&self, value: f64) -> f64 {
        value / self.scale_factor()
    }

    /// Combine an additional magnitude into this unit.
    ///
    /// `Unit::milliseconds().scaled(-3)` is microseconds.
    pub fn scaled(&self, exponent: i32) -> Self {
        Self::new(self.symbol.clone(), self.base_exponent + exponent)
    }

    /// SI prefix for the exponent, if one exists.
    pub fn prefix(&self) -> Option<&'static str> {
        match self.base_exponent {
            -12 => Some("p"),
            -9 => Some("n"),
            -6 => Some("µ"),
            -3 => Some("m"),
            -2 => Some("c"),
            0 => Some(""),
            3 => Some("k"),
            6 => Some("M"),
            9 => Some("G"),
            _ => None,
        }
    }

    /// Display label, e.g. `ms`, or `10^-4 s` when no prefix exists.
    pub fn label(&self) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}{}", self.symbol),
            None => format!("10^{} {}", self.base_exponent, self.symbol),
        }
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::seconds()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factor() {
        assert_eq!(Unit::seconds().scale_factor(), 1.0);
        assert!((Unit::milliseconds().scale_factor() - 1e-3).abs() < 1e-15);
        assert!((Unit::nanoseconds().to_base(1_500_000_000.0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_from_base_inverts_to_base() {
        let unit = Unit::milliseconds();
        assert!((unit.from_base(unit.to_base(250.0)) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Unit::seconds().label(), "s");
        assert_eq!(Unit::milliseconds().label(), "ms");
        assert_eq!(Unit::new("m", -2).label(), "cm");
        assert_eq!(Unit::new("s", -4).label(), "10^-4 s");
        assert_eq!(Unit::nanoseconds().to_string(), "ns");
    }

    #[test]
    fn test_scaled_combines_exponents() {
        let micro = Unit::milliseconds().scaled(-3);
        assert_eq!(micro.base_exponent, -6);
        assert_eq!(micro.label(), "µs");
    }
}
