use serde::Serialize;
use std::fmt;

/// Exact fraction used for calibrated physical quantities.
///
/// Not reduced to lowest terms: `10000/100` stays `10000/100`. Equality
/// compares by cross-multiplication, so `10000/100 == 100/1`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

impl Rational {
    /// Returns `None` for a zero denominator.
    pub fn new(numerator: i64, denominator: i64) -> Option<Self> {
        if denominator == 0 {
            None
        } else {
            Some(Rational {
                numerator,
                denominator,
            })
        }
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Structural equality: same numerator and same denominator.
    pub fn is_identical(&self, other: &Rational) -> bool {
        self.numerator == other.numerator && self.denominator == other.denominator
    }
}

impl PartialEq for Rational {
    fn eq(&self, other: &Self) -> bool {
        (self.numerator as i128) * (other.denominator as i128)
            == (other.numerator as i128) * (self.denominator as i128)
    }
}

impl Eq for Rational {}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_is_rejected() {
        assert!(Rational::new(1, 0).is_none());
    }

    #[test]
    fn equality_cross_multiplies() {
        let a = Rational::new(10000, 100).unwrap();
        let b = Rational::new(100, 1).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_identical(&b));
        assert_eq!(a.to_string(), "10000/100");
    }

    #[test]
    fn equality_does_not_overflow() {
        let a = Rational::new(i64::MAX, 2).unwrap();
        let b = Rational::new(i64::MAX, 2).unwrap();
        assert_eq!(a, b);
    }
}
