//! Exact decimal values for NUMERIC(p, s) columns
//!
//! A [`FixedPoint`] stores an unscaled `i128` together with its precision (total
//! significant digits) and scale (digits after the decimal point). Rounding is
//! always half away from zero.

use crate::core::{DatabaseError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Largest precision an `i128` can always hold
pub const MAX_PRECISION: u32 = 38;

/// Exact decimal with a fixed precision and scale
#[derive(Debug, Clone, Copy)]
pub struct FixedPoint {
    value: i128,
    precision: u32,
    scale: u32,
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

fn digit_count(value: i128) -> u32 {
    let mut abs = value.unsigned_abs();
    let mut digits = 0;
    while abs > 0 {
        abs /= 10;
        digits += 1;
    }
    digits
}

/// Integer division rounding half away from zero
fn div_round(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.unsigned_abs() * 2 >= denominator.unsigned_abs() {
        quotient + numerator.signum() * denominator.signum()
    } else {
        quotient
    }
}

impl FixedPoint {
    /// Create a value from its unscaled integer
    ///
    /// `FixedPoint::new(1225, 5, 2)` is `12.25`.
    pub fn new(value: i128, precision: u32, scale: u32) -> Result<Self> {
        let fp = Self {
            value,
            precision,
            scale,
        };
        fp.check_fits()?;
        Ok(fp)
    }

    fn overflow(&self, precision: u32, scale: u32) -> DatabaseError {
        DatabaseError::NumericOverflow {
            value: self.to_string(),
            precision,
            scale,
        }
    }

    fn check_fits(&self) -> Result<()> {
        if self.precision == 0 || self.precision > MAX_PRECISION || self.scale > self.precision {
            return Err(self.overflow(self.precision, self.scale));
        }
        match pow10(self.precision) {
            Some(limit) if self.value.unsigned_abs() < limit.unsigned_abs() => Ok(()),
            _ => Err(self.overflow(self.precision, self.scale)),
        }
    }

    /// Parse decimal text, inferring precision and scale from the digits
    ///
    /// `"123.456"` has precision 6 and scale 3.
    pub fn parse(text: &str) -> Result<Self> {
        let fail = |message: &str| DatabaseError::decode("NUMERIC", text, message);
        let trimmed = text.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(fail("no digits"));
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(fail("expected [-]digits[.digits]"));
        }

        let significant = int_part.trim_start_matches('0');
        let scale = frac_part.len() as u32;
        let precision = (significant.len() as u32 + scale).max(1);
        if precision > MAX_PRECISION {
            return Err(fail("too many digits"));
        }

        let digits = format!("{}{}", int_part, frac_part);
        let magnitude = digits
            .parse::<i128>()
            .map_err(|e| fail(&e.to_string()))?;
        let value = if negative { -magnitude } else { magnitude };

        Ok(Self {
            value,
            precision,
            scale,
        })
    }

    /// Parse decimal text into the given precision and scale, rounding extra digits
    pub fn parse_with(text: &str, precision: u32, scale: u32) -> Result<Self> {
        Self::parse(text)?.change_precision_and_scale(precision, scale)
    }

    /// Round a float into the given precision and scale
    pub fn from_f64(value: f64, precision: u32, scale: u32) -> Result<Self> {
        if !value.is_finite() {
            return Err(DatabaseError::decode(
                "NUMERIC",
                &value.to_string(),
                "not a finite number",
            ));
        }
        let factor = 10f64.powi(scale as i32);
        let scaled = (value * factor).round();
        if scaled.abs() >= 1e38 {
            return Err(DatabaseError::NumericOverflow {
                value: value.to_string(),
                precision,
                scale,
            });
        }
        Self::new(scaled as i128, precision, scale)
    }

    /// Integer with scale 0
    pub fn from_i64(value: i64) -> Self {
        let value = value as i128;
        Self {
            value,
            precision: digit_count(value).max(1),
            scale: 0,
        }
    }

    /// Total significant digits
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Digits after the decimal point
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// The unscaled integer
    pub fn unscaled(&self) -> i128 {
        self.value
    }

    /// Nearest float
    pub fn to_f64(&self) -> f64 {
        self.value as f64 / 10f64.powi(self.scale as i32)
    }

    /// Text with every scale digit, as stored by the server (`12.50`)
    pub fn to_sql_string(&self) -> String {
        let abs = self.value.unsigned_abs();
        let sign = if self.value < 0 { "-" } else { "" };
        if self.scale == 0 {
            return format!("{}{}", sign, abs);
        }
        let factor = 10u128.pow(self.scale);
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / factor,
            abs % factor,
            width = self.scale as usize
        )
    }

    fn rescaled(&self, scale: u32) -> Option<i128> {
        match scale.cmp(&self.scale) {
            Ordering::Equal => Some(self.value),
            Ordering::Greater => self.value.checked_mul(pow10(scale - self.scale)?),
            Ordering::Less => Some(div_round(self.value, pow10(self.scale - scale)?)),
        }
    }

    /// Convert to another precision and scale
    ///
    /// Fails with `NumericOverflow` when the value needs more than `precision` digits.
    pub fn change_precision_and_scale(&self, precision: u32, scale: u32) -> Result<Self> {
        let value = self
            .rescaled(scale)
            .ok_or_else(|| self.overflow(precision, scale))?;
        let converted = Self {
            value,
            precision,
            scale,
        };
        converted
            .check_fits()
            .map_err(|_| self.overflow(precision, scale))?;
        Ok(converted)
    }

    fn with_value(value: i128, precision: u32, scale: u32) -> Self {
        let precision = precision
            .max(digit_count(value))
            .max(scale)
            .clamp(1, MAX_PRECISION);
        Self {
            value,
            precision,
            scale,
        }
    }

    /// Sum at the larger of both scales, `None` on overflow
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let scale = self.scale.max(other.scale);
        let value = self.rescaled(scale)?.checked_add(other.rescaled(scale)?)?;
        let int_digits = (self.precision - self.scale).max(other.precision - other.scale);
        Some(Self::with_value(value, int_digits + scale, scale))
    }

    /// Difference at the larger of both scales, `None` on overflow
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        self.checked_add(&-*other)
    }

    /// Product keeping this value's scale, `None` on overflow
    pub fn checked_mul(&self, other: &Self) -> Option<Self> {
        let product = self.value.checked_mul(other.value)?;
        let value = div_round(product, pow10(other.scale)?);
        Some(Self::with_value(value, self.precision, self.scale))
    }

    /// Quotient keeping this value's scale, `None` on overflow or division by zero
    pub fn checked_div(&self, other: &Self) -> Option<Self> {
        if other.value == 0 {
            return None;
        }
        let numerator = self.value.checked_mul(pow10(other.scale)?)?;
        let value = div_round(numerator, other.value);
        Some(Self::with_value(value, self.precision, self.scale))
    }

    /// Quotient keeping this value's scale, checked against `precision`
    pub fn divide(&self, other: &Self, precision: u32) -> Result<Self> {
        let quotient = self.checked_div(other).ok_or_else(|| {
            DatabaseError::other(format!("cannot divide {} by {}", self, other))
        })?;
        quotient.change_precision_and_scale(precision, self.scale)
    }

    fn compare(&self, other: &Self) -> Option<Ordering> {
        let scale = self.scale.max(other.scale);
        Some(self.rescaled(scale)?.cmp(&other.rescaled(scale)?))
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_sql_string();
        if self.scale == 0 {
            return f.write_str(&text);
        }
        f.write_str(text.trim_end_matches('0').trim_end_matches('.'))
    }
}

impl PartialEq for FixedPoint {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for FixedPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl PartialEq<f64> for FixedPoint {
    fn eq(&self, other: &f64) -> bool {
        match FixedPoint::from_f64(*other, MAX_PRECISION, self.scale) {
            Ok(rounded) => rounded.to_f64() == *other && rounded == *self,
            Err(_) => false,
        }
    }
}

impl Neg for FixedPoint {
    type Output = FixedPoint;

    fn neg(self) -> Self::Output {
        Self {
            value: -self.value,
            ..self
        }
    }
}

impl Add for FixedPoint {
    type Output = FixedPoint;

    /// # Panics
    /// Panics on overflow, like integer addition.
    fn add(self, rhs: Self) -> Self::Output {
        match self.checked_add(&rhs) {
            Some(sum) => sum,
            None => panic!("FixedPoint addition overflowed"),
        }
    }
}

impl Sub for FixedPoint {
    type Output = FixedPoint;

    /// # Panics
    /// Panics on overflow, like integer subtraction.
    fn sub(self, rhs: Self) -> Self::Output {
        match self.checked_sub(&rhs) {
            Some(difference) => difference,
            None => panic!("FixedPoint subtraction overflowed"),
        }
    }
}

impl Mul for FixedPoint {
    type Output = FixedPoint;

    /// # Panics
    /// Panics on overflow, like integer multiplication.
    fn mul(self, rhs: Self) -> Self::Output {
        match self.checked_mul(&rhs) {
            Some(product) => product,
            None => panic!("FixedPoint multiplication overflowed"),
        }
    }
}

impl Mul<f64> for FixedPoint {
    type Output = FixedPoint;

    /// # Panics
    /// Panics when the product is not finite or does not fit an `i128`.
    fn mul(self, rhs: f64) -> Self::Output {
        let product = (self.value as f64 * rhs).round();
        if !product.is_finite() || product.abs() >= 1e38 {
            panic!("FixedPoint multiplication overflowed");
        }
        Self::with_value(product as i128, self.precision, self.scale)
    }
}

impl Div for FixedPoint {
    type Output = FixedPoint;

    /// # Panics
    /// Panics on division by zero or overflow, like integer division.
    fn div(self, rhs: Self) -> Self::Output {
        match self.checked_div(&rhs) {
            Some(quotient) => quotient,
            None => panic!("FixedPoint division by zero or overflow"),
        }
    }
}
