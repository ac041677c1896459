//! Helpers for materialising number lexemes collected from
//! [`JsonHandler::on_number()`](crate::JsonHandler::on_number()).
//!
//! The parser hands out number lexemes as raw byte slices; these functions
//! convert a complete lexeme (the concatenation of all slices delivered
//! for one number) into a Rust value.

use std::num::ParseFloatError;
use std::str::{from_utf8, Utf8Error};

use btoi::ParseIntegerError;
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, FromPrimitive, Zero};
use thiserror::Error;

/// An error that can happen when parsing a number lexeme to an integer
#[derive(Error, Debug)]
#[error("invalid integer: {0}")]
pub struct InvalidIntError(#[from] ParseIntegerError);

/// An error that can happen when parsing a number lexeme to a float
#[derive(Error, Debug)]
pub enum InvalidFloatError {
    #[error("number lexeme is not valid UTF-8: {0}")]
    Utf8(#[from] Utf8Error),

    #[error("unable to parse number lexeme to float: {0}")]
    Float(#[from] ParseFloatError),
}

/// Parse a complete number lexeme into an integer.
///
/// Fails if the lexeme contains a fraction or exponent, or if the value
/// does not fit into `I`.
///
/// ```
/// let n: i64 = pushjson::number::parse_int(b"-42").unwrap();
/// assert_eq!(n, -42);
/// ```
pub fn parse_int<I>(lexeme: &[u8]) -> Result<I, InvalidIntError>
where
    I: FromPrimitive + Zero + CheckedAdd + CheckedSub + CheckedMul,
{
    Ok(btoi::btoi(lexeme)?)
}

/// Parse a complete number lexeme into a float.
///
/// ```
/// let f = pushjson::number::parse_float(b"2.5e3").unwrap();
/// assert_eq!(f, 2500.0);
/// ```
pub fn parse_float(lexeme: &[u8]) -> Result<f64, InvalidFloatError> {
    Ok(from_utf8(lexeme)?.parse()?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn int_values() {
        assert_eq!(parse_int::<i32>(b"0").unwrap(), 0);
        assert_eq!(parse_int::<i32>(b"123").unwrap(), 123);
        assert_eq!(parse_int::<i64>(b"-9007199254740993").unwrap(), -9007199254740993);
    }

    #[test]
    fn int_overflow_is_an_error() {
        assert!(parse_int::<i32>(b"2147483648").is_err());
        assert!(parse_int::<i64>(b"1.5").is_err());
    }

    #[test]
    fn float_values() {
        assert_eq!(parse_float(b"0.5").unwrap(), 0.5);
        assert_eq!(parse_float(b"-1e-2").unwrap(), -0.01);
        assert_eq!(parse_float(b"123").unwrap(), 123.0);
    }
}
