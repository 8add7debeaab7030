//! Request parsing
//!
//! The wire format is the original interactive one: whitespace-separated
//! integers `H M v1 .. vM`, where `H` is the tree height, `M` the array
//! length, and `v1..vM` the array itself. Tokens beyond the declared `M`
//! values are ignored.

use std::io::BufRead;

use thiserror::Error;

/// A parsed reduction request: the requested height and the input array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionRequest {
    /// Requested tree height (validated later by `ReduceConfig`).
    pub height: u32,

    /// The integers to sum.
    pub values: Vec<i64>,
}

/// Errors produced while parsing a reduction request.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The stream ended before the expected token.
    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof {
        /// What the next token should have been.
        expected: &'static str,
    },

    /// A token could not be parsed as the expected integer.
    #[error("invalid {what} '{token}' at token {position}")]
    InvalidToken {
        /// What the token should have been.
        what: &'static str,
        /// The offending token text.
        token: String,
        /// 1-based position of the token in the stream.
        position: usize,
    },

    /// The underlying reader failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReductionRequest {
    /// Parse a request from a buffered reader.
    pub fn from_reader(mut reader: impl BufRead) -> Result<Self, ParseError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        let mut tokens = text.split_whitespace().enumerate();

        let height: u32 = next_int(&mut tokens, "tree height")?;
        let count: usize = next_int(&mut tokens, "array length")?;

        let mut values: Vec<i64> = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(next_int(&mut tokens, "array element")?);
        }

        Ok(Self { height, values })
    }
}

fn next_int<'a, I, T>(tokens: &mut I, expected: &'static str) -> Result<T, ParseError>
where
    I: Iterator<Item = (usize, &'a str)>,
    T: std::str::FromStr,
{
    let (pos, token) = tokens
        .next()
        .ok_or(ParseError::UnexpectedEof { expected })?;
    token.parse().map_err(|_| ParseError::InvalidToken {
        what: expected,
        token: token.to_owned(),
        position: pos + 1,
    })
}
