#![no_std]

#![cfg_attr(
    not(test),
    deny(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing,
        clippy::string_slice,
        clippy::arithmetic_side_effects,
        clippy::panicking_unwrap,
        clippy::out_of_bounds_indexing,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
    )
)]
#![cfg_attr(not(test), warn(clippy::missing_panics_doc))]

//! Extended (10, 6) Hamming code used to read instruction cards.
//!
//! A 6 bit data word is turned into a 10 bit systematic block
//! `[data | parity]` and one overall even parity bit is appended, giving
//! the 11 bit codeword printed on a card row. Decoding corrects any single
//! flipped bit and detects (without touching) double flips.
//!
//! `G` and `H` are derived once from [`SEED_GENERATOR`] when a
//! [`HammingCode`] is built and never change afterwards.

use core::iter::once;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

pub mod gf2;

pub use gf2::{Bit, Matrix};
use gf2::Gf2Error;

pub const DATA_BITS: usize = 6;
pub const PARITY_BITS: usize = 4;
pub const BLOCK_BITS: usize = DATA_BITS + PARITY_BITS;
pub const CODEWORD_BITS: usize = BLOCK_BITS + 1;

pub type SourceWord = [Bit; DATA_BITS];
pub type Block = [Bit; BLOCK_BITS];
pub type CodeWord = [Bit; CODEWORD_BITS];
pub type Syndrome = [Bit; PARITY_BITS];

/// Non systematic generator the card format was defined with.
pub const SEED_GENERATOR: Matrix<DATA_BITS, BLOCK_BITS> = [
    [1, 1, 1, 0, 0, 0, 0, 1, 0, 0],
    [0, 1, 0, 0, 1, 0, 0, 1, 0, 0],
    [1, 0, 0, 1, 0, 1, 0, 0, 0, 0],
    [0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
    [1, 1, 0, 1, 0, 0, 0, 1, 1, 0],
    [1, 0, 0, 1, 0, 0, 0, 1, 0, 1],
];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Codeword was consistent.
    Valid,
    /// A single flipped bit was repaired, or only the overall parity bit
    /// was wrong.
    Corrected,
    /// The error pattern can not be repaired safely. No data is returned.
    Uncorrectable,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected {expected} bits but got {found}")]
    Length { expected: usize, found: usize },
    #[error("bit {index} has value {value}, expected 0 or 1")]
    InvalidBit { index: usize, value: Bit },
    #[error("seed generator can not be made systematic: {0}")]
    Seed(#[from] Gf2Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HammingCode {
    generator: Matrix<DATA_BITS, BLOCK_BITS>,
    parity_check: Matrix<PARITY_BITS, BLOCK_BITS>,
}

impl HammingCode {
    pub fn new() -> Result<Self, CodecError> {
        Self::from_seed(&SEED_GENERATOR)
    }

    /// Builds the code from any 6x10 generator whose left 6x6 block is
    /// invertible. `G` is row reduced to `[I | P]`, `H` is `[Pᵗ | I]`.
    pub fn from_seed(seed: &Matrix<DATA_BITS, BLOCK_BITS>) -> Result<Self, CodecError> {
        let generator = gf2::to_systematic(*seed)?;
        let parity_check = derive_parity_check(&generator);
        Ok(Self {
            generator,
            parity_check,
        })
    }

    pub fn generator(&self) -> &Matrix<DATA_BITS, BLOCK_BITS> {
        &self.generator
    }

    pub fn parity_check(&self) -> &Matrix<PARITY_BITS, BLOCK_BITS> {
        &self.parity_check
    }

    /// `H · block`. All zero iff `block` is a codeword.
    pub fn syndrome(&self, block: &Block) -> Syndrome {
        gf2::mul_vec(&self.parity_check, block)
    }

    /// `source · G` followed by the overall parity bit, so the returned
    /// word always has an even number of set bits.
    pub fn encode(&self, source: &[Bit]) -> Result<CodeWord, CodecError> {
        let source: SourceWord = source.try_into().map_err(|_| CodecError::Length {
            expected: DATA_BITS,
            found: source.len(),
        })?;
        check_bits(&source)?;

        let block = gf2::vec_mul(&source, &self.generator);
        let parity = gf2::parity(&block);

        let mut codeword = [0; CODEWORD_BITS];
        for (cell, bit) in codeword.iter_mut().zip(block.iter().chain(once(&parity))) {
            *cell = *bit;
        }
        Ok(codeword)
    }

    /// SEC-DED decode of an 11 bit word.
    ///
    /// | syndrome | parity | result |
    /// |---|---|---|
    /// | zero | ok | `Valid` |
    /// | zero | wrong | `Corrected`, only the parity bit flipped |
    /// | non zero | wrong | `Corrected` if the syndrome matches a column of `H`, else `Uncorrectable` |
    /// | non zero | ok | `Uncorrectable`, double error |
    ///
    /// Malformed input (wrong length, cells other than 0/1) is
    /// `Uncorrectable`.
    pub fn decode(&self, encoded: &[Bit]) -> (Option<SourceWord>, DecodeStatus) {
        let (mut block, parity_bit) = match split_codeword(encoded) {
            Ok(parts) => parts,
            Err(err) => {
                warn!("rejecting codeword: {err}");
                return (None, DecodeStatus::Uncorrectable);
            }
        };

        let parity_error = gf2::parity(&block) != parity_bit;
        let syndrome = self.syndrome(&block);
        let syndrome_error = syndrome.iter().any(|bit| *bit != 0);

        let status = match (syndrome_error, parity_error) {
            (false, false) => DecodeStatus::Valid,
            (false, true) => {
                debug!("overall parity bit flipped, data intact");
                DecodeStatus::Corrected
            }
            (true, true) => {
                let Some(position) = self.error_position(&syndrome) else {
                    warn!("syndrome {syndrome:?} matches no column of H");
                    return (None, DecodeStatus::Uncorrectable);
                };
                if let Some(bit) = block.get_mut(position) {
                    *bit ^= 1;
                }
                debug!("corrected bit {position}");
                DecodeStatus::Corrected
            }
            (true, false) => {
                warn!("double bit error, syndrome {syndrome:?}");
                return (None, DecodeStatus::Uncorrectable);
            }
        };

        match block.first_chunk::<DATA_BITS>() {
            Some(data) => (Some(*data), status),
            None => (None, DecodeStatus::Uncorrectable),
        }
    }

    /// Index of the column of `H` equal to `syndrome`.
    fn error_position(&self, syndrome: &Syndrome) -> Option<usize> {
        (0..BLOCK_BITS).find(|&index| {
            gf2::column(&self.parity_check, index).as_ref() == Some(syndrome)
        })
    }
}

fn derive_parity_check(
    generator: &Matrix<DATA_BITS, BLOCK_BITS>,
) -> Matrix<PARITY_BITS, BLOCK_BITS> {
    let mut parity_block: Matrix<DATA_BITS, PARITY_BITS> = [[0; PARITY_BITS]; DATA_BITS];
    for (target, row) in parity_block.iter_mut().zip(generator) {
        for (cell, bit) in target.iter_mut().zip(row.iter().skip(DATA_BITS)) {
            *cell = *bit;
        }
    }

    let transposed = gf2::transpose(&parity_block);
    let identity = gf2::identity::<PARITY_BITS>();

    let mut parity_check = [[0; BLOCK_BITS]; PARITY_BITS];
    for ((target, left), right) in parity_check.iter_mut().zip(&transposed).zip(&identity) {
        for (cell, bit) in target.iter_mut().zip(left.iter().chain(right)) {
            *cell = *bit;
        }
    }
    parity_check
}

fn check_bits(bits: &[Bit]) -> Result<(), CodecError> {
    match bits.iter().enumerate().find(|(_, bit)| **bit > 1) {
        Some((index, value)) => Err(CodecError::InvalidBit {
            index,
            value: *value,
        }),
        None => Ok(()),
    }
}

fn split_codeword(encoded: &[Bit]) -> Result<(Block, Bit), CodecError> {
    let length_error = CodecError::Length {
        expected: CODEWORD_BITS,
        found: encoded.len(),
    };
    let codeword: &CodeWord = encoded.try_into().map_err(|_| length_error)?;
    check_bits(codeword)?;

    let Some((block, rest)) = codeword.split_first_chunk::<BLOCK_BITS>() else {
        return Err(length_error);
    };
    let Some(parity) = rest.first() else {
        return Err(length_error);
    };
    Ok((*block, *parity))
}

#[cfg(test)]
mod test;
