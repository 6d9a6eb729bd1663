//! Fixed size binary matrices over GF(2).
//!
//! Every cell holds `0` or `1`. Addition is XOR and multiplication is
//! AND, so there is never a carry. Shapes are const generics which keeps
//! all of the codec tables on the stack.

use thiserror_no_std::Error;

pub type Bit = u8;

/// `ROWS` x `COLS` binary matrix, row major.
pub type Matrix<const ROWS: usize, const COLS: usize> = [[Bit; COLS]; ROWS];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gf2Error {
    #[error("no pivot for column {0}, the left block is singular")]
    Singular(usize),
}

/// XOR reduction of all bits, `1` when an odd number of bits are set.
pub fn parity(bits: &[Bit]) -> Bit {
    bits.iter().fold(0, |acc, bit| acc ^ (bit & 1))
}

/// GF(2) dot product. Extra cells of the longer operand are ignored.
pub fn dot(lhs: &[Bit], rhs: &[Bit]) -> Bit {
    lhs.iter()
        .zip(rhs)
        .fold(0, |acc, (l, r)| acc ^ (l & r & 1))
}

/// `matrix · vector`, one dot product per row.
pub fn mul_vec<const ROWS: usize, const COLS: usize>(
    matrix: &Matrix<ROWS, COLS>,
    vector: &[Bit; COLS],
) -> [Bit; ROWS] {
    let mut out = [0; ROWS];
    for (cell, row) in out.iter_mut().zip(matrix) {
        *cell = dot(row, vector);
    }
    out
}

/// `vector · matrix`, one dot product per column.
pub fn vec_mul<const ROWS: usize, const COLS: usize>(
    vector: &[Bit; ROWS],
    matrix: &Matrix<ROWS, COLS>,
) -> [Bit; COLS] {
    mul_vec(&transpose(matrix), vector)
}

pub fn transpose<const ROWS: usize, const COLS: usize>(
    matrix: &Matrix<ROWS, COLS>,
) -> Matrix<COLS, ROWS> {
    let mut out = [[0; ROWS]; COLS];
    for (i, row) in matrix.iter().enumerate() {
        for (j, bit) in row.iter().enumerate() {
            if let Some(cell) = out.get_mut(j).and_then(|column| column.get_mut(i)) {
                *cell = *bit;
            }
        }
    }
    out
}

pub fn identity<const N: usize>() -> Matrix<N, N> {
    let mut out = [[0; N]; N];
    for (i, row) in out.iter_mut().enumerate() {
        if let Some(cell) = row.get_mut(i) {
            *cell = 1;
        }
    }
    out
}

/// Adds `source` into `target` row wise.
pub fn xor_into<const N: usize>(target: &mut [Bit; N], source: &[Bit; N]) {
    for (t, s) in target.iter_mut().zip(source) {
        *t ^= s;
    }
}

/// Column `index` of `matrix`, `None` past the last column.
pub fn column<const ROWS: usize, const COLS: usize>(
    matrix: &Matrix<ROWS, COLS>,
    index: usize,
) -> Option<[Bit; ROWS]> {
    if index >= COLS {
        return None;
    }
    let mut out = [0; ROWS];
    for (cell, row) in out.iter_mut().zip(matrix) {
        *cell = *row.get(index)?;
    }
    Some(out)
}

/// Gauss-Jordan elimination until the left `ROWS` x `ROWS` block is the
/// identity. Only row swaps and row XORs are used, so the row space (and
/// with it the code) is unchanged. The systematic form of a full rank
/// matrix is unique, whatever order the pivots are cleared in.
pub fn to_systematic<const ROWS: usize, const COLS: usize>(
    mut matrix: Matrix<ROWS, COLS>,
) -> Result<Matrix<ROWS, COLS>, Gf2Error> {
    for pivot in 0..ROWS {
        let Some(source) = (pivot..ROWS).find(|&row| bit_at(&matrix, row, pivot) == Some(1))
        else {
            return Err(Gf2Error::Singular(pivot));
        };
        matrix.swap(pivot, source);

        let Some(pivot_row) = matrix.get(pivot).copied() else {
            return Err(Gf2Error::Singular(pivot));
        };
        for (index, row) in matrix.iter_mut().enumerate() {
            if index != pivot && row.get(pivot) == Some(&1) {
                xor_into(row, &pivot_row);
            }
        }
    }
    Ok(matrix)
}

fn bit_at<const ROWS: usize, const COLS: usize>(
    matrix: &Matrix<ROWS, COLS>,
    row: usize,
    col: usize,
) -> Option<Bit> {
    matrix.get(row).and_then(|r| r.get(col)).copied()
}
