use core::fmt;

use serde::{Deserialize, Serialize};

use crate::Bit;

pub const BYTE_BITS: usize = 8;

/// Symbols a character word can leave on the stack.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Space,
}

impl Symbol {
    pub fn name(&self) -> &'static str {
        match self {
            Symbol::A => "A",
            Symbol::B => "B",
            Symbol::C => "C",
            Symbol::D => "D",
            Symbol::E => "E",
            Symbol::F => "F",
            Symbol::G => "G",
            Symbol::H => "H",
            Symbol::I => "I",
            Symbol::J => "J",
            Symbol::K => "K",
            Symbol::L => "L",
            Symbol::M => "M",
            Symbol::N => "N",
            Symbol::O => "O",
            Symbol::P => "P",
            Symbol::Q => "Q",
            Symbol::R => "R",
            Symbol::S => "S",
            Symbol::T => "T",
            Symbol::U => "U",
            Symbol::V => "V",
            Symbol::W => "W",
            Symbol::X => "X",
            Symbol::Y => "Y",
            Symbol::Z => "Z",
            Symbol::Space => "SPACE",
        }
    }

    /// How the symbol reads when spoken.
    pub fn text(&self) -> &'static str {
        match self {
            Symbol::Space => " ",
            other => other.name(),
        }
    }

    fn hex_digit(&self) -> Option<u8> {
        match self {
            Symbol::A => Some(10),
            Symbol::B => Some(11),
            Symbol::C => Some(12),
            Symbol::D => Some(13),
            Symbol::E => Some(14),
            Symbol::F => Some(15),
            _ => None,
        }
    }
}

/// One stack slot.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Byte(u8),
    Symbol(Symbol),
}

impl Value {
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Value::Byte(byte) => Some(*byte),
            Value::Symbol(_) => None,
        }
    }

    /// Value of a single hexadecimal digit: a byte 0-9 or a symbol A-F.
    pub fn hex_digit(&self) -> Option<u8> {
        match self {
            Value::Byte(byte @ 0..=9) => Some(*byte),
            Value::Byte(_) => None,
            Value::Symbol(symbol) => symbol.hex_digit(),
        }
    }
}

/// Bytes speak as their decimal digits, symbols as their letter.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(byte) => write!(f, "{byte}"),
            Value::Symbol(symbol) => f.write_str(symbol.text()),
        }
    }
}

/// What `peek` reports about the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Top {
    Empty,
    /// Most significant bit first.
    Byte([Bit; BYTE_BITS]),
    Symbol(&'static str),
}

impl Top {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None => Top::Empty,
            Some(Value::Byte(byte)) => Top::Byte(byte_bits(*byte)),
            Some(Value::Symbol(symbol)) => Top::Symbol(symbol.name()),
        }
    }

    /// The byte pattern read back as a number.
    pub fn as_number(&self) -> Option<u8> {
        match self {
            Top::Byte(bits) => Some(
                bits.iter()
                    .fold(0u8, |acc, bit| acc.wrapping_shl(1) | (bit & 1)),
            ),
            Top::Empty | Top::Symbol(_) => None,
        }
    }
}

fn byte_bits(byte: u8) -> [Bit; BYTE_BITS] {
    let mut bits = [0; BYTE_BITS];
    for (shift, bit) in bits.iter_mut().rev().enumerate() {
        *bit = byte.checked_shr(shift as u32).unwrap_or(0) & 1;
    }
    bits
}
