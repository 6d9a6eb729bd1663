//! The 6 bit card alphabet.
//!
//! The two leading bits of a word select its kind:
//!
//! | prefix | kind | payload |
//! |---|---|---|
//! | `00` | operand | 4 bit unsigned value |
//! | `01` | instruction | one of 16 opcodes |
//! | `1x` | character | one of 32 character codes |

use serde::{Deserialize, Serialize};
use variant_count::VariantCount;

use crate::value::Symbol;
use crate::{Bit, MachineError};

pub const WORD_BITS: usize = 6;

const WORD_MASK: u8 = 0b11_1111;
const KIND_MASK: u8 = 0b11_0000;
const OPERAND_PREFIX: u8 = 0b00_0000;
const INSTRUCTION_PREFIX: u8 = 0b01_0000;
const OPERAND_MASK: u8 = 0b00_1111;

/// A validated 6 bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word(u8);

impl Word {
    pub fn new(code: u8) -> Result<Self, MachineError> {
        if code > WORD_MASK {
            return Err(MachineError::InvalidWord(code));
        }
        Ok(Self(code))
    }

    /// Builds a word from bits, most significant first.
    pub fn from_bits(bits: &[Bit]) -> Result<Self, MachineError> {
        if bits.len() != WORD_BITS {
            return Err(MachineError::WordLength(bits.len()));
        }
        let code = bits
            .iter()
            .enumerate()
            .try_fold(0u8, |acc, (index, bit)| match bit {
                0 | 1 => Ok(acc.wrapping_shl(1) | bit),
                _ => Err(MachineError::InvalidBit { index, value: *bit }),
            })?;
        Self::new(code)
    }

    pub fn code(&self) -> u8 {
        self.0
    }

    pub fn bits(&self) -> [Bit; WORD_BITS] {
        let mut bits = [0; WORD_BITS];
        for (shift, bit) in bits.iter_mut().rev().enumerate() {
            *bit = self.0.checked_shr(shift as u32).unwrap_or(0) & 1;
        }
        bits
    }

    pub fn kind(&self) -> WordKind {
        match self.0 & KIND_MASK {
            OPERAND_PREFIX => WordKind::Operand,
            INSTRUCTION_PREFIX => WordKind::Instruction,
            _ => WordKind::Character,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    Operand,
    Instruction,
    Character,
}

#[repr(u8)]
#[derive(VariantCount, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Stp = 0b01_0000,
    Dup,
    Del,
    Swp,
    Add,
    Sub,
    Mul,
    Div,
    Exp,
    Mod,
    Shl,
    Shr,
    Hex,
    Fac,
    Not,
    Xor,
}

// Indexed by `code - Instruction::Stp`.
const INSTRUCTIONS: [Instruction; Instruction::VARIANT_COUNT] = [
    Instruction::Stp,
    Instruction::Dup,
    Instruction::Del,
    Instruction::Swp,
    Instruction::Add,
    Instruction::Sub,
    Instruction::Mul,
    Instruction::Div,
    Instruction::Exp,
    Instruction::Mod,
    Instruction::Shl,
    Instruction::Shr,
    Instruction::Hex,
    Instruction::Fac,
    Instruction::Not,
    Instruction::Xor,
];

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Stp => "STP",
            Instruction::Dup => "DUP",
            Instruction::Del => "DEL",
            Instruction::Swp => "SWP",
            Instruction::Add => "ADD",
            Instruction::Sub => "SUB",
            Instruction::Mul => "MUL",
            Instruction::Div => "DIV",
            Instruction::Exp => "EXP",
            Instruction::Mod => "MOD",
            Instruction::Shl => "SHL",
            Instruction::Shr => "SHR",
            Instruction::Hex => "HEX",
            Instruction::Fac => "FAC",
            Instruction::Not => "NOT",
            Instruction::Xor => "XOR",
        }
    }
}

impl From<Instruction> for u8 {
    fn from(instruction: Instruction) -> u8 {
        instruction as u8
    }
}

impl TryFrom<u8> for Instruction {
    type Error = MachineError;
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let index = code
            .checked_sub(Instruction::Stp as u8)
            .ok_or(MachineError::InvalidInstruction(code))?;
        INSTRUCTIONS
            .get(usize::from(index))
            .copied()
            .ok_or(MachineError::InvalidInstruction(code))
    }
}

#[repr(u8)]
#[derive(VariantCount, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Character {
    Nop = 0b10_0000,
    Speak,
    Space,
    Nop1,
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
    Nop2,
    Nop3,
}

// Indexed by `code - Character::Nop`.
const CHARACTERS: [Character; Character::VARIANT_COUNT] = [
    Character::Nop,
    Character::Speak,
    Character::Space,
    Character::Nop1,
    Character::A,
    Character::B,
    Character::C,
    Character::D,
    Character::E,
    Character::F,
    Character::G,
    Character::H,
    Character::I,
    Character::J,
    Character::K,
    Character::L,
    Character::M,
    Character::N,
    Character::O,
    Character::P,
    Character::Q,
    Character::R,
    Character::S,
    Character::T,
    Character::U,
    Character::V,
    Character::W,
    Character::X,
    Character::Y,
    Character::Z,
    Character::Nop2,
    Character::Nop3,
];

impl Character {
    /// The symbol pushed by this character, `None` for SPEAK and the NOPs.
    pub fn symbol(&self) -> Option<Symbol> {
        let symbol = match self {
            Character::Nop
            | Character::Nop1
            | Character::Nop2
            | Character::Nop3
            | Character::Speak => return None,
            Character::Space => Symbol::Space,
            Character::A => Symbol::A,
            Character::B => Symbol::B,
            Character::C => Symbol::C,
            Character::D => Symbol::D,
            Character::E => Symbol::E,
            Character::F => Symbol::F,
            Character::G => Symbol::G,
            Character::H => Symbol::H,
            Character::I => Symbol::I,
            Character::J => Symbol::J,
            Character::K => Symbol::K,
            Character::L => Symbol::L,
            Character::M => Symbol::M,
            Character::N => Symbol::N,
            Character::O => Symbol::O,
            Character::P => Symbol::P,
            Character::Q => Symbol::Q,
            Character::R => Symbol::R,
            Character::S => Symbol::S,
            Character::T => Symbol::T,
            Character::U => Symbol::U,
            Character::V => Symbol::V,
            Character::W => Symbol::W,
            Character::X => Symbol::X,
            Character::Y => Symbol::Y,
            Character::Z => Symbol::Z,
        };
        Some(symbol)
    }

    pub fn is_nop(&self) -> bool {
        matches!(
            self,
            Character::Nop | Character::Nop1 | Character::Nop2 | Character::Nop3
        )
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Character::Nop => "NOP",
            Character::Nop1 => "NOP1",
            Character::Nop2 => "NOP2",
            Character::Nop3 => "NOP3",
            Character::Speak => "SPEAK",
            other => other.symbol().map_or("NOP", |symbol| symbol.name()),
        }
    }
}

impl From<Character> for u8 {
    fn from(character: Character) -> u8 {
        character as u8
    }
}

impl TryFrom<u8> for Character {
    type Error = MachineError;
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let index = code
            .checked_sub(Character::Nop as u8)
            .ok_or(MachineError::InvalidCharacter(code))?;
        CHARACTERS
            .get(usize::from(index))
            .copied()
            .ok_or(MachineError::InvalidCharacter(code))
    }
}

/// A classified word.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Operand(u8),
    Instruction(Instruction),
    Character(Character),
}

impl Command {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Command::Operand(_) => "PUSH",
            Command::Instruction(instruction) => instruction.mnemonic(),
            Command::Character(character) => character.mnemonic(),
        }
    }
}

pub fn classify(word: Word) -> Result<Command, MachineError> {
    let code = word.code();
    match word.kind() {
        WordKind::Operand => Ok(Command::Operand(code & OPERAND_MASK)),
        WordKind::Instruction => Ok(Command::Instruction(code.try_into()?)),
        WordKind::Character => Ok(Command::Character(code.try_into()?)),
    }
}
