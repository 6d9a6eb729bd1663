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

use core::fmt::Write;

use heapless::{String, Vec};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

pub mod value;
pub mod word;

pub use value::{Symbol, Top, Value};
pub use word::{classify, Character, Command, Instruction, Word, WordKind, WORD_BITS};

/// This crate implements the 8 bit stack machine that runs instruction
/// cards. Every card row decodes to one 6 bit [`Word`] which is either an
/// operand, an instruction or a character (see [`word`]).
///
/// The stack holds tagged [`Value`]s: bytes and symbols. Arithmetic only
/// works on bytes. Results above 255 saturate and raise the overflow
/// flag; the flag is informational and never stops the machine.
///
/// Every call to [`StackMachine::execute`] answers a [`MachineState`].
/// `Stopped` means the program asked to stop or lacked operands, `Error`
/// means the program is broken. In both cases the reason is kept in
/// [`StackMachine::last_error`].
pub type Bit = u8;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Running,
    Stopped,
    Error,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineError {
    #[error("word has {0} bits, expected 6")]
    WordLength(usize),
    #[error("bit {index} has value {value}, expected 0 or 1")]
    InvalidBit { index: usize, value: Bit },
    #[error("code {0:#08b} does not fit in a word")]
    InvalidWord(u8),
    #[error("code {0:#08b} is not an instruction")]
    InvalidInstruction(u8),
    #[error("code {0:#08b} is not a character")]
    InvalidCharacter(u8),
    #[error("needed {needed} values on the stack but there are {available}")]
    StackUnderflow { needed: usize, available: usize },
    #[error("division needs two operands")]
    DivisionUnderflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("{0:?} is not a hexadecimal digit")]
    InvalidHexDigit(Value),
    #[error("{0:?} is not a byte")]
    NotAByte(Value),
    #[error("attempted opperation would overflow the stack")]
    StackOverflow,
    #[error("spoken line does not fit the speech buffer")]
    SpeechTooLong,
}

impl MachineError {
    /// Soft halts are `Stopped`, broken programs are `Error`.
    pub fn state(&self) -> MachineState {
        match self {
            MachineError::StackUnderflow { .. }
            | MachineError::DivisionByZero
            | MachineError::ModuloByZero => MachineState::Stopped,
            MachineError::WordLength(_)
            | MachineError::InvalidBit { .. }
            | MachineError::InvalidWord(_)
            | MachineError::InvalidInstruction(_)
            | MachineError::InvalidCharacter(_)
            | MachineError::DivisionUnderflow
            | MachineError::InvalidHexDigit(_)
            | MachineError::NotAByte(_)
            | MachineError::StackOverflow
            | MachineError::SpeechTooLong => MachineState::Error,
        }
    }
}

/// Output channel for SPEAK, one call per spoken line.
pub trait Voice {
    fn say(&mut self, line: &str);
}

impl<V: Voice + ?Sized> Voice for &mut V {
    fn say(&mut self, line: &str) {
        (**self).say(line);
    }
}

/// Drops everything it is asked to say.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Voice for Silent {
    fn say(&mut self, _line: &str) {}
}

pub struct StackMachine<V, const STACK_SIZE: usize = 64, const SPEECH_SIZE: usize = 256> {
    stack: Vec<Value, STACK_SIZE>,
    overflow: bool,
    voice: V,
    last_command: Option<Command>,
    last_error: Option<MachineError>,
    last_speech: String<SPEECH_SIZE>,
}

impl<V: Voice, const STACK_SIZE: usize, const SPEECH_SIZE: usize>
    StackMachine<V, STACK_SIZE, SPEECH_SIZE>
{
    pub fn new(voice: V) -> Self {
        Self {
            stack: Vec::new(),
            overflow: false,
            voice,
            last_command: None,
            last_error: None,
            last_speech: String::new(),
        }
    }

    /// Runs one word given as bits, most significant first. Malformed
    /// words are `Error`.
    pub fn execute(&mut self, bits: &[Bit]) -> MachineState {
        match Word::from_bits(bits) {
            Ok(word) => self.execute_word(word),
            Err(err) => self.fail(err),
        }
    }

    pub fn execute_word(&mut self, word: Word) -> MachineState {
        self.last_error = None;
        let command = match classify(word) {
            Ok(command) => command,
            Err(err) => return self.fail(err),
        };
        self.last_command = Some(command);
        trace!("executing {} ({:#08b})", command.mnemonic(), word.code());
        match self.run(command) {
            Ok(state) => state,
            Err(err) => self.fail(err),
        }
    }

    /// The top of the stack, never mutates.
    pub fn peek(&self) -> Top {
        Top::from_value(self.stack.last())
    }

    pub fn top_value(&self) -> Option<Value> {
        self.stack.last().copied()
    }

    pub fn overflow(&self) -> bool {
        self.overflow
    }

    /// Bottom first.
    pub fn stack(&self) -> &[Value] {
        self.stack.as_slice()
    }

    pub fn last_command(&self) -> Option<Command> {
        self.last_command
    }

    /// Why the last `execute` did not answer `Running`.
    pub fn last_error(&self) -> Option<MachineError> {
        self.last_error
    }

    pub fn last_speech(&self) -> &str {
        self.last_speech.as_str()
    }

    pub fn voice(&self) -> &V {
        &self.voice
    }

    pub fn voice_mut(&mut self) -> &mut V {
        &mut self.voice
    }

    pub fn into_voice(self) -> V {
        self.voice
    }

    fn fail(&mut self, err: MachineError) -> MachineState {
        let state = err.state();
        match state {
            MachineState::Stopped => debug!("machine stopped: {err}"),
            _ => warn!("machine fault: {err}"),
        }
        self.last_error = Some(err);
        state
    }

    fn run(&mut self, command: Command) -> Result<MachineState, MachineError> {
        match command {
            Command::Operand(value) => {
                self.push(Value::Byte(value))?;
                self.overflow = false;
            }
            Command::Character(Character::Speak) => return self.speak(),
            Command::Character(character) => {
                if let Some(symbol) = character.symbol() {
                    self.push(Value::Symbol(symbol))?;
                    self.overflow = false;
                }
            }
            Command::Instruction(instruction) => return self.instruction(instruction),
        }
        Ok(MachineState::Running)
    }

    fn instruction(&mut self, instruction: Instruction) -> Result<MachineState, MachineError> {
        match instruction {
            Instruction::Stp => return Ok(MachineState::Stopped),
            Instruction::Dup => {
                let [top] = self.operands::<1>()?;
                self.push(top)?;
            }
            Instruction::Del => {
                self.operands::<1>()?;
                self.drop_top(1)?;
            }
            Instruction::Swp => {
                let [below, top] = self.operands::<2>()?;
                self.drop_top(2)?;
                self.push(top)?;
                self.push(below)?;
            }
            Instruction::Add => self.binary(|a, b| Ok(saturate(u32::from(a).saturating_add(u32::from(b)))))?,
            Instruction::Sub => self.binary(|a, b| Ok(a.overflowing_sub(b)))?,
            Instruction::Mul => self.binary(|a, b| Ok(saturate(u32::from(a).saturating_mul(u32::from(b)))))?,
            Instruction::Div => {
                if self.stack.len() < 2 {
                    return Err(MachineError::DivisionUnderflow);
                }
                self.binary(|a, b| Ok((a.checked_div(b).ok_or(MachineError::DivisionByZero)?, false)))?
            }
            Instruction::Exp => self.binary(|a, b| {
                Ok(saturate(u32::from(a).checked_pow(u32::from(b)).unwrap_or(u32::MAX)))
            })?,
            Instruction::Mod => {
                self.binary(|a, b| Ok((a.checked_rem(b).ok_or(MachineError::ModuloByZero)?, false)))?
            }
            Instruction::Shl => self.binary(|a, b| Ok(shift_left(a, b)))?,
            Instruction::Shr => {
                self.binary(|a, b| Ok((a.checked_shr(u32::from(b)).unwrap_or(0), false)))?
            }
            Instruction::Hex => self.hex()?,
            Instruction::Fac => self.unary(factorial)?,
            Instruction::Not => self.unary(|a| (!a, false))?,
            Instruction::Xor => self.binary(|a, b| Ok((a ^ b, false)))?,
        }
        Ok(MachineState::Running)
    }

    /// Pops `a` (below) and `b` (top), pushes `op(a, b)`. Nothing is popped
    /// unless both operands are bytes and `op` succeeds.
    fn binary<F>(&mut self, op: F) -> Result<(), MachineError>
    where
        F: FnOnce(u8, u8) -> Result<(u8, bool), MachineError>,
    {
        let [a, b] = self.byte_operands::<2>()?;
        let (result, overflow) = op(a, b)?;
        self.replace_top(2, result, overflow)
    }

    fn unary<F>(&mut self, op: F) -> Result<(), MachineError>
    where
        F: FnOnce(u8) -> (u8, bool),
    {
        let [a] = self.byte_operands::<1>()?;
        let (result, overflow) = op(a);
        self.replace_top(1, result, overflow)
    }

    /// The top value is the high nibble, the one below it the low nibble.
    fn hex(&mut self) -> Result<(), MachineError> {
        let [low, high] = self.operands::<2>()?;
        let low_digit = low.hex_digit().ok_or(MachineError::InvalidHexDigit(low))?;
        let high_digit = high.hex_digit().ok_or(MachineError::InvalidHexDigit(high))?;
        let result = high_digit
            .checked_mul(16)
            .and_then(|high| high.checked_add(low_digit))
            .ok_or(MachineError::InvalidHexDigit(high))?;
        self.replace_top(2, result, false)
    }

    /// Pops a count `n` and then `n` values, speaking them top first as one
    /// line.
    fn speak(&mut self) -> Result<MachineState, MachineError> {
        let [count_value] = self.operands::<1>()?;
        let count = usize::from(
            count_value
                .as_byte()
                .ok_or(MachineError::NotAByte(count_value))?,
        );
        let needed = count.saturating_add(1);
        if self.stack.len() < needed {
            return Err(MachineError::StackUnderflow {
                needed,
                available: self.stack.len(),
            });
        }

        let mut line: String<SPEECH_SIZE> = String::new();
        for value in self.stack.iter().rev().skip(1).take(count) {
            write!(line, "{value}").map_err(|_| MachineError::SpeechTooLong)?;
        }
        self.drop_top(needed)?;

        info!("speaking {:?}", line.as_str());
        self.voice.say(line.as_str());
        self.last_speech = line;
        Ok(MachineState::Running)
    }

    /// Copies the top `N` values, bottom first, without popping them.
    fn operands<const N: usize>(&self) -> Result<[Value; N], MachineError> {
        let available = self.stack.len();
        let underflow = MachineError::StackUnderflow {
            needed: N,
            available,
        };
        let start = available.checked_sub(N).ok_or(underflow)?;
        let slice = self.stack.get(start..).ok_or(underflow)?;
        <[Value; N]>::try_from(slice).map_err(|_| underflow)
    }

    fn byte_operands<const N: usize>(&self) -> Result<[u8; N], MachineError> {
        let values = self.operands::<N>()?;
        let mut bytes = [0; N];
        for (byte, value) in bytes.iter_mut().zip(values) {
            *byte = value.as_byte().ok_or(MachineError::NotAByte(value))?;
        }
        Ok(bytes)
    }

    fn replace_top(&mut self, count: usize, result: u8, overflow: bool) -> Result<(), MachineError> {
        self.drop_top(count)?;
        self.push(Value::Byte(result))?;
        self.overflow = overflow;
        Ok(())
    }

    fn drop_top(&mut self, count: usize) -> Result<(), MachineError> {
        let available = self.stack.len();
        let new_len = available
            .checked_sub(count)
            .ok_or(MachineError::StackUnderflow {
                needed: count,
                available,
            })?;
        self.stack.truncate(new_len);
        Ok(())
    }

    fn push(&mut self, value: Value) -> Result<(), MachineError> {
        if self.stack.push(value).is_err() {
            return Err(MachineError::StackOverflow);
        }
        Ok(())
    }
}

fn saturate(value: u32) -> (u8, bool) {
    match u8::try_from(value) {
        Ok(byte) => (byte, false),
        Err(_) => (u8::MAX, true),
    }
}

/// Keeps the low 8 bits of `a << b`, overflow when anything was lost.
fn shift_left(a: u8, b: u8) -> (u8, bool) {
    let Some(full) = u16::from(a)
        .checked_shl(u32::from(b))
        .filter(|_| usize::from(b) < value::BYTE_BITS)
    else {
        return (0, a != 0);
    };
    let [low, high] = full.to_le_bytes();
    (low, high != 0)
}

fn factorial(a: u8) -> (u8, bool) {
    let product = (1..=u32::from(a)).try_fold(1u32, |acc, n| {
        acc.checked_mul(n).filter(|value| *value <= u32::from(u8::MAX))
    });
    match product {
        Some(value) => saturate(value),
        None => (u8::MAX, true),
    }
}
