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

pub mod protocol;

use hamming_code::{Bit, CodecError, DecodeStatus, HammingCode, SourceWord, CODEWORD_BITS};
use log::{info, warn};
use postcard::{from_bytes_cobs, to_slice_cobs};
use serde::{Deserialize, Serialize};
use stack_machine::{MachineError, MachineState, StackMachine, Voice};
use thiserror_no_std::Error;

use crate::protocol::{Event, ProtocolError};

/// One card row as sensed. `None` marks a cell the sensor could not
/// classify as either 0 or 1.
pub type Row = [Option<Bit>; CODEWORD_BITS];

/// Runtime settings for [`CardReader`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    pub rows_per_card: u32,
    /// Rereads of a row before the operator is asked to adjust the card.
    pub max_rereads: u32,
    /// Operator adjustments before a row is given up as unreadable.
    pub max_adjustments: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            rows_per_card: 10,
            max_rereads: 1,
            max_adjustments: 3,
        }
    }
}

impl ReaderConfig {
    pub fn from_frame(frame: &mut [u8]) -> Result<Self, ProtocolError> {
        Ok(from_bytes_cobs(frame)?)
    }

    pub fn to_frame<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ProtocolError> {
        Ok(to_slice_cobs(self, buf)?)
    }
}

/// The sensing and card transport hardware.
pub trait CodewordSource {
    type Error;

    fn read_row(&mut self, row: u32) -> Result<Row, Self::Error>;
    /// Sense the same row again without moving the card.
    fn reread_row(&mut self, row: u32) -> Result<Row, Self::Error>;
    /// Ask the operator to straighten the card. Returns once they are done.
    fn request_adjustment(&mut self, row: u32) -> Result<(), Self::Error>;
    /// Move the card to the next row.
    fn advance(&mut self) -> Result<(), Self::Error>;
}

pub trait Reporter {
    fn report(&mut self, event: &Event);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, event: &Event) {
        (**self).report(event);
    }
}

impl Reporter for () {
    fn report(&mut self, _event: &Event) {}
}

#[derive(Error, Debug)]
pub enum ReaderError<E> {
    #[error("codeword source failed: {0:?}")]
    Source(E),
    #[error("codec could not be built: {0}")]
    Codec(#[from] CodecError),
    #[error("row {row} could not be read")]
    Unreadable { row: u32 },
}

/// How a card run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardOutcome {
    /// Every row ran and the machine kept running.
    Completed,
    Stopped { row: u32 },
    /// `error` is the reason the machine reported for the fault.
    Faulted { row: u32, error: Option<MachineError> },
}

/// Reads card rows, decodes them and feeds the words to a machine.
pub struct CardReader<S, R, V, const STACK_SIZE: usize = 64, const SPEECH_SIZE: usize = 256> {
    source: S,
    reporter: R,
    code: HammingCode,
    machine: StackMachine<V, STACK_SIZE, SPEECH_SIZE>,
    config: ReaderConfig,
}

impl<S, R, V, const STACK_SIZE: usize, const SPEECH_SIZE: usize>
    CardReader<S, R, V, STACK_SIZE, SPEECH_SIZE>
where
    S: CodewordSource,
    R: Reporter,
    V: Voice,
{
    pub fn new(
        source: S,
        reporter: R,
        machine: StackMachine<V, STACK_SIZE, SPEECH_SIZE>,
        config: ReaderConfig,
    ) -> Result<Self, ReaderError<S::Error>> {
        Ok(Self {
            source,
            reporter,
            code: HammingCode::new()?,
            machine,
            config,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn machine(&self) -> &StackMachine<V, STACK_SIZE, SPEECH_SIZE> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut StackMachine<V, STACK_SIZE, SPEECH_SIZE> {
        &mut self.machine
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Reads and decodes one row. Uncorrectable rows are reread, then the
    /// operator is asked to adjust the card; the reread count starts over
    /// after every adjustment.
    pub fn read_word(&mut self, row: u32) -> Result<SourceWord, ReaderError<S::Error>> {
        let mut cells = self.source.read_row(row).map_err(ReaderError::Source)?;
        let mut adjustments = 0u32;
        loop {
            let mut rereads = 0u32;
            loop {
                if let Some(word) = self.decode_row(row, &cells) {
                    return Ok(word);
                }
                if rereads >= self.config.max_rereads {
                    break;
                }
                rereads = rereads.saturating_add(1);
                warn!("row {row} unreadable, reread {rereads}");
                self.reporter.report(&Event::Reread {
                    row,
                    attempt: rereads,
                });
                cells = self.source.reread_row(row).map_err(ReaderError::Source)?;
            }

            if adjustments >= self.config.max_adjustments {
                warn!("row {row} given up after {adjustments} adjustments");
                return Err(ReaderError::Unreadable { row });
            }
            adjustments = adjustments.saturating_add(1);
            warn!("row {row} unreadable, asking for adjustment {adjustments}");
            self.reporter.report(&Event::AdjustmentRequested {
                row,
                attempt: adjustments,
            });
            self.source
                .request_adjustment(row)
                .map_err(ReaderError::Source)?;
            cells = self.source.reread_row(row).map_err(ReaderError::Source)?;
        }
    }

    /// Runs a whole card through the machine, one row at a time.
    pub fn read_card(&mut self) -> Result<CardOutcome, ReaderError<S::Error>> {
        info!("reading card of {} rows", self.config.rows_per_card);
        for row in 0..self.config.rows_per_card {
            let word = self.read_word(row)?;
            let state = self.machine.execute(&word);
            self.reporter.report(&Event::Executed {
                row,
                command: self.machine.last_command(),
                state,
                top: self.machine.top_value(),
                overflow: self.machine.overflow(),
            });
            match state {
                MachineState::Running => self.source.advance().map_err(ReaderError::Source)?,
                MachineState::Stopped => {
                    info!("card stopped at row {row}");
                    return Ok(CardOutcome::Stopped { row });
                }
                MachineState::Error => {
                    let error = self.machine.last_error();
                    warn!("card faulted at row {row}: {error:?}");
                    return Ok(CardOutcome::Faulted { row, error });
                }
            }
        }
        info!("card finished");
        Ok(CardOutcome::Completed)
    }

    fn decode_row(&mut self, row: u32, cells: &Row) -> Option<SourceWord> {
        let (word, status) = match sensed_bits(cells) {
            Some(bits) => self.code.decode(&bits),
            None => (None, DecodeStatus::Uncorrectable),
        };
        self.reporter.report(&Event::RowDecoded { row, word, status });
        word
    }
}

fn sensed_bits(cells: &Row) -> Option<[Bit; CODEWORD_BITS]> {
    let mut bits = [0; CODEWORD_BITS];
    for (bit, cell) in bits.iter_mut().zip(cells) {
        *bit = (*cell)?;
    }
    Some(bits)
}
