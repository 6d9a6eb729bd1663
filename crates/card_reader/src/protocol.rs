use hamming_code::{DecodeStatus, SourceWord};
use heapless::Vec;
use log::warn;
use postcard::{from_bytes_cobs, to_slice_cobs};
use serde::{Deserialize, Serialize};
use stack_machine::{Command, MachineState, Value};
use thiserror_no_std::Error;

use crate::Reporter;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("postcard: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("frame does not fit the log")]
    LogFull,
}

/// Progress reports from a [`crate::CardReader`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A decode attempt. `word` is `None` when the row was uncorrectable.
    RowDecoded {
        row: u32,
        word: Option<SourceWord>,
        status: DecodeStatus,
    },
    Reread { row: u32, attempt: u32 },
    AdjustmentRequested { row: u32, attempt: u32 },
    /// A decoded word was run on the machine.
    Executed {
        row: u32,
        command: Option<Command>,
        state: MachineState,
        top: Option<Value>,
        overflow: bool,
    },
}

impl Event {
    pub fn row(&self) -> u32 {
        match self {
            Event::RowDecoded { row, .. }
            | Event::Reread { row, .. }
            | Event::AdjustmentRequested { row, .. }
            | Event::Executed { row, .. } => *row,
        }
    }
}

/// Writes `event` as one COBS frame, zero terminated.
pub fn encode_event<'a>(event: &Event, buf: &'a mut [u8]) -> Result<&'a mut [u8], ProtocolError> {
    Ok(to_slice_cobs(event, buf)?)
}

/// Decodes a frame in place.
pub fn decode_event(frame: &mut [u8]) -> Result<Event, ProtocolError> {
    Ok(from_bytes_cobs(frame)?)
}

/// A [`Reporter`] keeping encoded frames in fixed capacity. Events that do
/// not fit are counted and dropped.
#[derive(Debug, Default)]
pub struct FrameLog<const FRAME_SIZE: usize = 32, const CAPACITY: usize = 64> {
    frames: Vec<Vec<u8, FRAME_SIZE>, CAPACITY>,
    dropped: usize,
}

impl<const FRAME_SIZE: usize, const CAPACITY: usize> FrameLog<FRAME_SIZE, CAPACITY> {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: &Event) -> Result<(), ProtocolError> {
        let mut buf = [0u8; FRAME_SIZE];
        let encoded = encode_event(event, &mut buf)?;
        let frame = Vec::from_slice(encoded).map_err(|_| ProtocolError::LogFull)?;
        self.frames.push(frame).map_err(|_| ProtocolError::LogFull)
    }

    pub fn frames(&self) -> impl Iterator<Item = &[u8]> {
        self.frames.iter().map(|frame| frame.as_slice())
    }

    /// Decodes every stored frame, oldest first.
    pub fn events(&self) -> impl Iterator<Item = Result<Event, ProtocolError>> + '_ {
        self.frames.iter().map(|frame| {
            let mut frame = frame.clone();
            decode_event(&mut frame)
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.dropped = 0;
    }
}

impl<const FRAME_SIZE: usize, const CAPACITY: usize> Reporter for FrameLog<FRAME_SIZE, CAPACITY> {
    fn report(&mut self, event: &Event) {
        if let Err(err) = self.push(event) {
            warn!("dropping event for row {}: {err}", event.row());
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}
