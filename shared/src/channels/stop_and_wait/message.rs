// The three kinds of message exchanged by the two halves of a
// Stop-and-Wait channel, distinguished by their leading tag byte

use crate::{channels::error::WireError, types::SequenceNumber};

pub const ACK: u8 = 17;
pub const DATA: u8 = 61;
pub const CLOSE: u8 = 97;

#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum StopAndWaitMessage<'a> {
    // `[DATA][sequence][payload..]`
    Data {
        sequence: SequenceNumber,
        payload: &'a [u8],
    },
    // `[ACK][sequence]`
    Ack { sequence: SequenceNumber },
    // `[CLOSE]`
    Close,
}

impl<'a> StopAndWaitMessage<'a> {
    pub fn read(content: &'a [u8]) -> Result<Self, WireError> {
        let Some((&tag, rest)) = content.split_first() else {
            return Err(WireError::EmptyMessage);
        };

        match tag {
            DATA => match rest.split_first() {
                Some((&sequence, payload)) => Ok(Self::Data { sequence, payload }),
                None => Err(WireError::Truncated {
                    kind: "DATA",
                    needed: 2,
                    have: content.len(),
                }),
            },
            ACK => match rest.first() {
                Some(&sequence) => Ok(Self::Ack { sequence }),
                None => Err(WireError::Truncated {
                    kind: "ACK",
                    needed: 2,
                    have: content.len(),
                }),
            },
            CLOSE => Ok(Self::Close),
            tag => Err(WireError::UnknownTag { tag }),
        }
    }

    pub fn write(&self) -> Vec<u8> {
        match self {
            Self::Data { sequence, payload } => {
                let mut output = Vec::with_capacity(payload.len() + 2);
                output.push(DATA);
                output.push(*sequence);
                output.extend_from_slice(payload);
                output
            }
            Self::Ack { sequence } => vec![ACK, *sequence],
            Self::Close => vec![CLOSE],
        }
    }
}
