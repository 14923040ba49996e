// Messages exchanged between SimulationManagers over their reliable channel.
// Ticks are big-endian 32-bit integers.

use lockstep_shared::Tick;

use crate::error::SyncMessageError;

pub const PROGRESS: u8 = 17;
pub const ACTION: u8 = 98;

const TICK_BYTES: usize = 4;

#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum SyncMessage<'a> {
    // `[PROGRESS][tick]`
    Progress { tick: Tick },
    // `[ACTION][sequenced action..]`, see `SequencedAction::encode`
    Action { sequenced_action: &'a [u8] },
}

impl<'a> SyncMessage<'a> {
    pub fn read(content: &'a [u8]) -> Result<Self, SyncMessageError> {
        let Some((&tag, rest)) = content.split_first() else {
            return Err(SyncMessageError::EmptyMessage);
        };

        match tag {
            PROGRESS => {
                let (tick, _) = read_tick(rest).ok_or(SyncMessageError::Truncated {
                    kind: "PROGRESS",
                    needed: 1 + TICK_BYTES,
                    have: content.len(),
                })?;
                Ok(Self::Progress { tick })
            }
            ACTION => Ok(Self::Action {
                sequenced_action: rest,
            }),
            tag => Err(SyncMessageError::UnknownTag { tag }),
        }
    }

    pub fn write(&self) -> Vec<u8> {
        match self {
            Self::Progress { tick } => {
                let mut output = Vec::with_capacity(1 + TICK_BYTES);
                output.push(PROGRESS);
                output.extend_from_slice(&tick.to_be_bytes());
                output
            }
            Self::Action { sequenced_action } => {
                let mut output = Vec::with_capacity(1 + sequenced_action.len());
                output.push(ACTION);
                output.extend_from_slice(sequenced_action);
                output
            }
        }
    }
}

/// Splits a leading big-endian tick off `content`
pub(crate) fn read_tick(content: &[u8]) -> Option<(Tick, &[u8])> {
    let (tick, rest) = content.split_first_chunk::<TICK_BYTES>()?;
    Some((Tick::from_be_bytes(*tick), rest))
}
