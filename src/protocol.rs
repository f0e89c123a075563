//! Wire protocol for the radio control link.
//!
//! Every frame is a one-byte command tag followed by a fixed-layout payload.
//! Two commands exist: staging one bank of keyframes, and committing the
//! staged graph. Both directions of the protocol live here: [`Command`]
//! parses inbound frames for the engine, and the `encode_*` builders
//! produce outbound frames on the host side.
//!
//! Node and bank indices are masked to their wire field widths on the way
//! in, even where the nibble packing already bounds them.

use heapless::Vec;

use crate::color::{pack565, unpack565};
use crate::keyframe::{NodeId, StagedKeyframe};
use crate::{BANK_COUNT, BANK_SIZE, CHANNEL_COUNT, NODE_COUNT};

/// Command tag: stage one bank of keyframes.
pub const CMD_STAGE_KEYFRAMES: u8 = 0x01;
/// Command tag: publish the staged graph and restart all channels.
pub const CMD_COMMIT_GRAPH: u8 = 0x02;

/// Bytes per staged keyframe entry: RGB565 (little-endian), hold, decay.
const ENTRY_LEN: usize = 4;

/// Length of a Stage Keyframes frame (tag + bank + entries).
pub const STAGE_FRAME_LEN: usize = 2 + BANK_SIZE * ENTRY_LEN;
/// Length of a Commit Graph frame (tag + start nodes + packed topology).
pub const COMMIT_FRAME_LEN: usize = 1 + CHANNEL_COUNT + NODE_COUNT / 2;
/// Capacity that holds any frame this protocol produces.
pub const MAX_FRAME_LEN: usize = STAGE_FRAME_LEN;

/// A decoded control frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Write one bank of staged keyframes. Has no effect on playback until
    /// the next commit.
    StageKeyframes {
        /// Bank of 4 consecutive store slots to write.
        bank: usize,
        /// The staged entries, in slot order.
        entries: [StagedKeyframe; BANK_SIZE],
    },
    /// Publish staging into live, rewrite the topology, and restart every
    /// channel on its start node.
    CommitGraph {
        /// Start node per channel.
        initial: [NodeId; CHANNEL_COUNT],
        /// `next` link for every store slot.
        next_map: [NodeId; NODE_COUNT],
    },
}

/// Frame rejection reasons.
///
/// The engine drops rejected frames silently - the radio link has no
/// in-band error channel for this message class - but the parse API
/// reports the reason for callers that want diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Zero-length frame: no command tag to dispatch on.
    Empty,
    /// Unrecognized command tag.
    UnknownTag(u8),
    /// Frame shorter than its command's payload.
    Truncated {
        /// Total frame length the command requires.
        expected: usize,
        /// Length actually received.
        actual: usize,
    },
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::Empty => write!(f, "empty frame"),
            FrameError::UnknownTag(tag) => write!(f, "unknown command tag 0x{:02X}", tag),
            FrameError::Truncated { expected, actual } => {
                write!(f, "truncated frame: expected {} bytes, got {}", expected, actual)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}

impl Command {
    /// Decodes a raw frame.
    ///
    /// Bytes beyond the command's payload are ignored; only missing bytes
    /// reject a frame.
    pub fn parse(frame: &[u8]) -> Result<Command, FrameError> {
        let (&tag, payload) = frame.split_first().ok_or(FrameError::Empty)?;
        match tag {
            CMD_STAGE_KEYFRAMES => {
                if frame.len() < STAGE_FRAME_LEN {
                    return Err(FrameError::Truncated {
                        expected: STAGE_FRAME_LEN,
                        actual: frame.len(),
                    });
                }
                let bank = (payload[0] as usize) & (BANK_COUNT - 1);
                let mut entries = [StagedKeyframe::ZERO; BANK_SIZE];
                for (i, entry) in entries.iter_mut().enumerate() {
                    let bytes = &payload[1 + i * ENTRY_LEN..1 + (i + 1) * ENTRY_LEN];
                    let packed = u16::from_le_bytes([bytes[0], bytes[1]]);
                    *entry = StagedKeyframe::new(unpack565(packed), bytes[2], bytes[3]);
                }
                Ok(Command::StageKeyframes { bank, entries })
            }
            CMD_COMMIT_GRAPH => {
                if frame.len() < COMMIT_FRAME_LEN {
                    return Err(FrameError::Truncated {
                        expected: COMMIT_FRAME_LEN,
                        actual: frame.len(),
                    });
                }
                let mut initial = [NodeId::new(0); CHANNEL_COUNT];
                for (c, slot) in initial.iter_mut().enumerate() {
                    *slot = NodeId::new(payload[c]);
                }
                // Two node indices per byte, low nibble first.
                let mut next_map = [NodeId::new(0); NODE_COUNT];
                for (k, slot) in next_map.iter_mut().enumerate() {
                    let byte = payload[CHANNEL_COUNT + k / 2];
                    let nibble = if k % 2 == 0 { byte } else { byte >> 4 };
                    *slot = NodeId::new(nibble);
                }
                Ok(Command::CommitGraph { initial, next_map })
            }
            tag => Err(FrameError::UnknownTag(tag)),
        }
    }
}

/// Frame construction errors for the host-side encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Bank index outside the store's bank range.
    BankOutOfRange(usize),
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EncodeError::BankOutOfRange(bank) => {
                write!(f, "bank {} exceeds bank count {}", bank, BANK_COUNT)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// Builds a Stage Keyframes frame for one bank.
///
/// Colors are quantized to RGB565 on the way out; what the cube displays is
/// the [`unpack565`] expansion of that quantized value.
pub fn encode_stage_keyframes(
    bank: usize,
    entries: &[StagedKeyframe; BANK_SIZE],
) -> Result<Vec<u8, MAX_FRAME_LEN>, EncodeError> {
    if bank >= BANK_COUNT {
        return Err(EncodeError::BankOutOfRange(bank));
    }

    let mut buf = [0u8; STAGE_FRAME_LEN];
    buf[0] = CMD_STAGE_KEYFRAMES;
    buf[1] = bank as u8;
    for (i, entry) in entries.iter().enumerate() {
        let at = 2 + i * ENTRY_LEN;
        buf[at..at + 2].copy_from_slice(&pack565(entry.color).to_le_bytes());
        buf[at + 2] = entry.hold_ticks;
        buf[at + 3] = entry.decay_ticks;
    }

    let mut frame = Vec::new();
    // Infallible: capacity is MAX_FRAME_LEN, the largest layout.
    let _ = frame.extend_from_slice(&buf);
    Ok(frame)
}

/// Builds a Commit Graph frame.
///
/// `NodeId` construction already bounds every index, so this cannot fail.
pub fn encode_commit_graph(
    initial: &[NodeId; CHANNEL_COUNT],
    next_map: &[NodeId; NODE_COUNT],
) -> Vec<u8, MAX_FRAME_LEN> {
    let mut buf = [0u8; COMMIT_FRAME_LEN];
    buf[0] = CMD_COMMIT_GRAPH;
    for (c, node) in initial.iter().enumerate() {
        buf[1 + c] = node.value();
    }
    for k in (0..NODE_COUNT).step_by(2) {
        buf[1 + CHANNEL_COUNT + k / 2] = next_map[k].value() | (next_map[k + 1].value() << 4);
    }

    let mut frame = Vec::new();
    let _ = frame.extend_from_slice(&buf[..COMMIT_FRAME_LEN]);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    fn sample_entries() -> [StagedKeyframe; BANK_SIZE] {
        [
            StagedKeyframe::new(unpack565(0xF800), 10, 0),
            StagedKeyframe::new(unpack565(0x07E0), 0, 5),
            StagedKeyframe::new(unpack565(0x001F), 3, 3),
            StagedKeyframe::new(unpack565(0x0000), 0, 0),
        ]
    }

    #[test]
    fn stage_frame_round_trips() {
        let entries = sample_entries();
        let frame = encode_stage_keyframes(2, &entries).unwrap();
        assert_eq!(frame.len(), STAGE_FRAME_LEN);

        match Command::parse(&frame).unwrap() {
            Command::StageKeyframes { bank, entries: parsed } => {
                assert_eq!(bank, 2);
                assert_eq!(parsed, entries);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn commit_frame_round_trips() {
        let initial = [NodeId::new(0), NodeId::new(4), NodeId::new(9), NodeId::new(15)];
        let next_map: [NodeId; NODE_COUNT] =
            core::array::from_fn(|k| NodeId::new((NODE_COUNT - 1 - k) as u8));

        let frame = encode_commit_graph(&initial, &next_map);
        assert_eq!(frame.len(), COMMIT_FRAME_LEN);

        match Command::parse(&frame).unwrap() {
            Command::CommitGraph { initial: i, next_map: n } => {
                assert_eq!(i, initial);
                assert_eq!(n, next_map);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn next_map_nibbles_are_low_first() {
        let initial = [NodeId::new(0); CHANNEL_COUNT];
        let mut next_map = [NodeId::new(0); NODE_COUNT];
        next_map[0] = NodeId::new(0x3);
        next_map[1] = NodeId::new(0xA);

        let frame = encode_commit_graph(&initial, &next_map);
        assert_eq!(frame[1 + CHANNEL_COUNT], 0xA3);
    }

    #[test]
    fn empty_frame_is_rejected() {
        assert_eq!(Command::parse(&[]), Err(FrameError::Empty));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(Command::parse(&[0x7F, 0, 0]), Err(FrameError::UnknownTag(0x7F)));
    }

    #[test]
    fn truncated_frames_are_rejected() {
        let entries = sample_entries();
        let stage = encode_stage_keyframes(0, &entries).unwrap();
        assert_eq!(
            Command::parse(&stage[..STAGE_FRAME_LEN - 1]),
            Err(FrameError::Truncated {
                expected: STAGE_FRAME_LEN,
                actual: STAGE_FRAME_LEN - 1,
            })
        );

        assert_eq!(
            Command::parse(&[CMD_COMMIT_GRAPH]),
            Err(FrameError::Truncated {
                expected: COMMIT_FRAME_LEN,
                actual: 1,
            })
        );
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let frame = encode_commit_graph(
            &[NodeId::new(1); CHANNEL_COUNT],
            &[NodeId::new(2); NODE_COUNT],
        );
        let mut padded = [0u8; COMMIT_FRAME_LEN + 4];
        padded[..COMMIT_FRAME_LEN].copy_from_slice(&frame);

        assert!(Command::parse(&padded).is_ok());
    }

    #[test]
    fn out_of_range_fields_are_masked() {
        // Bank byte 0xFE masks to bank 2.
        let entries = sample_entries();
        let mut frame = encode_stage_keyframes(2, &entries).unwrap();
        frame[1] = 0xFE;
        match Command::parse(&frame).unwrap() {
            Command::StageKeyframes { bank, .. } => assert_eq!(bank, 2),
            other => panic!("unexpected command: {:?}", other),
        }

        // Start-node bytes carry junk in their high nibble.
        let mut commit = encode_commit_graph(
            &[NodeId::new(0); CHANNEL_COUNT],
            &[NodeId::new(0); NODE_COUNT],
        );
        commit[1] = 0xF7;
        match Command::parse(&commit).unwrap() {
            Command::CommitGraph { initial, .. } => assert_eq!(initial[0], NodeId::new(7)),
            other => panic!("unexpected command: {:?}", other),
        }

        let color = Srgb::new(12u8, 200, 98);
        assert!(encode_stage_keyframes(BANK_COUNT, &[StagedKeyframe::new(color, 0, 0); 4]).is_err());
    }
}
