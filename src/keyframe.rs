//! Keyframe node data model.

use crate::{COLOR_OFF, NODE_COUNT};
use palette::Srgb;

/// Index of a keyframe slot within the store arena.
///
/// Node indices on the wire are 4-bit fields; construction masks to that
/// width, so a `NodeId` always addresses a valid arena slot even when the
/// raw byte came from a corrupted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeId(u8);

impl NodeId {
    /// Mask applied to raw wire values.
    pub const MASK: u8 = (NODE_COUNT - 1) as u8;

    /// Creates a node index, masking into the arena range.
    #[inline]
    pub const fn new(raw: u8) -> Self {
        NodeId(raw & Self::MASK)
    }

    /// Returns the index for arena addressing.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw 4-bit value as carried on the wire.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl From<u8> for NodeId {
    fn from(raw: u8) -> Self {
        NodeId::new(raw)
    }
}

impl From<NodeId> for usize {
    fn from(id: NodeId) -> Self {
        id.index()
    }
}

/// One color + timing record in the animation graph.
///
/// `next` is an arena index, not an owning reference: self-references and
/// cycles are ordinary topology, and replacing the whole graph is a plain
/// array copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Color displayed while dwelling on this node.
    pub color: Srgb<u8>,
    /// Node to advance to once the dwell ends.
    pub next: NodeId,
    /// Ticks to hold `color` before advancing.
    pub hold_ticks: u8,
    /// Ticks to blend toward `next`'s color; 0 disables the decay phase.
    pub decay_ticks: u8,
}

impl Keyframe {
    /// The power-on node: black, zero dwell, linked to slot 0.
    pub const ZERO: Keyframe = Keyframe {
        color: COLOR_OFF,
        next: NodeId::new(0),
        hold_ticks: 0,
        decay_ticks: 0,
    };

    /// Creates a keyframe.
    #[inline]
    pub const fn new(color: Srgb<u8>, next: NodeId, hold_ticks: u8, decay_ticks: u8) -> Self {
        Self {
            color,
            next,
            hold_ticks,
            decay_ticks,
        }
    }
}

/// A keyframe as staged over the wire: color and dwell times without a
/// `next` link. Topology arrives separately with the commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagedKeyframe {
    /// Color displayed while dwelling on the node.
    pub color: Srgb<u8>,
    /// Ticks to hold the color.
    pub hold_ticks: u8,
    /// Ticks to blend toward the next node's color.
    pub decay_ticks: u8,
}

impl StagedKeyframe {
    /// An all-zero staged entry (black, no dwell).
    pub const ZERO: StagedKeyframe = StagedKeyframe {
        color: COLOR_OFF,
        hold_ticks: 0,
        decay_ticks: 0,
    };

    /// Creates a staged keyframe.
    #[inline]
    pub const fn new(color: Srgb<u8>, hold_ticks: u8, decay_ticks: u8) -> Self {
        Self {
            color,
            hold_ticks,
            decay_ticks,
        }
    }
}
