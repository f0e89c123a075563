//! Per-channel playback state machine.
//!
//! Each light channel is driven by a [`ChannelPlayer`]: a three-state
//! machine that walks the live keyframe graph by index and writes one slot
//! of the output intensity vector. All color math is integer fixed-point;
//! per-tick work is O(1) regardless of graph topology, so cycles and
//! self-loops need no special handling.

use crate::NODE_COUNT;
use crate::keyframe::{Keyframe, NodeId};
use palette::Srgb;

/// Playback phase of a single light channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayState {
    /// Fixed color; the channel never advances on its own.
    Static,
    /// Fixed color until the node's hold time elapses.
    Hold,
    /// Blending toward the next node's color.
    Decay,
}

/// Drives one light channel through the live keyframe graph.
///
/// The player owns no keyframes. It carries only its current node index,
/// its phase, and a tick counter; the arena and the output slot are passed
/// in on every call, so the engine can hand all four players the same
/// freshly committed graph.
#[derive(Debug, Clone, Copy)]
pub struct ChannelPlayer {
    current: NodeId,
    state: PlayState,
    elapsed: u8,
}

impl ChannelPlayer {
    /// Creates a player parked on node 0 in the `Static` phase.
    ///
    /// Combined with an all-zero arena this is the power-on state: black
    /// output, no self-advancing.
    pub const fn new() -> Self {
        Self {
            current: NodeId::new(0),
            state: PlayState::Static,
            elapsed: 0,
        }
    }

    /// Retargets the player to `node` and writes its color immediately.
    ///
    /// The immediate write keeps the display from being one tick stale
    /// right after a commit or an automatic transition. Phase selection
    /// checks `decay_ticks` before `hold_ticks`; a node with neither is
    /// `Static` and never advances, so its `next` link is never followed.
    pub fn activate(&mut self, nodes: &[Keyframe; NODE_COUNT], node: NodeId, output: &mut Srgb<u8>) {
        let frame = &nodes[node.index()];
        self.current = node;
        self.elapsed = 0;
        self.state = if frame.decay_ticks > 0 {
            PlayState::Decay
        } else if frame.hold_ticks > 0 {
            PlayState::Hold
        } else {
            PlayState::Static
        };
        *output = frame.color;
    }

    /// Advances the channel by one tick.
    ///
    /// `Hold` leaves the output untouched until the dwell ends; `Static`
    /// never touches it at all. Only `Decay` recomputes the color.
    pub fn tick(&mut self, nodes: &[Keyframe; NODE_COUNT], output: &mut Srgb<u8>) {
        let frame = &nodes[self.current.index()];
        match self.state {
            PlayState::Static => {}
            PlayState::Hold => {
                self.elapsed += 1;
                if self.elapsed >= frame.hold_ticks {
                    if frame.decay_ticks == 0 {
                        self.activate(nodes, frame.next, output);
                    } else {
                        // Hold and decay are sequential phases of dwelling
                        // on the same node; no retargeting here.
                        self.state = PlayState::Decay;
                        self.elapsed = 0;
                    }
                }
            }
            PlayState::Decay => {
                // elapsed < decay_ticks here, so t stays in 0..=255 and the
                // divisor is nonzero (a node with decay_ticks == 0 never
                // enters this phase).
                let t = self.elapsed as u16 * 256 / frame.decay_ticks as u16;
                let target = &nodes[frame.next.index()];
                *output = blend(frame.color, target.color, t);
                self.elapsed += 1;
                if self.elapsed >= frame.decay_ticks {
                    // Landing on the destination's exact color erases any
                    // rounding drift from the interpolation.
                    self.activate(nodes, frame.next, output);
                }
            }
        }
    }

    /// The player's current phase.
    #[inline]
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// The live node the player is dwelling on.
    #[inline]
    pub fn current_node(&self) -> NodeId {
        self.current
    }
}

impl Default for ChannelPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-point linear blend, `t` in 1/256 units (0..=255).
///
/// Intermediates peak at 255 * 256, which fits u16.
#[inline]
fn blend(from: Srgb<u8>, to: Srgb<u8>, t: u16) -> Srgb<u8> {
    let inv = 256 - t;
    Srgb::new(
        ((from.red as u16 * inv + to.red as u16 * t) >> 8) as u8,
        ((from.green as u16 * inv + to.green as u16 * t) >> 8) as u8,
        ((from.blue as u16 * inv + to.blue as u16 * t) >> 8) as u8,
    )
}
