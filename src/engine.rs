//! The playback engine: frame dispatch, double-buffered store, channel
//! players, and the tick driver.

use palette::Srgb;

use crate::channel::{ChannelPlayer, PlayState};
use crate::keyframe::NodeId;
use crate::protocol::Command;
use crate::store::KeyframeStore;
use crate::{CHANNEL_COUNT, COLOR_OFF, OUTPUT_LEN};

/// Hardware seam for pushing the computed intensity vector to an LED
/// driver.
///
/// Implement this for your LED/PWM hardware and call
/// [`LightEngine::flush`] after each tick, or skip the trait entirely and
/// poll [`LightEngine::output`] at the driver's own cadence - each
/// channel's three bytes are always written together, so the latest value
/// is always a consistent color and no output-side double buffering is
/// needed.
pub trait LightSink {
    /// Receives the current color of every channel.
    fn set_channels(&mut self, channels: &[Srgb<u8>; CHANNEL_COUNT]);
}

/// The cube's light-animation playback engine.
///
/// Owns the double-buffered keyframe store, one [`ChannelPlayer`] per
/// light channel, and the output intensity vector. Feed inbound radio
/// frames to [`handle_frame`](Self::handle_frame) and clock playback with
/// [`tick`](Self::tick) once per fixed time step.
///
/// All storage is fixed-capacity and allocated up front; no operation
/// blocks, suspends, or can be cancelled part-way.
///
/// The engine is single-threaded and non-reentrant: `&mut self` on both
/// entry points keeps a commit's wholesale store replacement from
/// interleaving with a tick. On a preemptible target, wrap the calls in a
/// critical section - the store copy itself is not atomic.
#[derive(Debug, Clone)]
pub struct LightEngine {
    store: KeyframeStore,
    channels: [ChannelPlayer; CHANNEL_COUNT],
    output: [Srgb<u8>; CHANNEL_COUNT],
}

impl LightEngine {
    /// Creates an engine in the power-on state.
    ///
    /// The store is all zeroes and every channel is activated on the
    /// self-looping zero node, so playback is well-defined (static black)
    /// before the first commit arrives.
    pub fn new() -> Self {
        let mut engine = Self {
            store: KeyframeStore::new(),
            channels: [ChannelPlayer::new(); CHANNEL_COUNT],
            output: [COLOR_OFF; CHANNEL_COUNT],
        };
        for c in 0..CHANNEL_COUNT {
            engine.activate(c, NodeId::new(0));
        }
        engine
    }

    /// Decodes and applies one inbound frame.
    ///
    /// Malformed frames - unknown tag, missing payload bytes - are dropped
    /// without a response; the radio link has no error channel for this
    /// message class.
    pub fn handle_frame(&mut self, frame: &[u8]) {
        if let Ok(command) = Command::parse(frame) {
            self.apply(command);
        }
    }

    /// Applies a decoded command.
    ///
    /// Staging touches only the staging generation and has no visible
    /// effect. A commit publishes the staged graph, rewrites the topology,
    /// and restarts every channel on its start node; it runs to completion
    /// before this method returns.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::StageKeyframes { bank, entries } => {
                self.store.stage_bank(bank, &entries);
            }
            Command::CommitGraph { initial, next_map } => {
                self.store.commit(&next_map);
                for (c, &node) in initial.iter().enumerate() {
                    self.activate(c, node);
                }
            }
        }
    }

    /// Advances playback by one tick.
    ///
    /// Channels run in fixed order 0..[`CHANNEL_COUNT`]. They are fully
    /// independent, so the order only determines output write order.
    pub fn tick(&mut self) {
        for (player, out) in self.channels.iter_mut().zip(self.output.iter_mut()) {
            player.tick(self.store.live(), out);
        }
    }

    /// The current intensity vector, one color per channel.
    #[inline]
    pub fn output(&self) -> &[Srgb<u8>; CHANNEL_COUNT] {
        &self.output
    }

    /// Serializes the intensity vector as R, G, B bytes per channel.
    pub fn write_output(&self, buf: &mut [u8; OUTPUT_LEN]) {
        for (chunk, color) in buf.chunks_exact_mut(3).zip(&self.output) {
            chunk[0] = color.red;
            chunk[1] = color.green;
            chunk[2] = color.blue;
        }
    }

    /// Pushes the intensity vector to a hardware sink.
    pub fn flush<S: LightSink>(&self, sink: &mut S) {
        sink.set_channels(&self.output);
    }

    /// Playback phase of one channel.
    ///
    /// # Panics
    /// Panics if `channel >= CHANNEL_COUNT`.
    pub fn channel_state(&self, channel: usize) -> PlayState {
        self.channels[channel].state()
    }

    /// The live node a channel is currently dwelling on.
    ///
    /// # Panics
    /// Panics if `channel >= CHANNEL_COUNT`.
    pub fn channel_node(&self, channel: usize) -> NodeId {
        self.channels[channel].current_node()
    }

    fn activate(&mut self, channel: usize, node: NodeId) {
        self.channels[channel].activate(self.store.live(), node, &mut self.output[channel]);
    }
}

impl Default for LightEngine {
    fn default() -> Self {
        Self::new()
    }
}
