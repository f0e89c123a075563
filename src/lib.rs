#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Keyframe`**: one color + timing record in the animation graph; its `next` link is an
//!   arena index, so self-loops and cycles are ordinary topology
//! - **`KeyframeStore`**: the double-buffered arena of 16 keyframe slots - a staging generation
//!   the radio writes and a live generation playback reads
//! - **`ChannelPlayer`**: the per-channel state machine (`Static` / `Hold` / `Decay`) that walks
//!   the live graph and computes one channel's color with fixed-point interpolation
//! - **`LightEngine`**: ties it together - decodes frames, owns the store and the four players,
//!   and advances them once per external tick
//! - **`Command`**: a decoded control frame (`StageKeyframes` or `CommitGraph`), with host-side
//!   `encode_*` builders for the outbound direction
//! - **`LightSink`**: trait to implement for your LED hardware
//!
//! Colors are `palette::Srgb<u8>`: all interpolation is integer fixed-point, and the wire
//! carries packed RGB565 expanded through [`unpack565`].

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;

pub mod channel;
pub mod color;
pub mod engine;
pub mod keyframe;
pub mod protocol;
pub mod store;

pub use channel::{ChannelPlayer, PlayState};
pub use color::{pack565, unpack565};
pub use engine::{LightEngine, LightSink};
pub use keyframe::{Keyframe, NodeId, StagedKeyframe};
pub use protocol::{
    Command, EncodeError, FrameError, encode_commit_graph, encode_stage_keyframes,
};
pub use store::KeyframeStore;

/// Number of independent light channels on the cube.
pub const CHANNEL_COUNT: usize = 4;

/// Number of keyframe slots in each store generation.
pub const NODE_COUNT: usize = 16;

/// Keyframe slots per staging bank.
pub const BANK_SIZE: usize = 4;

/// Number of staging banks.
pub const BANK_COUNT: usize = NODE_COUNT / BANK_SIZE;

/// Byte length of the packed output intensity vector.
pub const OUTPUT_LEN: usize = CHANNEL_COUNT * 3;

/// All channels off.
pub const COLOR_OFF: Srgb<u8> = Srgb::new(0, 0, 0);
