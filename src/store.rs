//! Double-buffered keyframe store.

use crate::keyframe::{Keyframe, NodeId, StagedKeyframe};
use crate::{BANK_COUNT, BANK_SIZE, NODE_COUNT};

/// The two-generation keyframe arena.
///
/// `staging` collects writes from the radio while `live` is the only
/// generation playback ever reads. [`commit`](Self::commit) replaces `live`
/// wholesale, so a channel player never observes a graph with some banks
/// from one generation and some from another, as long as commit and tick
/// run from the same execution context.
///
/// Nodes are never created or destroyed individually; every commit replaces
/// the entire store.
#[derive(Debug, Clone)]
pub struct KeyframeStore {
    staging: [Keyframe; NODE_COUNT],
    live: [Keyframe; NODE_COUNT],
}

impl KeyframeStore {
    /// Creates a store with both generations zeroed.
    ///
    /// The zero graph is well-defined on its own: every node is black and
    /// self-contained, so channels activated against it sit still.
    pub const fn new() -> Self {
        Self {
            staging: [Keyframe::ZERO; NODE_COUNT],
            live: [Keyframe::ZERO; NODE_COUNT],
        }
    }

    /// Writes one bank of staged keyframes.
    ///
    /// Colors and dwell times land in `staging` only; playback is unaffected
    /// until the next [`commit`](Self::commit), and restaging a bank simply
    /// overwrites the previous staged values. `next` links are not touched
    /// here - topology is supplied at commit time.
    ///
    /// `bank` is masked into range like every other wire-derived index.
    pub fn stage_bank(&mut self, bank: usize, entries: &[StagedKeyframe; BANK_SIZE]) {
        let base = (bank & (BANK_COUNT - 1)) * BANK_SIZE;
        for (slot, entry) in self.staging[base..base + BANK_SIZE].iter_mut().zip(entries) {
            slot.color = entry.color;
            slot.hold_ticks = entry.hold_ticks;
            slot.decay_ticks = entry.decay_ticks;
        }
    }

    /// Publishes `staging` into `live` and rewrites the full topology.
    ///
    /// The copy is wholesale, not incremental; there is no way to publish a
    /// subset of the graph.
    pub fn commit(&mut self, next_map: &[NodeId; NODE_COUNT]) {
        self.live = self.staging;
        for (node, &next) in self.live.iter_mut().zip(next_map) {
            node.next = next;
        }
    }

    /// The generation playback reads.
    #[inline]
    pub fn live(&self) -> &[Keyframe; NODE_COUNT] {
        &self.live
    }

    /// The generation the radio writes into.
    #[inline]
    pub fn staging(&self) -> &[Keyframe; NODE_COUNT] {
        &self.staging
    }
}

impl Default for KeyframeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::unpack565;

    fn entries(seed: u8) -> [StagedKeyframe; BANK_SIZE] {
        core::array::from_fn(|i| {
            StagedKeyframe::new(unpack565(0x001F), seed + i as u8, seed + i as u8 + 1)
        })
    }

    #[test]
    fn staging_leaves_live_untouched() {
        let mut store = KeyframeStore::new();
        store.stage_bank(0, &entries(1));
        store.stage_bank(3, &entries(9));
        assert_eq!(store.live(), &[Keyframe::ZERO; NODE_COUNT]);
    }

    #[test]
    fn restaging_a_bank_overwrites_previous_values() {
        let mut store = KeyframeStore::new();
        store.stage_bank(1, &entries(1));
        store.stage_bank(1, &entries(40));
        assert_eq!(store.staging()[4].hold_ticks, 40);
        assert_eq!(store.staging()[7].hold_ticks, 43);
    }

    #[test]
    fn commit_copies_staging_and_applies_topology() {
        let mut store = KeyframeStore::new();
        store.stage_bank(2, &entries(5));

        let next_map: [NodeId; NODE_COUNT] = core::array::from_fn(|k| NodeId::new(k as u8 + 1));
        store.commit(&next_map);

        let live = store.live();
        assert_eq!(live[8].hold_ticks, 5);
        assert_eq!(live[8].decay_ticks, 6);
        assert_eq!(live[8].color, unpack565(0x001F));
        for k in 0..NODE_COUNT {
            assert_eq!(live[k].next, NodeId::new(k as u8 + 1));
        }
    }

    #[test]
    fn bank_index_is_masked_into_range() {
        let mut store = KeyframeStore::new();
        // Bank 5 wraps to bank 1 (slots 4..8).
        store.stage_bank(5, &entries(7));
        assert_eq!(store.staging()[4].hold_ticks, 7);
    }
}
