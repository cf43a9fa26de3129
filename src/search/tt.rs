use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    consts::{MATE_THRESHOLD, MAX_HASH_MB},
    moves::Move,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreFlag {
    /// Exact evaluation, alpha < score < beta
    Exact,
    /// Score is at least this value (beta cutoff)
    LowerBound,
    /// Score is at most this value (alpha never raised)
    UpperBound,
}

impl ScoreFlag {
    const fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            1 => ScoreFlag::LowerBound,
            2 => ScoreFlag::UpperBound,
            _ => ScoreFlag::Exact,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: u64,
    pub depth: u8,
    pub flag: ScoreFlag,
    pub score: i32,
    pub best_move: Move,
}

impl Entry {
    pub const fn new(key: u64, depth: u8, flag: ScoreFlag, score: i32, best_move: Move) -> Self {
        Self {
            key,
            depth,
            flag,
            score,
            best_move,
        }
    }

    /// The caller-side hash-collision guard: a probed entry is only
    /// trustworthy when its key matches the probing position
    #[inline(always)]
    pub const fn matches(&self, key: u64) -> bool {
        self.key == key
    }
}

const MOVE_BITS: u64 = 0x3FFFF; // 18 bits of packed move

#[inline(always)]
const fn pack(entry: &Entry) -> u64 {
    (entry.best_move.data() as u64 & MOVE_BITS)
        | ((entry.flag as u64) << 18)
        | ((entry.depth as u64) << 20)
        | ((entry.score as u32 as u64) << 32)
}

#[inline(always)]
const fn unpack(key: u64, data: u64) -> Entry {
    Entry {
        key,
        depth: ((data >> 20) & 0xFF) as u8,
        flag: ScoreFlag::from_bits(data >> 18),
        score: (data >> 32) as u32 as i32,
        best_move: Move::from_data((data & MOVE_BITS) as u32),
    }
}

/// One lock-free slot. `key` holds the position key XORed with the packed
/// data, so a torn read under concurrent writes decodes to a key that fails
/// the caller's match check instead of being silently trusted.
#[derive(Debug, Default)]
struct Slot {
    key: AtomicU64,
    data: AtomicU64,
}

/// Fixed-capacity shared cache of search results, addressed by position key.
/// All accesses are relaxed atomics; correctness under races rests entirely
/// on the key-validation check the callers perform.
#[derive(Debug)]
pub struct TranspositionTable {
    slots: Box<[Slot]>,
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(16)
    }
}

impl TranspositionTable {
    pub fn new(mb_size: usize) -> Self {
        // Round down to a power of two so the mask trick works and the
        // allocation never exceeds the requested size
        let max_entries = (mb_size * 1024 * 1024) / std::mem::size_of::<Slot>();
        let size = 1usize << max_entries.max(1).ilog2();
        let slots = (0..size).map(|_| Slot::default()).collect();
        Self { slots }
    }

    pub fn resize(&mut self, mb_size: usize) -> miette::Result<()> {
        miette::ensure!(
            (1..=MAX_HASH_MB).contains(&mb_size),
            "hash size must be between 1 and {MAX_HASH_MB} MB, got {mb_size}"
        );
        *self = Self::new(mb_size);
        Ok(())
    }

    pub fn clear(&mut self) {
        for slot in &*self.slots {
            slot.key.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
    }

    #[inline(always)]
    fn index(&self, key: u64) -> usize {
        key as usize & (self.slots.len() - 1)
    }

    /// Decodes the slot this key maps to. The caller must check
    /// `entry.matches(key)` before trusting anything in it; an unrelated
    /// position may occupy the same slot.
    #[inline]
    pub fn probe(&self, key: u64) -> Entry {
        let slot = &self.slots[self.index(key)];
        let data = slot.data.load(Ordering::Relaxed);
        let stored_key = slot.key.load(Ordering::Relaxed) ^ data;
        unpack(stored_key, data)
    }

    /// Stores a result, converting mate scores to ply-independent form.
    /// Replacement is depth-preferred: shallower results never evict a
    /// deeper entry for a different position.
    pub fn save(&self, entry: &Entry, ply: usize) {
        let slot = &self.slots[self.index(entry.key)];
        let old_data = slot.data.load(Ordering::Relaxed);
        let old = unpack(slot.key.load(Ordering::Relaxed) ^ old_data, old_data);

        if old_data != 0 && !old.matches(entry.key) && entry.depth < old.depth {
            return;
        }

        let mut to_store = *entry;
        to_store.score = Self::score_to_tt(entry.score, ply);
        let data = pack(&to_store);
        slot.key.store(entry.key ^ data, Ordering::Relaxed);
        slot.data.store(data, Ordering::Relaxed);
    }

    /// Memory-latency hint issued ahead of a probe; no observable effect
    #[inline(always)]
    pub fn prefetch(&self, key: u64) {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            use std::arch::x86_64::{_MM_HINT_T0, _mm_prefetch};
            let slot = &self.slots[self.index(key)];
            _mm_prefetch((slot as *const Slot).cast(), _MM_HINT_T0);
        }
        #[cfg(not(target_arch = "x86_64"))]
        let _ = key;
    }

    /// Mate-distance translation, store direction: a score relative to the
    /// root becomes relative to the storing node. This pair of functions is
    /// the only home of this logic.
    #[inline(always)]
    pub fn score_to_tt(score: i32, ply: usize) -> i32 {
        if score >= MATE_THRESHOLD {
            score + ply as i32
        } else if score <= -MATE_THRESHOLD {
            score - ply as i32
        } else {
            score
        }
    }

    /// Mate-distance translation, probe direction: re-anchors a stored mate
    /// score to the probing node's distance from the root
    #[inline(always)]
    pub fn score_from_tt(score: i32, ply: usize) -> i32 {
        if score >= MATE_THRESHOLD {
            score - ply as i32
        } else if score <= -MATE_THRESHOLD {
            score + ply as i32
        } else {
            score
        }
    }

    /// Occupancy estimate in per-mille, sampled from a slot prefix
    pub fn hash_full(&self) -> u16 {
        let sample = self.slots.len().min(1000);
        let used = self.slots[..sample]
            .iter()
            .filter(|s| s.data.load(Ordering::Relaxed) != 0)
            .count();
        (used * 1000 / sample) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{board::components::Piece, consts::MATE_SCORE};

    fn entry(key: u64, depth: u8, score: i32) -> Entry {
        Entry::new(
            key,
            depth,
            ScoreFlag::Exact,
            score,
            Move::new(12, 28, Piece::Pawn),
        )
    }

    #[test]
    fn save_probe_round_trip() {
        let tt = TranspositionTable::new(1);
        let stored = Entry::new(
            0xDEADBEEF,
            7,
            ScoreFlag::LowerBound,
            -342,
            Move::new_promotion(48, 56, Piece::Pawn, Piece::Queen),
        );
        tt.save(&stored, 0);

        let probed = tt.probe(0xDEADBEEF);
        assert!(probed.matches(0xDEADBEEF));
        assert_eq!(probed, stored);
    }

    #[test]
    fn colliding_key_is_never_misreported_as_hit() {
        let mut tt = TranspositionTable::new(1);
        tt.resize(1).unwrap();
        let key = 0x1234u64;
        tt.save(&entry(key, 5, 100), 0);

        // Same slot, different position
        let colliding = key + (1u64 << 40);
        let probed = tt.probe(colliding);
        assert!(!probed.matches(colliding));
        assert!(tt.probe(key).matches(key));
    }

    #[test]
    fn empty_probe_misses() {
        let tt = TranspositionTable::new(1);
        assert!(!tt.probe(0xABCDEF).matches(0xABCDEF));
    }

    #[test]
    fn mate_scores_round_trip_at_equal_ply() {
        for ply in [0usize, 3, 10] {
            for score in [MATE_SCORE - 5, -(MATE_SCORE - 5), 120, -120] {
                let stored = TranspositionTable::score_to_tt(score, ply);
                assert_eq!(TranspositionTable::score_from_tt(stored, ply), score);
            }
        }
    }

    #[test]
    fn mate_scores_shift_by_ply_delta() {
        // A mate found 5 plies deep, probed 2 plies after storing, must
        // look 3 plies closer
        let found = MATE_SCORE - 5;
        let stored = TranspositionTable::score_to_tt(found, 5);
        assert_eq!(TranspositionTable::score_from_tt(stored, 2), MATE_SCORE - 2);

        let non_mate = 245;
        let stored = TranspositionTable::score_to_tt(non_mate, 5);
        assert_eq!(TranspositionTable::score_from_tt(stored, 2), non_mate);
    }

    #[test]
    fn shallow_entries_do_not_evict_deeper_collisions() {
        let tt = TranspositionTable::new(1);
        let key = 0x42u64;
        let colliding = key + (1u64 << 41);

        tt.save(&entry(key, 10, 50), 0);
        tt.save(&entry(colliding, 3, 60), 0);
        assert!(tt.probe(key).matches(key));

        // A deeper colliding result does replace
        tt.save(&entry(colliding, 12, 60), 0);
        assert!(tt.probe(colliding).matches(colliding));
    }

    #[test]
    fn same_key_always_replaces() {
        let tt = TranspositionTable::new(1);
        let key = 0x99u64;
        tt.save(&entry(key, 10, 50), 0);
        tt.save(&entry(key, 2, 75), 0);
        let probed = tt.probe(key);
        assert_eq!(probed.depth, 2);
        assert_eq!(probed.score, 75);
    }

    #[test]
    fn clear_zeroes_everything() {
        let mut tt = TranspositionTable::new(1);
        tt.save(&entry(0x1111, 4, 9), 0);
        assert!(tt.hash_full() > 0);
        tt.clear();
        assert_eq!(tt.hash_full(), 0);
        assert!(!tt.probe(0x1111).matches(0x1111));
    }

    #[test]
    fn resize_bounds_are_enforced() {
        let mut tt = TranspositionTable::default();
        assert!(tt.resize(0).is_err());
        assert!(tt.resize(MAX_HASH_MB + 1).is_err());
        assert!(tt.resize(4).is_ok());
    }

    #[test]
    fn sizing_never_exceeds_the_requested_megabytes() {
        for mb in [1, 3, 16, 24] {
            let tt = TranspositionTable::new(mb);
            assert!(tt.slots.len().is_power_of_two());
            assert!(tt.slots.len() * std::mem::size_of::<Slot>() <= mb * 1024 * 1024);
        }
        // A power-of-two request fills its allocation exactly
        let tt = TranspositionTable::new(16);
        assert_eq!(tt.slots.len() * std::mem::size_of::<Slot>(), 16 * 1024 * 1024);
    }
}
