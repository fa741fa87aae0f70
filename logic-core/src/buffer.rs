//! Ring Buffer (§4.B): bounded per-channel history plus the global sample
//! counter.

use std::collections::VecDeque;

/// 8 fixed-capacity per-channel bit histories that advance in lockstep,
/// plus the monotonic sample index (§3 `Sample Index`).
///
/// Single-writer: only the ingest task calls [`RingBuffers::append`].
/// Readers call [`RingBuffers::snapshot`] and see a consistent length for
/// that call, per §4.B's "readers may see consistent lengths only at
/// `snapshot` boundaries".
#[derive(Debug, Clone)]
pub struct RingBuffers {
    capacity: usize,
    channels: [VecDeque<bool>; 8],
    total_samples: u64,
}

impl RingBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: std::array::from_fn(|_| VecDeque::with_capacity(capacity)),
            total_samples: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Extract 8 bits from `sample` (bit *i* is channel *i+1*), push one bit
    /// per channel, evicting the oldest entry if at capacity, and advance
    /// `total_samples`.
    pub fn append(&mut self, sample: u8) {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            let bit = (sample >> i) & 1 != 0;
            if channel.len() >= self.capacity {
                channel.pop_front();
            }
            channel.push_back(bit);
        }
        self.total_samples += 1;
    }

    /// Current contents of one channel's buffer, oldest first. `channel` is
    /// 0-indexed here (channel 1 in the spec's wire convention is index 0).
    pub fn snapshot(&self, channel: usize) -> Vec<bool> {
        self.channels[channel].iter().copied().collect()
    }

    /// `min(total_samples, capacity)`, identical across all 8 channels.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Drop all contents and reset `total_samples` to 0 (§3 `Lifecycle`).
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.clear();
        }
        self.total_samples = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn buffers_stay_in_lockstep() {
        let mut buf = RingBuffers::new(4);
        for s in [0b0000_0001u8, 0b0000_0010, 0b1111_1111] {
            buf.append(s);
        }
        let lens: Vec<usize> = (0..8).map(|c| buf.snapshot(c).len()).collect();
        assert!(lens.iter().all(|&l| l == lens[0]));
    }

    #[test]
    fn len_is_min_of_total_and_capacity() {
        let mut buf = RingBuffers::new(4);
        for s in 0..10u8 {
            buf.append(s);
            assert_eq!(buf.len(), (s as usize + 1).min(4));
        }
        assert_eq!(buf.total_samples(), 10);
    }

    #[test]
    fn eviction_keeps_newest_entries() {
        // scenario 6: capacity=4, channel-0 bits 1,0,1,1,0,1 -> after 6th
        // append channel-0 buffer is [1,1,0,1], total_samples=6.
        let mut buf = RingBuffers::new(4);
        for bit in [1u8, 0, 1, 1, 0, 1] {
            buf.append(bit); // channel 0 is bit 0 of the sample byte
        }
        let want = [true, true, false, true];
        assert_eq!(buf.snapshot(0), want);
        assert_eq!(buf.total_samples(), 6);
    }

    #[test]
    fn clear_resets_state_regardless_of_history() {
        let mut a = RingBuffers::new(4);
        let mut b = RingBuffers::new(4);
        for s in [1u8, 2, 3, 4, 5, 6, 7] {
            a.append(s);
        }
        a.clear();
        for s in [9u8, 8] {
            a.append(s);
            b.append(s);
        }
        for c in 0..8 {
            assert_eq!(a.snapshot(c), b.snapshot(c));
        }
        assert_eq!(a.total_samples(), b.total_samples());
    }

    #[quickcheck_macros::quickcheck]
    fn prop_clear_then_replay_is_independent_of_prior_history(
        prefix: Vec<u8>,
        suffix: Vec<u8>,
    ) -> bool {
        let mut warmed = RingBuffers::new(16);
        for s in &prefix {
            warmed.append(*s);
        }
        warmed.clear();
        let mut fresh = RingBuffers::new(16);
        for s in &suffix {
            warmed.append(*s);
            fresh.append(*s);
        }
        (0..8).all(|c| warmed.snapshot(c) == fresh.snapshot(c))
            && warmed.total_samples() == fresh.total_samples()
    }
}
