/// Extends a narrow wrapping wire counter into a monotonic 64-bit sequence
/// space, tolerant of reordering within a bounded window.
///
/// SCTP carries the TSN as a 32-bit field that wraps; the receiver needs a
/// totally ordered space to track gaps and duplicates across wraps. The
/// wrapper keeps a cycle count and a high-water mark: raw values far behind
/// the mark belong to the next cycle, raw values far ahead of it are stale
/// packets from the previous cycle. "Far" is [`Self::OUT_OF_ORDER_WINDOW`].
///
/// `BITS` is the width of the wire counter, so the same primitive serves the
/// 32-bit TSN and the 16-bit stream sequence number.
#[derive(Debug, Default, Clone)]
pub struct SequenceNumberWrapper<const BITS: u32> {
    cycles: u64,
    max_seq_num: u64,
    max_ext_seq_num: Option<u64>,
}

/// Wrapper for the 32-bit transmission sequence number.
pub type TsnWrapper = SequenceNumberWrapper<32>;
/// Wrapper for the 16-bit stream sequence number.
pub type SsnWrapper = SequenceNumberWrapper<16>;

impl<const BITS: u32> SequenceNumberWrapper<BITS> {
    pub const MASK: u64 = u64::MAX >> (64 - BITS);
    pub const OUT_OF_ORDER_WINDOW: u64 = Self::MASK >> (BITS / 2);

    pub fn new() -> Self {
        SequenceNumberWrapper {
            cycles: 0,
            max_seq_num: 0,
            max_ext_seq_num: None,
        }
    }

    /// Maps a raw wire value into the extended sequence space.
    ///
    /// Input must already fit the counter width.
    pub fn wrap(&mut self, seq_num: u64) -> u64 {
        debug_assert_eq!(seq_num & Self::MASK, seq_num);

        let mut seq_cycles = self.cycles;

        if self.max_ext_seq_num.is_some() {
            if seq_num < self.max_seq_num
                && self.max_seq_num - seq_num > Self::OUT_OF_ORDER_WINDOW
            {
                // the wire counter wrapped
                self.cycles += 1;
                seq_cycles = self.cycles;
            } else if seq_num > self.max_seq_num
                && seq_num - self.max_seq_num > Self::OUT_OF_ORDER_WINDOW
                && seq_cycles > 0
            {
                // stale packet from before the last wrap; before the first
                // wrap there is no previous cycle and the value is simply a
                // large forward jump in the current one
                seq_cycles -= 1;
            }
        }

        let ext_seq_num = (seq_cycles << BITS) | seq_num;

        if self
            .max_ext_seq_num
            .map_or(true, |max_ext| ext_seq_num > max_ext)
        {
            self.max_seq_num = seq_num;
            self.max_ext_seq_num = Some(ext_seq_num);
        }

        ext_seq_num
    }

    /// Masks an extended value back to the wire width.
    pub fn unwrap(&self, ext_seq_num: u64) -> u64 {
        ext_seq_num & Self::MASK
    }
}
