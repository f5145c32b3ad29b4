use serde::{Deserialize, Serialize};

const WORD_BITS: usize = u64::BITS as usize;

/// Per-proposal approval bitset, indexed by guardian registry position.
///
/// Supports membership tests and insertion only; an approval once recorded
/// is never removed from a committed proposal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalSet {
    words: Vec<u64>,
}

impl ApprovalSet {
    /// An empty set able to hold `guardian_count` positions without growing.
    pub fn with_guardians(guardian_count: usize) -> Self {
        Self {
            words: vec![0; guardian_count.div_ceil(WORD_BITS)],
        }
    }

    /// Record approval for the guardian at `index`.
    ///
    /// Returns `false` if that guardian had already approved.
    pub fn insert(&mut self, index: usize) -> bool {
        let (word, bit) = (index / WORD_BITS, index % WORD_BITS);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let mask = 1u64 << bit;
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }

    pub fn contains(&self, index: usize) -> bool {
        let (word, bit) = (index / WORD_BITS, index % WORD_BITS);
        self.words
            .get(word)
            .is_some_and(|w| w & (1u64 << bit) != 0)
    }

    /// Number of distinct approvals.
    pub fn len(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Approving guardian positions in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| w * WORD_BITS + bit)
        })
    }
}
