use crate::vocabulary::WordId;
use arrayvec::ArrayVec;

/// Highest n-gram order a model may declare
pub const NGRAM_MAX_ORDER: usize = 12;

/// Word ids of one n-gram, oldest word first
pub type NgramIds = ArrayVec<WordId, NGRAM_MAX_ORDER>;

#[inline]
pub(crate) fn is_supported_order(order: usize) -> bool {
    (1..=NGRAM_MAX_ORDER).contains(&order)
}
