use crate::{
    trie::{NodeId, Trie, ROOT},
    vocabulary::{SpecialToken, Vocabulary, WordId},
};
use ::core::cmp::Ordering;
use itertools::Itertools;
use rustc_hash::FxHashSet;

/// Next word predictor over a loaded model.
///
/// Read only, can be shared between threads.
#[derive(Clone, Copy, Debug)]
pub struct Predictor<'m> {
    trie: &'m Trie,
    vocabulary: &'m Vocabulary,
    max_order: usize,
}

impl<'m> Predictor<'m> {
    #[inline]
    pub(super) fn new(trie: &'m Trie, vocabulary: &'m Vocabulary, max_order: usize) -> Self {
        Self {
            trie,
            vocabulary,
            max_order,
        }
    }

    /// Most recent words that can affect a prediction
    #[inline]
    fn truncate<'c, S>(&self, context: &'c [S]) -> &'c [S] {
        let keep = self.max_order.saturating_sub(1);
        &context[context.len().saturating_sub(keep)..]
    }

    /// Node of the longest stored suffix of the context
    fn context_node<S: AsRef<str>>(&self, context: &[S]) -> NodeId {
        let unknown = self.vocabulary.special(SpecialToken::Unknown);
        self.truncate(context)
            .iter()
            .fold(ROOT, |node, word| {
                match self.vocabulary.id_of(word.as_ref()).or(unknown) {
                    Some(id) => self.trie.advance(node, id),
                    // no `<unk>` in the model, older words are unusable
                    None => ROOT,
                }
            })
    }

    /// Number of most recent context words forming a stored context
    pub fn longest_context<S: AsRef<str>>(&self, context: &[S]) -> usize {
        self.trie.node(self.context_node(context)).depth as usize
    }

    /// Top `k` next word ids with their effective log10 probabilities,
    /// ordered by probability descending, then by word id
    pub fn predict_ids<S: AsRef<str>>(&self, context: &[S], k: usize) -> Vec<(WordId, f32)> {
        if k == 0 {
            return Vec::new();
        }

        let mut node = self.context_node(context);

        // Katz backoff: a candidate first seen under a shorter context pays
        // the backoff weights of every longer context walked through.
        let mut seen = FxHashSet::default();
        let mut candidates = Vec::new();
        let mut backoff = 0.0f32;
        while node != ROOT {
            for (word, logprob) in self.trie.stored_children(node) {
                if seen.insert(word) {
                    candidates.push((word, backoff + logprob));
                }
            }
            let current = self.trie.node(node);
            backoff += current.backoff_or_neutral();
            node = current.suffix;
        }

        let unigrams = self
            .trie
            .stored_children(ROOT)
            .filter(|(word, _)| !seen.contains(word))
            .map(|(word, logprob)| (word, backoff + logprob));

        candidates
            .into_iter()
            .chain(unigrams)
            .k_smallest_by(k, order_by_logprob_and_id)
            .collect()
    }

    /// Top `k` next words with their effective log10 probabilities
    pub fn predict_scored<S: AsRef<str>>(&self, context: &[S], k: usize) -> Vec<(&'m str, f32)> {
        let vocabulary = self.vocabulary;
        self.predict_ids(context, k)
            .into_iter()
            .filter_map(|(id, logprob)| vocabulary.word_of(id).map(|w| (w, logprob)))
            .collect()
    }

    /// Top `k` next words, most probable first
    pub fn predict<S: AsRef<str>>(&self, context: &[S], k: usize) -> Vec<&'m str> {
        let vocabulary = self.vocabulary;
        self.predict_ids(context, k)
            .into_iter()
            .filter_map(|(id, _)| vocabulary.word_of(id))
            .collect()
    }
}

#[inline]
fn order_by_logprob_and_id(first: &(WordId, f32), second: &(WordId, f32)) -> Ordering {
    second
        .1
        .total_cmp(&first.1)
        .then_with(|| first.0.cmp(&second.0))
}
