use crate::{
    error::LoadError,
    trie::Trie,
    vocabulary::{Vocabulary, WordId},
};
use ::std::path::Path;

mod loader;
mod predictor;
mod source;

pub use loader::{ModelLoader, MODEL_PATH_VAR};
pub use predictor::Predictor;

/// Loaded n-gram model, immutable after loading.
///
/// Queries take `&self` and can run from many threads at once.
#[derive(Clone, Debug)]
pub struct Model {
    pub(super) vocabulary: Vocabulary,
    pub(super) trie: Trie,
    pub(super) max_order: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelStats {
    pub max_order: usize,
    pub vocabulary_size: usize,
    /// Stored n-grams per order, index 0 for unigrams
    pub ngram_counts: Vec<usize>,
    /// Nodes created for n-grams missing from the source
    pub implicit_nodes: usize,
}

impl Model {
    /// Loads a model from ARPA text, `max_order` caps the orders read
    pub fn from_arpa_str(text: &str, max_order: Option<usize>) -> Result<Self, LoadError> {
        loader_with(max_order).load_str(text)
    }

    #[inline]
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    #[inline]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[inline]
    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    /// Case insensitive word lookup
    #[inline]
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.vocabulary.id_of(word)
    }

    #[inline]
    pub fn word(&self, id: WordId) -> Option<&str> {
        self.vocabulary.word_of(id)
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            max_order: self.max_order,
            vocabulary_size: self.vocabulary.len(),
            ngram_counts: self.trie.counts().to_vec(),
            implicit_nodes: self.trie.implicit_nodes(),
        }
    }

    #[inline]
    pub fn predictor(&self) -> Predictor<'_> {
        Predictor::new(&self.trie, &self.vocabulary, self.max_order)
    }

    /// Top `k` next words for `context` (oldest word first), most probable first.
    ///
    /// Returns fewer than `k` words only if the model has fewer candidates.
    #[inline]
    pub fn predict<S: AsRef<str>>(&self, context: &[S], k: usize) -> Vec<&str> {
        self.predictor().predict(context, k)
    }

    /// Number of most recent context words the model knows as a context
    #[inline]
    pub fn longest_context<S: AsRef<str>>(&self, context: &[S]) -> usize {
        self.predictor().longest_context(context)
    }

    /// [`Model::predict`] for many contexts, in parallel where available
    pub fn predict_batch<C, S>(&self, contexts: &[C], k: usize) -> Vec<Vec<&str>>
    where
        C: AsRef<[S]> + Sync,
        S: AsRef<str> + Sync,
    {
        let predictor = self.predictor();

        #[cfg(not(target_family = "wasm"))]
        {
            use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
            contexts
                .par_iter()
                .map(|context| predictor.predict(context.as_ref(), k))
                .collect()
        }
        #[cfg(target_family = "wasm")]
        {
            contexts
                .iter()
                .map(|context| predictor.predict(context.as_ref(), k))
                .collect()
        }
    }
}

#[inline]
fn loader_with(max_order: Option<usize>) -> ModelLoader {
    ModelLoader {
        max_order,
        ..Default::default()
    }
}

/// Loads an ARPA file, `max_order` caps the orders read
pub fn load_model(path: impl AsRef<Path>, max_order: Option<usize>) -> Result<Model, LoadError> {
    loader_with(max_order).load_path(path)
}
