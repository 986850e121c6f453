use super::{source, Model};
use crate::{
    arpa::{ArpaReader, ParseMode},
    error::LoadError,
    trie::Trie,
    vocabulary::Vocabulary,
};
use ::std::{env, io::BufRead, path::Path};

/// Environment variable read by [`ModelLoader::load_from_env`]
pub const MODEL_PATH_VAR: &str = "NGRAM_TRIE_ARPA";

/// Builds a [`Model`] from ARPA input.
///
/// ```rust
/// use ngram_trie::ModelLoader;
///
/// let text = "\\data\\\nngram 1=2\n\n\\1-grams:\n-0.5\tque\n-0.7\tos\n\n\\end\\\n";
/// let model = ModelLoader::new().max_order(3).load_str(text).unwrap();
/// assert_eq!(model.predict::<&str>(&[], 1), ["que"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ModelLoader {
    pub(super) max_order: Option<usize>,
    pub(super) mode: ParseMode,
}

impl ModelLoader {
    /// Reads every declared order, aborts on the first malformed line
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the orders read, higher sections are skipped
    #[inline]
    pub fn max_order(mut self, max_order: usize) -> Self {
        self.max_order = Some(max_order);
        self
    }

    #[inline]
    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Skip malformed n-gram lines instead of failing
    #[inline]
    pub fn lenient(self) -> Self {
        self.parse_mode(ParseMode::Lenient)
    }

    pub fn load_reader<R: BufRead>(&self, reader: R) -> Result<Model, LoadError> {
        let mut vocabulary = Vocabulary::new();
        let mut trie = Trie::new();
        let mut duplicates = 0usize;

        let mut arpa = ArpaReader::new(reader, &mut vocabulary, self.max_order, self.mode)?;
        let max_order = arpa.max_order();
        tracing::info!(
            "Loading {max_order}-gram model, declared counts {:?}",
            arpa.header().counts
        );

        for record in &mut arpa {
            let record = record?;
            // case variants of the same n-gram collapse, the most probable one is kept
            if let Some(existing) = trie.lookup_exact(&record.words) {
                duplicates += 1;
                tracing::debug!(
                    "Duplicate {}-gram at line {}, keeping log probability {}",
                    record.order(),
                    record.line,
                    existing.logprob.max(record.logprob)
                );
                if existing.logprob >= record.logprob {
                    continue;
                }
            }
            trie.insert(&record.words, record.logprob, record.backoff)
                .map_err(|source| LoadError::Capacity {
                    line: record.line,
                    source,
                })?;
        }
        drop(arpa);

        vocabulary.shrink_to_fit();
        trie.shrink_to_fit();

        let model = Model {
            vocabulary,
            trie,
            max_order,
        };
        tracing::info!(
            "Model loaded: {} words, n-grams {:?}, {duplicates} duplicates, {} implicit nodes",
            model.vocabulary.len(),
            model.trie.counts(),
            model.trie.implicit_nodes()
        );

        Ok(model)
    }

    #[inline]
    pub fn load_str(&self, text: &str) -> Result<Model, LoadError> {
        self.load_reader(text.as_bytes())
    }

    /// Loads a plain or brotli compressed (`.br`) ARPA file
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Model, LoadError> {
        let path = path.as_ref();
        tracing::info!("Reading ARPA model {path:?}");
        self.load_reader(source::open(path)?)
    }

    /// Loads the file named by [`MODEL_PATH_VAR`]
    pub fn load_from_env(&self) -> Result<Model, LoadError> {
        let path = env::var_os(MODEL_PATH_VAR).ok_or(LoadError::MissingPath {
            var: MODEL_PATH_VAR,
        })?;
        self.load_path(path)
    }
}
