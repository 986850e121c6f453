//! # Trie-based n-gram language model
//!
//! Loads a backoff language model in ARPA format (orders 1 to 12) and predicts
//! the most probable next words for a context.
//!
//! Words are case insensitive, both in the model and in queries.
//! Prediction uses Katz backoff: when the full context is unknown,
//! shorter contexts are tried, paying their backoff weights.
//!
//! # Example
//! ```rust
//! use ngram_trie::Model;
//!
//! let arpa = "\\data\\
//! ngram 1=3
//! ngram 2=2
//!
//! \\1-grams:
//! -1.2\tque\t-0.3
//! -1.4\tos\t-0.2
//! -1.6\tmais
//!
//! \\2-grams:
//! -0.6\tque os
//! -0.9\tque mais
//!
//! \\end\\
//! ";
//! let model = Model::from_arpa_str(arpa, None).unwrap();
//!
//! // single thread
//! assert_eq!(model.predict(&["Que"], 2), ["os", "mais"]);
//!
//! // or multithreaded
//! let contexts = [vec!["que"], vec![]];
//! let results = model.predict_batch(&contexts, 1);
//! assert_eq!(results, [["os"], ["que"]]);
//! ```
//! Files are read with [`load_model`] or configured with [`ModelLoader`].

mod arpa;
mod error;
mod model;
mod ngram;
mod trie;
mod vocabulary;

pub use arpa::{ArpaHeader, ArpaReader, NgramRecord, ParseMode};
pub use error::{CapacityError, LoadError, ParseError, ParseErrorKind};
pub use model::{load_model, Model, ModelLoader, ModelStats, Predictor, MODEL_PATH_VAR};
pub use ngram::{NgramIds, NGRAM_MAX_ORDER};
pub use trie::{NgramEntry, NodeId, Trie};
pub use vocabulary::{canonicalize, SpecialToken, Vocabulary, WordId};
