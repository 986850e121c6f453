use crate::{trie::NodeId, vocabulary::WordId};
use ::std::{io, path::PathBuf};
use thiserror::Error;

/// Malformed ARPA input. Fatal to a load, no partial model is returned.
#[derive(Error, Clone, Debug, PartialEq)]
#[error("ARPA line {line}: {kind}: {content:?}")]
pub struct ParseError {
    /// 1-based line number, 0 if the error is not tied to a line
    pub line: usize,
    /// Raw line without its terminator
    pub content: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    #[inline]
    pub(crate) fn new(line: usize, content: &str, kind: ParseErrorKind) -> Self {
        Self {
            line,
            content: content.to_owned(),
            kind,
        }
    }
}

#[derive(Error, Clone, Debug, PartialEq)]
pub enum ParseErrorKind {
    #[error("\\data\\ header not found")]
    MissingHeader,
    #[error("invalid `ngram N=count` declaration")]
    InvalidCount,
    #[error("unsupported or out of sequence n-gram order {order}")]
    UnsupportedOrder { order: usize },
    #[error("header declares no n-gram orders")]
    EmptyHeader,
    #[error("max order must be at least 1")]
    InvalidMaxOrder,
    #[error("expected the {expected}-grams section")]
    UnexpectedSection { expected: usize },
    #[error("line outside of any n-gram section")]
    UnexpectedLine,
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid log probability")]
    InvalidProbability,
    #[error("invalid backoff weight")]
    InvalidBackoff,
    #[error("{order}-grams section declares {declared} entries, found {found}")]
    CountMismatch {
        order: usize,
        declared: usize,
        found: usize,
    },
    #[error("{order}-grams section is missing")]
    MissingSection { order: usize },
    #[error("\\end\\ marker is missing")]
    MissingEnd,
    #[error("line is not valid UTF-8")]
    InvalidEncoding,
}

/// Word or node ids ran out of their 32 bit range
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapacityError {
    #[error("vocabulary exceeds {} words", WordId::MAX)]
    Words,
    #[error("trie exceeds {} nodes", NodeId::MAX)]
    Nodes,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Model file open error: {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Model read error after line {line}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("Model capacity exceeded at line {line}")]
    Capacity {
        line: usize,
        #[source]
        source: CapacityError,
    },
    #[error("Model path is not configured, set {var}")]
    MissingPath { var: &'static str },
    #[error(transparent)]
    Parse(#[from] ParseError),
}
