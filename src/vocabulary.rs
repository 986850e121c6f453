use crate::error::CapacityError;
use ::std::borrow::Cow;
use ahash::AHashMap;
use compact_str::CompactString;
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{EnumCount, EnumIter, IntoStaticStr};

/// Dense word identifier, assigned in first-seen order
pub type WordId = u32;

/// Markers every ARPA model is expected to carry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[repr(usize)]
pub enum SpecialToken {
    #[strum(serialize = "<s>")]
    SentenceBegin = 0,
    #[strum(serialize = "</s>")]
    SentenceEnd = 1,
    #[strum(serialize = "<unk>")]
    Unknown = 2,
}

impl SpecialToken {
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Canonical form used for storing and comparing words: lowercase.
///
/// Borrows when the word is already canonical.
pub fn canonicalize(word: &str) -> Cow<'_, str> {
    let is_canonical = word.chars().all(|c| {
        let mut lower = c.to_lowercase();
        lower.next() == Some(c) && lower.next().is_none()
    });
    if is_canonical {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(word.to_lowercase())
    }
}

/// Bijective mapping between canonical words and [`WordId`]s.
///
/// Every lookup canonicalizes its input, so `"Para"` and `"para"` are the same word.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    ids: AHashMap<CompactString, WordId>,
    words: Vec<CompactString>,
    specials: [Option<WordId>; SpecialToken::COUNT],
}

impl Vocabulary {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `word`, allocating the next one if unseen.
    ///
    /// Fails only once every [`WordId`] is taken.
    pub fn intern(&mut self, word: &str) -> Result<WordId, CapacityError> {
        let word = canonicalize(word);
        if let Some(&id) = self.ids.get(word.as_ref()) {
            return Ok(id);
        }

        let id = next_word_id(self.words.len())?;
        let word = CompactString::from(word);
        if let Some(token) = SpecialToken::iter().find(|t| t.as_str() == word.as_str()) {
            self.specials[token as usize] = Some(id);
        }
        self.ids.insert(word.clone(), id);
        self.words.push(word);
        Ok(id)
    }

    #[inline]
    pub fn id_of(&self, word: &str) -> Option<WordId> {
        self.ids.get(canonicalize(word).as_ref()).copied()
    }

    #[inline]
    pub fn word_of(&self, id: WordId) -> Option<&str> {
        self.words.get(id as usize).map(CompactString::as_str)
    }

    #[inline]
    pub fn special(&self, token: SpecialToken) -> Option<WordId> {
        self.specials[token as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words in id order
    pub fn iter(&self) -> impl Iterator<Item = (WordId, &str)> {
        self.words
            .iter()
            .enumerate()
            .map(|(id, word)| (id as WordId, word.as_str()))
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.ids.shrink_to_fit();
        self.words.shrink_to_fit();
    }
}

#[inline]
fn next_word_id(len: usize) -> Result<WordId, CapacityError> {
    WordId::try_from(len).map_err(|_| CapacityError::Words)
}
