//! Lazy reader of ARPA n-gram models
//!
//! ```text
//! \data\
//! ngram 1=<count>
//! ngram 2=<count>
//!
//! \1-grams:
//! <log10 prob>\t<word>\t<log10 backoff>
//!
//! \2-grams:
//! <log10 prob>\t<word> <word>
//!
//! \end\
//! ```

use crate::{
    error::{LoadError, ParseError, ParseErrorKind},
    ngram::{is_supported_order, NgramIds, NGRAM_MAX_ORDER},
    vocabulary::Vocabulary,
};
use ::std::{io::BufRead, str};
use arrayvec::ArrayVec;

const DATA_MARKER: &str = "\\data\\";
const END_MARKER: &str = "\\end\\";
const SUSPICIOUS_WORD_LEN: usize = 46;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Abort on the first malformed line
    #[default]
    Strict,
    /// Log and skip malformed n-gram lines, tolerate count mismatches
    Lenient,
}

/// Declared n-gram counts, index 0 holds the unigram count
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArpaHeader {
    pub counts: Vec<usize>,
}

impl ArpaHeader {
    #[inline]
    pub fn order(&self) -> usize {
        self.counts.len()
    }

    /// Parses `ngram N=count`
    fn parse_count(text: &str) -> Result<(usize, usize), ParseErrorKind> {
        let rest = text
            .strip_prefix("ngram")
            .ok_or(ParseErrorKind::InvalidCount)?
            .trim_start()
            .as_bytes();
        let (order, len): (usize, usize) =
            atoi_simd::parse_any(rest).map_err(|_| ParseErrorKind::InvalidCount)?;

        if rest.get(len) != Some(&b'=') {
            return Err(ParseErrorKind::InvalidCount);
        }

        let count: usize = atoi_simd::parse(rest[(len + 1)..].trim_ascii())
            .map_err(|_| ParseErrorKind::InvalidCount)?;

        Ok((order, count))
    }
}

/// One n-gram entry of a section
#[derive(Clone, Debug, PartialEq)]
pub struct NgramRecord {
    /// 1-based source line
    pub line: usize,
    pub words: NgramIds,
    pub logprob: f32,
    pub backoff: Option<f32>,
}

impl NgramRecord {
    #[inline]
    pub fn order(&self) -> usize {
        self.words.len()
    }
}

/// Single pass reader yielding [`NgramRecord`]s section by section.
///
/// Words are interned into the vocabulary in file order.
/// Sections above [`ArpaReader::max_order`] are not read.
pub struct ArpaReader<'v, R> {
    reader: R,
    vocabulary: &'v mut Vocabulary,
    mode: ParseMode,
    header: ArpaHeader,
    max_order: usize,
    bytes: Vec<u8>,
    /// current line without its terminator, lossy if not valid UTF-8
    buf: String,
    invalid_encoding: bool,
    line: usize,
    /// line already in `buf`, to be processed before reading another
    replay: bool,
    /// current section order, 0 before the first one
    order: usize,
    section_found: usize,
    done: bool,
}

impl<'v, R: BufRead> ArpaReader<'v, R> {
    /// Reads the header. `max_order` caps the orders read, `None` reads all
    pub fn new(
        reader: R,
        vocabulary: &'v mut Vocabulary,
        max_order: Option<usize>,
        mode: ParseMode,
    ) -> Result<Self, LoadError> {
        let mut arpa = Self {
            reader,
            vocabulary,
            mode,
            header: ArpaHeader::default(),
            max_order: 0,
            bytes: Vec::new(),
            buf: String::new(),
            invalid_encoding: false,
            line: 0,
            replay: false,
            order: 0,
            section_found: 0,
            done: false,
        };

        if max_order == Some(0) {
            return Err(arpa.error(ParseErrorKind::InvalidMaxOrder).into());
        }

        arpa.read_header()?;
        let declared = arpa.header.order();
        arpa.max_order = max_order.map_or(declared, |m| m.min(declared));
        if arpa.max_order < declared {
            tracing::debug!(
                "Reading {} of {declared} declared orders",
                arpa.max_order
            );
        }

        Ok(arpa)
    }

    #[inline]
    pub fn header(&self) -> &ArpaHeader {
        &self.header
    }

    /// Highest order yielded
    #[inline]
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Returns false on EOF
    fn read_line(&mut self) -> Result<bool, LoadError> {
        if self.replay {
            self.replay = false;
            return Ok(true);
        }

        self.bytes.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.bytes)
            .map_err(|source| LoadError::Read {
                line: self.line,
                source,
            })?;
        if read == 0 {
            return Ok(false);
        }

        self.line += 1;
        let mut bytes = self.bytes.as_slice();
        while let [rest @ .., b'\n' | b'\r'] = bytes {
            bytes = rest;
        }
        if self.line == 1 {
            bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        }

        self.buf.clear();
        match str::from_utf8(bytes) {
            Ok(text) => {
                self.buf.push_str(text);
                self.invalid_encoding = false;
            }
            Err(_) => {
                self.buf.push_str(&String::from_utf8_lossy(bytes));
                self.invalid_encoding = true;
            }
        }
        Ok(true)
    }

    #[inline]
    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.line, &self.buf, kind)
    }

    fn read_header(&mut self) -> Result<(), LoadError> {
        loop {
            if !self.read_line()? {
                return Err(self.error(ParseErrorKind::MissingHeader).into());
            }
            if self.buf.trim() == DATA_MARKER {
                break;
            }
        }

        while self.read_line()? {
            if self.invalid_encoding {
                return Err(self.error(ParseErrorKind::InvalidEncoding).into());
            }
            let text = self.buf.trim();
            if text.is_empty() {
                if self.header.counts.is_empty() {
                    continue;
                }
                break;
            }
            if text.starts_with('\\') {
                self.replay = true;
                break;
            }

            let (order, count) = ArpaHeader::parse_count(text).map_err(|kind| self.error(kind))?;
            if order != self.header.order() + 1 || !is_supported_order(order) {
                return Err(self
                    .error(ParseErrorKind::UnsupportedOrder { order })
                    .into());
            }
            self.header.counts.push(count);
        }

        if self.header.counts.is_empty() {
            return Err(self.error(ParseErrorKind::EmptyHeader).into());
        }

        Ok(())
    }

    /// Checks the count of the section being left
    fn close_section(&mut self) -> Result<(), ParseError> {
        if self.order == 0 {
            return Ok(());
        }

        let declared = self.header.counts[self.order - 1];
        if declared != self.section_found {
            let kind = ParseErrorKind::CountMismatch {
                order: self.order,
                declared,
                found: self.section_found,
            };
            match self.mode {
                ParseMode::Strict => return Err(self.error(kind)),
                ParseMode::Lenient => tracing::warn!("{}", self.error(kind)),
            }
        }

        Ok(())
    }

    /// Section header line, `\N-grams:`
    fn parse_section_title(text: &str) -> Option<usize> {
        let digits = text.strip_prefix('\\')?.strip_suffix("-grams:")?;
        atoi_simd::parse(digits.as_bytes()).ok()
    }

    fn enter_section(&mut self, text: &str) -> Result<bool, ParseError> {
        let expected = self.order + 1;
        if Self::parse_section_title(text) != Some(expected) || expected > self.header.order() {
            return Err(self.error(ParseErrorKind::UnexpectedSection { expected }));
        }

        self.close_section()?;
        if expected > self.max_order {
            return Ok(false);
        }

        tracing::debug!(
            "Reading {expected}-grams, {} declared",
            self.header.counts[expected - 1]
        );
        self.order = expected;
        self.section_found = 0;
        Ok(true)
    }

    fn finish(&mut self, end_found: bool) -> Result<(), ParseError> {
        self.close_section()?;

        let last = self.order.min(self.max_order);
        if last < self.max_order {
            return Err(self.error(ParseErrorKind::MissingSection { order: last + 1 }));
        }

        if !end_found && self.max_order == self.header.order() {
            match self.mode {
                ParseMode::Strict => return Err(self.error(ParseErrorKind::MissingEnd)),
                ParseMode::Lenient => tracing::warn!("ARPA \\end\\ marker is missing"),
            }
        }

        Ok(())
    }

    /// Validates the current line as an n-gram of the current order,
    /// returns its log probability and backoff weight
    fn parse_fields(&self) -> Result<(f32, Option<f32>), ParseErrorKind> {
        if self.invalid_encoding {
            return Err(ParseErrorKind::InvalidEncoding);
        }

        let n = self.order;
        let found = self.buf.split_ascii_whitespace().count();
        if found != n + 1 && found != n + 2 {
            return Err(ParseErrorKind::FieldCount {
                expected: n + 2,
                found,
            });
        }
        let fields: ArrayVec<&str, { NGRAM_MAX_ORDER + 2 }> =
            self.buf.split_ascii_whitespace().take(n + 2).collect();

        let logprob: f32 = fields[0]
            .parse()
            .map_err(|_| ParseErrorKind::InvalidProbability)?;
        if logprob.is_nan() {
            return Err(ParseErrorKind::InvalidProbability);
        }
        let backoff = match fields.get(n + 1) {
            Some(field) => match field.parse::<f32>() {
                Ok(b) if !b.is_nan() => Some(b),
                _ => return Err(ParseErrorKind::InvalidBackoff),
            },
            None => None,
        };

        Ok((logprob, backoff))
    }

    /// Interns the words of a validated line
    fn intern_words(&mut self) -> Result<NgramIds, LoadError> {
        let n = self.order;
        let mut words = NgramIds::new();
        for word in self.buf.split_ascii_whitespace().skip(1).take(n) {
            if n == 1 && word.chars().count() > SUSPICIOUS_WORD_LEN {
                tracing::warn!(
                    "A word with {} characters was found at line {}",
                    word.chars().count(),
                    self.line
                );
            }
            let id = self
                .vocabulary
                .intern(word)
                .map_err(|source| LoadError::Capacity {
                    line: self.line,
                    source,
                })?;
            words.push(id);
        }
        Ok(words)
    }

    fn next_record(&mut self) -> Result<Option<NgramRecord>, LoadError> {
        loop {
            if !self.read_line()? {
                self.finish(false)?;
                return Ok(None);
            }

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            if text.starts_with('\\') {
                if text == END_MARKER {
                    self.finish(true)?;
                    return Ok(None);
                }
                let text = text.to_owned();
                if !self.enter_section(&text)? {
                    // capped, every section up to max order is already checked
                    return Ok(None);
                }
                continue;
            }
            if self.order == 0 {
                return Err(self.error(ParseErrorKind::UnexpectedLine).into());
            }

            match self.parse_fields() {
                Ok((logprob, backoff)) => {
                    let words = self.intern_words()?;
                    self.section_found += 1;
                    return Ok(Some(NgramRecord {
                        line: self.line,
                        words,
                        logprob,
                        backoff,
                    }));
                }
                Err(kind) => match self.mode {
                    ParseMode::Strict => return Err(self.error(kind).into()),
                    ParseMode::Lenient => {
                        tracing::warn!("Skipping {}", self.error(kind));
                    }
                },
            }
        }
    }
}

impl<R: BufRead> Iterator for ArpaReader<'_, R> {
    type Item = Result<NgramRecord, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let res = self.next_record().transpose();
        if !matches!(res, Some(Ok(_))) {
            self.done = true;
        }
        res
    }
}
