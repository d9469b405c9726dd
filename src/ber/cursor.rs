use std::fmt;
use std::rc::Rc;

use crate::ber::{BerError, BerResult};

/// Byte transform applied to decoded string values when translation is
/// enabled on the cursor. The transform consumes the decoded bytes and
/// returns the replacement (which may be the input unchanged).
pub type DecodeTranslator = dyn Fn(Vec<u8>) -> BerResult<Vec<u8>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BerOptions {
    /// Pass decoded string values through the registered translator.
    pub translate_strings: bool,
}

/// Live decoding state over a received buffer: the bytes, a read offset and
/// the decoder options. The offset only advances after the bytes it covers
/// have been consumed successfully; a cursor that has returned an error is
/// considered spent.
pub struct BerCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    options: BerOptions,
    translator: Option<Rc<DecodeTranslator>>,
}

impl<'a> BerCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            options: BerOptions::default(),
            translator: None,
        }
    }

    pub fn with_options(buf: &'a [u8], options: BerOptions) -> Self {
        Self {
            buf,
            pos: 0,
            options,
            translator: None,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn options(&self) -> BerOptions {
        self.options
    }

    pub fn set_options(&mut self, options: BerOptions) {
        self.options = options;
    }

    /// Register the decode-side string translator. It is only invoked when
    /// `BerOptions::translate_strings` is set.
    pub fn set_decode_translator<F>(&mut self, translator: F)
    where
        F: Fn(Vec<u8>) -> BerResult<Vec<u8>> + 'static,
    {
        self.translator = Some(Rc::new(translator));
    }

    /// Cheap copy for look-ahead: shares the underlying buffer, copies the
    /// offset and options. Advancing the snapshot leaves the live cursor
    /// untouched.
    pub fn snapshot(&self) -> BerCursor<'a> {
        BerCursor {
            buf: self.buf,
            pos: self.pos,
            options: self.options,
            translator: self.translator.clone(),
        }
    }

    pub(crate) fn read_byte(&mut self) -> BerResult<u8> {
        if self.pos >= self.buf.len() {
            return Err(BerError::IncompleteData);
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Borrow the next `n` bytes and advance past them. Fails without moving
    /// the offset if fewer than `n` bytes remain.
    pub fn read_slice(&mut self, n: usize) -> BerResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(BerError::IncompleteData);
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..start + n])
    }

    /// Advance past `n` bytes without looking at them.
    pub fn skip(&mut self, n: usize) -> BerResult<()> {
        if n > self.remaining() {
            return Err(BerError::IncompleteData);
        }
        self.pos += n;
        Ok(())
    }

    /// Run a decoded string value through the translator, when enabled.
    /// Empty values pass through untouched.
    pub(crate) fn translate(&self, data: Vec<u8>) -> BerResult<Vec<u8>> {
        if data.is_empty() || !self.options.translate_strings {
            return Ok(data);
        }
        match &self.translator {
            Some(translator) => translator(data),
            None => Ok(data),
        }
    }
}

impl fmt::Debug for BerCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BerCursor")
            .field("len", &self.buf.len())
            .field("pos", &self.pos)
            .field("options", &self.options)
            .finish()
    }
}
