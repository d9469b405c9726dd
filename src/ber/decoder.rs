//! Element readers: tag/length preambles, primitive values and container
//! iteration. Every reader consumes a whole number of elements; on failure
//! the cursor is left where the error was detected and should not be reused.

use log::debug;

use crate::ber::cursor::BerCursor;
use crate::ber::{
    BerBitString, BerError, BerInt, BerLen, BerResult, BerTag, BerVal, BIG_TAG_MASK, MORE_TAG_MASK,
};

impl<'a> BerCursor<'a> {
    /// Read the tag octets of the next element, packed into a tag word with
    /// the leading byte in the most significant occupied position.
    pub fn get_tag(&mut self) -> BerResult<BerTag> {
        let b0 = self.read_byte()?;

        if b0 & BIG_TAG_MASK != BIG_TAG_MASK {
            return Ok(b0 as BerTag);
        }

        let mut tag = b0 as BerTag;
        for _ in 1..size_of::<BerTag>() {
            let byte = self.read_byte()?;
            tag = (tag << 8) | byte as BerTag;
            if byte & MORE_TAG_MASK == 0 {
                return Ok(tag);
            }
        }

        Err(BerError::TagOverflow)
    }

    /// Consume the tag and length preamble of the next element, leaving the
    /// cursor at its first content byte.
    ///
    /// Lengths use the short form below 0x80 and the long form `0x80 | n`
    /// followed by `n` big-endian octets otherwise. The indefinite form and
    /// lengths wider than the length word are rejected.
    pub fn skip_tag(&mut self) -> BerResult<(BerTag, BerLen)> {
        let tag = self.get_tag()?;

        let lc = self.read_byte()?;
        if lc & 0x80 == 0 {
            return Ok((tag, lc as BerLen));
        }

        let noctets = (lc & 0x7F) as usize;
        if noctets == 0 {
            debug!("rejecting indefinite length for tag 0x{tag:02X}");
            return Err(BerError::IndefiniteLength);
        }
        if noctets > size_of::<BerLen>() {
            return Err(BerError::OversizedLength);
        }

        let mut len: BerLen = 0;
        for _ in 0..noctets {
            len = (len << 8) | self.read_byte()? as BerLen;
        }
        Ok((tag, len))
    }

    /// Look at the next element's tag and length without advancing. Runs
    /// `skip_tag` on a snapshot, so two consecutive peeks agree.
    pub fn peek_tag(&self) -> BerResult<(BerTag, BerLen)> {
        let mut look = self.snapshot();
        look.skip_tag()
    }

    /// Sign-extended big-endian two's complement from `len` content bytes.
    /// The tag and length must already have been consumed.
    fn get_nint(&mut self, len: BerLen) -> BerResult<BerInt> {
        if len > size_of::<BerInt>() {
            return Err(BerError::IntegerOverflow);
        }
        let bytes = self.read_slice(len)?;

        let Some(&first) = bytes.first() else {
            return Ok(0);
        };
        let mut num: BerInt = if first & 0x80 != 0 { -1 } else { 0 };
        for &byte in bytes {
            num = (num << 8) | byte as BerInt;
        }
        Ok(num)
    }

    /// Decode an INTEGER (or ENUMERATED) element. Non-minimal encodings are
    /// accepted; anything wider than the integer word is not.
    pub fn get_int(&mut self) -> BerResult<(BerTag, BerInt)> {
        let (tag, len) = self.skip_tag()?;
        let num = self.get_nint(len)?;
        Ok((tag, num))
    }

    /// Decode a BOOLEAN element. The raw wire integer is preserved: any
    /// nonzero pattern is truthy, callers wanting strict 0/1 compare
    /// against zero themselves.
    pub fn get_boolean(&mut self) -> BerResult<(BerTag, BerInt)> {
        self.get_int()
    }

    /// Decode a NULL element, whose length must be zero.
    pub fn get_null(&mut self) -> BerResult<BerTag> {
        let (tag, len) = self.skip_tag()?;
        if len != 0 {
            return Err(BerError::NonEmptyNull);
        }
        Ok(tag)
    }

    /// Octet string contents after the preamble, run through the translator
    /// when one is configured.
    fn get_string_bytes(&mut self) -> BerResult<(BerTag, Vec<u8>)> {
        let (tag, len) = self.skip_tag()?;
        let data = self.read_slice(len)?.to_vec();
        let data = self.translate(data)?;
        Ok((tag, data))
    }

    /// Decode an octet string into a caller-supplied buffer. The final byte
    /// of the buffer is reserved: the content is followed by a 0 byte, so a
    /// value of `buf.len() - 1` bytes is the largest that fits. Returns the
    /// content length.
    pub fn get_string_buf(&mut self, buf: &mut [u8]) -> BerResult<(BerTag, usize)> {
        let (tag, len) = self.skip_tag()?;
        if len >= buf.len() {
            return Err(BerError::BufferTooSmall);
        }
        let data = self.read_slice(len)?;

        if self.options().translate_strings {
            let translated = self.translate(data.to_vec())?;
            if translated.len() >= buf.len() {
                return Err(BerError::BufferTooSmall);
            }
            buf[..translated.len()].copy_from_slice(&translated);
            buf[translated.len()] = 0;
            return Ok((tag, translated.len()));
        }

        buf[..len].copy_from_slice(data);
        buf[len] = 0;
        Ok((tag, len))
    }

    /// Decode an octet string as an owned `String`. LDAP strings are UTF-8;
    /// values that are not decode through [`BerCursor::get_berval`] instead.
    pub fn get_string(&mut self) -> BerResult<(BerTag, String)> {
        let (tag, data) = self.get_string_bytes()?;
        let text = String::from_utf8(data).map_err(|_| BerError::InvalidUtf8)?;
        Ok((tag, text))
    }

    /// Decode an octet string as an owned byte-exact value.
    pub fn get_berval(&mut self) -> BerResult<(BerTag, BerVal)> {
        let (tag, data) = self.get_string_bytes()?;
        Ok((tag, BerVal::from(data)))
    }

    /// Decode a BIT STRING. The first content byte counts the unused
    /// trailing bits (0-7); the rest is the payload, MSB-first.
    pub fn get_bitstring(&mut self) -> BerResult<(BerTag, BerBitString)> {
        let (tag, len) = self.skip_tag()?;
        if len == 0 {
            return Err(BerError::InvalidBitString);
        }

        let unused = self.read_byte()?;
        let data_len = len - 1;
        if unused > 7 || (data_len == 0 && unused != 0) {
            return Err(BerError::InvalidBitString);
        }

        let data = self.read_slice(data_len)?.to_vec();
        Ok((
            tag,
            BerBitString {
                data,
                bit_len: data_len * 8 - unused as usize,
            },
        ))
    }

    /// Enter a constructed SEQUENCE/SET: consume the container's preamble,
    /// record where its children end, and peek the first child.
    ///
    /// Returns `(child_tag, child_len, end)` where `end` bounds later
    /// [`BerCursor::next_element`] calls. An empty container fails with
    /// [`BerError::EmptyContainer`]; a container claiming more content than
    /// the buffer holds fails up front.
    pub fn first_element(&mut self) -> BerResult<(BerTag, BerLen, usize)> {
        let (_, len) = self.skip_tag()?;

        if len > self.remaining() {
            return Err(BerError::IncompleteData);
        }
        let end = self.pos() + len;
        if end == self.pos() {
            return Err(BerError::EmptyContainer);
        }

        let (tag, child_len) = self.peek_tag()?;
        Ok((tag, child_len, end))
    }

    /// Peek the next child inside a container entered with
    /// [`BerCursor::first_element`]. `None` exactly at the recorded
    /// boundary; a child whose length carried the cursor past it is an
    /// error. The walker never consumes children; the caller decodes each
    /// one with whichever reader fits.
    pub fn next_element(&self, end: usize) -> BerResult<Option<(BerTag, BerLen)>> {
        if self.pos() == end {
            return Ok(None);
        }
        if self.pos() > end {
            return Err(BerError::ContainerOverrun);
        }
        let (tag, len) = self.peek_tag()?;
        Ok(Some((tag, len)))
    }

    /// Skip one whole element: tag, length and contents.
    pub fn skip_element(&mut self) -> BerResult<BerTag> {
        let (tag, len) = self.skip_tag()?;
        self.skip(len)?;
        Ok(tag)
    }
}
