use thiserror::Error;

pub mod cursor;
pub mod decoder;
pub mod scan;

pub use cursor::{BerCursor, BerOptions};
pub use scan::{ScanHook, ScanSlot};

pub type BerResult<T> = Result<T, BerError>;

/// Packed tag word. A short-form tag is its single identifier byte; a
/// long-form tag keeps the original byte sequence with the leading byte in
/// the most significant occupied position, so raw tags compare by value.
pub type BerTag = u64;

/// Length word. Long-form lengths wider than this word are rejected.
pub type BerLen = usize;

/// Integer word for INTEGER / ENUMERATED / BOOLEAN contents.
pub type BerInt = i64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BerError {
    #[error("incomplete data: not enough bytes")]
    IncompleteData,

    #[error("indefinite length is not supported")]
    IndefiniteLength,

    #[error("length does not fit in a length word")]
    OversizedLength,

    #[error("tag does not fit in a tag word")]
    TagOverflow,

    #[error("integer wider than an integer word")]
    IntegerOverflow,

    #[error("NULL element with nonzero length")]
    NonEmptyNull,

    #[error("string does not fit in the supplied buffer")]
    BufferTooSmall,

    #[error("malformed bit string")]
    InvalidBitString,

    #[error("string value is not valid UTF-8")]
    InvalidUtf8,

    #[error("container has no elements")]
    EmptyContainer,

    #[error("child element overran its container")]
    ContainerOverrun,

    #[error("string translation failed")]
    TranslationFailed,

    #[error("unknown scan opcode {0:?}")]
    UnknownOpcode(char),

    #[error("slot {index} does not match opcode {opcode:?}")]
    SlotMismatch { opcode: char, index: usize },

    #[error("format string consumes {expected} slots, {supplied} supplied")]
    SlotCount { expected: usize, supplied: usize },

    #[error("unexpected tag: expected 0x{expected:02X}, got 0x{got:02X}")]
    UnexpectedTag { expected: BerTag, got: BerTag },

    #[error("invalid value for enum: {0}")]
    InvalidEnumValue(BerInt),

    #[error("trailing data after parsing complete structure")]
    TrailingData,
}

// Identifier-byte layout: [CLASS][P/C][TAG NUMBER]
//                          bits 8-7  6   bits 5-1
pub const CLASS_MASK: u8 = 0xC0;
pub const CONSTRUCTED: u8 = 0x20;
pub const BIG_TAG_MASK: u8 = 0x1F;
pub const MORE_TAG_MASK: u8 = 0x80;

// Universal tags used by LDAP wire messages.
pub const TAG_BOOLEAN: BerTag = 0x01;
pub const TAG_INTEGER: BerTag = 0x02;
pub const TAG_BITSTRING: BerTag = 0x03;
pub const TAG_OCTETSTRING: BerTag = 0x04;
pub const TAG_NULL: BerTag = 0x05;
pub const TAG_ENUMERATED: BerTag = 0x0A;
pub const TAG_SEQUENCE: BerTag = 0x30;
pub const TAG_SET: BerTag = 0x31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

/// Most significant occupied byte of a packed tag, i.e. the identifier byte
/// that came first on the wire.
pub fn leading_byte(tag: BerTag) -> u8 {
    let mut t = tag;
    while t > 0xFF {
        t >>= 8;
    }
    t as u8
}

pub fn tag_class(tag: BerTag) -> TagClass {
    match leading_byte(tag) & CLASS_MASK {
        0x00 => TagClass::Universal,
        0x40 => TagClass::Application,
        0x80 => TagClass::ContextSpecific,
        _ => TagClass::Private,
    }
}

pub fn is_constructed(tag: BerTag) -> bool {
    leading_byte(tag) & CONSTRUCTED != 0
}

/// Tag number of a packed tag: the low five bits of a short-form tag, or the
/// accumulated 7-bit groups of a long-form one.
pub fn tag_number(tag: BerTag) -> u64 {
    let lead = leading_byte(tag);
    if lead & BIG_TAG_MASK != BIG_TAG_MASK {
        return (lead & BIG_TAG_MASK) as u64;
    }
    // Walk the continuation bytes below the leading byte.
    let occupied = (BerTag::BITS - tag.leading_zeros()).div_ceil(8) as usize;
    let mut number = 0u64;
    for i in (0..occupied.saturating_sub(1)).rev() {
        let byte = (tag >> (8 * i)) as u8;
        number = (number << 7) | (byte & 0x7F) as u64;
    }
    number
}

/// Owned byte string. Stands in for the (pointer, length) pair used on LDAP
/// values that may legitimately contain zero bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BerVal {
    pub data: Vec<u8>,
}

impl BerVal {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for BerVal {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for BerVal {
    fn from(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }
}

/// Decoded BIT STRING: payload bytes (MSB-first) and the number of
/// meaningful bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BerBitString {
    pub data: Vec<u8>,
    pub bit_len: usize,
}
