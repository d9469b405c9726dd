//! Format-string driven batch decoding.
//!
//! A script is a sequence of single-character opcodes, each bound to one
//! output slot from a caller-supplied slot list. The whole script is atomic:
//! the format string and the slots are validated against each other before
//! anything executes, and a wire or domain failure mid-script re-walks the
//! executed prefix to reset every allocating slot before the error is
//! returned.
//!
//! Opcodes:
//!
//! | op      | slot           | action                                        |
//! |---------|----------------|-----------------------------------------------|
//! | `!`     | `Hook`         | invoke the hook (its `undo` runs on rollback) |
//! | `a`     | `Str`          | octet string as owned `String`                |
//! | `b`     | `Int`          | boolean, raw wire integer                     |
//! | `e` `i` | `Int`          | integer (enumerated decodes the same way)     |
//! | `l`     | `Len`          | length of the next element, without consuming |
//! | `n`     | —              | NULL                                          |
//! | `s`     | `Buf`          | octet string into a fixed buffer              |
//! | `o`     | `Val`          | octet string into a caller-supplied value     |
//! | `O`     | `OwnedVal`     | octet string as an owned value                |
//! | `B`     | `BitStr`       | bit string                                    |
//! | `t`     | `Tag`          | tag of the next element, without consuming    |
//! | `T`     | `Tag`          | tag of the next element, consuming its preamble |
//! | `v`     | `StrSeq`       | container of octet strings as `Vec<String>`   |
//! | `V`     | `ValSeq`       | container of octet strings as `Vec<BerVal>`   |
//! | `x`     | —              | skip one whole element                        |
//! | `{` `[` | —              | enter SEQUENCE / SET (no-op before `v`/`V`)   |
//! | `}` `]` | —              | structural only                               |

use log::{debug, trace};

use crate::ber::cursor::BerCursor;
use crate::ber::{BerBitString, BerError, BerInt, BerLen, BerResult, BerTag, BerVal};

/// Caller hook for the `!` opcode. `decode` runs on the forward pass and may
/// consume elements from the cursor; `undo` is the compensation invoked when
/// a later opcode fails the script.
pub trait ScanHook {
    fn decode(&mut self, cursor: &mut BerCursor<'_>) -> BerResult<()>;

    fn undo(&mut self, _cursor: &mut BerCursor<'_>) {}
}

/// One output cell of a scan script. Ownership of decoded storage moves to
/// the caller on success; after a failed script every allocating slot
/// (`Str`, `Val`, `OwnedVal`, `BitStr`, `StrSeq`, `ValSeq`) is reset to
/// `None`/empty, while plain word slots keep whatever the forward pass
/// wrote and must be treated as indeterminate.
pub enum ScanSlot<'x> {
    /// `!`
    Hook(&'x mut dyn ScanHook),
    /// `a`
    Str(&'x mut Option<String>),
    /// `b`, `e`, `i`
    Int(&'x mut BerInt),
    /// `l`
    Len(&'x mut BerLen),
    /// `s` — content goes into `buf` (last byte reserved for a trailing 0),
    /// content length into `len`
    Buf {
        buf: &'x mut [u8],
        len: &'x mut usize,
    },
    /// `o`
    Val(&'x mut BerVal),
    /// `O`
    OwnedVal(&'x mut Option<BerVal>),
    /// `B`
    BitStr(&'x mut Option<BerBitString>),
    /// `t`, `T`
    Tag(&'x mut BerTag),
    /// `v` — `None` after the script means the container had no elements
    StrSeq(&'x mut Option<Vec<String>>),
    /// `V` — same boundary contract as `StrSeq`
    ValSeq(&'x mut Option<Vec<BerVal>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Hook,
    Str,
    Int,
    Len,
    Buf,
    Val,
    OwnedVal,
    BitStr,
    Tag,
    StrSeq,
    ValSeq,
}

/// One compiled opcode: the format character, the index of its slot (when it
/// takes one) and, for `{`/`[`, whether the container preamble is consumed
/// here or left to a following `v`/`V`.
struct Step {
    op: char,
    slot: Option<usize>,
    consume: bool,
}

fn expected(op: char) -> BerResult<Option<Expect>> {
    Ok(Some(match op {
        '!' => Expect::Hook,
        'a' => Expect::Str,
        'b' | 'e' | 'i' => Expect::Int,
        'l' => Expect::Len,
        's' => Expect::Buf,
        'o' => Expect::Val,
        'O' => Expect::OwnedVal,
        'B' => Expect::BitStr,
        't' | 'T' => Expect::Tag,
        'v' => Expect::StrSeq,
        'V' => Expect::ValSeq,
        'n' | 'x' | '{' | '[' | '}' | ']' => return Ok(None),
        other => {
            debug!("scan: unknown opcode {other:?}");
            return Err(BerError::UnknownOpcode(other));
        }
    }))
}

fn slot_matches(expect: Expect, slot: &ScanSlot<'_>) -> bool {
    matches!(
        (expect, slot),
        (Expect::Hook, ScanSlot::Hook(_))
            | (Expect::Str, ScanSlot::Str(_))
            | (Expect::Int, ScanSlot::Int(_))
            | (Expect::Len, ScanSlot::Len(_))
            | (Expect::Buf, ScanSlot::Buf { .. })
            | (Expect::Val, ScanSlot::Val(_))
            | (Expect::OwnedVal, ScanSlot::OwnedVal(_))
            | (Expect::BitStr, ScanSlot::BitStr(_))
            | (Expect::Tag, ScanSlot::Tag(_))
            | (Expect::StrSeq, ScanSlot::StrSeq(_))
            | (Expect::ValSeq, ScanSlot::ValSeq(_))
    )
}

/// Check the format string against the slot list and pair every opcode with
/// its slot index. Nothing decodes until this passes, so a bad script never
/// touches the cursor or the slots.
fn compile(fmt: &str, slots: &[ScanSlot<'_>]) -> BerResult<Vec<Step>> {
    let chars: Vec<char> = fmt.chars().collect();
    let mut steps = Vec::with_capacity(chars.len());
    let mut next = 0usize;

    for (at, &op) in chars.iter().enumerate() {
        let slot = match expected(op)? {
            Some(expect) => {
                let index = next;
                next += 1;
                if let Some(supplied) = slots.get(index) {
                    if !slot_matches(expect, supplied) {
                        return Err(BerError::SlotMismatch { opcode: op, index });
                    }
                }
                Some(index)
            }
            None => None,
        };

        // `{`/`[` leave the container preamble to a directly following
        // `v`/`V`, which walks the container itself.
        let consume = !matches!(op, '{' | '[')
            || !matches!(chars.get(at + 1).copied(), Some('v' | 'V'));

        steps.push(Step { op, slot, consume });
    }

    if next != slots.len() {
        return Err(BerError::SlotCount {
            expected: next,
            supplied: slots.len(),
        });
    }
    Ok(steps)
}

fn mismatch(opcode: char, index: usize) -> BerError {
    BerError::SlotMismatch { opcode, index }
}

impl<'a> BerCursor<'a> {
    /// Run a scan script against the cursor. On success the cursor sits past
    /// everything the script consumed and the tag of the last operation is
    /// returned. On failure the cursor is spent, every allocating slot has
    /// been reset and word slots are indeterminate.
    pub fn scan(&mut self, fmt: &str, slots: &mut [ScanSlot<'_>]) -> BerResult<BerTag> {
        let steps = compile(fmt, slots)?;
        trace!("scan fmt {fmt:?} at pos {}", self.pos());

        let mut last: BerTag = 0;
        for (at, step) in steps.iter().enumerate() {
            if let Err(err) = self.exec_step(step, slots, &mut last) {
                debug!("scan fmt {fmt:?} failed at opcode {} ({err})", step.op);
                self.rollback(&steps[..=at], slots);
                return Err(err);
            }
        }
        Ok(last)
    }

    fn exec_step(
        &mut self,
        step: &Step,
        slots: &mut [ScanSlot<'_>],
        last: &mut BerTag,
    ) -> BerResult<()> {
        // Slot-free opcodes first; everything else pairs with slots[i].
        let i = match step.op {
            'n' => {
                *last = self.get_null()?;
                return Ok(());
            }
            'x' => {
                *last = self.skip_element()?;
                return Ok(());
            }
            '{' | '[' => {
                if step.consume {
                    let (tag, _) = self.skip_tag()?;
                    *last = tag;
                }
                return Ok(());
            }
            '}' | ']' => return Ok(()),
            op => match step.slot {
                Some(i) => i,
                None => return Err(mismatch(op, 0)),
            },
        };

        match (step.op, &mut slots[i]) {
            ('!', ScanSlot::Hook(hook)) => {
                hook.decode(self)?;
            }
            ('a', ScanSlot::Str(out)) => {
                let (tag, text) = self.get_string()?;
                **out = Some(text);
                *last = tag;
            }
            ('b' | 'e' | 'i', ScanSlot::Int(out)) => {
                let (tag, num) = self.get_int()?;
                **out = num;
                *last = tag;
            }
            ('l', ScanSlot::Len(out)) => {
                let (tag, len) = self.peek_tag()?;
                **out = len;
                *last = tag;
            }
            ('s', ScanSlot::Buf { buf, len }) => {
                let (tag, n) = self.get_string_buf(buf)?;
                **len = n;
                *last = tag;
            }
            ('o', ScanSlot::Val(out)) => {
                let (tag, val) = self.get_berval()?;
                **out = val;
                *last = tag;
            }
            ('O', ScanSlot::OwnedVal(out)) => {
                let (tag, val) = self.get_berval()?;
                **out = Some(val);
                *last = tag;
            }
            ('B', ScanSlot::BitStr(out)) => {
                let (tag, bits) = self.get_bitstring()?;
                **out = Some(bits);
                *last = tag;
            }
            ('t', ScanSlot::Tag(out)) => {
                let (tag, _) = self.peek_tag()?;
                **out = tag;
                *last = tag;
            }
            ('T', ScanSlot::Tag(out)) => {
                let (tag, _) = self.skip_tag()?;
                **out = tag;
                *last = tag;
            }
            ('v', ScanSlot::StrSeq(out)) => {
                **out = match self.walk_container(BerCursor::get_string)? {
                    Some((items, tag)) => {
                        *last = tag;
                        Some(items)
                    }
                    None => None,
                };
            }
            ('V', ScanSlot::ValSeq(out)) => {
                **out = match self.walk_container(BerCursor::get_berval)? {
                    Some((items, tag)) => {
                        *last = tag;
                        Some(items)
                    }
                    None => None,
                };
            }
            (op, _) => return Err(mismatch(op, i)),
        }
        Ok(())
    }

    /// Shared walk for `v`/`V`: consume the container preamble, decode each
    /// child with `read`, stop at the recorded boundary. An empty container
    /// yields `None` and is not an error at script level.
    fn walk_container<T>(
        &mut self,
        read: fn(&mut BerCursor<'a>) -> BerResult<(BerTag, T)>,
    ) -> BerResult<Option<(Vec<T>, BerTag)>> {
        let end = match self.first_element() {
            Ok((_, _, end)) => end,
            Err(BerError::EmptyContainer) => return Ok(None),
            Err(err) => return Err(err),
        };

        let mut items = Vec::new();
        let mut tag: BerTag = 0;
        loop {
            let (child_tag, item) = read(self)?;
            tag = child_tag;
            items.push(item);
            if self.next_element(end)?.is_none() {
                break;
            }
        }
        Ok(Some((items, tag)))
    }

    /// Second pass over the executed prefix of a failed script: reset every
    /// allocating slot and let `!` hooks compensate. Word slots are left
    /// with whatever the forward pass wrote.
    fn rollback(&mut self, steps: &[Step], slots: &mut [ScanSlot<'_>]) {
        for step in steps {
            let Some(i) = step.slot else { continue };
            match (step.op, &mut slots[i]) {
                ('!', ScanSlot::Hook(hook)) => hook.undo(self),
                ('a', ScanSlot::Str(out)) => **out = None,
                ('o', ScanSlot::Val(out)) => **out = BerVal::default(),
                ('O', ScanSlot::OwnedVal(out)) => **out = None,
                ('B', ScanSlot::BitStr(out)) => **out = None,
                ('v', ScanSlot::StrSeq(out)) => **out = None,
                ('V', ScanSlot::ValSeq(out)) => **out = None,
                _ => {}
            }
        }
    }
}
