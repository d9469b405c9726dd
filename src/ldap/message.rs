//! LDAP message envelope parsing on top of the BER decoder. Covers the ops
//! a client sees around bind and search; everything is driven through scan
//! scripts and the container walker, the same way a full protocol layer
//! would consume the decoder.

use crate::ber::{BerCursor, BerError, BerInt, BerResult, BerVal, ScanSlot};
use crate::ldap::{
    ResultCode, TAG_AUTH_SASL, TAG_AUTH_SIMPLE, TAG_BIND_REQUEST, TAG_BIND_RESPONSE, TAG_CONTROLS,
    TAG_SEARCH_RESULT_DONE, TAG_SEARCH_RESULT_ENTRY, TAG_UNBIND_REQUEST,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LdapMessage {
    pub message_id: BerInt,
    pub op: ProtocolOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolOp {
    BindRequest(BindRequest),
    BindResponse(LdapResult),
    UnbindRequest,
    SearchResultEntry(SearchResultEntry),
    SearchResultDone(LdapResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindRequest {
    pub version: BerInt,
    pub name: String,
    pub auth: BindAuth,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindAuth {
    Simple(BerVal),
    Sasl {
        mechanism: String,
        credentials: Option<BerVal>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LdapResult {
    pub code: ResultCode,
    pub matched_dn: String,
    pub diagnostic: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartialAttribute {
    pub name: String,
    pub values: Vec<BerVal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultEntry {
    pub object_name: String,
    pub attributes: Vec<PartialAttribute>,
}

/// Parse one complete LDAPMessage from the buffer. Attached controls are
/// skipped without interpretation; anything after the message is an error.
pub fn parse_message(input: &[u8]) -> BerResult<LdapMessage> {
    let mut cur = BerCursor::new(input);

    let mut message_id: BerInt = 0;
    let mut op_tag = 0;
    cur.scan(
        "{it",
        &mut [
            ScanSlot::Int(&mut message_id),
            ScanSlot::Tag(&mut op_tag),
        ],
    )?;

    let op = match op_tag {
        TAG_BIND_REQUEST => parse_bind_request(&mut cur)?,
        TAG_BIND_RESPONSE => ProtocolOp::BindResponse(parse_ldap_result(&mut cur)?),
        TAG_UNBIND_REQUEST => {
            cur.get_null()?;
            ProtocolOp::UnbindRequest
        }
        TAG_SEARCH_RESULT_ENTRY => parse_search_entry(&mut cur)?,
        TAG_SEARCH_RESULT_DONE => ProtocolOp::SearchResultDone(parse_ldap_result(&mut cur)?),
        got => {
            return Err(BerError::UnexpectedTag {
                expected: TAG_BIND_REQUEST,
                got,
            });
        }
    };

    if cur.remaining() > 0 {
        let (tag, _) = cur.peek_tag()?;
        if tag == TAG_CONTROLS {
            cur.skip_element()?;
        }
    }
    if cur.remaining() > 0 {
        return Err(BerError::TrailingData);
    }

    Ok(LdapMessage { message_id, op })
}

fn parse_bind_request(cur: &mut BerCursor<'_>) -> BerResult<ProtocolOp> {
    let mut version: BerInt = 0;
    let mut name = None;
    cur.scan(
        "{ia",
        &mut [ScanSlot::Int(&mut version), ScanSlot::Str(&mut name)],
    )?;

    let (auth_tag, _) = cur.peek_tag()?;
    let auth = match auth_tag {
        TAG_AUTH_SIMPLE => {
            let (_, password) = cur.get_berval()?;
            BindAuth::Simple(password)
        }
        TAG_AUTH_SASL => {
            let (_, _, end) = cur.first_element()?;
            let (_, mechanism) = cur.get_string()?;
            let credentials = match cur.next_element(end)? {
                Some(_) => {
                    let (_, creds) = cur.get_berval()?;
                    Some(creds)
                }
                None => None,
            };
            BindAuth::Sasl {
                mechanism,
                credentials,
            }
        }
        got => {
            return Err(BerError::UnexpectedTag {
                expected: TAG_AUTH_SIMPLE,
                got,
            });
        }
    };

    Ok(ProtocolOp::BindRequest(BindRequest {
        version,
        name: name.unwrap_or_default(),
        auth,
    }))
}

/// Shared body of BindResponse and SearchResultDone: resultCode, matchedDN,
/// diagnosticMessage.
fn parse_ldap_result(cur: &mut BerCursor<'_>) -> BerResult<LdapResult> {
    let mut code: BerInt = 0;
    let mut matched_dn = None;
    let mut diagnostic = None;
    cur.scan(
        "{eaa",
        &mut [
            ScanSlot::Int(&mut code),
            ScanSlot::Str(&mut matched_dn),
            ScanSlot::Str(&mut diagnostic),
        ],
    )?;

    Ok(LdapResult {
        code: ResultCode::try_from(code)?,
        matched_dn: matched_dn.unwrap_or_default(),
        diagnostic: diagnostic.unwrap_or_default(),
    })
}

fn parse_search_entry(cur: &mut BerCursor<'_>) -> BerResult<ProtocolOp> {
    let mut dn = None;
    cur.scan("{a", &mut [ScanSlot::Str(&mut dn)])?;

    // attributes: SEQUENCE OF SEQUENCE { type, vals SET OF value }
    let mut attributes = Vec::new();
    match cur.first_element() {
        Err(BerError::EmptyContainer) => {}
        Err(err) => return Err(err),
        Ok((_, _, end)) => loop {
            let mut name = None;
            let mut values = None;
            cur.scan(
                "{a[V]}",
                &mut [ScanSlot::Str(&mut name), ScanSlot::ValSeq(&mut values)],
            )?;
            attributes.push(PartialAttribute {
                name: name.unwrap_or_default(),
                values: values.unwrap_or_default(),
            });
            if cur.next_element(end)?.is_none() {
                break;
            }
        },
    }

    Ok(ProtocolOp::SearchResultEntry(SearchResultEntry {
        object_name: dn.unwrap_or_default(),
        attributes,
    }))
}
