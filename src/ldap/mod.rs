use crate::ber::{BerError, BerInt, BerTag};

pub mod message;

// Protocol op tags from RFC 4511 section 4.2 onward. Application class,
// packed identifier bytes.
pub const TAG_BIND_REQUEST: BerTag = 0x60; // [APPLICATION 0]
pub const TAG_BIND_RESPONSE: BerTag = 0x61; // [APPLICATION 1]
pub const TAG_UNBIND_REQUEST: BerTag = 0x42; // [APPLICATION 2]
pub const TAG_SEARCH_RESULT_ENTRY: BerTag = 0x64; // [APPLICATION 4]
pub const TAG_SEARCH_RESULT_DONE: BerTag = 0x65; // [APPLICATION 5]

// Bind authentication choice and message controls.
pub const TAG_AUTH_SIMPLE: BerTag = 0x80; // [CONTEXT 0]
pub const TAG_AUTH_SASL: BerTag = 0xA3; // [CONTEXT 3]
pub const TAG_CONTROLS: BerTag = 0xA0; // [CONTEXT 0], constructed

/// LDAP result codes carried in BindResponse / SearchResultDone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum ResultCode {
    Success = 0,
    OperationsError = 1,
    ProtocolError = 2,
    TimeLimitExceeded = 3,
    SizeLimitExceeded = 4,
    CompareFalse = 5,
    CompareTrue = 6,
    AuthMethodNotSupported = 7,
    StrongerAuthRequired = 8,
    NoSuchObject = 32,
    InvalidDnSyntax = 34,
    InvalidCredentials = 49,
    InsufficientAccessRights = 50,
    Busy = 51,
    Unavailable = 52,
    UnwillingToPerform = 53,
    Other = 80,
}

impl TryFrom<BerInt> for ResultCode {
    type Error = BerError;

    fn try_from(value: BerInt) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ResultCode::Success),
            1 => Ok(ResultCode::OperationsError),
            2 => Ok(ResultCode::ProtocolError),
            3 => Ok(ResultCode::TimeLimitExceeded),
            4 => Ok(ResultCode::SizeLimitExceeded),
            5 => Ok(ResultCode::CompareFalse),
            6 => Ok(ResultCode::CompareTrue),
            7 => Ok(ResultCode::AuthMethodNotSupported),
            8 => Ok(ResultCode::StrongerAuthRequired),
            32 => Ok(ResultCode::NoSuchObject),
            34 => Ok(ResultCode::InvalidDnSyntax),
            49 => Ok(ResultCode::InvalidCredentials),
            50 => Ok(ResultCode::InsufficientAccessRights),
            51 => Ok(ResultCode::Busy),
            52 => Ok(ResultCode::Unavailable),
            53 => Ok(ResultCode::UnwillingToPerform),
            80 => Ok(ResultCode::Other),
            _ => Err(BerError::InvalidEnumValue(value)),
        }
    }
}
