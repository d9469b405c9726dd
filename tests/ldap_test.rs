use ruslber::ber::{BerError, BerVal};
use ruslber::ldap::ResultCode;
use ruslber::ldap::message::{BindAuth, ProtocolOp, parse_message};

// Simple bind: version 3, name "cn=root", password "secret".
const RAW_BIND_REQUEST: &[u8] = &[
    0x30, 0x19, 0x02, 0x01, 0x01, 0x60, 0x14, 0x02, 0x01, 0x03, 0x04, 0x07, 0x63, 0x6E, 0x3D,
    0x72, 0x6F, 0x6F, 0x74, 0x80, 0x06, 0x73, 0x65, 0x63, 0x72, 0x65, 0x74,
];

#[test]
fn test_parse_simple_bind_request() {
    let message = parse_message(RAW_BIND_REQUEST).unwrap();
    assert_eq!(message.message_id, 1);

    let ProtocolOp::BindRequest(bind) = message.op else {
        panic!("expected BindRequest, got {:?}", message.op);
    };
    assert_eq!(bind.version, 3);
    assert_eq!(bind.name, "cn=root");
    assert_eq!(bind.auth, BindAuth::Simple(BerVal::from(&b"secret"[..])));
}

// SASL bind: mechanism "GSSAPI", no credentials.
const RAW_SASL_BIND: &[u8] = &[
    0x30, 0x14, 0x02, 0x01, 0x04, 0x60, 0x0F, 0x02, 0x01, 0x03, 0x04, 0x00, 0xA3, 0x08, 0x04,
    0x06, 0x47, 0x53, 0x53, 0x41, 0x50, 0x49,
];

#[test]
fn test_parse_sasl_bind_without_credentials() {
    let message = parse_message(RAW_SASL_BIND).unwrap();
    assert_eq!(message.message_id, 4);

    let ProtocolOp::BindRequest(bind) = message.op else {
        panic!("expected BindRequest, got {:?}", message.op);
    };
    assert_eq!(bind.name, "");
    assert_eq!(
        bind.auth,
        BindAuth::Sasl {
            mechanism: String::from("GSSAPI"),
            credentials: None,
        }
    );
}

// SASL bind: mechanism "PLAIN", credentials holding embedded zero bytes.
const RAW_SASL_BIND_CREDS: &[u8] = &[
    0x30, 0x19, 0x02, 0x01, 0x06, 0x60, 0x14, 0x02, 0x01, 0x03, 0x04, 0x00, 0xA3, 0x0D, 0x04,
    0x05, 0x50, 0x4C, 0x41, 0x49, 0x4E, 0x04, 0x04, 0x00, 0x61, 0x00, 0x62,
];

#[test]
fn test_parse_sasl_bind_with_credentials() {
    let message = parse_message(RAW_SASL_BIND_CREDS).unwrap();

    let ProtocolOp::BindRequest(bind) = message.op else {
        panic!("expected BindRequest, got {:?}", message.op);
    };
    assert_eq!(
        bind.auth,
        BindAuth::Sasl {
            mechanism: String::from("PLAIN"),
            credentials: Some(BerVal::from(&[0x00, 0x61, 0x00, 0x62][..])),
        }
    );
}

const RAW_BIND_RESPONSE_SUCCESS: &[u8] = &[
    0x30, 0x0C, 0x02, 0x01, 0x02, 0x61, 0x07, 0x0A, 0x01, 0x00, 0x04, 0x00, 0x04, 0x00,
];

#[test]
fn test_parse_bind_response_success() {
    let message = parse_message(RAW_BIND_RESPONSE_SUCCESS).unwrap();
    assert_eq!(message.message_id, 2);

    let ProtocolOp::BindResponse(result) = message.op else {
        panic!("expected BindResponse, got {:?}", message.op);
    };
    assert_eq!(result.code, ResultCode::Success);
    assert_eq!(result.matched_dn, "");
    assert_eq!(result.diagnostic, "");
}

// Invalid credentials (49) with diagnostic "bad".
const RAW_BIND_RESPONSE_FAILURE: &[u8] = &[
    0x30, 0x0F, 0x02, 0x01, 0x07, 0x61, 0x0A, 0x0A, 0x01, 0x31, 0x04, 0x00, 0x04, 0x03, 0x62,
    0x61, 0x64,
];

#[test]
fn test_parse_bind_response_failure() {
    let message = parse_message(RAW_BIND_RESPONSE_FAILURE).unwrap();

    let ProtocolOp::BindResponse(result) = message.op else {
        panic!("expected BindResponse, got {:?}", message.op);
    };
    assert_eq!(result.code, ResultCode::InvalidCredentials);
    assert_eq!(result.diagnostic, "bad");
}

const RAW_UNBIND: &[u8] = &[0x30, 0x05, 0x02, 0x01, 0x05, 0x42, 0x00];

#[test]
fn test_parse_unbind() {
    let message = parse_message(RAW_UNBIND).unwrap();
    assert_eq!(message.message_id, 5);
    assert_eq!(message.op, ProtocolOp::UnbindRequest);
}

// Unbind followed by an (empty) controls element, which is skipped.
const RAW_UNBIND_WITH_CONTROLS: &[u8] = &[
    0x30, 0x07, 0x02, 0x01, 0x05, 0x42, 0x00, 0xA0, 0x00,
];

#[test]
fn test_controls_are_skipped() {
    let message = parse_message(RAW_UNBIND_WITH_CONTROLS).unwrap();
    assert_eq!(message.op, ProtocolOp::UnbindRequest);
}

#[test]
fn test_trailing_data_rejected() {
    let mut packet = RAW_UNBIND.to_vec();
    packet.extend_from_slice(&[0x05, 0x00]);
    assert_eq!(parse_message(&packet), Err(BerError::TrailingData));
}

// Entry for "dc=demo" with a single-valued "cn" attribute.
const RAW_SEARCH_ENTRY: &[u8] = &[
    0x30, 0x1E, 0x02, 0x01, 0x03, 0x64, 0x19, 0x04, 0x07, 0x64, 0x63, 0x3D, 0x64, 0x65, 0x6D,
    0x6F, 0x30, 0x0E, 0x30, 0x0C, 0x04, 0x02, 0x63, 0x6E, 0x31, 0x06, 0x04, 0x04, 0x72, 0x6F,
    0x6F, 0x74,
];

#[test]
fn test_parse_search_result_entry() {
    let message = parse_message(RAW_SEARCH_ENTRY).unwrap();
    assert_eq!(message.message_id, 3);

    let ProtocolOp::SearchResultEntry(entry) = message.op else {
        panic!("expected SearchResultEntry, got {:?}", message.op);
    };
    assert_eq!(entry.object_name, "dc=demo");
    assert_eq!(entry.attributes.len(), 1);
    assert_eq!(entry.attributes[0].name, "cn");
    assert_eq!(entry.attributes[0].values, vec![BerVal::from(&b"root"[..])]);
}

// Entry with two attributes, the first multi-valued:
//   cn: root, admin
//   uid: jdoe
const RAW_SEARCH_ENTRY_MULTI: &[u8] = &[
    0x30, 0x34, 0x02, 0x01, 0x08, 0x64, 0x2F, 0x04, 0x07, 0x64, 0x63, 0x3D, 0x64, 0x65, 0x6D,
    0x6F, 0x30, 0x24, 0x30, 0x13, 0x04, 0x02, 0x63, 0x6E, 0x31, 0x0D, 0x04, 0x04, 0x72, 0x6F,
    0x6F, 0x74, 0x04, 0x05, 0x61, 0x64, 0x6D, 0x69, 0x6E, 0x30, 0x0D, 0x04, 0x03, 0x75, 0x69,
    0x64, 0x31, 0x06, 0x04, 0x04, 0x6A, 0x64, 0x6F, 0x65,
];

#[test]
fn test_parse_search_result_entry_multiple_attributes() {
    let message = parse_message(RAW_SEARCH_ENTRY_MULTI).unwrap();

    let ProtocolOp::SearchResultEntry(entry) = message.op else {
        panic!("expected SearchResultEntry, got {:?}", message.op);
    };
    assert_eq!(entry.object_name, "dc=demo");
    assert_eq!(entry.attributes.len(), 2);

    assert_eq!(entry.attributes[0].name, "cn");
    assert_eq!(
        entry.attributes[0].values,
        vec![BerVal::from(&b"root"[..]), BerVal::from(&b"admin"[..])]
    );

    assert_eq!(entry.attributes[1].name, "uid");
    assert_eq!(entry.attributes[1].values, vec![BerVal::from(&b"jdoe"[..])]);
}

// Entry whose attribute list is empty.
const RAW_SEARCH_ENTRY_NO_ATTRS: &[u8] = &[
    0x30, 0x10, 0x02, 0x01, 0x0A, 0x64, 0x0B, 0x04, 0x07, 0x64, 0x63, 0x3D, 0x64, 0x65, 0x6D,
    0x6F, 0x30, 0x00,
];

#[test]
fn test_parse_search_result_entry_without_attributes() {
    let message = parse_message(RAW_SEARCH_ENTRY_NO_ATTRS).unwrap();

    let ProtocolOp::SearchResultEntry(entry) = message.op else {
        panic!("expected SearchResultEntry, got {:?}", message.op);
    };
    assert_eq!(entry.object_name, "dc=demo");
    assert!(entry.attributes.is_empty());
}

const RAW_SEARCH_DONE: &[u8] = &[
    0x30, 0x0C, 0x02, 0x01, 0x09, 0x65, 0x07, 0x0A, 0x01, 0x00, 0x04, 0x00, 0x04, 0x00,
];

#[test]
fn test_parse_search_result_done() {
    let message = parse_message(RAW_SEARCH_DONE).unwrap();

    let ProtocolOp::SearchResultDone(result) = message.op else {
        panic!("expected SearchResultDone, got {:?}", message.op);
    };
    assert_eq!(result.code, ResultCode::Success);
}

#[test]
fn test_unknown_protocol_op_rejected() {
    let packet = [0x30, 0x05, 0x02, 0x01, 0x0B, 0x44, 0x00];
    let err = parse_message(&packet).unwrap_err();
    assert!(matches!(err, BerError::UnexpectedTag { got: 0x44, .. }));
}

#[test]
fn test_unknown_result_code_rejected() {
    // Result code 99 is not an assigned value.
    let packet = [
        0x30, 0x0C, 0x02, 0x01, 0x02, 0x61, 0x07, 0x0A, 0x01, 0x63, 0x04, 0x00, 0x04, 0x00,
    ];
    assert_eq!(parse_message(&packet), Err(BerError::InvalidEnumValue(99)));
}

#[test]
fn test_truncated_message_rejected() {
    let truncated = &RAW_BIND_REQUEST[..RAW_BIND_REQUEST.len() - 3];
    assert_eq!(parse_message(truncated), Err(BerError::IncompleteData));
}
