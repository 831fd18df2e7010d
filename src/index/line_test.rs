use super::*;

#[test]
fn encode_decode_round_trips() {
    let line = IndexLine {
        offset: 1024,
        data_file_no: 3,
        deleted: false,
        attribute_id: 7,
        key: "ACME-NET".to_string(),
    };
    let decoded = IndexLine::decode(&line.encode()).unwrap();
    assert_eq!(decoded, line);
}

#[test]
fn decode_preserves_colons_inside_key() {
    let line = IndexLine {
        offset: 0,
        data_file_no: 0,
        deleted: true,
        attribute_id: 1,
        key: "2001:db8::/32".to_string(),
    };
    let decoded = IndexLine::decode(&line.encode()).unwrap();
    assert_eq!(decoded.key, "2001:db8::/32");
    assert!(decoded.deleted);
}

#[test]
fn sort_key_orders_by_key_then_attribute_id() {
    let a = IndexLine {
        offset: 0,
        data_file_no: 0,
        deleted: false,
        attribute_id: 2,
        key: "A".to_string(),
    };
    let b = IndexLine {
        offset: 0,
        data_file_no: 0,
        deleted: false,
        attribute_id: 1,
        key: "B".to_string(),
    };
    assert!(a.sort_key() < b.sort_key());
}

#[test]
fn malformed_line_is_rejected() {
    assert!(IndexLine::decode("1:2:3\n").is_err());
}
