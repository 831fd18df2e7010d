use super::*;

#[test]
fn missing_soa_file_is_serial_empty() {
    let dir = tempfile::tempdir().unwrap();
    let soa = Soa::load(&dir.path().join("soa")).unwrap();
    assert_eq!(soa.serial, "");
    assert_eq!(soa.updated, "");
}

#[test]
fn bump_and_save_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("soa");
    let mut soa = Soa::load(&path).unwrap();
    soa.bump("20260727120000000");
    soa.save(&path).unwrap();

    let reloaded = Soa::load(&path).unwrap();
    assert_eq!(reloaded.serial, "20260727120000000");
    assert_eq!(reloaded.updated, "20260727120000000");
}

#[test]
fn bump_stamps_serial_to_the_updated_timestamp() {
    let mut soa = Soa {
        serial: "20260101000000000".to_string(),
        updated: "x".to_string(),
    };
    soa.bump("20260727120000000");
    assert_eq!(soa.serial, "20260727120000000");
    assert_eq!(soa.updated, "20260727120000000");
}
