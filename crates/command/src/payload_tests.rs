use super::*;

fn frame_entries(entries: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        out.extend_from_slice(entry.as_bytes());
        out.push(0);
    }
    out
}

#[test]
fn decodes_all_recognised_keys() {
    let payload = frame_entries(&[
        "ACTION=add",
        "DEVNAME=sda1",
        "DEVTYPE=disk",
        "MAJOR=8",
        "MINOR=1",
        "SEQNUM=42",
        "SYNTH_UUID=abc-123",
    ]);
    let record = decode_identify_payload(&payload).unwrap();
    assert_eq!(record.action, Some(Action::Add));
    assert_eq!(record.devname.as_deref(), Some("sda1"));
    assert_eq!(record.devtype.as_deref(), Some("disk"));
    assert_eq!(record.major, Some(8));
    assert_eq!(record.minor, Some(1));
    assert_eq!(record.seqnum, Some(42));
    assert_eq!(record.synth_uuid.as_deref(), Some("abc-123"));
}

#[test]
fn ignores_unrecognised_keys() {
    let payload = frame_entries(&["ACTION=change", "ID_FS_TYPE=ext4"]);
    let record = decode_identify_payload(&payload).unwrap();
    assert_eq!(record.action, Some(Action::Change));
}

#[test]
fn maps_every_action_string() {
    let pairs = [
        ("add", Action::Add),
        ("remove", Action::Remove),
        ("change", Action::Change),
        ("move", Action::Move),
        ("online", Action::Online),
        ("offline", Action::Offline),
        ("bind", Action::Bind),
        ("unbind", Action::Unbind),
    ];
    for (raw, expected) in pairs {
        let payload = frame_entries(&[&format!("ACTION={raw}")]);
        assert_eq!(decode_identify_payload(&payload).unwrap().action, Some(expected));
    }
}

#[test]
fn rejects_an_unrecognised_action_value() {
    let payload = frame_entries(&["ACTION=reboot"]);
    assert!(decode_identify_payload(&payload).is_err());
}

#[test]
fn rejects_an_entry_without_an_equals_sign() {
    let payload = frame_entries(&["NOT_A_KEY_VALUE_PAIR"]);
    assert!(decode_identify_payload(&payload).is_err());
}

#[test]
fn rejects_unparsable_integer_values() {
    let payload = frame_entries(&["MAJOR=not-a-number"]);
    assert!(decode_identify_payload(&payload).is_err());
}

#[test]
fn empty_payload_yields_a_default_record() {
    let record = decode_identify_payload(&[]).unwrap();
    assert_eq!(record.action, None);
    assert_eq!(record.major, None);
}
