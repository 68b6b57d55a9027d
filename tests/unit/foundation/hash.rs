use super::*;

#[test]
fn fingerprint_is_content_addressed() {
    let a = Fingerprint::of_bytes(b"\x89PNG....");
    let b = Fingerprint::of_bytes(&b"\x89PNG....".to_vec());
    assert_eq!(a, b);
    assert_ne!(a, Fingerprint::of_bytes(&b"\x89PNG...."[..7]));
}

#[test]
fn length_prefix_separates_concatenations() {
    let mut a = StableHasher::new();
    a.write_str("ab");
    a.write_str("c");
    let mut b = StableHasher::new();
    b.write_str("a");
    b.write_str("bc");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn short_hex_has_eight_digits() {
    assert_eq!(Fingerprint::of_bytes(b"x").short_hex().len(), 8);
}
