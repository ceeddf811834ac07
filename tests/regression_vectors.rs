// Pinned wire-format vectors. A change to any of these bytes breaks every
// patch already shipped, so they are spelled out literally.

use blockdelta::engine::{self, DiffOptions};

fn hex_to_bytes(s: &str) -> Vec<u8> {
    let s: String = s.split_whitespace().collect();
    assert!(
        s.len().is_multiple_of(2),
        "hex string must have even length"
    );
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn localized_edit() -> (Vec<u8>, Vec<u8>) {
    let x = [0xAAu8; 20];
    let y = [0xBBu8; 20];
    (
        [&x[..], b"OLD!", &y[..]].concat(),
        [&x[..], b"NEWBYTES", &y[..]].concat(),
    )
}

fn diff_plain(old: &[u8], new: &[u8], wide_offsets: bool) -> Vec<u8> {
    let mut out = Vec::new();
    engine::diff_with_options(
        old,
        new,
        &mut out,
        &DiffOptions {
            checksums: false,
            wide_offsets,
            ..Default::default()
        },
    )
    .unwrap();
    out
}

const LOCALIZED_EDIT_NARROW: &str = "
    18112420 01000000 04000000 3000000000000000
    00 00000000 14000000
    01 08000000 4e45574259544553
    00 18000000 14000000
";

const LOCALIZED_EDIT_WIDE: &str = "
    18112420 01000000 08000000 3000000000000000
    00 0000000000000000 1400000000000000
    01 0800000000000000 4e45574259544553
    00 1800000000000000 1400000000000000
";

#[test]
fn localized_edit_narrow_bytes() {
    let (old, new) = localized_edit();
    let expected = hex_to_bytes(LOCALIZED_EDIT_NARROW);
    assert_eq!(diff_plain(&old, &new, false), expected);
    assert_eq!(engine::apply(&old, &expected).unwrap(), new);
}

#[test]
fn localized_edit_wide_bytes() {
    let (old, new) = localized_edit();
    let expected = hex_to_bytes(LOCALIZED_EDIT_WIDE);
    assert_eq!(diff_plain(&old, &new, true), expected);
    assert_eq!(engine::apply(&old, &expected).unwrap(), new);
}

#[test]
fn checksummed_header_layout() {
    let (old, new) = localized_edit();
    let patch = engine::diff(&old, &new).unwrap();
    let plain = hex_to_bytes(LOCALIZED_EDIT_NARROW);

    assert_eq!(&patch[0..4], &plain[0..4]);
    assert_eq!(&patch[4..8], &2u32.to_le_bytes());
    assert_eq!(&patch[8..20], &plain[8..20]);
    assert_eq!(
        &patch[20..28],
        &blockdelta::hash::checksum::buffer_checksum(&old).to_le_bytes()
    );
    assert_eq!(
        &patch[28..36],
        &blockdelta::hash::checksum::buffer_checksum(&new).to_le_bytes()
    );
    assert_eq!(&patch[36..], &plain[20..]);
}

#[test]
fn edge_case_matrix() {
    let block = b"0123456789abcdef";
    let cases: Vec<(&[u8], &[u8])> = vec![
        (block, block),
        (block, b"0123456789abcdefg"),
        (b"0123456789abcdefg", block),
        (block, b"fedcba9876543210"),
        (&[0u8; 16], &[0u8; 64]),
        (&[0u8; 64], &[0u8; 16]),
    ];

    for (old, new) in cases {
        let patch = engine::diff(old, new).unwrap();
        let rebuilt = engine::apply(old, &patch).unwrap();
        assert_eq!(rebuilt, new);
    }
}
