use blockdelta::compress::Compression;
use blockdelta::engine::{ApplyOptions, DiffOptions};
use blockdelta::io::{apply_file, diff_file};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tempfile::NamedTempFile;

#[test]
#[ignore = "large-file test is opt-in due runtime and memory requirements"]
fn sixteen_mib_scattered_edits_roundtrip() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut old_data = vec![0u8; 16 * 1024 * 1024];
    rng.fill_bytes(&mut old_data);

    let mut new_data = old_data.clone();
    for _ in 0..256 {
        let at = rng.random_range(0..new_data.len());
        new_data[at] = new_data[at].wrapping_add(1);
    }
    new_data.splice(1 << 20..1 << 20, b"middle-chunk".iter().copied());
    new_data.truncate(new_data.len() - 4096);

    let old = NamedTempFile::new().unwrap();
    let new = NamedTempFile::new().unwrap();
    let patch = NamedTempFile::new().unwrap();
    let output = NamedTempFile::new().unwrap();
    std::fs::write(old.path(), &old_data).unwrap();
    std::fs::write(new.path(), &new_data).unwrap();

    let stats = diff_file(
        old.path(),
        new.path(),
        patch.path(),
        &DiffOptions::default(),
        Compression::None,
    )
    .unwrap();
    assert!(stats.patch_size < stats.new_size / 8);
    assert!(stats.copied_bytes > stats.literal_bytes);

    let applied = apply_file(
        old.path(),
        patch.path(),
        output.path(),
        &ApplyOptions::default(),
    )
    .unwrap();
    assert_eq!(applied.output_size, new_data.len() as u64);
    assert_eq!(std::fs::read(output.path()).unwrap(), new_data);
}

#[test]
fn zero_filled_inputs_roundtrip() {
    // Every window of the old file lands in one bucket.
    let old_data = vec![0u8; 64 * 1024];
    let mut new_data = old_data.clone();
    new_data[32 * 1024] = 1;

    let old = NamedTempFile::new().unwrap();
    let new = NamedTempFile::new().unwrap();
    let patch = NamedTempFile::new().unwrap();
    let output = NamedTempFile::new().unwrap();
    std::fs::write(old.path(), &old_data).unwrap();
    std::fs::write(new.path(), &new_data).unwrap();

    let stats = diff_file(
        old.path(),
        new.path(),
        patch.path(),
        &DiffOptions::default(),
        Compression::None,
    )
    .unwrap();
    assert!(stats.patch_size < 256);

    apply_file(
        old.path(),
        patch.path(),
        output.path(),
        &ApplyOptions::default(),
    )
    .unwrap();
    assert_eq!(std::fs::read(output.path()).unwrap(), new_data);
}
