#![no_main]
use blockdelta::engine::{self, DiffOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte picks the block size and header options.
    let flags = data[0];
    let payload = &data[1..];
    let opts = DiffOptions {
        block_size: 4 + (flags & 0x1F) as usize,
        checksums: flags & 0x20 != 0,
        wide_offsets: flags & 0x40 != 0,
    };

    // Split payload into "old" and "new".
    let split = payload.len() / 2;
    let (old, new) = payload.split_at(split);
    if old.len() < opts.block_size || new.len() < opts.block_size {
        return;
    }

    let mut patch = Vec::new();
    engine::diff_with_options(old, new, &mut patch, &opts).unwrap();
    let rebuilt = engine::apply(old, &patch).unwrap();
    assert_eq!(rebuilt, new);
});
