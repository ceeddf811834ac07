#![no_main]
use blockdelta::compress::decompress_patch;
use blockdelta::patch::{PatchReader, apply_memory};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a patch: errors only, never a panic.
    let _ = apply_memory(&[], data);

    // Also with a non-empty old buffer.
    if data.len() >= 2 {
        let split = data.len() / 2;
        let (old, patch) = data.split_at(split);
        let _ = apply_memory(old, patch);

        if let Ok(mut reader) = PatchReader::new(patch) {
            while let Ok(Some(_)) = reader.next_op() {}
        }
    }

    let _ = decompress_patch(data);
});
