use blockdelta::compress::{Compression, compress_patch};
use blockdelta::engine::{self, DiffOptions};
use blockdelta::hash::index::ChecksumIndex;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::fs;
use std::path::Path;

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

fn mutate(base: &[u8], stride: usize) -> Vec<u8> {
    let mut out = base.to_vec();
    for i in (0..out.len()).step_by(stride.max(1)) {
        out[i] = out[i].wrapping_add(1);
    }
    out
}

fn diff_with_block(old: &[u8], new: &[u8], block_size: usize) -> Vec<u8> {
    let mut patch = Vec::new();
    engine::diff_with_options(
        old,
        new,
        &mut patch,
        &DiffOptions {
            block_size,
            ..Default::default()
        },
    )
    .unwrap();
    patch
}

fn write_ratio_snapshot() {
    let old = gen_data(2 * 1024 * 1024, 123);
    let new = mutate(&old, 4096);
    let mut csv = String::from("block_size,patch_bytes,new_bytes,ratio\n");
    for block_size in [4usize, 8, 16, 32, 64, 128, 256] {
        let patch = diff_with_block(&old, &new, block_size);
        let ratio = patch.len() as f64 / new.len() as f64;
        csv.push_str(&format!(
            "{block_size},{},{},{}\n",
            patch.len(),
            new.len(),
            ratio
        ));
    }
    let out_dir = Path::new("target/criterion/custom_reports");
    let _ = fs::create_dir_all(out_dir);
    let _ = fs::write(out_dir.join("ratio_snapshot.csv"), csv);
}

fn bench_diff_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("diff_speed_mb_s");
    for size in [64 * 1024usize, 1024 * 1024, 8 * 1024 * 1024] {
        let old = gen_data(size, 1);
        let new = mutate(&old, 1024);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let patch = engine::diff(black_box(&old), black_box(&new)).unwrap();
                black_box(patch);
            });
        });
    }
    g.finish();
}

fn bench_apply_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("apply_speed_mb_s");
    for size in [64 * 1024usize, 1024 * 1024, 8 * 1024 * 1024] {
        let old = gen_data(size, 2);
        let new = mutate(&old, 2048);
        let patch = engine::diff(&old, &new).unwrap();
        g.throughput(Throughput::Bytes(new.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let out = engine::apply(black_box(&old), black_box(&patch)).unwrap();
                black_box(out);
            });
        });
    }
    g.finish();
}

fn bench_ratio_vs_block_size(c: &mut Criterion) {
    write_ratio_snapshot();
    let mut g = c.benchmark_group("patch_ratio_vs_block_size");
    let old = gen_data(2 * 1024 * 1024, 3);
    let new = mutate(&old, 4096);
    for block_size in [8usize, 16, 32, 64] {
        g.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, block_size| {
                b.iter(|| {
                    let patch = diff_with_block(&old, &new, *block_size);
                    let ratio = patch.len() as f64 / new.len() as f64;
                    black_box(ratio);
                });
            },
        );
    }
    g.finish();
}

fn bench_index_build(c: &mut Criterion) {
    let mut g = c.benchmark_group("checksum_index_build");
    for size in [64 * 1024usize, 1024 * 1024] {
        let old = gen_data(size, 4);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let index = ChecksumIndex::build(black_box(&old), 16);
                black_box(index.len());
            });
        });
    }
    g.finish();
}

fn bench_patch_compression(c: &mut Criterion) {
    let mut g = c.benchmark_group("patch_compression");
    let old = gen_data(1024 * 1024, 5);
    let new = mutate(&old, 512);
    let patch = engine::diff(&old, &new).unwrap();

    let mut modes = vec![("none", Compression::None)];
    #[cfg(feature = "lzma")]
    modes.push(("lzma", Compression::Lzma));
    #[cfg(feature = "zlib")]
    modes.push(("zlib", Compression::Zlib { level: 6 }));

    for (name, mode) in modes {
        g.bench_function(name, |b| {
            b.iter(|| {
                let packed = compress_patch(black_box(&patch), mode).unwrap();
                black_box(packed);
            });
        });
    }
    g.finish();
}

fn bench_real_world_scenarios(c: &mut Criterion) {
    let mut g = c.benchmark_group("real_world_scenarios");
    let scenarios = [
        ("software_update", 4 * 1024 * 1024usize, 1024usize),
        ("document_versioning", 512 * 1024usize, 256usize),
        ("database_snapshot", 8 * 1024 * 1024usize, 4096usize),
        ("compressed_payload", 2 * 1024 * 1024usize, 16384usize),
    ];

    for (name, size, stride) in scenarios {
        let old = gen_data(size, size as u64);
        let new = mutate(&old, stride);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_function(name, |b| {
            b.iter(|| {
                let patch = engine::diff(&old, &new).unwrap();
                let out = engine::apply(&old, &patch).unwrap();
                black_box(out);
            });
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_diff_speed,
    bench_apply_speed,
    bench_ratio_vs_block_size,
    bench_index_build,
    bench_patch_compression,
    bench_real_world_scenarios
);
criterion_main!(benches);
