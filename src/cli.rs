// Command-line front end for blockdelta.
//
// Subcommands map one-to-one onto the library's file pipeline:
// `diff` creates a patch, `apply` reconstructs a file, `info` inspects a
// patch without applying it, `config` prints build details.

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::compress::backend::Compression;
use crate::engine::{ApplyOptions, DiffOptions};
use crate::error::Error;
use crate::hash::config::{DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};
use crate::io::{self as file_io, ApplyStats, DiffStats};
use crate::patch::decoder::PatchReader;
use crate::patch::header::FORMAT_VERSION;
use crate::patch::ops::{OffsetWidth, PatchOp};

const DEFAULT_ZLIB_LEVEL: u32 = 6;

/// Exit status for a patch built with the other offset width. Clap reserves 2.
const EXIT_WIDTH_MISMATCH: i32 = 3;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Block-hash binary delta encoder/decoder.
#[derive(Parser, Debug)]
#[command(
    name = "blockdelta",
    version,
    about = "Block-hash binary delta encoder/decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Create a patch turning OLD into NEW.
    Diff(DiffArgs),
    /// Apply a patch to OLD, writing the reconstructed file.
    Apply(ApplyArgs),
    /// Print a patch's header and op summary.
    Info(InfoArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CompressionArg {
    None,
    Lzma,
    Zlib,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WidthArg {
    #[value(name = "4")]
    Four,
    #[value(name = "8")]
    Eight,
}

#[derive(Args, Debug)]
struct DiffArgs {
    /// Original file.
    #[arg(value_hint = ValueHint::FilePath)]
    old: PathBuf,

    /// Updated file.
    #[arg(value_hint = ValueHint::FilePath)]
    new: PathBuf,

    /// Patch file to write.
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// Window size used to index and anchor matches.
    #[arg(
        long = "block-size",
        short = 'b',
        value_parser = clap::value_parser!(u64).range(MIN_BLOCK_SIZE as u64..=MAX_BLOCK_SIZE as u64),
        default_value_t = DEFAULT_BLOCK_SIZE as u64
    )]
    block_size: u64,

    /// Do not record old/new checksums in the patch.
    #[arg(long = "no-checksum")]
    no_checksum: bool,

    /// Always write 8-byte offset fields.
    #[arg(long = "wide-offsets")]
    wide_offsets: bool,

    /// Compression applied to the finished patch.
    #[arg(long, short = 'c', value_enum, default_value_t = CompressionArg::Lzma)]
    compression: CompressionArg,

    /// Zlib compression level (0-9).
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(0..=9), default_value_t = DEFAULT_ZLIB_LEVEL)]
    level: u32,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Original file the patch was made against.
    #[arg(value_hint = ValueHint::FilePath)]
    old: PathBuf,

    /// Patch file (raw or compressed).
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// Reconstructed file to write.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Only accept patches using this offset width (bytes).
    #[arg(long = "offset-width", value_enum)]
    offset_width: Option<WidthArg>,

    /// Skip base and result checksum verification.
    #[arg(long = "no-checksum")]
    no_checksum: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Patch file (raw or compressed).
    #[arg(value_hint = ValueHint::FilePath)]
    patch: PathBuf,

    /// List every op.
    #[arg(long)]
    ops: bool,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Diff,
    Apply,
    Info,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    inputs: Vec<PathBuf>,
    output_file: Option<PathBuf>,
    diff: DiffOptions,
    compression: Compression,
    apply: ApplyOptions,
    list_ops: bool,
}

fn compression_for(arg: CompressionArg, level: u32) -> Compression {
    match arg {
        CompressionArg::None => Compression::None,
        #[cfg(feature = "lzma")]
        CompressionArg::Lzma => Compression::Lzma,
        #[cfg(feature = "zlib")]
        CompressionArg::Zlib => Compression::Zlib { level },
        #[allow(unreachable_patterns)]
        other => {
            let _ = level;
            eprintln!("blockdelta: warning: {other:?} compression not built in, writing raw patch");
            Compression::None
        }
    }
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Config,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        inputs: Vec::new(),
        output_file: None,
        diff: DiffOptions::default(),
        compression: Compression::default(),
        apply: ApplyOptions::default(),
        list_ops: false,
    };

    match cli.command {
        Cmd::Diff(args) => {
            opts.command = Command::Diff;
            opts.inputs = vec![args.old, args.new];
            opts.output_file = Some(args.patch);
            opts.diff = DiffOptions {
                block_size: args.block_size as usize,
                checksums: !args.no_checksum,
                wide_offsets: args.wide_offsets,
            };
            opts.compression = compression_for(args.compression, args.level);
        }
        Cmd::Apply(args) => {
            opts.command = Command::Apply;
            opts.inputs = vec![args.old, args.patch];
            opts.output_file = Some(args.output);
            opts.apply = ApplyOptions {
                offset_width: args.offset_width.map(|w| match w {
                    WidthArg::Four => OffsetWidth::Four,
                    WidthArg::Eight => OffsetWidth::Eight,
                }),
                verify_checksums: !args.no_checksum,
            };
        }
        Cmd::Info(args) => {
            opts.command = Command::Info;
            opts.inputs = vec![args.patch];
            opts.list_ops = args.ops;
        }
        Cmd::Config => {}
    }
    opts
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("blockdelta".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn hex(digest: Option<[u8; 32]>) -> Option<String> {
    digest.map(|d| d.iter().map(|b| format!("{b:02x}")).collect())
}

fn check_output(path: &Path, force: bool) -> Result<(), i32> {
    if path.exists() && !force {
        eprintln!(
            "blockdelta: output file exists, use -f to overwrite: {}",
            path.display()
        );
        return Err(1);
    }
    Ok(())
}

fn report_error(what: &str, e: &Error) -> i32 {
    eprintln!("blockdelta: {what}: {e}");
    if e.is_width_mismatch() {
        EXIT_WIDTH_MISMATCH
    } else {
        1
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => eprintln!("blockdelta: json: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("blockdelta version {version} (Rust)");

    let lzma = cfg!(feature = "lzma") as u8;
    let zlib = cfg!(feature = "zlib") as u8;
    let file_io = cfg!(feature = "file-io") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("COMPRESS_LZMA={lzma}");
    eprintln!("COMPRESS_ZLIB={zlib}");
    eprintln!("FILE_IO={file_io}");
    eprintln!("FORMAT_VERSION={FORMAT_VERSION}");
    eprintln!("DEFAULT_BLOCK_SIZE={DEFAULT_BLOCK_SIZE}");
    eprintln!("MIN_BLOCK_SIZE={MIN_BLOCK_SIZE}");
    eprintln!("MAX_BLOCK_SIZE={MAX_BLOCK_SIZE}");
    eprintln!("DEFAULT_COMPRESSION={:?}", Compression::default());
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Diff command
// ---------------------------------------------------------------------------

fn cmd_diff(opts: &Options) -> i32 {
    let [old, new] = opts.inputs.as_slice() else {
        eprintln!("blockdelta: diff requires OLD and NEW files");
        return 1;
    };
    let Some(patch) = opts.output_file.as_deref() else {
        eprintln!("blockdelta: diff requires a PATCH file");
        return 1;
    };
    if let Err(code) = check_output(patch, opts.force) {
        return code;
    }

    let stats = match file_io::diff_file(old, new, patch, &opts.diff, opts.compression) {
        Ok(s) => s,
        Err(e) => return report_error("diff", &e),
    };

    if opts.verbose > 0 && !opts.quiet {
        print_diff_stats(&stats);
    }
    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "diff",
            "old_size": stats.old_size,
            "new_size": stats.new_size,
            "raw_patch_size": stats.raw_patch_size,
            "patch_size": stats.patch_size,
            "compression": stats.compression,
            "offset_width": stats.offset_width.bytes(),
            "copy_ops": stats.copy_ops,
            "insert_ops": stats.insert_ops,
            "copied_bytes": stats.copied_bytes,
            "literal_bytes": stats.literal_bytes,
            "old_sha256": hex(stats.old_sha256),
            "new_sha256": hex(stats.new_sha256),
        }));
    }
    0
}

fn print_diff_stats(stats: &DiffStats) {
    eprintln!(
        "blockdelta: diff: old size: {}, new size: {}, patch size: {} ({} raw, {})",
        stats.old_size, stats.new_size, stats.patch_size, stats.raw_patch_size, stats.compression
    );
    eprintln!(
        "blockdelta: diff: {} copies ({} bytes), {} inserts ({} bytes), {}-byte offsets",
        stats.copy_ops,
        stats.copied_bytes,
        stats.insert_ops,
        stats.literal_bytes,
        stats.offset_width
    );
}

// ---------------------------------------------------------------------------
// Apply command
// ---------------------------------------------------------------------------

fn cmd_apply(opts: &Options) -> i32 {
    let [old, patch] = opts.inputs.as_slice() else {
        eprintln!("blockdelta: apply requires OLD and PATCH files");
        return 1;
    };
    let Some(output) = opts.output_file.as_deref() else {
        eprintln!("blockdelta: apply requires an OUTPUT file");
        return 1;
    };
    if let Err(code) = check_output(output, opts.force) {
        return code;
    }

    let stats = match file_io::apply_file(old, patch, output, &opts.apply) {
        Ok(s) => s,
        Err(e) => return report_error("apply", &e),
    };

    if opts.verbose > 0 && !opts.quiet {
        print_apply_stats(&stats);
    }
    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "apply",
            "old_size": stats.old_size,
            "patch_size": stats.patch_size,
            "output_size": stats.output_size,
            "offset_width": stats.offset_width.bytes(),
            "verified": stats.verified,
            "output_sha256": hex(stats.output_sha256),
        }));
    }
    0
}

fn print_apply_stats(stats: &ApplyStats) {
    let verified = if stats.verified {
        "verified"
    } else {
        "unverified"
    };
    eprintln!(
        "blockdelta: apply: old size: {}, patch size: {}, output size: {} ({verified})",
        stats.old_size, stats.patch_size, stats.output_size
    );
}

// ---------------------------------------------------------------------------
// Info command
// ---------------------------------------------------------------------------

fn cmd_info(opts: &Options) -> i32 {
    let [path] = opts.inputs.as_slice() else {
        eprintln!("blockdelta: info requires a PATCH file");
        return 1;
    };

    let raw = match file_io::load_patch(path) {
        Ok(r) => r,
        Err(e) => return report_error("info", &e),
    };
    let mut reader = match PatchReader::new(&raw) {
        Ok(r) => r,
        Err(e) => return report_error("info", &e),
    };

    let header = *reader.header();
    println!("Patch file:             {}", path.display());
    println!("Format version:         {}", header.version);
    println!("Offset width:           {} bytes", header.offset_width);
    println!("Target size:            {}", header.target_size);
    if let Some(sums) = header.checksums {
        println!("Old checksum:           {:016x}", sums.old);
        println!("New checksum:           {:016x}", sums.new);
    } else {
        println!("Checksums:              none");
    }

    let (mut copies, mut inserts, mut copied, mut literal) = (0u64, 0u64, 0u64, 0u64);
    let mut index = 0u64;
    loop {
        let offset = reader.stream_offset();
        let op = match reader.next_op() {
            Ok(Some(op)) => op,
            Ok(None) => break,
            Err(e) => return report_error("info", &e),
        };
        if opts.list_ops {
            println!("  {index:6}  @{offset:<10} {op}");
        }
        match op {
            PatchOp::Copy { len, .. } => {
                copies += 1;
                copied += len;
            }
            PatchOp::Insert { data } => {
                inserts += 1;
                literal += data.len() as u64;
            }
        }
        index += 1;
    }

    println!("Copy ops:               {copies} ({copied} bytes)");
    println!("Insert ops:             {inserts} ({literal} bytes)");
    if reader.remaining() > 0 {
        println!("Trailing bytes:         {}", reader.remaining());
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "info",
            "version": header.version,
            "offset_width": header.offset_width.bytes(),
            "target_size": header.target_size,
            "copy_ops": copies,
            "insert_ops": inserts,
            "copied_bytes": copied,
            "literal_bytes": literal,
            "trailing_bytes": reader.remaining(),
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Parse arguments, run the selected command, and exit with its status.
///
/// Exit status is 0 on success, 2 when the patch uses an offset width this
/// run refuses, and 1 for every other failure.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    let default_filter = if opts.quiet {
        "error"
    } else {
        match opts.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Diff => cmd_diff(&opts),
        Command::Apply => cmd_apply(&opts),
        Command::Info => cmd_info(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
