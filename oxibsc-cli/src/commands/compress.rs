//! Compress command implementation.

use crate::utils::{compressed_path, create_progress_bar, space_saving};
use log::info;
use oxibsc::{CodecConfig, FrameEncoder};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Read granularity when feeding the encoder.
const CHUNK_SIZE: usize = 64 * 1024;

/// Options for the compress command.
pub struct CompressOptions<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub block_size_kib: usize,
    pub checksum: bool,
    pub force: bool,
    pub progress: bool,
}

pub fn cmd_compress(opts: &CompressOptions<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let output = opts
        .output
        .map_or_else(|| compressed_path(opts.input), Path::to_path_buf);
    if output.exists() && !opts.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            output.display()
        )
        .into());
    }

    let config = CodecConfig::new(opts.block_size_kib.saturating_mul(1024))
        .with_checksum(opts.checksum);
    config.validate()?;

    let mut input = File::open(opts.input)?;
    let total = input.metadata()?.len();
    let writer = BufWriter::new(File::create(&output)?);
    let mut encoder = FrameEncoder::new(writer, config)?;

    let pb = create_progress_bar(total, opts.progress);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = input.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        encoder.write_all(&chunk[..n])?;
        pb.inc(n as u64);
    }

    let original = encoder.bytes_in();
    let mut writer = encoder.finish()?;
    writer.flush()?;
    pb.finish_and_clear();

    let compressed = std::fs::metadata(&output)?.len();
    info!("wrote {}", output.display());
    println!(
        "{} -> {}: {} -> {} bytes ({:.1}% saved)",
        opts.input.display(),
        output.display(),
        original,
        compressed,
        space_saving(original, compressed)
    );
    Ok(())
}
