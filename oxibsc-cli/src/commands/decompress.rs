//! Decompress command implementation.

use crate::utils::{create_spinner, decompressed_path};
use log::info;
use oxibsc::FrameDecoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub fn cmd_decompress(
    input: &Path,
    output: Option<&Path>,
    force: bool,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.map_or_else(|| decompressed_path(input), Path::to_path_buf);
    if output.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            output.display()
        )
        .into());
    }

    let mut decoder = FrameDecoder::new(BufReader::new(File::open(input)?))?;
    let mut writer = BufWriter::new(File::create(&output)?);

    let pb = create_spinner(progress);
    let mut written = 0u64;
    while let Some(block) = decoder.read_block()? {
        writer.write_all(block)?;
        written += block.len() as u64;
        pb.set_position(written);
    }
    writer.flush()?;
    pb.finish_and_clear();

    info!(
        "decoded {} blocks into {}",
        decoder.blocks_read(),
        output.display()
    );
    println!(
        "{} -> {}: {} bytes",
        input.display(),
        output.display(),
        written
    );
    Ok(())
}
