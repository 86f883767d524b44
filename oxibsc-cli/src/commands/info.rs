//! Info command implementation.

use crate::utils::space_saving;
use oxibsc::FrameDecoder;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// JSON output for stream information.
#[derive(Debug, Serialize)]
struct InfoJson {
    file: String,
    version: u8,
    block_size: u32,
    checksum: bool,
    blocks: u64,
    compressed_size: u64,
    original_size: u64,
    space_saving: f64,
}

pub fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let compressed_size = std::fs::metadata(input)?.len();
    let mut decoder = FrameDecoder::new(BufReader::new(File::open(input)?))?;
    let header = *decoder.header();

    let mut original_size = 0u64;
    while let Some(block) = decoder.read_block()? {
        original_size += block.len() as u64;
    }

    let info = InfoJson {
        file: input.display().to_string(),
        version: header.version,
        block_size: header.block_size,
        checksum: header.checksum,
        blocks: decoder.blocks_read(),
        compressed_size,
        original_size,
        space_saving: space_saving(original_size, compressed_size),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Stream Information");
    println!("==================");
    println!("File: {}", info.file);
    println!("Format version: {}", info.version);
    println!("Block size: {} bytes", info.block_size);
    println!(
        "Checksums: {}",
        if info.checksum { "CRC-32 per block" } else { "none" }
    );
    println!("Blocks: {}", info.blocks);
    println!("Compressed size: {} bytes", info.compressed_size);
    println!("Original size: {} bytes", info.original_size);
    println!("Space saving: {:.1}%", info.space_saving);
    Ok(())
}
