use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use goblin::elf::header::{et_to_str, machine_to_str};
use goblin::elf::program_header::pt_to_str;
use lepton_core::{ElfError, ElfFile, Header, HeaderField, HeaderMode, Segment};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// Inspect and rebuild the header region of ELF executables
#[derive(Parser)]
#[command(
    name = "lepton",
    about = "Inspect ELF headers and rebuild them so the binary stays loadable",
    version,
    author
)]
struct Cli {
    /// Path to binary file
    #[arg(required = true)]
    path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the ELF header fields
    Header {
        /// Show the canonical header lepton would write instead of the file's own
        #[arg(long)]
        synthetic: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show entry point of binary
    Entry,
    /// List the program header table
    Segments {
        #[arg(long)]
        json: bool,
    },
    /// Move the program header table out of the header and fix up the entry point
    Recompose {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Zero the section header fields of the ELF header
    StripSections {
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Serialize, Tabled)]
struct FieldRow {
    field: &'static str,
    offset: usize,
    value: String,
}

impl FieldRow {
    fn new(field: &HeaderField) -> Self {
        let mut value = field.value.to_string();
        let raw = field.value.as_u64().unwrap_or_default();
        match field.name {
            "e_type" => value = format!("{value} ({})", et_to_str(raw as u16)),
            "e_machine" => value = format!("{value} ({})", machine_to_str(raw as u16)),
            _ => {}
        }
        Self {
            field: field.name,
            offset: field.offset,
            value,
        }
    }
}

#[derive(Serialize, Tabled)]
struct SegmentRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "VirtAddr")]
    vaddr: String,
    #[tabled(rename = "PhysAddr")]
    paddr: String,
    #[tabled(rename = "FileSiz")]
    filesz: String,
    #[tabled(rename = "MemSiz")]
    memsz: String,
    #[tabled(rename = "Align")]
    align: String,
}

impl From<&Segment> for SegmentRow {
    fn from(s: &Segment) -> Self {
        let flag = |bit: u32, c: char| if s.p_flags & bit != 0 { c } else { ' ' };
        Self {
            kind: pt_to_str(s.p_type).to_string(),
            flags: [flag(4, 'R'), flag(2, 'W'), flag(1, 'E')].iter().collect(),
            offset: format!("{:#x}", s.p_offset),
            vaddr: format!("{:#x}", s.p_vaddr),
            paddr: format!("{:#x}", s.p_paddr),
            filesz: format!("{:#x}", s.p_filesz),
            memsz: format!("{:#x}", s.p_memsz),
            align: format!("{:#x}", s.p_align),
        }
    }
}

fn print_header(header: &Header, available: Option<usize>, json: bool) -> Result<()> {
    let rows: Vec<FieldRow> = header
        .fields()
        .iter()
        .filter(|f| available.is_none_or(|len| f.present_in(len)))
        .map(FieldRow::new)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!("  {:<12} {}", row.field.bold(), row.value);
        }
    }
    if available.is_some() {
        eprintln!(
            "{}",
            "file is smaller than the expected header size".yellow()
        );
    }
    Ok(())
}

/// Picks out the header a failed open still decoded, with the byte count to
/// filter its fields by when the header itself was cut short.
fn recovered_header(err: &anyhow::Error) -> Option<(&Header, Option<usize>)> {
    match err.downcast_ref::<ElfError>()? {
        ElfError::HeaderTruncated {
            available, partial, ..
        } => Some((&**partial, Some(*available))),
        ElfError::ProgramHeaderTruncated { header, .. } => Some((&**header, None)),
        _ => None,
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Header { synthetic, json } => {
            let mode = if synthetic {
                HeaderMode::Synthetic
            } else {
                HeaderMode::Raw
            };
            match ElfFile::open(&cli.path, mode) {
                Ok(bin) => print_header(&bin.header, None, json)?,
                Err(err) => match recovered_header(&err) {
                    Some((header, available)) => {
                        print_header(header, available, json)?;
                        if available.is_none() {
                            eprintln!("{}", err.to_string().yellow());
                        }
                    }
                    None => return Err(err),
                },
            }
        }

        Command::Entry => {
            let bin = ElfFile::open(&cli.path, HeaderMode::Raw)?;
            println!("Raw entry point: {:02x?}", bin.header.entry_bytes());
            println!("Entry point: 0x{:x}", bin.entry_point());
        }

        Command::Segments { json } => {
            let bin = ElfFile::open(&cli.path, HeaderMode::Raw)?;
            let rows: Vec<SegmentRow> = bin
                .program_headers
                .segments()
                .iter()
                .map(SegmentRow::from)
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No program headers found.");
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Command::Recompose { output } => {
            let mut bin = ElfFile::open(&cli.path, HeaderMode::Synthetic)?;
            log::debug!("{} is {} bytes", bin.path, bin.buffer.len());
            let before = bin.entry_point();
            let bytes = bin
                .recompose()
                .with_context(|| format!("recomposing {}", bin.path))?;
            write_output(&output, &bytes)?;
            if before != bin.entry_point() {
                println!(
                    "Entry point: 0x{:x} -> {}",
                    before,
                    format!("0x{:x}", bin.entry_point()).green()
                );
            }
            print_header(&bin.header, None, false)?;
        }

        Command::StripSections { output } => {
            let mut bin = ElfFile::open(&cli.path, HeaderMode::Raw)?;
            let bytes = bin.strip_section_headers()?;
            write_output(&output, &bytes)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn recompose_requires_output() {
        assert!(Cli::try_parse_from(["lepton", "a.out", "recompose"]).is_err());
        let cli = Cli::try_parse_from(["lepton", "a.out", "recompose", "-o", "b.out"]).unwrap();
        assert!(matches!(cli.command, Command::Recompose { .. }));
    }

    #[test]
    fn truncated_files_still_yield_a_header() {
        let mut buf = vec![0u8; 64];
        buf[..4].copy_from_slice(b"\x7fELF");
        buf[4..7].copy_from_slice(&[2, 1, 1]);
        buf[18] = 0x3e;
        buf[24..32].copy_from_slice(&0x401000u64.to_le_bytes());
        buf[32] = 64; // e_phoff
        buf[56] = 1; // e_phnum

        let short_header = ElfFile::from_bytes(buf[..50].to_vec(), HeaderMode::Raw)
            .err()
            .map(anyhow::Error::from)
            .unwrap();
        let (header, available) = recovered_header(&short_header).unwrap();
        assert_eq!(available, Some(50));
        assert_eq!(header.entry_point(), 0x401000);

        buf.extend([0u8; 20]);
        let short_table = ElfFile::from_bytes(buf, HeaderMode::Raw)
            .err()
            .map(anyhow::Error::from)
            .unwrap();
        let (header, available) = recovered_header(&short_table).unwrap();
        assert_eq!(available, None);
        assert_eq!(header.phnum(), 1);

        let bad_magic = anyhow::Error::from(ElfError::MagicMismatch { found: vec![0; 4] });
        assert!(recovered_header(&bad_magic).is_none());
    }

    #[test]
    fn segment_rows_spell_out_flags() {
        let row = SegmentRow::from(&Segment {
            p_type: 1,
            p_flags: 5,
            p_offset: 0,
            p_vaddr: 0x400000,
            p_paddr: 0x400000,
            p_filesz: 0x1a4,
            p_memsz: 0x1a4,
            p_align: 0x1000,
        });
        assert_eq!(row.kind, "PT_LOAD");
        assert_eq!(row.flags, "R E");
        assert_eq!(row.vaddr, "0x400000");
    }
}
