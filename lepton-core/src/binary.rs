use crate::arch::{resolve, Architecture};
use crate::error::ElfError;
use crate::header::{decode_raw, synthesize, Header, HeaderMode};
use crate::program_header::ProgramHeaderTable;
use crate::recompose::{recompose, splice_header};
use anyhow::{Context, Result};

/// Decodes the header in `mode` and the program header table it points at.
///
/// Magic and architecture failures abort before anything is decoded. A file
/// that ends inside the header or the table comes back as a recoverable error
/// carrying the header, see [`ElfError::header`].
pub fn parse(
    buffer: &[u8],
    mode: HeaderMode,
) -> Result<(Header, ProgramHeaderTable), ElfError> {
    let arch = resolve(buffer)?;
    let header = decode_header(buffer, arch, mode)?;
    let table = ProgramHeaderTable::decode(buffer, &header)?;
    Ok((header, table))
}

fn decode_header(
    buffer: &[u8],
    arch: &Architecture,
    mode: HeaderMode,
) -> Result<Header, ElfError> {
    match mode {
        HeaderMode::Raw => decode_raw(buffer, arch),
        HeaderMode::Synthetic => synthesize(buffer, arch),
    }
}

/// A file loaded into memory along with its decoded header region.
pub struct ElfFile {
    pub path: String,
    pub buffer: Vec<u8>,
    pub arch: &'static Architecture,
    pub header: Header,
    pub program_headers: ProgramHeaderTable,
}

impl ElfFile {
    pub fn open<P: AsRef<std::path::Path>>(path: P, mode: HeaderMode) -> Result<Self> {
        let buffer = std::fs::read(&path)
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        let mut file = Self::from_bytes(buffer, mode)?;
        file.path = path.as_ref().display().to_string();
        Ok(file)
    }

    pub fn from_bytes(buffer: Vec<u8>, mode: HeaderMode) -> Result<Self, ElfError> {
        let arch = resolve(&buffer)?;
        let header = decode_header(&buffer, arch, mode)?;
        let program_headers = ProgramHeaderTable::decode(&buffer, &header)?;
        log::info!(
            "{} {}-bit, {} program headers, {:?} header",
            arch.name,
            arch.class.bits(),
            program_headers.len(),
            mode
        );
        Ok(Self {
            path: String::new(),
            buffer,
            arch,
            header,
            program_headers,
        })
    }

    /// See [`recompose`]. Updates `self.header` with the new entry point.
    pub fn recompose(&mut self) -> Result<Vec<u8>, ElfError> {
        recompose(&self.buffer, &mut self.header, &self.program_headers)
    }

    /// Zeroes the section header fields and splices the header back over the file.
    pub fn strip_section_headers(&mut self) -> Result<Vec<u8>, ElfError> {
        self.header.clear_section_headers();
        splice_header(&self.buffer, &self.header)
    }

    pub fn entry_point(&self) -> u64 {
        self.header.entry_point()
    }
}
