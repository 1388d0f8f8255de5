pub mod elf32;
pub mod elf64;

pub use elf32::Elf32Ehdr;
pub use elf64::Elf64Ehdr;

use crate::arch::{Architecture, Class, ELF_MAGIC};
use crate::error::ElfError;
use std::fmt;
use std::io::{self, Cursor};

/// Layout of one class of ELF file header.
pub trait FileHeader: fmt::Debug + Copy + Default + PartialEq {
    const CLASS: Class;

    /// Encoded size, which is also the canonical `e_ehsize`.
    const SIZE: usize;

    /// Returns the virtual address of the entry point.
    fn entry_point(&self) -> u64;

    /// Stores `entry` in `e_entry`. Returns false if it does not fit the field.
    fn set_entry_point(&mut self, entry: u64) -> bool;

    /// Returns the machine architecture identifier.
    fn machine(&self) -> u16;

    fn phnum(&self) -> u16;

    fn set_phnum(&mut self, phnum: u16);

    fn ident(&self) -> &[u8; 16];

    /// Reads fields in file order, stopping at the first one the reader can't supply.
    /// Fields after that keep their current values.
    fn read_fields<R: io::Read>(&mut self, cur: &mut R) -> io::Result<()>;

    /// Writes every field at its fixed offset. `out` is exactly `SIZE` bytes.
    fn write_fields(&self, out: &mut [u8]);

    /// Fields in file order, for presentation.
    fn fields(&self) -> Vec<HeaderField>;

    /// Minimal loadable header keeping only type, machine, entry and phnum.
    fn canonical(&self, ident: [u8; 16]) -> Self;

    /// Zeroes `e_shoff`, `e_shentsize`, `e_shnum` and `e_shstrndx`.
    fn clear_section_headers(&mut self);

    /// Decodes what `buffer` holds. The flag is false when the buffer ended early;
    /// the missing trailing fields are then zero.
    fn decode_partial(buffer: &[u8]) -> (Self, bool) {
        let mut hdr = Self::default();
        let complete = hdr.read_fields(&mut Cursor::new(buffer)).is_ok();
        (hdr, complete)
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE];
        self.write_fields(&mut out);
        out
    }
}

/// Whether a header is the file's own bytes or a rebuilt canonical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderMode {
    Raw,
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ehdr {
    Elf32(Elf32Ehdr),
    Elf64(Elf64Ehdr),
}

macro_rules! with_ehdr {
    ($ehdr:expr, $h:ident => $body:expr) => {
        match $ehdr {
            Ehdr::Elf32($h) => $body,
            Ehdr::Elf64($h) => $body,
        }
    };
}

/// A decoded or synthesized ELF file header.
///
/// `ehdr` may be edited in place before encoding (for example to drop the
/// section header fields); the mode is fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    mode: HeaderMode,
    pub ehdr: Ehdr,
}

impl Header {
    pub fn new(mode: HeaderMode, ehdr: Ehdr) -> Self {
        Self { mode, ehdr }
    }

    pub fn mode(&self) -> HeaderMode {
        self.mode
    }

    pub fn class(&self) -> Class {
        match self.ehdr {
            Ehdr::Elf32(_) => Elf32Ehdr::CLASS,
            Ehdr::Elf64(_) => Elf64Ehdr::CLASS,
        }
    }

    /// Encoded size: 52 or 64 bytes.
    pub fn size(&self) -> usize {
        match self.ehdr {
            Ehdr::Elf32(_) => Elf32Ehdr::SIZE,
            Ehdr::Elf64(_) => Elf64Ehdr::SIZE,
        }
    }

    pub fn entry_point(&self) -> u64 {
        with_ehdr!(&self.ehdr, h => h.entry_point())
    }

    /// Raw little-endian `e_entry` bytes at the class width.
    pub fn entry_bytes(&self) -> Vec<u8> {
        match &self.ehdr {
            Ehdr::Elf32(h) => h.e_entry.to_le_bytes().to_vec(),
            Ehdr::Elf64(h) => h.e_entry.to_le_bytes().to_vec(),
        }
    }

    /// Overwrites `e_entry`. Fails if `entry` does not fit a 32-bit header.
    pub fn set_entry_point(&mut self, entry: u64) -> Result<(), ElfError> {
        if with_ehdr!(&mut self.ehdr, h => h.set_entry_point(entry)) {
            Ok(())
        } else {
            Err(ElfError::MalformedOffset {
                offset: entry as i128,
                limit: u32::MAX as u64,
            })
        }
    }

    pub fn machine(&self) -> u16 {
        with_ehdr!(&self.ehdr, h => h.machine())
    }

    pub fn phnum(&self) -> u16 {
        with_ehdr!(&self.ehdr, h => h.phnum())
    }

    pub fn ident(&self) -> &[u8; 16] {
        with_ehdr!(&self.ehdr, h => h.ident())
    }

    pub fn fields(&self) -> Vec<HeaderField> {
        with_ehdr!(&self.ehdr, h => h.fields())
    }

    pub fn clear_section_headers(&mut self) {
        with_ehdr!(&mut self.ehdr, h => h.clear_section_headers())
    }

    /// Concatenates the fields in ELF order.
    pub fn to_bytes(&self) -> Vec<u8> {
        with_ehdr!(&self.ehdr, h => h.encode())
    }
}

/// Reads every header field verbatim from `buffer`.
///
/// A buffer shorter than the header yields [`ElfError::HeaderTruncated`] with the
/// fields that were present filled in and the rest zero.
pub fn decode_raw(buffer: &[u8], arch: &Architecture) -> Result<Header, ElfError> {
    let (ehdr, complete) = decode_partial(buffer, arch.class);
    let header = Header::new(HeaderMode::Raw, ehdr);
    if !complete {
        log::warn!(
            "file is {} bytes, smaller than the {}-byte header",
            buffer.len(),
            header.size()
        );
        return Err(truncated(header, header.size(), buffer.len()));
    }

    if header.ident()[4] != arch.class.ident_byte() {
        log::warn!(
            "EI_CLASS is {} but {} implies {}",
            header.ident()[4],
            arch.name,
            arch.class.ident_byte()
        );
    }
    Ok(header)
}

/// Builds a canonical header for `arch`, keeping only `e_type`, `e_machine`,
/// `e_entry` and `e_phnum` from `buffer`.
///
/// Tiny executables often end partway through `e_phnum`; if only its low byte
/// is present that byte is used.
pub fn synthesize(buffer: &[u8], arch: &Architecture) -> Result<Header, ElfError> {
    let (raw, _) = decode_partial(buffer, arch.class);
    let ident = canonical_ident(arch);
    let mut ehdr: Ehdr = with_ehdr!(raw, h => h.canonical(ident).into());

    let phnum_at = arch.class.phnum_offset();
    if buffer.len() <= phnum_at {
        let header = Header::new(HeaderMode::Synthetic, ehdr);
        return Err(truncated(header, phnum_at + 1, buffer.len()));
    }
    if buffer.len() == phnum_at + 1 {
        log::info!("file ends inside e_phnum, using its low byte");
        let low = u16::from(buffer[phnum_at]);
        with_ehdr!(&mut ehdr, h => h.set_phnum(low));
    }

    Ok(Header::new(HeaderMode::Synthetic, ehdr))
}

fn decode_partial(buffer: &[u8], class: Class) -> (Ehdr, bool) {
    match class {
        Class::Elf32 => {
            let (h, complete) = Elf32Ehdr::decode_partial(buffer);
            (Ehdr::Elf32(h), complete)
        }
        Class::Elf64 => {
            let (h, complete) = Elf64Ehdr::decode_partial(buffer);
            (Ehdr::Elf64(h), complete)
        }
    }
}

fn canonical_ident(arch: &Architecture) -> [u8; 16] {
    let mut ident = [0u8; 16];
    ident[..4].copy_from_slice(&ELF_MAGIC);
    ident[4] = arch.class.ident_byte();
    ident[5] = arch.endianness.ident_byte();
    ident[6] = 1; // EV_CURRENT
    ident
}

fn truncated(partial: Header, needed: usize, available: usize) -> ElfError {
    ElfError::HeaderTruncated {
        needed,
        available,
        partial: Box::new(partial),
    }
}

impl From<Elf32Ehdr> for Ehdr {
    fn from(h: Elf32Ehdr) -> Self {
        Ehdr::Elf32(h)
    }
}

impl From<Elf64Ehdr> for Ehdr {
    fn from(h: Elf64Ehdr) -> Self {
        Ehdr::Elf64(h)
    }
}

/// One header field with its position in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderField {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
    pub value: FieldValue,
}

impl HeaderField {
    pub fn new(name: &'static str, offset: usize, value: FieldValue) -> Self {
        Self {
            name,
            offset,
            size: value.size(),
            value,
        }
    }

    /// True if a file of `len` bytes holds the whole field.
    pub fn present_in(&self, len: usize) -> bool {
        self.offset + self.size <= len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Ident([u8; 16]),
    Half(u16),
    Word(u32),
    Xword(u64),
}

impl FieldValue {
    pub fn size(&self) -> usize {
        match self {
            FieldValue::Ident(_) => 16,
            FieldValue::Half(_) => 2,
            FieldValue::Word(_) => 4,
            FieldValue::Xword(_) => 8,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            FieldValue::Ident(_) => None,
            FieldValue::Half(v) => Some(v.into()),
            FieldValue::Word(v) => Some(v.into()),
            FieldValue::Xword(v) => Some(v),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Ident(bytes) => {
                let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
                write!(f, "{}", hex.join(" "))
            }
            FieldValue::Half(v) => write!(f, "{v:#x}"),
            FieldValue::Word(v) => write!(f, "{v:#x}"),
            FieldValue::Xword(v) => write!(f, "{v:#x}"),
        }
    }
}
