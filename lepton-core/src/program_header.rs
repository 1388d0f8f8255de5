//! The program header table: one entry per segment, in file order.
use crate::arch::Class;
use crate::error::ElfError;
use crate::header::Header;
use byteorder::{ByteOrder, ReadBytesExt, LE};
use std::io::{self, Cursor};

/// Layout of one class of program header.
pub trait Phdr: Sized + Copy {
    const CLASS: Class;
    const SIZE: usize;

    fn from_reader<R: io::Read>(cur: &mut R) -> io::Result<Self>;

    /// Writes every field at its fixed offset. `out` is exactly `SIZE` bytes.
    fn write_fields(&self, out: &mut [u8]);

    fn segment(&self) -> Segment;
}

/// `Elf32_Phdr`. Every field is 4 bytes and `p_flags` comes after `p_memsz`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elf32Phdr {
    pub p_type: u32,
    pub p_offset: u32,
    pub p_vaddr: u32,
    pub p_paddr: u32,
    pub p_filesz: u32,
    pub p_memsz: u32,
    pub p_flags: u32,
    pub p_align: u32,
}

/// `Elf64_Phdr`. `p_flags` moves up next to `p_type` so the 8-byte fields stay aligned.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elf64Phdr {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl Phdr for Elf32Phdr {
    const CLASS: Class = Class::Elf32;
    const SIZE: usize = 32;

    fn from_reader<R: io::Read>(cur: &mut R) -> io::Result<Self> {
        Ok(Elf32Phdr {
            p_type: cur.read_u32::<LE>()?,
            p_offset: cur.read_u32::<LE>()?,
            p_vaddr: cur.read_u32::<LE>()?,
            p_paddr: cur.read_u32::<LE>()?,
            p_filesz: cur.read_u32::<LE>()?,
            p_memsz: cur.read_u32::<LE>()?,
            p_flags: cur.read_u32::<LE>()?,
            p_align: cur.read_u32::<LE>()?,
        })
    }

    fn write_fields(&self, out: &mut [u8]) {
        LE::write_u32(&mut out[0..4], self.p_type);
        LE::write_u32(&mut out[4..8], self.p_offset);
        LE::write_u32(&mut out[8..12], self.p_vaddr);
        LE::write_u32(&mut out[12..16], self.p_paddr);
        LE::write_u32(&mut out[16..20], self.p_filesz);
        LE::write_u32(&mut out[20..24], self.p_memsz);
        LE::write_u32(&mut out[24..28], self.p_flags);
        LE::write_u32(&mut out[28..32], self.p_align);
    }

    fn segment(&self) -> Segment {
        Segment {
            p_type: self.p_type,
            p_flags: self.p_flags,
            p_offset: self.p_offset.into(),
            p_vaddr: self.p_vaddr.into(),
            p_paddr: self.p_paddr.into(),
            p_filesz: self.p_filesz.into(),
            p_memsz: self.p_memsz.into(),
            p_align: self.p_align.into(),
        }
    }
}

impl Phdr for Elf64Phdr {
    const CLASS: Class = Class::Elf64;
    const SIZE: usize = 56;

    fn from_reader<R: io::Read>(cur: &mut R) -> io::Result<Self> {
        Ok(Elf64Phdr {
            p_type: cur.read_u32::<LE>()?,
            p_flags: cur.read_u32::<LE>()?,
            p_offset: cur.read_u64::<LE>()?,
            p_vaddr: cur.read_u64::<LE>()?,
            p_paddr: cur.read_u64::<LE>()?,
            p_filesz: cur.read_u64::<LE>()?,
            p_memsz: cur.read_u64::<LE>()?,
            p_align: cur.read_u64::<LE>()?,
        })
    }

    fn write_fields(&self, out: &mut [u8]) {
        LE::write_u32(&mut out[0..4], self.p_type);
        LE::write_u32(&mut out[4..8], self.p_flags);
        LE::write_u64(&mut out[8..16], self.p_offset);
        LE::write_u64(&mut out[16..24], self.p_vaddr);
        LE::write_u64(&mut out[24..32], self.p_paddr);
        LE::write_u64(&mut out[32..40], self.p_filesz);
        LE::write_u64(&mut out[40..48], self.p_memsz);
        LE::write_u64(&mut out[48..56], self.p_align);
    }

    fn segment(&self) -> Segment {
        Segment {
            p_type: self.p_type,
            p_flags: self.p_flags,
            p_offset: self.p_offset,
            p_vaddr: self.p_vaddr,
            p_paddr: self.p_paddr,
            p_filesz: self.p_filesz,
            p_memsz: self.p_memsz,
            p_align: self.p_align,
        }
    }
}

/// A program header with every field widened, for code that doesn't care about the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramHeaderTable {
    Elf32(Vec<Elf32Phdr>),
    Elf64(Vec<Elf64Phdr>),
}

impl ProgramHeaderTable {
    /// Reads `e_phnum` entries from `buffer`.
    ///
    /// The table offset is taken from the `e_phoff` bytes of `buffer` rather than
    /// from `header`, because a synthesized header always claims the table follows it.
    pub fn decode(buffer: &[u8], header: &Header) -> Result<Self, ElfError> {
        let class = header.class();
        let phoff_at = class.phoff_offset();
        let table_offset =
            class
                .read_addr(buffer, phoff_at)
                .ok_or_else(|| ElfError::HeaderTruncated {
                    needed: phoff_at + class.addr_size(),
                    available: buffer.len(),
                    partial: Box::new(*header),
                })?;
        let count = usize::from(header.phnum());

        log::debug!(
            "program header table at {:#x}, {} entries of {} bytes",
            table_offset,
            count,
            class.phentsize()
        );

        Ok(match class {
            Class::Elf32 => Self::Elf32(read_entries(buffer, header, table_offset, count)?),
            Class::Elf64 => Self::Elf64(read_entries(buffer, header, table_offset, count)?),
        })
    }

    /// Concatenates the entries in table order, each in its class's field order.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Elf32(entries) => write_entries(entries),
            Self::Elf64(entries) => write_entries(entries),
        }
    }

    pub fn class(&self) -> Class {
        match self {
            Self::Elf32(_) => Elf32Phdr::CLASS,
            Self::Elf64(_) => Elf64Phdr::CLASS,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Elf32(entries) => entries.len(),
            Self::Elf64(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first(&self) -> Option<Segment> {
        match self {
            Self::Elf32(entries) => entries.first().map(Phdr::segment),
            Self::Elf64(entries) => entries.first().map(Phdr::segment),
        }
    }

    pub fn segments(&self) -> Vec<Segment> {
        match self {
            Self::Elf32(entries) => entries.iter().map(Phdr::segment).collect(),
            Self::Elf64(entries) => entries.iter().map(Phdr::segment).collect(),
        }
    }
}

fn read_entries<P: Phdr>(
    buffer: &[u8],
    header: &Header,
    table_offset: u64,
    count: usize,
) -> Result<Vec<P>, ElfError> {
    let mut cursor = Cursor::new(buffer);
    let mut entries = Vec::with_capacity(count);
    for index in 0..count {
        let offset = table_offset.saturating_add((index * P::SIZE) as u64);
        cursor.set_position(offset);
        let entry = P::from_reader(&mut cursor);
        entries.push(entry.map_err(|_| ElfError::ProgramHeaderTruncated {
            index,
            offset,
            available: buffer.len(),
            header: Box::new(*header),
        })?);
    }
    Ok(entries)
}

fn write_entries<P: Phdr>(entries: &[P]) -> Vec<u8> {
    let mut out = vec![0u8; entries.len() * P::SIZE];
    for (chunk, entry) in out.chunks_exact_mut(P::SIZE).zip(entries) {
        entry.write_fields(chunk);
    }
    out
}
