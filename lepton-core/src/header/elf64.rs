use super::{FieldValue, FileHeader, HeaderField};
use crate::arch::Class;
use byteorder::{ByteOrder, ReadBytesExt, LE};
use std::io;

/// Represents the ELF (Executable and Linkable Format) header for a 64-bit object file.
///
/// This structure corresponds to the standard `Elf64_Ehdr` defined in the ELF specification.
/// It appears at the very beginning of every ELF file and contains metadata describing
/// the file's organization and layout.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elf64Ehdr {
    /// ELF identification bytes (magic number and other information).
    ///
    /// The first 4 bytes should be `0x7F`, `'E'`, `'L'`, `'F'`.
    /// Remaining bytes encode class (32/64-bit), endianness, and version.
    pub e_ident: [u8; 16],

    /// Object file type (e.g. relocatable, executable, shared, core).
    ///
    /// Common values:
    /// - `ET_NONE` (0): No file type
    /// - `ET_REL` (1): Relocatable file
    /// - `ET_EXEC` (2): Executable file
    /// - `ET_DYN` (3): Shared object
    /// - `ET_CORE` (4): Core dump
    pub e_type: u16,

    /// Target architecture, `EM_X86_64` (62) for everything we decode here.
    pub e_machine: u16,

    /// ELF version (usually set to `EV_CURRENT` = 1).
    pub e_version: u32,

    /// Virtual address of the program entry point.
    ///
    /// This is where execution starts when the ELF is loaded.
    pub e_entry: u64,

    /// File offset of the program header table.
    pub e_phoff: u64,

    /// File offset of the section header table.
    pub e_shoff: u64,

    /// Processor-specific flags.
    pub e_flags: u32,

    /// Size of this ELF header (usually `64` bytes for ELF64).
    pub e_ehsize: u16,

    /// Size of one entry in the program header table (`56` for ELF64).
    pub e_phentsize: u16,

    /// Number of entries in the program header table.
    pub e_phnum: u16,

    /// Size of one entry in the section header table.
    pub e_shentsize: u16,

    /// Number of entries in the section header table.
    pub e_shnum: u16,

    /// Index of the section header string table.
    pub e_shstrndx: u16,
}

impl FileHeader for Elf64Ehdr {
    const CLASS: Class = Class::Elf64;
    const SIZE: usize = 64;

    fn entry_point(&self) -> u64 {
        self.e_entry
    }

    fn set_entry_point(&mut self, entry: u64) -> bool {
        self.e_entry = entry;
        true
    }

    fn machine(&self) -> u16 {
        self.e_machine
    }

    fn phnum(&self) -> u16 {
        self.e_phnum
    }

    fn set_phnum(&mut self, phnum: u16) {
        self.e_phnum = phnum;
    }

    fn ident(&self) -> &[u8; 16] {
        &self.e_ident
    }

    fn read_fields<R: io::Read>(&mut self, cur: &mut R) -> io::Result<()> {
        cur.read_exact(&mut self.e_ident)?;
        self.e_type = cur.read_u16::<LE>()?;
        self.e_machine = cur.read_u16::<LE>()?;
        self.e_version = cur.read_u32::<LE>()?;
        self.e_entry = cur.read_u64::<LE>()?;
        self.e_phoff = cur.read_u64::<LE>()?;
        self.e_shoff = cur.read_u64::<LE>()?;
        self.e_flags = cur.read_u32::<LE>()?;
        self.e_ehsize = cur.read_u16::<LE>()?;
        self.e_phentsize = cur.read_u16::<LE>()?;
        self.e_phnum = cur.read_u16::<LE>()?;
        self.e_shentsize = cur.read_u16::<LE>()?;
        self.e_shnum = cur.read_u16::<LE>()?;
        self.e_shstrndx = cur.read_u16::<LE>()?;
        Ok(())
    }

    fn write_fields(&self, out: &mut [u8]) {
        out[0..16].copy_from_slice(&self.e_ident);
        LE::write_u16(&mut out[16..18], self.e_type);
        LE::write_u16(&mut out[18..20], self.e_machine);
        LE::write_u32(&mut out[20..24], self.e_version);
        LE::write_u64(&mut out[24..32], self.e_entry);
        LE::write_u64(&mut out[32..40], self.e_phoff);
        LE::write_u64(&mut out[40..48], self.e_shoff);
        LE::write_u32(&mut out[48..52], self.e_flags);
        LE::write_u16(&mut out[52..54], self.e_ehsize);
        LE::write_u16(&mut out[54..56], self.e_phentsize);
        LE::write_u16(&mut out[56..58], self.e_phnum);
        LE::write_u16(&mut out[58..60], self.e_shentsize);
        LE::write_u16(&mut out[60..62], self.e_shnum);
        LE::write_u16(&mut out[62..64], self.e_shstrndx);
    }

    fn fields(&self) -> Vec<HeaderField> {
        vec![
            HeaderField::new("e_ident", 0, FieldValue::Ident(self.e_ident)),
            HeaderField::new("e_type", 16, FieldValue::Half(self.e_type)),
            HeaderField::new("e_machine", 18, FieldValue::Half(self.e_machine)),
            HeaderField::new("e_version", 20, FieldValue::Word(self.e_version)),
            HeaderField::new("e_entry", 24, FieldValue::Xword(self.e_entry)),
            HeaderField::new("e_phoff", 32, FieldValue::Xword(self.e_phoff)),
            HeaderField::new("e_shoff", 40, FieldValue::Xword(self.e_shoff)),
            HeaderField::new("e_flags", 48, FieldValue::Word(self.e_flags)),
            HeaderField::new("e_ehsize", 52, FieldValue::Half(self.e_ehsize)),
            HeaderField::new("e_phentsize", 54, FieldValue::Half(self.e_phentsize)),
            HeaderField::new("e_phnum", 56, FieldValue::Half(self.e_phnum)),
            HeaderField::new("e_shentsize", 58, FieldValue::Half(self.e_shentsize)),
            HeaderField::new("e_shnum", 60, FieldValue::Half(self.e_shnum)),
            HeaderField::new("e_shstrndx", 62, FieldValue::Half(self.e_shstrndx)),
        ]
    }

    fn canonical(&self, ident: [u8; 16]) -> Self {
        Elf64Ehdr {
            e_ident: ident,
            e_type: self.e_type,
            e_machine: self.e_machine,
            e_version: 1,
            e_entry: self.e_entry,
            e_phoff: Self::SIZE as u64,
            e_ehsize: Self::SIZE as u16,
            e_phentsize: Class::Elf64.phentsize() as u16,
            e_phnum: self.e_phnum,
            ..Default::default()
        }
    }

    fn clear_section_headers(&mut self) {
        self.e_shoff = 0;
        self.e_shentsize = 0;
        self.e_shnum = 0;
        self.e_shstrndx = 0;
    }
}
