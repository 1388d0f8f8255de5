use super::{FieldValue, FileHeader, HeaderField};
use crate::arch::Class;
use byteorder::{ByteOrder, ReadBytesExt, LE};
use std::io;

/// `Elf32_Ehdr`. Same fields as [`super::Elf64Ehdr`], but the three file
/// offsets/addresses are 4 bytes wide, which shifts everything after `e_entry`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elf32Ehdr {
    pub e_ident: [u8; 16],
    pub e_type: u16,
    /// `EM_386` (3).
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u32,
    pub e_phoff: u32,
    pub e_shoff: u32,
    pub e_flags: u32,
    /// `52` for a well-formed ELF32 file.
    pub e_ehsize: u16,
    /// `32` for a well-formed ELF32 file.
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl FileHeader for Elf32Ehdr {
    const CLASS: Class = Class::Elf32;
    const SIZE: usize = 52;

    fn entry_point(&self) -> u64 {
        self.e_entry as u64
    }

    fn set_entry_point(&mut self, entry: u64) -> bool {
        match u32::try_from(entry) {
            Ok(entry) => {
                self.e_entry = entry;
                true
            }
            Err(_) => false,
        }
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
        self.e_entry = cur.read_u32::<LE>()?;
        self.e_phoff = cur.read_u32::<LE>()?;
        self.e_shoff = cur.read_u32::<LE>()?;
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
        LE::write_u32(&mut out[24..28], self.e_entry);
        LE::write_u32(&mut out[28..32], self.e_phoff);
        LE::write_u32(&mut out[32..36], self.e_shoff);
        LE::write_u32(&mut out[36..40], self.e_flags);
        LE::write_u16(&mut out[40..42], self.e_ehsize);
        LE::write_u16(&mut out[42..44], self.e_phentsize);
        LE::write_u16(&mut out[44..46], self.e_phnum);
        LE::write_u16(&mut out[46..48], self.e_shentsize);
        LE::write_u16(&mut out[48..50], self.e_shnum);
        LE::write_u16(&mut out[50..52], self.e_shstrndx);
    }

    fn fields(&self) -> Vec<HeaderField> {
        vec![
            HeaderField::new("e_ident", 0, FieldValue::Ident(self.e_ident)),
            HeaderField::new("e_type", 16, FieldValue::Half(self.e_type)),
            HeaderField::new("e_machine", 18, FieldValue::Half(self.e_machine)),
            HeaderField::new("e_version", 20, FieldValue::Word(self.e_version)),
            HeaderField::new("e_entry", 24, FieldValue::Word(self.e_entry)),
            HeaderField::new("e_phoff", 28, FieldValue::Word(self.e_phoff)),
            HeaderField::new("e_shoff", 32, FieldValue::Word(self.e_shoff)),
            HeaderField::new("e_flags", 36, FieldValue::Word(self.e_flags)),
            HeaderField::new("e_ehsize", 40, FieldValue::Half(self.e_ehsize)),
            HeaderField::new("e_phentsize", 42, FieldValue::Half(self.e_phentsize)),
            HeaderField::new("e_phnum", 44, FieldValue::Half(self.e_phnum)),
            HeaderField::new("e_shentsize", 46, FieldValue::Half(self.e_shentsize)),
            HeaderField::new("e_shnum", 48, FieldValue::Half(self.e_shnum)),
            HeaderField::new("e_shstrndx", 50, FieldValue::Half(self.e_shstrndx)),
        ]
    }

    fn canonical(&self, ident: [u8; 16]) -> Self {
        Elf32Ehdr {
            e_ident: ident,
            e_type: self.e_type,
            e_machine: self.e_machine,
            e_version: 1,
            e_entry: self.e_entry,
            e_phoff: Self::SIZE as u32,
            e_ehsize: Self::SIZE as u16,
            e_phentsize: Class::Elf32.phentsize() as u16,
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
