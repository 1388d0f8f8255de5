//! Machine codes we know how to lay out, and the per-class header geometry.
use crate::error::ElfError;
use byteorder::{ByteOrder, LE};
use goblin::elf::header::{EM_386, EM_X86_64};

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Bytes needed to reach the end of `e_machine`.
const MACHINE_END: usize = 20;

/// Structure width selected for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Elf32,
    Elf64,
}

impl Class {
    /// Value stored in `e_ident[EI_CLASS]`.
    pub const fn ident_byte(self) -> u8 {
        match self {
            Class::Elf32 => 1,
            Class::Elf64 => 2,
        }
    }

    /// Width of `e_entry`, `e_phoff` and `e_shoff`.
    pub const fn addr_size(self) -> usize {
        match self {
            Class::Elf32 => 4,
            Class::Elf64 => 8,
        }
    }

    /// `e_ehsize` for a canonical header.
    pub const fn ehsize(self) -> usize {
        match self {
            Class::Elf32 => 52,
            Class::Elf64 => 64,
        }
    }

    /// `e_phentsize` for a canonical header.
    pub const fn phentsize(self) -> usize {
        match self {
            Class::Elf32 => 32,
            Class::Elf64 => 56,
        }
    }

    pub const fn entry_offset(self) -> usize {
        24
    }

    pub const fn phoff_offset(self) -> usize {
        self.entry_offset() + self.addr_size()
    }

    pub const fn phnum_offset(self) -> usize {
        match self {
            Class::Elf32 => 44,
            Class::Elf64 => 56,
        }
    }

    /// Reads an address-sized little-endian value at `offset`, if the buffer holds all of it.
    pub fn read_addr(self, buffer: &[u8], offset: usize) -> Option<u64> {
        let bytes = buffer.get(offset..offset.checked_add(self.addr_size())?)?;
        Some(match self {
            Class::Elf32 => LE::read_u32(bytes) as u64,
            Class::Elf64 => LE::read_u64(bytes),
        })
    }

    pub fn bits(self) -> u32 {
        self.addr_size() as u32 * 8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
}

impl Endianness {
    /// Value stored in `e_ident[EI_DATA]`.
    pub const fn ident_byte(self) -> u8 {
        match self {
            Endianness::Little => 1,
        }
    }
}

/// One row of the architecture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Architecture {
    /// Raw `e_machine` bytes as they appear in the file.
    pub machine: [u8; 2],
    pub name: &'static str,
    pub class: Class,
    pub endianness: Endianness,
}

/// The class is chosen from the CPU, not from `e_ident[EI_CLASS]`, so files
/// with a mangled identification block still decode.
pub static ARCHITECTURES: [Architecture; 2] = [
    Architecture {
        machine: EM_386.to_le_bytes(),
        name: "i386",
        class: Class::Elf32,
        endianness: Endianness::Little,
    },
    Architecture {
        machine: EM_X86_64.to_le_bytes(),
        name: "AMD64",
        class: Class::Elf64,
        endianness: Endianness::Little,
    },
];

/// Checks the magic and looks up `e_machine` in [`ARCHITECTURES`]. A buffer too
/// short to hold `e_machine` is treated as not being ELF at all.
pub fn resolve(buffer: &[u8]) -> Result<&'static Architecture, ElfError> {
    let magic = buffer.get(..ELF_MAGIC.len());
    let machine = buffer.get(18..MACHINE_END);
    let (Some(machine), true) = (machine, magic == Some(&ELF_MAGIC[..])) else {
        return Err(ElfError::MagicMismatch {
            found: buffer.iter().take(ELF_MAGIC.len()).copied().collect(),
        });
    };

    let arch = ARCHITECTURES
        .iter()
        .find(|a| a.machine == machine)
        .ok_or(ElfError::UnsupportedArchitecture {
            machine: [machine[0], machine[1]],
        })?;

    log::debug!("resolved {} ({}-bit)", arch.name, arch.class.bits());
    Ok(arch)
}
