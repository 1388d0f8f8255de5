//! Byte-level fixtures, written field by field so tests don't lean on the encoders.
use crate::arch::ELF_MAGIC;

fn put(buf: &mut [u8], at: usize, bytes: &[u8]) {
    buf[at..at + bytes.len()].copy_from_slice(bytes);
}

/// A complete 52-byte i386 executable header with populated section fields.
pub(crate) fn elf32_header(entry: u32, phoff: u32, phnum: u16) -> Vec<u8> {
    let mut b = vec![0u8; 52];
    put(&mut b, 0, &ELF_MAGIC);
    put(&mut b, 4, &[1, 1, 1, 3]); // ELFCLASS32, LSB, EV_CURRENT, Linux ABI
    put(&mut b, 16, &2u16.to_le_bytes());
    put(&mut b, 18, &3u16.to_le_bytes());
    put(&mut b, 20, &1u32.to_le_bytes());
    put(&mut b, 24, &entry.to_le_bytes());
    put(&mut b, 28, &phoff.to_le_bytes());
    put(&mut b, 32, &0x1234u32.to_le_bytes());
    put(&mut b, 36, &0x10u32.to_le_bytes());
    put(&mut b, 40, &52u16.to_le_bytes());
    put(&mut b, 42, &32u16.to_le_bytes());
    put(&mut b, 44, &phnum.to_le_bytes());
    put(&mut b, 46, &40u16.to_le_bytes());
    put(&mut b, 48, &7u16.to_le_bytes());
    put(&mut b, 50, &6u16.to_le_bytes());
    b
}

/// A complete 64-byte x86-64 executable header with populated section fields.
pub(crate) fn elf64_header(entry: u64, phoff: u64, phnum: u16) -> Vec<u8> {
    let mut b = vec![0u8; 64];
    put(&mut b, 0, &ELF_MAGIC);
    put(&mut b, 4, &[2, 1, 1, 0]);
    put(&mut b, 16, &2u16.to_le_bytes());
    put(&mut b, 18, &0x3eu16.to_le_bytes());
    put(&mut b, 20, &1u32.to_le_bytes());
    put(&mut b, 24, &entry.to_le_bytes());
    put(&mut b, 32, &phoff.to_le_bytes());
    put(&mut b, 40, &0x3a48u64.to_le_bytes());
    put(&mut b, 48, &0u32.to_le_bytes());
    put(&mut b, 52, &64u16.to_le_bytes());
    put(&mut b, 54, &56u16.to_le_bytes());
    put(&mut b, 56, &phnum.to_le_bytes());
    put(&mut b, 58, &64u16.to_le_bytes());
    put(&mut b, 60, &29u16.to_le_bytes());
    put(&mut b, 62, &28u16.to_le_bytes());
    b
}

/// A PT_LOAD entry in 32-bit order: type, offset, vaddr, paddr, filesz, memsz, flags, align.
pub(crate) fn elf32_phdr(offset: u32, vaddr: u32, filesz: u32) -> Vec<u8> {
    let mut b = vec![0u8; 32];
    put(&mut b, 0, &1u32.to_le_bytes());
    put(&mut b, 4, &offset.to_le_bytes());
    put(&mut b, 8, &vaddr.to_le_bytes());
    put(&mut b, 12, &vaddr.to_le_bytes());
    put(&mut b, 16, &filesz.to_le_bytes());
    put(&mut b, 20, &(filesz + 0x100).to_le_bytes());
    put(&mut b, 24, &5u32.to_le_bytes());
    put(&mut b, 28, &0x1000u32.to_le_bytes());
    b
}

/// A PT_LOAD entry in 64-bit order: type, flags, offset, vaddr, paddr, filesz, memsz, align.
pub(crate) fn elf64_phdr(offset: u64, vaddr: u64, filesz: u64) -> Vec<u8> {
    let mut b = vec![0u8; 56];
    put(&mut b, 0, &1u32.to_le_bytes());
    put(&mut b, 4, &5u32.to_le_bytes());
    put(&mut b, 8, &offset.to_le_bytes());
    put(&mut b, 16, &vaddr.to_le_bytes());
    put(&mut b, 24, &vaddr.to_le_bytes());
    put(&mut b, 32, &filesz.to_le_bytes());
    put(&mut b, 40, &(filesz + 0x100).to_le_bytes());
    put(&mut b, 48, &0x200000u64.to_le_bytes());
    b
}

/// A 45-byte i386 executable whose single program header starts at offset 4,
/// overlapping the file header. Code starts at file offset 32.
pub(crate) fn tiny_i386() -> Vec<u8> {
    let mut b = vec![0u8; 45];
    put(&mut b, 0, &ELF_MAGIC);
    // program header, also e_ident[4..16]
    put(&mut b, 4, &1u32.to_le_bytes()); // p_type, EI_CLASS = 1
    put(&mut b, 8, &0u32.to_le_bytes()); // p_offset
    put(&mut b, 12, &0x0804_8000u32.to_le_bytes()); // p_vaddr
    // e_type/e_machine double as p_paddr
    put(&mut b, 16, &2u16.to_le_bytes());
    put(&mut b, 18, &3u16.to_le_bytes());
    put(&mut b, 20, &45u32.to_le_bytes()); // e_version / p_filesz
    put(&mut b, 24, &0x0804_8020u32.to_le_bytes()); // e_entry / p_memsz
    put(&mut b, 28, &4u32.to_le_bytes()); // e_phoff / p_flags
    // code: mov bl, 42; xor eax, eax; inc eax; int 0x80
    put(&mut b, 32, &[0xb3, 0x2a, 0x31, 0xc0, 0x40, 0xcd, 0x80]);
    put(&mut b, 42, &32u16.to_le_bytes()); // e_phentsize
    b[44] = 1; // low byte of e_phnum
    b
}
