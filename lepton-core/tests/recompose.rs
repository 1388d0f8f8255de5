use lepton_core::{
    encode_header, encode_program_header_table, parse, recompose, Elf64Phdr, ElfError,
    ElfFile, HeaderMode, ProgramHeaderTable,
};

const CODE: [u8; 7] = [0xb3, 0x2a, 0x31, 0xc0, 0x40, 0xcd, 0x80];

/// 45-byte i386 executable whose program header sits at offset 4, inside the file header.
fn tiny_i386() -> Vec<u8> {
    let mut b = vec![0u8; 45];
    b[0..4].copy_from_slice(b"\x7fELF");
    b[4..8].copy_from_slice(&1u32.to_le_bytes());
    b[12..16].copy_from_slice(&0x0804_8000u32.to_le_bytes());
    b[16..18].copy_from_slice(&2u16.to_le_bytes());
    b[18..20].copy_from_slice(&3u16.to_le_bytes());
    b[20..24].copy_from_slice(&45u32.to_le_bytes());
    b[24..28].copy_from_slice(&0x0804_8020u32.to_le_bytes());
    b[28..32].copy_from_slice(&4u32.to_le_bytes());
    b[32..39].copy_from_slice(&CODE);
    b[42..44].copy_from_slice(&32u16.to_le_bytes());
    b[44] = 1;
    b
}

#[test]
fn tiny_i386_is_rebuilt_with_a_separate_table() {
    let buf = tiny_i386();

    let raw = parse(&buf, HeaderMode::Raw).unwrap_err();
    assert!(raw.is_recoverable());

    let (mut header, table) = parse(&buf, HeaderMode::Synthetic).unwrap();
    assert_eq!(table.len(), 1);
    let vaddr = table.first().unwrap().p_vaddr;
    assert_eq!(vaddr, 0x0804_8000);

    let out = recompose(&buf, &mut header, &table).unwrap();
    assert_eq!(out.len(), 52 + 32 + (45 - 32));
    assert_eq!(header.entry_point() - vaddr, 52 + 32);
    assert_eq!(&out[84..91], &CODE);

    // the result parses cleanly in both modes and its table sits right after the header
    let (rebuilt, rebuilt_table) = parse(&out, HeaderMode::Raw).unwrap();
    assert_eq!(rebuilt.entry_point(), 0x0804_8000 + 84);
    assert_eq!(rebuilt_table, table);
    assert_eq!(encode_header(&rebuilt), out[..52]);
    assert_eq!(encode_program_header_table(&rebuilt_table), out[52..84]);
}

#[test]
fn amd64_entry_lands_after_relocated_table() {
    let mut buf = vec![0u8; 128];
    buf[0..4].copy_from_slice(b"\x7fELF");
    buf[4] = 2;
    buf[5] = 1;
    buf[16..18].copy_from_slice(&2u16.to_le_bytes());
    buf[18..20].copy_from_slice(&0x3eu16.to_le_bytes());
    buf[24..32].copy_from_slice(&(0x400000u64 + 10).to_le_bytes());
    buf[32..40].copy_from_slice(&40u64.to_le_bytes());
    buf[56..58].copy_from_slice(&1u16.to_le_bytes());

    let (mut header, _) = parse(&buf, HeaderMode::Synthetic).unwrap();
    let table = ProgramHeaderTable::Elf64(vec![Elf64Phdr {
        p_type: 1,
        p_flags: 5,
        p_vaddr: 0x400000,
        p_paddr: 0x400000,
        p_filesz: 128,
        p_memsz: 128,
        p_align: 0x1000,
        ..Default::default()
    }]);

    let out = recompose(&buf, &mut header, &table).unwrap();
    assert_eq!(header.entry_point(), 0x400000 + 120);
    assert_eq!(out.len(), 120 + 118);
    assert_eq!(&out[120..], &buf[10..]);
}

#[test]
fn elf_file_recompose_requires_synthetic_header() {
    let mut file = ElfFile::from_bytes(tiny_i386(), HeaderMode::Synthetic).unwrap();
    assert!(file.recompose().is_ok());
    assert_eq!(file.entry_point(), 0x0804_8000 + 84);

    let mut buf = tiny_i386();
    buf.resize(52, 0);
    let mut raw = ElfFile::from_bytes(buf, HeaderMode::Raw).unwrap();
    assert_eq!(raw.recompose(), Err(ElfError::InvalidRecomposeMode));
}
