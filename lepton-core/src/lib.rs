pub mod arch;
pub mod binary;
pub mod error;
pub mod header;
pub mod program_header;
pub mod recompose;

#[cfg(test)]
mod testutil;

pub use arch::*;
pub use binary::*;
pub use error::ElfError;
pub use header::{
    decode_raw, synthesize, Ehdr, Elf32Ehdr, Elf64Ehdr, FieldValue, Header, HeaderField,
    HeaderMode,
};
pub use program_header::{Elf32Phdr, Elf64Phdr, ProgramHeaderTable, Segment};
pub use recompose::{recompose, splice_header};

/// Encodes a header in ELF field order.
pub fn encode_header(header: &Header) -> Vec<u8> {
    header.to_bytes()
}

/// Encodes a program header table in its class's field order.
pub fn encode_program_header_table(table: &ProgramHeaderTable) -> Vec<u8> {
    table.to_bytes()
}
