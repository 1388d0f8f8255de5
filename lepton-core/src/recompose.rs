//! Rebuilding the header region of a file.
use crate::error::ElfError;
use crate::header::{Header, HeaderMode};
use crate::program_header::ProgramHeaderTable;

/// Lays out `header`, then `table`, then the rest of the original file.
///
/// When the original `e_phoff` is below the canonical header size the table
/// overlapped the header. The bytes from the entry point onward are then moved
/// to sit right after the new table and `header.e_entry` is rewritten to match.
/// The entry's file offset is computed as `e_entry - p_vaddr` of the first
/// program header, which only holds when that segment maps file offset 0.
///
/// Otherwise the table already clears the header and the file is copied from
/// the end of the freshly encoded region.
pub fn recompose(
    buffer: &[u8],
    header: &mut Header,
    table: &ProgramHeaderTable,
) -> Result<Vec<u8>, ElfError> {
    if header.mode() != HeaderMode::Synthetic {
        return Err(ElfError::InvalidRecomposeMode);
    }
    if header.class() != table.class() {
        return Err(ElfError::ClassMismatch);
    }

    let class = header.class();
    let ehsize = class.ehsize() as u64;
    let phoff_at = class.phoff_offset();
    let original_phoff =
        class
            .read_addr(buffer, phoff_at)
            .ok_or_else(|| ElfError::HeaderTruncated {
                needed: phoff_at + class.addr_size(),
                available: buffer.len(),
                partial: Box::new(*header),
            })?;
    let table_bytes = table.to_bytes();

    if original_phoff >= ehsize {
        log::info!("program header table at {original_phoff:#x} clears the header, keeping layout");
        let header_bytes = header.to_bytes();
        let resume = header_bytes.len() + table_bytes.len();
        let rest = buffer.get(resume..).ok_or(ElfError::MalformedOffset {
            offset: resume as i128,
            limit: buffer.len() as u64,
        })?;
        return Ok([header_bytes.as_slice(), table_bytes.as_slice(), rest].concat());
    }

    let first = table.first().ok_or(ElfError::NoProgramHeaders)?;
    if first.p_offset != 0 {
        log::warn!(
            "first segment maps file offset {:#x}; entry offset assumes it maps 0",
            first.p_offset
        );
    }

    // e_entry precedes e_phoff, so it is present whenever e_phoff was
    let original_entry = class
        .read_addr(buffer, class.entry_offset())
        .unwrap_or_default();
    let entry_offset = i128::from(original_entry) - i128::from(first.p_vaddr);
    let segment = usize::try_from(entry_offset)
        .ok()
        .and_then(|start| buffer.get(start..))
        .ok_or(ElfError::MalformedOffset {
            offset: entry_offset,
            limit: buffer.len() as u64,
        })?;

    let new_entry_offset = ehsize + table_bytes.len() as u64;
    let new_entry = new_entry_offset
        .checked_add(first.p_vaddr)
        .ok_or(ElfError::MalformedOffset {
            offset: i128::from(new_entry_offset) + i128::from(first.p_vaddr),
            limit: u64::MAX,
        })?;
    header.set_entry_point(new_entry)?;

    log::info!(
        "moved {} bytes from {entry_offset:#x} to {new_entry_offset:#x}, entry {original_entry:#x} -> {new_entry:#x}",
        segment.len()
    );
    Ok([header.to_bytes().as_slice(), table_bytes.as_slice(), segment].concat())
}

/// Replaces the first `header.size()` bytes of `buffer` with `header`.
pub fn splice_header(buffer: &[u8], header: &Header) -> Result<Vec<u8>, ElfError> {
    let rest = buffer
        .get(header.size()..)
        .ok_or_else(|| ElfError::HeaderTruncated {
            needed: header.size(),
            available: buffer.len(),
            partial: Box::new(*header),
        })?;
    Ok([header.to_bytes().as_slice(), rest].concat())
}
