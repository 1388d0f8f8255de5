use crate::header::Header;
use std::fmt;

/// Errors produced while decoding or rebuilding the header region of an ELF file.
///
/// `MagicMismatch` and `UnsupportedArchitecture` abort a parse outright.
/// `HeaderTruncated`, `ProgramHeaderTruncated` and `MalformedOffset` describe
/// files that can still be reported on. The two truncation errors carry the
/// header that was decoded, see [`ElfError::header`].
#[derive(Debug, Clone, PartialEq)]
pub enum ElfError {
    /// The first four bytes are not `\x7fELF`. `found` holds at most four bytes.
    MagicMismatch { found: Vec<u8> },

    /// `e_machine` is not in the architecture table.
    UnsupportedArchitecture { machine: [u8; 2] },

    /// The buffer ends before the header does. Fields of `partial` past
    /// `available` are zero.
    HeaderTruncated {
        needed: usize,
        available: usize,
        partial: Box<Header>,
    },

    /// Program header `index` starts at `offset` but runs past the end of the
    /// buffer. `header` was decoded in full.
    ProgramHeaderTruncated {
        index: usize,
        offset: u64,
        available: usize,
        header: Box<Header>,
    },

    /// Recompose was asked to work on a header decoded verbatim.
    InvalidRecomposeMode,

    /// A file offset computed while recomposing is not inside `0..=limit`.
    MalformedOffset { offset: i128, limit: u64 },

    /// A 32-bit header was paired with a 64-bit program header table or vice versa.
    ClassMismatch,

    /// Recompose needs the first program header to locate the entry point.
    NoProgramHeaders,
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MagicMismatch { found } => write!(f, "wrong magic values: {found:02x?}"),
            Self::UnsupportedArchitecture { machine } => {
                write!(
                    f,
                    "unsupported architecture: {:#x}",
                    u16::from_le_bytes(*machine)
                )
            }
            Self::HeaderTruncated {
                needed, available, ..
            } => {
                write!(
                    f,
                    "file is smaller than the expected header size: need {needed} bytes, have {available}"
                )
            }
            Self::ProgramHeaderTruncated {
                index,
                offset,
                available,
                ..
            } => {
                write!(
                    f,
                    "program header {index} at offset {offset:#x} runs past the end of the file ({available} bytes)"
                )
            }
            Self::InvalidRecomposeMode => {
                write!(f, "recompose requires a synthesized header, not a raw one")
            }
            Self::MalformedOffset { offset, limit } => {
                write!(f, "computed offset {offset} is outside 0..={limit}")
            }
            Self::ClassMismatch => {
                write!(f, "header and program header table have different classes")
            }
            Self::NoProgramHeaders => write!(f, "program header table is empty"),
        }
    }
}

impl std::error::Error for ElfError {}

impl ElfError {
    /// True for conditions a caller can report on and move past.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::HeaderTruncated { .. }
                | Self::ProgramHeaderTruncated { .. }
                | Self::MalformedOffset { .. }
        )
    }

    /// The header decoded before the file ran out, if any.
    pub fn header(&self) -> Option<&Header> {
        match self {
            Self::HeaderTruncated { partial, .. } => Some(&**partial),
            Self::ProgramHeaderTruncated { header, .. } => Some(&**header),
            _ => None,
        }
    }
}
