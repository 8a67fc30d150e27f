//! Object File Loader.
//!
//! This module turns an Intel-HEX style object file into a [`ProgramImage`]. It performs:
//! 1. **Record parsing:** Splits `:LLAAAATT[DD..]CC` lines into typed records.
//! 2. **Word packing:** Pairs payload bytes (low byte first) into 16-bit words at byte
//!    address / 2.
//! 3. **Validation:** Rejects malformed hex, misaligned records and addresses past capacity.
//!
//! Supported subset: only data records (`00`) are interpreted. End-of-file, extended
//! address and start address records are skipped, so images above 64 KiB of byte address
//! cannot be expressed. Checksums are only checked when
//! [`LoaderConfig::verify_checksums`] is set. Lines that do not start with `:` are ignored.
//!
//! Loading is atomic: words are staged in a scratch buffer and the image is only returned
//! once every line parsed.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::common::constants::PROGRAM_CAPACITY_WORDS;
use crate::common::error::LoadError;
use crate::config::LoaderConfig;
use crate::sim::image::ProgramImage;

/// Record start marker.
const START_CODE: char = ':';

/// Intel-HEX record types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordType {
    /// `00`: payload bytes at the record address.
    Data,
    /// `01`: end of file.
    EndOfFile,
    /// `02`: extended segment address.
    ExtendedSegmentAddress,
    /// `03`: start segment address.
    StartSegmentAddress,
    /// `04`: extended linear address.
    ExtendedLinearAddress,
    /// `05`: start linear address.
    StartLinearAddress,
    /// Any other type code.
    Unknown(u8),
}

impl RecordType {
    /// Maps a record type code to its variant.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Data,
            0x01 => Self::EndOfFile,
            0x02 => Self::ExtendedSegmentAddress,
            0x03 => Self::StartSegmentAddress,
            0x04 => Self::ExtendedLinearAddress,
            0x05 => Self::StartLinearAddress,
            other => Self::Unknown(other),
        }
    }

    /// Returns the type code as written in the file.
    pub fn code(self) -> u8 {
        match self {
            Self::Data => 0x00,
            Self::EndOfFile => 0x01,
            Self::ExtendedSegmentAddress => 0x02,
            Self::StartSegmentAddress => 0x03,
            Self::ExtendedLinearAddress => 0x04,
            Self::StartLinearAddress => 0x05,
            Self::Unknown(code) => code,
        }
    }
}

/// One parsed record line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Byte address from the header.
    pub address: u16,
    /// Record type.
    pub kind: RecordType,
    /// Payload bytes; the header byte count always equals `data.len()`.
    pub data: Vec<u8>,
    /// Checksum byte as stored in the file.
    pub checksum: u8,
}

impl Record {
    /// Parses the text of a record after the `:` marker.
    ///
    /// # Arguments
    ///
    /// * `body` - Record text without the start code.
    /// * `line` - 1-based line number used in errors.
    ///
    /// # Errors
    ///
    /// [`LoadError::Parse`] when a field is truncated, contains a non-hex digit, or
    /// characters follow the checksum.
    pub fn parse(body: &str, line: usize) -> Result<Self, LoadError> {
        let mut cursor = HexCursor {
            bytes: body.as_bytes(),
            pos: 0,
            line,
        };

        let len = cursor.byte("byte count")?;
        let address = (u16::from(cursor.byte("address")?) << 8) | u16::from(cursor.byte("address")?);
        let kind = RecordType::from_code(cursor.byte("record type")?);
        let data = (0..len)
            .map(|_| cursor.byte("data"))
            .collect::<Result<Vec<u8>, LoadError>>()?;
        let checksum = cursor.byte("checksum")?;
        cursor.finish()?;

        Ok(Self {
            address,
            kind,
            data,
            checksum,
        })
    }

    /// Two's complement of the byte sum of count, address, type and payload.
    pub fn expected_checksum(&self) -> u8 {
        let header = [
            self.data.len() as u8,
            (self.address >> 8) as u8,
            self.address as u8,
            self.kind.code(),
        ];
        header
            .iter()
            .chain(self.data.iter())
            .fold(0u8, |acc, b| acc.wrapping_add(*b))
            .wrapping_neg()
    }
}

/// Reads two hex digits at a time out of a record line.
struct HexCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl HexCursor<'_> {
    fn byte(&mut self, field: &str) -> Result<u8, LoadError> {
        let Some(pair) = self.bytes.get(self.pos..self.pos + 2) else {
            return Err(self.error(format!("truncated {field} field")));
        };
        match (hex_nibble(pair[0]), hex_nibble(pair[1])) {
            (Some(hi), Some(lo)) => {
                self.pos += 2;
                Ok((hi << 4) | lo)
            }
            _ => Err(self.error(format!(
                "invalid hex digits {:?} in {field} field",
                String::from_utf8_lossy(pair)
            ))),
        }
    }

    fn finish(&self) -> Result<(), LoadError> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(self.error(format!(
                "{} unexpected characters after checksum",
                self.bytes.len() - self.pos
            )))
        }
    }

    fn error(&self, reason: String) -> LoadError {
        LoadError::Parse {
            line: self.line,
            reason,
        }
    }
}

#[inline]
fn hex_nibble(b: u8) -> Option<u8> {
    char::from(b).to_digit(16).map(|d| d as u8)
}

/// Parses object-file text into a program image.
///
/// # Arguments
///
/// * `text`   - Complete object file contents.
/// * `config` - Loader settings (checksum verification, capacity).
///
/// # Errors
///
/// Any [`LoadError`] other than `Io`; nothing is returned on partial success.
pub fn parse_hex(text: &str, config: &LoaderConfig) -> Result<ProgramImage, LoadError> {
    let capacity = config.capacity_words.min(PROGRAM_CAPACITY_WORDS);
    let mut words = vec![0u16; capacity];
    let mut extent = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let Some(body) = raw.trim_end().strip_prefix(START_CODE) else {
            continue;
        };

        let record = Record::parse(body, line)?;
        if config.verify_checksums {
            let expected = record.expected_checksum();
            if expected != record.checksum {
                return Err(LoadError::Checksum {
                    line,
                    expected,
                    found: record.checksum,
                });
            }
        }

        if record.kind != RecordType::Data {
            debug!(line, record_type = ?record.kind, "skipping non-data record");
            continue;
        }

        if record.address % 2 != 0 || record.data.len() % 2 != 0 {
            return Err(LoadError::Unaligned {
                line,
                address: record.address,
                len: record.data.len(),
            });
        }

        let base = usize::from(record.address) / 2;
        for (i, pair) in record.data.chunks_exact(2).enumerate() {
            let word = base + i;
            if word >= capacity {
                return Err(LoadError::AddressOutOfRange {
                    line,
                    word,
                    capacity,
                });
            }
            words[word] = u16::from(pair[0]) | (u16::from(pair[1]) << 8);
            extent = extent.max(word + 1);
        }
    }

    words.truncate(extent);
    Ok(ProgramImage::from_loaded(words))
}

/// Loads an object file from disk.
///
/// # Errors
///
/// [`LoadError::Io`] if the file cannot be read, otherwise as [`parse_hex`].
pub fn load_hex_file(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<ProgramImage, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = parse_hex(&text, config)?;
    info!(path = %path.display(), words = image.len(), "loaded object file");
    Ok(image)
}
