// SPDX-License-Identifier: Apache-2.0

//! Binary stream of per-chip routing tables.
//!
//! Each record is a 4-byte header (`u8 x`, `u8 y`, `u16` entry count) followed
//! by that many 16-byte entries (`key`, `mask`, `source`, `route`). All
//! multi-byte fields are little-endian. The stream ends at a clean EOF on a
//! record boundary.

use std::fmt;
use std::io::{self, Read, Write};

use crate::keymask::Keymask;
use crate::route::{RouteSet, SourceSet};
use crate::table::{ChipTable, Rule};

pub const HEADER_BYTES: usize = 4;
pub const ENTRY_BYTES: usize = 16;

#[derive(Debug)]
pub enum TableFormatError {
    /// The stream ended part way through a record header.
    TruncatedHeader { offset: u64 },
    /// The stream ended part way through (or before) entry `index` of a chip.
    TruncatedEntry {
        chip: (u8, u8),
        index: usize,
        offset: u64,
    },
    /// A table has more entries than the header can count.
    TableTooLong { chip: (u8, u8), len: usize },
    Io(io::Error),
}

impl fmt::Display for TableFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableFormatError::TruncatedHeader { offset } => {
                write!(f, "truncated table header at byte offset {}", offset)
            }
            TableFormatError::TruncatedEntry {
                chip,
                index,
                offset,
            } => write!(
                f,
                "incomplete routing table for chip ({}, {}): entry {} truncated at byte offset {}",
                chip.0, chip.1, index, offset
            ),
            TableFormatError::TableTooLong { chip, len } => write!(
                f,
                "routing table for chip ({}, {}) has {} entries; at most {} can be stored",
                chip.0,
                chip.1,
                len,
                u16::MAX
            ),
            TableFormatError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TableFormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableFormatError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TableFormatError {
    fn from(e: io::Error) -> Self {
        TableFormatError::Io(e)
    }
}

/// Fills as much of `buf` as the reader can provide, returning the number of
/// bytes read. Fewer than `buf.len()` bytes means EOF was reached.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn decode_entry(bytes: &[u8; ENTRY_BYTES]) -> Rule {
    Rule {
        keymask: Keymask::new(le_u32(bytes, 0), le_u32(bytes, 4)),
        sources: SourceSet(le_u32(bytes, 8)),
        route: RouteSet(le_u32(bytes, 12)),
    }
}

fn encode_entry(rule: &Rule) -> [u8; ENTRY_BYTES] {
    let mut bytes = [0u8; ENTRY_BYTES];
    bytes[0..4].copy_from_slice(&rule.keymask.key.to_le_bytes());
    bytes[4..8].copy_from_slice(&rule.keymask.mask.to_le_bytes());
    bytes[8..12].copy_from_slice(&rule.sources.bits().to_le_bytes());
    bytes[12..16].copy_from_slice(&rule.route.bits().to_le_bytes());
    bytes
}

/// Reads the next table, or `None` at a clean end of stream.
///
/// `offset` is the byte offset of the stream position and is advanced past
/// everything consumed.
pub fn read_table<R: Read>(
    reader: &mut R,
    offset: &mut u64,
) -> Result<Option<ChipTable>, TableFormatError> {
    let mut header = [0u8; HEADER_BYTES];
    let got = read_fully(reader, &mut header)?;
    if got == 0 {
        return Ok(None);
    }
    if got < HEADER_BYTES {
        return Err(TableFormatError::TruncatedHeader { offset: *offset });
    }
    *offset += HEADER_BYTES as u64;
    let (x, y) = (header[0], header[1]);
    let len = u16::from_le_bytes([header[2], header[3]]) as usize;

    let mut rules = Vec::with_capacity(len);
    let mut entry = [0u8; ENTRY_BYTES];
    for index in 0..len {
        if read_fully(reader, &mut entry)? < ENTRY_BYTES {
            return Err(TableFormatError::TruncatedEntry {
                chip: (x, y),
                index,
                offset: *offset,
            });
        }
        *offset += ENTRY_BYTES as u64;
        rules.push(decode_entry(&entry));
    }
    Ok(Some(ChipTable::new(x, y, rules)))
}

/// Reads every table in the stream.
pub fn read_tables<R: Read>(mut reader: R) -> Result<Vec<ChipTable>, TableFormatError> {
    let mut offset = 0u64;
    let mut tables = Vec::new();
    while let Some(table) = read_table(&mut reader, &mut offset)? {
        log::trace!(
            "read table for chip ({}, {}) with {} entries",
            table.x,
            table.y,
            table.rules.len()
        );
        tables.push(table);
    }
    Ok(tables)
}

pub fn write_table<W: Write>(writer: &mut W, table: &ChipTable) -> Result<(), TableFormatError> {
    let len: u16 = table
        .rules
        .len()
        .try_into()
        .map_err(|_| TableFormatError::TableTooLong {
            chip: table.chip(),
            len: table.rules.len(),
        })?;
    let mut header = [table.x, table.y, 0, 0];
    header[2..4].copy_from_slice(&len.to_le_bytes());
    writer.write_all(&header)?;
    for rule in &table.rules {
        writer.write_all(&encode_entry(rule))?;
    }
    Ok(())
}

pub fn write_tables<W: Write>(mut writer: W, tables: &[ChipTable]) -> Result<(), TableFormatError> {
    for table in tables {
        write_table(&mut writer, table)?;
    }
    writer.flush()?;
    Ok(())
}
