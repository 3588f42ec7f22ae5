//! Object file emitters.
//!
//! Compiled lines are merged into runs of contiguous bytes keyed by their start
//! address, then written either as a plain hex dump or as Motorola S-records.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::line::{spaced_hex, CompiledLine};

/// Start address -> contiguous bytes.
pub type Runs = BTreeMap<u32, Vec<u8>>;

/// Bytes per S1 record when the caller does not say otherwise.
pub const DEFAULT_RECORD_LEN: usize = 16;
/// A count byte covers address (2) + data + checksum (1).
const MAX_RECORD_LEN: usize = 0xFF - 3;

const S9_TERMINATOR: &str = "S9030000FC";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    #[error("Nothing to emit: program has no code")]
    NoCode,

    #[error("Line {0} still references an unresolved label")]
    Unresolved(usize),

    #[error("Operand {1} does not fit its slot at ${0:04X}")]
    OperandOverflow(u32, i32),

    #[error("Code at ${1:04X} overlaps code emitted at ${0:04X}")]
    Overlap(u32, u32),

    #[error("Code at ${0:04X} runs past the 16-bit address space")]
    AddressOverflow(u32),
}

/// Merge every code-bearing line into address-ordered contiguous runs.
pub fn merge_runs(lines: &[CompiledLine]) -> Result<Runs, ObjectError> {
    let mut runs = Runs::new();
    let mut current: Option<(u32, Vec<u8>)> = None;

    for (idx, line) in lines.iter().enumerate() {
        let Some(addr) = line.address else {
            continue;
        };
        if line.is_pending() {
            return Err(ObjectError::Unresolved(idx));
        }
        let bytes = line.bytes()?;
        if addr as usize + bytes.len() > 0x1_0000 {
            return Err(ObjectError::AddressOverflow(addr));
        }

        match current.as_mut() {
            Some((start, run)) if *start + run.len() as u32 == addr => run.extend(bytes),
            _ => {
                if let Some((start, run)) = current.replace((addr, bytes)) {
                    insert_run(&mut runs, start, run)?;
                }
            }
        }
    }
    if let Some((start, run)) = current {
        insert_run(&mut runs, start, run)?;
    }

    if runs.is_empty() {
        return Err(ObjectError::NoCode);
    }
    debug!(runs = runs.len(), "merged object code");
    Ok(runs)
}

fn insert_run(runs: &mut Runs, start: u32, bytes: Vec<u8>) -> Result<(), ObjectError> {
    let end = start + bytes.len() as u32;
    for (&other, other_bytes) in runs.iter() {
        let other_end = other + other_bytes.len() as u32;
        if start < other_end && other < end {
            return Err(ObjectError::Overlap(other, start));
        }
    }
    runs.insert(start, bytes);
    Ok(())
}

/// One `<ADDR> XX XX ..` line per `record_len` bytes.
pub fn hex_dump(runs: &Runs, record_len: usize) -> Vec<String> {
    chunks(runs, record_len)
        .map(|(addr, bytes)| format!("<{:04X}> {}", addr, spaced_hex(bytes)))
        .collect()
}

/// S1 data records followed by the S9 terminator.
pub fn s_records(runs: &Runs, record_len: usize) -> Vec<String> {
    let mut records: Vec<String> = chunks(runs, record_len.min(MAX_RECORD_LEN))
        .map(|(addr, bytes)| s1_record(addr, bytes))
        .collect();
    records.push(S9_TERMINATOR.to_string());
    records
}

fn s1_record(addr: u32, data: &[u8]) -> String {
    let mut body = Vec::with_capacity(data.len() + 3);
    body.push((data.len() + 3) as u8);
    body.extend((addr as u16).to_be_bytes());
    body.extend_from_slice(data);

    let mut record = String::from("S1");
    for byte in &body {
        record.push_str(&format!("{:02X}", byte));
    }
    record.push_str(&format!("{:02X}", checksum(&body)));
    record
}

/// One's complement of the low byte of the sum.
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

fn chunks<'a>(runs: &'a Runs, record_len: usize) -> impl Iterator<Item = (u32, &'a [u8])> + 'a {
    let record_len = record_len.max(1);
    runs.iter().flat_map(move |(&start, bytes)| {
        bytes
            .chunks(record_len)
            .enumerate()
            .map(move |(idx, chunk)| (start + (idx * record_len) as u32, chunk))
    })
}
