use arch::{Mode, Opcode};
use indexmap::IndexMap;

use crate::object::ObjectError;

/// Output of pass 1/2 for a single source line.
///
/// Blank, label and directive lines stay empty and never contribute bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledLine {
    pub address: Option<u32>,
    pub opcode: Option<Opcode>,
    /// Addressing variant the opcode was selected for, `None` for `FCB` data.
    pub mode: Option<Mode>,
    pub operands: Vec<i32>,
    /// Operand index -> label, filled in by pass 2.
    pub pending: IndexMap<usize, String>,
    pub size: usize,
}

impl CompiledLine {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Form-constant bytes: the first byte stands in for the opcode.
    pub fn data(address: u32, bytes: &[u8]) -> Self {
        let (first, rest) = bytes
            .split_first()
            .map_or((0, &[][..]), |(first, rest)| (*first, rest));
        CompiledLine {
            address: Some(address),
            opcode: Some(Opcode::byte(first)),
            mode: None,
            operands: rest.iter().map(|b| *b as i32).collect(),
            pending: IndexMap::new(),
            size: bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.opcode.is_none() && self.operands.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn opcode_size(&self) -> usize {
        self.opcode.map_or(0, |op| op.size())
    }

    /// Bytes per operand: 1 when there are several, otherwise whatever the size leaves.
    pub fn operand_width(&self) -> usize {
        if self.operands.len() > 1 {
            1
        } else {
            self.size.saturating_sub(self.opcode_size())
        }
    }

    /// Opcode followed by every operand, each in its own byte group.
    pub fn byte_groups(&self) -> Result<Vec<Vec<u8>>, ObjectError> {
        let mut groups = Vec::with_capacity(1 + self.operands.len());
        if let Some(op) = self.opcode {
            groups.push(op.bytes());
        }
        let width = self.operand_width();
        for &operand in &self.operands {
            let addr = self.address.unwrap_or_default();
            let value =
                twos_complement(operand, width).ok_or(ObjectError::OperandOverflow(addr, operand))?;
            groups.push(value.to_be_bytes()[8 - width..].to_vec());
        }
        Ok(groups)
    }

    pub fn bytes(&self) -> Result<Vec<u8>, ObjectError> {
        Ok(self.byte_groups()?.concat())
    }
}

/// Encode `value` into `width` bytes, masking negative values to two's complement.
///
/// Returns `None` when the magnitude does not fit the width.
pub fn twos_complement(value: i32, width: usize) -> Option<u64> {
    if width == 0 || width > 4 {
        return None;
    }
    let mask: u64 = (1u64 << (8 * width)) - 1;
    let value = value as i64;
    if value.unsigned_abs() > mask {
        return None;
    }
    Some(value as u64 & mask)
}

/// `8610FF` -> `86 10 FF`
pub fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
