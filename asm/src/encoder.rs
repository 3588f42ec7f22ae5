//! Addressing-mode resolution.
//!
//! Turns a mnemonic and its raw operand tokens into an [`Instruction`]: the
//! addressing variant, its opcode, the operand values (or the labels they wait
//! on) and the encoded size. Only constants are consulted here; labels are left
//! for pass 2.

use arch::{Entry, InstructionTable, Mode, Modes, Opcode, Special};

use crate::{error::ErrorKind, line::CompiledLine, literal, symbol::SymbolTable};

/// Largest value for 1-byte (direct page, displacement, mask) operand slots.
pub const BYTE_MAX: u32 = 0xFF;
/// Largest value for 2-byte (extended address, wide immediate) operand slots.
pub const WORD_MAX: u32 = 0xFFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Value(u32),
    /// Resolved against the label table in pass 2.
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub mode: Mode,
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    pub size: usize,
}

impl Instruction {
    fn new(mode: Mode, opcode: Opcode, operands: Vec<Operand>, operand_bytes: usize) -> Self {
        Instruction {
            mode,
            opcode,
            operands,
            size: opcode.size() + operand_bytes,
        }
    }

    pub fn into_line(self, address: u32) -> CompiledLine {
        let mut line = CompiledLine {
            address: Some(address),
            opcode: Some(self.opcode),
            mode: Some(self.mode),
            size: self.size,
            ..CompiledLine::default()
        };
        for (idx, operand) in self.operands.into_iter().enumerate() {
            match operand {
                Operand::Value(v) => line.operands.push(v as i32),
                Operand::Label(name) => {
                    line.pending.insert(idx, name);
                }
            }
        }
        line
    }
}

/// Which table a failed name lookup is reported against.
#[derive(Debug, Clone, Copy)]
enum Lookup {
    Constant,
    Variable,
}

impl Lookup {
    fn missing(self) -> ErrorKind {
        match self {
            Lookup::Constant => ErrorKind::NonexistentConstant,
            Lookup::Variable => ErrorKind::NonexistentVariable,
        }
    }
}

pub struct Encoder<'a> {
    table: &'a InstructionTable,
    symbols: &'a SymbolTable,
}

impl<'a> Encoder<'a> {
    pub fn new(table: &'a InstructionTable, symbols: &'a SymbolTable) -> Self {
        Encoder { table, symbols }
    }

    pub fn encode(&self, mnemonic: &str, operands: &[String]) -> Result<Instruction, ErrorKind> {
        match self.table.lookup(mnemonic) {
            None => Err(ErrorKind::NonexistentMnemonic),
            Some(Entry::Special(special)) => self.special(special, operands),
            Some(Entry::Standard(modes)) => self.standard(mnemonic, modes, operands),
        }
    }

    // ------------------------------------------------------------------------
    // Bit manipulation family: `BSET addr,#mask` / `BRSET addr,#mask target`

    fn special(&self, special: &Special, operands: &[String]) -> Result<Instruction, ErrorKind> {
        let parts: Vec<&str> = operands
            .iter()
            .flat_map(|operand| operand.split(",#"))
            .collect();
        if parts.len() < special.operands {
            return Err(ErrorKind::MissingOperands);
        }
        if parts.len() > special.operands {
            return Err(ErrorKind::UnnecessaryOperand);
        }

        let (mode, base) = match index_suffix(parts[0])? {
            Some((base, mode)) => (mode, base),
            None => (Mode::Direct, parts[0]),
        };
        let opcode = opcode(&special.modes, mode)?;
        let addr = self.resolve(base, BYTE_MAX, Lookup::Variable)?;

        let mask = parts[1].strip_prefix('#').unwrap_or(parts[1]);
        let mask = self.resolve(mask, BYTE_MAX, Lookup::Variable)?;

        let mut values = vec![Operand::Value(addr), Operand::Value(mask)];
        if let Some(target) = parts.get(2) {
            values.push(self.resolve_or_defer(target, BYTE_MAX)?);
        }
        Ok(Instruction::new(mode, opcode, values, special.operands))
    }

    // ------------------------------------------------------------------------
    // Everything else, first match wins

    fn standard(
        &self,
        mnemonic: &str,
        modes: &Modes,
        operands: &[String],
    ) -> Result<Instruction, ErrorKind> {
        let operand = match operands {
            [] => {
                let opcode = modes.get(Mode::Inherent).ok_or(ErrorKind::MissingOperands)?;
                return Ok(Instruction::new(Mode::Inherent, opcode, vec![], 0));
            }
            [operand] => operand.as_str(),
            _ => return Err(ErrorKind::UnnecessaryOperand),
        };

        // Branches never share a mnemonic with other modes
        if let Some(opcode) = modes.get(Mode::Relative) {
            let target = self.resolve_or_defer(operand, BYTE_MAX)?;
            return Ok(Instruction::new(Mode::Relative, opcode, vec![target], 1));
        }

        if let Some(value) = operand.strip_prefix('#') {
            let opcode = opcode(modes, Mode::Immediate)?;
            let value = self.resolve(value, WORD_MAX, Lookup::Constant)?;
            let width = if value <= BYTE_MAX { 1 } else { 2 };
            return Ok(Instruction::new(
                Mode::Immediate,
                opcode,
                vec![Operand::Value(value)],
                width,
            ));
        }

        if let Some((base, mode)) = index_suffix(operand)? {
            let opcode = opcode(modes, mode)?;
            let offset = self.resolve(base, BYTE_MAX, Lookup::Variable)?;
            return Ok(Instruction::new(mode, opcode, vec![Operand::Value(offset)], 1));
        }

        if mnemonic.eq_ignore_ascii_case("JMP") {
            let opcode = opcode(modes, Mode::Extended)?;
            let target = self.resolve_or_defer(operand, WORD_MAX)?;
            return Ok(Instruction::new(Mode::Extended, opcode, vec![target], 2));
        }

        if mnemonic.eq_ignore_ascii_case("JSR") {
            let target = self.resolve_or_defer(operand, WORD_MAX)?;
            // A forward label may land anywhere, only EXT is safe
            if let Operand::Value(addr) = target {
                if addr <= BYTE_MAX {
                    if let Some(opcode) = modes.get(Mode::Direct) {
                        return Ok(Instruction::new(Mode::Direct, opcode, vec![target], 1));
                    }
                }
            }
            let opcode = opcode(modes, Mode::Extended)?;
            return Ok(Instruction::new(Mode::Extended, opcode, vec![target], 2));
        }

        let addr = self.resolve(operand, WORD_MAX, Lookup::Variable)?;
        if addr <= BYTE_MAX {
            if let Some(opcode) = modes.get(Mode::Direct) {
                return Ok(Instruction::new(
                    Mode::Direct,
                    opcode,
                    vec![Operand::Value(addr)],
                    1,
                ));
            }
        }
        let opcode = opcode(modes, Mode::Extended)?;
        Ok(Instruction::new(
            Mode::Extended,
            opcode,
            vec![Operand::Value(addr)],
            2,
        ))
    }

    // ------------------------------------------------------------------------
    // Operand values

    /// Literal, else constant; the name must already be defined.
    fn resolve(&self, token: &str, max: u32, lookup: Lookup) -> Result<u32, ErrorKind> {
        let value = match literal::parse(token) {
            Ok(value) => value,
            Err(_) => self.symbols.constant(token).ok_or(lookup.missing())?,
        };
        check_magnitude(value, max)
    }

    /// Literal, else constant, else a label left for pass 2.
    fn resolve_or_defer(&self, token: &str, max: u32) -> Result<Operand, ErrorKind> {
        let value = match literal::parse(token) {
            Ok(value) => value,
            Err(_) => match self.symbols.constant(token) {
                Some(value) => value,
                None => return Ok(Operand::Label(token.to_string())),
            },
        };
        check_magnitude(value, max).map(Operand::Value)
    }
}

fn check_magnitude(value: u32, max: u32) -> Result<u32, ErrorKind> {
    if value > max {
        return Err(ErrorKind::UnsupportedOperandMagnitude);
    }
    Ok(value)
}

fn opcode(modes: &Modes, mode: Mode) -> Result<Opcode, ErrorKind> {
    modes.get(mode).ok_or(ErrorKind::UnsupportedAddressingMode)
}

/// Split `base,X` / `base,Y`. `Ok(None)` when the operand is not indexed.
fn index_suffix(operand: &str) -> Result<Option<(&str, Mode)>, ErrorKind> {
    let mut tail = operand.char_indices().rev();
    let (Some((_, register)), Some((comma, ','))) = (tail.next(), tail.next()) else {
        return Ok(None);
    };
    match Mode::indexed(register) {
        Some(mode) => Ok(Some((&operand[..comma], mode))),
        None => Err(ErrorKind::BadFormat),
    }
}
