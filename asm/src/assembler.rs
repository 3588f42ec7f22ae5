use arch::InstructionTable;
use tracing::{debug, trace};

use crate::{
    encoder::{Encoder, BYTE_MAX, WORD_MAX},
    error::{ErrorKind, Result},
    line::CompiledLine,
    literal,
    object::{self, ObjectError, Runs},
    parser::Stmt,
    symbol::SymbolTable,
};

/// Result of a successful compilation: one line per source line, plus symbols.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub lines: Vec<CompiledLine>,
    pub symbols: SymbolTable,
}

impl Program {
    pub fn runs(&self) -> std::result::Result<Runs, ObjectError> {
        object::merge_runs(&self.lines)
    }
}

pub struct Assembler<'a> {
    table: &'a InstructionTable,
    multiple_org: bool,
}

impl<'a> Assembler<'a> {
    pub fn new(table: &'a InstructionTable) -> Self {
        Assembler {
            table,
            multiple_org: false,
        }
    }

    /// Let every `ORG` start a new segment instead of rejecting the second one.
    pub fn multiple_org(mut self, allow: bool) -> Self {
        self.multiple_org = allow;
        self
    }

    pub fn assemble<S: AsRef<str>>(&self, source: &[S]) -> Result<Program> {
        let mut program = self.first_pass(source)?;
        second_pass(&mut program.lines, &program.symbols)?;
        Ok(program)
    }

    /// Classify and encode every line, collecting symbols. Label operands stay pending.
    pub fn first_pass<S: AsRef<str>>(&self, source: &[S]) -> Result<Program> {
        debug!(lines = source.len(), "pass 1");
        let mut program = Program::default();
        let mut target: Option<u32> = None;
        let mut ended = false;

        for (idx, raw) in source.iter().enumerate() {
            let stmt = Stmt::parse(raw.as_ref());
            if stmt == Ok(Stmt::Blank) {
                program.lines.push(CompiledLine::empty());
                continue;
            }
            if ended {
                return Err(ErrorKind::EndConflict.at(idx));
            }

            let line = self
                .line(stmt, &mut program.symbols, &mut target, &mut ended)
                .map_err(|kind| kind.at(idx))?;
            if let (Some(addr), Some(_)) = (line.address, line.opcode) {
                trace!(
                    line = idx,
                    addr,
                    mode = line.mode.map(tracing::field::display),
                    size = line.size,
                    pending = line.is_pending()
                );
                target = Some(addr + line.size as u32);
            }
            program.lines.push(line);
        }

        if !ended {
            return Err(ErrorKind::NonexistentEndDirective.at(source.len()));
        }
        debug!(
            labels = program.symbols.labels().len(),
            constants = program.symbols.constants().len(),
            "pass 1 done"
        );
        Ok(program)
    }

    fn line(
        &self,
        stmt: std::result::Result<Stmt, ErrorKind>,
        symbols: &mut SymbolTable,
        target: &mut Option<u32>,
        ended: &mut bool,
    ) -> std::result::Result<CompiledLine, ErrorKind> {
        match stmt? {
            Stmt::Blank => {}
            Stmt::Label(name) => {
                let addr = target.ok_or(ErrorKind::NonexistentOrgDirective)?;
                symbols.define_label(&name, addr)?;
            }
            Stmt::Equ(name, value) => {
                symbols.define_constant(&name, literal::parse(&value)?)?;
            }
            Stmt::Org(addr) => {
                if target.is_some() && !self.multiple_org {
                    return Err(ErrorKind::OrgConflict);
                }
                let addr = literal::parse(&addr)?;
                if addr > WORD_MAX {
                    return Err(ErrorKind::UnsupportedOperandMagnitude);
                }
                *target = Some(addr);
            }
            Stmt::End => *ended = true,
            Stmt::Fcb(tokens) => {
                let addr = target.ok_or(ErrorKind::NonexistentOrgDirective)?;
                let bytes = tokens
                    .iter()
                    .map(|token| form_byte(token, symbols))
                    .collect::<std::result::Result<Vec<u8>, ErrorKind>>()?;
                return Ok(CompiledLine::data(addr, &bytes));
            }
            Stmt::Inst(mnemonic, operands) => {
                let addr = target.ok_or(ErrorKind::NonexistentOrgDirective)?;
                let inst = Encoder::new(self.table, symbols).encode(&mnemonic, &operands)?;
                return Ok(inst.into_line(addr));
            }
        }
        Ok(CompiledLine::empty())
    }
}

fn form_byte(token: &str, symbols: &SymbolTable) -> std::result::Result<u8, ErrorKind> {
    let value = match literal::parse(token) {
        Ok(value) => value,
        Err(err) if token.is_empty() => return Err(err),
        Err(_) => symbols
            .constant(token)
            .ok_or(ErrorKind::NonexistentConstant)?,
    };
    if value > BYTE_MAX {
        return Err(ErrorKind::UnsupportedOperandMagnitude);
    }
    Ok(value as u8)
}

/// Fill every pending operand from the label table.
///
/// Extended-mode lines take the label's absolute address; everything else is a
/// branch and takes the displacement from the end of the instruction.
pub fn second_pass(lines: &mut [CompiledLine], symbols: &SymbolTable) -> Result<()> {
    debug!(
        pending = lines.iter().filter(|line| line.is_pending()).count(),
        "pass 2"
    );
    for (idx, line) in lines.iter_mut().enumerate() {
        if !line.is_pending() {
            continue;
        }
        let resolved = line
            .pending
            .iter()
            .map(|(&operand, label)| Ok((operand, resolve_label(line, label, symbols)?)))
            .collect::<std::result::Result<Vec<_>, ErrorKind>>()
            .map_err(|kind| kind.at(idx))?;

        for (operand, value) in resolved {
            let at = operand.min(line.operands.len());
            line.operands.insert(at, value);
        }
        line.pending.clear();
    }
    Ok(())
}

fn resolve_label(
    line: &CompiledLine,
    label: &str,
    symbols: &SymbolTable,
) -> std::result::Result<i32, ErrorKind> {
    let target = symbols.label(label).ok_or(ErrorKind::NonexistentLabel)?;

    if line.mode.is_some_and(|mode| mode.is_absolute()) {
        if target > WORD_MAX {
            return Err(ErrorKind::VeryLargeAbsoluteJump);
        }
        return Ok(target as i32);
    }

    let next = line.address.unwrap_or_default() as i64 + line.size as i64;
    let jump = target as i64 - next;
    if jump.abs() > BYTE_MAX as i64 {
        return Err(ErrorKind::VeryLargeRelativeJump);
    }
    Ok(jump as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::{Mode, Opcode};

    fn hc11() -> &'static InstructionTable {
        InstructionTable::builtin()
    }

    fn assemble(src: &str) -> Result<Program> {
        let lines: Vec<&str> = src.lines().collect();
        Assembler::new(hc11()).assemble(&lines)
    }

    fn pending_line(addr: u32, mode: Mode, size: usize, label: &str) -> CompiledLine {
        let mut line = CompiledLine {
            address: Some(addr),
            opcode: Some(Opcode::byte(0x20)),
            mode: Some(mode),
            size,
            ..Default::default()
        };
        line.pending.insert(0, label.to_string());
        line
    }

    #[test]
    fn one_line_per_source_line() {
        let src = "* demo\n  ORG $8000\nSTART\n  LDAA #1\n\n  END\n";
        let program = assemble(src).unwrap();
        assert_eq!(program.lines.len(), 6);
        assert!(program.lines[0].is_empty());
        assert!(program.lines[1].is_empty());
        assert!(program.lines[2].is_empty());
        assert_eq!(program.lines[3].address, Some(0x8000));
        assert_eq!(program.symbols.label("START"), Some(0x8000));
    }

    #[test]
    fn equ_constant_resolves() {
        let src = "COUNT EQU $10\n  ORG $100\n  LDAA #COUNT\n  END";
        let program = assemble(src).unwrap();
        assert_eq!(program.symbols.constant("COUNT"), Some(16));
        assert_eq!(program.lines[2].operands, vec![16]);
    }

    #[test]
    fn forward_branch_is_pending_then_resolved() {
        let src = "  ORG $100\n  BRA TARGET\n  NOP\nTARGET:\n  END";
        let lines: Vec<&str> = src.lines().collect();
        let asm = Assembler::new(hc11());

        let mut program = asm.first_pass(&lines).unwrap();
        assert!(program.lines[1].is_pending());
        assert!(program.lines[1].operands.is_empty());

        second_pass(&mut program.lines, &program.symbols).unwrap();
        let bra = &program.lines[1];
        assert!(!bra.is_pending());
        // TARGET = $103, next = $102
        assert_eq!(bra.operands, vec![1]);
    }

    #[test]
    fn backward_branch_is_negative() {
        let src = "  ORG $100\nLOOP\n  NOP\n  BRA LOOP\n  END";
        let program = assemble(src).unwrap();
        assert_eq!(program.lines[3].operands, vec![-3]);
        assert_eq!(program.lines[3].bytes().unwrap(), vec![0x20, 0xFD]);
    }

    #[test]
    fn relative_boundary() {
        let mut symbols = SymbolTable::new();
        symbols.define_label("FWD", 0x100 + 2 + 0xFF).unwrap();
        symbols.define_label("BACK", 0x100 + 2 - 0xFF).unwrap();
        symbols.define_label("FAR", 0x100 + 2 + 0x100).unwrap();

        let mut lines = vec![
            pending_line(0x100, Mode::Relative, 2, "FWD"),
            pending_line(0x100, Mode::Relative, 2, "BACK"),
        ];
        second_pass(&mut lines, &symbols).unwrap();
        assert_eq!(lines[0].operands, vec![0xFF]);
        assert_eq!(lines[1].operands, vec![-0xFF]);

        let mut lines = vec![CompiledLine::empty(), pending_line(0x100, Mode::Relative, 2, "FAR")];
        assert_eq!(
            second_pass(&mut lines, &symbols),
            Err(ErrorKind::VeryLargeRelativeJump.at(1))
        );
    }

    #[test]
    fn absolute_targets() {
        let mut symbols = SymbolTable::new();
        symbols.define_label("NEAR", 0x10).unwrap();
        symbols.define_label("HIGH", 0x10000).unwrap();

        let mut lines = vec![pending_line(0x8000, Mode::Extended, 3, "NEAR")];
        second_pass(&mut lines, &symbols).unwrap();
        assert_eq!(lines[0].operands, vec![0x10]);

        let mut lines = vec![pending_line(0x8000, Mode::Extended, 3, "HIGH")];
        assert_eq!(
            second_pass(&mut lines, &symbols),
            Err(ErrorKind::VeryLargeAbsoluteJump.at(0))
        );

        let mut lines = vec![pending_line(0x8000, Mode::Extended, 3, "NOWHERE")];
        assert_eq!(
            second_pass(&mut lines, &symbols),
            Err(ErrorKind::NonexistentLabel.at(0))
        );
    }

    #[test]
    fn jmp_and_jsr_selection() {
        let src = "  ORG $10\nLOW\n  JMP LOW\n  JSR $20\n  JSR $2000\n  JSR LOW\n  END";
        let program = assemble(src).unwrap();
        assert_eq!(program.lines[2].mode, Some(Mode::Extended));
        assert_eq!(program.lines[2].bytes().unwrap(), vec![0x7E, 0x00, 0x10]);
        assert_eq!(program.lines[3].mode, Some(Mode::Direct));
        assert_eq!(program.lines[4].mode, Some(Mode::Extended));
        // label operands are never range-checked in pass 1, so JSR LOW stays EXT
        assert_eq!(program.lines[5].mode, Some(Mode::Extended));
        assert_eq!(program.lines[5].bytes().unwrap(), vec![0xBD, 0x00, 0x10]);
    }

    #[test]
    fn constant_shadows_label() {
        let src = "SKIP EQU 4\n  ORG $100\nSKIP\n  BRA SKIP\n  END";
        let program = assemble(src).unwrap();
        assert_eq!(program.symbols.label("SKIP"), Some(0x100));
        assert!(program.lines[3].pending.is_empty());
        assert_eq!(program.lines[3].operands, vec![4]);
    }

    #[test]
    fn bit_branch_resolves_third_operand() {
        let src = "  ORG $0\nWAIT\n  BRSET $10,#$01 WAIT\n  END";
        let program = assemble(src).unwrap();
        assert_eq!(program.lines[2].operands, vec![0x10, 0x01, -4]);
        assert_eq!(program.lines[2].bytes().unwrap(), vec![0x12, 0x10, 0x01, 0xFC]);
    }

    #[test]
    fn form_constant_bytes() {
        let src = "LETTER EQU 'A\n  ORG $20\n  FCB 1,$FF,LETTER\n  NOP\n  END";
        let program = assemble(src).unwrap();
        assert_eq!(program.lines[2].bytes().unwrap(), vec![0x01, 0xFF, 0x41]);
        assert_eq!(program.lines[3].address, Some(0x23));

        assert_eq!(
            assemble("  ORG 0\n  FCB $100\n  END").unwrap_err(),
            ErrorKind::UnsupportedOperandMagnitude.at(1)
        );
        assert_eq!(
            assemble("  ORG 0\n  FCB 1,,2\n  END").unwrap_err(),
            ErrorKind::NumericParsing.at(1)
        );
    }

    macro_rules! fails {
        ($($name:ident: $src:expr => ($kind:expr, $line:expr),)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(assemble($src).unwrap_err(), $kind.at($line));
                }
            )*
        }
    }

    fails! {
        missing_end: "  ORG 0\n  NOP\n\n" => (ErrorKind::NonexistentEndDirective, 3),
        existing_label: "  ORG 0\nLBL:\n  NOP\nLBL:\n  END" => (ErrorKind::ExistingLabel, 3),
        existing_constant: "A EQU 1\nA EQU 2\n  END" => (ErrorKind::ExistingConstant, 1),
        code_after_end: "  ORG 0\n  END\n  NOP" => (ErrorKind::EndConflict, 2),
        label_after_end: "  ORG 0\n  END\n\nLATE" => (ErrorKind::EndConflict, 3),
        second_org: "  ORG 0\n  ORG 5\n  END" => (ErrorKind::OrgConflict, 1),
        code_before_org: "  NOP\n  END" => (ErrorKind::NonexistentOrgDirective, 0),
        label_before_org: "EARLY\n  ORG 0\n  END" => (ErrorKind::NonexistentOrgDirective, 0),
        fcb_before_org: "  FCB 1\n  END" => (ErrorKind::NonexistentOrgDirective, 0),
        bad_org: "  ORG $XYZ\n  END" => (ErrorKind::NumericParsing, 0),
        org_past_address_space: "  ORG $FFFFFFFF\n  NOP\n  END" => (ErrorKind::UnsupportedOperandMagnitude, 0),
        org_just_past_address_space: "  ORG $10000\n  END" => (ErrorKind::UnsupportedOperandMagnitude, 0),
        bad_equ: "A EQU ONE\n  END" => (ErrorKind::NumericParsing, 0),
        unknown_label: "  ORG 0\n  BRA NOWHERE\n  END" => (ErrorKind::NonexistentLabel, 1),
        unknown_mnemonic: "  ORG 0\n  FROB\n  END" => (ErrorKind::NonexistentMnemonic, 1),
        margin: "  ORG 0\nLOOP NOP\n  END" => (ErrorKind::NonexistentMarginSpace, 1),
    }

    #[test]
    fn org_at_top_of_address_space() {
        let program = assemble("  ORG $FFFF\n  NOP\n  END").unwrap();
        assert_eq!(program.lines[1].address, Some(0xFFFF));
        assert_eq!(program.lines[1].bytes().unwrap(), vec![0x01]);
    }

    #[test]
    fn multiple_org_starts_new_segment() {
        let src = ["  ORG $100", "  NOP", "  ORG $200", "  NOP", "  END"];
        let program = Assembler::new(hc11())
            .multiple_org(true)
            .assemble(&src)
            .unwrap();
        assert_eq!(program.lines[1].address, Some(0x100));
        assert_eq!(program.lines[3].address, Some(0x200));
    }

    #[test]
    fn addresses_are_contiguous() {
        let src = "  ORG $8000\n  LDAA #$10\n  STAA $1000\n  LDX #$1234\n  INX\n  BRSET 0,X,#1 END1\nEND1\n  END";
        let program = assemble(src).unwrap();
        let code: Vec<&CompiledLine> = program.lines.iter().filter(|l| !l.is_empty()).collect();
        for pair in code.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            assert_eq!(
                next.address.unwrap(),
                prev.address.unwrap() + prev.size as u32
            );
        }
    }
}
