use color_print::cprintln;
use std::fmt;
use thiserror::Error;

/// What went wrong on a source line. Every kind aborts the compilation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("Referenced constant does not exist")]
    NonexistentConstant,

    #[error("Referenced variable does not exist")]
    NonexistentVariable,

    #[error("Referenced label does not exist")]
    NonexistentLabel,

    #[error("Mnemonic is not in the instruction set")]
    NonexistentMnemonic,

    #[error("Not enough operands")]
    MissingOperands,

    #[error("One or more unnecessary operands")]
    UnnecessaryOperand,

    #[error("Operand magnitude is not supported")]
    UnsupportedOperandMagnitude,

    #[error("Relative jump is too far")]
    VeryLargeRelativeJump,

    #[error("Instruction lacks at least one space of margin")]
    NonexistentMarginSpace,

    #[error("Source has no END directive")]
    NonexistentEndDirective,

    #[error("Instructions found after the END directive")]
    EndConflict,

    #[error("Label is already defined")]
    ExistingLabel,

    #[error("Start address was not set with an ORG directive")]
    NonexistentOrgDirective,

    #[error("Start address cannot be set more than once")]
    OrgConflict,

    #[error("Cannot parse numeric literal")]
    NumericParsing,

    #[error("Instruction does not support this addressing mode")]
    UnsupportedAddressingMode,

    #[error("Operand format is incorrect")]
    BadFormat,

    #[error("Absolute jump is too far")]
    VeryLargeAbsoluteJump,

    #[error("Constant is already defined")]
    ExistingConstant,
}

impl ErrorKind {
    /// Stable error number shown in listings.
    pub fn code(&self) -> u8 {
        use ErrorKind::*;
        match self {
            NonexistentConstant => 1,
            NonexistentVariable => 2,
            NonexistentLabel => 3,
            NonexistentMnemonic => 4,
            MissingOperands => 5,
            UnnecessaryOperand => 6,
            UnsupportedOperandMagnitude => 7,
            VeryLargeRelativeJump => 8,
            NonexistentMarginSpace => 9,
            NonexistentEndDirective => 10,
            EndConflict => 11,
            ExistingLabel => 12,
            NonexistentOrgDirective => 13,
            OrgConflict => 14,
            NumericParsing => 15,
            UnsupportedAddressingMode => 18,
            BadFormat => 19,
            VeryLargeAbsoluteJump => 20,
            ExistingConstant => 21,
        }
    }

    pub fn at(self, line: usize) -> Error {
        Error { line, kind: self }
    }
}

/// A compile error pinned to its 0-indexed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub line: usize,
    pub kind: ErrorKind,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error {}: {} (line {})",
            self.kind.code(),
            self.kind,
            self.line
        )
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Print error with diagnostic information showing file location and line content
    pub fn print_diag(&self, file: &str, lines: &[String]) {
        cprintln!("<red,bold>error[{}]</>: {}", self.kind.code(), self.kind);

        // line is 0-based, display as 1-based
        let line_num = self.line + 1;
        cprintln!("     <blue>--></> <underline>{}:{}</>", file, line_num);
        cprintln!("      <blue>|</>");

        // Missing END points one past the last line
        if let Some(content) = lines.get(self.line) {
            cprintln!(" <blue>{:>4} |</> {}", line_num, content);
            cprintln!("      <blue>|</>");
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
