//! Two-pass assembler for table-driven 8-bit instruction sets.
//!
//! ```
//! use arch::InstructionTable;
//! use hcasm::Assembler;
//!
//! let src = ["  ORG $100", "LOOP", "  BRA LOOP", "  END"];
//! let program = Assembler::new(InstructionTable::builtin()).assemble(&src).unwrap();
//! let records = hcasm::object::s_records(&program.runs().unwrap(), 16);
//! assert_eq!(records, ["S105010020FEDB", "S9030000FC"]);
//! ```

pub mod assembler;
pub mod config;
pub mod encoder;
pub mod error;
pub mod line;
pub mod listing;
pub mod literal;
pub mod object;
pub mod parser;
pub mod symbol;

pub use assembler::{second_pass, Assembler, Program};
pub use config::{Config, ConfigError};
pub use encoder::{Encoder, Instruction, Operand};
pub use error::{Error, ErrorKind, Result};
pub use line::CompiledLine;
pub use object::ObjectError;
pub use symbol::SymbolTable;
