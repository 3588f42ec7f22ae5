pub mod error;
pub mod mode;
pub mod opcode;
pub mod table;

pub use error::TableError;
pub use mode::Mode;
pub use opcode::Opcode;
pub use table::{Entry, InstructionTable, Modes, Special};
