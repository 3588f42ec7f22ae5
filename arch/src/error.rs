use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to read instruction table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON instruction table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed YAML instruction table: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported instruction table format: `{0}` (expected .json, .yaml or .yml)")]
    UnknownFormat(String),

    #[error("Opcode `{0}` is not a 1 or 2 byte hex string")]
    BadOpcode(String),

    #[error("Mnemonic `{0}` is defined more than once")]
    DuplicateMnemonic(String),

    #[error("Mnemonic `{0}` declares {1} operands (special mnemonics take 2 or 3)")]
    BadOperandCount(String, usize),

    #[error("Mnemonic `{0}` has no addressing modes")]
    NoModes(String),
}
