use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::Path;

use crate::{error::TableError, mode::Mode, opcode::Opcode};

static HC11: Lazy<InstructionTable> = Lazy::new(|| {
    InstructionTable::from_json(include_str!("../data/hc11.json"))
        .expect("bundled 68HC11 instruction table is well-formed")
});

// ----------------------------------------------------------------------------
// Data file shape

#[derive(Debug, Deserialize)]
struct RawTable {
    standard: IndexMap<String, IndexMap<Mode, String>>,
    #[serde(default, alias = "special")]
    exceptions: IndexMap<String, RawSpecial>,
}

#[derive(Debug, Deserialize)]
struct RawSpecial {
    operands: usize,
    #[serde(rename = "addressingModes", alias = "modes")]
    addressing_modes: IndexMap<Mode, String>,
}

// ----------------------------------------------------------------------------
// Modes

/// Opcodes of one mnemonic, keyed by addressing mode.
#[derive(Debug, Clone, Default)]
pub struct Modes(IndexMap<Mode, Opcode>);

impl Modes {
    fn parse(mnemonic: &str, raw: IndexMap<Mode, String>) -> Result<Self, TableError> {
        if raw.is_empty() {
            return Err(TableError::NoModes(mnemonic.to_string()));
        }
        raw.into_iter()
            .map(|(mode, hex)| Ok((mode, Opcode::parse(&hex)?)))
            .collect::<Result<IndexMap<_, _>, TableError>>()
            .map(Modes)
    }

    pub fn get(&self, mode: Mode) -> Option<Opcode> {
        self.0.get(&mode).copied()
    }
}

impl<const N: usize> From<[(Mode, Opcode); N]> for Modes {
    fn from(value: [(Mode, Opcode); N]) -> Self {
        Modes(IndexMap::from(value))
    }
}

/// Multi-operand mnemonic such as the bit-test-and-branch family.
#[derive(Debug, Clone)]
pub struct Special {
    pub operands: usize,
    pub modes: Modes,
}

/// What the table knows about one mnemonic.
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    Standard(&'a Modes),
    Special(&'a Special),
}

// ----------------------------------------------------------------------------
// Table

#[derive(Debug, Clone, Default)]
pub struct InstructionTable {
    standard: IndexMap<String, Modes>,
    special: IndexMap<String, Special>,
}

impl InstructionTable {
    /// The Motorola 68HC11 table shipped with the crate.
    pub fn builtin() -> &'static InstructionTable {
        &HC11
    }

    pub fn from_json(src: &str) -> Result<Self, TableError> {
        Self::from_raw(serde_json::from_str(src)?)
    }

    pub fn from_yaml(src: &str) -> Result<Self, TableError> {
        Self::from_raw(serde_yaml::from_str(src)?)
    }

    /// Load a table file, choosing the format from its extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&src),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::from_yaml(&src)
            }
            _ => Err(TableError::UnknownFormat(path.display().to_string())),
        }
    }

    fn from_raw(raw: RawTable) -> Result<Self, TableError> {
        let mut table = InstructionTable::default();
        for (mnemonic, modes) in raw.standard {
            let modes = Modes::parse(&mnemonic, modes)?;
            table.insert_standard(&mnemonic, modes)?;
        }
        for (mnemonic, special) in raw.exceptions {
            let modes = Modes::parse(&mnemonic, special.addressing_modes)?;
            table.insert_special(&mnemonic, special.operands, modes)?;
        }
        Ok(table)
    }

    pub fn insert_standard(&mut self, mnemonic: &str, modes: Modes) -> Result<(), TableError> {
        let key = self.fresh_key(mnemonic)?;
        self.standard.insert(key, modes);
        Ok(())
    }

    pub fn insert_special(
        &mut self,
        mnemonic: &str,
        operands: usize,
        modes: Modes,
    ) -> Result<(), TableError> {
        if !(2..=3).contains(&operands) {
            return Err(TableError::BadOperandCount(mnemonic.to_string(), operands));
        }
        let key = self.fresh_key(mnemonic)?;
        self.special.insert(key, Special { operands, modes });
        Ok(())
    }

    fn fresh_key(&self, mnemonic: &str) -> Result<String, TableError> {
        let key = mnemonic.trim().to_ascii_lowercase();
        if self.contains(&key) {
            return Err(TableError::DuplicateMnemonic(mnemonic.to_string()));
        }
        Ok(key)
    }

    pub fn contains(&self, mnemonic: &str) -> bool {
        self.lookup(mnemonic).is_some()
    }

    pub fn lookup(&self, mnemonic: &str) -> Option<Entry<'_>> {
        let key = mnemonic.to_ascii_lowercase();
        if let Some(special) = self.special.get(&key) {
            return Some(Entry::Special(special));
        }
        self.standard.get(&key).map(Entry::Standard)
    }

    pub fn len(&self) -> usize {
        self.standard.len() + self.special.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
