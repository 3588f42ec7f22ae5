use indexmap::IndexMap;

use crate::error::ErrorKind;

/// Labels and `EQU` constants collected during pass 1.
///
/// The two namespaces are independent and case-sensitive. Operands that accept
/// values resolve through `constants` in pass 1; label references are deferred to
/// pass 2, so a constant shadows a label of the same name.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    labels: IndexMap<String, u32>,
    constants: IndexMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_label(&mut self, name: &str, addr: u32) -> Result<(), ErrorKind> {
        if self.labels.contains_key(name) {
            return Err(ErrorKind::ExistingLabel);
        }
        self.labels.insert(name.to_string(), addr);
        Ok(())
    }

    pub fn define_constant(&mut self, name: &str, value: u32) -> Result<(), ErrorKind> {
        if self.constants.contains_key(name) {
            return Err(ErrorKind::ExistingConstant);
        }
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    pub fn label(&self, name: &str) -> Option<u32> {
        self.labels.get(name).copied()
    }

    pub fn constant(&self, name: &str) -> Option<u32> {
        self.constants.get(name).copied()
    }

    pub fn labels(&self) -> &IndexMap<String, u32> {
        &self.labels
    }

    pub fn constants(&self) -> &IndexMap<String, u32> {
        &self.constants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_once() {
        let mut symbols = SymbolTable::new();
        symbols.define_label("LOOP", 0x8000).unwrap();
        assert_eq!(symbols.define_label("LOOP", 0x8002), Err(ErrorKind::ExistingLabel));
        assert_eq!(symbols.label("LOOP"), Some(0x8000));

        symbols.define_constant("PORTA", 0x1000).unwrap();
        assert_eq!(
            symbols.define_constant("PORTA", 0),
            Err(ErrorKind::ExistingConstant)
        );
    }

    #[test]
    fn namespaces_are_separate_and_case_sensitive() {
        let mut symbols = SymbolTable::new();
        symbols.define_label("X1", 0x10).unwrap();
        symbols.define_constant("X1", 0x20).unwrap();
        assert_eq!(symbols.label("X1"), Some(0x10));
        assert_eq!(symbols.constant("X1"), Some(0x20));
        assert_eq!(symbols.label("x1"), None);
    }
}
