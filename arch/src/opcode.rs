use std::fmt;

use crate::error::TableError;

/// An opcode of one or two bytes (prefixed page opcodes take two).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    value: u16,
    size: u8,
}

impl Opcode {
    /// Single byte opcode, also used for form-constant bytes.
    pub fn byte(value: u8) -> Self {
        Opcode {
            value: value as u16,
            size: 1,
        }
    }

    /// Parse a table opcode string such as `"86"` or `"18 A6"`. Whitespace is ignored.
    pub fn parse(s: &str) -> Result<Self, TableError> {
        let hex: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let bad = || TableError::BadOpcode(s.to_string());
        if hex.is_empty() || hex.len() % 2 != 0 || hex.len() > 4 {
            return Err(bad());
        }
        let value = u16::from_str_radix(&hex, 16).map_err(|_| bad())?;
        let size = (hex.len() / 2) as u8;
        // A 2 byte opcode must not start with 00, its width would disagree with its magnitude
        if size == 2 && value <= 0xFF {
            return Err(bad());
        }
        Ok(Opcode { value, size })
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    /// Width in bytes.
    pub fn size(&self) -> usize {
        self.size as usize
    }

    pub fn bytes(&self) -> Vec<u8> {
        match self.size {
            1 => vec![self.value as u8],
            _ => self.value.to_be_bytes().to_vec(),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            1 => write!(f, "{:02X}", self.value),
            _ => write!(f, "{:04X}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! ok {
        ($($name:ident: $src:expr => ($value:expr, $size:expr),)*) => {
            $(
                #[test]
                fn $name() {
                    let op = Opcode::parse($src).unwrap();
                    assert_eq!(op.value(), $value);
                    assert_eq!(op.size(), $size);
                }
            )*
        }
    }

    ok! {
        parse_single: "86" => (0x86, 1),
        parse_zero: "00" => (0x00, 1),
        parse_page: "18A6" => (0x18A6, 2),
        parse_spaced: " 18 a6 " => (0x18A6, 2),
    }

    #[test]
    fn rejects_malformed() {
        for src in ["", "8", "123", "GG", "123456", "0012"] {
            assert!(Opcode::parse(src).is_err(), "{src:?} should be rejected");
        }
    }

    #[test]
    fn renders_bytes() {
        assert_eq!(Opcode::parse("18 A6").unwrap().bytes(), vec![0x18, 0xA6]);
        assert_eq!(Opcode::byte(0x7E).bytes(), vec![0x7E]);
        assert_eq!(Opcode::parse("cd ee").unwrap().to_string(), "CDEE");
    }
}
