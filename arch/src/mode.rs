use serde::Deserialize;
use strum::Display;

/// Addressing mode tag, spelled the way instruction tables spell it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Deserialize,
    Display,
)]
pub enum Mode {
    /// No operand
    #[serde(rename = "INH")]
    #[strum(serialize = "INH")]
    Inherent,
    /// `#value`
    #[serde(rename = "IMM")]
    #[strum(serialize = "IMM")]
    Immediate,
    /// 1-byte address
    #[serde(rename = "DIR")]
    #[strum(serialize = "DIR")]
    Direct,
    /// 2-byte address
    #[serde(rename = "EXT")]
    #[strum(serialize = "EXT")]
    Extended,
    /// Signed 1-byte displacement
    #[serde(rename = "REL")]
    #[strum(serialize = "REL")]
    Relative,
    /// `offset,X`
    #[serde(rename = "IND,X")]
    #[strum(serialize = "IND,X")]
    IndexedX,
    /// `offset,Y`
    #[serde(rename = "IND,Y")]
    #[strum(serialize = "IND,Y")]
    IndexedY,
}

impl Mode {
    /// Index register selected by an `,X` / `,Y` operand suffix.
    pub fn indexed(register: char) -> Option<Self> {
        match register.to_ascii_uppercase() {
            'X' => Some(Mode::IndexedX),
            'Y' => Some(Mode::IndexedY),
            _ => None,
        }
    }

    /// Label operands of this mode hold an absolute address rather than a displacement.
    pub fn is_absolute(&self) -> bool {
        matches!(self, Mode::Extended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! tag {
        ($($name:ident: $tag:expr => $mode:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let json = format!("{:?}", $tag);
                    assert_eq!(serde_json::from_str::<Mode>(&json).unwrap(), $mode);
                    assert_eq!($mode.to_string(), $tag);
                }
            )*
        }
    }

    tag! {
        inherent: "INH" => Mode::Inherent,
        immediate: "IMM" => Mode::Immediate,
        direct: "DIR" => Mode::Direct,
        extended: "EXT" => Mode::Extended,
        relative: "REL" => Mode::Relative,
        indexed_x: "IND,X" => Mode::IndexedX,
        indexed_y: "IND,Y" => Mode::IndexedY,
    }

    #[test]
    fn unknown_tag() {
        assert!(serde_json::from_str::<Mode>("\"IND,Z\"").is_err());
    }

    #[test]
    fn indexed_register() {
        assert_eq!(Mode::indexed('X'), Some(Mode::IndexedX));
        assert_eq!(Mode::indexed('y'), Some(Mode::IndexedY));
        assert_eq!(Mode::indexed('Z'), None);
    }

    #[test]
    fn only_extended_is_absolute() {
        assert!(Mode::Extended.is_absolute());
        assert!(!Mode::Direct.is_absolute());
        assert!(!Mode::Relative.is_absolute());
    }
}
