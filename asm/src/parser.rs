use crate::error::ErrorKind;

// ----------------------------------------------------------------------------
// Statement

/// One classified source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Blank or comment-only line
    Blank,
    /// `LOOP` or `LOOP:` in column 0
    Label(String),
    /// `NAME EQU value`
    Equ(String, String),
    /// ` ORG addr`
    Org(String),
    /// ` END`
    End,
    /// ` FCB b0,b1,...`
    Fcb(Vec<String>),
    /// ` MNEMONIC operand...`
    Inst(String, Vec<String>),
}

impl Stmt {
    pub fn parse(raw: &str) -> Result<Stmt, ErrorKind> {
        let code = match raw.split_once('*') {
            Some((code, _comment)) => code,
            None => raw,
        };
        let words: Vec<&str> = code.split_whitespace().collect();

        let Some((head, args)) = words.split_first() else {
            return Ok(Stmt::Blank);
        };

        // Column 0: label or constant definition
        if !raw.starts_with(char::is_whitespace) {
            if let Some(equ) = args.first() {
                if equ.eq_ignore_ascii_case("EQU") {
                    return match args {
                        [_] => Err(ErrorKind::MissingOperands),
                        [_, value] => Ok(Stmt::Equ(head.to_string(), value.to_string())),
                        _ => Err(ErrorKind::UnnecessaryOperand),
                    };
                }
                return Err(ErrorKind::NonexistentMarginSpace);
            }
            let label = head.strip_suffix(':').unwrap_or(head);
            if label.is_empty() {
                return Err(ErrorKind::BadFormat);
            }
            return Ok(Stmt::Label(label.to_string()));
        }

        // Indented: directive or instruction
        match head.to_ascii_uppercase().as_str() {
            "ORG" => match args {
                [] => Err(ErrorKind::MissingOperands),
                [addr] => Ok(Stmt::Org(addr.to_string())),
                _ => Err(ErrorKind::UnnecessaryOperand),
            },
            "END" => match args {
                [] => Ok(Stmt::End),
                _ => Err(ErrorKind::UnnecessaryOperand),
            },
            "FCB" => match args {
                [] => Err(ErrorKind::MissingOperands),
                [bytes] => Ok(Stmt::Fcb(bytes.split(',').map(str::to_string).collect())),
                _ => Err(ErrorKind::UnnecessaryOperand),
            },
            _ => Ok(Stmt::Inst(
                head.to_string(),
                args.iter().map(|arg| arg.to_string()).collect(),
            )),
        }
    }
}
