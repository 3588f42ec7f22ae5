use std::collections::BTreeMap;

use color_print::cformat;
use serde::Serialize;

use crate::{
    line::{spaced_hex, CompiledLine},
    object::ObjectError,
    symbol::SymbolTable,
};

/// `i : AAAA (XX XX) : source`, one entry per source line, source trimmed.
pub fn plain<S: AsRef<str>>(
    lines: &[CompiledLine],
    source: &[S],
) -> Result<Vec<String>, ObjectError> {
    lines
        .iter()
        .zip(source)
        .enumerate()
        .map(|(idx, (line, src))| {
            let body = match line.address {
                Some(addr) if !line.is_empty() => {
                    format!("{:04X} ({})", addr, spaced_hex(&line.bytes()?))
                }
                _ => "<empty>".to_string(),
            };
            Ok(format!("{} : {} : {}", idx, body, src.as_ref().trim()))
        })
        .collect()
}

/// Same layout as [`plain`], opcode and each operand in its own colour.
pub fn colored<S: AsRef<str>>(
    lines: &[CompiledLine],
    source: &[S],
) -> Result<Vec<String>, ObjectError> {
    lines
        .iter()
        .zip(source)
        .enumerate()
        .map(|(idx, (line, src))| {
            let src = src.as_ref();
            let Some(addr) = line.address.filter(|_| !line.is_empty()) else {
                return Ok(cformat!("<dim>{:>4} :      {:14}</> : {}", idx, "", src));
            };
            let mut groups = line.byte_groups()?.into_iter();
            let mut spans = vec![];
            if let Some(opcode) = groups.next() {
                spans.push(cformat!("<r>{}</>", spaced_hex(&opcode)));
            }
            for (n, operand) in groups.enumerate() {
                let hex = spaced_hex(&operand);
                spans.push(match n % 3 {
                    0 => cformat!("<b>{}</>", hex),
                    1 => cformat!("<g>{}</>", hex),
                    _ => cformat!("<m>{}</>", hex),
                });
            }
            Ok(cformat!(
                "{:>4} : <y>{:04X}</> ({}) : {}",
                idx,
                addr,
                spans.join(" "),
                src
            ))
        })
        .collect()
}

pub fn symbols(symbols: &SymbolTable) -> Vec<String> {
    let labels = symbols
        .labels()
        .iter()
        .map(|(name, addr)| cformat!("<g>{:<16}</> ${:04X}", name, addr));
    let constants = symbols
        .constants()
        .iter()
        .map(|(name, value)| cformat!("<y>{:<16}</> ${:04X}", name, value));
    labels.chain(constants).collect()
}

#[derive(Debug, Serialize)]
struct SymbolMap<'a> {
    labels: BTreeMap<&'a str, u32>,
    constants: BTreeMap<&'a str, u32>,
}

/// Name -> value map of every label and constant, as YAML.
pub fn symbol_map(symbols: &SymbolTable) -> Result<String, serde_yaml::Error> {
    let map = SymbolMap {
        labels: symbols
            .labels()
            .iter()
            .map(|(name, addr)| (name.as_str(), *addr))
            .collect(),
        constants: symbols
            .constants()
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect(),
    };
    serde_yaml::to_string(&map)
}
