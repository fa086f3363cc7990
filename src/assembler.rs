//! Translator from GSX assembly text to bytecode.
//!
//! Each line is normalized (comment stripped, all whitespace removed,
//! lowercased) and matched against the mnemonic dictionary. Lines the
//! dictionary does not know get one more chance as a constant load,
//! `new ⟨t|r|y⟩ = ⟨signed decimal⟩`. Anything else is a syntax error; the
//! translator keeps walking so every bad line is reported, but a listing
//! with any error yields no bytecode.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::numeric::{f32_to_be_bytes, round_f32};
use crate::opcodes::OpcodeTable;

/// Integer constants in this range travel as a single signed byte; anything
/// else (or any literal spelled with a dot) travels as a four-byte float.
const BYTE_CONSTANT_RANGE: std::ops::RangeInclusive<i64> = -128..=127;

/// `new⟨reg⟩=⟨literal⟩` after normalization: an optionally signed integer, or
/// a decimal with at least one digit on each side of a single dot.
static CONSTANT_LOAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^new([try])=(-?\d+(?:\.\d+)?)$").expect("constant-load pattern"));

/// A line the translator could not map to any instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based source line.
    pub line: usize,
    /// The offending line as written.
    pub text: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown instruction ({}) on line {}.",
            self.text,
            group_thousands(self.line)
        )
    }
}

impl std::error::Error for SyntaxError {}

/// Result of translating a source listing.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    /// Packed bytecode; empty whenever `errors` is non-empty.
    pub bytecode: Vec<u8>,
    /// One entry per untranslatable line, in source order.
    pub errors: Vec<SyntaxError>,
}

/// Translate a whole listing. Never fails; syntax problems are collected in
/// the returned [`Translation`].
pub fn translate(source: &str) -> Translation {
    let table = OpcodeTable::get();
    let mut bytecode = Vec::new();
    let mut errors = Vec::new();

    for (index, raw) in source.split('\n').enumerate() {
        let key = normalize(raw);
        if key.is_empty() {
            continue;
        }
        if let Some(opcode) = table.lookup(&key) {
            bytecode.push(opcode);
            continue;
        }
        if emit_constant_load(&key, &mut bytecode) {
            continue;
        }
        errors.push(SyntaxError {
            line: index + 1,
            text: raw.to_string(),
        });
    }

    if !errors.is_empty() {
        bytecode.clear();
    }
    Translation { bytecode, errors }
}

/// Drop everything from `#` onward, then all whitespace, then case.
fn normalize(line: &str) -> String {
    let code = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    code.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Try `key` as a constant load and append its encoding on success.
fn emit_constant_load(key: &str, bytecode: &mut Vec<u8>) -> bool {
    let Some(captures) = CONSTANT_LOAD.captures(key) else {
        return false;
    };
    // Byte forms sit at opcodes 0-2, float forms at 3-5, both in t, r, y
    // order, so the register index doubles as the opcode offset.
    let reg_index: u8 = match &captures[1] {
        "t" => 0,
        "r" => 1,
        _ => 2,
    };
    let literal = &captures[2];

    // A dot in the literal forces the float form even when the value would
    // fit in a byte: `127` and `127.0` encode differently on purpose.
    if !literal.contains('.') {
        if let Ok(value) = literal.parse::<i64>() {
            if BYTE_CONSTANT_RANGE.contains(&value) {
                bytecode.push(reg_index);
                bytecode.push(value as i8 as u8);
                return true;
            }
        }
    }

    match literal.parse::<f64>() {
        Ok(value) => {
            bytecode.push(reg_index + 3);
            bytecode.extend_from_slice(&f32_to_be_bytes(round_f32(value)));
            true
        }
        Err(_) => false,
    }
}

fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
