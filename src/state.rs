use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::numeric::{round_f32, saturate_u32, saturate_u8};

/// Architectural registers of the GSX core.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Register {
    /// Program counter, unsigned 32-bit.
    Pc,
    /// Argument stack pointer, unsigned 8-bit.
    As,
    /// Jump stack pointer, unsigned 8-bit.
    Js,
    // General registers, single-precision floats.
    T,
    R,
    Y,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Pc => write!(f, "PC"),
            Register::As => write!(f, "AS"),
            Register::Js => write!(f, "JS"),
            Register::T => write!(f, "T"),
            Register::R => write!(f, "R"),
            Register::Y => write!(f, "Y"),
        }
    }
}

impl FromStr for Register {
    type Err = RegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PC" => Ok(Register::Pc),
            "AS" => Ok(Register::As),
            "JS" => Ok(Register::Js),
            "T" => Ok(Register::T),
            "R" => Ok(Register::R),
            "Y" => Ok(Register::Y),
            other => Err(RegisterError::UnknownRegister(other.into())),
        }
    }
}

/// Errors surfaced while parsing register names.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RegisterError {
    #[error("unknown register '{0}'")]
    UnknownRegister(String),
}

/// Mutable GSX register file. Every write is forced through the width gate of
/// the target register: `PC`, `AS`, `JS` saturate at their integer width,
/// `T`, `R`, `Y` round to single precision.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Registers {
    pc: u32,
    #[serde(rename = "as")]
    arg_sp: u8,
    #[serde(rename = "js")]
    jump_sp: u8,
    t: f32,
    r: f32,
    y: f32,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a register, widened to f64 (exact for every register width).
    pub fn get(&self, reg: Register) -> f64 {
        match reg {
            Register::Pc => self.pc as f64,
            Register::As => self.arg_sp as f64,
            Register::Js => self.jump_sp as f64,
            Register::T => self.t as f64,
            Register::R => self.r as f64,
            Register::Y => self.y as f64,
        }
    }

    /// Store `value` into `reg` through the register's width gate.
    pub fn set(&mut self, reg: Register, value: f64) {
        match reg {
            Register::Pc => self.pc = saturate_u32(value),
            Register::As => self.arg_sp = saturate_u8(value),
            Register::Js => self.jump_sp = saturate_u8(value),
            Register::T => self.t = round_f32(value),
            Register::R => self.r = round_f32(value),
            Register::Y => self.y = round_f32(value),
        }
    }

    /// Program counter as its native width, for fetch and bounds checks.
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Argument stack pointer as its native width, for indexing.
    pub fn arg_sp(&self) -> u8 {
        self.arg_sp
    }

    /// Jump stack pointer as its native width, for indexing.
    pub fn jump_sp(&self) -> u8 {
        self.jump_sp
    }

    /// Zero all six registers.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registers_are_zeroed() {
        let regs = Registers::new();
        assert_eq!(regs.pc(), 0);
        assert_eq!(regs.arg_sp(), 0);
        assert_eq!(regs.jump_sp(), 0);
        assert_eq!(regs.get(Register::T), 0.0);
    }

    #[test]
    fn pointer_registers_saturate() {
        let mut regs = Registers::new();
        regs.set(Register::As, 300.0);
        assert_eq!(regs.arg_sp(), 255);
        regs.set(Register::As, -1.0);
        assert_eq!(regs.arg_sp(), 0);
        regs.set(Register::Js, 12.7);
        assert_eq!(regs.jump_sp(), 12);
    }

    #[test]
    fn pc_saturates_at_32_bits() {
        let mut regs = Registers::new();
        regs.set(Register::Pc, -5.0);
        assert_eq!(regs.pc(), 0);
        regs.set(Register::Pc, 1e12);
        assert_eq!(regs.pc(), u32::MAX);
        regs.set(Register::Pc, 24.9);
        assert_eq!(regs.pc(), 24);
    }

    #[test]
    fn general_registers_round_to_single_precision() {
        let mut regs = Registers::new();
        regs.set(Register::T, 1.0 / 3.0);
        assert_eq!(regs.get(Register::T), (1.0_f64 / 3.0) as f32 as f64);
        regs.set(Register::R, f64::NAN);
        assert!(regs.get(Register::R).is_nan());
    }

    #[test]
    fn reset_zeroes_every_register() {
        let mut regs = Registers::new();
        regs.set(Register::Pc, 99.0);
        regs.set(Register::T, -2.5);
        regs.set(Register::Js, 7.0);
        regs.reset();
        assert_eq!(regs.pc(), 0);
        assert_eq!(regs.jump_sp(), 0);
        assert_eq!(regs.get(Register::T), 0.0);
    }

    #[test]
    fn register_name_parsing() {
        assert_eq!(Register::from_str("pc").unwrap(), Register::Pc);
        assert_eq!(Register::from_str("T").unwrap(), Register::T);
        assert_eq!(Register::from_str("js").unwrap(), Register::Js);
        assert!(matches!(
            Register::from_str("q"),
            Err(RegisterError::UnknownRegister(_))
        ));
    }

    #[test]
    fn display_matches_architectural_names() {
        assert_eq!(Register::Pc.to_string(), "PC");
        assert_eq!(Register::Y.to_string(), "Y");
    }
}
