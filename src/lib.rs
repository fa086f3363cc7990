//! Assembler and interpreter core for the GSX virtual machine, an 8-bit
//! opcode architecture in the style of an early-1990s home computer.
//!
//! The crate exposes two operations: [`translate`] turns an assembly listing
//! into bytecode plus a list of syntax errors, and [`run`] executes bytecode
//! against a [`Machine`] until termination. Everything else — the register
//! file, RAM image, opcode table — is observable state around those two
//! calls.

pub mod assembler;
pub mod constants;
pub mod executor;
pub mod machine;
pub mod memory;
pub mod numeric;
pub mod opcodes;
pub mod state;

use thiserror::Error;

pub use assembler::{translate, SyntaxError, Translation};
pub use executor::run;
pub use machine::Machine;
pub use memory::Ram;
pub use opcodes::{Op, OpcodeTable};
pub use state::{Register, RegisterError, Registers};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Fatal conditions raised by the interpreter. Syntax problems never appear
/// here; they are reported per line by [`translate`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("program of {size} bytes is too large; the limit is {limit} bytes")]
    ProgramTooLarge { size: usize, limit: usize },
}
