//! Fetch/decode/dispatch loop over a machine instance.
//!
//! The loop fetches one opcode byte at `PC`, advances `PC` past it, and
//! dispatches; only the six constant loads consume further bytes. Bytecode
//! is trusted to be well formed (the translator only emits complete
//! instructions), so immediates are read without bounds recovery.

use std::env;

use crate::constants::{HALT_PC, MAX_PROGRAM_SIZE};
use crate::machine::Machine;
use crate::numeric::{f32_from_be_bytes, round_f32, saturate_u32, wrap_i8};
use crate::opcodes::{Op, OpcodeTable};
use crate::state::Register;
use crate::{CoreError, Result};

/// Execute `bytecode` against `machine` until the program counter runs past
/// the end of the stream. A top-level `exit` parks the program counter at
/// [`HALT_PC`]; a program that walks off the end keeps whatever counter
/// value took it there.
pub fn run(bytecode: &[u8], machine: &mut Machine) -> Result<()> {
    if bytecode.len() >= MAX_PROGRAM_SIZE {
        return Err(CoreError::ProgramTooLarge {
            size: bytecode.len(),
            limit: MAX_PROGRAM_SIZE,
        });
    }

    let table = OpcodeTable::get();
    let trace = trace_enabled();
    loop {
        let pc = machine.registers.pc();
        if pc as usize >= bytecode.len() {
            break;
        }
        let opcode = bytecode[pc as usize];
        machine.registers.set(Register::Pc, pc as f64 + 1.0);
        if trace {
            eprintln!("[gsx-trace] pc={pc:#010X} opcode={opcode:#04X}");
        }
        step(table.op(opcode), machine, bytecode);
    }
    Ok(())
}

fn trace_enabled() -> bool {
    matches!(env::var("GSX_TRACE").as_deref(), Ok("1") | Ok("true"))
}

/// Apply one instruction. `PC` has already been advanced past the opcode
/// byte, so inline immediates start exactly at `PC`.
fn step(op: Op, m: &mut Machine, bytecode: &[u8]) {
    match op {
        Op::LoadByte(reg) => {
            let pc = m.registers.pc();
            let value = bytecode[pc as usize] as i8;
            m.registers.set(reg, value as f64);
            m.registers.set(Register::Pc, pc as f64 + 1.0);
        }
        Op::LoadFloat(reg) => {
            let pc = m.registers.pc();
            let base = pc as usize;
            let value = f32_from_be_bytes([
                bytecode[base],
                bytecode[base + 1],
                bytecode[base + 2],
                bytecode[base + 3],
            ]);
            m.registers.set(reg, value as f64);
            m.registers.set(Register::Pc, pc as f64 + 4.0);
        }
        Op::Exit => {
            let js = m.registers.jump_sp();
            if js == 0 {
                m.registers.set(Register::Pc, HALT_PC as f64);
            } else {
                m.registers.set(Register::Js, js as f64 - 1.0);
                let target = m.jump_stack[(js - 1) as usize];
                m.registers.set(Register::Pc, target as f64);
            }
        }
        Op::Run(reg) => {
            // Return convention: one past the byte after the call opcode.
            let js = m.registers.jump_sp();
            m.jump_stack[js as usize] = m.registers.pc().saturating_add(1);
            m.registers.set(Register::Js, js as f64 + 1.0);
            m.registers.set(Register::Pc, m.registers.get(reg));
        }
        Op::Push(reg) => {
            let sp = m.registers.arg_sp();
            m.arg_stack[sp as usize] = round_f32(m.registers.get(reg));
            m.registers.set(Register::As, sp as f64 + 1.0);
        }
        Op::Pop(reg) => {
            m.registers.set(Register::As, m.registers.arg_sp() as f64 - 1.0);
            let sp = m.registers.arg_sp();
            m.registers.set(reg, m.arg_stack[sp as usize] as f64);
        }
        Op::ReadByte { dst, addr } => {
            let at = saturate_u32(m.registers.get(addr));
            m.registers.set(dst, m.ram.get_i8(at) as f64);
        }
        Op::ReadFloat { dst, addr } => {
            let at = saturate_u32(m.registers.get(addr));
            m.registers.set(dst, m.ram.get_f32(at) as f64);
        }
        Op::WriteByte { addr, src } => {
            let at = saturate_u32(m.registers.get(addr));
            m.ram.set_i8(at, wrap_i8(m.registers.get(src)));
        }
        Op::WriteFloat { addr, src } => {
            let at = saturate_u32(m.registers.get(addr));
            m.ram.set_f32(at, round_f32(m.registers.get(src)));
        }
        // Arithmetic runs in double precision; the register write narrows
        // the result back to single precision. Division by zero follows
        // IEEE-754.
        Op::Add { dst, lhs, rhs } => {
            let value = m.registers.get(lhs) + m.registers.get(rhs);
            m.registers.set(dst, value);
        }
        Op::Mul { dst, lhs, rhs } => {
            let value = m.registers.get(lhs) * m.registers.get(rhs);
            m.registers.set(dst, value);
        }
        Op::Sub { dst, lhs, rhs } => {
            let value = m.registers.get(lhs) - m.registers.get(rhs);
            m.registers.set(dst, value);
        }
        Op::Div { dst, lhs, rhs } => {
            let value = m.registers.get(lhs) / m.registers.get(rhs);
            m.registers.set(dst, value);
        }
        Op::Unused => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::translate;

    fn assemble(source: &str) -> Vec<u8> {
        let translation = translate(source);
        assert!(translation.errors.is_empty(), "{:?}", translation.errors);
        translation.bytecode
    }

    #[test]
    fn call_returns_one_past_the_byte_after_the_call() {
        // Layout: [0]=load T, [1]=5, [2]=run t, [3]=exit, [4]=exit,
        //         [5]=load R, [6]=8, [7]=exit.
        // `run t` at byte 2 stores 4 (not 3) as the return address, so the
        // returning exit lands on the exit at byte 4, skipping byte 3.
        let program = assemble("new t = 5\nrun t\nexit\nexit\nnew r = 8\nexit");
        let mut m = Machine::new();
        run(&program, &mut m).unwrap();
        assert_eq!(m.registers.get(Register::R), 8.0);
        assert_eq!(m.registers.jump_sp(), 0);
        assert_eq!(m.registers.pc(), HALT_PC);
        assert_eq!(m.jump_stack[0], 4);
    }

    #[test]
    fn push_and_pop_move_values_through_the_argument_stack() {
        let program = assemble("new t = 7\npush t\nnew t = 0\nnew y = pop");
        let mut m = Machine::new();
        run(&program, &mut m).unwrap();
        assert_eq!(m.registers.get(Register::Y), 7.0);
        assert_eq!(m.registers.get(Register::T), 0.0);
        assert_eq!(m.registers.arg_sp(), 0);
    }

    #[test]
    fn pop_on_an_empty_stack_pins_the_pointer_at_zero() {
        let program = assemble("new t = pop");
        let mut m = Machine::new();
        m.arg_stack[0] = 3.5;
        run(&program, &mut m).unwrap();
        assert_eq!(m.registers.arg_sp(), 0);
        assert_eq!(m.registers.get(Register::T), 3.5);
    }

    #[test]
    fn division_by_zero_follows_ieee_754() {
        let program = assemble("new t = r / y");
        let mut m = Machine::new();
        m.registers.set(Register::R, 4.0);
        run(&program, &mut m).unwrap();
        assert_eq!(m.registers.get(Register::T), f64::INFINITY);

        let mut m = Machine::new();
        run(&assemble("new t = r / y"), &mut m).unwrap();
        assert!(m.registers.get(Register::T).is_nan());
    }

    #[test]
    fn byte_writes_truncate_and_wrap() {
        let program = assemble("new t = 0\nnew r = 300.5\nnew ram[t] byte = r");
        let mut m = Machine::new();
        run(&program, &mut m).unwrap();
        assert_eq!(m.ram.get_i8(0), 300i64 as i8);
    }

    #[test]
    fn rejects_a_program_at_the_size_limit() {
        let mut m = Machine::new();
        let oversized = vec![6u8; MAX_PROGRAM_SIZE];
        match run(&oversized, &mut m) {
            Err(CoreError::ProgramTooLarge { size, limit }) => {
                assert_eq!(size, MAX_PROGRAM_SIZE);
                assert_eq!(limit, 3 * 1024 * 1024);
            }
            other => panic!("expected ProgramTooLarge, got {other:?}"),
        }
        // One byte under the limit executes normally.
        let full = vec![6u8; MAX_PROGRAM_SIZE - 1];
        run(&full, &mut m).unwrap();
        assert_eq!(m.registers.pc(), HALT_PC);
    }
}
