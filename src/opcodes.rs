//! The GSX opcode table and mnemonic dictionary.
//!
//! Both structures are built in a single pass by [`build_table`]. The
//! definition order is load-bearing: each definition claims the next free
//! opcode byte, so reordering any step renames every opcode after it. The
//! enumeration order of the general registers (t, r, y) and of
//! [`other_two`] is part of the instruction encoding for the same reason.
//!
//! Opcodes 0-5 are the six inline-immediate loads (byte then float, each in
//! t, r, y order). They have no dictionary key; the assembler reaches them
//! through the constant-load pattern. Every other defined opcode is a single
//! byte and is reachable through at least one normalized mnemonic.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::constants::OPCODE_COUNT;
use crate::state::Register;

/// One decoded GSX instruction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Op {
    /// Load the signed byte following the opcode into a general register.
    LoadByte(Register),
    /// Load the big-endian float following the opcode into a general register.
    LoadFloat(Register),
    /// Return through the jump stack, or terminate when it is empty.
    Exit,
    /// Call: push the return address and jump to the register's value.
    Run(Register),
    /// Push a general register onto the argument stack.
    Push(Register),
    /// Pop the argument stack into a general register.
    Pop(Register),
    /// `dst <- ram[addr]`, one signed byte.
    ReadByte { dst: Register, addr: Register },
    /// `dst <- ram[addr]`, big-endian float.
    ReadFloat { dst: Register, addr: Register },
    /// `ram[addr] <- src`, one byte.
    WriteByte { addr: Register, src: Register },
    /// `ram[addr] <- src`, big-endian float.
    WriteFloat { addr: Register, src: Register },
    Add { dst: Register, lhs: Register, rhs: Register },
    Mul { dst: Register, lhs: Register, rhs: Register },
    Sub { dst: Register, lhs: Register, rhs: Register },
    Div { dst: Register, lhs: Register, rhs: Register },
    /// Table filler for opcode bytes no definition claimed. Never emitted by
    /// the assembler; executes as a no-op.
    Unused,
}

/// General registers with their mnemonic letters, in enumeration order.
const GENERAL: [(Register, char); 3] = [
    (Register::T, 't'),
    (Register::R, 'r'),
    (Register::Y, 'y'),
];

/// The two general registers other than `GENERAL[index]`, keeping the
/// (t, r, y) enumeration order among themselves.
fn other_two(index: usize) -> [(Register, char); 2] {
    match index {
        0 => [GENERAL[1], GENERAL[2]],
        1 => [GENERAL[0], GENERAL[2]],
        _ => [GENERAL[0], GENERAL[1]],
    }
}

/// Dispatch table plus mnemonic dictionary, immutable after construction.
pub struct OpcodeTable {
    ops: [Op; OPCODE_COUNT],
    mnemonics: HashMap<String, u8>,
    populated: usize,
}

static TABLE: Lazy<OpcodeTable> = Lazy::new(build_table);

impl OpcodeTable {
    /// The process-wide table, built on first use.
    pub fn get() -> &'static OpcodeTable {
        &TABLE
    }

    /// The instruction dispatched for an opcode byte.
    pub fn op(&self, opcode: u8) -> Op {
        self.ops[opcode as usize]
    }

    /// Opcode for a normalized mnemonic, if it is keyable.
    pub fn lookup(&self, mnemonic: &str) -> Option<u8> {
        self.mnemonics.get(mnemonic).copied()
    }

    /// All normalized mnemonics with their opcodes.
    pub fn mnemonics(&self) -> impl Iterator<Item = (&str, u8)> + '_ {
        self.mnemonics.iter().map(|(key, code)| (key.as_str(), *code))
    }

    pub fn mnemonic_count(&self) -> usize {
        self.mnemonics.len()
    }

    /// Number of table slots claimed by a definition step.
    pub fn populated_count(&self) -> usize {
        self.populated
    }
}

struct Builder {
    ops: Vec<Op>,
    mnemonics: HashMap<String, u8>,
}

impl Builder {
    fn new() -> Self {
        Self {
            ops: Vec::with_capacity(OPCODE_COUNT),
            mnemonics: HashMap::new(),
        }
    }

    /// Claim the next opcode byte without a dictionary key.
    fn reserve(&mut self, op: Op) -> u8 {
        debug_assert!(self.ops.len() < OPCODE_COUNT);
        let opcode = self.ops.len() as u8;
        self.ops.push(op);
        opcode
    }

    /// Claim the next opcode byte and key it under every given mnemonic.
    fn define(&mut self, op: Op, keys: &[String]) {
        let opcode = self.reserve(op);
        for key in keys {
            let previous = self.mnemonics.insert(key.clone(), opcode);
            debug_assert!(previous.is_none(), "mnemonic defined twice: {key}");
        }
    }

    fn finish(self) -> OpcodeTable {
        let populated = self.ops.len();
        let mut ops = [Op::Unused; OPCODE_COUNT];
        for (slot, op) in ops.iter_mut().zip(self.ops) {
            *slot = op;
        }
        OpcodeTable {
            ops,
            mnemonics: self.mnemonics,
            populated,
        }
    }
}

fn build_table() -> OpcodeTable {
    let mut b = Builder::new();

    // Opcodes 0-5: inline-immediate constant loads, byte forms before float
    // forms. Zero-assignments ride the byte forms; there is no separate
    // "clear register" opcode.
    for (reg, _) in GENERAL {
        b.reserve(Op::LoadByte(reg));
    }
    for (reg, _) in GENERAL {
        b.reserve(Op::LoadFloat(reg));
    }

    b.define(Op::Exit, &["exit".to_string()]);

    for (reg, l) in GENERAL {
        b.define(Op::Run(reg), &[format!("run{l}")]);
    }
    for (reg, l) in GENERAL {
        b.define(Op::Push(reg), &[format!("push{l}")]);
    }
    for (reg, l) in GENERAL {
        b.define(Op::Pop(reg), &[format!("new{l}=pop")]);
    }

    // RAM reads cover every (destination, address) pair, including reading
    // through the destination register itself.
    for (dst, dl) in GENERAL {
        for (addr, al) in GENERAL {
            b.define(Op::ReadByte { dst, addr }, &[format!("new{dl}=ram[{al}]byte")]);
        }
    }
    for (dst, dl) in GENERAL {
        for (addr, al) in GENERAL {
            b.define(Op::ReadFloat { dst, addr }, &[format!("new{dl}=ram[{al}]float")]);
        }
    }

    // RAM writes need the address and the value in different registers.
    for (index, (addr, al)) in GENERAL.into_iter().enumerate() {
        for (src, sl) in other_two(index) {
            b.define(Op::WriteByte { addr, src }, &[format!("newram[{al}]byte={sl}")]);
        }
    }
    for (index, (addr, al)) in GENERAL.into_iter().enumerate() {
        for (src, sl) in other_two(index) {
            b.define(Op::WriteFloat { addr, src }, &[format!("newram[{al}]float={sl}")]);
        }
    }

    // Addition: both operand orders share one opcode per target.
    for (index, (dst, dl)) in GENERAL.into_iter().enumerate() {
        let [(lhs, ll), (rhs, rl)] = other_two(index);
        b.define(
            Op::Add { dst, lhs, rhs },
            &[format!("new{dl}={ll}+{rl}"), format!("new{dl}={rl}+{ll}")],
        );
    }
    // Doubling a register in place, spelled three ways.
    for (reg, l) in GENERAL {
        b.define(
            Op::Add { dst: reg, lhs: reg, rhs: reg },
            &[
                format!("new{l}={l}+{l}"),
                format!("new{l}=2*{l}"),
                format!("new{l}={l}*2"),
            ],
        );
    }
    for (index, (dst, dl)) in GENERAL.into_iter().enumerate() {
        for (other, ol) in other_two(index) {
            b.define(
                Op::Add { dst, lhs: dst, rhs: other },
                &[format!("new{dl}={dl}+{ol}"), format!("new{dl}={ol}+{dl}")],
            );
        }
    }

    // Multiplication mirrors the addition families.
    for (index, (dst, dl)) in GENERAL.into_iter().enumerate() {
        let [(lhs, ll), (rhs, rl)] = other_two(index);
        b.define(
            Op::Mul { dst, lhs, rhs },
            &[format!("new{dl}={ll}*{rl}"), format!("new{dl}={rl}*{ll}")],
        );
    }
    for (reg, l) in GENERAL {
        b.define(
            Op::Mul { dst: reg, lhs: reg, rhs: reg },
            &[format!("new{l}={l}*{l}"), format!("new{l}={l}^2")],
        );
    }
    for (index, (dst, dl)) in GENERAL.into_iter().enumerate() {
        for (other, ol) in other_two(index) {
            b.define(
                Op::Mul { dst, lhs: dst, rhs: other },
                &[format!("new{dl}={dl}*{ol}"), format!("new{dl}={ol}*{dl}")],
            );
        }
    }

    // Subtraction is not commutative; every operand order is its own opcode.
    for (index, (dst, dl)) in GENERAL.into_iter().enumerate() {
        let [(a, al), (c, cl)] = other_two(index);
        b.define(Op::Sub { dst, lhs: a, rhs: c }, &[format!("new{dl}={al}-{cl}")]);
        b.define(Op::Sub { dst, lhs: c, rhs: a }, &[format!("new{dl}={cl}-{al}")]);
    }
    for (index, (dst, dl)) in GENERAL.into_iter().enumerate() {
        let [(a, al), (c, cl)] = other_two(index);
        b.define(Op::Sub { dst, lhs: dst, rhs: a }, &[format!("new{dl}={dl}-{al}")]);
        b.define(Op::Sub { dst, lhs: dst, rhs: c }, &[format!("new{dl}={dl}-{cl}")]);
        b.define(Op::Sub { dst, lhs: a, rhs: dst }, &[format!("new{dl}={al}-{dl}")]);
        b.define(Op::Sub { dst, lhs: c, rhs: dst }, &[format!("new{dl}={cl}-{dl}")]);
    }

    // Division mirrors the subtraction families.
    for (index, (dst, dl)) in GENERAL.into_iter().enumerate() {
        let [(a, al), (c, cl)] = other_two(index);
        b.define(Op::Div { dst, lhs: a, rhs: c }, &[format!("new{dl}={al}/{cl}")]);
        b.define(Op::Div { dst, lhs: c, rhs: a }, &[format!("new{dl}={cl}/{al}")]);
    }
    for (index, (dst, dl)) in GENERAL.into_iter().enumerate() {
        let [(a, al), (c, cl)] = other_two(index);
        b.define(Op::Div { dst, lhs: dst, rhs: a }, &[format!("new{dl}={dl}/{al}")]);
        b.define(Op::Div { dst, lhs: dst, rhs: c }, &[format!("new{dl}={dl}/{cl}")]);
        b.define(Op::Div { dst, lhs: a, rhs: dst }, &[format!("new{dl}={al}/{dl}")]);
        b.define(Op::Div { dst, lhs: c, rhs: dst }, &[format!("new{dl}={cl}/{dl}")]);
    }

    b.finish()
}
