//! Architectural constants of the GSX machine.

/// Number of bytes in the RAM block.
pub const RAM_SIZE: usize = 3 * 1024 * 1024;

/// Largest accepted bytecode stream; programs must be strictly smaller.
pub const MAX_PROGRAM_SIZE: usize = 3 * 1024 * 1024;

/// Depth of the argument stack and the jump stack.
pub const STACK_DEPTH: usize = 256;

/// Number of slots in the opcode dispatch table (one per opcode byte).
pub const OPCODE_COUNT: usize = 256;

/// Program counter value that marks a terminated program. Larger than any
/// legal program address, so the fetch loop never resumes past it.
pub const HALT_PC: u32 = u32::MAX;
