use crate::constants::STACK_DEPTH;
use crate::memory::Ram;
use crate::state::Registers;

/// One complete GSX machine instance: register file, RAM, and the two
/// fixed-depth stacks.
///
/// The stack buffers are addressed by the `AS` and `JS` pointer registers and
/// carry no occupancy bookkeeping of their own. All buffers are allocated
/// once at construction and never resized.
pub struct Machine {
    pub registers: Registers,
    pub ram: Ram,
    pub arg_stack: [f32; STACK_DEPTH],
    pub jump_stack: [u32; STACK_DEPTH],
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Self {
            registers: Registers::new(),
            ram: Ram::new(),
            arg_stack: [0.0; STACK_DEPTH],
            jump_stack: [0; STACK_DEPTH],
        }
    }

    /// Zero the registers and the RAM. The stack buffers keep their contents;
    /// only the pointers addressing them are reset.
    pub fn reset(&mut self) {
        self.registers.reset();
        self.ram.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Register;

    #[test]
    fn reset_zeroes_registers_and_ram_but_not_the_stack_buffers() {
        let mut machine = Machine::new();
        machine.registers.set(Register::T, 4.5);
        machine.registers.set(Register::As, 3.0);
        machine.registers.set(Register::Js, 2.0);
        machine.ram.set_i8(0, 17);
        machine.ram.set_f32(512, -1.25);
        machine.arg_stack[0] = 9.0;
        machine.jump_stack[1] = 24;

        machine.reset();

        assert_eq!(machine.registers.get(Register::T), 0.0);
        assert_eq!(machine.registers.arg_sp(), 0);
        assert_eq!(machine.registers.jump_sp(), 0);
        assert_eq!(machine.ram.get_i8(0), 0);
        assert_eq!(machine.ram.get_f32(512), 0.0);
        // Stale stack contents stay; the pointers no longer address them.
        assert_eq!(machine.arg_stack[0], 9.0);
        assert_eq!(machine.jump_stack[1], 24);
    }
}
