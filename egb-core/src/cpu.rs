pub(crate) mod instructions;
mod registers;

#[cfg(test)]
mod tests;

use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;
use crate::ppu::PpuState;

pub use registers::CpuRegisters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    GameBoy,
    GameBoyColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgbSpeedMode {
    Normal,
    Double,
}

impl CgbSpeedMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Normal => Self::Double,
            Self::Double => Self::Normal,
        }
    }
}

/// Interrupt sources in service priority order: a lower bit wins when several
/// are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    pub const ALL: [Self; 5] = [
        Self::VBlank,
        Self::LcdStatus,
        Self::Timer,
        Self::Serial,
        Self::Joypad,
    ];

    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 0,
            Self::LcdStatus => 1,
            Self::Timer => 2,
            Self::Serial => 3,
            Self::Joypad => 4,
        }
    }

    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }
}

fn pending_interrupts(address_space: &AddressSpace) -> u8 {
    let ie_value = address_space.get_ie_register();
    let if_value = address_space
        .get_io_registers()
        .read_register(IoRegister::IF);
    ie_value & if_value & 0x1F
}

/// Whether the CPU should jump into an interrupt handler before executing the
/// next instruction. The EI delay latch suppresses servicing for exactly one
/// instruction.
pub fn interrupt_triggered(cpu_registers: &CpuRegisters, address_space: &AddressSpace) -> bool {
    cpu_registers.ime && !cpu_registers.interrupt_delay && pending_interrupts(address_space) != 0
}

/// Whether any enabled interrupt is requested, regardless of IME. A pending
/// interrupt wakes the CPU from HALT even when IME is cleared.
pub fn interrupt_pending_ignoring_ime(address_space: &AddressSpace) -> bool {
    pending_interrupts(address_space) != 0
}

/// Service the highest-priority pending interrupt: acknowledge its IF bit,
/// clear IME, push PC, and jump to the interrupt vector.
///
/// Returns the number of cycles consumed (20, or 24 when the CPU was woken
/// from HALT).
pub fn execute_interrupt_service_routine(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace,
    ppu_state: &PpuState,
) -> u32 {
    let pending = pending_interrupts(address_space);
    let interrupt_type = InterruptType::ALL
        .into_iter()
        .find(|interrupt_type| pending & (1 << interrupt_type.bit()) != 0)
        .expect("ISR should only be called when an interrupt is pending");

    log::trace!(
        "servicing {interrupt_type:?} interrupt, handler address {:04X}",
        interrupt_type.handler_address()
    );

    address_space
        .get_io_registers_mut()
        .interrupt_flags()
        .clear(interrupt_type);
    cpu_registers.ime = false;

    cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
    address_space.write_address_u16(cpu_registers.sp, cpu_registers.pc, ppu_state);
    cpu_registers.pc = interrupt_type.handler_address();

    if cpu_registers.halted {
        cpu_registers.halted = false;
        24
    } else {
        20
    }
}
