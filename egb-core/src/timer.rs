use crate::cpu::InterruptType;
use crate::memory::ioregisters::{IoRegister, IoRegisters};

// The largest cycle count a single tick may be asked to cover; keeps the
// TIMA increment count within a byte
const MAX_CYCLES_PER_TICK: u32 = 256;

/// The DIV/TIMA timer unit.
///
/// DIV is bits 15..8 of a free-running 16-bit counter advancing at the CPU
/// clock rate; writing DIV zeroes the whole counter. When TAC bit 2 is set,
/// TIMA increments at the rate selected by TAC bits 1:0 and reloads from TMA
/// on overflow, requesting the Timer interrupt.
pub struct SystemTimer {
    counter: u64,
}

impl SystemTimer {
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    /// Advance the timer by the given number of T-cycles.
    pub fn tick(&mut self, io_registers: &mut IoRegisters, cycles: u32) {
        if cycles > MAX_CYCLES_PER_TICK {
            panic!("cycles must be <= {MAX_CYCLES_PER_TICK}, was {cycles}");
        }

        if io_registers.take_div_reset() {
            self.counter = 0;
        }

        let old_counter = self.counter;
        let new_counter = old_counter + u64::from(cycles);
        self.counter = new_counter;

        io_registers.privileged_set_div((new_counter >> 8) as u8);

        let timer_control = io_registers.read_register(IoRegister::TAC);
        if timer_control & 0x04 == 0 {
            return;
        }

        // TAC rate select: {4096, 262144, 65536, 16384} Hz
        let tima_frequency_bits = match timer_control & 0x03 {
            0x00 => 10,
            0x01 => 4,
            0x02 => 6,
            0x03 => 8,
            _ => unreachable!("{timer_control} & 0x03 was not 0x00/0x01/0x02/0x03"),
        };

        let tima_increments =
            (new_counter >> tima_frequency_bits) - (old_counter >> tima_frequency_bits);

        // Usually 0 or 1 iterations
        for _ in 0..tima_increments {
            let old_tima = io_registers.read_register(IoRegister::TIMA);
            match old_tima.overflowing_add(1) {
                (new_tima, false) => {
                    io_registers.write_register(IoRegister::TIMA, new_tima);
                }
                (_, true) => {
                    let timer_modulo = io_registers.read_register(IoRegister::TMA);
                    io_registers.write_register(IoRegister::TIMA, timer_modulo);
                    io_registers.interrupt_flags().set(InterruptType::Timer);
                }
            }
        }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::ExecutionMode;

    #[test]
    fn divider_register() {
        let mut io_registers = IoRegisters::new(ExecutionMode::GameBoy);
        let mut timer = SystemTimer::new();

        // DIV advances regardless of the TAC enable bit
        io_registers.write_register(IoRegister::TAC, 0x00);

        timer.tick(&mut io_registers, 255);
        assert_eq!(0x00, io_registers.read_register(IoRegister::DIV));

        timer.tick(&mut io_registers, 1);
        assert_eq!(0x01, io_registers.read_register(IoRegister::DIV));

        for _ in 0..255 {
            timer.tick(&mut io_registers, 256);
        }
        assert_eq!(0x00, io_registers.read_register(IoRegister::DIV));
    }

    #[test]
    fn div_write_zeroes_counter() {
        let mut io_registers = IoRegisters::new(ExecutionMode::GameBoy);
        let mut timer = SystemTimer::new();

        timer.tick(&mut io_registers, 256);
        timer.tick(&mut io_registers, 255);
        assert_eq!(0x01, io_registers.read_register(IoRegister::DIV));

        // The full 16-bit counter resets, not just the visible byte
        io_registers.write_register(IoRegister::DIV, 0x46);
        assert_eq!(0x00, io_registers.read_register(IoRegister::DIV));

        timer.tick(&mut io_registers, 255);
        assert_eq!(0x00, io_registers.read_register(IoRegister::DIV));
        timer.tick(&mut io_registers, 1);
        assert_eq!(0x01, io_registers.read_register(IoRegister::DIV));
    }

    #[test]
    fn tima_increment_rates() {
        let mut io_registers = IoRegisters::new(ExecutionMode::GameBoy);
        let mut timer = SystemTimer::new();

        // Enabled at 262144Hz: one increment per 16 cycles
        io_registers.write_register(IoRegister::TAC, 0x05);
        io_registers.write_register(IoRegister::TIMA, 0x00);

        timer.tick(&mut io_registers, 15);
        assert_eq!(0x00, io_registers.read_register(IoRegister::TIMA));
        timer.tick(&mut io_registers, 1);
        assert_eq!(0x01, io_registers.read_register(IoRegister::TIMA));
        timer.tick(&mut io_registers, 40);
        assert_eq!(0x03, io_registers.read_register(IoRegister::TIMA));

        // Switch to 65536Hz: one increment per 64 cycles
        io_registers.write_register(IoRegister::TAC, 0x06);
        timer.tick(&mut io_registers, 256);
        assert_eq!(0x07, io_registers.read_register(IoRegister::TIMA));

        // Disabled: TIMA freezes
        io_registers.write_register(IoRegister::TAC, 0x02);
        timer.tick(&mut io_registers, 256);
        assert_eq!(0x07, io_registers.read_register(IoRegister::TIMA));
    }

    #[test]
    fn tima_overflow_reloads_and_requests_interrupt() {
        let mut io_registers = IoRegisters::new(ExecutionMode::GameBoy);
        let mut timer = SystemTimer::new();

        io_registers.write_register(IoRegister::TAC, 0x05);
        io_registers.write_register(IoRegister::TMA, 0x42);
        io_registers.write_register(IoRegister::TIMA, 0xFF);

        timer.tick(&mut io_registers, 16);

        assert_eq!(0x42, io_registers.read_register(IoRegister::TIMA));
        assert!(io_registers.interrupt_flags().get(InterruptType::Timer));
    }

    #[test]
    #[should_panic(expected = "cycles must be <= 256")]
    fn cycle_limit() {
        let mut io_registers = IoRegisters::new(ExecutionMode::GameBoy);
        let mut timer = SystemTimer::new();

        timer.tick(&mut io_registers, 257);
    }
}
