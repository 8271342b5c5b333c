use crate::cpu::instructions::Instruction;
use crate::cpu::{self, instructions, CpuRegisters, ExecutionMode, InterruptType};
use crate::memory::{AddressSpace, Cartridge};
use crate::ppu::{PpuMode, PpuState};

fn test_state() -> (AddressSpace, CpuRegisters, PpuState) {
    let address_space = AddressSpace::new(Cartridge::new(vec![0x00; 0x8000]).unwrap());
    let cpu_registers = CpuRegisters::new(ExecutionMode::GameBoy);
    let ppu_state = PpuState::new_in_mode(ExecutionMode::GameBoy, PpuMode::VBlank);
    (address_space, cpu_registers, ppu_state)
}

fn request_interrupt(address_space: &mut AddressSpace, interrupt_type: InterruptType) {
    address_space
        .get_io_registers_mut()
        .interrupt_flags()
        .set(interrupt_type);
}

#[test]
fn service_routine_jumps_to_vector() {
    let (mut address_space, mut cpu_registers, ppu_state) = test_state();

    address_space.write_address_u8(0xFFFF, 0x04, &ppu_state);
    request_interrupt(&mut address_space, InterruptType::Timer);

    cpu_registers.pc = 0x1234;
    cpu_registers.sp = 0xFFFE;

    assert!(cpu::interrupt_triggered(&cpu_registers, &address_space));
    let cycles =
        cpu::execute_interrupt_service_routine(&mut cpu_registers, &mut address_space, &ppu_state);

    assert_eq!(20, cycles);
    assert_eq!(0x0050, cpu_registers.pc);
    assert_eq!(0xFFFC, cpu_registers.sp);
    assert_eq!(0x1234, address_space.read_address_u16(0xFFFC, &ppu_state));
    assert!(!cpu_registers.ime);
    assert!(!address_space
        .get_io_registers_mut()
        .interrupt_flags()
        .get(InterruptType::Timer));
}

#[test]
fn lowest_bit_has_priority() {
    let (mut address_space, mut cpu_registers, ppu_state) = test_state();

    address_space.write_address_u8(0xFFFF, 0x1F, &ppu_state);
    request_interrupt(&mut address_space, InterruptType::Joypad);
    request_interrupt(&mut address_space, InterruptType::VBlank);

    cpu::execute_interrupt_service_routine(&mut cpu_registers, &mut address_space, &ppu_state);
    assert_eq!(0x0040, cpu_registers.pc);

    // The joypad request is still pending
    assert!(address_space
        .get_io_registers_mut()
        .interrupt_flags()
        .get(InterruptType::Joypad));
}

#[test]
fn waking_from_halt_costs_extra_cycles() {
    let (mut address_space, mut cpu_registers, ppu_state) = test_state();

    address_space.write_address_u8(0xFFFF, 0x01, &ppu_state);
    request_interrupt(&mut address_space, InterruptType::VBlank);
    cpu_registers.halted = true;

    let cycles =
        cpu::execute_interrupt_service_routine(&mut cpu_registers, &mut address_space, &ppu_state);

    assert_eq!(24, cycles);
    assert!(!cpu_registers.halted);
}

#[test]
fn masked_interrupts_do_not_trigger() {
    let (mut address_space, mut cpu_registers, ppu_state) = test_state();

    request_interrupt(&mut address_space, InterruptType::Timer);

    // IE is zero, so nothing is pending
    assert!(!cpu::interrupt_triggered(&cpu_registers, &address_space));
    assert!(!cpu::interrupt_pending_ignoring_ime(&address_space));

    address_space.write_address_u8(0xFFFF, 0x04, &ppu_state);
    cpu_registers.ime = false;

    // Pending but not serviceable while IME is clear
    assert!(!cpu::interrupt_triggered(&cpu_registers, &address_space));
    assert!(cpu::interrupt_pending_ignoring_ime(&address_space));
}

#[test]
fn ei_takes_effect_after_following_instruction() {
    let (mut address_space, mut cpu_registers, ppu_state) = test_state();

    address_space.write_address_u8(0xFFFF, 0x04, &ppu_state);
    request_interrupt(&mut address_space, InterruptType::Timer);
    cpu_registers.ime = false;

    Instruction::EnableInterrupts.execute(&mut address_space, &mut cpu_registers, &ppu_state);

    // IME is set but servicing is held off for one instruction
    assert!(cpu_registers.ime);
    assert!(!cpu::interrupt_triggered(&cpu_registers, &address_space));

    Instruction::NoOp.execute(&mut address_space, &mut cpu_registers, &ppu_state);
    assert!(cpu::interrupt_triggered(&cpu_registers, &address_space));
}

#[test]
fn stack_setup_and_call_scenario() {
    // LD SP, 0xFFFE followed by CALL 0x1234 at the entry point
    let mut rom = vec![0x00; 0x8000];
    rom[0x100..0x106].copy_from_slice(&[0x31, 0xFE, 0xFF, 0xCD, 0x34, 0x12]);

    let mut address_space = AddressSpace::new(Cartridge::new(rom).unwrap());
    let mut cpu_registers = CpuRegisters::new(ExecutionMode::GameBoy);
    let ppu_state = PpuState::new_in_mode(ExecutionMode::GameBoy, PpuMode::VBlank);

    let (instruction, pc) =
        instructions::parse_next_instruction(&address_space, cpu_registers.pc, &ppu_state).unwrap();
    cpu_registers.pc = pc;
    assert_eq!(12, instruction.cycles_required(&cpu_registers));
    instruction.execute(&mut address_space, &mut cpu_registers, &ppu_state);

    assert_eq!(0xFFFE, cpu_registers.sp);
    assert_eq!(0x0103, cpu_registers.pc);

    let (instruction, pc) =
        instructions::parse_next_instruction(&address_space, cpu_registers.pc, &ppu_state).unwrap();
    cpu_registers.pc = pc;
    assert_eq!(24, instruction.cycles_required(&cpu_registers));
    instruction.execute(&mut address_space, &mut cpu_registers, &ppu_state);

    assert_eq!(0xFFFC, cpu_registers.sp);
    assert_eq!(0x06, address_space.read_address_u8(0xFFFC, &ppu_state));
    assert_eq!(0x01, address_space.read_address_u8(0xFFFD, &ppu_state));
    assert_eq!(0x1234, cpu_registers.pc);
}

#[test]
fn boot_state() {
    let cpu_registers = CpuRegisters::new(ExecutionMode::GameBoyColor);

    assert_eq!(0x11B0, cpu_registers.af());
    assert_eq!(0x0013, cpu_registers.bc());
    assert_eq!(0x00D8, cpu_registers.de());
    assert_eq!(0x014F, cpu_registers.hl());
    assert_eq!(0xFFFE, cpu_registers.sp);
    assert_eq!(0x0100, cpu_registers.pc);
    assert!(cpu_registers.ime);
    assert!(!cpu_registers.halted);
}
