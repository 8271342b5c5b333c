use crate::cpu::instructions::{Instruction, JumpCondition, ModifyTarget, ReadTarget, WriteTarget};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::memory::AddressSpace;
use crate::ppu::PpuState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unknown opcode {opcode:02X} at {pc:04X}")]
    UnknownOpcode { opcode: u8, pc: u16 },
}

/// Decode the instruction at the given PC.
///
/// Returns the decoded instruction and the address of the following
/// instruction. Most opcodes are decoded from the register fields in the
/// opcode bit layout (bits 0-2 and 3-5 select operands, with field value 110
/// meaning the (HL) memory operand); irregular opcodes and the CB-prefixed
/// page fall back to explicit match arms.
pub fn parse_next_instruction(
    address_space: &AddressSpace,
    pc: u16,
    ppu_state: &PpuState,
) -> Result<(Instruction, u16), ParseError> {
    let opcode = address_space.read_address_u8(pc, ppu_state);

    let parsed = match opcode {
        0x00 => (Instruction::NoOp, pc.wrapping_add(1)),
        0x01 | 0x11 | 0x21 | 0x31 => {
            let rr = register_pair_for_other_ops(opcode);
            let nn = address_space.read_address_u16(pc.wrapping_add(1), ppu_state);
            (Instruction::LoadRegisterPairImmediate(rr, nn), pc.wrapping_add(3))
        }
        0x02 => (
            Instruction::Load(WriteTarget::IndirectBC, ReadTarget::Accumulator),
            pc.wrapping_add(1),
        ),
        0x03 | 0x13 | 0x23 | 0x33 => {
            let rr = register_pair_for_other_ops(opcode);
            (Instruction::IncRegisterPair(rr), pc.wrapping_add(1))
        }
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            let modify_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
            (Instruction::Increment(modify_target), pc.wrapping_add(1))
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            let modify_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
            (Instruction::Decrement(modify_target), pc.wrapping_add(1))
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            let write_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(WriteTarget::IndirectHL, WriteTarget::Register);
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::Load(write_target, ReadTarget::Immediate(n)), pc.wrapping_add(2))
        }
        0x07 => (Instruction::RotateLeft(ModifyTarget::Accumulator), pc.wrapping_add(1)),
        0x08 => {
            let nn = address_space.read_address_u16(pc.wrapping_add(1), ppu_state);
            (Instruction::LoadDirectStackPointer(nn), pc.wrapping_add(3))
        }
        0x09 | 0x19 | 0x29 | 0x39 => {
            let rr = register_pair_for_other_ops(opcode);
            (Instruction::AddHLRegister(rr), pc.wrapping_add(1))
        }
        0x0A => (
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectBC),
            pc.wrapping_add(1),
        ),
        0x0B | 0x1B | 0x2B | 0x3B => {
            let rr = register_pair_for_other_ops(opcode);
            (Instruction::DecRegisterPair(rr), pc.wrapping_add(1))
        }
        0x0F => (Instruction::RotateRight(ModifyTarget::Accumulator), pc.wrapping_add(1)),
        // STOP has a padding byte after the opcode
        0x10 => (Instruction::Stop, pc.wrapping_add(2)),
        0x12 => (
            Instruction::Load(WriteTarget::IndirectDE, ReadTarget::Accumulator),
            pc.wrapping_add(1),
        ),
        0x17 => (Instruction::RotateLeftThruCarry(ModifyTarget::Accumulator), pc.wrapping_add(1)),
        0x18 => {
            let e = address_space.read_address_u8(pc.wrapping_add(1), ppu_state) as i8;
            (Instruction::RelativeJump(e), pc.wrapping_add(2))
        }
        0x1A => (
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectDE),
            pc.wrapping_add(1),
        ),
        0x1F => (Instruction::RotateRightThruCarry(ModifyTarget::Accumulator), pc.wrapping_add(1)),
        0x20 | 0x28 | 0x30 | 0x38 => {
            let cc = parse_jump_condition(opcode);
            let e = address_space.read_address_u8(pc.wrapping_add(1), ppu_state) as i8;
            (Instruction::RelativeJumpCond(cc, e), pc.wrapping_add(2))
        }
        0x22 => (
            Instruction::Load(WriteTarget::IndirectHLInc, ReadTarget::Accumulator),
            pc.wrapping_add(1),
        ),
        0x27 => (Instruction::DecimalAdjustAccumulator, pc.wrapping_add(1)),
        0x2A => (
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectHLInc),
            pc.wrapping_add(1),
        ),
        0x2F => (Instruction::ComplementAccumulator, pc.wrapping_add(1)),
        0x32 => (
            Instruction::Load(WriteTarget::IndirectHLDec, ReadTarget::Accumulator),
            pc.wrapping_add(1),
        ),
        0x37 => (Instruction::SetCarryFlag, pc.wrapping_add(1)),
        0x3A => (
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectHLDec),
            pc.wrapping_add(1),
        ),
        0x3F => (Instruction::ComplementCarryFlag, pc.wrapping_add(1)),
        opcode @ 0x40..=0x7F => {
            if opcode == 0x76 {
                (Instruction::Halt, pc.wrapping_add(1))
            } else {
                let write_target = CpuRegister::from_mid_opcode_bits(opcode)
                    .map_or(WriteTarget::IndirectHL, WriteTarget::Register);
                let read_target = CpuRegister::from_low_opcode_bits(opcode)
                    .map_or(ReadTarget::IndirectHL, ReadTarget::Register);
                (Instruction::Load(write_target, read_target), pc.wrapping_add(1))
            }
        }
        opcode @ 0x80..=0xBF => {
            let read_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ReadTarget::IndirectHL, ReadTarget::Register);
            let instruction = match opcode & 0x38 {
                0x00 => Instruction::Add(read_target),
                0x08 => Instruction::AddWithCarry(read_target),
                0x10 => Instruction::Subtract(read_target),
                0x18 => Instruction::SubtractWithCarry(read_target),
                0x20 => Instruction::And(read_target),
                0x28 => Instruction::Xor(read_target),
                0x30 => Instruction::Or(read_target),
                0x38 => Instruction::Compare(read_target),
                _ => unreachable!("{opcode} & 0x38 produced a value above 0x38"),
            };
            (instruction, pc.wrapping_add(1))
        }
        0xC0 | 0xC8 | 0xD0 | 0xD8 => {
            let cc = parse_jump_condition(opcode);
            (Instruction::ReturnCond(cc), pc.wrapping_add(1))
        }
        0xC1 | 0xD1 | 0xE1 | 0xF1 => {
            let rr = register_pair_for_push_pop(opcode);
            (Instruction::PopStack(rr), pc.wrapping_add(1))
        }
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            let cc = parse_jump_condition(opcode);
            let nn = address_space.read_address_u16(pc.wrapping_add(1), ppu_state);
            (Instruction::JumpCond(cc, nn), pc.wrapping_add(3))
        }
        0xC3 => {
            let nn = address_space.read_address_u16(pc.wrapping_add(1), ppu_state);
            (Instruction::Jump(nn), pc.wrapping_add(3))
        }
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            let cc = parse_jump_condition(opcode);
            let nn = address_space.read_address_u16(pc.wrapping_add(1), ppu_state);
            (Instruction::CallCond(cc, nn), pc.wrapping_add(3))
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            let rr = register_pair_for_push_pop(opcode);
            (Instruction::PushStack(rr), pc.wrapping_add(1))
        }
        0xC6 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::Add(ReadTarget::Immediate(n)), pc.wrapping_add(2))
        }
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            let rst_address = opcode & 0x38;
            (Instruction::RestartCall(rst_address), pc.wrapping_add(1))
        }
        0xC9 => (Instruction::Return, pc.wrapping_add(1)),
        0xCB => parse_cb_prefixed_opcode(address_space, pc, ppu_state),
        0xCD => {
            let nn = address_space.read_address_u16(pc.wrapping_add(1), ppu_state);
            (Instruction::Call(nn), pc.wrapping_add(3))
        }
        0xCE => {
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::AddWithCarry(ReadTarget::Immediate(n)), pc.wrapping_add(2))
        }
        0xD6 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::Subtract(ReadTarget::Immediate(n)), pc.wrapping_add(2))
        }
        0xD9 => (Instruction::ReturnFromInterruptHandler, pc.wrapping_add(1)),
        0xDE => {
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::SubtractWithCarry(ReadTarget::Immediate(n)), pc.wrapping_add(2))
        }
        0xE0 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::Load(WriteTarget::FFDirect(n), ReadTarget::Accumulator), pc.wrapping_add(2))
        }
        0xE2 => (
            Instruction::Load(WriteTarget::FFIndirectC, ReadTarget::Accumulator),
            pc.wrapping_add(1),
        ),
        0xE6 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::And(ReadTarget::Immediate(n)), pc.wrapping_add(2))
        }
        0xE8 => {
            let e = address_space.read_address_u8(pc.wrapping_add(1), ppu_state) as i8;
            (Instruction::AddSPImmediate(e), pc.wrapping_add(2))
        }
        0xE9 => (Instruction::JumpHL, pc.wrapping_add(1)),
        0xEA => {
            let nn = address_space.read_address_u16(pc.wrapping_add(1), ppu_state);
            (Instruction::Load(WriteTarget::Direct(nn), ReadTarget::Accumulator), pc.wrapping_add(3))
        }
        0xEE => {
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::Xor(ReadTarget::Immediate(n)), pc.wrapping_add(2))
        }
        0xF0 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::Load(WriteTarget::Accumulator, ReadTarget::FFDirect(n)), pc.wrapping_add(2))
        }
        0xF2 => (
            Instruction::Load(WriteTarget::Accumulator, ReadTarget::FFIndirectC),
            pc.wrapping_add(1),
        ),
        0xF3 => (Instruction::DisableInterrupts, pc.wrapping_add(1)),
        0xF6 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::Or(ReadTarget::Immediate(n)), pc.wrapping_add(2))
        }
        0xF8 => {
            let e = address_space.read_address_u8(pc.wrapping_add(1), ppu_state) as i8;
            (Instruction::LoadHLStackPointerOffset(e), pc.wrapping_add(2))
        }
        0xF9 => (Instruction::LoadStackPointerHL, pc.wrapping_add(1)),
        0xFA => {
            let nn = address_space.read_address_u16(pc.wrapping_add(1), ppu_state);
            (Instruction::Load(WriteTarget::Accumulator, ReadTarget::Direct(nn)), pc.wrapping_add(3))
        }
        0xFB => (Instruction::EnableInterrupts, pc.wrapping_add(1)),
        0xFE => {
            let n = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);
            (Instruction::Compare(ReadTarget::Immediate(n)), pc.wrapping_add(2))
        }
        _ => return Err(ParseError::UnknownOpcode { opcode, pc }),
    };

    Ok(parsed)
}

fn parse_cb_prefixed_opcode(
    address_space: &AddressSpace,
    pc: u16,
    ppu_state: &PpuState,
) -> (Instruction, u16) {
    let opcode = address_space.read_address_u8(pc.wrapping_add(1), ppu_state);

    let instruction = match opcode {
        0x00..=0x3F => {
            let modify_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
            match opcode & 0x38 {
                0x00 => Instruction::RotateLeft(modify_target),
                0x08 => Instruction::RotateRight(modify_target),
                0x10 => Instruction::RotateLeftThruCarry(modify_target),
                0x18 => Instruction::RotateRightThruCarry(modify_target),
                0x20 => Instruction::ShiftLeft(modify_target),
                0x28 => Instruction::ArithmeticShiftRight(modify_target),
                0x30 => Instruction::Swap(modify_target),
                0x38 => Instruction::LogicalShiftRight(modify_target),
                _ => unreachable!("{opcode} & 0x38 produced a value above 0x38"),
            }
        }
        0x40..=0x7F => {
            let bit = (opcode & 0x38) >> 3;
            let read_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ReadTarget::IndirectHL, ReadTarget::Register);
            Instruction::TestBit(bit, read_target)
        }
        0x80..=0xBF => {
            let bit = (opcode & 0x38) >> 3;
            let modify_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
            Instruction::ResetBit(bit, modify_target)
        }
        0xC0..=0xFF => {
            let bit = (opcode & 0x38) >> 3;
            let modify_target = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register);
            Instruction::SetBit(bit, modify_target)
        }
    };

    (instruction, pc.wrapping_add(2))
}

fn register_pair_for_other_ops(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        0x30 => CpuRegisterPair::SP,
        _ => unreachable!("{opcode} & 0x30 did not produce 0x00/0x10/0x20/0x30"),
    }
}

fn register_pair_for_push_pop(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        0x30 => CpuRegisterPair::AF,
        _ => unreachable!("{opcode} & 0x30 did not produce 0x00/0x10/0x20/0x30"),
    }
}

fn parse_jump_condition(opcode: u8) -> JumpCondition {
    match opcode & 0x18 {
        0x00 => JumpCondition::NZ,
        0x08 => JumpCondition::Z,
        0x10 => JumpCondition::NC,
        0x18 => JumpCondition::C,
        _ => unreachable!("{opcode} & 0x18 did not produce 0x00/0x08/0x10/0x18"),
    }
}
