use crate::memory::address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MapperType {
    MBC1,
    MBC2,
    MBC5,
}

/// Parse the mapper byte at 0x0147 into a mapper type and whether the
/// cartridge has a save battery. Returns None for mapper types that are not
/// supported.
pub(crate) fn parse_byte(mapper_byte: u8) -> Option<(MapperType, bool)> {
    let parsed = match mapper_byte {
        // ROM-only cartridges behave like an MBC1 that never switches banks
        0x00 | 0x01 | 0x02 => (MapperType::MBC1, false),
        0x03 => (MapperType::MBC1, true),
        0x05 => (MapperType::MBC2, false),
        0x06 => (MapperType::MBC2, true),
        // With and without rumble
        0x19 | 0x1A | 0x1C | 0x1D => (MapperType::MBC5, false),
        0x1B | 0x1E => (MapperType::MBC5, true),
        _ => return None,
    };

    Some(parsed)
}

#[derive(Debug, Clone)]
pub(crate) enum Mapper {
    MBC1 {
        rom_bank_bit_mask: u16,
        rom_bank_low_bits: u8,
        secondary_bank: u8,
        banking_mode_select: u8,
    },
    MBC2 {
        rom_bank_bit_mask: u16,
        rom_bank_number: u8,
    },
    MBC5 {
        rom_bank_bit_mask: u16,
        rom_bank_number: u16,
        ram_bank_number: u8,
    },
}

impl Mapper {
    pub(crate) fn new(mapper_type: MapperType, rom_size: u32) -> Self {
        let rom_bank_bit_mask = if rom_size >= 1 << 14 {
            ((rom_size >> 14) - 1) as u16
        } else {
            0
        };

        log::debug!("setting ROM bank bit mask to {rom_bank_bit_mask:02X} for size {rom_size}");

        match mapper_type {
            MapperType::MBC1 => Self::MBC1 {
                rom_bank_bit_mask,
                rom_bank_low_bits: 0x01,
                secondary_bank: 0x00,
                banking_mode_select: 0x00,
            },
            MapperType::MBC2 => Self::MBC2 {
                rom_bank_bit_mask,
                rom_bank_number: 0x01,
            },
            MapperType::MBC5 => Self::MBC5 {
                rom_bank_bit_mask,
                rom_bank_number: 0x01,
                ram_bank_number: 0x00,
            },
        }
    }

    pub(crate) fn map_rom_address(&self, address: u16) -> u32 {
        if address < address::ROM_BANKED_START {
            return u32::from(address);
        }

        let bank_number = match *self {
            Self::MBC1 {
                rom_bank_bit_mask,
                rom_bank_low_bits,
                secondary_bank,
                banking_mode_select,
            } => {
                let mut bank_number = if banking_mode_select == 0x00 {
                    (u16::from(secondary_bank) << 5) | u16::from(rom_bank_low_bits)
                } else {
                    u16::from(rom_bank_low_bits)
                };
                // Bank numbers with all-zero low bits select the next bank up
                if bank_number % 32 == 0 {
                    bank_number += 1;
                }
                bank_number & rom_bank_bit_mask
            }
            Self::MBC2 {
                rom_bank_bit_mask,
                rom_bank_number,
            } => {
                let bank_number = if rom_bank_number == 0x00 {
                    0x01
                } else {
                    u16::from(rom_bank_number)
                };
                bank_number & rom_bank_bit_mask
            }
            Self::MBC5 {
                rom_bank_bit_mask,
                rom_bank_number,
                ..
            } => rom_bank_number & rom_bank_bit_mask,
        };

        u32::from(address - address::ROM_BANKED_START) + (u32::from(bank_number) << 14)
    }

    // ROM writes don't modify the ROM; they set cartridge bank registers
    pub(crate) fn write_rom_address(&mut self, address: u16, value: u8) {
        match self {
            Self::MBC1 {
                rom_bank_low_bits,
                secondary_bank,
                banking_mode_select,
                ..
            } => match address {
                // RAM enable; external RAM is always mapped here
                0x0000..=0x1FFF => {}
                0x2000..=0x3FFF => {
                    log::trace!("MBC1 ROM bank low bits changed to {value:02X}");
                    *rom_bank_low_bits = value & 0x1F;
                }
                0x4000..=0x5FFF => {
                    log::trace!("MBC1 secondary bank changed to {value:02X}");
                    *secondary_bank = value & 0x03;
                }
                0x6000..=0x7FFF => {
                    log::trace!("MBC1 banking mode changed to {value:02X}");
                    *banking_mode_select = value & 0x01;
                }
                _ => panic!("invalid ROM write address in MBC1 mapper: {address:04X}"),
            },
            Self::MBC2 {
                rom_bank_number, ..
            } => match address {
                0x0000..=0x1FFF => {}
                0x2000..=0x3FFF => {
                    *rom_bank_number = value & 0x0F;
                }
                0x4000..=0x7FFF => {}
                _ => panic!("invalid ROM write address in MBC2 mapper: {address:04X}"),
            },
            Self::MBC5 {
                rom_bank_number,
                ram_bank_number,
                ..
            } => match address {
                0x0000..=0x1FFF => {}
                0x2000..=0x2FFF => {
                    *rom_bank_number = (*rom_bank_number & 0xFF00) | u16::from(value);
                }
                0x3000..=0x3FFF => {
                    *rom_bank_number = (u16::from(value & 0x01) << 8) | (*rom_bank_number & 0x00FF);
                }
                0x4000..=0x5FFF => {
                    *ram_bank_number = value & 0x0F;
                }
                0x6000..=0x7FFF => {}
                _ => panic!("invalid ROM write address in MBC5 mapper: {address:04X}"),
            },
        }
    }

    pub(crate) fn map_ram_address(&self, address: u16) -> u32 {
        let relative_address = u32::from(address - address::EXTERNAL_RAM_START);

        match *self {
            Self::MBC1 {
                secondary_bank,
                banking_mode_select,
                ..
            } => {
                if banking_mode_select == 0x00 {
                    relative_address
                } else {
                    relative_address + (u32::from(secondary_bank & 0x03) << 13)
                }
            }
            // MBC2's 512x4 internal RAM shares the external RAM array
            Self::MBC2 { .. } => relative_address,
            Self::MBC5 {
                ram_bank_number, ..
            } => relative_address + (u32::from(ram_bank_number) << 13),
        }
    }
}
