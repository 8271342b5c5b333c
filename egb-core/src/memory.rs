pub mod address;
pub mod ioregisters;
mod mapper;

use crate::cpu::ExecutionMode;
use crate::memory::ioregisters::IoRegisters;
use crate::memory::mapper::Mapper;
use crate::ppu::{PpuMode, PpuState};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use std::path::Path;
use std::{cmp, fs, io};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("cartridge header should be at least {} bytes, was {rom_len} bytes", address::MIN_ROM_LEN)]
    HeaderTooShort { rom_len: usize },
    #[error("invalid or unsupported mapper byte in cartridge header: {mapper_byte:02X}")]
    UnsupportedMapper { mapper_byte: u8 },
    #[error("error reading data from {file_path}: {source}")]
    FileReadError {
        file_path: String,
        #[source]
        source: io::Error,
    },
}

pub const SAVE_FILE_EXTENSION: &str = "egb";

const SAVE_MAGIC: [u8; 4] = [0xFF, b'E', b'G', b'B'];

#[derive(Error, Debug)]
enum SaveFileError {
    #[error("save file does not start with the expected magic bytes")]
    BadMagic,
    #[error("error reading save file: {0}")]
    Io(#[from] io::Error),
}

fn encode_external_ram<W: Write>(ram: &[u8], mut writer: W) -> io::Result<()> {
    writer.write_all(&SAVE_MAGIC)?;

    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    encoder.write_all(ram)?;
    encoder.finish()?.flush()?;

    Ok(())
}

fn decode_external_ram<R: Read>(mut reader: R) -> Result<Vec<u8>, SaveFileError> {
    let mut magic = [0; SAVE_MAGIC.len()];
    reader.read_exact(&mut magic)?;
    if magic != SAVE_MAGIC {
        return Err(SaveFileError::BadMagic);
    }

    let mut ram = Vec::with_capacity(address::EXTERNAL_RAM_LEN);
    ZlibDecoder::new(reader)
        .take(address::EXTERNAL_RAM_LEN as u64)
        .read_to_end(&mut ram)?;

    Ok(ram)
}

pub struct Cartridge {
    rom: Vec<u8>,
    mapper: Mapper,
    ram: Vec<u8>,
    has_battery: bool,
    title: String,
}

impl Cartridge {
    /// Create a new Cartridge value from the given ROM image.
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM is shorter than the cartridge header or if
    /// the mapper byte in the header is not a supported MBC type.
    pub fn new(rom: Vec<u8>) -> Result<Self, CartridgeLoadError> {
        log::info!("Initializing cartridge using {} bytes of data", rom.len());

        if rom.len() < address::MIN_ROM_LEN {
            return Err(CartridgeLoadError::HeaderTooShort { rom_len: rom.len() });
        }

        let mapper_byte = rom[address::MAPPER];
        let Some((mapper_type, has_battery)) = mapper::parse_byte(mapper_byte) else {
            return Err(CartridgeLoadError::UnsupportedMapper { mapper_byte });
        };

        let title_bytes = &rom[address::TITLE_START..address::TITLE_START + address::TITLE_LEN];
        let title_len = title_bytes
            .iter()
            .position(|&b| b == 0x00)
            .unwrap_or(address::TITLE_LEN);
        let title = String::from_utf8_lossy(&title_bytes[..title_len]).into_owned();

        log::info!("Detected mapper type {mapper_type:?} (byte: {mapper_byte:02X})");
        log::info!("Cartridge has battery: {has_battery}");
        log::info!("Cartridge title: '{title}'");

        let mapper = Mapper::new(mapper_type, rom.len() as u32);

        Ok(Self {
            rom,
            mapper,
            ram: vec![0; address::EXTERNAL_RAM_LEN],
            has_battery,
            title,
        })
    }

    pub fn from_file(file_path: &str) -> Result<Self, CartridgeLoadError> {
        log::info!("Loading cartridge from '{file_path}'");

        let rom = fs::read(Path::new(file_path)).map_err(|err| CartridgeLoadError::FileReadError {
            file_path: file_path.into(),
            source: err,
        })?;

        Self::new(rom)
    }

    /// The raw NUL-trimmed title from the cartridge header.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The title with every character lowercased except the first letter of
    /// each word, used as the save file stem.
    pub fn save_file_stem(&self) -> String {
        let mut prev_char = None;
        self.title
            .chars()
            .map(|c| {
                let word_initial = prev_char.is_none() || prev_char == Some(' ');
                prev_char = Some(c);
                if word_initial {
                    c
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect()
    }

    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    /// Whether the header requests color-mode enhancements (0x80) or requires
    /// them (0xC0).
    pub fn supports_cgb_mode(&self) -> bool {
        self.rom[address::CGB_SUPPORT] == 0x80 || self.rom[address::CGB_SUPPORT] == 0xC0
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        if self.supports_cgb_mode() {
            ExecutionMode::GameBoyColor
        } else {
            ExecutionMode::GameBoy
        }
    }

    /// Read a value from the given ROM address through the mapper. Reads past
    /// the end of the ROM image return 0xFF.
    pub fn read_rom_address(&self, address: u16) -> u8 {
        let mapped_address = self.mapper.map_rom_address(address);
        self.rom.get(mapped_address as usize).copied().unwrap_or(0xFF)
    }

    /// Write a value to the given ROM address, which in reality sets a bank
    /// register inside the cartridge.
    pub fn write_rom_address(&mut self, address: u16, value: u8) {
        self.mapper.write_rom_address(address, value);
    }

    pub fn read_ram_address(&self, address: u16) -> u8 {
        let mapped_address = self.mapper.map_ram_address(address);
        self.ram.get(mapped_address as usize).copied().unwrap_or(0xFF)
    }

    pub fn write_ram_address(&mut self, address: u16, value: u8) {
        let mapped_address = self.mapper.map_ram_address(address);
        if let Some(ram_value) = self.ram.get_mut(mapped_address as usize) {
            *ram_value = value;
        }
    }

    /// Replace the external RAM image with the contents of the given save
    /// file, if this cartridge has a battery and the file is a valid save.
    ///
    /// A missing file is not an error (there is simply no save yet). A file
    /// with a bad magic header or corrupt compressed data is logged and
    /// ignored, leaving RAM zeroed.
    pub fn load_save_file<P: AsRef<Path>>(&mut self, path: P) {
        let path = path.as_ref();

        if !self.has_battery {
            return;
        }

        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return,
            Err(err) => {
                log::error!("error opening save file {}: {err}", path.display());
                return;
            }
        };

        match decode_external_ram(io::BufReader::new(file)) {
            Ok(ram) => {
                self.ram[..ram.len()].copy_from_slice(&ram);
                log::info!("Loaded external RAM from {}", path.display());
            }
            Err(err) => {
                log::error!("ignoring invalid save file {}: {err}", path.display());
                self.ram.fill(0);
            }
        }
    }

    /// Write the external RAM image to the given save file if this cartridge
    /// has a battery.
    pub fn persist_save_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if !self.has_battery {
            return Ok(());
        }

        let file = fs::File::create(path)?;
        encode_external_ram(&self.ram, io::BufWriter::new(file))?;

        log::info!("Persisted external RAM to {}", path.display());

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct OamDmaState {
    source_address: u16,
    bytes_copied: u16,
}

pub struct AddressSpace {
    execution_mode: ExecutionMode,
    cartridge: Cartridge,
    vram: [u8; 2 * address::VRAM_BANK_LEN],
    working_ram: [u8; 8 * address::WORKING_RAM_BANK_LEN],
    oam: [u8; address::OAM_LEN],
    io_registers: IoRegisters,
    hram: [u8; address::HRAM_LEN],
    ie_register: u8,
    oam_dma: Option<OamDmaState>,
}

impl AddressSpace {
    pub fn new(cartridge: Cartridge) -> Self {
        let execution_mode = cartridge.execution_mode();
        Self {
            execution_mode,
            cartridge,
            vram: [0; 2 * address::VRAM_BANK_LEN],
            working_ram: [0; 8 * address::WORKING_RAM_BANK_LEN],
            oam: [0; address::OAM_LEN],
            io_registers: IoRegisters::new(execution_mode),
            hram: [0; address::HRAM_LEN],
            ie_register: 0,
            oam_dma: None,
        }
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    fn is_cpu_access_allowed(&self, address: u16, ppu_state: &PpuState) -> bool {
        // The PPU holds OAM during sprite scan and pixel transfer
        if ppu_state.enabled()
            && matches!(
                ppu_state.mode(),
                PpuMode::ScanningOam | PpuMode::RenderingScanline
            )
            && (address::OAM_START..=address::OAM_END).contains(&address)
        {
            return false;
        }

        // The PPU holds VRAM during pixel transfer
        !(ppu_state.enabled()
            && ppu_state.mode() == PpuMode::RenderingScanline
            && (address::VRAM_START..=address::VRAM_END).contains(&address))
    }

    fn map_vram_address(&self, address: u16) -> usize {
        let relative_addr = (address - address::VRAM_START) as usize;
        match self.execution_mode {
            ExecutionMode::GameBoy => relative_addr,
            ExecutionMode::GameBoyColor => {
                let bank = self.io_registers.read_register(ioregisters::IoRegister::VBK) & 0x01;
                (bank as usize) * address::VRAM_BANK_LEN + relative_addr
            }
        }
    }

    fn map_working_ram_address(&self, address: u16) -> usize {
        match address {
            address::WORKING_RAM_START..=address::BANK_0_WORKING_RAM_END => {
                (address - address::WORKING_RAM_START) as usize
            }
            _ => {
                let bank = match self.execution_mode {
                    ExecutionMode::GameBoy => 1,
                    ExecutionMode::GameBoyColor => {
                        // SVBK=0 selects bank 1
                        let svbk =
                            self.io_registers.read_register(ioregisters::IoRegister::SVBK) & 0x07;
                        cmp::max(usize::from(svbk), 1)
                    }
                };
                bank * address::WORKING_RAM_BANK_LEN
                    + (address - address::BANKED_WORKING_RAM_START) as usize
            }
        }
    }

    /// Read the value at the given address from the perspective of the CPU.
    /// Returns 0xFF if the PPU currently holds the addressed memory.
    pub fn read_address_u8(&self, address: u16, ppu_state: &PpuState) -> u8 {
        if !self.is_cpu_access_allowed(address, ppu_state) {
            return 0xFF;
        }

        self.read_address_u8_no_access_check(address)
    }

    fn read_address_u8_no_access_check(&self, address: u16) -> u8 {
        match address {
            address::ROM_START..=address::ROM_END => self.cartridge.read_rom_address(address),
            address::VRAM_START..=address::VRAM_END => self.vram[self.map_vram_address(address)],
            address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.read_ram_address(address)
            }
            address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[self.map_working_ram_address(address)]
            }
            address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[self.map_working_ram_address(
                    address - address::ECHO_RAM_START + address::WORKING_RAM_START,
                )]
            }
            address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize]
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => 0x00,
            address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers.read_address(address)
            }
            address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize]
            }
            address::IE_REGISTER => self.ie_register,
        }
    }

    /// Read the value at the given address and the following address as a
    /// little-endian 16-bit value.
    pub fn read_address_u16(&self, address: u16, ppu_state: &PpuState) -> u16 {
        let lsb = self.read_address_u8(address, ppu_state);
        let msb = self.read_address_u8(address.wrapping_add(1), ppu_state);
        u16::from_le_bytes([lsb, msb])
    }

    /// Assign a value to the given address from the perspective of the CPU.
    /// The write is dropped if the PPU currently holds the addressed memory.
    pub fn write_address_u8(&mut self, address: u16, value: u8, ppu_state: &PpuState) {
        if !self.is_cpu_access_allowed(address, ppu_state) {
            return;
        }

        self.write_address_u8_no_access_check(address, value);
    }

    fn write_address_u8_no_access_check(&mut self, address: u16, value: u8) {
        match address {
            address::ROM_START..=address::ROM_END => {
                self.cartridge.write_rom_address(address, value);
            }
            address::VRAM_START..=address::VRAM_END => {
                self.vram[self.map_vram_address(address)] = value;
            }
            address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.write_ram_address(address, value);
            }
            address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[self.map_working_ram_address(address)] = value;
            }
            address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[self.map_working_ram_address(
                    address - address::ECHO_RAM_START + address::WORKING_RAM_START,
                )] = value;
            }
            address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize] = value;
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => {}
            address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers.write_address(address, value);
                if let Some(source_page) = self.io_registers.take_dma_request() {
                    self.oam_dma = Some(OamDmaState {
                        source_address: u16::from(source_page) << 8,
                        bytes_copied: 0,
                    });
                }
            }
            address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize] = value;
            }
            address::IE_REGISTER => {
                self.ie_register = value;
            }
        }
    }

    /// Assign a 16-bit value to the given address and the following address
    /// using little-endian byte order.
    pub fn write_address_u16(&mut self, address: u16, value: u16, ppu_state: &PpuState) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb, ppu_state);
        self.write_address_u8(address.wrapping_add(1), msb, ppu_state);
    }

    /// Advance an in-progress OAM DMA transfer by the given number of CPU
    /// cycles, copying one byte per cycle. A transfer covers all 160 OAM bytes
    /// and therefore completes exactly 160 cycles after the initiating write.
    pub fn step_dma(&mut self, cycles: u32) {
        let Some(OamDmaState {
            source_address,
            bytes_copied,
        }) = self.oam_dma
        else {
            return;
        };

        let count = cmp::min(cycles, u32::from(address::OAM_LEN as u16 - bytes_copied)) as u16;
        for i in bytes_copied..bytes_copied + count {
            self.oam[i as usize] =
                self.read_address_u8_no_access_check(source_address.wrapping_add(i));
        }

        let bytes_copied = bytes_copied + count;
        self.oam_dma = if bytes_copied == address::OAM_LEN as u16 {
            None
        } else {
            Some(OamDmaState {
                source_address,
                bytes_copied,
            })
        };
    }

    pub fn get_io_registers(&self) -> &IoRegisters {
        &self.io_registers
    }

    pub fn get_io_registers_mut(&mut self) -> &mut IoRegisters {
        &mut self.io_registers
    }

    /// Retrieve the current value of the IE register (interrupts enabled).
    pub fn get_ie_register(&self) -> u8 {
        self.ie_register
    }

    /// Read an OAM byte from the perspective of the PPU, bypassing the CPU
    /// access check.
    pub fn ppu_read_oam(&self, index: usize) -> u8 {
        self.oam[index]
    }

    /// Read a byte from the given VRAM bank from the perspective of the PPU,
    /// bypassing both the CPU access check and the VBK register.
    pub fn ppu_read_vram(&self, bank: usize, offset: usize) -> u8 {
        self.vram[bank * address::VRAM_BANK_LEN + offset]
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ioregisters::IoRegister;

    fn test_rom(mapper_byte: u8, cgb_flag: u8) -> Vec<u8> {
        let mut rom = vec![0; 0x8000];
        rom[address::MAPPER] = mapper_byte;
        rom[address::CGB_SUPPORT] = cgb_flag;
        rom
    }

    fn test_address_space(mapper_byte: u8, cgb_flag: u8) -> AddressSpace {
        AddressSpace::new(Cartridge::new(test_rom(mapper_byte, cgb_flag)).unwrap())
    }

    fn vblank_ppu_state(address_space: &AddressSpace) -> PpuState {
        PpuState::new_in_mode(address_space.execution_mode(), PpuMode::VBlank)
    }

    #[test]
    fn ram_regions_round_trip() {
        let mut address_space = test_address_space(0x03, 0x00);
        let ppu_state = vblank_ppu_state(&address_space);

        for address in [0x8000, 0x9FFF, 0xA000, 0xBFFF, 0xC000, 0xDFFF, 0xFE00, 0xFE9F, 0xFF80, 0xFFFE, 0xFFFF]
        {
            address_space.write_address_u8(address, 0x5A, &ppu_state);
            assert_eq!(
                0x5A,
                address_space.read_address_u8(address, &ppu_state),
                "round trip failed at {address:04X}"
            );
        }
    }

    #[test]
    fn rom_writes_do_not_modify_rom() {
        let mut address_space = test_address_space(0x00, 0x00);
        let ppu_state = vblank_ppu_state(&address_space);

        let before = address_space.read_address_u8(0x0123, &ppu_state);
        address_space.write_address_u8(0x0123, 0xFF, &ppu_state);
        assert_eq!(before, address_space.read_address_u8(0x0123, &ppu_state));
    }

    #[test]
    fn echo_ram_mirrors_working_ram() {
        let mut address_space = test_address_space(0x00, 0x00);
        let ppu_state = vblank_ppu_state(&address_space);

        address_space.write_address_u8(0xC123, 0x45, &ppu_state);
        assert_eq!(0x45, address_space.read_address_u8(0xE123, &ppu_state));

        address_space.write_address_u8(0xF234, 0x67, &ppu_state);
        assert_eq!(0x67, address_space.read_address_u8(0xD234, &ppu_state));
    }

    #[test]
    fn unusable_region_reads_zero() {
        let mut address_space = test_address_space(0x00, 0x00);
        let ppu_state = vblank_ppu_state(&address_space);

        address_space.write_address_u8(0xFEA5, 0xFF, &ppu_state);
        assert_eq!(0x00, address_space.read_address_u8(0xFEA5, &ppu_state));
        assert_eq!(0x00, address_space.read_address_u8(0xFEFF, &ppu_state));
    }

    #[test]
    fn mbc1_bank_zero_reads_bank_one() {
        let mut rom = test_rom(0x01, 0x00);
        rom[0x4000] = 0xAB;
        let mut address_space = AddressSpace::new(Cartridge::new(rom).unwrap());
        let ppu_state = vblank_ppu_state(&address_space);

        address_space.write_address_u8(0x2000, 0x00, &ppu_state);
        assert_eq!(0xAB, address_space.read_address_u8(0x4000, &ppu_state));
    }

    #[test]
    fn cgb_vram_banks() {
        let mut address_space = test_address_space(0x00, 0x80);
        let ppu_state = vblank_ppu_state(&address_space);

        address_space
            .get_io_registers_mut()
            .write_register(IoRegister::VBK, 0x00);
        address_space.write_address_u8(0x8500, 0xCD, &ppu_state);
        assert_eq!(0xCD, address_space.read_address_u8(0x8500, &ppu_state));

        address_space
            .get_io_registers_mut()
            .write_register(IoRegister::VBK, 0x01);
        assert_eq!(0x00, address_space.read_address_u8(0x8500, &ppu_state));

        address_space.write_address_u8(0x8500, 0xEF, &ppu_state);
        assert_eq!(0xEF, address_space.read_address_u8(0x8500, &ppu_state));

        // Only bit 0 of VBK is significant
        address_space
            .get_io_registers_mut()
            .write_register(IoRegister::VBK, 0xFE);
        assert_eq!(0xCD, address_space.read_address_u8(0x8500, &ppu_state));
    }

    #[test]
    fn cgb_working_ram_banks() {
        let mut address_space = test_address_space(0x00, 0x80);
        let ppu_state = vblank_ppu_state(&address_space);

        address_space
            .get_io_registers_mut()
            .write_register(IoRegister::SVBK, 0x00);
        address_space.write_address_u8(0xC500, 0xDE, &ppu_state);
        address_space.write_address_u8(0xD500, 0xCF, &ppu_state);

        // Bank 0 selects bank 1
        address_space
            .get_io_registers_mut()
            .write_register(IoRegister::SVBK, 0x01);
        assert_eq!(0xCF, address_space.read_address_u8(0xD500, &ppu_state));
        assert_eq!(0xDE, address_space.read_address_u8(0xC500, &ppu_state));

        address_space
            .get_io_registers_mut()
            .write_register(IoRegister::SVBK, 0x04);
        assert_eq!(0x00, address_space.read_address_u8(0xD500, &ppu_state));
        address_space.write_address_u8(0xD500, 0x57, &ppu_state);
        assert_eq!(0x57, address_space.read_address_u8(0xD500, &ppu_state));

        address_space
            .get_io_registers_mut()
            .write_register(IoRegister::SVBK, 0x07);
        assert_eq!(0x00, address_space.read_address_u8(0xD500, &ppu_state));

        // Bank 0x1000 region is unbanked
        assert_eq!(0xDE, address_space.read_address_u8(0xC500, &ppu_state));
    }

    #[test]
    fn oam_dma_copies_one_byte_per_cycle() {
        let mut address_space = test_address_space(0x00, 0x00);
        let ppu_state = vblank_ppu_state(&address_space);

        for i in 0..160 {
            address_space.write_address_u8(0xC100 + i, i as u8, &ppu_state);
        }

        address_space.write_address_u8(0xFF46, 0xC1, &ppu_state);

        address_space.step_dma(100);
        assert_eq!(99, address_space.ppu_read_oam(99));
        assert_eq!(0, address_space.ppu_read_oam(100));

        address_space.step_dma(60);
        for i in 0..160 {
            assert_eq!(i as u8, address_space.ppu_read_oam(i));
        }

        // Transfer is finished; further cycles must not re-copy
        address_space.write_address_u8(0xC100, 0xFF, &ppu_state);
        address_space.step_dma(160);
        assert_eq!(0x00, address_space.ppu_read_oam(0));
    }

    #[test]
    fn save_file_round_trip() {
        let mut ram = vec![0; address::EXTERNAL_RAM_LEN];
        for (i, byte) in ram.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }

        let mut encoded = Vec::new();
        encode_external_ram(&ram, &mut encoded).unwrap();
        assert_eq!(&encoded[..4], &SAVE_MAGIC);

        let decoded = decode_external_ram(&encoded[..]).unwrap();
        assert_eq!(ram, decoded);
    }

    #[test]
    fn save_file_bad_magic() {
        let result = decode_external_ram(&[0x00, 0x01, 0x02, 0x03, 0x04][..]);
        assert!(matches!(result, Err(SaveFileError::BadMagic)));
    }

    #[test]
    fn cartridge_title() {
        let mut rom = test_rom(0x00, 0x00);
        rom[address::TITLE_START..address::TITLE_START + 10].copy_from_slice(b"Some Game\0");
        let cartridge = Cartridge::new(rom).unwrap();

        assert_eq!("Some Game", cartridge.title());
        // Word-initial characters keep their case in the save stem
        assert_eq!("Some Game", cartridge.save_file_stem());
    }

    #[test]
    fn save_file_stem_lowercases_within_words() {
        let mut rom = test_rom(0x00, 0x00);
        rom[address::TITLE_START..address::TITLE_START + 8].copy_from_slice(b"foo BAR\0");
        let cartridge = Cartridge::new(rom).unwrap();

        assert_eq!("foo BAR", cartridge.title());
        assert_eq!("foo Bar", cartridge.save_file_stem());
    }

    #[test]
    fn truncated_rom_rejected() {
        assert!(matches!(
            Cartridge::new(vec![0; 0x100]),
            Err(CartridgeLoadError::HeaderTooShort { .. })
        ));
    }

    #[test]
    fn unsupported_mapper_rejected() {
        let rom = test_rom(0x20, 0x00);
        assert!(matches!(
            Cartridge::new(rom),
            Err(CartridgeLoadError::UnsupportedMapper { mapper_byte: 0x20 })
        ));
    }
}
