use crate::cpu::{ExecutionMode, InterruptType};
use crate::memory::ioregisters::{IoRegister, IoRegisters};
use crate::memory::AddressSpace;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

/// One 15-bit RGB555 color per screen pixel. Monochrome shades are resolved
/// to RGB555 as well so that the output path is shared with color mode.
pub type FrameBuffer = [[u16; SCREEN_WIDTH]; SCREEN_HEIGHT];

const OAM_SCAN_CYCLES: u32 = 80;
const PIXEL_TRANSFER_CYCLES: u32 = 172;
const LINE_CYCLES: u32 = 456;

const VBLANK_START_LINE: u8 = 144;
const LAST_LINE: u8 = 153;

const OAM_SPRITE_COUNT: usize = 40;
const MAX_SPRITES_PER_LINE: usize = 10;

const SPRITE_ATTR_BEHIND_BG: u8 = 0x80;
const SPRITE_ATTR_Y_FLIP: u8 = 0x40;
const SPRITE_ATTR_X_FLIP: u8 = 0x20;
const SPRITE_ATTR_DMG_PALETTE: u8 = 0x10;
const SPRITE_ATTR_VRAM_BANK: u8 = 0x08;
const SPRITE_ATTR_CGB_PALETTE_MASK: u8 = 0x07;

const BG_ATTR_PRIORITY: u8 = 0x80;
const BG_ATTR_Y_FLIP: u8 = 0x40;
const BG_ATTR_X_FLIP: u8 = 0x20;
const BG_ATTR_VRAM_BANK: u8 = 0x08;
const BG_ATTR_CGB_PALETTE_MASK: u8 = 0x07;

const MONOCHROME_COLORS: [u16; 4] = [0x7FFF, 0x5294, 0x294A, 0x0000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpuMode {
    HBlank,
    VBlank,
    ScanningOam,
    RenderingScanline,
}

impl PpuMode {
    fn stat_bits(self) -> u8 {
        match self {
            Self::HBlank => 0,
            Self::VBlank => 1,
            Self::ScanningOam => 2,
            Self::RenderingScanline => 3,
        }
    }
}

pub struct PpuState {
    execution_mode: ExecutionMode,
    enabled: bool,
    mode: PpuMode,
    scanline: u8,
    line_clock: u32,
    frame_buffer: Box<FrameBuffer>,
}

impl PpuState {
    pub fn new(execution_mode: ExecutionMode) -> Self {
        Self {
            execution_mode,
            enabled: true,
            mode: PpuMode::ScanningOam,
            scanline: 0,
            line_clock: 0,
            frame_buffer: Box::new([[0; SCREEN_WIDTH]; SCREEN_HEIGHT]),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_in_mode(execution_mode: ExecutionMode, mode: PpuMode) -> Self {
        Self {
            mode,
            ..Self::new(execution_mode)
        }
    }

    pub fn mode(&self) -> PpuMode {
        self.mode
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The line currently being processed (the LY register value), in
    /// [0, 153].
    pub fn ly(&self) -> u8 {
        self.scanline
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }
}

/// Advance the PPU by one M-cycle (4 T-cycles).
///
/// Each visible line steps through OAM scan (mode 2, 80 cycles), pixel
/// transfer (mode 3, a fixed 172-cycle budget) and HBlank (mode 0) until the
/// line total reaches 456 cycles; lines 144-153 are VBlank (mode 1). The
/// whole scanline is composited from a register snapshot on entry to mode 3.
pub fn tick_m_cycle(ppu_state: &mut PpuState, address_space: &mut AddressSpace) {
    let lcdc = address_space
        .get_io_registers()
        .read_register(IoRegister::LCDC);

    if lcdc & 0x80 == 0 {
        if ppu_state.enabled {
            // Display switched off: emit a blank frame and hold LY at 0
            let bgp = address_space
                .get_io_registers()
                .read_register(IoRegister::BGP);
            let blank_color = resolve_monochrome_color(3, bgp);
            for scanline in ppu_state.frame_buffer.iter_mut() {
                scanline.fill(blank_color);
            }

            ppu_state.enabled = false;
            ppu_state.mode = PpuMode::HBlank;
            ppu_state.scanline = 0;
            ppu_state.line_clock = 0;

            sync_ppu_registers(ppu_state, address_space.get_io_registers_mut());
        }
        return;
    }

    if !ppu_state.enabled {
        // Display switched back on: restart from the top of the frame
        ppu_state.enabled = true;
        ppu_state.mode = PpuMode::ScanningOam;
        ppu_state.scanline = 0;
        ppu_state.line_clock = 0;
    }

    ppu_state.line_clock += 4;

    if ppu_state.mode == PpuMode::ScanningOam && ppu_state.line_clock >= OAM_SCAN_CYCLES {
        render_scanline(ppu_state, address_space);
        ppu_state.mode = PpuMode::RenderingScanline;
    } else if ppu_state.mode == PpuMode::RenderingScanline
        && ppu_state.line_clock >= OAM_SCAN_CYCLES + PIXEL_TRANSFER_CYCLES
    {
        ppu_state.mode = PpuMode::HBlank;
        request_stat_interrupt(address_space.get_io_registers_mut(), 3);
    } else if ppu_state.line_clock >= LINE_CYCLES {
        ppu_state.line_clock -= LINE_CYCLES;
        ppu_state.scanline = if ppu_state.scanline == LAST_LINE {
            0
        } else {
            ppu_state.scanline + 1
        };

        let io_registers = address_space.get_io_registers_mut();
        if ppu_state.scanline == VBLANK_START_LINE {
            ppu_state.mode = PpuMode::VBlank;
            io_registers.interrupt_flags().set(InterruptType::VBlank);
            request_stat_interrupt(io_registers, 4);
        } else if ppu_state.scanline < VBLANK_START_LINE {
            ppu_state.mode = PpuMode::ScanningOam;
            request_stat_interrupt(io_registers, 5);
        }

        let lyc = io_registers.read_register(IoRegister::LYC);
        if ppu_state.scanline == lyc {
            request_stat_interrupt(io_registers, 6);
        }
    }

    sync_ppu_registers(ppu_state, address_space.get_io_registers_mut());
}

fn sync_ppu_registers(ppu_state: &PpuState, io_registers: &mut IoRegisters) {
    let lyc = io_registers.read_register(IoRegister::LYC);
    io_registers.privileged_set_ly(ppu_state.scanline);
    io_registers
        .privileged_set_stat_low_bits(ppu_state.mode.stat_bits(), ppu_state.scanline == lyc);
}

fn request_stat_interrupt(io_registers: &mut IoRegisters, source_bit: u8) {
    let stat = io_registers.read_register(IoRegister::STAT);
    if stat & (1 << source_bit) != 0 {
        io_registers.interrupt_flags().set(InterruptType::LcdStatus);
    }
}

#[derive(Debug, Clone, Copy)]
struct LineSprite {
    x: i16,
    tile_index: u8,
    tile_row: u8,
    attributes: u8,
    dmg_palette: u8,
}

/// Collect the sprites overlapping the given line, at most 10, in OAM order.
/// In monochrome mode the selected sprites are stable-sorted by X ascending;
/// rendering draws them back to front so a lower X ends up on top.
fn select_line_sprites(
    address_space: &AddressSpace,
    line: u8,
    tall_sprites: bool,
    monochrome: bool,
    attr_mask: u8,
    obp0: u8,
    obp1: u8,
) -> Vec<LineSprite> {
    let line = i16::from(line);
    let height: i16 = if tall_sprites { 16 } else { 8 };

    let mut sprites = Vec::with_capacity(MAX_SPRITES_PER_LINE);
    for i in 0..OAM_SPRITE_COUNT {
        if sprites.len() == MAX_SPRITES_PER_LINE {
            break;
        }

        let y = i16::from(address_space.ppu_read_oam(4 * i)) - 16;
        let x = i16::from(address_space.ppu_read_oam(4 * i + 1)) - 8;
        if x <= -8 || x >= SCREEN_WIDTH as i16 || y <= line - height || y > line {
            continue;
        }

        let mut tile_index = address_space.ppu_read_oam(4 * i + 2);
        let attributes = address_space.ppu_read_oam(4 * i + 3);
        let y_flipped = attributes & SPRITE_ATTR_Y_FLIP != 0;

        if tall_sprites {
            // An 8x16 sprite spans two tiles; flipping swaps which half is on top
            if (y > line - 8) != y_flipped {
                tile_index &= 0xFE;
            } else {
                tile_index |= 0x01;
            }
        }

        let row = if y_flipped {
            height - 1 - (line - y)
        } else {
            line - y
        };

        sprites.push(LineSprite {
            x,
            tile_index,
            tile_row: (row % 8) as u8,
            attributes: attributes & attr_mask,
            dmg_palette: if attributes & SPRITE_ATTR_DMG_PALETTE != 0 {
                obp1
            } else {
                obp0
            },
        });
    }

    if monochrome {
        sprites.sort_by_key(|sprite| sprite.x);
    }

    sprites
}

// Returns (transparent, resolved color)
fn sample_sprite(
    address_space: &AddressSpace,
    sprite: &LineSprite,
    x: u8,
    cgb: bool,
) -> (bool, u16) {
    let vram_bank = usize::from(cgb && sprite.attributes & SPRITE_ATTR_VRAM_BANK != 0);

    let source_x = if sprite.attributes & SPRITE_ATTR_X_FLIP != 0 {
        7 - x
    } else {
        x
    };
    let color_index = tile_pixel(
        address_space,
        vram_bank,
        usize::from(sprite.tile_index) * 16,
        source_x,
        sprite.tile_row,
    );

    let color = if cgb {
        resolve_cgb_color(
            address_space.get_io_registers().obj_palette_ram(),
            sprite.attributes & SPRITE_ATTR_CGB_PALETTE_MASK,
            color_index,
        )
    } else {
        resolve_monochrome_color(color_index, sprite.dmg_palette)
    };

    (color_index == 0, color)
}

fn tile_pixel(
    address_space: &AddressSpace,
    vram_bank: usize,
    tile_data_offset: usize,
    x: u8,
    y: u8,
) -> u8 {
    let low_byte = address_space.ppu_read_vram(vram_bank, tile_data_offset + 2 * usize::from(y));
    let high_byte =
        address_space.ppu_read_vram(vram_bank, tile_data_offset + 2 * usize::from(y) + 1);

    ((low_byte >> (7 - x)) & 0x01) | (((high_byte >> (7 - x)) & 0x01) << 1)
}

fn resolve_monochrome_color(color_index: u8, palette: u8) -> u16 {
    MONOCHROME_COLORS[usize::from((palette >> (2 * color_index)) & 0x03)]
}

fn resolve_cgb_color(palette_ram: &[u8; 64], palette_index: u8, color_index: u8) -> u16 {
    let offset = 8 * usize::from(palette_index) + 2 * usize::from(color_index);
    u16::from_le_bytes([palette_ram[offset], palette_ram[offset + 1]])
}

/// Composite one full scanline into the frame buffer from a snapshot of the
/// rendering registers.
///
/// Pass order: sprites flagged behind-background (back to front), then the
/// background and window tiles, then the remaining sprites on top.
fn render_scanline(ppu_state: &mut PpuState, address_space: &AddressSpace) {
    let io_registers = address_space.get_io_registers();

    let line = ppu_state.scanline;
    let cgb = ppu_state.execution_mode == ExecutionMode::GameBoyColor;

    let lcdc = io_registers.read_register(IoRegister::LCDC);
    let scx = io_registers.read_register(IoRegister::SCX);
    let scy = io_registers.read_register(IoRegister::SCY);
    let wx = io_registers.read_register(IoRegister::WX);
    let wy = io_registers.read_register(IoRegister::WY);
    let bgp = io_registers.read_register(IoRegister::BGP);
    let obp0 = io_registers.read_register(IoRegister::OBP0);
    let obp1 = io_registers.read_register(IoRegister::OBP1);

    let render_sprites = lcdc & 0x02 != 0;
    let render_window = lcdc & 0x20 != 0;
    let tile_data_unsigned = lcdc & 0x10 != 0;
    let mut render_background = lcdc & 0x01 != 0;

    // In color mode, clearing LCDC bit 0 demotes background priority instead
    // of hiding the background: sprites lose their behind-background flag
    let mut sprite_attr_mask = 0xFF;
    if cgb && !render_background {
        sprite_attr_mask = !SPRITE_ATTR_BEHIND_BG;
        render_background = true;
    }

    let bg_tile_map_offset: usize = if lcdc & 0x08 != 0 { 0x1C00 } else { 0x1800 };
    let window_tile_map_offset: usize = if lcdc & 0x40 != 0 { 0x1C00 } else { 0x1800 };

    let sprites = if render_sprites {
        select_line_sprites(
            address_space,
            line,
            lcdc & 0x04 != 0,
            !cgb,
            sprite_attr_mask,
            obp0,
            obp1,
        )
    } else {
        Vec::new()
    };

    let mut pixels = [0_u16; SCREEN_WIDTH];
    let mut has_bg_sprite = [false; SCREEN_WIDTH];

    // Behind-background sprites
    for sprite in sprites
        .iter()
        .rev()
        .filter(|sprite| sprite.attributes & SPRITE_ATTR_BEHIND_BG != 0)
    {
        for x in 0..8 {
            let dst = sprite.x + i16::from(x);
            if (0..SCREEN_WIDTH as i16).contains(&dst) {
                let (_, color) = sample_sprite(address_space, sprite, x, cgb);
                pixels[dst as usize] = color;
                has_bg_sprite[dst as usize] = true;
            }
        }
    }

    // Background and window
    let mut render_tile_map_pixel = |pixels: &mut [u16; SCREEN_WIDTH],
                                     tile_map_offset: usize,
                                     dst_x: usize,
                                     src_x: u8,
                                     src_y: u8| {
        let tile_map_index =
            tile_map_offset + 32 * usize::from(src_y / 8) + usize::from(src_x / 8);
        let tile_index = address_space.ppu_read_vram(0, tile_map_index);
        let tile_attributes = if cgb {
            address_space.ppu_read_vram(1, tile_map_index)
        } else {
            0x00
        };

        let tile_data_offset = if tile_data_unsigned {
            usize::from(tile_index) * 16
        } else {
            (0x1000 + 16 * i32::from(tile_index as i8)) as usize
        };

        let mut pixel_x = src_x % 8;
        if tile_attributes & BG_ATTR_X_FLIP != 0 {
            pixel_x = 7 - pixel_x;
        }
        let mut pixel_y = src_y % 8;
        if tile_attributes & BG_ATTR_Y_FLIP != 0 {
            pixel_y = 7 - pixel_y;
        }

        let vram_bank = usize::from(tile_attributes & BG_ATTR_VRAM_BANK != 0);
        let color_index = tile_pixel(address_space, vram_bank, tile_data_offset, pixel_x, pixel_y);

        // A color-0 background pixel shows a behind-background sprite through;
        // the priority attribute puts the tile in front regardless
        if color_index != 0
            || !has_bg_sprite[dst_x]
            || tile_attributes & BG_ATTR_PRIORITY != 0
        {
            pixels[dst_x] = if cgb {
                resolve_cgb_color(
                    io_registers.bg_palette_ram(),
                    tile_attributes & BG_ATTR_CGB_PALETTE_MASK,
                    color_index,
                )
            } else {
                resolve_monochrome_color(color_index, bgp)
            };
        }
    };

    if render_background {
        let src_y = line.wrapping_add(scy);
        for dst_x in 0..SCREEN_WIDTH {
            let src_x = (dst_x as u8).wrapping_add(scx);
            render_tile_map_pixel(&mut pixels, bg_tile_map_offset, dst_x, src_x, src_y);
        }
    }

    if render_window && line >= wy {
        let window_x = i16::from(wx) - 7;
        let src_y = line - wy;
        for dst_x in window_x.max(0)..SCREEN_WIDTH as i16 {
            let src_x = (dst_x - window_x) as u8;
            render_tile_map_pixel(&mut pixels, window_tile_map_offset, dst_x as usize, src_x, src_y);
        }
    }

    // Foreground sprites
    for sprite in sprites
        .iter()
        .rev()
        .filter(|sprite| sprite.attributes & SPRITE_ATTR_BEHIND_BG == 0)
    {
        for x in 0..8 {
            let dst = sprite.x + i16::from(x);
            if (0..SCREEN_WIDTH as i16).contains(&dst) {
                let (transparent, color) = sample_sprite(address_space, sprite, x, cgb);
                if !transparent {
                    pixels[dst as usize] = color;
                }
            }
        }
    }

    ppu_state.frame_buffer[usize::from(line)] = pixels;
}
