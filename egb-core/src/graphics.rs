use crate::ppu;
use crate::ppu::PpuState;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::render::{Texture, TextureCreator, WindowCanvas};
use sdl2::video::{Window, WindowContext};
use sdl2::IntegerOrSdlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphicsError {
    #[error("error creating renderer: {source}")]
    CreateRenderer {
        #[from]
        source: IntegerOrSdlError,
    },
    #[error("error creating frame texture: {source}")]
    CreateTexture {
        #[from]
        source: sdl2::render::TextureValueError,
    },
    #[error("error updating frame texture: {msg}")]
    Texture { msg: String },
    #[error("error copying frame texture to renderer: {msg}")]
    CopyToCanvas { msg: String },
}

// Expand a 5-bit channel to 8 bits: ((c + 1) * 8) - 1
fn expand_color_channel(channel: u16) -> u8 {
    ((channel + 1) * 8 - 1) as u8
}

/// Create an SDL2 renderer from the given window, with VSync enabled unless
/// the emulator is running uncapped.
pub fn create_renderer(
    window: Window,
    vsync_enabled: bool,
) -> Result<WindowCanvas, GraphicsError> {
    let mut canvas_builder = window.into_canvas().accelerated();
    if vsync_enabled {
        canvas_builder = canvas_builder.present_vsync();
    }
    let mut canvas = canvas_builder.build()?;

    canvas.set_draw_color(Color::RGB(0, 0, 0));
    canvas.clear();
    canvas.present();

    Ok(canvas)
}

pub fn create_frame_texture(
    texture_creator: &TextureCreator<WindowContext>,
) -> Result<Texture<'_>, GraphicsError> {
    let texture = texture_creator.create_texture_streaming(
        PixelFormatEnum::RGBA32,
        ppu::SCREEN_WIDTH as u32,
        ppu::SCREEN_HEIGHT as u32,
    )?;
    Ok(texture)
}

/// Render the current frame buffer to the window, overwriting all previously
/// displayed data. With VSync enabled this blocks until the next refresh.
pub fn render_frame(
    ppu_state: &PpuState,
    canvas: &mut WindowCanvas,
    texture: &mut Texture<'_>,
) -> Result<(), GraphicsError> {
    let frame_buffer = ppu_state.frame_buffer();

    texture
        .with_lock(None, |pixels: &mut [u8], pitch: usize| {
            for (i, scanline) in frame_buffer.iter().enumerate() {
                for (j, &color) in scanline.iter().enumerate() {
                    let start = i * pitch + 4 * j;
                    pixels[start] = expand_color_channel(color & 0x001F);
                    pixels[start + 1] = expand_color_channel((color & 0x03E0) >> 5);
                    pixels[start + 2] = expand_color_channel((color & 0x7C00) >> 10);
                    pixels[start + 3] = 255;
                }
            }
        })
        .map_err(|msg| GraphicsError::Texture { msg })?;

    canvas.clear();
    canvas
        .copy(texture, None, None)
        .map_err(|msg| GraphicsError::CopyToCanvas { msg })?;
    canvas.present();

    Ok(())
}
