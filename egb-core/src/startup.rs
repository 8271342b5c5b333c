use crate::apu::ApuState;
use crate::config::RunConfig;
use crate::cpu::CpuRegisters;
use crate::graphics::GraphicsError;
use crate::memory::{AddressSpace, Cartridge, CartridgeLoadError, SAVE_FILE_EXTENSION};
use crate::ppu::PpuState;
use crate::{audio, graphics, ppu};
use sdl2::audio::AudioQueue;
use sdl2::event::EventType;
use sdl2::render::WindowCanvas;
use sdl2::video::WindowBuildError;
use sdl2::{AudioSubsystem, EventPump, Sdl, VideoSubsystem};
use std::path::PathBuf;
use thiserror::Error;

// Window width reserved for the external debug overlay surface
const DEBUG_OVERLAY_WIDTH: u32 = 256;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("SDL2 error: {sdl_error}")]
    GenericSdl { sdl_error: String },
    #[error("error building SDL2 window: {source}")]
    WindowBuild {
        #[from]
        source: WindowBuildError,
    },
    #[error("error creating SDL2 renderer: {source}")]
    Renderer {
        #[from]
        source: GraphicsError,
    },
}

impl From<String> for PlatformError {
    fn from(value: String) -> Self {
        Self::GenericSdl { sdl_error: value }
    }
}

pub struct EmulationState {
    pub address_space: AddressSpace,
    pub cpu_registers: CpuRegisters,
    pub ppu_state: PpuState,
    pub apu_state: ApuState,
    pub save_path: Option<PathBuf>,
}

pub struct SdlState {
    pub sdl: Sdl,
    pub video: VideoSubsystem,
    pub audio: AudioSubsystem,
    pub audio_playback_queue: Option<AudioQueue<i8>>,
    pub canvas: WindowCanvas,
    pub event_pump: EventPump,
}

/// Load the cartridge (and its save file, if any) and build the power-on
/// machine state.
pub fn init_emulation_state(run_config: &RunConfig) -> Result<EmulationState, CartridgeLoadError> {
    let mut cartridge = Cartridge::from_file(&run_config.rom_file_path)?;

    let save_path = determine_save_path(&cartridge);
    if let Some(save_path) = &save_path {
        cartridge.load_save_file(save_path);
    }

    let execution_mode = cartridge.execution_mode();
    log::info!("Running in {execution_mode:?} mode");

    Ok(EmulationState {
        cpu_registers: CpuRegisters::new(execution_mode),
        ppu_state: PpuState::new(execution_mode),
        apu_state: ApuState::new(),
        address_space: AddressSpace::new(cartridge),
        save_path,
    })
}

// Save files live in the platform preference directory, named after the
// lowercased cartridge title
fn determine_save_path(cartridge: &Cartridge) -> Option<PathBuf> {
    if !cartridge.has_battery() {
        return None;
    }

    let stem = cartridge.save_file_stem();
    if stem.is_empty() {
        return None;
    }

    match sdl2::filesystem::pref_path("eae", "egb") {
        Ok(pref_dir) => Some(PathBuf::from(pref_dir).join(format!("{stem}.{SAVE_FILE_EXTENSION}"))),
        Err(err) => {
            log::warn!("unable to determine save directory, saves disabled: {err}");
            None
        }
    }
}

/// Initialize SDL: window, renderer, event pump, and (if enabled) the audio
/// queue. An audio device failure is not fatal; the emulator runs silent.
pub fn init_sdl_state(
    run_config: &RunConfig,
    window_title: &str,
) -> Result<SdlState, PlatformError> {
    let sdl = sdl2::init()?;
    let video = sdl.video()?;
    let audio = sdl.audio()?;

    let window_width = ppu::SCREEN_WIDTH as u32 * run_config.window_scale
        + if run_config.debug_overlay {
            DEBUG_OVERLAY_WIDTH
        } else {
            0
        };
    let window_height = ppu::SCREEN_HEIGHT as u32 * run_config.window_scale;

    let window = video
        .window(window_title, window_width, window_height)
        .position_centered()
        .build()?;

    let canvas = graphics::create_renderer(window, !run_config.uncapped_speed)?;

    let mut event_pump = sdl.event_pump()?;
    event_pump.disable_event(EventType::MouseMotion);

    let audio_playback_queue = if run_config.audio_enabled {
        match audio::initialize(&audio) {
            Ok(queue) => Some(queue),
            Err(err) => {
                log::warn!("failed to open audio device, continuing without audio: {err}");
                None
            }
        }
    } else {
        None
    };

    Ok(SdlState {
        sdl,
        video,
        audio,
        audio_playback_queue,
        canvas,
        event_pump,
    })
}
