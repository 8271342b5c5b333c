mod apu;
mod audio;
mod config;
mod cpu;
mod eventloop;
mod graphics;
mod input;
mod memory;
mod ppu;
mod startup;
mod timer;

use thiserror::Error;

pub use config::RunConfig;
pub use eventloop::RunError;
pub use memory::CartridgeLoadError;
pub use startup::PlatformError;

#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error(transparent)]
    Load(#[from] CartridgeLoadError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Runtime(#[from] RunError),
}

/// Load the cartridge, initialize the host platform, and run the emulator
/// until it exits. Battery-backed cartridge RAM is persisted on clean exit.
pub fn run(run_config: &RunConfig) -> Result<(), EmulatorError> {
    let emulation_state = startup::init_emulation_state(run_config)?;

    let cartridge_title = emulation_state.address_space.cartridge().title();
    let window_title = if cartridge_title.is_empty() {
        "egb".into()
    } else {
        format!("{cartridge_title} - egb")
    };

    let sdl_state = startup::init_sdl_state(run_config, &window_title)?;

    eventloop::run(emulation_state, sdl_state, run_config)?;

    Ok(())
}
