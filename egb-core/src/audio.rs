use crate::apu;
use crate::apu::ApuState;
use sdl2::audio::{AudioQueue, AudioSpecDesired};
use sdl2::AudioSubsystem;
use std::thread;
use std::time::Duration;
use thiserror::Error;

const AUDIO_QUEUE_SIZE: u32 = 1024;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("error pushing audio samples to device sample queue: {msg}")]
    Playback { msg: String },
}

pub fn initialize(audio_subsystem: &AudioSubsystem) -> Result<AudioQueue<i8>, String> {
    let queue = audio_subsystem.open_queue(
        None,
        &AudioSpecDesired {
            freq: Some(apu::OUTPUT_FREQUENCY as i32),
            channels: Some(2),
            samples: Some(AUDIO_QUEUE_SIZE as u16),
        },
    )?;
    queue.resume();

    Ok(queue)
}

/// Push buffered APU samples to the playback queue.
///
/// If the device queue is full and sync_to_audio is set, blocks until the
/// device has drained enough to accept more; this is what paces the emulator
/// to real time when audio sync is on.
pub fn push_samples(
    device_queue: &AudioQueue<i8>,
    apu_state: &mut ApuState,
    sync_to_audio: bool,
) -> Result<(), AudioError> {
    // size() is in bytes: 2 channels * 1 byte per sample
    while device_queue.size() >= 2 * AUDIO_QUEUE_SIZE {
        if !sync_to_audio {
            break;
        }

        thread::sleep(Duration::from_micros(250));
    }

    let samples = apu_state.take_samples();
    device_queue
        .queue_audio(&samples)
        .map_err(|msg| AudioError::Playback { msg })?;

    Ok(())
}
