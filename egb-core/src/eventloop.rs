use crate::apu::ApuState;
use crate::audio::AudioError;
use crate::cpu::instructions::ParseError;
use crate::cpu::{instructions, CgbSpeedMode, CpuRegisters, InterruptType};
use crate::graphics::GraphicsError;
use crate::input::JoypadState;
use crate::memory::AddressSpace;
use crate::ppu::{PpuMode, PpuState};
use crate::startup::{EmulationState, SdlState};
use crate::timer::SystemTimer;
use crate::{apu, audio, cpu, graphics, input, ppu, RunConfig};
use sdl2::event::Event;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("error parsing CPU instruction: {source}")]
    InstructionParse {
        #[from]
        source: ParseError,
    },
    #[error("rendering error: {source}")]
    Rendering {
        #[from]
        source: GraphicsError,
    },
    #[error("audio playback error: {source}")]
    AudioPlayback {
        #[from]
        source: AudioError,
    },
}

const CLOCK_RATE: u64 = 4_194_304;
const CYCLES_PER_FRAME: u64 = 70224;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

// Below this margin the pacing loop spins instead of sleeping
const SPIN_THRESHOLD: Duration = Duration::from_millis(1);

/// Run the emulator until the window is closed or an error occurs.
///
/// This is the unified system clock loop: each iteration executes one CPU
/// instruction (or interrupt dispatch), then advances the timer, OAM DMA, PPU
/// and APU by the consumed cycles. Events and audio are serviced once per
/// emulated frame, and the loop paces itself against the wall clock unless
/// uncapped speed was requested.
pub fn run(
    emulation_state: EmulationState,
    sdl_state: SdlState,
    run_config: &RunConfig,
) -> Result<(), RunError> {
    log::info!("Running with config:\n{run_config}");

    let EmulationState {
        mut address_space,
        mut cpu_registers,
        mut ppu_state,
        mut apu_state,
        save_path,
    } = emulation_state;

    // Subsystem handles stay alive until the function returns
    let SdlState {
        audio_playback_queue,
        mut canvas,
        mut event_pump,
        ..
    } = sdl_state;

    let texture_creator = canvas.texture_creator();
    let mut texture = graphics::create_frame_texture(&texture_creator)?;

    let mut joypad_state = JoypadState::new();
    let mut timer = SystemTimer::new();

    let mut total_cycles = 0_u64;
    let mut leftover_cycles = 0_u32;

    // Fixed-point pacing: nanoseconds owed = pacing_remainder / CLOCK_RATE
    let mut target_time = Instant::now();
    let mut pacing_remainder = 0_u64;

    let mut speed_window_start = Instant::now();
    let mut speed_window_cycles = 0_u64;

    loop {
        input::update_joyp_register(&joypad_state, address_space.get_io_registers_mut());

        // Batch CPU execution into multiples of 4 cycles in the 4MHz domain;
        // in double speed mode two CPU cycles cost one 4MHz cycle
        let mut cycles_required = leftover_cycles;
        while cycles_required < 4 {
            let tick_cycles = tick_cpu(&mut address_space, &mut cpu_registers, &ppu_state, run_config)?;
            cycles_required += match cpu_registers.cgb_speed_mode {
                CgbSpeedMode::Normal => tick_cycles,
                CgbSpeedMode::Double => tick_cycles / 2,
            };
        }
        leftover_cycles = cycles_required % 4;
        let cycles_required = cycles_required - leftover_cycles;

        // Timer and OAM DMA run in the CPU clock domain and speed up with it
        let cpu_domain_cycles = match cpu_registers.cgb_speed_mode {
            CgbSpeedMode::Normal => cycles_required,
            CgbSpeedMode::Double => 2 * cycles_required,
        };
        timer.tick(address_space.get_io_registers_mut(), cpu_domain_cycles);
        address_space.step_dma(cpu_domain_cycles);

        let prev_mode = ppu_state.mode();
        let prev_enabled = ppu_state.enabled();
        for _ in (0..cycles_required).step_by(4) {
            ppu::tick_m_cycle(&mut ppu_state, &mut address_space);
            apu::tick_m_cycle(&mut apu_state, address_space.get_io_registers_mut());
        }

        // Entering VBlank means the frame is complete; a display disable
        // presents the blanked frame
        if (prev_mode != PpuMode::VBlank && ppu_state.mode() == PpuMode::VBlank)
            || (prev_enabled && !ppu_state.enabled())
        {
            graphics::render_frame(&ppu_state, &mut canvas, &mut texture)?;
        }

        // Service host events and audio roughly once per frame time
        if total_cycles / CYCLES_PER_FRAME
            != (total_cycles + u64::from(cycles_required)) / CYCLES_PER_FRAME
        {
            match &audio_playback_queue {
                Some(audio_queue) => {
                    audio::push_samples(audio_queue, &mut apu_state, !run_config.uncapped_speed)?;
                }
                None => {
                    // No device; drop the buffered samples
                    apu_state.take_samples();
                }
            }

            for event in event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } => {
                        log::info!("Quit requested, exiting main loop");
                        persist_save(&address_space, save_path.as_deref());
                        return Ok(());
                    }
                    Event::KeyDown {
                        keycode: Some(keycode),
                        ..
                    } => {
                        if joypad_state.key_down(keycode) {
                            address_space
                                .get_io_registers_mut()
                                .interrupt_flags()
                                .set(InterruptType::Joypad);
                        }
                    }
                    Event::KeyUp {
                        keycode: Some(keycode),
                        ..
                    } => {
                        joypad_state.key_up(keycode);
                    }
                    _ => {}
                }
            }

            if run_config.speed_report {
                let elapsed = speed_window_start.elapsed();
                if elapsed >= Duration::from_secs(1) {
                    let speed = speed_window_cycles as f64 / CLOCK_RATE as f64
                        / elapsed.as_secs_f64()
                        * 100.0;
                    log::info!("emulation speed: {speed:.1}%");
                    speed_window_start = Instant::now();
                    speed_window_cycles = 0;
                }
            }
        }

        total_cycles += u64::from(cycles_required);
        speed_window_cycles += u64::from(cycles_required);

        if !run_config.uncapped_speed {
            pacing_remainder += u64::from(cycles_required) * NANOS_PER_SECOND;
            target_time += Duration::from_nanos(pacing_remainder / CLOCK_RATE);
            pacing_remainder %= CLOCK_RATE;

            let now = Instant::now();
            if target_time > now {
                let ahead = target_time - now;
                if ahead > SPIN_THRESHOLD {
                    std::thread::sleep(ahead - SPIN_THRESHOLD);
                }
                while Instant::now() < target_time {
                    std::hint::spin_loop();
                }
            } else if now - target_time > Duration::from_millis(100) {
                // Fell far behind (debugger pause, window drag); don't sprint
                // to catch up
                target_time = now;
            }
        }
    }
}

fn persist_save(address_space: &AddressSpace, save_path: Option<&std::path::Path>) {
    if let Some(save_path) = save_path {
        if let Err(err) = address_space.cartridge().persist_save_file(save_path) {
            log::error!("failed to write save file {}: {err}", save_path.display());
        }
    }
}

/// Execute one CPU step: service a pending interrupt if possible, wake or
/// idle a halted CPU, or decode and execute the next instruction. Returns the
/// number of T-cycles consumed.
fn tick_cpu(
    address_space: &mut AddressSpace,
    cpu_registers: &mut CpuRegisters,
    ppu_state: &PpuState,
    run_config: &RunConfig,
) -> Result<u32, RunError> {
    if cpu::interrupt_triggered(cpu_registers, address_space) {
        return Ok(cpu::execute_interrupt_service_routine(
            cpu_registers,
            address_space,
            ppu_state,
        ));
    }

    if cpu_registers.halted {
        // A pending interrupt wakes the CPU even with IME cleared
        if cpu::interrupt_pending_ignoring_ime(address_space) {
            cpu_registers.halted = false;
        }
        return Ok(4);
    }

    if run_config.breakpoints.contains(&cpu_registers.pc) {
        log::info!("breakpoint hit at {:04X}", cpu_registers.pc);
    }

    let (instruction, pc) =
        instructions::parse_next_instruction(address_space, cpu_registers.pc, ppu_state)?;

    if run_config.verbose_trace {
        log::trace!(
            "{:04X}: {instruction:02X?} (registers: {cpu_registers:02X?})",
            cpu_registers.pc
        );
    }

    cpu_registers.pc = pc;

    let cycles_required = instruction.cycles_required(cpu_registers);
    instruction.execute(address_space, cpu_registers, ppu_state);

    Ok(cycles_required)
}
