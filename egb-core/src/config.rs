use std::fmt::Formatter;

const DEFAULT_WINDOW_SCALE: u32 = 4;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub rom_file_path: String,
    /// Reserve space for the host debug overlay (the overlay itself is drawn
    /// by an external surface)
    pub debug_overlay: bool,
    /// Log every executed instruction at trace level
    pub verbose_trace: bool,
    /// Log the measured emulation speed once per second
    pub speed_report: bool,
    /// Run uncapped instead of pacing to the emulated clock rate
    pub uncapped_speed: bool,
    pub breakpoints: Vec<u16>,
    pub audio_enabled: bool,
    pub window_scale: u32,
}

impl RunConfig {
    pub fn new(rom_file_path: String) -> Self {
        Self {
            rom_file_path,
            debug_overlay: false,
            verbose_trace: false,
            speed_report: false,
            uncapped_speed: false,
            breakpoints: Vec::new(),
            audio_enabled: true,
            window_scale: DEFAULT_WINDOW_SCALE,
        }
    }
}

impl std::fmt::Display for RunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "rom_file_path: {}", self.rom_file_path)?;
        writeln!(f, "debug_overlay: {}", self.debug_overlay)?;
        writeln!(f, "verbose_trace: {}", self.verbose_trace)?;
        writeln!(f, "speed_report: {}", self.speed_report)?;
        writeln!(f, "uncapped_speed: {}", self.uncapped_speed)?;
        let breakpoints: Vec<String> = self
            .breakpoints
            .iter()
            .map(|pc| format!("{pc:04X}"))
            .collect();
        writeln!(f, "breakpoints: [{}]", breakpoints.join(", "))?;
        writeln!(f, "audio_enabled: {}", self.audio_enabled)?;
        writeln!(f, "window_scale: {}", self.window_scale)?;

        Ok(())
    }
}
