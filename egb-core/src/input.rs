use crate::memory::ioregisters::{IoRegister, IoRegisters};
use sdl2::keyboard::Keycode;

/// Live button state, fed from host keyboard events.
#[derive(Debug, Clone, Default)]
pub struct JoypadState {
    right: bool,
    left: bool,
    up: bool,
    down: bool,
    a: bool,
    b: bool,
    select: bool,
    start: bool,
}

impl JoypadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The 8-bit button mask in the order Right, Left, Up, Down, A, B,
    /// Select, Start; a clear bit means the button is pressed.
    pub fn button_mask(&self) -> u8 {
        let buttons = [
            self.right,
            self.left,
            self.up,
            self.down,
            self.a,
            self.b,
            self.select,
            self.start,
        ];

        let mut mask = 0xFF;
        for (i, pressed) in buttons.into_iter().enumerate() {
            if pressed {
                mask &= !(1 << i);
            }
        }
        mask
    }

    fn button_for_keycode(&mut self, keycode: Keycode) -> Option<&mut bool> {
        match keycode {
            Keycode::Right | Keycode::D => Some(&mut self.right),
            Keycode::Left | Keycode::A => Some(&mut self.left),
            Keycode::Up | Keycode::W => Some(&mut self.up),
            Keycode::Down | Keycode::S => Some(&mut self.down),
            Keycode::Z => Some(&mut self.a),
            Keycode::X => Some(&mut self.b),
            Keycode::LAlt | Keycode::RAlt => Some(&mut self.select),
            Keycode::Space => Some(&mut self.start),
            _ => None,
        }
    }

    /// Record a key press. Returns true if a mapped button went from released
    /// to pressed, which is when the Joypad interrupt should be requested.
    pub fn key_down(&mut self, keycode: Keycode) -> bool {
        match self.button_for_keycode(keycode) {
            Some(button) => {
                let newly_pressed = !*button;
                *button = true;
                newly_pressed
            }
            None => false,
        }
    }

    pub fn key_up(&mut self, keycode: Keycode) {
        if let Some(button) = self.button_for_keycode(keycode) {
            *button = false;
        }
    }
}

/// Recompute the JOYP register from the stored row-select bits and the live
/// button mask. A cleared select bit drives the corresponding button row onto
/// the low nibble (0 = pressed).
pub fn update_joyp_register(joypad_state: &JoypadState, io_registers: &mut IoRegisters) {
    let joyp_value = io_registers.read_register(IoRegister::JOYP);
    let button_mask = joypad_state.button_mask();

    let mut nibble = 0x0F;
    if joyp_value & 0x10 == 0 {
        nibble &= button_mask & 0x0F;
    }
    if joyp_value & 0x20 == 0 {
        nibble &= (button_mask >> 4) & 0x0F;
    }

    io_registers.privileged_set_joyp(0xC0 | (joyp_value & 0x30) | nibble);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::ExecutionMode;

    #[test]
    fn button_mask_bit_order() {
        let mut joypad_state = JoypadState::new();
        assert_eq!(0xFF, joypad_state.button_mask());

        assert!(joypad_state.key_down(Keycode::Right));
        assert_eq!(0xFE, joypad_state.button_mask());

        // Repeated press is not a new press
        assert!(!joypad_state.key_down(Keycode::Right));

        assert!(joypad_state.key_down(Keycode::Z));
        assert_eq!(0xFE & !0x10, joypad_state.button_mask());

        assert!(joypad_state.key_down(Keycode::Space));
        assert_eq!(0xFE & !0x10 & !0x80, joypad_state.button_mask());

        joypad_state.key_up(Keycode::Right);
        joypad_state.key_up(Keycode::Z);
        joypad_state.key_up(Keycode::Space);
        assert_eq!(0xFF, joypad_state.button_mask());
    }

    #[test]
    fn joyp_row_selection() {
        let mut io_registers = IoRegisters::new(ExecutionMode::GameBoy);
        let mut joypad_state = JoypadState::new();

        joypad_state.key_down(Keycode::Left);
        joypad_state.key_down(Keycode::Space);

        // Direction row selected (bit 4 clear)
        io_registers.write_register(IoRegister::JOYP, 0x20);
        update_joyp_register(&joypad_state, &mut io_registers);
        assert_eq!(
            0x0D,
            io_registers.read_register(IoRegister::JOYP) & 0x0F
        );

        // Action row selected (bit 5 clear)
        io_registers.write_register(IoRegister::JOYP, 0x10);
        update_joyp_register(&joypad_state, &mut io_registers);
        assert_eq!(
            0x07,
            io_registers.read_register(IoRegister::JOYP) & 0x0F
        );

        // Neither row selected: the nibble floats high
        io_registers.write_register(IoRegister::JOYP, 0x30);
        update_joyp_register(&joypad_state, &mut io_registers);
        assert_eq!(
            0x0F,
            io_registers.read_register(IoRegister::JOYP) & 0x0F
        );
    }
}
