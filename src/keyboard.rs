use minifb::{Key, Window};

/// Latched state of the 16-key hex pad. The shell rewrites the latches
/// between cycles; the interpreter only reads them.
pub struct Keypad {
    keys: [bool; 16],
}

impl Keypad {
    pub fn new() -> Self {
        Self { keys: [false; 16] }
    }

    pub fn reset(&mut self) {
        self.keys = [false; 16];
    }

    pub fn latch_all(&mut self, keys: [bool; 16]) {
        self.keys = keys;
    }

    pub fn latch(&mut self, key: u8, pressed: bool) {
        debug_assert!(key < 16);
        self.keys[key as usize] = pressed;
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        debug_assert!(key < 16);
        self.keys[key as usize]
    }

    /// Lowest set latch wins when several keys are held at once.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&held| held).map(|i| i as u8)
    }
}

// Hex pad value -> physical key, the usual 1234/QWER/ASDF/ZXCV layout:
//
//   1 2 3 C        1 2 3 4
//   4 5 6 D   ->   Q W E R
//   7 8 9 E        A S D F
//   A 0 B F        Z X C V
const KEY_MAP: [Key; 16] = [
    Key::X,    // 0
    Key::Key1, // 1
    Key::Key2, // 2
    Key::Key3, // 3
    Key::Q,    // 4
    Key::W,    // 5
    Key::E,    // 6
    Key::A,    // 7
    Key::S,    // 8
    Key::D,    // 9
    Key::Z,    // A
    Key::C,    // B
    Key::Key4, // C
    Key::R,    // D
    Key::F,    // E
    Key::V,    // F
];

/// Snapshot the window's key state into hex pad latches.
pub fn scan(window: &Window) -> [bool; 16] {
    let mut keys = [false; 16];
    for (value, key) in KEY_MAP.iter().enumerate() {
        keys[value] = window.is_key_down(*key);
    }
    keys
}
