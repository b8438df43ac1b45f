use minifb::{Key, Scale, Window, WindowOptions};

use crate::framebuffer::{HEIGHT, WIDTH};

/// The scaled-up desktop window the framebuffer is presented in.
pub struct Display {
    window: Window,
}

impl Display {
    pub fn new(title: &str, scale: u32) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            title,
            WIDTH,
            HEIGHT,
            WindowOptions {
                scale: scale_factor(scale),
                ..WindowOptions::default()
            },
        )?;
        // Limit to max ~60 fps update rate
        window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));
        Ok(Self { window })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    /// Upload the packed-pixel buffer. Lit cells are all-bits-set, which the
    /// window renders white with no conversion step.
    pub fn present(&mut self, pixels: &[u32]) -> Result<(), minifb::Error> {
        self.window.update_with_buffer(pixels, WIDTH, HEIGHT)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

fn scale_factor(scale: u32) -> Scale {
    match scale {
        1 => Scale::X1,
        2 => Scale::X2,
        4 => Scale::X4,
        8 => Scale::X8,
        16 => Scale::X16,
        32 => Scale::X32,
        other => {
            log::warn!("unsupported scale factor {other}, using 16");
            Scale::X16
        }
    }
}
