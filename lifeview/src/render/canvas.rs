use std::fmt;

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn parse_hex(text: &str) -> Result<Self, String> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color '{}', expected #RRGGBB", text));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|err| format!("invalid color '{}': {}", text, err))
        };

        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 0xff]
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub grid: Color,
    pub dead: Color,
    pub alive: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            grid: Color::rgb(0xcc, 0xcc, 0xcc),
            dead: Color::rgb(0xff, 0xff, 0xff),
            alive: Color::rgb(0x00, 0x00, 0x00),
        }
    }
}

/// CPU-side RGBA8 pixel buffer the rasterizer paints into.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 0xff]; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color.rgba());
    }

    /// Fills a rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Color) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        if x >= x_end || y >= y_end {
            return;
        }

        let rgba = color.rgba();
        for row in y..y_end {
            let start = row as usize * self.width as usize;
            self.pixels[start + x as usize..start + x_end as usize].fill(rgba);
        }
    }

    pub fn hline(&mut self, y: u32, color: Color) {
        self.fill_rect(0, y, self.width, 1, color);
    }

    pub fn vline(&mut self, x: u32, color: Color) {
        self.fill_rect(x, 0, 1, self.height, color);
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Color::parse_hex("#CCCCCC"), Ok(Color::rgb(204, 204, 204)));
        assert_eq!(Color::parse_hex("00ff7f"), Ok(Color::rgb(0, 255, 127)));
        assert!(Color::parse_hex("#ccc").is_err());
        assert!(Color::parse_hex("#gggggg").is_err());
    }

    #[test]
    fn color_display_round_trips_through_parse() {
        let color = Color::rgb(0x12, 0xab, 0xef);
        assert_eq!(color.to_string(), "#12ABEF");
        assert_eq!(Color::parse_hex(&color.to_string()), Ok(color));
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut canvas = Canvas::new(4, 3);
        let red = Color::rgb(255, 0, 0);
        canvas.fill_rect(2, 1, 10, 10, red);

        assert_eq!(canvas.pixel(3, 2), red.rgba());
        assert_eq!(canvas.pixel(1, 2), [0, 0, 0, 0xff]);
        assert_eq!(canvas.pixel(3, 0), [0, 0, 0, 0xff]);
        assert_eq!(canvas.as_bytes().len(), 4 * 3 * 4);
    }
}
