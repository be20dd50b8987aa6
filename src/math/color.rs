use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Linear RGB colour with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "ColorRepr")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Colour from a 0xRRGGBB literal
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    pub fn to_hex(self) -> u32 {
        let [r, g, b, _] = self.to_rgba8();
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }

    /// Component-wise product, used for light tinting
    pub fn modulate(self, other: Color) -> Self {
        Self::rgb(self.r * other.r, self.g * other.g, self.b * other.b)
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b), 255]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Accepted config spellings: "#ffccff", 16764159 or [1.0, 0.8, 1.0].
/// Serializes as hex when that is exact, components otherwise.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Int(u32),
    Components([f32; 3]),
}

impl TryFrom<ColorRepr> for Color {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(text) => {
                let digits = text.trim_start_matches('#').trim_start_matches("0x");
                u32::from_str_radix(digits, 16)
                    .ok()
                    .filter(|_| digits.len() == 6)
                    .map(Color::from_hex)
                    .ok_or_else(|| format!("invalid colour literal {:?}", text))
            }
            ColorRepr::Int(hex) if hex <= 0xff_ffff => Ok(Color::from_hex(hex)),
            ColorRepr::Int(hex) => Err(format!("colour {:#x} exceeds 0xffffff", hex)),
            ColorRepr::Components([r, g, b]) => Ok(Color::rgb(r, g, b)),
        }
    }
}

impl From<Color> for ColorRepr {
    fn from(color: Color) -> Self {
        if Color::from_hex(color.to_hex()) == color {
            ColorRepr::Hex(color.into())
        } else {
            ColorRepr::Components([color.r, color.g, color.b])
        }
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        format!("#{:06x}", color.to_hex())
    }
}
