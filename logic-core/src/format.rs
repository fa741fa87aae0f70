//! Presentation formatting for decoded values (§3 `Data Format`).
//!
//! Decoders never consult this; it exists so a front end can render a
//! [`crate::event::DecodedEvent`] payload without re-implementing the original
//! tool's `emit_decoded_data` formatting switch.

/// How a decoded byte should be rendered in an event label. Affects only
/// presentation — decoders always operate on raw integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataFormat {
    Binary,
    Decimal,
    #[default]
    Hexadecimal,
    Bcd,
    Ascii,
}

impl DataFormat {
    /// Render a single decoded byte according to this format.
    pub fn render(&self, value: u8) -> String {
        match self {
            DataFormat::Binary => format!("0b{:08b}", value),
            DataFormat::Decimal => format!("{}", value),
            DataFormat::Hexadecimal => format!("0x{:02X}", value),
            DataFormat::Bcd => format!("{}{}", (value >> 4) & 0xf, value & 0xf),
            DataFormat::Ascii => {
                if value.is_ascii_graphic() || value == b' ' {
                    format!("'{}'", value as char)
                } else {
                    format!("\\x{:02X}", value)
                }
            }
        }
    }
}
