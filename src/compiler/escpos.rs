//! # ESC/POS Command Strings
//!
//! Command sequences used by the receipt compiler, as `&str`/`String` so
//! they can be spliced into a template that is rendered before it is sent
//! to the printer.
//!
//! ## Parameter bytes
//!
//! Numeric parameters are written as single characters. The template is
//! text, so a parameter above `0x7F` would be re-encoded as several bytes;
//! every parameter is therefore clamped to 7 bits. Commands whose payload
//! length cannot fit (long barcode or QR data) are reported as `None` and
//! the caller falls back to a placeholder.

use crate::document::{CutMode, QrErrorLevel, Symbology, TextAlign};

/// Initialize printer (`ESC @`). Resets styles and alignment.
pub const INIT: &str = "\x1b@";

/// Largest value a parameter character can carry.
pub const MAX_PARAM: u32 = 0x7F;

fn param(n: u32) -> char {
    char::from(n.min(MAX_PARAM) as u8)
}

/// Justification for the following lines (`ESC a n`).
pub fn align(align: TextAlign) -> String {
    let n = match align {
        TextAlign::Left => 0,
        TextAlign::Center => 1,
        TextAlign::Right => 2,
    };
    format!("\x1ba{}", param(n))
}

/// Emphasis (`ESC E n`).
pub fn bold(on: bool) -> &'static str {
    if on { "\x1bE\x01" } else { "\x1bE\x00" }
}

/// Underline (`ESC - n`).
pub fn underline(on: bool) -> &'static str {
    if on { "\x1b-\x01" } else { "\x1b-\x00" }
}

/// Character size (`GS ! n`): width multiplier in the high nibble, height
/// in the low nibble.
pub fn char_size(double_width: bool, double_height: bool) -> String {
    let n = (if double_width { 0x10 } else { 0 }) | (if double_height { 0x01 } else { 0 });
    format!("\x1d!{}", param(n))
}

/// White-on-black printing (`GS B n`).
pub fn invert(on: bool) -> &'static str {
    if on { "\x1dB\x01" } else { "\x1dB\x00" }
}

/// Print and feed `n` lines (`ESC d n`).
pub fn feed(lines: u8) -> String {
    format!("\x1bd{}", param(u32::from(lines)))
}

/// Paper cut (`GS V m`).
pub fn cut(mode: CutMode) -> &'static str {
    match mode {
        CutMode::None => "",
        CutMode::Partial => "\x1dV\x01",
        CutMode::Full => "\x1dV\x00",
    }
}

fn valid_barcode_data(symbology: Symbology, data: &str) -> bool {
    let digits = data.bytes().all(|b| b.is_ascii_digit());
    match symbology {
        Symbology::Code128 => !data.is_empty() && data.bytes().all(|b| (0x20..0x7F).contains(&b)),
        Symbology::Code39 => {
            !data.is_empty()
                && data
                    .bytes()
                    .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase() || b" -.$/+%".contains(&b))
        }
        Symbology::Ean13 => digits && matches!(data.len(), 12 | 13),
        Symbology::Upca => digits && matches!(data.len(), 11 | 12),
    }
}

/// 1D barcode: height (`GS h`), module width (`GS w`), HRI position
/// (`GS H`), then the symbol (`GS k m n d1…dn`).
///
/// `None` when `data` is not encodable in `symbology` or too long.
pub fn barcode(symbology: Symbology, data: &str, height: u8, module_width: u8, show_text: bool) -> Option<String> {
    if !valid_barcode_data(symbology, data) {
        return None;
    }
    let (m, payload) = match symbology {
        Symbology::Upca => (65, data.to_string()),
        Symbology::Ean13 => (67, data.to_string()),
        Symbology::Code39 => (69, data.to_string()),
        // Code set B.
        Symbology::Code128 => (73, format!("{{B{}", data)),
    };
    let len = u32::try_from(payload.len()).ok().filter(|n| *n <= MAX_PARAM)?;

    Some(format!(
        "\x1dh{}\x1dw{}\x1dH{}\x1dk{}{}{}",
        param(u32::from(height.max(1))),
        param(u32::from(module_width.clamp(2, 6))),
        param(if show_text { 2 } else { 0 }),
        param(m),
        param(len),
        payload
    ))
}

/// QR code through the `GS ( k` function set: select model 2, module size,
/// error correction, store data, print.
///
/// `None` when `data` is empty, not ASCII or too long.
pub fn qr(data: &str, error_level: QrErrorLevel, module_size: u8) -> Option<String> {
    if data.is_empty() || !data.is_ascii() {
        return None;
    }
    let len = u32::try_from(data.len() + 3).ok().filter(|n| *n <= MAX_PARAM)?;
    let level = match error_level {
        QrErrorLevel::L => 48,
        QrErrorLevel::M => 49,
        QrErrorLevel::Q => 50,
        QrErrorLevel::H => 51,
    };

    let mut out = String::new();
    out.push_str("\x1d(k\x04\x001A2\x00");
    out.push_str("\x1d(k\x03\x001C");
    out.push(param(u32::from(module_size.clamp(1, 16))));
    out.push_str("\x1d(k\x03\x001E");
    out.push(param(level));
    out.push_str("\x1d(k");
    out.push(param(len));
    out.push('\x00');
    out.push_str("1P0");
    out.push_str(data);
    out.push_str("\x1d(k\x03\x001Q0");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_commands() {
        assert_eq!(align(TextAlign::Center), "\x1ba\x01");
        assert_eq!(char_size(true, true), "\x1d!\x11");
        assert_eq!(char_size(false, true), "\x1d!\x01");
        assert_eq!(feed(3), "\x1bd\x03");
        assert_eq!(cut(CutMode::None), "");
    }

    #[test]
    fn test_code128_uses_code_set_b() {
        let cmd = barcode(Symbology::Code128, "A1", 80, 2, true).unwrap();
        assert_eq!(cmd, "\x1dh\x50\x1dw\x02\x1dH\x02\x1dk\x49\x04{BA1");
    }

    #[test]
    fn test_barcode_rejects_bad_data() {
        assert!(barcode(Symbology::Ean13, "12345", 80, 2, true).is_none());
        assert!(barcode(Symbology::Code39, "lower", 80, 2, true).is_none());
        assert!(barcode(Symbology::Code128, &"9".repeat(200), 80, 2, true).is_none());
        assert!(barcode(Symbology::Upca, "01234567890", 80, 2, false).is_some());
    }

    #[test]
    fn test_parameters_stay_single_byte() {
        let cmd = barcode(Symbology::Code128, "X", 200, 2, true).unwrap();
        assert_eq!(cmd.len(), cmd.chars().count());
    }

    #[test]
    fn test_qr_sequence() {
        let cmd = qr("hi", QrErrorLevel::H, 6).unwrap();
        assert!(cmd.starts_with("\x1d(k\x04\x001A2\x00"));
        assert!(cmd.contains("\x1d(k\x03\x001C\x06"));
        assert!(cmd.contains("\x1d(k\x03\x001E3"));
        assert!(cmd.contains("\x1d(k\x05\x001P0hi"));
        assert!(cmd.ends_with("\x1d(k\x03\x001Q0"));
        assert!(qr("", QrErrorLevel::M, 4).is_none());
        assert!(qr("héllo", QrErrorLevel::M, 4).is_none());
    }
}
