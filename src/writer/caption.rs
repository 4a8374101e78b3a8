//! Human-readable caption printed under the bars.
//!
//! The caption is set as PDF text in the standard Helvetica font, so no font
//! program is embedded. Widths come from the Helvetica AFM metrics and are
//! used to centre the text and shrink it when it would overflow.

use lopdf::{dictionary, Dictionary};

/// Base font used for captions.
pub const CAPTION_FONT: &str = "Helvetica";

/// Font dictionary for the caption font.
pub fn font_dictionary() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => CAPTION_FONT,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Advance width of `ch` in Helvetica, in 1/1000 em.
pub fn char_width(ch: char) -> f32 {
    match ch {
        '0'..='9' => 556.0,
        ' ' | '!' | ',' | '.' | '/' | ':' | ';' | '[' | '\\' | ']' | 'I' => 278.0,
        'f' | 't' => 278.0,
        'i' | 'j' | 'l' => 222.0,
        '"' => 355.0,
        '#' | '$' | '?' | '_' => 556.0,
        'a' | 'b' | 'd' | 'e' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' => 556.0,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' | 'J' => 500.0,
        '%' => 889.0,
        '&' | 'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667.0,
        '\'' => 191.0,
        '(' | ')' | '-' | '`' | 'r' => 333.0,
        '*' => 389.0,
        '+' | '<' | '=' | '>' | '~' => 584.0,
        '@' => 1015.0,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' | 'w' => 722.0,
        'F' | 'T' | 'Z' => 611.0,
        'G' | 'O' | 'Q' => 778.0,
        'L' => 556.0,
        'M' | 'm' => 833.0,
        'W' => 944.0,
        '^' => 469.0,
        '{' | '}' => 334.0,
        '|' => 260.0,
        _ => 556.0,
    }
}

/// Width of `text` at `size` points.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(char_width).sum::<f32>() * size / 1000.0
}

/// Largest size, at most `size`, at which `text` fits in `max_width`.
pub fn fit_size(text: &str, size: f32, max_width: f32) -> f32 {
    let width = text_width(text, size);
    if width > max_width && width > 0.0 {
        size * max_width / width
    } else {
        size
    }
}
