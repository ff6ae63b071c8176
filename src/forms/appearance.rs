//! Appearance streams for filled text and choice fields
//!
//! Once a field is read-only viewers stop regenerating its appearance, so
//! the stream written here is what gets displayed and printed.

use lopdf::{dictionary, Dictionary, Object, Stream};

/// Font used when the default appearance names none
pub const DEFAULT_FONT: &str = "Helv";

const PADDING: f64 = 2.0;
const AUTO_SIZE_MIN: f64 = 4.0;
const AUTO_SIZE_MAX: f64 = 12.0;
const MULTILINE_AUTO_SIZE: f64 = 10.0;
/// Average glyph width of Helvetica, as a fraction of the font size
const AVERAGE_GLYPH_WIDTH: f64 = 0.5;
const LINE_SPACING: f64 = 1.15;

/// Parsed `/DA` string: font resource, size (0 = auto) and colour operator
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultAppearance {
    pub font: String,
    pub size: f64,
    pub color: String,
}

impl Default for DefaultAppearance {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            size: 0.0,
            color: "0 g".to_string(),
        }
    }
}

impl DefaultAppearance {
    pub fn parse(da: &str) -> Self {
        let tokens: Vec<&str> = da.split_whitespace().collect();
        let mut parsed = Self::default();

        for (i, token) in tokens.iter().enumerate() {
            match *token {
                "Tf" if i >= 2 => {
                    if let Some(name) = tokens[i - 2].strip_prefix('/') {
                        parsed.font = name.to_string();
                    }
                    parsed.size = tokens[i - 1].parse().unwrap_or(0.0);
                }
                "g" if i >= 1 => parsed.color = tokens[i - 1..=i].join(" "),
                "rg" if i >= 3 => parsed.color = tokens[i - 3..=i].join(" "),
                "k" if i >= 4 => parsed.color = tokens[i - 4..=i].join(" "),
                _ => {}
            }
        }
        parsed
    }
}

/// Widget box and text options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub width: f64,
    pub height: f64,
    /// `/Q`: 0 left, 1 centred, 2 right
    pub quadding: i64,
    pub multiline: bool,
}

/// Content stream drawing `value` inside the box
pub fn text_content(value: &str, da: &DefaultAppearance, text_box: &TextBox) -> Vec<u8> {
    let lines: Vec<String> = if text_box.multiline {
        value.lines().map(str::to_string).collect()
    } else {
        vec![value.replace(['\r', '\n'], " ")]
    };
    let size = font_size(&lines, da.size, text_box);
    let leading = size * LINE_SPACING;

    let mut content = String::new();
    content.push_str("/Tx BMC\nq\n");
    content.push_str(&format!(
        "{} {} {} {} re W n\n",
        num(PADDING / 2.0),
        num(PADDING / 2.0),
        num((text_box.width - PADDING).max(0.0)),
        num((text_box.height - PADDING).max(0.0))
    ));
    content.push_str("BT\n");
    content.push_str(&format!("/{} {} Tf\n{}\n", da.font, num(size), da.color));

    let first_baseline = if text_box.multiline {
        text_box.height - PADDING - size
    } else {
        // vertically centred, nudged up for descenders
        (text_box.height - size) / 2.0 + size * 0.22
    };

    for (index, line) in lines.iter().enumerate() {
        let width = text_width(line, size);
        let x = match text_box.quadding {
            1 => (text_box.width - width) / 2.0,
            2 => text_box.width - PADDING - width,
            _ => PADDING,
        };
        let y = first_baseline - index as f64 * leading;
        content.push_str(&format!(
            "1 0 0 1 {} {} Tm\n({}) Tj\n",
            num(x.max(PADDING)),
            num(y),
            encode_literal(line)
        ));
    }

    content.push_str("ET\nQ\nEMC\n");
    content.into_bytes()
}

/// Form XObject wrapping `content`
pub fn form_xobject(content: Vec<u8>, width: f64, height: f64, resources: Dictionary) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as _),
                Object::Real(height as _),
            ],
            "Resources" => resources,
        },
        content,
    )
}

/// Standard 14 Helvetica, enough for the Latin-1 range
pub fn helvetica() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    }
}

fn font_size(lines: &[String], requested: f64, text_box: &TextBox) -> f64 {
    if requested > 0.0 {
        return requested;
    }
    if text_box.multiline {
        return MULTILINE_AUTO_SIZE;
    }

    let mut size = ((text_box.height - 2.0 * PADDING) * 0.75).clamp(AUTO_SIZE_MIN, AUTO_SIZE_MAX);
    let chars = lines.first().map(|l| l.chars().count()).unwrap_or(0);
    if chars > 0 {
        let fitting = (text_box.width - 2.0 * PADDING) / (chars as f64 * AVERAGE_GLYPH_WIDTH);
        size = size.min(fitting).max(AUTO_SIZE_MIN);
    }
    size
}

fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * AVERAGE_GLYPH_WIDTH
}

/// Literal string body in WinAnsi; characters outside Latin-1 become `?`
fn encode_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c if (c as u32) <= 0xFF => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}
