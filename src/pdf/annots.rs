//! Annotation dictionaries
//!
//! Reading and building `/Annot` dictionaries with lopdf. PDF user space has
//! its origin at the bottom-left of the page box; everything returned from
//! here is converted to page-local coordinates with the origin at the
//! top-left.
//!
//! Created annotations also get a normal appearance stream (`/AP /N`), drawn
//! in user space over the annotation's `/Rect`, so viewers that do not
//! synthesize appearances still show them.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, Stream, StringFormat};

use crate::document::{AnnotationHandle, FreeTextOptions, NativeAnnotation, Result, Rgb};
use crate::geometry::Rect;

/// Side of the square icon a sticky note occupies
pub const NOTE_ICON_SIZE: f64 = 20.0;

/// Page box in PDF user space, `(x0, y0)` bottom-left and `(x1, y1)` top-right
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PageBox {
    /// Box from a `[llx lly urx ury]` array, corners normalized
    pub fn from_array(values: [f64; 4]) -> Self {
        let [a, b, c, d] = values;
        Self {
            x0: a.min(c),
            y0: b.min(d),
            x1: a.max(c),
            y1: b.max(d),
        }
    }

    /// User-space rectangle to page-local
    pub fn to_local(&self, values: [f64; 4]) -> Rect {
        let [a, b, c, d] = values;
        Rect::new(
            a.min(c) - self.x0,
            self.y1 - b.max(d),
            a.max(c) - self.x0,
            self.y1 - b.min(d),
        )
    }

    /// Page-local rectangle to user-space `[llx lly urx ury]`
    pub fn to_user_space(&self, rect: &Rect) -> [f64; 4] {
        [
            rect.x0 + self.x0,
            self.y1 - rect.y1,
            rect.x1 + self.x0,
            self.y1 - rect.y0,
        ]
    }
}

pub fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Four numbers from a direct array
pub fn as_rect_array(object: &Object) -> Option<[f64; 4]> {
    let Object::Array(items) = object else {
        return None;
    };
    if items.len() != 4 {
        return None;
    }
    let mut values = [0.0; 4];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = as_number(item)?;
    }
    Some(values)
}

pub(super) fn real_array(values: &[f64]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v as f32)).collect())
}

/// Annotation color from a gray, RGB or CMYK array
///
/// An empty array means transparent and yields `None`.
pub fn read_color(object: &Object) -> Option<Rgb> {
    let Object::Array(items) = object else {
        return None;
    };
    let values: Vec<f64> = items.iter().filter_map(as_number).collect();
    match values.as_slice() {
        [gray] => Some(Rgb(*gray, *gray, *gray)),
        [r, g, b] => Some(Rgb(*r, *g, *b)),
        [c, m, y, k] => Some(Rgb(
            1.0 - (c + k).min(1.0),
            1.0 - (m + k).min(1.0),
            1.0 - (y + k).min(1.0),
        )),
        _ => None,
    }
}

fn color_array(color: Rgb) -> Object {
    real_array(&color.components())
}

/// Decode a PDF text string
///
/// UTF-16BE when it starts with a byte order mark, otherwise each byte maps to
/// the character of the same code point.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a text string, as ASCII when possible and UTF-16BE otherwise
pub fn encode_text(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn contents(dict: &Dictionary) -> String {
    match dict.get(b"Contents") {
        Ok(Object::String(bytes, _)) => decode_text(bytes),
        _ => String::new(),
    }
}

fn subtype(dict: &Dictionary) -> Option<&[u8]> {
    match dict.get(b"Subtype") {
        Ok(Object::Name(name)) => Some(name.as_slice()),
        _ => None,
    }
}

/// Interpret an annotation dictionary
///
/// `/Highlight`, `/Text` and `/FreeText` are read in full; other subtypes come
/// back as [`NativeAnnotation::Other`]. Form widgets and annotations without a
/// usable `/Rect` or `/Subtype` yield `None`.
pub fn parse_annotation(
    handle: AnnotationHandle,
    dict: &Dictionary,
    page_box: &PageBox,
) -> Option<NativeAnnotation> {
    let rect = page_box.to_local(dict.get(b"Rect").ok().and_then(as_rect_array)?);

    match subtype(dict)? {
        b"Highlight" => Some(NativeAnnotation::Highlight {
            handle,
            rect,
            stroke_color: dict.get(b"C").ok().and_then(read_color),
        }),
        b"Text" | b"FreeText" => Some(NativeAnnotation::FreeText {
            handle,
            rect,
            content: contents(dict),
        }),
        b"Widget" => None,
        other => Some(NativeAnnotation::Other {
            handle,
            rect,
            subtype: String::from_utf8_lossy(other).into_owned(),
        }),
    }
}

fn base_annotation(subtype: &[u8], rect: [f64; 4]) -> Dictionary {
    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(subtype.to_vec()));
    annot.set("Rect", real_array(&rect));
    // print flag
    annot.set("F", Object::Integer(4));
    annot
}

/// `/Highlight` covering page-local `quads`
pub fn highlight_annotation(
    page_box: &PageBox,
    bounds: &Rect,
    quads: &[Rect],
    stroke: Rgb,
    fill: Rgb,
) -> Dictionary {
    let mut annot = base_annotation(b"Highlight", page_box.to_user_space(bounds));

    // upper-left, upper-right, lower-left, lower-right per quad
    let mut points = Vec::with_capacity(quads.len() * 8);
    for quad in quads {
        let [llx, lly, urx, ury] = page_box.to_user_space(quad);
        points.extend_from_slice(&[llx, ury, urx, ury, llx, lly, urx, lly]);
    }
    annot.set("QuadPoints", real_array(&points));
    annot.set("C", color_array(stroke));
    annot.set("IC", color_array(fill));
    annot
}

fn note_rect(x: f64, y: f64) -> Rect {
    Rect::new(x, y, x + NOTE_ICON_SIZE, y + NOTE_ICON_SIZE)
}

/// `/Text` sticky note with its icon's top-left corner at page-local `(x, y)`
pub fn text_note_annotation(page_box: &PageBox, x: f64, y: f64, content: &str) -> Dictionary {
    let mut annot = base_annotation(b"Text", page_box.to_user_space(&note_rect(x, y)));
    annot.set("Contents", encode_text(content));
    annot.set("Name", Object::Name(b"Note".to_vec()));
    annot.set("Open", Object::Boolean(false));
    annot
}

/// `/FreeText` box
///
/// The text color and size go into the default appearance string; the fill
/// becomes the interior color and the border color the annotation color.
pub fn free_text_annotation(
    page_box: &PageBox,
    rect: &Rect,
    content: &str,
    options: &FreeTextOptions,
) -> Dictionary {
    let mut annot = base_annotation(b"FreeText", page_box.to_user_space(rect));
    annot.set("Contents", encode_text(content));

    let Rgb(r, g, b) = options.text_color;
    let da = format!("/Helv {} Tf {} {} {} rg", options.fontsize, r, g, b);
    annot.set("DA", Object::String(da.into_bytes(), StringFormat::Literal));

    if let Some(fill) = options.fill_color {
        annot.set("IC", color_array(fill));
    }

    let mut border = Dictionary::new();
    match options.border_color {
        Some(color) => {
            annot.set("C", color_array(color));
            border.set("W", Object::Integer(1));
        }
        None => border.set("W", Object::Integer(0)),
    }
    annot.set("BS", Object::Dictionary(border));
    annot
}

fn reals(values: &[f64]) -> Vec<Object> {
    values.iter().map(|v| Object::Real(*v as f32)).collect()
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

/// Form XObject covering `bbox`; with `/BBox` equal to the `/Rect` the form
/// draws in page user space
fn appearance(bbox: [f64; 4], resources: Dictionary, operations: Vec<Operation>) -> Result<Stream> {
    let content = Content { operations }.encode()?;
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => real_array(&bbox),
        "Resources" => resources,
    };
    Ok(Stream::new(dict, content))
}

/// Rectangle outline inset by half the line width
fn outline(rect: [f64; 4], color: Rgb, width: f64) -> Vec<Operation> {
    let [llx, lly, urx, ury] = rect;
    let inset = width / 2.0;
    vec![
        op("RG", reals(&color.components())),
        op("w", reals(&[width])),
        op(
            "re",
            reals(&[llx + inset, lly + inset, urx - llx - width, ury - lly - width]),
        ),
        op("S", vec![]),
    ]
}

/// Appearance of a highlight: its quads filled in multiply blend mode
pub fn highlight_appearance(
    page_box: &PageBox,
    bounds: &Rect,
    quads: &[Rect],
    fill: Rgb,
) -> Result<Stream> {
    let resources = dictionary! {
        "ExtGState" => dictionary! {
            "H0" => dictionary! { "Type" => "ExtGState", "BM" => "Multiply" },
        },
    };

    let mut operations = vec![op("q", vec![]), op("gs", vec!["H0".into()])];
    operations.push(op("rg", reals(&fill.components())));
    for quad in quads {
        let [llx, lly, urx, ury] = page_box.to_user_space(quad);
        operations.push(op("re", reals(&[llx, lly, urx - llx, ury - lly])));
    }
    operations.push(op("f", vec![]));
    operations.push(op("Q", vec![]));

    appearance(page_box.to_user_space(bounds), resources, operations)
}

/// Appearance of a sticky note icon: a yellow square with ruled lines
pub fn text_note_appearance(page_box: &PageBox, x: f64, y: f64) -> Result<Stream> {
    let bbox = page_box.to_user_space(&note_rect(x, y));
    let [llx, lly, urx, ury] = bbox;

    let mut operations = vec![
        op("rg", reals(&[1.0, 0.85, 0.3])),
        op("re", reals(&[llx, lly, urx - llx, ury - lly])),
        op("f", vec![]),
    ];
    operations.extend(outline(bbox, Rgb(0.4, 0.3, 0.0), 1.0));
    for step in 1..=3 {
        let line_y = ury - 5.0 * step as f64;
        operations.push(op("m", reals(&[llx + 4.0, line_y])));
        operations.push(op("l", reals(&[urx - 4.0, line_y])));
    }
    operations.push(op("S", vec![]));

    appearance(bbox, Dictionary::new(), operations)
}

/// Latin-1 bytes for a standard-font string; other characters become `?`
fn latin1(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Appearance of a free-text box: fill, border, then the text in Helvetica
/// one line per `\n`
pub fn free_text_appearance(
    page_box: &PageBox,
    rect: &Rect,
    content: &str,
    options: &FreeTextOptions,
) -> Result<Stream> {
    let bbox = page_box.to_user_space(rect);
    let [llx, lly, urx, ury] = bbox;
    let mut operations = Vec::new();

    if let Some(fill) = options.fill_color {
        operations.push(op("rg", reals(&fill.components())));
        operations.push(op("re", reals(&[llx, lly, urx - llx, ury - lly])));
        operations.push(op("f", vec![]));
    }
    if let Some(border) = options.border_color {
        operations.extend(outline(bbox, border, 1.0));
    }

    let size = options.fontsize;
    operations.extend([
        op("re", reals(&[llx, lly, urx - llx, ury - lly])),
        op("W", vec![]),
        op("n", vec![]),
        op("BT", vec![]),
        op("Tf", vec!["Helv".into(), Object::Real(size as f32)]),
        op("rg", reals(&options.text_color.components())),
        op("TL", reals(&[size * 1.2])),
        op("Td", reals(&[llx + 2.0, ury - 2.0 - size])),
    ]);
    for (index, line) in content.lines().enumerate() {
        if index > 0 {
            operations.push(op("T*", vec![]));
        }
        operations.push(op(
            "Tj",
            vec![Object::String(latin1(line), StringFormat::Literal)],
        ));
    }
    operations.push(op("ET", vec![]));

    let resources = dictionary! {
        "Font" => dictionary! {
            "Helv" => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            },
        },
    };
    appearance(bbox, resources, operations)
}
