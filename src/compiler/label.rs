//! Label compiler: ZPL II.
//!
//! One `^FO` field per element, in z order, between the format header and
//! `^XZ`. Positions and sizes are converted from millimeters to dots at the
//! canvas density. Text fields are read with `^FH\` so that literal `^`,
//! `~` and `\` can be hex-escaped.

use tracing::instrument;

use super::{CompileOutput, EmitContext, Item, PrintHint, WarningCode, conditional, paper_size, prepare};
use crate::document::{CanvasKind, LabelCanvas, LabelElement, LabelShape, MmRect, Symbology, TextAlign};
use crate::template::{self, Escaper};

/// Tolerance for elements that touch the label edge.
const EDGE_EPSILON_MM: f64 = 1e-6;

#[instrument(skip_all, fields(elements = elements.len()))]
pub fn compile(elements: &[LabelElement], canvas: &LabelCanvas) -> CompileOutput {
    compile_items(elements.iter().map(Item::Element), canvas)
}

pub(crate) fn compile_items<'a>(
    items: impl IntoIterator<Item = Item<'a, LabelShape, MmRect>>,
    canvas: &LabelCanvas,
) -> CompileOutput {
    let mut ctx = EmitContext::new();

    ctx.line("^XA");
    ctx.line("^CI28");
    ctx.line(&format!("^PW{}", canvas.width_dots()));
    ctx.line(&format!("^LL{}", canvas.height_dots()));
    if let Some(origin) = &canvas.origin_mm {
        ctx.line(&format!("^LH{},{}", canvas.to_dots(origin.x), canvas.to_dots(origin.y)));
    }

    for item in prepare(items) {
        match item {
            Item::Element(element) => {
                check_bounds(element, canvas, &mut ctx);
                let field = field(element, canvas, &mut ctx);
                ctx.line(&conditional(element, field));
            }
            Item::Unknown(unknown) => {
                ctx.unknown(unknown, CanvasKind::Label);
                ctx.line(&format!("^FX unsupported element {}", unknown.index));
            }
        }
    }
    ctx.out.push_str("^XZ");

    let hint = PrintHint {
        paper_size: Some(paper_size(canvas.width_mm, canvas.height_mm)),
        encoding: None,
    };
    ctx.finish(CanvasKind::Label, Some(hint))
}

fn check_bounds(element: &LabelElement, canvas: &LabelCanvas, ctx: &mut EmitContext) {
    let r = &element.rect;
    let outside = r.x < -EDGE_EPSILON_MM
        || r.y < -EDGE_EPSILON_MM
        || r.x + r.width > canvas.width_mm + EDGE_EPSILON_MM
        || r.y + r.height > canvas.height_mm + EDGE_EPSILON_MM;
    if outside {
        ctx.warn(
            WarningCode::OutOfBounds,
            Some(&element.id),
            format!(
                "element at {}x{}mm extends past the {}x{}mm label",
                r.x, r.y, canvas.width_mm, canvas.height_mm
            ),
        );
    }
}

/// ZPL field orientation for a rotation in degrees, to the nearest quarter
/// turn clockwise.
pub fn orientation(degrees: f64) -> char {
    let quarter = (degrees.rem_euclid(360.0) / 90.0).round() as u32 % 4;
    match quarter {
        1 => 'R',
        2 => 'I',
        3 => 'B',
        _ => 'N',
    }
}

fn justification(align: TextAlign) -> char {
    match align {
        TextAlign::Left => 'L',
        TextAlign::Center => 'C',
        TextAlign::Right => 'R',
    }
}

fn yes_no(flag: bool) -> char {
    if flag { 'Y' } else { 'N' }
}

fn field(element: &LabelElement, canvas: &LabelCanvas, ctx: &mut EmitContext) -> String {
    let r = &element.rect;
    let origin = format!("^FO{},{}", canvas.to_dots(r.x), canvas.to_dots(r.y));
    let width = canvas.to_dots(r.width);
    let height = canvas.to_dots(r.height);

    match &element.body {
        LabelShape::Text { content, style } => {
            let data = template::escape_template(&content.to_template(), Escaper::Zpl);
            format!(
                "{}^A0{},{},{}^FB{},{},0,{}^FH\\^FD{}^FS",
                origin,
                orientation(style.rotation),
                style.font_height_dots,
                style.font_width_dots,
                width,
                style.max_lines.max(1),
                justification(style.align),
                data
            )
        }
        LabelShape::Box { style } => {
            let thickness = if style.fill {
                width.min(height).max(1)
            } else {
                style.thickness_dots.max(1)
            };
            format!(
                "{}^GB{},{},{},B,{}^FS",
                origin,
                width.max(thickness),
                height.max(thickness),
                thickness,
                style.corner_rounding.min(8)
            )
        }
        LabelShape::Line { style } => {
            let thickness = style.thickness_dots.max(1);
            let (w, h) = if r.width >= r.height {
                (width.max(thickness), thickness)
            } else {
                (thickness, height.max(thickness))
            };
            format!("{}^GB{},{},{}^FS", origin, w, h, thickness)
        }
        LabelShape::Image { src } => {
            if src.trim().is_empty() {
                ctx.warn(WarningCode::EmptyImageSrc, Some(&element.id), "image has no source");
            } else {
                ctx.warn(
                    WarningCode::ImagePlaceholder,
                    Some(&element.id),
                    format!("image {:?} is left to the renderer", src),
                );
            }
            format!("{}^FX image {} {}x{}^FS", origin, comment_text(&element.id), width, height)
        }
        LabelShape::Barcode { data, style } => {
            let o = orientation(style.rotation);
            let h = style.height_dots;
            let line = yes_no(style.show_text);
            let symbol = match style.symbology {
                Symbology::Code128 => format!("^BC{},{},{},N,N", o, h, line),
                Symbology::Code39 => format!("^B3{},N,{},{},N", o, h, line),
                Symbology::Ean13 => format!("^BE{},{},{},N", o, h, line),
                Symbology::Upca => format!("^BU{},{},{},N,Y", o, h, line),
            };
            let data = template::escape_template(&data.to_template(), Escaper::Zpl);
            format!(
                "{}^BY{}{}^FH\\^FD{}^FS",
                origin,
                style.module_width_dots.clamp(1, 10),
                symbol,
                data
            )
        }
        LabelShape::QrCode { data, style } => {
            let data = template::escape_template(&data.to_template(), Escaper::Zpl);
            format!(
                "{}^BQN,2,{}^FH\\^FD{}A,{}^FS",
                origin,
                style.magnification.clamp(1, 10),
                style.error_level.as_char(),
                data
            )
        }
    }
}

/// Text safe inside `^FX`, which ends at the next command prefix.
fn comment_text(s: &str) -> String {
    s.chars().map(|c| if c == '^' || c == '~' { ' ' } else { c }).collect()
}
