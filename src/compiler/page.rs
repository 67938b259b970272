//! Page compiler: absolutely positioned HTML in millimeters.
//!
//! The canvas size and element rectangles are used as CSS lengths directly,
//! so the output lays out identically at any device resolution. Conversion
//! to pixels is the renderer's job.

use std::fmt::Write;

use tracing::instrument;

use super::{CompileOutput, EmitContext, Item, PrintHint, WarningCode, conditional, paper_size, prepare};
use crate::document::{CanvasKind, ImageFit, LineDash, MmRect, PageCanvas, PageElement, PageShape, TextAlign};
use crate::template::{self, Escaper};

#[instrument(skip_all, fields(elements = elements.len()))]
pub fn compile(elements: &[PageElement], canvas: &PageCanvas) -> CompileOutput {
    compile_items(elements.iter().map(Item::Element), canvas)
}

pub(crate) fn compile_items<'a>(
    items: impl IntoIterator<Item = Item<'a, PageShape, MmRect>>,
    canvas: &PageCanvas,
) -> CompileOutput {
    let mut ctx = EmitContext::new();
    let (width, height) = canvas.size_mm();

    ctx.line(&format!(
        "<div class=\"rp-page\" style=\"position:relative;width:{:.2}mm;height:{:.2}mm;overflow:hidden;\">",
        width, height
    ));
    for item in prepare(items) {
        match item {
            Item::Element(element) => {
                let fragment = fragment(element, &mut ctx);
                ctx.line(&conditional(element, fragment));
            }
            Item::Unknown(unknown) => {
                ctx.unknown(unknown, CanvasKind::Page);
                ctx.line(&format!("<!-- unsupported element {} -->", unknown.index));
            }
        }
    }
    ctx.out.push_str("</div>");

    let hint = PrintHint {
        paper_size: Some(paper_size(width, height)),
        encoding: None,
    };
    ctx.finish(CanvasKind::Page, Some(hint))
}

fn attr(value: &str) -> String {
    template::escape_template(value, Escaper::Html)
}

/// `position:absolute;left:…;top:…;width:…;height:…;`
fn position(rect: &MmRect) -> String {
    format!(
        "position:absolute;left:{:.2}mm;top:{:.2}mm;width:{:.2}mm;height:{:.2}mm;",
        rect.x, rect.y, rect.width, rect.height
    )
}

fn rotation(degrees: f64, style: &mut String) {
    if degrees != 0.0 {
        let _ = write!(style, "transform:rotate({}deg);transform-origin:center center;", degrees);
    }
}

fn open(class: &str, element: &PageElement, style: &str) -> String {
    format!(
        "<div class=\"{}\" data-id=\"{}\" style=\"{}\">",
        class,
        attr(&element.id),
        style
    )
}

fn fragment(element: &PageElement, ctx: &mut EmitContext) -> String {
    let mut style = position(&element.rect);

    match &element.body {
        PageShape::Text { content, style: text } => {
            let align = match text.align {
                TextAlign::Left => "left",
                TextAlign::Center => "center",
                TextAlign::Right => "right",
            };
            let _ = write!(
                style,
                "font-family:{};font-size:{}pt;font-weight:{};font-style:{};text-decoration:{};color:{};\
                 text-align:{};line-height:{};white-space:pre-wrap;word-break:break-word;overflow:hidden;",
                attr(&text.font_family),
                text.font_size_pt,
                if text.bold { "bold" } else { "normal" },
                if text.italic { "italic" } else { "normal" },
                if text.underline { "underline" } else { "none" },
                attr(&text.color),
                align,
                text.line_height
            );
            rotation(text.rotation, &mut style);
            let body = template::escape_template(&content.to_template(), Escaper::Html);
            format!("{}{}</div>", open("rp-text", element, &style), body)
        }
        PageShape::Rect { style: rect } => {
            let _ = write!(
                style,
                "box-sizing:border-box;border:{:.2}mm solid {};",
                rect.stroke_width_mm,
                attr(&rect.stroke_color)
            );
            if let Some(fill) = &rect.fill {
                let _ = write!(style, "background:{};", attr(fill));
            }
            if rect.corner_radius_mm > 0.0 {
                let _ = write!(style, "border-radius:{:.2}mm;", rect.corner_radius_mm);
            }
            rotation(rect.rotation, &mut style);
            format!("{}</div>", open("rp-rect", element, &style))
        }
        PageShape::Line { style: line } => {
            let side = if element.rect.width >= element.rect.height {
                "top"
            } else {
                "left"
            };
            let dash = match line.dash {
                LineDash::Solid => "solid",
                LineDash::Dashed => "dashed",
                LineDash::Dotted => "dotted",
            };
            let _ = write!(
                style,
                "border-{}:{:.2}mm {} {};",
                side,
                line.stroke_width_mm,
                dash,
                attr(&line.color)
            );
            rotation(line.rotation, &mut style);
            format!("{}</div>", open("rp-line", element, &style))
        }
        PageShape::Image { src, style: image } => {
            rotation(image.rotation, &mut style);
            if src.trim().is_empty() {
                ctx.warn(WarningCode::EmptyImageSrc, Some(&element.id), "image has no source");
                style.push_str("box-sizing:border-box;border:0.20mm dashed #999999;");
                return format!("{}</div>", open("rp-image rp-placeholder", element, &style));
            }
            let fit = match image.fit {
                ImageFit::Contain => "contain",
                ImageFit::Cover => "cover",
                ImageFit::Fill => "fill",
                ImageFit::None => "none",
            };
            let _ = write!(style, "object-fit:{};", fit);
            format!(
                "<img class=\"rp-image\" data-id=\"{}\" src=\"{}\" style=\"{}\">",
                attr(&element.id),
                attr(src),
                style
            )
        }
        PageShape::Barcode { data, style: barcode } => {
            ctx.warn(
                WarningCode::BarcodePlaceholder,
                Some(&element.id),
                "barcode rendered as a placeholder",
            );
            rotation(barcode.rotation, &mut style);
            style.push_str("margin:0;overflow:hidden;font-family:monospace;");
            let label = barcode.symbology.as_str().to_uppercase();
            placeholder("rp-barcode", element, &style, &label, &data.to_template())
        }
        PageShape::QrCode { data, style: qr } => {
            ctx.warn(
                WarningCode::QrcodePlaceholder,
                Some(&element.id),
                "QR code rendered as a placeholder",
            );
            rotation(qr.rotation, &mut style);
            style.push_str("margin:0;overflow:hidden;font-family:monospace;");
            let label = format!("QR {}", qr.error_level.as_char());
            placeholder("rp-qrcode", element, &style, &label, &data.to_template())
        }
    }
}

/// `<pre>` box drawing with a title line and the data line.
///
/// ```text
/// +--------------+
/// | CODE128      |
/// | {{order.id}} |
/// +--------------+
/// ```
fn placeholder(class: &str, element: &PageElement, style: &str, label: &str, data: &str) -> String {
    let inner = label.chars().count().max(data.chars().count());
    let border = format!("+{}+", "-".repeat(inner + 2));
    let row = |s: &str| format!("| {}{} |", s, " ".repeat(inner - s.chars().count()));
    let art = [border.clone(), row(label), row(data), border].join("\n");
    format!(
        "<pre class=\"{}\" data-id=\"{}\" style=\"{}\">{}</pre>",
        class,
        attr(&element.id),
        style,
        template::escape_template(&art, Escaper::Html)
    )
}
