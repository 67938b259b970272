//! Receipt compiler: ESC/POS command stream.
//!
//! ```text
//! ESC @                       init
//! row 0 … row n, each + LF    grid rows, styles inline
//! ESC d n                     feed before cut
//! GS V m                      cut (omitted for `cut: none`)
//! ```
//!
//! Styles wrap each text run and are switched off again right after it, so
//! a run never leaks its style into the padding or the next element.

use tracing::instrument;

use super::escpos;
use super::grid::{self, GridLayout, Placement, Segment};
use super::{CompileOutput, EmitContext, Item, PrintHint, WarningCode, conditional, paper_size, prepare};
use crate::document::{
    CanvasKind, CutMode, GridCanvas, GridRect, ReceiptCanvas, ReceiptElement, ReceiptShape,
    ReceiptTextStyle, TextAlign,
};
use crate::template::{self, Escaper};

#[instrument(skip_all, fields(elements = elements.len()))]
pub fn compile(elements: &[ReceiptElement], canvas: &ReceiptCanvas) -> CompileOutput {
    compile_items(elements.iter().map(Item::Element), canvas)
}

pub(crate) fn compile_items<'a>(
    items: impl IntoIterator<Item = Item<'a, ReceiptShape, GridRect>>,
    canvas: &ReceiptCanvas,
) -> CompileOutput {
    let mut ctx = EmitContext::new();
    let mut layout = GridLayout::new(canvas);

    for item in prepare(items) {
        match item {
            Item::Element(element) => paint(element, &mut layout, &mut ctx),
            Item::Unknown(unknown) => ctx.unknown(unknown, CanvasKind::Receipt),
        }
    }

    ctx.out.push_str(escpos::INIT);
    let rows = layout.rows();
    for segments in &rows {
        let justify = match segments.as_slice() {
            [only] => only.justify.filter(|a| *a != TextAlign::Left),
            _ => None,
        };
        if let Some(align) = justify {
            ctx.out.push_str(&escpos::align(align));
        }
        grid::write_row(segments, &mut ctx.out);
        ctx.out.push('\n');
        if justify.is_some() {
            ctx.out.push_str(&escpos::align(TextAlign::Left));
        }
    }
    if canvas.feed_lines > 0 {
        ctx.out.push_str(&escpos::feed(canvas.feed_lines));
    }
    if canvas.cut != CutMode::None {
        ctx.out.push_str(escpos::cut(canvas.cut));
    }

    let hint = PrintHint {
        paper_size: canvas
            .preview_size_mm(rows.len() as u32)
            .map(|(w, h)| paper_size(w, h)),
        encoding: Some(canvas.encoding.as_str().to_string()),
    };
    ctx.finish(CanvasKind::Receipt, Some(hint))
}

/// Style switches around one text run.
fn styled(style: &ReceiptTextStyle, text: &str) -> String {
    let sized = style.double_width || style.double_height;
    let mut out = String::new();
    if style.bold {
        out.push_str(escpos::bold(true));
    }
    if style.underline {
        out.push_str(escpos::underline(true));
    }
    if sized {
        out.push_str(&escpos::char_size(style.double_width, style.double_height));
    }
    if style.invert {
        out.push_str(escpos::invert(true));
    }
    out.push_str(text);
    if style.invert {
        out.push_str(escpos::invert(false));
    }
    if sized {
        out.push_str(&escpos::char_size(false, false));
    }
    if style.underline {
        out.push_str(escpos::underline(false));
    }
    if style.bold {
        out.push_str(escpos::bold(false));
    }
    out
}

/// A segment filling the whole placement with no alignment padding.
fn block(place: &Placement, fragment: String) -> Segment {
    Segment {
        col: place.col,
        span: place.span,
        lead: 0,
        width: place.span,
        fragment,
        justify: None,
    }
}

fn paint(element: &ReceiptElement, layout: &mut GridLayout, ctx: &mut EmitContext) {
    let Some(place) = layout.place(&element.rect, &element.id, ctx) else {
        return;
    };
    let id = element.id.as_str();

    match &element.body {
        ReceiptShape::Text { content, style } => {
            let source = content.to_template();
            let cell = if style.double_width { 2 } else { 1 };

            if template::has_expression(&source) {
                let text = template::escape_template(&source, Escaper::EscPos);
                let mut segment = block(&place, conditional(element, styled(style, &text)));
                if place.col == 0 && place.span == layout.columns() {
                    segment.justify = Some(style.align);
                }
                layout.paint(place.row, segment, id, ctx);
                return;
            }

            let fits = (place.span / cell) as usize;
            for (offset, line) in source.split('\n').take(place.rows as usize).enumerate() {
                let mut text = String::new();
                Escaper::EscPos.escape_literal(grid::clip_chars(line, fits), &mut text);
                let width = text.chars().count() as u32 * cell;
                let segment = Segment {
                    col: place.col,
                    span: place.span,
                    lead: grid::align_offset(style.align, width, place.span),
                    width,
                    fragment: conditional(element, styled(style, &text)),
                    justify: None,
                };
                layout.paint(place.row + offset as u32, segment, id, ctx);
            }
        }
        ReceiptShape::HLine { style } => {
            let rule: String = std::iter::repeat_n(style.ch, place.span as usize).collect();
            let mut text = String::new();
            Escaper::EscPos.escape_literal(&rule, &mut text);
            for offset in 0..place.rows {
                layout.paint(place.row + offset, block(&place, conditional(element, text.clone())), id, ctx);
            }
        }
        ReceiptShape::Barcode { data, style } => {
            let source = data.to_template();
            let command = if template::has_expression(&source) {
                None
            } else {
                escpos::barcode(style.symbology, &source, style.height_dots, style.module_width, style.show_text)
            };
            let fragment = match command {
                Some(command) => command,
                None => {
                    ctx.warn(
                        WarningCode::BarcodePlaceholder,
                        Some(id),
                        format!(
                            "{} barcode data {:?} cannot be encoded at compile time",
                            style.symbology.as_str(),
                            source
                        ),
                    );
                    placeholder(&format!("[{}: {}]", style.symbology.as_str().to_uppercase(), source))
                }
            };
            layout.paint(place.row, block(&place, conditional(element, fragment)), id, ctx);
        }
        ReceiptShape::QrCode { data, style } => {
            let source = data.to_template();
            let command = if template::has_expression(&source) {
                None
            } else {
                escpos::qr(&source, style.error_level, style.module_size)
            };
            let fragment = match command {
                Some(command) => command,
                None => {
                    ctx.warn(
                        WarningCode::QrcodePlaceholder,
                        Some(id),
                        format!("QR data {:?} cannot be encoded at compile time", source),
                    );
                    placeholder(&format!("[QR: {}]", source))
                }
            };
            layout.paint(place.row, block(&place, conditional(element, fragment)), id, ctx);
        }
        ReceiptShape::Image { src } => {
            if src.trim().is_empty() {
                ctx.warn(WarningCode::EmptyImageSrc, Some(id), "image has no source");
                layout.paint(place.row, block(&place, conditional(element, "[IMAGE]".to_string())), id, ctx);
            } else {
                ctx.warn(
                    WarningCode::ImagePlaceholder,
                    Some(id),
                    format!("image {:?} is left to the renderer", src),
                );
                let fragment = placeholder(&format!("[IMAGE: {}]", src));
                layout.paint(place.row, block(&place, conditional(element, fragment)), id, ctx);
            }
        }
    }
}

fn placeholder(text: &str) -> String {
    template::escape_template(text, Escaper::EscPos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CellSize, Encoding, ReceiptBarcodeStyle, RuleStyle, Symbology};
    use pretty_assertions::assert_eq;

    fn element(id: &str, z: f64, rect: GridRect, body: ReceiptShape) -> ReceiptElement {
        ReceiptElement {
            id: id.to_string(),
            name: None,
            z,
            locked: false,
            hidden: false,
            visible_if: None,
            rect,
            body,
        }
    }

    fn canvas(columns: u32) -> ReceiptCanvas {
        ReceiptCanvas {
            columns,
            ..Default::default()
        }
    }

    fn body(out: &CompileOutput) -> &str {
        // Strip ESC @ and the default feed + partial cut.
        out.output
            .strip_prefix(escpos::INIT)
            .and_then(|s| s.strip_suffix("\x1bd\x03\x1dV\x01"))
            .unwrap()
    }

    #[test]
    fn test_frame_and_rows() {
        let elements = vec![
            element("a", 0.0, GridRect::new(0, 0, 10, 1), ReceiptShape::text("Coffee")),
            element("b", 1.0, GridRect::new(0, 1, 10, 1), ReceiptShape::HLine { style: RuleStyle::default() }),
        ];
        let out = compile(&elements, &canvas(10));
        assert!(out.output.starts_with("\x1b@"));
        assert_eq!(body(&out), "Coffee\n----------\n");
        assert_eq!(out.print_hint.as_ref().unwrap().encoding.as_deref(), Some("utf8"));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_cut_modes() {
        let full = ReceiptCanvas {
            cut: CutMode::Full,
            feed_lines: 0,
            ..canvas(10)
        };
        let out = compile(&[], &full);
        assert_eq!(out.output, "\x1b@\n\x1dV\x00");

        let none = ReceiptCanvas {
            cut: CutMode::None,
            ..canvas(10)
        };
        assert!(compile(&[], &none).output.ends_with("\n\x1bd\x03"));
    }

    #[test]
    fn test_text_styles_wrap_run() {
        let style = ReceiptTextStyle {
            align: TextAlign::Right,
            bold: true,
            double_width: true,
            ..Default::default()
        };
        let elements = vec![element(
            "t",
            0.0,
            GridRect::new(0, 0, 10, 1),
            ReceiptShape::Text {
                content: "TOTAL".into(),
                style,
            },
        )];
        let out = compile(&elements, &canvas(10));
        // Five double-width characters fill the span.
        assert_eq!(body(&out), "\x1bE\x01\x1d!\x10TOTAL\x1d!\x00\x1bE\x00\n");
    }

    #[test]
    fn test_dynamic_full_width_uses_printer_alignment() {
        let style = ReceiptTextStyle {
            align: TextAlign::Center,
            ..Default::default()
        };
        let elements = vec![element(
            "t",
            0.0,
            GridRect::new(0, 0, 32, 1),
            ReceiptShape::Text {
                content: "{{shop.name}}".into(),
                style,
            },
        )];
        let out = compile(&elements, &canvas(32));
        assert_eq!(body(&out), "\x1ba\x01{{shop.name}}\n\x1ba\x00");
    }

    #[test]
    fn test_literal_control_chars_are_stripped() {
        let elements = vec![element(
            "t",
            0.0,
            GridRect::new(0, 0, 20, 1),
            ReceiptShape::text("a\x1bdb {{x}}"),
        )];
        let out = compile(&elements, &canvas(20));
        assert_eq!(body(&out), "adb {{x}}\n");
    }

    #[test]
    fn test_static_barcode_emits_command() {
        let elements = vec![element(
            "b",
            0.0,
            GridRect::new(0, 0, 10, 1),
            ReceiptShape::Barcode {
                data: "12345".into(),
                style: ReceiptBarcodeStyle::default(),
            },
        )];
        let out = compile(&elements, &canvas(10));
        assert!(out.output.contains("\x1dk\x49\x07{B12345"));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_dynamic_barcode_is_placeholder() {
        let elements = vec![element(
            "b",
            0.0,
            GridRect::new(0, 0, 30, 1),
            ReceiptShape::Barcode {
                data: "{{order.id}}".into(),
                style: ReceiptBarcodeStyle {
                    symbology: Symbology::Code39,
                    ..Default::default()
                },
            },
        )];
        let out = compile(&elements, &canvas(30));
        assert_eq!(body(&out), "[CODE39: {{order.id}}]\n");
        assert!(out.has_warning(WarningCode::BarcodePlaceholder));
    }

    #[test]
    fn test_qr_and_image() {
        let elements = vec![
            element("q", 0.0, GridRect::new(0, 0, 30, 1), ReceiptShape::QrCode {
                data: "https://example.com/{{id}}".into(),
                style: Default::default(),
            }),
            element("i", 1.0, GridRect::new(0, 1, 30, 1), ReceiptShape::Image { src: "logo.png".into() }),
            element("e", 2.0, GridRect::new(0, 2, 30, 1), ReceiptShape::Image { src: " ".into() }),
        ];
        let out = compile(&elements, &canvas(30));
        assert_eq!(
            body(&out),
            "[QR: https://example.com/{{id}}]\n[IMAGE: logo.png]\n[IMAGE]\n"
        );
        let codes: Vec<WarningCode> = out.warnings.iter().map(|w| w.code).collect();
        assert_eq!(
            codes,
            [WarningCode::QrcodePlaceholder, WarningCode::ImagePlaceholder, WarningCode::EmptyImageSrc]
        );
    }

    #[test]
    fn test_conditional_wrap() {
        let mut e = element("t", 0.0, GridRect::new(0, 0, 10, 1), ReceiptShape::text("Member"));
        e.visible_if = Some("member".into());
        let out = compile(&[e], &canvas(10));
        assert_eq!(body(&out), "{{#if member}}Member{{/if}}\n");
    }

    #[test]
    fn test_print_hint_with_cell_size() {
        let canvas = ReceiptCanvas {
            columns: 32,
            min_rows: 10,
            cell_mm: Some(CellSize { width: 1.5, height: 4.0 }),
            encoding: Encoding::Gbk,
            ..Default::default()
        };
        let hint = compile(&[], &canvas).print_hint.unwrap();
        assert_eq!(hint.paper_size.as_deref(), Some("48mm 40mm"));
        assert_eq!(hint.encoding.as_deref(), Some("gbk"));
    }

    #[test]
    fn test_pure() {
        let mut paid = element("p", 2.0, GridRect::new(0, 1, 20, 1), ReceiptShape::text("PAID {{total}}"));
        paid.visible_if = Some("paid".into());
        let elements = vec![
            element("t", 0.0, GridRect::new(0, 0, 10, 1), ReceiptShape::text("Tea")),
            element("r", 1.0, GridRect::new(5, 0, 10, 1), ReceiptShape::HLine { style: RuleStyle::default() }),
            paid,
            element("b", 3.0, GridRect::new(0, 2, 20, 1), ReceiptShape::Barcode {
                data: "{{order.id}}".into(),
                style: ReceiptBarcodeStyle::default(),
            }),
        ];
        let snapshot = elements.clone();
        let first = compile(&elements, &canvas(20));
        let second = compile(&elements, &canvas(20));
        assert_eq!(first, second);
        assert_eq!(elements, snapshot);
        assert!(first.has_warning(WarningCode::GridOverlap));
    }
}
