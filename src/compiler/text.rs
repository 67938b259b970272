//! Plain-text compiler: grid rows joined with `\n`.

use tracing::instrument;

use super::grid::{self, GridLayout, Segment};
use super::{CompileOutput, EmitContext, Item, conditional, prepare};
use crate::document::{CanvasKind, GridRect, TextCanvas, TextElement, TextShape};
use crate::template::{self, Escaper};

#[instrument(skip_all, fields(elements = elements.len()))]
pub fn compile(elements: &[TextElement], canvas: &TextCanvas) -> CompileOutput {
    compile_items(elements.iter().map(Item::Element), canvas)
}

pub(crate) fn compile_items<'a>(
    items: impl IntoIterator<Item = Item<'a, TextShape, GridRect>>,
    canvas: &TextCanvas,
) -> CompileOutput {
    let mut ctx = EmitContext::new();
    let mut layout = GridLayout::new(canvas);

    for item in prepare(items) {
        match item {
            Item::Element(element) => paint(element, &mut layout, &mut ctx),
            Item::Unknown(unknown) => ctx.unknown(unknown, CanvasKind::Text),
        }
    }

    let lines: Vec<String> = layout
        .rows()
        .iter()
        .map(|segments| {
            let mut line = String::new();
            grid::write_row(segments, &mut line);
            line
        })
        .collect();
    ctx.out = lines.join("\n");
    ctx.finish(CanvasKind::Text, None)
}

fn paint(element: &TextElement, layout: &mut GridLayout, ctx: &mut EmitContext) {
    let Some(place) = layout.place(&element.rect, &element.id, ctx) else {
        return;
    };

    match &element.body {
        TextShape::Text { content, style } => {
            let source = content.to_template();
            if template::has_expression(&source) {
                let text = template::escape_template(&source, Escaper::Plain);
                let segment = Segment {
                    col: place.col,
                    span: place.span,
                    lead: 0,
                    width: place.span,
                    fragment: conditional(element, text),
                    justify: None,
                };
                layout.paint(place.row, segment, &element.id, ctx);
                return;
            }

            // Static text: one line per row of the span, clipped to its width.
            for (offset, line) in source.split('\n').take(place.rows as usize).enumerate() {
                let mut text = String::new();
                Escaper::Plain.escape_literal(grid::clip_chars(line, place.span as usize), &mut text);
                let width = text.chars().count() as u32;
                let segment = Segment {
                    col: place.col,
                    span: place.span,
                    lead: grid::align_offset(style.align, width, place.span),
                    width,
                    fragment: conditional(element, text),
                    justify: None,
                };
                layout.paint(place.row + offset as u32, segment, &element.id, ctx);
            }
        }
        TextShape::HLine { style } => {
            let rule: String = std::iter::repeat_n(style.ch, place.span as usize).collect();
            let mut text = String::new();
            Escaper::Plain.escape_literal(&rule, &mut text);
            for offset in 0..place.rows {
                let segment = Segment {
                    col: place.col,
                    span: place.span,
                    lead: 0,
                    width: place.span,
                    fragment: conditional(element, text.clone()),
                    justify: None,
                };
                layout.paint(place.row + offset, segment, &element.id, ctx);
            }
        }
    }
}
