//! End-to-end tests: JSON documents through loading, editing and compiling.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use rprint_layout::{
    CanvasKind, LayoutError, TemplateDoc, WarningCode, compiler,
    document::{DocBody, GridRect, MmRect, PageShape, TextShape},
    editor::{AlignMode, ElementPatch, NewElement, PageEditor, TextEditor},
};

fn doc(kind: &str, canvas: Value, elements: Value) -> Value {
    let mut canvas = canvas;
    canvas["kind"] = json!(kind);
    json!({
        "schema": "rprint.template",
        "version": 1,
        "meta": {"kind": kind, "name": "test"},
        "canvas": canvas,
        "elements": elements,
    })
}

fn load(value: Value) -> TemplateDoc {
    TemplateDoc::from_value(value).unwrap()
}

#[test]
fn page_document_compiles_to_positioned_html() {
    let doc = load(doc(
        "page",
        json!({"paper": "A4"}),
        json!([
            {"id": "t1", "type": "text", "content": "Order {{id}}",
             "rect": {"x": 0, "y": 0, "width": 50, "height": 10}},
            {"id": "q1", "type": "qrcode", "data": "{{url}}", "z": 2,
             "rect": {"x": 150, "y": 10, "width": 30, "height": 30}},
            {"id": "h", "type": "text", "content": "draft", "hidden": true,
             "rect": {"x": 0, "y": 20, "width": 50, "height": 10}}
        ]),
    ));
    let out = doc.compile();

    assert_eq!(out.kind, CanvasKind::Page);
    assert!(out.output.contains(">Order {{id}}</div>"));
    assert!(out.output.contains("data-id=\"q1\""));
    assert!(!out.output.contains("draft"));
    assert_eq!(out.print_hint.unwrap().paper_size.as_deref(), Some("210mm 297mm"));

    let text_at = out.output.find("data-id=\"t1\"").unwrap();
    let qr_at = out.output.find("data-id=\"q1\"").unwrap();
    assert!(text_at < qr_at);
}

#[test]
fn label_document_compiles_to_zpl() {
    let doc = load(doc(
        "label",
        json!({"dpi": 203, "widthMm": 50, "heightMm": 25}),
        json!([
            {"id": "b", "type": "barcode", "data": "{{sku}}",
             "rect": {"x": 2, "y": 2, "width": 40, "height": 10}},
            {"id": "f", "type": "text", "content": "FRAGILE", "visibleIf": "fragile",
             "rect": {"x": 0, "y": 15, "width": 20, "height": 5}}
        ]),
    ));
    let out = doc.compile();

    assert!(out.output.starts_with("^XA\n^CI28\n^PW400\n^LL200\n"));
    assert!(out.output.ends_with("^XZ"));
    assert!(out.output.contains("^FD{{sku}}^FS"));
    assert!(out.output.contains("{{#if fragile}}"));
    assert!(out.warnings.is_empty());
}

#[test]
fn receipt_document_compiles_to_escpos() {
    let doc = load(doc(
        "receipt",
        json!({"columns": 20, "cut": "full", "feedLines": 0}),
        json!([
            {"id": "item", "type": "text", "content": "Tea",
             "rect": {"col": 0, "row": 0, "colSpan": 10}},
            {"id": "price", "type": "text", "content": "2.50", "style": {"align": "right"},
             "rect": {"col": 10, "row": 0, "colSpan": 10}},
            {"id": "rule", "type": "hline",
             "rect": {"col": 0, "row": 1, "colSpan": 20}}
        ]),
    ));
    let out = doc.compile();

    assert_eq!(
        out.output,
        "\x1b@Tea             2.50\n--------------------\n\x1dV\x00"
    );
    assert_eq!(out.print_hint.unwrap().encoding.as_deref(), Some("utf8"));
}

#[test]
fn text_document_keeps_expressions() {
    let doc = load(doc(
        "text",
        json!({"columns": 20}),
        json!([
            {"id": "a", "type": "text", "content": "Hi {{name}}",
             "rect": {"col": 0, "row": 0, "colSpan": 20}}
        ]),
    ));
    assert_eq!(doc.compile().output, "Hi {{name}}");
}

#[test]
fn strict_load_rejects_foreign_element_type() {
    let value = doc(
        "receipt",
        json!({}),
        json!([{"id": "b", "type": "box", "rect": {"col": 0, "row": 0}}]),
    );
    let err = TemplateDoc::from_value(value).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidElement { index: 0, .. }));
}

#[test]
fn lenient_compile_warns_on_unknown_type() {
    let value = doc(
        "page",
        json!({}),
        json!([
            {"id": "ok", "type": "text", "content": "kept",
             "rect": {"x": 0, "y": 0, "width": 10, "height": 5}},
            {"id": "odd", "type": "sparkle",
             "rect": {"x": 0, "y": 0, "width": 10, "height": 5}}
        ]),
    );
    let out = compiler::compile_str(&value.to_string()).unwrap();
    assert!(out.output.contains("kept"));
    assert!(out.has_warning(WarningCode::UnknownElementType));
}

#[test]
fn document_round_trips_through_json() {
    let original = load(doc(
        "label",
        json!({"dpi": 300, "widthMm": 100, "heightMm": 150}),
        json!([
            {"id": "q", "type": "qrcode", "data": "https://x.test/{{id}}",
             "rect": {"x": 5, "y": 5, "width": 20, "height": 20}}
        ]),
    ));
    let again = TemplateDoc::from_json(&original.to_json_pretty().unwrap()).unwrap();
    assert_eq!(again.body, original.body);
    assert_eq!(again.compile().output, original.compile().output);
}

#[test]
fn editor_output_compiles() {
    let mut editor = PageEditor::new();
    let a = editor.add_element(NewElement::new(
        MmRect::new(10.0, 10.0, 40.0, 8.0),
        PageShape::text("Invoice {{number}}"),
    ));
    let b = editor.add_element(NewElement::new(
        MmRect::new(30.0, 40.0, 40.0, 8.0),
        PageShape::text("Due {{due}}"),
    ));
    editor.select(&[a.as_str(), b.as_str()]);
    editor.align(AlignMode::Left);

    let mut doc = load(doc("page", json!({}), json!([])));
    if let DocBody::Page { elements, .. } = &mut doc.body {
        *elements = editor.snapshot();
    }
    let out = doc.compile();
    assert!(out.output.contains("Invoice {{number}}"));
    assert_eq!(out.output.matches("left:10.00mm;").count(), 2);
}

#[test]
fn undo_restores_compiled_output() {
    let mut editor = TextEditor::new();
    let id = editor.add_element(NewElement::new(GridRect::new(0, 0, 10, 1), TextShape::text("first")));

    let mut doc = load(doc("text", json!({"columns": 10}), json!([])));
    let compile = |doc: &mut TemplateDoc, editor: &TextEditor| {
        if let DocBody::Text { elements, .. } = &mut doc.body {
            *elements = editor.snapshot();
        }
        doc.compile().output
    };
    let before = compile(&mut doc, &editor);

    editor.save_to_history();
    editor.update_element(&id, ElementPatch::body(TextShape::text("second")));
    assert_eq!(compile(&mut doc, &editor), "second");

    assert!(editor.undo());
    assert_eq!(compile(&mut doc, &editor), before);
    assert!(editor.redo());
    assert_eq!(compile(&mut doc, &editor), "second");
}
