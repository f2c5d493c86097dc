mod common;

use chrono::NaiveDate;
use reportkit::document::{
    available_templates, create_delivery_note, create_invoice, create_quote, create_receipt,
    DeliveryItem, DeliveryNoteRequest, InvoiceRequest, LineItem, Party, PaymentInfo,
    QuoteRequest, ReceiptRequest, DOCUMENT_CSS,
};
use reportkit::{BaseDocument, Document, ReportError, TemplateSource};
use serde_json::json;
use tempfile::TempDir;

fn company() -> Party {
    Party::new("My Company Ltd.")
        .tax_id("B12345678")
        .address("Main St 1")
        .city("Madrid")
        .postal_code("28001")
}

fn client() -> Party {
    Party::new("Client <Corp>").address("Client Ave 9")
}

#[test]
fn test_invoice_scenario_totals() {
    let doc = create_invoice({
        let mut req = InvoiceRequest::new(
            "INV-1",
            company(),
            client(),
            vec![LineItem::new("X", 2.0, 100.0)],
        );
        req.tax_rate = 20.0;
        req
    });

    let data = doc.data();
    assert_eq!(data["subtotal"], json!(200.0));
    assert_eq!(data["vat_lines"], json!([{ "rate": 20.0, "amount": 40.0 }]));
    assert_eq!(data["total"], json!(240.0));
    assert_eq!(doc.title(), "Invoice INV-1");
    assert_eq!(
        doc.template_source(),
        Some(&TemplateSource::Named("invoice".into()))
    );
}

#[test]
fn test_invoice_due_date_defaults_to_thirty_days() {
    let mut req = InvoiceRequest::new("INV-2", company(), client(), vec![]);
    req.issue_date = NaiveDate::from_ymd_opt(2025, 1, 15);
    let doc = create_invoice(req);
    assert_eq!(doc.data()["issue_date"], "2025-01-15");
    assert_eq!(doc.data()["due_date"], "2025-02-14");
}

#[test]
fn test_quote_scenario_totals() {
    let mut req = QuoteRequest::new(
        "Q-1",
        company(),
        client(),
        vec![LineItem::new("Y", 1.0, 1000.0)],
    );
    req.discount = 10.0;
    req.tax_rate = 21.0;
    let doc = create_quote(req);

    let data = doc.data();
    assert_eq!(data["subtotal"], json!(1000.0));
    assert_eq!(data["discount_amount"], json!(100.0));
    assert_eq!(data["vat_amount"], json!(189.0));
    assert_eq!(data["total"], json!(1089.0));
}

#[test]
fn test_invoice_renders_with_shipped_template() {
    let dir = TempDir::new().unwrap();
    let ctx = common::context(&dir);

    let mut req = InvoiceRequest::new(
        "INV-42",
        company(),
        client(),
        vec![
            LineItem::new("Consulting", 10.0, 150.0),
            LineItem::new("Books", 2.0, 25.0).vat_rate(4.0),
        ],
    );
    req.notes = "Thanks!\nSee you soon".into();
    req.payment_info = Some(PaymentInfo {
        method: Some("Transfer".into()),
        iban: Some("ES00 0000".into()),
        ..Default::default()
    });
    let html = create_invoice(req).render(&ctx).unwrap();

    assert!(html.contains("INV-42"));
    assert!(html.contains("Client &lt;Corp&gt;"));
    assert!(html.contains("1.550,00 €"));
    assert!(html.contains("VAT 4%"));
    assert!(html.contains("VAT 21%"));
    assert!(html.contains("Thanks!<br>"));
    assert!(html.contains("ES00 0000"));
    assert!(html.contains(".invoice-parties"));
}

#[test]
fn test_receipt_and_delivery_note_render() {
    let dir = TempDir::new().unwrap();
    let ctx = common::context(&dir);

    let receipt = create_receipt(ReceiptRequest::new(
        "R-7",
        company(),
        client(),
        250.0,
        "Deposit",
    ));
    let html = receipt.render(&ctx).unwrap();
    assert!(html.contains("RECEIPT R-7"));
    assert!(html.contains("250,00 €"));
    assert!(html.contains("Payment method: Cash"));

    let note = create_delivery_note(DeliveryNoteRequest::new(
        "DN-1",
        company(),
        client(),
        vec![DeliveryItem::new("SKU-1", "Chair", 4.0)],
    ));
    assert_eq!(note.data()["delivery_address"], "Client Ave 9");
    let html = note.render(&ctx).unwrap();
    assert!(html.contains("DN-1"));
    assert!(html.contains("SKU-1"));
    assert!(html.contains("Client Ave 9"));
}

#[test]
fn test_inline_template_escapes_data() {
    let dir = TempDir::new().unwrap();
    let ctx = common::context(&dir);

    let doc = Document::new("Inline")
        .inline("<h1>{{ name }}</h1>")
        .with_data(json!({ "name": "A & B" }));
    let html = doc.render(&ctx).unwrap();
    assert!(html.contains("<h1>A &amp; B</h1>"));
}

#[test]
fn test_detected_template_kinds() {
    let dir = TempDir::new().unwrap();
    let ctx = common::context(&dir);

    let inline = Document::new("t")
        .template(TemplateSource::detect("<b>{{ n }}</b>"))
        .with_data(json!({ "n": 3 }));
    assert!(inline.render(&ctx).unwrap().contains("<b>3</b>"));

    let named = Document::new("t").template(TemplateSource::detect("receipt.html"));
    assert_eq!(
        named.template_source(),
        Some(&TemplateSource::Named("receipt.html".into()))
    );
}

#[test]
fn test_missing_named_template() {
    let dir = TempDir::new().unwrap();
    let ctx = common::context(&dir);

    let err = Document::new("x").named("contract").render(&ctx).unwrap_err();
    match err {
        ReportError::TemplateNotFound { name, dir } => {
            assert_eq!(name, "contract.html");
            assert_eq!(dir, common::package_dir().join("templates"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_document_without_template() {
    let dir = TempDir::new().unwrap();
    let ctx = common::context(&dir);

    let html = Document::new("Nothing").render(&ctx).unwrap();
    assert!(html.contains("No template specified"));
}

#[test]
fn test_custom_templates_dir_and_css() {
    let dir = TempDir::new().unwrap();
    let ctx = common::context(&dir);
    let templates = dir.path().join("tpl");
    common::write(&templates.join("base.html"), "<main>{% block body %}{% endblock %}</main>");
    common::write(
        &templates.join("letter.html"),
        "{% extends \"base.html\" %}{% block body %}Dear {{ to }}{% endblock %}",
    );

    let doc = Document::new("Letter")
        .named("letter")
        .with_templates_dir(&templates)
        .with_data(json!({ "to": "Ann" }))
        .with_css(".letter { margin: 0; }");

    let html = doc.render(&ctx).unwrap();
    assert!(html.contains("<main>Dear Ann</main>"));
    let css = doc.render_css(&ctx).unwrap();
    assert!(css.starts_with(DOCUMENT_CSS));
    assert!(css.ends_with(".letter { margin: 0; }"));

    assert_eq!(available_templates(&templates), vec!["base", "letter"]);
}

#[test]
fn test_shipped_templates_are_listed() {
    let names = available_templates(&common::package_dir().join("templates"));
    assert_eq!(names, vec!["delivery_note", "invoice", "quote", "receipt"]);
    assert!(available_templates(std::path::Path::new("/no/such/dir")).is_empty());
}
