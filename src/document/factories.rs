//! Ready-made business documents: invoices, quotes, receipts and delivery
//! notes. Each factory does the arithmetic up front and hands the result to
//! the matching named template.

use chrono::{Days, Local, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::party::Party;
use super::Document;

pub const DEFAULT_TAX_RATE: f64 = 21.0;
pub const DEFAULT_CURRENCY: &str = "€";
pub const DEFAULT_DUE_DAYS: u64 = 30;
pub const DEFAULT_VALIDITY_DAYS: u64 = 30;

fn one() -> f64 {
    1.0
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Saturates at the last representable date.
fn plus_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or_else(|| {
        warn!("{date} + {days} days is out of range; using {}", NaiveDate::MAX);
        NaiveDate::MAX
    })
}

/// A priced line on an invoice or quote. Unknown keys are kept and passed
/// through to the template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    #[serde(default = "one")]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
    /// Falls back to the document's tax rate.
    #[serde(default)]
    pub vat_rate: Option<f64>,
    /// Overrides `quantity * unit_price`.
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            ..Default::default()
        }
    }

    pub fn vat_rate(mut self, rate: f64) -> Self {
        self.vat_rate = Some(rate);
        self
    }

    pub fn line_total(&self) -> f64 {
        self.total.unwrap_or(self.quantity * self.unit_price)
    }
}

/// A line with every derived value filled in.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub vat_rate: f64,
    pub total: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VatLine {
    pub rate: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceTotals {
    pub lines: Vec<PricedLine>,
    pub subtotal: f64,
    /// One entry per distinct rate, ascending.
    pub vat_lines: Vec<VatLine>,
    pub total: f64,
}

/// Line totals, subtotal, VAT grouped by rate, and grand total.
pub fn compute_invoice(items: &[LineItem], default_rate: f64) -> InvoiceTotals {
    let lines: Vec<PricedLine> = items
        .iter()
        .map(|item| PricedLine {
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            vat_rate: item.vat_rate.unwrap_or(default_rate),
            total: item.line_total(),
            extra: item.extra.clone(),
        })
        .collect();

    let subtotal: f64 = lines.iter().map(|l| l.total).sum();

    let mut vat_lines: Vec<VatLine> = Vec::new();
    for line in &lines {
        let amount = line.total * (line.vat_rate / 100.0);
        match vat_lines.iter_mut().find(|v| v.rate == line.vat_rate) {
            Some(existing) => existing.amount += amount,
            None => vat_lines.push(VatLine {
                rate: line.vat_rate,
                amount,
            }),
        }
    }
    vat_lines.sort_by(|a, b| a.rate.total_cmp(&b.rate));

    let total = subtotal + vat_lines.iter().map(|v| v.amount).sum::<f64>();
    InvoiceTotals {
        lines,
        subtotal,
        vat_lines,
        total,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuoteTotals {
    pub subtotal: f64,
    pub discount: f64,
    pub discount_amount: f64,
    pub vat_rate: f64,
    pub vat_amount: f64,
    pub total: f64,
}

/// Subtotal, percentage discount, single-rate VAT on the discounted amount.
pub fn compute_quote(items: &[LineItem], discount: f64, tax_rate: f64) -> QuoteTotals {
    let subtotal: f64 = items.iter().map(LineItem::line_total).sum();
    let discount_amount = if discount != 0.0 {
        subtotal * (discount / 100.0)
    } else {
        0.0
    };
    let discounted = subtotal - discount_amount;
    let vat_amount = discounted * (tax_rate / 100.0);
    QuoteTotals {
        subtotal,
        discount,
        discount_amount,
        vat_rate: tax_rate,
        vat_amount,
        total: discounted + vat_amount,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentInfo {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub swift: Option<String>,
}

fn default_tax_rate() -> f64 {
    DEFAULT_TAX_RATE
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_validity_days() -> u64 {
    DEFAULT_VALIDITY_DAYS
}

fn default_payment_method() -> String {
    "Cash".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub number: String,
    pub company: Party,
    pub client: Party,
    pub items: Vec<LineItem>,
    /// Defaults to today.
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    /// Defaults to 30 days after the issue date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub payment_info: Option<PaymentInfo>,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub css: String,
}

impl InvoiceRequest {
    pub fn new(number: impl Into<String>, company: Party, client: Party, items: Vec<LineItem>) -> Self {
        Self {
            number: number.into(),
            company,
            client,
            items,
            issue_date: None,
            due_date: None,
            notes: String::new(),
            payment_info: None,
            tax_rate: DEFAULT_TAX_RATE,
            currency: DEFAULT_CURRENCY.to_string(),
            css: String::new(),
        }
    }
}

pub fn create_invoice(req: InvoiceRequest) -> Document {
    let issue_date = req.issue_date.unwrap_or_else(today);
    let due_date = req
        .due_date
        .unwrap_or_else(|| plus_days(issue_date, DEFAULT_DUE_DAYS));
    let totals = compute_invoice(&req.items, req.tax_rate);

    let data = json!({
        "invoice_number": req.number,
        "company": req.company,
        "client": req.client,
        "items": totals.lines,
        "issue_date": issue_date,
        "due_date": due_date,
        "notes": req.notes,
        "payment_info": req.payment_info,
        "subtotal": totals.subtotal,
        "vat_lines": totals.vat_lines,
        "total": totals.total,
        "currency": req.currency,
    });
    Document::new(format!("Invoice {}", req.number))
        .named("invoice")
        .with_data(data)
        .with_css(req.css)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub number: String,
    pub company: Party,
    pub client: Party,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default = "default_validity_days")]
    pub validity_days: u64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub terms: String,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Percentage, e.g. `10.0` for 10%.
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub css: String,
}

impl QuoteRequest {
    pub fn new(number: impl Into<String>, company: Party, client: Party, items: Vec<LineItem>) -> Self {
        Self {
            number: number.into(),
            company,
            client,
            items,
            issue_date: None,
            validity_days: DEFAULT_VALIDITY_DAYS,
            notes: String::new(),
            terms: String::new(),
            tax_rate: DEFAULT_TAX_RATE,
            currency: DEFAULT_CURRENCY.to_string(),
            discount: 0.0,
            css: String::new(),
        }
    }
}

pub fn create_quote(req: QuoteRequest) -> Document {
    let issue_date = req.issue_date.unwrap_or_else(today);
    let validity_date = plus_days(issue_date, req.validity_days);
    let totals = compute_quote(&req.items, req.discount, req.tax_rate);
    let items: Vec<PricedLine> = compute_invoice(&req.items, req.tax_rate).lines;

    let data = json!({
        "quote_number": req.number,
        "company": req.company,
        "client": req.client,
        "items": items,
        "issue_date": issue_date,
        "validity_date": validity_date,
        "validity_days": req.validity_days,
        "notes": req.notes,
        "terms": req.terms,
        "subtotal": totals.subtotal,
        "discount": totals.discount,
        "discount_amount": totals.discount_amount,
        "vat_rate": totals.vat_rate,
        "vat_amount": totals.vat_amount,
        "total": totals.total,
        "currency": req.currency,
    });
    Document::new(format!("Quote {}", req.number))
        .named("quote")
        .with_data(data)
        .with_css(req.css)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptRequest {
    pub number: String,
    pub company: Party,
    pub client: Party,
    pub amount: f64,
    pub concept: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub css: String,
}

impl ReceiptRequest {
    pub fn new(
        number: impl Into<String>,
        company: Party,
        client: Party,
        amount: f64,
        concept: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            company,
            client,
            amount,
            concept: concept.into(),
            payment_method: default_payment_method(),
            payment_date: None,
            notes: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            css: String::new(),
        }
    }
}

pub fn create_receipt(req: ReceiptRequest) -> Document {
    let data = json!({
        "receipt_number": req.number,
        "company": req.company,
        "client": req.client,
        "amount": req.amount,
        "concept": req.concept,
        "payment_method": req.payment_method,
        "date": req.payment_date.unwrap_or_else(today),
        "notes": req.notes,
        "currency": req.currency,
    });
    Document::new(format!("Receipt {}", req.number))
        .named("receipt")
        .with_data(data)
        .with_css(req.css)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryItem {
    #[serde(default)]
    pub code: Option<String>,
    pub description: String,
    pub quantity: f64,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl DeliveryItem {
    pub fn new(code: impl Into<String>, description: impl Into<String>, quantity: f64) -> Self {
        Self {
            code: Some(code.into()),
            description: description.into(),
            quantity,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryNoteRequest {
    pub number: String,
    pub company: Party,
    pub client: Party,
    pub items: Vec<DeliveryItem>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    /// Defaults to the client's address.
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub tracking_number: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub css: String,
}

impl DeliveryNoteRequest {
    pub fn new(number: impl Into<String>, company: Party, client: Party, items: Vec<DeliveryItem>) -> Self {
        Self {
            number: number.into(),
            company,
            client,
            items,
            delivery_date: None,
            shipping_address: None,
            carrier: String::new(),
            tracking_number: String::new(),
            notes: String::new(),
            css: String::new(),
        }
    }
}

pub fn create_delivery_note(req: DeliveryNoteRequest) -> Document {
    let delivery_address = req
        .shipping_address
        .filter(|a| !a.is_empty())
        .or_else(|| req.client.address.clone())
        .unwrap_or_default();

    let data = json!({
        "delivery_number": req.number,
        "company": req.company,
        "client": req.client,
        "items": req.items,
        "delivery_address": delivery_address,
        "date": req.delivery_date.unwrap_or_else(today),
        "carrier": req.carrier,
        "tracking_number": req.tracking_number,
        "notes": req.notes,
    });
    Document::new(format!("Delivery Note {}", req.number))
        .named("delivery_note")
        .with_data(data)
        .with_css(req.css)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BaseDocument;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn invoice_groups_vat_by_rate() {
        let items = vec![
            LineItem::new("A", 2.0, 100.0),
            LineItem::new("B", 1.0, 50.0).vat_rate(10.0),
            LineItem::new("C", 1.0, 300.0),
        ];
        let totals = compute_invoice(&items, 21.0);
        assert!(close(totals.subtotal, 550.0));
        assert_eq!(totals.vat_lines.len(), 2);
        assert_eq!(totals.vat_lines[0].rate, 10.0);
        assert!(close(totals.vat_lines[0].amount, 5.0));
        assert_eq!(totals.vat_lines[1].rate, 21.0);
        assert!(close(totals.vat_lines[1].amount, 105.0));
        assert!(close(totals.total, 660.0));
    }

    #[test]
    fn explicit_line_total_wins() {
        let mut item = LineItem::new("Flat fee", 3.0, 10.0);
        item.total = Some(25.0);
        let totals = compute_invoice(&[item], 0.0);
        assert!(close(totals.subtotal, 25.0));
        assert_eq!(totals.vat_lines, vec![VatLine { rate: 0.0, amount: 0.0 }]);
    }

    #[test]
    fn quote_applies_discount_before_vat() {
        let totals = compute_quote(&[LineItem::new("Y", 1.0, 1000.0)], 10.0, 21.0);
        assert!(close(totals.discount_amount, 100.0));
        assert!(close(totals.vat_amount, 189.0));
        assert!(close(totals.total, 1089.0));
    }

    #[test]
    fn missing_quantity_defaults_to_one() {
        let item: LineItem = serde_json::from_value(json!({
            "description": "X", "unit_price": 40, "sku": "X-1"
        }))
        .unwrap();
        assert_eq!(item.quantity, 1.0);
        assert_eq!(item.extra["sku"], "X-1");
    }

    #[test]
    fn invoice_due_date_defaults_to_thirty_days() {
        let mut req = InvoiceRequest::new("INV-1", Party::new("Co"), Party::new("Cl"), vec![]);
        req.issue_date = NaiveDate::from_ymd_opt(2024, 1, 15);
        let doc = create_invoice(req);
        assert_eq!(doc.data()["due_date"], "2024-02-14");
        assert_eq!(doc.title(), "Invoice INV-1");
    }

    #[test]
    fn huge_validity_saturates_instead_of_collapsing() {
        let issue = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(plus_days(issue, 14), NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert_eq!(plus_days(issue, u64::MAX), NaiveDate::MAX);

        let mut req = QuoteRequest::new("Q-9", Party::new("Co"), Party::new("Cl"), vec![]);
        req.issue_date = Some(issue);
        req.validity_days = u64::MAX;
        let doc = create_quote(req);
        assert_eq!(doc.data()["validity_date"], json!(NaiveDate::MAX));
    }

    #[test]
    fn delivery_address_falls_back_to_client() {
        let client = Party::new("Cl").address("456 Delivery St");
        let req = DeliveryNoteRequest::new("DN-1", Party::new("Co"), client.clone(), vec![]);
        assert_eq!(create_delivery_note(req).data()["delivery_address"], "456 Delivery St");

        let mut req = DeliveryNoteRequest::new("DN-2", Party::new("Co"), client, vec![]);
        req.shipping_address = Some("Dock 4".into());
        assert_eq!(create_delivery_note(req).data()["delivery_address"], "Dock 4");
    }
}
