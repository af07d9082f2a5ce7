//! # Receipt Rendering
//!
//! Plain-text invoice for a 40-column receipt printer or the screen.
//!
//! ```text
//!                  Tienda
//!            RUC: 0102030405001
//! ----------------------------------------
//! Factura: 20240307-000042
//! Fecha:   2024-03-07 14:05 UTC
//! Cliente: Juan Perez
//! CI/RUC:  0102030405
//! ----------------------------------------
//! Cant Descripcion                   Total
//!    2 Coca Cola 500ml               $1.50
//!        @ $0.75
//! ----------------------------------------
//! Subtotal                           $1.50
//! IVA 15%                            $0.23
//! TOTAL                              $1.73
//! Pago: EFECTIVO
//! ```

use std::fmt::Write;

use tienda_core::{CompletedSale, Money, TaxRate};

use crate::state::StoreConfig;

/// Characters per receipt line.
pub const RECEIPT_WIDTH: usize = 40;

const NAME_WIDTH: usize = 24;

/// Renders a completed sale.
///
/// `tax_rate` labels the tax line and is only known for a sale that was just
/// rung up. Reprints pass `None` and print a bare `IVA`, since the configured
/// rate may have changed since the sale.
pub fn render_receipt(
    config: &StoreConfig,
    sale: &CompletedSale,
    tax_rate: Option<TaxRate>,
) -> String {
    let mut out = String::new();
    let rule = "-".repeat(RECEIPT_WIDTH);

    for line in config.header_lines() {
        let _ = writeln!(out, "{:^width$}", line, width = RECEIPT_WIDTH);
    }
    let _ = writeln!(out, "{}", rule);

    let s = &sale.sale;
    let _ = writeln!(out, "Factura: {}", sale.invoice.invoice_number);
    let _ = writeln!(out, "Fecha:   {}", s.created_at.format("%Y-%m-%d %H:%M UTC"));

    match &s.customer_name {
        Some(name) => {
            let _ = writeln!(out, "Cliente: {}", name);
        }
        None => {
            let _ = writeln!(out, "Cliente: Consumidor final");
        }
    }
    let optional = [
        ("CI/RUC:  ", &s.customer_doc_id),
        ("Tel:     ", &s.customer_phone),
        ("Dir:     ", &s.customer_address),
        ("Email:   ", &s.customer_email),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            let _ = writeln!(out, "{}{}", label, value);
        }
    }
    let _ = writeln!(out, "{}", rule);

    let _ = writeln!(out, "{:>4} {:<w$} {:>10}", "Cant", "Descripcion", "Total", w = NAME_WIDTH);
    for item in &sale.items {
        let name: String = item.product_name.chars().take(NAME_WIDTH).collect();
        let _ = writeln!(
            out,
            "{:>4} {:<w$} {:>10}",
            item.quantity,
            name,
            item.line_total().to_string(),
            w = NAME_WIDTH
        );
        if item.quantity > 1 {
            let _ = writeln!(out, "       @ {}", item.unit_price());
        }
    }
    let _ = writeln!(out, "{}", rule);

    total_line(&mut out, "Subtotal", s.subtotal());
    let tax_label = match tax_rate {
        Some(rate) => format!("IVA {}", rate),
        None => "IVA".to_string(),
    };
    total_line(&mut out, &tax_label, s.tax());
    total_line(&mut out, "TOTAL", s.total());
    let _ = writeln!(out, "Pago: {}", s.payment_method);

    out
}

fn total_line(out: &mut String, label: &str, amount: Money) {
    let amount = amount.to_string();
    let pad = RECEIPT_WIDTH.saturating_sub(label.chars().count());
    let _ = writeln!(out, "{}{:>pad$}", label, amount, pad = pad);
}
