//! PDF invoices.
//!
//! Layout is computed separately from rendering so pagination can be checked
//! without a PDF backend. Rendering uses printpdf's built-in Helvetica, which
//! has no rupee glyph, so amounts are prefixed with "Rs.".

use crate::{
    core::{
        access::{Capability, Principal, Role, authorize},
        order::{OrderDetails, load_order_details},
    },
    entities::Order,
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use tracing::{info, warn};

/// A4 portrait, millimetres.
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const LEFT_MM: f32 = 20.0;
const QTY_MM: f32 = 125.0;
const AMOUNT_MM: f32 = 150.0;
const ROW_STEP_MM: f32 = 7.0;
const BOTTOM_MARGIN_MM: f32 = 30.0;
const TOP_MM: f32 = PAGE_HEIGHT_MM - 20.0;

/// A single run of text placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x_mm: f32,
    pub y_mm: f32,
    pub size_pt: f32,
    pub bold: bool,
}

impl TextRun {
    fn new(text: impl Into<String>, x_mm: f32, y_mm: f32, size_pt: f32, bold: bool) -> Self {
        Self {
            text: text.into(),
            x_mm,
            y_mm,
            size_pt,
            bold,
        }
    }
}

/// Positions every piece of text for an invoice, page by page.
#[must_use]
pub fn layout_invoice(details: &OrderDetails) -> Vec<Vec<TextRun>> {
    let order = &details.order.order;
    let mut pages = Vec::new();
    let mut page = vec![
        TextRun::new("Smart Canteen - Tax Invoice", LEFT_MM, TOP_MM, 16.0, true),
        TextRun::new(format!("Order ID: #{}", order.id), LEFT_MM, TOP_MM - 6.0, 10.0, false),
        TextRun::new(
            format!("Order Time: {}", order.order_time.format("%Y-%m-%d %H:%M:%S")),
            LEFT_MM,
            TOP_MM - 11.0,
            10.0,
            false,
        ),
    ];
    if let Some(name) = &details.customer_name {
        let email = details.customer_email.as_deref().unwrap_or_default();
        page.push(TextRun::new(
            format!("Customer: {name} ({email})"),
            LEFT_MM,
            TOP_MM - 16.0,
            10.0,
            false,
        ));
    }

    let header_y = TOP_MM - 30.0;
    page.push(TextRun::new("Item", LEFT_MM, header_y, 11.0, true));
    page.push(TextRun::new("Qty", QTY_MM, header_y, 11.0, true));
    page.push(TextRun::new("Amount (Rs.)", AMOUNT_MM, header_y, 11.0, true));

    let mut y = header_y - 10.0;
    for line in &details.order.lines {
        page.push(TextRun::new(line.name.clone(), LEFT_MM, y, 10.0, false));
        page.push(TextRun::new(line.quantity.to_string(), QTY_MM, y, 10.0, false));
        page.push(TextRun::new(format!("{:.2}", line.amount()), AMOUNT_MM, y, 10.0, false));
        y -= ROW_STEP_MM;
        if y < BOTTOM_MARGIN_MM {
            pages.push(std::mem::take(&mut page));
            y = TOP_MM;
        }
    }

    page.push(TextRun::new(
        format!("Total: Rs. {:.2}", order.total_amount),
        QTY_MM,
        y - 8.0,
        12.0,
        true,
    ));
    page.push(TextRun::new(
        "Thank you for ordering with Smart Canteen!",
        LEFT_MM,
        15.0,
        9.0,
        false,
    ));
    pages.push(page);
    pages
}

#[cfg(feature = "pdf")]
fn render_pdf(title: &str, pages: &[Vec<TextRun>]) -> Result<Vec<u8>> {
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    let render_err = |e: printpdf::Error| Error::Render {
        format: "PDF",
        message: e.to_string(),
    };

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;

    for (i, runs) in pages.iter().enumerate() {
        let (page, layer) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page).get_layer(layer);
        for run in runs {
            let font = if run.bold { &bold } else { &regular };
            layer.use_text(run.text.as_str(), run.size_pt, Mm(run.x_mm), Mm(run.y_mm), font);
        }
    }

    doc.save_to_bytes().map_err(render_err)
}

#[cfg(not(feature = "pdf"))]
fn render_pdf(_title: &str, _pages: &[Vec<TextRun>]) -> Result<Vec<u8>> {
    Err(Error::ExportUnavailable {
        format: "PDF",
        feature: "pdf",
    })
}

/// Renders the invoice for an order.
///
/// Students may only download invoices for their own orders; admin and
/// kitchen staff may download any.
///
/// # Errors
/// Returns an error if:
/// - The order does not exist
/// - A student asks for someone else's invoice
/// - The `pdf` feature is compiled out
pub async fn invoice_pdf(
    db: &DatabaseConnection,
    principal: &Principal,
    order_id: i64,
) -> Result<Vec<u8>> {
    authorize(principal, Capability::DownloadInvoice)?;

    let details = load_order_details(db, Order::find_by_id(order_id))
        .await?
        .pop()
        .ok_or(Error::OrderNotFound { order_id })?;

    if principal.is(Role::Student) && details.order.order.user_id != principal.id {
        warn!(order_id, principal_id = principal.id, "invoice requested for another user's order");
        return Err(Error::Unauthorized);
    }

    let pages = layout_invoice(&details);
    let bytes = render_pdf(&format!("Invoice #{order_id}"), &pages)?;
    info!(order_id, pages = pages.len(), "invoice rendered");
    Ok(bytes)
}

/// Attachment file name for an invoice.
#[must_use]
pub fn invoice_filename(order_id: i64) -> String {
    format!("invoice_{order_id}.pdf")
}
