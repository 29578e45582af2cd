//! Admin data export.
//!
//! Users, orders and expenses are flattened into three tables, then rendered
//! either as one CSV stream with labelled sections or as an XLSX workbook
//! with one sheet per table. The XLSX renderer is behind the `xlsx` feature.

use crate::{
    core::{
        access::{Capability, Principal, authorize},
        auth::normalize_photo_path,
        order::{OrderDetails, load_order_details},
    },
    entities::{Expense, Order, User, expense, order, order_line, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use tracing::info;

/// Requested export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Parses the `type` query parameter; absent means XLSX.
    pub fn from_query(raw: Option<&str>) -> Result<Self> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("" | "xlsx") => Ok(Self::Xlsx),
            Some("csv") => Ok(Self::Csv),
            Some(other) => Err(Error::validation(format!("Unknown export type: {other}"))),
        }
    }

    const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// A rendered export, ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// One value in an exported table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[allow(clippy::cast_precision_loss)]
    fn int(value: i64) -> Self {
        Self::Number(value as f64)
    }

    fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// A labelled table: header plus rows.
#[derive(Debug, Clone)]
pub struct Table {
    /// Section label in the CSV stream
    pub label: &'static str,
    /// Worksheet name in the workbook
    pub sheet: &'static str,
    pub header: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

const USERS_HEADER: &[&str] = &[
    "id",
    "name",
    "email",
    "pnr",
    "verified",
    "id_photo_url",
    "created_at",
];

const ORDERS_HEADER: &[&str] = &[
    "order_id",
    "customer_name",
    "customer_email",
    "items_count",
    "items_detail",
    "items_json",
    "total_amount",
    "payment_status",
    "order_status",
    "order_time",
    "estimated_time",
    "preparation_started",
    "preparation_completed",
    "notification_sent",
];

const EXPENSES_HEADER: &[&str] = &[
    "expense_id",
    "description",
    "amount",
    "category",
    "expense_date",
    "created_at",
];

fn timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn optional_timestamp(value: Option<DateTime<Utc>>) -> String {
    value.map(timestamp).unwrap_or_default()
}

/// Absolute URL of a stored ID photo, or empty if there is none.
#[must_use]
pub fn photo_url(base_url: &str, stored: Option<&str>) -> String {
    let relative = stored.map(normalize_photo_path).unwrap_or_default();
    if relative.is_empty() {
        String::new()
    } else {
        format!("{}/uploads/{relative}", base_url.trim_end_matches('/'))
    }
}

/// `name xQTY @ PRICE = AMOUNT` for each line, joined by `; `.
#[must_use]
pub fn items_detail(lines: &[order_line::Model]) -> String {
    lines
        .iter()
        .map(|l| format!("{} x{} @ {} = {}", l.name, l.quantity, l.unit_price, l.amount()))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Serialize)]
struct LineJson<'a> {
    id: i64,
    name: &'a str,
    price: f64,
    quantity: i32,
}

fn items_json(lines: &[order_line::Model]) -> Result<String> {
    let items: Vec<LineJson<'_>> = lines
        .iter()
        .map(|l| LineJson {
            id: l.menu_item_id,
            name: &l.name,
            price: l.unit_price,
            quantity: l.quantity,
        })
        .collect();
    serde_json::to_string(&items).map_err(|e| Error::Render {
        format: "JSON",
        message: e.to_string(),
    })
}

fn users_table(users: &[user::Model], base_url: &str) -> Table {
    let rows = users
        .iter()
        .map(|u| {
            vec![
                Cell::int(u.id),
                Cell::text(&u.name),
                Cell::text(&u.email),
                Cell::text(&u.pnr),
                Cell::Bool(u.verified),
                Cell::Text(photo_url(base_url, u.id_photo_path.as_deref())),
                Cell::Text(timestamp(u.created_at)),
            ]
        })
        .collect();
    Table {
        label: "USERS",
        sheet: "Users",
        header: USERS_HEADER,
        rows,
    }
}

fn orders_table(orders: &[OrderDetails]) -> Result<Table> {
    let mut rows = Vec::with_capacity(orders.len());
    for details in orders {
        let o = &details.order.order;
        let lines = &details.order.lines;
        rows.push(vec![
            Cell::int(o.id),
            Cell::Text(details.customer_name.clone().unwrap_or_default()),
            Cell::Text(details.customer_email.clone().unwrap_or_default()),
            Cell::int(details.order.item_count()),
            Cell::Text(items_detail(lines)),
            Cell::Text(items_json(lines)?),
            Cell::Number(o.total_amount),
            Cell::Text(o.payment_status.to_value()),
            Cell::Text(o.order_status.to_value()),
            Cell::Text(timestamp(o.order_time)),
            Cell::int(i64::from(o.estimated_time)),
            Cell::Text(optional_timestamp(o.preparation_started)),
            Cell::Text(optional_timestamp(o.preparation_completed)),
            Cell::Bool(o.notification_sent),
        ]);
    }
    Ok(Table {
        label: "ORDERS",
        sheet: "Orders",
        header: ORDERS_HEADER,
        rows,
    })
}

fn expenses_table(expenses: &[expense::Model]) -> Table {
    let rows = expenses
        .iter()
        .map(|e| {
            vec![
                Cell::int(e.id),
                Cell::text(&e.description),
                Cell::Number(e.amount),
                Cell::text(&e.category),
                Cell::Text(timestamp(e.expense_date)),
                Cell::Text(timestamp(e.created_at)),
            ]
        })
        .collect();
    Table {
        label: "EXPENSES",
        sheet: "Expenses",
        header: EXPENSES_HEADER,
        rows,
    }
}

/// Loads and flattens everything the export contains.
pub async fn collect_tables(db: &DatabaseConnection, base_url: &str) -> Result<Vec<Table>> {
    let users = User::find().order_by_asc(user::Column::Id).all(db).await?;
    let orders = load_order_details(
        db,
        Order::find()
            .order_by_desc(order::Column::OrderTime)
            .order_by_desc(order::Column::Id),
    )
    .await?;
    let expenses = Expense::find()
        .order_by_desc(expense::Column::ExpenseDate)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await?;

    Ok(vec![
        users_table(&users, base_url),
        orders_table(&orders)?,
        expenses_table(&expenses),
    ])
}

/// Renders the tables as one CSV stream, sections separated by a blank line.
pub fn render_csv(tables: &[Table]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(out);
        writer.write_record([table.label])?;
        writer.write_record(table.header)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(Cell::render))?;
        }
        out = writer.into_inner().map_err(|e| Error::Render {
            format: "CSV",
            message: e.to_string(),
        })?;
    }
    Ok(out)
}

/// Renders the tables as a workbook with a bold header row on each sheet.
#[cfg(feature = "xlsx")]
pub fn render_xlsx(tables: &[Table]) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook, XlsxError};

    fn render_err(e: XlsxError) -> Error {
        Error::Render {
            format: "XLSX",
            message: e.to_string(),
        }
    }

    fn position(row: usize, col: usize) -> Result<(u32, u16)> {
        let row = u32::try_from(row).map_err(|_| Error::Render {
            format: "XLSX",
            message: "too many rows".to_string(),
        })?;
        let col = u16::try_from(col).map_err(|_| Error::Render {
            format: "XLSX",
            message: "too many columns".to_string(),
        })?;
        Ok((row, col))
    }

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for table in tables {
        let sheet = workbook.add_worksheet();
        sheet.set_name(table.sheet).map_err(render_err)?;

        for (c, title) in table.header.iter().enumerate() {
            let (r, c) = position(0, c)?;
            sheet
                .write_string_with_format(r, c, *title, &bold)
                .map_err(render_err)?;
        }
        for (i, row) in table.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = position(i + 1, c)?;
                let written = match cell {
                    Cell::Text(s) => sheet.write_string(r, c, s),
                    Cell::Number(n) => sheet.write_number(r, c, *n),
                    Cell::Bool(b) => sheet.write_boolean(r, c, *b),
                };
                written.map_err(render_err)?;
            }
        }
        sheet.set_freeze_panes(1, 0).map_err(render_err)?;
    }

    workbook.save_to_buffer().map_err(render_err)
}

#[cfg(not(feature = "xlsx"))]
pub fn render_xlsx(_tables: &[Table]) -> Result<Vec<u8>> {
    Err(Error::ExportUnavailable {
        format: "Excel",
        feature: "xlsx",
    })
}

/// Builds the admin export in the requested format.
///
/// # Errors
/// Returns an error if the caller is not an admin, the format's renderer is
/// compiled out, or loading and rendering fail.
pub async fn export_data(
    db: &DatabaseConnection,
    principal: &Principal,
    base_url: &str,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> Result<ExportFile> {
    authorize(principal, Capability::ExportData)?;

    let tables = collect_tables(db, base_url).await?;
    let bytes = match format {
        ExportFormat::Csv => render_csv(&tables)?,
        ExportFormat::Xlsx => render_xlsx(&tables)?,
    };

    info!(?format, bytes = bytes.len(), "data exported");
    Ok(ExportFile {
        filename: format!(
            "canteen_export_{}.{}",
            now.format("%Y%m%d_%H%M%S"),
            format.extension()
        ),
        content_type: format.content_type(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::payment::{GatewayConfig, PaymentProof, confirm_payment};
    use crate::test_utils::*;
    use sea_orm::Set;

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::from_query(None).unwrap(), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::from_query(Some("CSV")).unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_query(Some("xlsx")).unwrap(), ExportFormat::Xlsx);
        assert!(ExportFormat::from_query(Some("pdf")).is_err());
    }

    #[test]
    fn test_photo_url() {
        let base = "http://canteen.local:5000/";
        assert_eq!(
            photo_url(base, Some("id_proofs/42_asha.png")),
            "http://canteen.local:5000/uploads/id_proofs/42_asha.png"
        );
        assert_eq!(
            photo_url(base, Some("uploads\\id_proofs\\42_asha.png")),
            "http://canteen.local:5000/uploads/id_proofs/42_asha.png"
        );
        assert_eq!(photo_url(base, None), "");
        assert_eq!(photo_url(base, Some("")), "");
    }

    #[tokio::test]
    async fn test_csv_export_sections() -> Result<()> {
        let (db, student, item) = setup_with_student_and_item().await?;
        let tea = create_test_menu_item(&db, "Tea", 20.0).await?;

        let mut photo: user::ActiveModel = student.clone().into();
        photo.id_photo_path = Set(Some("id_proofs/PNR1_Test_Student.png".to_string()));
        photo.update(&db).await?;

        let placed = crate::core::order::place_order(
            &db,
            &student_principal(student.id),
            &[
                crate::core::order::CartLine { item_id: item.id, quantity: 2 },
                crate::core::order::CartLine { item_id: tea.id, quantity: 1 },
            ],
        )
        .await?;
        confirm_payment(&db, &GatewayConfig::default(), placed.order.id, &PaymentProof::Simulated).await?;

        let file = export_data(
            &db,
            &admin_principal(),
            "http://canteen.local",
            ExportFormat::Csv,
            Utc::now(),
        )
        .await?;
        assert!(file.filename.starts_with("canteen_export_"));
        assert!(file.filename.ends_with(".csv"));
        assert_eq!(file.content_type, "text/csv");

        let text = String::from_utf8(file.bytes).unwrap();
        assert!(text.starts_with("USERS\nid,name,email,pnr,verified,id_photo_url,created_at\n"));
        assert!(text.contains("\n\nORDERS\norder_id,customer_name,"));
        assert!(text.contains("\n\nEXPENSES\nexpense_id,description,"));
        assert!(text.contains("http://canteen.local/uploads/id_proofs/PNR1_Test_Student.png"));
        assert!(text.contains("Chicken Biryani x2 @ 180 = 360; Tea x1 @ 20 = 20"));
        assert!(text.contains(",380,Paid,Pending,"));
        Ok(())
    }

    #[tokio::test]
    async fn test_export_requires_admin() -> Result<()> {
        let db = setup_test_db().await?;
        let result = export_data(&db, &kitchen_principal(), "", ExportFormat::Csv, Utc::now()).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized));
        Ok(())
    }

    #[cfg(feature = "xlsx")]
    #[tokio::test]
    async fn test_xlsx_export_is_a_zip() -> Result<()> {
        let (db, student, item) = setup_with_student_and_item().await?;
        place_test_order(&db, student.id, item.id, 1).await?;

        let file = export_data(&db, &admin_principal(), "", ExportFormat::Xlsx, Utc::now()).await?;
        assert!(file.filename.ends_with(".xlsx"));
        assert_eq!(&file.bytes[..2], b"PK");
        Ok(())
    }

    #[cfg(not(feature = "xlsx"))]
    #[tokio::test]
    async fn test_xlsx_export_unavailable() -> Result<()> {
        let db = setup_test_db().await?;
        let result = export_data(&db, &admin_principal(), "", ExportFormat::Xlsx, Utc::now()).await;
        assert!(matches!(result.unwrap_err(), Error::ExportUnavailable { .. }));
        Ok(())
    }
}
