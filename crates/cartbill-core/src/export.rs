//! CSV and spreadsheet exports of the summary table.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};

use crate::summary::SummaryTable;
use crate::{CartBillError, Result};

/// Serialize the table as CSV with an `Item,Unit Price (…),Qty` header.
pub fn to_csv(table: &SummaryTable, currency: &str) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);

    wtr.write_record(SummaryTable::headers(currency))?;

    for row in &table.rows {
        let unit_price = price_cell(row.unit_price);
        let quantity = row.quantity.to_string();
        wtr.write_record([row.item.as_str(), unit_price.as_str(), quantity.as_str()])?;
    }

    wtr.into_inner().map_err(|e| CartBillError::Io(e.into_error()))
}

/// Unit prices always carry a decimal point, so whole prices and the
/// 0 default read as `150.0` and `0.0`.
fn price_cell(price: Decimal) -> String {
    if price.scale() == 0 {
        format!("{price}.0")
    } else {
        price.to_string()
    }
}

/// Serialize the table as a single-sheet XLSX workbook.
pub fn to_xlsx(table: &SummaryTable, currency: &str, sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in SummaryTable::headers(currency).iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = i as u32 + 1;
        worksheet.write_string(r, 0, &row.item)?;
        worksheet.write_number(r, 1, row.unit_price.to_f64().unwrap_or_default())?;
        worksheet.write_number(r, 2, row.quantity)?;
    }

    Ok(workbook.save_to_buffer()?)
}
