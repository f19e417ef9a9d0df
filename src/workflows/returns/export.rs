use std::io::Write;

use serde::Serialize;

use super::domain::RmaRecord;

#[derive(Debug, Serialize)]
struct RmaRow<'a> {
    name: &'a str,
    origin: &'a str,
    partner_id: u64,
    partner_invoice_id: Option<u64>,
    product_id: u64,
    quantity: f64,
    uom_id: u64,
    move_id: Option<u64>,
    reception_move_id: u64,
    location_id: u64,
    company_id: u64,
    state: &'static str,
    date: String,
}

impl<'a> From<&'a RmaRecord> for RmaRow<'a> {
    fn from(rma: &'a RmaRecord) -> Self {
        let fields = &rma.fields;
        Self {
            name: &rma.name,
            origin: &fields.origin,
            partner_id: fields.partner_id.0,
            partner_invoice_id: fields.partner_invoice_id.map(|id| id.0),
            product_id: fields.product_id.0,
            quantity: fields.quantity,
            uom_id: fields.uom_id.0,
            move_id: fields.move_id.map(|id| id.0),
            reception_move_id: fields.reception_move_id.0,
            location_id: fields.location_id.0,
            company_id: fields.company_id.0,
            state: fields.state.label(),
            date: fields.date.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Write RMAs as CSV with a header row.
pub fn write_rma_csv<W: Write>(rmas: &[RmaRecord], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for rma in rmas {
        out.serialize(RmaRow::from(rma))?;
    }
    out.flush()?;
    Ok(())
}
