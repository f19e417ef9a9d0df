use crate::infra::{demo_stock, DEMO_DELIVERY};
use clap::Args;
use serde_json::json;
use std::sync::Arc;
use stock_rma::config::AppConfig;
use stock_rma::error::AppError;
use stock_rma::workflows::returns::{write_rma_csv, InMemoryStock, StockReturnService};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Return the delivery without raising RMAs.
    #[arg(long)]
    pub(crate) no_rma: bool,
    /// Print the raised RMAs as CSV after the JSON summary.
    #[arg(long)]
    pub(crate) csv: bool,
}

fn demo_service() -> Result<StockReturnService<InMemoryStock>, AppError> {
    let config = AppConfig::load()?;
    let stock = Arc::new(demo_stock()?);
    Ok(StockReturnService::new(stock, config.returns))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = demo_service()?;
    let mut request = service.prepare(DEMO_DELIVERY)?;
    let onchange = service.on_toggle_create_rma(&mut request, !args.no_rma)?;
    println!(
        "{:#}",
        json!({
            "request": request,
            "domain": onchange.domain,
        })
    );

    if let Some(code) = request.source_picking_type() {
        println!("Source type:     {}", code.label());
    }
    println!("Returning:       {} units", request.returned_quantity());

    let outcome = service.create_returns(&request)?;

    println!("Return shipment: {}", outcome.shipment.picking_id);
    println!("Picking type:    {}", outcome.shipment.picking_type_id);
    if outcome.rmas.is_empty() {
        println!("No RMAs raised.");
    }
    for rma in &outcome.rmas {
        println!(
            "- {} product={} qty={} state={} origin={}",
            rma.name,
            rma.fields.product_id,
            rma.fields.quantity,
            rma.fields.state.label(),
            rma.fields.origin
        );
    }

    if args.csv {
        write_rma_csv(&outcome.rmas, std::io::stdout().lock())?;
    }
    Ok(())
}

pub(crate) fn run_rma_export() -> Result<(), AppError> {
    let service = demo_service()?;
    let mut request = service.prepare(DEMO_DELIVERY)?;
    service.on_toggle_create_rma(&mut request, true)?;
    let outcome = service.create_returns(&request)?;
    write_rma_csv(&outcome.rmas, std::io::stdout().lock())?;
    Ok(())
}
