mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use stock_rma::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
