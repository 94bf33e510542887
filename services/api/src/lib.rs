mod cli;
mod demo;
mod feasibility;
mod infra;
mod routes;
mod server;

use deal_flow::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
