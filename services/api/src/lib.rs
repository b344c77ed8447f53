mod cli;
mod infra;
mod routes;
mod server;

use portfolio_contact::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
