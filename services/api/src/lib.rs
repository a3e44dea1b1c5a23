mod cli;
mod infra;
mod routes;
mod server;

use secret_finder::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
