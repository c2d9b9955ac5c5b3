mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use kilimo_kredo::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
