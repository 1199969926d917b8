mod app;
mod capture;
mod commands;
mod config;
mod history;
mod library;
mod logging;
mod session;
mod ui;
mod upload;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
