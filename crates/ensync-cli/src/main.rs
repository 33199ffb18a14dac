//! `ensync` binary entrypoint.

#[tokio::main]
async fn main() {
    let code = ensync_cli::run().await;
    std::process::exit(code);
}
