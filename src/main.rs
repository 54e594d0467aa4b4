#[tokio::main]
async fn main() {
    if let Err(e) = healthecho_lib::run().await {
        tracing::error!("{e}");
        eprintln!("healthecho: {e}");
        std::process::exit(1);
    }
}
