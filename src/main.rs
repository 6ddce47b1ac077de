#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = pee_feedback::run().await {
        eprintln!("pee-feedback fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
