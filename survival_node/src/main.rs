#[tokio::main]
async fn main() -> std::io::Result<()> {
    survival_node::run_with_config().await
}
