#[tokio::main]
async fn main() -> std::process::ExitCode {
    deploy_contracts::start(std::env::args()).await
}
