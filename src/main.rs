#[tokio::main]
async fn main() {
    if let Err(message) = table_king_lib::run().await {
        eprintln!("{message}");
        std::process::exit(1);
    }
}
