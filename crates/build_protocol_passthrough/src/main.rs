use build_protocol_passthrough::PassthroughInstantiator;

#[tokio::main]
pub async fn main() {
    if let Err(err) = build_protocol_backend::cli::main(|| PassthroughInstantiator).await {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}
