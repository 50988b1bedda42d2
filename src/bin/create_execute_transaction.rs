use safe_ranger::prelude::Result;
use safe_ranger::{
    Config, EthersConnector, OperationType, SafeClient, TransactionPipeline, TransactionRequest,
};

// Creates, signs and executes a transaction for an existing 1/1 Safe.
const RECIPIENT: &str = "0xdb6026ccc2bbed2725e2fb9b1b12785e89d9dfb3";
const CALLDATA: &str = "0x6057361d0000000000000000000000000000000000000000000000000000000000000002";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    let connector = EthersConnector::from_config(&config).await?;
    let safe = SafeClient::resolve(connector, config.safe_address).await?;

    println!("Creating transaction with Safe:");
    println!("{}\n", safe.metadata().await?);

    let request = TransactionRequest::parse(RECIPIENT, "0", CALLDATA, OperationType::Call.into())?;

    match TransactionPipeline::new(&safe, &config.signer).run(request).await {
        Ok(result) => {
            println!("Successfully executed the transaction:");
            println!(" - Tx hash: {:?}", result.transaction_hash);
        }
        Err(e) => {
            println!("`{}` failed:", e.stage);
            println!("{}", e.source);
            std::process::exit(1);
        }
    }

    Ok(())
}
