use ethers::types::U256;
use log::info;
use safe_ranger::node_driver::{prepare_update_network_rules_call, NODE_DRIVER_AUTH_ADDRESS};
use safe_ranger::prelude::Result;
use safe_ranger::{
    Config, EthersConnector, OperationType, SafeClient, TransactionPipeline, TransactionRequest,
};
use std::env;

const DEFAULT_RULES_FILE: &str = "rules.json";

// Sends the contents of a rules file to NodeDriverAuth.updateNetworkRules through a 1/1 Safe.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    let rules_path = env::args()
        .nth(1)
        .or_else(|| env::var("RULES_FILE").ok())
        .unwrap_or_else(|| DEFAULT_RULES_FILE.to_string());

    let connector = EthersConnector::from_config(&config).await?;
    let safe = SafeClient::resolve(connector, config.safe_address).await?;

    let calldata = prepare_update_network_rules_call(&rules_path)?;
    info!("Prepared updateNetworkRules call from {rules_path}");

    println!("Creating transaction with Safe:");
    println!("{}\n", safe.metadata().await?);

    let request = TransactionRequest::new(
        NODE_DRIVER_AUTH_ADDRESS,
        U256::zero(),
        calldata,
        OperationType::Call,
    );

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
