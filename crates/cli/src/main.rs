use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use clap::{Parser, Subcommand};
use eyre::{Result, eyre};
use log::{debug, info};
use multisend::{
    CallRequest, OwnerAction, SafeTransaction, decode_multisend_data, decode_packed_calls,
    encode_multisend_calldata, safe_tx_hash, validate_call_batch,
    types::{config_wrapper::ConfigWrapper, safe_tx_config::SafeTxConfig},
    utils::safe_reader::SafeReader,
};
use serde_json::json;
use std::fs;
use std::path::Path;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON list of calls
    Validate {
        /// Path to the calls JSON file
        #[arg(long = "calls", short = 'c')]
        calls_path: String,
    },
    /// Encode a JSON list of calls as multiSend(bytes) calldata
    Encode {
        /// Path to the calls JSON file
        #[arg(long = "calls", short = 'c')]
        calls_path: String,
    },
    /// Decode multiSend calldata back into its calls
    Decode {
        /// Hex calldata
        #[arg(long = "data", short = 'd')]
        data: String,

        /// Input is the packed transactions blob, without the multiSend wrapper
        #[arg(long = "packed")]
        packed: bool,
    },
    /// Build the Safe transaction for a batch and write it to a file
    Build {
        /// Path to the calls JSON file
        #[arg(long = "calls", short = 'c')]
        calls_path: String,

        /// Safe address
        #[arg(long = "safe", short = 's')]
        safe: String,

        /// Network ID
        #[arg(long = "network", short = 'n')]
        network_id: u64,

        /// Safe nonce, read from chain when omitted
        #[arg(long = "nonce")]
        nonce: Option<u64>,

        /// Path to config.toml
        #[arg(long = "config")]
        config_path: Option<String>,

        /// Output file
        #[arg(long = "out", short = 'o', default_value = "output/safe_tx.json")]
        out_path: String,

        /// Compare the local Safe hash with getTransactionHash on chain
        #[arg(long = "verify")]
        verify: bool,
    },
    /// Compute the Safe transaction hash of a transaction file
    Hash {
        /// Path to the transaction JSON file
        #[arg(long = "tx", short = 't')]
        tx_path: String,
    },
    /// Decide whether a signer should approve or execute a transaction file
    Plan {
        /// Path to the transaction JSON file
        #[arg(long = "tx", short = 't')]
        tx_path: String,

        /// Owner that will send the next transaction
        #[arg(long = "signer")]
        signer: String,

        /// Path to config.toml
        #[arg(long = "config")]
        config_path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Validate { calls_path } => {
            let requests = read_calls(calls_path)?;
            let calls = validate_call_batch(&requests)?;
            println!("{} transaction(s) valid", calls.len());
        }
        Commands::Encode { calls_path } => {
            let requests = read_calls(calls_path)?;
            println!("{}", encode_multisend_calldata(&requests)?);
        }
        Commands::Decode { data, packed } => {
            let bytes = hex::decode(data.trim_start_matches("0x"))?;
            let decoded = if *packed {
                decode_packed_calls(&bytes)?
            } else {
                decode_multisend_data(&bytes)?
            };
            let entries = decoded
                .iter()
                .map(|call| {
                    json!({
                        "operation": call.operation.as_u8(),
                        "to": call.to.to_checksum(None),
                        "value": call.value.to_string(),
                        "data": format!("0x{}", hex::encode(&call.data)),
                    })
                })
                .collect::<Vec<_>>();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Build {
            calls_path,
            safe,
            network_id,
            nonce,
            config_path,
            out_path,
            verify,
        } => {
            let safe: Address = safe.parse()?;
            let cw = load_config(config_path.as_deref())?;
            let calls = validate_call_batch(&read_calls(calls_path)?)?;

            let nonce = match nonce {
                Some(nonce) => U256::from(*nonce),
                None => {
                    let reader = connect(cw.get_rpc_url(*network_id)?, *network_id, safe).await?;
                    reader.nonce().await?
                }
            };
            let multisend = cw.get_multisend_address(*network_id)?;
            let tx = SafeTransaction::from_calls(calls, Some(multisend), nonce)?;
            let safe_hash = safe_tx_hash(&tx, *network_id, safe);

            if *verify {
                let reader = connect(cw.get_rpc_url(*network_id)?, *network_id, safe).await?;
                let onchain = reader.transaction_hash(&tx).await?;
                if onchain != safe_hash {
                    return Err(eyre!(
                        "Safe hash mismatch: local {} on chain {}",
                        safe_hash,
                        onchain
                    ));
                }
                info!("Safe hash matches getTransactionHash");
            }

            if let Some(parent) = Path::new(out_path).parent() {
                fs::create_dir_all(parent)?;
            }
            tx.to_config(*network_id, safe)?.to_file(out_path)?;
            println!("Saved transaction to: {}", out_path);

            println!("\n## Actions");
            println!("```json");
            println!("{}", serde_json::to_string_pretty(&tx.describe())?);
            println!("```");
            println!("\n## Safe Hash");
            println!("`{}`", safe_hash);
        }
        Commands::Hash { tx_path } => {
            let config = SafeTxConfig::from_file(tx_path)?;
            let tx = SafeTransaction::from_config(&config)?;
            let safe_hash = safe_tx_hash(&tx, config.network_id, config.multisig()?);
            println!("Safe Hash: {}", safe_hash);
        }
        Commands::Plan {
            tx_path,
            signer,
            config_path,
        } => {
            let signer: Address = signer.parse()?;
            let config = SafeTxConfig::from_file(tx_path)?;
            let safe = config.multisig()?;
            let tx = SafeTransaction::from_config(&config)?;
            let safe_hash = safe_tx_hash(&tx, config.network_id, safe);

            let cw = load_config(config_path.as_deref())?;
            let rpc_url = cw.get_rpc_url(config.network_id)?;
            let reader = connect(rpc_url, config.network_id, safe).await?;
            let state = reader.approval_state(safe_hash).await?;
            let action = OwnerAction::plan(&state, signer, safe_hash)?;

            println!(
                "{}",
                serde_json::to_string_pretty(&action.describe(safe, safe_hash, &tx))?
            );
            println!("\n## Calldata (to {})", safe);
            println!("`0x{}`", hex::encode(action.calldata(&tx)));
        }
    }

    Ok(())
}

fn read_calls(path: &str) -> Result<Vec<CallRequest>> {
    let file_content = fs::read_to_string(path)?;
    let requests: Vec<CallRequest> = serde_json::from_str(&file_content)?;
    debug!("Read {} call(s) from {}", requests.len(), path);
    Ok(requests)
}

fn load_config(path: Option<&str>) -> Result<ConfigWrapper> {
    match path {
        Some(p) => ConfigWrapper::from_file(Some(p)),
        None if Path::new("config.toml").exists() => ConfigWrapper::from_file(None),
        None => Ok(ConfigWrapper::empty()),
    }
}

async fn connect(
    rpc_url: String,
    network_id: u64,
    safe: Address,
) -> Result<SafeReader<impl Provider + Clone + Send + Sync + 'static>> {
    let provider = ProviderBuilder::new().on_builtin(&rpc_url).await?;
    let reader = SafeReader::new(provider, safe);

    let chain_id = reader.chain_id().await?;
    if chain_id != network_id {
        return Err(eyre!(
            "RPC for network {} reports chain id {}",
            network_id,
            chain_id
        ));
    }
    Ok(reader)
}
