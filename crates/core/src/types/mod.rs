pub mod call;
pub mod config_wrapper;
pub mod operation;
pub mod safe_tx_config;
