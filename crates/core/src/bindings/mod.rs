pub mod multisend;
pub mod multisig;
