pub mod eip712;
pub mod safe_reader;
pub mod validation;
