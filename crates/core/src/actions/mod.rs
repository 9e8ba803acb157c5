pub mod multisend_utils;
pub mod owner_action;
pub mod safe_transaction;
