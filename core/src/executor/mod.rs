pub mod signer;
pub mod submit;
pub mod tx_builder;

pub use signer::{NativeTransactionSigner, TransactionSigner};
pub use submit::{LaunchpadConstants, SnipeExecutor};
