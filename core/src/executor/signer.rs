use crate::error::CoreError;
use async_trait::async_trait;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

/// Signs a set of instructions against a known fee payer and recent
/// blockhash. Narrowed to exactly what the executor needs.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn public_key(&self) -> Pubkey;
    async fn sign_instructions(&self, instructions: &[Instruction], blockhash: &str) -> Result<Vec<u8>, CoreError>;
}

pub struct NativeTransactionSigner {
    keypair: solana_sdk::signature::Keypair,
}

impl NativeTransactionSigner {
    pub fn new(keypair: solana_sdk::signature::Keypair) -> Self {
        NativeTransactionSigner { keypair }
    }
}

#[async_trait]
impl TransactionSigner for NativeTransactionSigner {
    fn public_key(&self) -> Pubkey {
        solana_sdk::signature::Signer::pubkey(&self.keypair)
    }

    async fn sign_instructions(&self, instructions: &[Instruction], blockhash: &str) -> Result<Vec<u8>, CoreError> {
        let blockhash = blockhash
            .parse::<solana_sdk::hash::Hash>()
            .map_err(|e| CoreError::InvalidAddress(format!("blockhash {blockhash}: {e}")))?;
        let pubkey = self.public_key();
        let message = solana_sdk::message::Message::new(instructions, Some(&pubkey));
        let tx = solana_sdk::transaction::Transaction::new(&[&self.keypair], message, blockhash);
        bincode::serialize(&tx).map_err(|e| CoreError::MalformedTransaction(e.to_string()))
    }
}
