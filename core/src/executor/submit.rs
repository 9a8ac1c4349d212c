use super::signer::TransactionSigner;
use super::tx_builder::{build_buy_accounts, build_buy_instruction, derive_atas, derive_pdas, parse_pubkey, BuyAccountsInput};
use crate::error::CoreError;
use crate::models::BuyOrder;
use crate::rpc::RpcClient;
use base64::{engine::general_purpose::STANDARD as Base64Engine, Engine};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

pub struct LaunchpadConstants {
    pub launchpad_program: Pubkey,
    pub global_fee_vault: Pubkey,
    pub config_authority: Pubkey,
    pub buy_discriminator: [u8; 8],
}

/// Builds and submits the buy transaction for a decoded mint. With
/// `dry_run` set, stops after simulation and never signs or sends.
pub struct SnipeExecutor {
    rpc: Arc<dyn RpcClient>,
    constants: LaunchpadConstants,
}

impl SnipeExecutor {
    pub fn new(rpc: Arc<dyn RpcClient>, constants: LaunchpadConstants) -> Self {
        SnipeExecutor { rpc, constants }
    }

    /// Derives PDAs/ATAs, conditionally prepends an ATA-create instruction,
    /// simulates, then (unless `dry_run`) signs and submits with commitment
    /// `confirmed`.
    pub async fn execute(
        &self,
        order: &BuyOrder,
        signer: &dyn TransactionSigner,
        dry_run: bool,
    ) -> Result<String, CoreError> {
        let mint = parse_pubkey(&order.mint)?;
        let payer = signer.public_key();

        let pdas = derive_pdas(&self.constants.launchpad_program, &mint);
        let atas = derive_atas(&mint, &pdas.bonding_curve_pda, &payer);

        let mut instructions = Vec::new();
        if self.user_ata_missing(&atas.user_ata).await? {
            instructions.push(create_ata_instruction(&payer, &mint));
        }

        let accounts = build_buy_accounts(BuyAccountsInput {
            global_pda: &pdas.global_pda,
            global_fee_vault: &self.constants.global_fee_vault,
            mint: &mint,
            bonding_curve_pda: &pdas.bonding_curve_pda,
            bonding_curve_ata: &atas.bonding_curve_ata,
            user_ata: &atas.user_ata,
            payer: &payer,
            config_authority: &self.constants.config_authority,
            launchpad_program: &self.constants.launchpad_program,
        });
        instructions.push(build_buy_instruction(
            &self.constants.launchpad_program,
            accounts,
            self.constants.buy_discriminator,
            order.amount_native,
            order.max_slippage_sentinel,
        ));

        let blockhash = self.rpc.get_latest_blockhash().await?;
        let signed_tx = signer.sign_instructions(&instructions, &blockhash).await?;
        let tx_base64 = Base64Engine.encode(&signed_tx);

        let simulation = self.rpc.simulate_transaction(&tx_base64).await?;
        if !simulation["value"]["err"].is_null() {
            return Err(CoreError::SimulationRejected(simulation["value"]["err"].to_string()));
        }
        if let Some(logs) = simulation["value"]["logs"].as_array() {
            for line in logs {
                log::debug!("simulate: {line}");
            }
        }

        if dry_run {
            log::info!("dry-run: simulation passed for mint {}, not submitting", order.mint);
            return Ok("dry-run-not-submitted".to_string());
        }

        let signature = self.rpc.send_transaction(&tx_base64).await?;
        let confirmed = self.rpc.confirm_transaction(&signature).await?;
        if !confirmed {
            return Err(CoreError::NotConfirmed(signature));
        }
        Ok(signature)
    }

    /// Queries `getAccountInfo(user_ata)`; the create instruction is only
    /// needed when the account is absent.
    async fn user_ata_missing(&self, user_ata: &Pubkey) -> Result<bool, CoreError> {
        let info = self.rpc.get_account_info(&user_ata.to_string()).await?;
        Ok(info["value"].is_null())
    }
}

fn create_ata_instruction(payer: &Pubkey, mint: &Pubkey) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account(
        payer,
        payer,
        mint,
        &spl_token::id(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::signer::NativeTransactionSigner;
    use async_trait::async_trait;
    use serde_json::json;
    use solana_sdk::signature::Keypair;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubRpc {
        user_ata_present: bool,
        get_account_info_calls: AtomicU32,
        sim_err: Option<String>,
    }

    #[async_trait]
    impl RpcClient for StubRpc {
        async fn get_latest_blockhash(&self) -> Result<String, CoreError> {
            Ok(solana_sdk::hash::Hash::default().to_string())
        }
        async fn get_slot(&self) -> Result<u64, CoreError> {
            Ok(1000)
        }
        async fn get_balance(&self, _address: &str) -> Result<u64, CoreError> {
            Ok(1_000_000_000)
        }
        async fn get_account_info(&self, _address: &str) -> Result<serde_json::Value, CoreError> {
            self.get_account_info_calls.fetch_add(1, Ordering::SeqCst);
            if self.user_ata_present {
                Ok(json!({"value": {"owner": "x"}}))
            } else {
                Ok(json!({"value": null}))
            }
        }
        async fn get_transaction(&self, _signature: &str) -> Result<serde_json::Value, CoreError> {
            unimplemented!()
        }
        async fn simulate_transaction(&self, _tx_base64: &str) -> Result<serde_json::Value, CoreError> {
            match &self.sim_err {
                Some(msg) => Ok(json!({"value": {"err": msg, "logs": []}})),
                None => Ok(json!({"value": {"err": null, "logs": []}})),
            }
        }
        async fn send_transaction(&self, _tx_base64: &str) -> Result<String, CoreError> {
            Ok("sig-executed".to_string())
        }
        async fn confirm_transaction(&self, _signature: &str) -> Result<bool, CoreError> {
            Ok(true)
        }
    }

    fn constants() -> LaunchpadConstants {
        LaunchpadConstants {
            launchpad_program: Pubkey::new_from_array([11; 32]),
            global_fee_vault: Pubkey::new_from_array([2; 32]),
            config_authority: Pubkey::new_from_array([3; 32]),
            buy_discriminator: [1, 2, 3, 4, 5, 6, 7, 8],
        }
    }

    fn sample_order() -> BuyOrder {
        BuyOrder::new([0u8; 64], bs58::encode(Pubkey::new_from_array([9; 32])).into_string(), 10_000_000)
    }

    /// S5: ATA present -> no create instruction appended, dry-run still succeeds.
    #[tokio::test]
    async fn skips_ata_creation_when_already_present() {
        let rpc: Arc<dyn RpcClient> = Arc::new(StubRpc {
            user_ata_present: true,
            get_account_info_calls: AtomicU32::new(0),
            sim_err: None,
        });
        let executor = SnipeExecutor::new(rpc, constants());
        let signer = NativeTransactionSigner::new(Keypair::new());
        let result = executor.execute(&sample_order(), &signer, true).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn simulation_failure_aborts_with_simulation_rejected() {
        let rpc: Arc<dyn RpcClient> = Arc::new(StubRpc {
            user_ata_present: true,
            get_account_info_calls: AtomicU32::new(0),
            sim_err: Some("insufficient funds".to_string()),
        });
        let executor = SnipeExecutor::new(rpc, constants());
        let signer = NativeTransactionSigner::new(Keypair::new());
        let result = executor.execute(&sample_order(), &signer, true).await;
        assert!(matches!(result, Err(CoreError::SimulationRejected(_))));
    }

    #[tokio::test]
    async fn dry_run_does_not_send() {
        let rpc: Arc<dyn RpcClient> = Arc::new(StubRpc {
            user_ata_present: false,
            get_account_info_calls: AtomicU32::new(0),
            sim_err: None,
        });
        let executor = SnipeExecutor::new(rpc, constants());
        let signer = NativeTransactionSigner::new(Keypair::new());
        let result = executor.execute(&sample_order(), &signer, true).await.unwrap();
        assert_eq!(result, "dry-run-not-submitted");
    }
}
