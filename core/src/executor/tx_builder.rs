use crate::error::CoreError;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Buy instruction data buffer: `discriminator[8] || amount_le[8] ||
/// max_le[8]`, always exactly 24 bytes.
pub fn build_buy_data(discriminator: [u8; 8], amount_native: u64, max_slippage_sentinel: i64) -> [u8; 24] {
    let mut buf = [0u8; 24];
    buf[0..8].copy_from_slice(&discriminator);
    buf[8..16].copy_from_slice(&amount_native.to_le_bytes());
    buf[16..24].copy_from_slice(&max_slippage_sentinel.to_le_bytes());
    buf
}

pub struct BuyPdas {
    pub global_pda: Pubkey,
    pub bonding_curve_pda: Pubkey,
}

/// Canonical off-curve PDA derivation with literal seeds `"global"` and
/// `"bonding-curve" || mint_bytes`.
pub fn derive_pdas(launchpad_program: &Pubkey, mint: &Pubkey) -> BuyPdas {
    let (global_pda, _) = Pubkey::find_program_address(&[b"global"], launchpad_program);
    let (bonding_curve_pda, _) =
        Pubkey::find_program_address(&[b"bonding-curve", mint.as_ref()], launchpad_program);
    BuyPdas {
        global_pda,
        bonding_curve_pda,
    }
}

pub struct BuyAtas {
    pub bonding_curve_ata: Pubkey,
    pub user_ata: Pubkey,
}

pub fn derive_atas(mint: &Pubkey, bonding_curve_pda: &Pubkey, payer: &Pubkey) -> BuyAtas {
    BuyAtas {
        bonding_curve_ata: spl_associated_token_account::get_associated_token_address_with_program_id(
            bonding_curve_pda,
            mint,
            &spl_token::id(),
        ),
        user_ata: spl_associated_token_account::get_associated_token_address(payer, mint),
    }
}

pub struct BuyAccountsInput<'a> {
    pub global_pda: &'a Pubkey,
    pub global_fee_vault: &'a Pubkey,
    pub mint: &'a Pubkey,
    pub bonding_curve_pda: &'a Pubkey,
    pub bonding_curve_ata: &'a Pubkey,
    pub user_ata: &'a Pubkey,
    pub payer: &'a Pubkey,
    pub config_authority: &'a Pubkey,
    pub launchpad_program: &'a Pubkey,
}

/// Order-sensitive account list for the buy instruction, all twelve entries.
pub fn build_buy_accounts(input: BuyAccountsInput) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new_readonly(*input.global_pda, false),
        AccountMeta::new(*input.global_fee_vault, false),
        AccountMeta::new_readonly(*input.mint, false),
        AccountMeta::new(*input.bonding_curve_pda, false),
        AccountMeta::new(*input.bonding_curve_ata, false),
        AccountMeta::new(*input.user_ata, false),
        AccountMeta::new(*input.payer, true),
        AccountMeta::new_readonly(solana_sdk::system_program::id(), false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(solana_sdk::sysvar::rent::id(), false),
        AccountMeta::new_readonly(*input.config_authority, false),
        AccountMeta::new_readonly(*input.launchpad_program, false),
    ]
}

pub fn build_buy_instruction(
    launchpad_program: &Pubkey,
    accounts: Vec<AccountMeta>,
    discriminator: [u8; 8],
    amount_native: u64,
    max_slippage_sentinel: i64,
) -> Instruction {
    Instruction {
        program_id: *launchpad_program,
        accounts,
        data: build_buy_data(discriminator, amount_native, max_slippage_sentinel).to_vec(),
    }
}

pub fn parse_pubkey(address: &str) -> Result<Pubkey, CoreError> {
    Pubkey::from_str(address).map_err(|e| CoreError::InvalidAddress(format!("{address}: {e}")))
}
