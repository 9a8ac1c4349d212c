use crate::models::{DecodedEvent, TransactionInfo};

/// Known non-mint addresses excluded from the inner-instruction fallback
/// scan: native wrapper, system program, token program, rent sysvar.
const NON_MINT_ALLOWLIST: &[&str] = &[
    "So11111111111111111111111111111111111111112",
    "11111111111111111111111111111111",
    "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
    "SysvarRent111111111111111111111111111111111",
];
const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// AMM-initPool decoder. Primary path: diff `postTokenBalances` against
/// `preTokenBalances` and return the first newly-appeared mint with
/// `uiAmount > 0`. Fallback: walk compiled + inner instructions for the
/// first non-allowlisted account of a token-program instruction.
pub fn decode(tx: &TransactionInfo) -> Option<DecodedEvent> {
    if let Some(mint) = diff_token_balances(tx) {
        return Some(DecodedEvent {
            mint,
            pool_data: None,
            metadata: None,
        });
    }

    scan_instructions(tx).map(|mint| DecodedEvent {
        mint,
        pool_data: None,
        metadata: None,
    })
}

fn diff_token_balances(tx: &TransactionInfo) -> Option<String> {
    let pre_indices: std::collections::HashSet<u32> =
        tx.pre_token_balances.iter().map(|b| b.account_index).collect();

    tx.post_token_balances
        .iter()
        .find(|balance| !pre_indices.contains(&balance.account_index) && balance.ui_amount.unwrap_or(0.0) > 0.0)
        .map(|balance| balance.mint.clone())
}

fn scan_instructions(tx: &TransactionInfo) -> Option<String> {
    tx.compiled_instructions
        .iter()
        .chain(tx.inner_instructions.iter())
        .filter(|ix| ix.program_id == TOKEN_PROGRAM_ID)
        .find_map(|ix| {
            ix.accounts
                .first()
                .filter(|account| !NON_MINT_ALLOWLIST.contains(&account.as_str()))
                .cloned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompiledInstruction, TokenBalance};

    #[test]
    fn finds_newly_appeared_mint_with_positive_balance() {
        let tx = TransactionInfo {
            pre_token_balances: vec![TokenBalance {
                account_index: 0,
                mint: "ExistingMint".into(),
                ui_amount: Some(1.0),
            }],
            post_token_balances: vec![
                TokenBalance {
                    account_index: 0,
                    mint: "ExistingMint".into(),
                    ui_amount: Some(1.0),
                },
                TokenBalance {
                    account_index: 1,
                    mint: "NewMintAbc".into(),
                    ui_amount: Some(500.0),
                },
            ],
            ..Default::default()
        };
        let decoded = decode(&tx).expect("expected a decode");
        assert_eq!(decoded.mint, "NewMintAbc");
    }

    #[test]
    fn falls_back_to_instruction_scan() {
        let tx = TransactionInfo {
            compiled_instructions: vec![CompiledInstruction {
                program_id: TOKEN_PROGRAM_ID.into(),
                accounts: vec!["CandidateMint".into(), "OtherAccount".into()],
                data: vec![],
            }],
            ..Default::default()
        };
        let decoded = decode(&tx).expect("expected a decode");
        assert_eq!(decoded.mint, "CandidateMint");
    }

    #[test]
    fn allowlisted_account_is_skipped() {
        let tx = TransactionInfo {
            compiled_instructions: vec![CompiledInstruction {
                program_id: TOKEN_PROGRAM_ID.into(),
                accounts: vec![NON_MINT_ALLOWLIST[0].to_string()],
                data: vec![],
            }],
            ..Default::default()
        };
        assert!(decode(&tx).is_none());
    }
}
