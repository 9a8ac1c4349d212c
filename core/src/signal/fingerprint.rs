use crate::models::{Fingerprint, FingerprintLogic, LogMessage, MintSource, TagResult};

/// First fingerprint that passes wins, in configuration order; no scoring
/// of fingerprint against fingerprint.
pub fn classify(message: &LogMessage, fingerprints: &[Fingerprint]) -> Option<TagResult> {
    for fp in fingerprints {
        if let Some(result) = try_match(message, fp) {
            return Some(result);
        }
    }
    None
}

fn try_match(message: &LogMessage, fp: &Fingerprint) -> Option<TagResult> {
    let joined = message.joined_text().to_lowercase();
    let observed: Vec<String> = message.lines.iter().map(|l| l.to_lowercase()).collect();

    let match_count = fp
        .required_instructions
        .iter()
        .filter(|name| {
            let needle = name.to_lowercase();
            observed.iter().any(|line| line.contains(&needle)) || joined.contains(&needle)
        })
        .count();

    let program_matched = fp
        .required_programs
        .iter()
        .any(|program| program == &message.source_program || joined.contains(&program.to_lowercase()));

    if fp.required_programs.is_empty() || !program_matched {
        return None;
    }

    let weighted = match_count as f64 + if program_matched { 1.0 } else { 0.0 };
    if weighted < fp.min_score {
        return None;
    }

    let passes = match fp.logic {
        FingerprintLogic::And => match_count == fp.required_instructions.len() && program_matched,
        FingerprintLogic::Or => match_count > 0 || program_matched,
        FingerprintLogic::Fuzzy => {
            match_count >= (fp.required_instructions.len() + 1) / 2 && program_matched
        }
    };

    if !passes {
        return None;
    }

    Some(TagResult {
        tag: fp.tag.clone(),
        confidence: fp.confidence,
        mint: None,
        source: MintSource::Fingerprint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(lines: Vec<&str>, program: &str) -> LogMessage {
        LogMessage {
            signature: "sig-A".into(),
            slot: 100,
            source_program: program.into(),
            lines: lines.into_iter().map(String::from).collect(),
            received_at: Utc::now(),
        }
    }

    fn and_fingerprint() -> Fingerprint {
        Fingerprint {
            tag: "pumpfun_create".into(),
            required_instructions: vec!["create".into()],
            required_programs: vec!["pumpfun".into()],
            logic: FingerprintLogic::And,
            min_score: 1.0,
            confidence: 0.94,
        }
    }

    #[test]
    fn and_logic_requires_all_instructions_and_program() {
        let msg = message(vec!["Program log: Instruction: Create"], "pumpfun");
        let result = try_match(&msg, &and_fingerprint()).unwrap();
        assert_eq!(result.tag, "pumpfun_create");
        assert_eq!(result.source, MintSource::Fingerprint);
    }

    #[test]
    fn and_logic_fails_without_program_match() {
        let msg = message(vec!["Program log: Instruction: Create"], "raydium");
        assert!(try_match(&msg, &and_fingerprint()).is_none());
    }

    #[test]
    fn fuzzy_logic_passes_on_half_of_instructions() {
        let fp = Fingerprint {
            required_instructions: vec!["create".into(), "mintto".into(), "initialize".into()],
            logic: FingerprintLogic::Fuzzy,
            min_score: 1.0,
            ..and_fingerprint()
        };
        let msg = message(vec!["Program log: Instruction: Create", "mintTo invoked"], "pumpfun");
        assert!(try_match(&msg, &fp).is_some());
    }

    #[test]
    fn min_score_boundary_flips_to_no_match() {
        let fp = Fingerprint {
            min_score: 5.0,
            ..and_fingerprint()
        };
        let msg = message(vec!["Program log: Instruction: Create"], "pumpfun");
        assert!(try_match(&msg, &fp).is_none());
    }

    #[test]
    fn first_passing_fingerprint_wins() {
        let first = and_fingerprint();
        let mut second = and_fingerprint();
        second.tag = "shadow".into();
        let msg = message(vec!["Program log: Instruction: Create"], "pumpfun");
        let result = classify(&msg, &[first, second]).unwrap();
        assert_eq!(result.tag, "pumpfun_create");
    }
}
