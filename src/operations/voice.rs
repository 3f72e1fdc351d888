use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Best-effort category and amount extracted from one transcribed
/// utterance, used to pre-fill the add-expense form. The user still
/// confirms and submits.
#[derive(Debug, Clone, PartialEq)]
pub struct VoicePrefill {
    pub category: String,
    pub amount: Decimal,
}

/// Classifies the whitespace-split tokens of a transcript in two passes:
/// the first numeric token is the amount, the first non-numeric token is
/// the category. Deliberately naive; in "add 100 groceries" the category
/// comes out as "add", and that tie-break is load-bearing.
pub fn parse_transcript(transcript: &str) -> AppResult<VoicePrefill> {
    let tokens: Vec<&str> = transcript.split_whitespace().collect();

    let amount = tokens
        .iter()
        .find_map(|token| parse_amount_token(token))
        .ok_or_else(|| {
            AppError::Parse(format!("No amount found in '{}'", transcript.trim()))
        })?;

    let category = tokens
        .iter()
        .find(|token| !is_numeric_token(token))
        .map(|token| token.to_string())
        .ok_or_else(|| {
            AppError::Parse(format!("No category found in '{}'", transcript.trim()))
        })?;

    Ok(VoicePrefill { category, amount })
}

/// A token counts as numeric when removing at most one decimal point
/// leaves a non-empty run of ASCII digits.
fn is_numeric_token(token: &str) -> bool {
    let digits = token.replacen('.', "", 1);
    !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}

fn parse_amount_token(token: &str) -> Option<Decimal> {
    if !is_numeric_token(token) {
        return None;
    }
    let trimmed = token.trim_end_matches('.');
    if trimmed.starts_with('.') {
        Decimal::from_str(&format!("0{}", trimmed)).ok()
    } else {
        Decimal::from_str(trimmed).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_numeric_token_wins_as_category() {
        let prefill = parse_transcript("add 100 groceries").unwrap();
        assert_eq!(prefill.category, "add");
        assert_eq!(prefill.amount, Decimal::new(100, 0));
    }

    #[test]
    fn test_category_before_decimal_amount() {
        let prefill = parse_transcript("coffee 4.50").unwrap();
        assert_eq!(prefill.category, "coffee");
        assert_eq!(prefill.amount, Decimal::new(450, 2));
    }

    #[test]
    fn test_amount_first_is_fine() {
        let prefill = parse_transcript("12.50 lunch downtown").unwrap();
        assert_eq!(prefill.category, "lunch");
        assert_eq!(prefill.amount, Decimal::new(1250, 2));
    }

    #[test]
    fn test_first_numeric_token_wins_as_amount() {
        let prefill = parse_transcript("groceries 100 taxi 20").unwrap();
        assert_eq!(prefill.category, "groceries");
        assert_eq!(prefill.amount, Decimal::new(100, 0));
    }

    #[test]
    fn test_no_numeric_token_is_parse_error() {
        let result = parse_transcript("spent nothing today");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_all_numeric_tokens_is_parse_error() {
        let result = parse_transcript("100 200");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_empty_transcript_is_parse_error() {
        let result = parse_transcript("");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_token_with_two_points_is_not_an_amount() {
        let result = parse_transcript("12.5.3 lunch");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_negative_token_is_not_an_amount() {
        let result = parse_transcript("-5 refund");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }
}
