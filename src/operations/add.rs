use crate::error::{AppError, AppResult};
use chrono::Local;

/// The four fields of a manually entered expense, still unvalidated. The
/// amount stays text until the controller validates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseInput {
    pub date: String,
    pub category: String,
    pub description: String,
    pub amount_text: String,
}

/// Parses one comma-separated entry line into its fields. A blank date
/// defaults to today, like the add form pre-fills it.
pub fn parse_expense_input(line: &str) -> AppResult<ExpenseInput> {
    let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
    if parts.len() != 4 {
        return Err(AppError::Validation(format!(
            "Expected 4 fields separated by commas (date, category, description, amount) but got {}",
            parts.len()
        )));
    }

    let date = if parts[0].is_empty() {
        today()
    } else {
        parts[0].to_string()
    };

    Ok(ExpenseInput {
        date,
        category: parts[1].to_string(),
        description: parts[2].to_string(),
        amount_text: parts[3].to_string(),
    })
}

/// Today's date as an ISO-8601 string.
pub fn today() -> String {
    Local::now().date_naive().to_string()
}
