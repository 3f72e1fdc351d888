use crate::collaborators::{OcrEngine, SpeechRecognizer};
use crate::db::expense_store::ExpenseStore;
use crate::error::{AppError, AppResult};
use crate::models::expense::ExpenseRecord;
use crate::operations::import;
use crate::operations::voice::{self, VoicePrefill};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

/// Parses a user-entered amount. Only ASCII digits with at most one
/// decimal point are accepted; signs, whitespace, and everything else are
/// rejected, which makes "expenses are non-negative" an explicit invariant.
pub fn validate_amount(input: &str) -> AppResult<Decimal> {
    if input.is_empty() {
        return Err(AppError::Validation("Amount must not be empty".to_string()));
    }

    let mut seen_point = false;
    for ch in input.chars() {
        match ch {
            '0'..='9' => {}
            '.' if !seen_point => seen_point = true,
            '.' => {
                return Err(AppError::Validation(format!(
                    "Amount '{}' has more than one decimal point",
                    input
                )));
            }
            _ => {
                return Err(AppError::Validation(format!(
                    "Amount '{}' must be a non-negative number",
                    input
                )));
            }
        }
    }

    if !input.chars().any(|ch| ch.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "Amount '{}' must contain a digit",
            input
        )));
    }

    let trimmed = input.trim_end_matches('.');
    let normalized = if trimmed.starts_with('.') {
        format!("0{}", trimmed)
    } else {
        trimmed.to_string()
    };
    Decimal::from_str(&normalized)
        .map_err(|e| AppError::Validation(format!("Amount '{}' is out of range: {}", input, e)))
}

/// Mediates between the presentation layer and the store. Owns the
/// injected store and the transient last displayed result set, nothing
/// else.
pub struct Controller {
    store: ExpenseStore,
    rows: Vec<ExpenseRecord>,
}

impl Controller {
    pub fn new(store: ExpenseStore) -> Self {
        Self {
            store,
            rows: Vec::new(),
        }
    }

    /// The last displayed result set.
    pub fn rows(&self) -> &[ExpenseRecord] {
        &self.rows
    }

    /// Validates and creates a new expense, then refreshes the displayed
    /// list. Nothing is written when validation fails.
    pub fn submit_add(
        &mut self,
        date: &str,
        category: &str,
        description: &str,
        amount_text: &str,
    ) -> AppResult<i64> {
        let amount = validate_amount(amount_text)?;
        if date.is_empty() {
            return Err(AppError::Validation("Date must not be empty".to_string()));
        }

        let id = self.store.create(date, category, description, amount)?;
        self.refresh()?;
        Ok(id)
    }

    /// Validates and replaces all four mutable fields of an expense, then
    /// refreshes the displayed list.
    pub fn submit_edit(
        &mut self,
        id: i64,
        date: &str,
        category: &str,
        description: &str,
        amount_text: &str,
    ) -> AppResult<()> {
        let amount = validate_amount(amount_text)?;
        if date.is_empty() {
            return Err(AppError::Validation("Date must not be empty".to_string()));
        }

        self.store.update(id, date, category, description, amount)?;
        self.refresh()
    }

    /// Deletes an expense and refreshes the displayed list. The
    /// presentation layer must have asked the user for confirmation before
    /// calling this.
    pub fn submit_delete(&mut self, id: i64) -> AppResult<()> {
        self.store.delete(id)?;
        self.refresh()
    }

    /// Runs a substring search (or lists everything for an empty term),
    /// caches the rows as the displayed result set and returns them.
    pub fn request_search(&mut self, term: &str) -> AppResult<&[ExpenseRecord]> {
        self.rows = self.store.search(term)?;
        Ok(&self.rows)
    }

    /// Per-category totals for the dashboard chart.
    pub fn request_dashboard_data(&self) -> AppResult<HashMap<String, Decimal>> {
        self.store.category_totals()
    }

    /// Captures a transcript through the speech collaborator and extracts
    /// a (category, amount) prefill from it. Failures leave all prior
    /// state untouched.
    pub fn voice_prefill(&self, speech: &dyn SpeechRecognizer) -> AppResult<VoicePrefill> {
        let transcript = speech.capture_and_transcribe()?;
        voice::parse_transcript(&transcript)
    }

    /// Extracts receipt text through the OCR collaborator for display.
    /// The controller does not interpret the text.
    pub fn scan_receipt(&self, ocr: &dyn OcrEngine, image_path: &str) -> AppResult<String> {
        ocr.extract_text(image_path)
    }

    /// Bulk-creates expenses from a CSV file and refreshes the displayed
    /// list. Returns how many records were imported.
    pub fn import_from_csv(&mut self, path: &str) -> AppResult<usize> {
        let count = import::import_expenses(&self.store, path)?;
        self.refresh()?;
        Ok(count)
    }

    fn refresh(&mut self) -> AppResult<()> {
        self.rows = self.store.list_all()?;
        Ok(())
    }
}
