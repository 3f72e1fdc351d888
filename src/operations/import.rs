use crate::controller::validate_amount;
use crate::db::expense_store::ExpenseStore;
use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use std::fs::File;

/// Bulk-creates expenses from a CSV file of
/// `date,category,description,amount` rows (no header). The whole file is
/// parsed and validated before anything is written, so a bad line imports
/// nothing.
pub fn import_expenses(store: &ExpenseStore, path: &str) -> AppResult<usize> {
    let rows = parse_csv(path)?;

    let mut count = 0;
    for (date, category, description, amount) in rows {
        store.create(&date, &category, &description, amount)?;
        count += 1;
    }
    Ok(count)
}

fn parse_csv(path: &str) -> AppResult<Vec<(String, String, String, Decimal)>> {
    let file = File::open(path)
        .map_err(|e| AppError::Validation(format!("Failed to open file '{}': {}", path, e)))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .has_headers(false)
        .from_reader(file);

    let mut rows = Vec::new();

    for (line_index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::Validation(format!("CSV parse error on line {}: {}", line_index + 1, e))
        })?;

        if record.len() != 4 {
            return Err(AppError::Validation(format!(
                "Invalid number of columns on line {}: expected 4, got {}",
                line_index + 1,
                record.len()
            )));
        }

        let date = record.get(0).unwrap_or("");
        let category = record.get(1).unwrap_or("");
        let description = record.get(2).unwrap_or("");
        let amount_text = record.get(3).unwrap_or("");

        if date.is_empty() {
            return Err(AppError::Validation(format!(
                "Line {}: date must not be empty",
                line_index + 1
            )));
        }

        let amount = validate_amount(amount_text)
            .map_err(|e| AppError::Validation(format!("Line {}: {}", line_index + 1, e)))?;

        rows.push((
            date.to_string(),
            category.to_string(),
            description.to_string(),
            amount,
        ));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_csv(contents: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().expect("Failed to create temp file");
        write!(tmp, "{}", contents).expect("Failed to write test CSV");
        tmp
    }

    #[test]
    fn test_import_csv_success() {
        let store = ExpenseStore::open_in_memory().unwrap();
        let csv_data = "\
2025-03-01,Food,lunch at cafe,12.50
2025-03-02,Travel,bus ticket,2.50
";

        let tmp = write_temp_csv(csv_data);
        let count = import_expenses(&store, tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(count, 2);

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].category, "Food");
        assert_eq!(all[1].amount, Decimal::new(250, 2));
    }

    #[test]
    fn test_import_csv_invalid_amount_imports_nothing() {
        let store = ExpenseStore::open_in_memory().unwrap();
        let csv_data = "\
2025-03-01,Food,lunch,not-a-number
2025-03-02,Travel,bus,2.50
";

        let tmp = write_temp_csv(csv_data);
        let result = import_expenses(&store, tmp.path().to_str().unwrap());

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(result.unwrap_err().to_string().contains("Line 1"));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_import_csv_wrong_column_count() {
        let store = ExpenseStore::open_in_memory().unwrap();
        let tmp = write_temp_csv("2025-03-01,Food,10\n");

        let result = import_expenses(&store, tmp.path().to_str().unwrap());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_import_nonexistent_file() {
        let store = ExpenseStore::open_in_memory().unwrap();
        let result = import_expenses(&store, "nonexistent.csv");

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(result.unwrap_err().to_string().contains("Failed to open file"));
    }
}
