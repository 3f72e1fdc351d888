use crate::db::connection;
use crate::error::{AppError, AppResult};
use crate::models::expense::ExpenseRecord;
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

/// Durable storage for expense records, backed by a single SQLite file.
///
/// The store owns its connection: it is opened once at startup, handed to
/// the controller, and closed when the store is dropped. Every mutating
/// operation commits immediately.
pub struct ExpenseStore {
    conn: Connection,
}

impl ExpenseStore {
    /// Opens the backing file, creating it and the expenses table if absent.
    pub fn open(path: &str) -> AppResult<Self> {
        let conn = connection::establish_connection(path)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = connection::establish_test_connection()?;
        Ok(Self { conn })
    }

    /// Inserts a new record and returns its freshly assigned id.
    ///
    /// The controller validates amounts before they get here; the store
    /// still refuses negative ones.
    pub fn create(
        &self,
        date: &str,
        category: &str,
        description: &str,
        amount: Decimal,
    ) -> AppResult<i64> {
        if amount.is_sign_negative() {
            return Err(AppError::Validation(format!(
                "Amount must be non-negative, got {}",
                amount
            )));
        }

        self.conn.execute(
            "INSERT INTO expenses (date, category, description, amount) VALUES (?1, ?2, ?3, ?4)",
            params![date, category, description, amount.to_string()],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Returns every record in insertion (primary key) order.
    pub fn list_all(&self) -> AppResult<Vec<ExpenseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, category, description, amount FROM expenses ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], map_expense_row)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Returns records where the term appears as a substring of the
    /// category, the description, or the stored amount string. An empty
    /// term lists everything.
    pub fn search(&self, term: &str) -> AppResult<Vec<ExpenseRecord>> {
        if term.is_empty() {
            return self.list_all();
        }

        let pattern = format!("%{}%", term);
        let mut stmt = self.conn.prepare(
            "SELECT id, date, category, description, amount FROM expenses \
             WHERE category LIKE ?1 OR description LIKE ?1 OR amount LIKE ?1 \
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([pattern], map_expense_row)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Replaces all four mutable fields of the record identified by id.
    pub fn update(
        &self,
        id: i64,
        date: &str,
        category: &str,
        description: &str,
        amount: Decimal,
    ) -> AppResult<()> {
        if amount.is_sign_negative() {
            return Err(AppError::Validation(format!(
                "Amount must be non-negative, got {}",
                amount
            )));
        }

        let rows_affected = self.conn.execute(
            "UPDATE expenses SET date = ?1, category = ?2, description = ?3, amount = ?4 \
             WHERE id = ?5",
            params![date, category, description, amount.to_string(), id],
        )?;

        if rows_affected == 0 {
            return Err(AppError::NotFound(id));
        }
        Ok(())
    }

    /// Removes the record identified by id. The caller is responsible for
    /// obtaining explicit user confirmation first.
    pub fn delete(&self, id: i64) -> AppResult<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(AppError::NotFound(id));
        }
        Ok(())
    }

    /// Sums amounts per category. Categories without records are absent.
    ///
    /// Amounts are accumulated as decimals here rather than summed with a
    /// REAL cast in SQL, so totals stay exact.
    pub fn category_totals(&self) -> AppResult<HashMap<String, Decimal>> {
        let mut stmt = self
            .conn
            .prepare("SELECT category, amount FROM expenses")?;

        let rows = stmt.query_map([], |row| {
            let category: String = row.get(0)?;
            let amount_str: String = row.get(1)?;
            Ok((category, amount_str))
        })?;

        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for row in rows {
            let (category, amount_str) = row?;
            let amount = Decimal::from_str(&amount_str).map_err(|e| {
                AppError::Storage(format!("Corrupt amount '{}': {}", amount_str, e))
            })?;
            *totals.entry(category).or_insert(Decimal::ZERO) += amount;
        }
        Ok(totals)
    }
}

fn map_expense_row(row: &Row) -> rusqlite::Result<ExpenseRecord> {
    let amount_str: String = row.get(4)?;
    Ok(ExpenseRecord::new(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        Decimal::from_str(&amount_str)
            .map_err(|e| rusqlite::Error::InvalidParameterName(e.to_string()))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> ExpenseStore {
        ExpenseStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_list_round_trip() {
        let store = test_store();
        let id = store
            .create("2025-03-01", "Food", "lunch at cafe", Decimal::new(1250, 2))
            .unwrap();
        assert!(id > 0);

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].date, "2025-03-01");
        assert_eq!(all[0].category, "Food");
        assert_eq!(all[0].description, "lunch at cafe");
        assert_eq!(all[0].amount, Decimal::new(1250, 2));
    }

    #[test]
    fn test_create_assigns_unique_increasing_ids() {
        let store = test_store();
        let first = store.create("2025-03-01", "A", "", Decimal::ONE).unwrap();
        let second = store.create("2025-03-02", "B", "", Decimal::ONE).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_create_rejects_negative_amount() {
        let store = test_store();
        let result = store.create("2025-03-01", "Food", "", Decimal::new(-500, 2));
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.list_all().unwrap().len(), 0);
    }

    #[test]
    fn test_list_all_preserves_insertion_order() {
        let store = test_store();
        store.create("2025-03-03", "C", "", Decimal::ONE).unwrap();
        store.create("2025-03-01", "A", "", Decimal::ONE).unwrap();
        store.create("2025-03-02", "B", "", Decimal::ONE).unwrap();

        let categories: Vec<String> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.category)
            .collect();
        assert_eq!(categories, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_update_replaces_all_fields() {
        let store = test_store();
        let id = store
            .create("2025-03-01", "Food", "lunch", Decimal::new(1000, 2))
            .unwrap();
        let other = store
            .create("2025-03-02", "Travel", "bus", Decimal::new(250, 2))
            .unwrap();

        store
            .update(id, "2025-04-01", "Groceries", "weekly shop", Decimal::new(4599, 2))
            .unwrap();

        let all = store.list_all().unwrap();
        let updated = all.iter().find(|r| r.id == id).unwrap();
        assert_eq!(updated.date, "2025-04-01");
        assert_eq!(updated.category, "Groceries");
        assert_eq!(updated.description, "weekly shop");
        assert_eq!(updated.amount, Decimal::new(4599, 2));

        let untouched = all.iter().find(|r| r.id == other).unwrap();
        assert_eq!(untouched.category, "Travel");
        assert_eq!(untouched.amount, Decimal::new(250, 2));
    }

    #[test]
    fn test_update_not_found() {
        let store = test_store();
        let result = store.update(999, "2025-01-01", "X", "", Decimal::ONE);
        assert!(matches!(result, Err(AppError::NotFound(999))));
    }

    #[test]
    fn test_update_rejects_negative_amount() {
        let store = test_store();
        let id = store.create("2025-03-01", "Food", "", Decimal::ONE).unwrap();
        let result = store.update(id, "2025-03-01", "Food", "", Decimal::new(-1, 0));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_delete_removes_record() {
        let store = test_store();
        let id = store.create("2025-03-01", "Food", "", Decimal::ONE).unwrap();
        store.delete(id).unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_delete_not_found() {
        let store = test_store();
        let result = store.delete(7);
        assert!(matches!(result, Err(AppError::NotFound(7))));
    }

    #[test]
    fn test_deleted_id_is_never_reused() {
        let store = test_store();
        store.create("2025-03-01", "A", "", Decimal::ONE).unwrap();
        let last = store.create("2025-03-02", "B", "", Decimal::ONE).unwrap();
        store.delete(last).unwrap();

        let next = store.create("2025-03-03", "C", "", Decimal::ONE).unwrap();
        assert!(next > last);
    }

    #[test]
    fn test_search_empty_term_lists_all() {
        let store = test_store();
        store.create("2025-03-01", "Food", "lunch", Decimal::ONE).unwrap();
        store.create("2025-03-02", "Travel", "bus", Decimal::ONE).unwrap();

        let results = store.search("").unwrap();
        assert_eq!(results, store.list_all().unwrap());
    }

    #[test]
    fn test_search_matches_category_substring() {
        let store = test_store();
        store
            .create("2025-03-01", "Groceries", "weekly shop", Decimal::ONE)
            .unwrap();
        store.create("2025-03-02", "Travel", "bus", Decimal::ONE).unwrap();

        let results = store.search("groc").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].category, "Groceries");
    }

    #[test]
    fn test_search_matches_description_substring() {
        let store = test_store();
        store
            .create("2025-03-01", "Food", "coffee with milk", Decimal::ONE)
            .unwrap();
        store.create("2025-03-02", "Food", "tea", Decimal::ONE).unwrap();

        let results = store.search("coffee").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].description, "coffee with milk");
    }

    #[test]
    fn test_search_matches_amount_substring() {
        let store = test_store();
        store
            .create("2025-03-01", "Food", "lunch", Decimal::new(1250, 2))
            .unwrap();
        store
            .create("2025-03-02", "Food", "snack", Decimal::new(300, 2))
            .unwrap();

        let results = store.search("12.5").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].amount, Decimal::new(1250, 2));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let store = test_store();
        store.create("2025-03-01", "Food", "lunch", Decimal::ONE).unwrap();

        let results = store.search("FOOD").unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_search_no_match_returns_empty() {
        let store = test_store();
        store.create("2025-03-01", "Food", "lunch", Decimal::ONE).unwrap();
        assert!(store.search("shopping").unwrap().is_empty());
    }

    #[test]
    fn test_category_totals_sums_per_category() {
        let store = test_store();
        store.create("2025-03-01", "A", "", Decimal::new(10, 0)).unwrap();
        store.create("2025-03-02", "A", "", Decimal::new(20, 0)).unwrap();
        store.create("2025-03-03", "B", "", Decimal::new(5, 0)).unwrap();

        let totals = store.category_totals().unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["A"], Decimal::new(30, 0));
        assert_eq!(totals["B"], Decimal::new(5, 0));
    }

    #[test]
    fn test_category_totals_keeps_cents_exact() {
        let store = test_store();
        store.create("2025-03-01", "Food", "", Decimal::new(1010, 2)).unwrap();
        store.create("2025-03-02", "Food", "", Decimal::new(2020, 2)).unwrap();

        let totals = store.category_totals().unwrap();
        assert_eq!(totals["Food"], Decimal::new(3030, 2));
    }

    #[test]
    fn test_category_totals_empty_store() {
        let store = test_store();
        assert!(store.category_totals().unwrap().is_empty());
    }
}
