use rust_decimal::Decimal;

/// A single recorded expense. The id is assigned by the store on creation
/// and never reused after deletion. Dates are kept as ISO-8601 strings and
/// are not checked for calendar correctness.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    pub id: i64,
    pub date: String,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
}

impl ExpenseRecord {
    pub fn new(id: i64, date: String, category: String, description: String, amount: Decimal) -> Self {
        Self {
            id,
            date,
            category,
            description,
            amount,
        }
    }
}
