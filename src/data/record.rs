use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{GridError, Result};

/// Settlement status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Completed,
    Pending,
    Failed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Completed, Status::Pending, Status::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Completed => "Completed",
            Status::Pending => "Pending",
            Status::Failed => "Failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| GridError::UnknownStatus(trimmed.to_string()))
    }
}

/// A column of the transaction grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Id,
    Date,
    Merchant,
    Category,
    Amount,
    Status,
    Description,
}

impl Field {
    /// All columns in display order
    pub const ALL: [Field; 7] = [
        Field::Id,
        Field::Date,
        Field::Merchant,
        Field::Category,
        Field::Amount,
        Field::Status,
        Field::Description,
    ];

    /// Key used in the JSON dataset and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Date => "date",
            Field::Merchant => "merchant",
            Field::Category => "category",
            Field::Amount => "amount",
            Field::Status => "status",
            Field::Description => "description",
        }
    }

    /// Header caption
    pub fn title(&self) -> &'static str {
        match self {
            Field::Id => "ID",
            Field::Date => "Date",
            Field::Merchant => "Merchant",
            Field::Category => "Category",
            Field::Amount => "Amount",
            Field::Status => "Status",
            Field::Description => "Description",
        }
    }

    /// The identifier is the record's identity and never changes
    pub fn is_editable(&self) -> bool {
        !matches!(self, Field::Id)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Field::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| GridError::UnknownField(trimmed.to_string()))
    }
}

/// One transaction row.
///
/// `id` is assigned by the data source and is never reused; every other
/// field may be rewritten through [`Record::set_field`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub date: DateTime<Utc>,
    pub merchant: String,
    pub category: String,
    pub amount: f64,
    pub status: Status,
    pub description: String,
}

impl Record {
    /// Render a single field as the grid shows it
    pub fn display_value(&self, field: Field) -> String {
        match field {
            Field::Id => self.id.to_string(),
            Field::Date => self.date.to_rfc3339_opts(SecondsFormat::Millis, true),
            Field::Merchant => self.merchant.clone(),
            Field::Category => self.category.clone(),
            Field::Amount => format!("{:.2}", self.amount),
            Field::Status => self.status.to_string(),
            Field::Description => self.description.clone(),
        }
    }

    /// Natural ordering of one field: numeric for id and amount, chronological
    /// for date, declaration order for status, code point order for text.
    pub fn compare_field(&self, other: &Record, field: Field) -> Ordering {
        match field {
            Field::Id => self.id.cmp(&other.id),
            Field::Date => self.date.cmp(&other.date),
            Field::Merchant => self.merchant.cmp(&other.merchant),
            Field::Category => self.category.cmp(&other.category),
            Field::Amount => self.amount.total_cmp(&other.amount),
            Field::Status => self.status.cmp(&other.status),
            Field::Description => self.description.cmp(&other.description),
        }
    }

    /// Write a raw edit value into a field, converting it to the field's type.
    ///
    /// Nothing is written when conversion fails.
    pub fn set_field(&mut self, field: Field, raw: &str) -> Result<()> {
        let invalid = |reason: String| GridError::InvalidEditValue {
            field,
            value: raw.to_string(),
            reason,
        };

        match field {
            Field::Id => return Err(GridError::ReadOnlyField(field)),
            Field::Date => {
                let parsed = DateTime::parse_from_rfc3339(raw.trim())
                    .map_err(|e| invalid(e.to_string()))?;
                self.date = parsed.with_timezone(&Utc);
            }
            Field::Merchant => self.merchant = raw.to_string(),
            Field::Category => self.category = raw.to_string(),
            Field::Amount => {
                let amount = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| invalid(e.to_string()))?;
                if !amount.is_finite() {
                    return Err(invalid("amount must be finite".to_string()));
                }
                self.amount = amount;
            }
            Field::Status => {
                self.status = raw
                    .parse::<Status>()
                    .map_err(|e| invalid(e.to_string()))?;
            }
            Field::Description => self.description = raw.to_string(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Record {
        Record {
            id: 7,
            date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            merchant: "TechCorp".to_string(),
            category: "Food".to_string(),
            amount: 42.5,
            status: Status::Pending,
            description: "Transaction 7 description".to_string(),
        }
    }

    #[test]
    fn test_field_parsing_is_case_insensitive() {
        assert_eq!("Amount".parse::<Field>().unwrap(), Field::Amount);
        assert_eq!(" merchant ".parse::<Field>().unwrap(), Field::Merchant);
        assert!(matches!(
            "price".parse::<Field>(),
            Err(GridError::UnknownField(_))
        ));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("pending".parse::<Status>().unwrap(), Status::Pending);
        assert_eq!("FAILED".parse::<Status>().unwrap(), Status::Failed);
        assert!("Refunded".parse::<Status>().is_err());
    }

    #[test]
    fn test_set_field_converts_types() {
        let mut record = sample();

        record.set_field(Field::Amount, " 99.95 ").unwrap();
        assert_eq!(record.amount, 99.95);

        record.set_field(Field::Status, "completed").unwrap();
        assert_eq!(record.status, Status::Completed);

        record.set_field(Field::Date, "2023-12-31T23:59:59Z").unwrap();
        assert_eq!(record.date, Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap());

        record.set_field(Field::Merchant, "FinBank").unwrap();
        assert_eq!(record.merchant, "FinBank");
    }

    #[test]
    fn test_set_field_rejects_bad_values_without_writing() {
        let mut record = sample();

        assert!(matches!(
            record.set_field(Field::Amount, "lots"),
            Err(GridError::InvalidEditValue { field: Field::Amount, .. })
        ));
        assert!(record.set_field(Field::Amount, "NaN").is_err());
        assert!(record.set_field(Field::Status, "Refunded").is_err());
        assert!(matches!(
            record.set_field(Field::Id, "8"),
            Err(GridError::ReadOnlyField(Field::Id))
        ));

        assert_eq!(record, sample());
    }

    #[test]
    fn test_compare_field_orders_by_type() {
        let a = sample();
        let mut b = sample();
        b.amount = 100.0;
        b.merchant = "Alpha".to_string();
        b.status = Status::Completed;

        assert_eq!(a.compare_field(&b, Field::Amount), Ordering::Less);
        assert_eq!(a.compare_field(&b, Field::Merchant), Ordering::Greater);
        assert_eq!(a.compare_field(&b, Field::Status), Ordering::Greater);
        assert_eq!(a.compare_field(&b, Field::Id), Ordering::Equal);
    }

    #[test]
    fn test_display_value() {
        let record = sample();
        assert_eq!(record.display_value(Field::Amount), "42.50");
        assert_eq!(record.display_value(Field::Date), "2024-03-01T12:00:00.000Z");
        assert_eq!(record.display_value(Field::Status), "Pending");
    }
}
