//! Entity to model mappers
//!
//! - `TryFrom<Model> for Entity`: rows to domain objects. Enum columns are
//!   stored as text, so a row with an unknown value fails the conversion.
//! - `From<&Entity> for Model`: domain objects to bindable rows.

mod membership;
mod participation;
mod ride;

use std::str::FromStr;

use ride_core::DomainError;

/// Parse a text column into its domain enum
fn parse_column<T>(column: &'static str, value: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    value
        .parse()
        .map_err(|_| DomainError::DatabaseError(format!("invalid {column} value in row: {value:?}")))
}
