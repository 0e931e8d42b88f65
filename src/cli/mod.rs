pub mod catalog;
pub mod commands;
pub mod device;
pub mod init;
pub mod invite;
pub mod social;
pub mod task;
pub mod user;

pub use commands::*;

use crate::error::SlifeError;

/// Ratings arrive as free text on the wire; anything that is not an integer
/// in range is an `InvalidRating`, not a parse failure.
pub(crate) fn parse_rating(raw: Option<&str>) -> Result<Option<i64>, SlifeError> {
    match raw {
        None => Ok(None),
        Some(s) => {
            let value: i64 = s.parse().map_err(|_| SlifeError::invalid_rating())?;
            Ok(Some(value))
        }
    }
}
