pub mod cars;
pub mod compliance;
pub mod customers;
pub mod maintenance;
pub mod rentals;
pub mod reports;
pub mod users;

use chrono::NaiveDate;

use crate::error::{Error, Result};

pub(crate) const DATE_FMT: &str = "%Y-%m-%d";

/// Stand-in end for open-ended intervals; sorts after every real date.
pub(crate) const OPEN_ENDED: &str = "9999-12-31";

pub(crate) fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FMT).map_err(|_| Error::InvalidDate {
        field,
        value: value.to_string(),
    })
}

pub(crate) fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
