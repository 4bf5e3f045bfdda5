use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::config::ScanConfig;
use crate::models::DateContext;

lazy_static! {
    // DD.MM.YYYY, DD/MM/YYYY, DD-MM-YYYY, DD MM YYYY
    static ref DAY_FIRST: Regex = Regex::new(r"^([0-9]{1,2})[./\- ]([0-9]{1,2})[./\- ]([0-9]{4})$").unwrap();
    // YYYY-MM-DD, YYYY.MM.DD, YYYY/MM/DD
    static ref YEAR_FIRST: Regex = Regex::new(r"^([0-9]{4})[./\-]([0-9]{1,2})[./\-]([0-9]{1,2})$").unwrap();
    static ref MRZ_DATE: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

/// Resolves the century of two-digit MRZ years.
///
/// MRZ dates carry no century. Birth dates are assumed to be in the past;
/// expiry dates are assumed to lie within a bounded window around the
/// reference date. Failures are soft: callers get `None` (or an empty
/// string) instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub struct DateDisambiguator {
    reference_year: i32,
    min_birth_year: i32,
    expiry_past_window_years: i32,
}

impl DateDisambiguator {
    pub fn new(today: NaiveDate) -> Self {
        let defaults = ScanConfig::default();
        DateDisambiguator {
            reference_year: today.year(),
            min_birth_year: defaults.min_birth_year,
            expiry_past_window_years: defaults.expiry_past_window_years,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        DateDisambiguator {
            reference_year: config.today().year(),
            min_birth_year: config.min_birth_year,
            expiry_past_window_years: config.expiry_past_window_years,
        }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Four-digit year for a two-digit MRZ year under the given policy.
    pub fn resolve_year(&self, two_digit_year: i32, context: DateContext) -> i32 {
        let century = self.reference_year / 100 * 100;
        match context {
            DateContext::Birth | DateContext::Issue => {
                if two_digit_year > self.reference_year % 100 {
                    century - 100 + two_digit_year
                } else {
                    century + two_digit_year
                }
            }
            DateContext::Expiry => {
                let year = century + two_digit_year;
                if year < self.reference_year - self.expiry_past_window_years {
                    year + 100
                } else {
                    year
                }
            }
        }
    }

    /// `YYMMDD` to `DD.MM.YYYY`, or `None` when the value is implausible.
    pub fn disambiguate(&self, raw: &str, context: DateContext) -> Option<String> {
        if !MRZ_DATE.is_match(raw) {
            debug!("Not a YYMMDD date: {:?}", raw);
            return None;
        }

        let year = raw[0..2].parse::<i32>().ok()?;
        let month = raw[2..4].parse::<u32>().ok()?;
        let day = raw[4..6].parse::<u32>().ok()?;

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            debug!("Invalid date components in {}: month={}, day={}", raw, month, day);
            return None;
        }

        let full_year = self.resolve_year(year, context);
        if context == DateContext::Birth && full_year < self.min_birth_year {
            debug!("Birth year {} is before {}, discarding", full_year, self.min_birth_year);
            return None;
        }

        Some(format!("{:02}.{:02}.{:04}", day, month, full_year))
    }

    /// Same as [`disambiguate`](Self::disambiguate) with the empty string as
    /// the failure marker, which is what record fields carry.
    pub fn format_mrz_date(&self, raw: &str, context: DateContext) -> String {
        self.disambiguate(raw, context).unwrap_or_default()
    }

    /// Brings a date from an upstream response to `DD.MM.YYYY`.
    ///
    /// Accepts day-first and year-first dates with a four-digit year as
    /// well as raw `YYMMDD`. Explicit four-digit years are taken as given;
    /// only the month/day ranges are checked. Anything else becomes empty.
    pub fn normalize_date(&self, value: &str, context: DateContext) -> String {
        let value = value.trim();
        if value.is_empty() {
            return String::new();
        }

        if MRZ_DATE.is_match(value) {
            return self.format_mrz_date(value, context);
        }

        let parts = if let Some(caps) = DAY_FIRST.captures(value) {
            (caps[1].parse::<u32>(), caps[2].parse::<u32>(), caps[3].parse::<i32>())
        } else if let Some(caps) = YEAR_FIRST.captures(value) {
            (caps[3].parse::<u32>(), caps[2].parse::<u32>(), caps[1].parse::<i32>())
        } else {
            debug!("Unrecognized date format: {:?}", value);
            return String::new();
        };

        match parts {
            (Ok(day), Ok(month), Ok(year)) if (1..=12).contains(&month) && (1..=31).contains(&day) => {
                format!("{:02}.{:02}.{:04}", day, month, year)
            }
            _ => {
                debug!("Invalid date components in {:?}", value);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_2024() -> DateDisambiguator {
        DateDisambiguator::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    #[test]
    fn test_birth_prior_century() {
        assert_eq!(in_2024().disambiguate("970101", DateContext::Birth), Some("01.01.1997".to_string()));
    }

    #[test]
    fn test_birth_current_century() {
        assert_eq!(in_2024().disambiguate("050630", DateContext::Birth), Some("30.06.2005".to_string()));
        assert_eq!(in_2024().disambiguate("240101", DateContext::Birth), Some("01.01.2024".to_string()));
    }

    #[test]
    fn test_expiry_future() {
        assert_eq!(in_2024().disambiguate("300101", DateContext::Expiry), Some("01.01.2030".to_string()));
    }

    #[test]
    fn test_expiry_recent_past_stays_in_century() {
        assert_eq!(in_2024().disambiguate("150101", DateContext::Expiry), Some("01.01.2015".to_string()));
    }

    #[test]
    fn test_expiry_beyond_window_rolls_forward() {
        assert_eq!(in_2024().disambiguate("100101", DateContext::Expiry), Some("01.01.2110".to_string()));
    }

    #[test]
    fn test_invalid_month_is_soft_failure() {
        assert_eq!(in_2024().disambiguate("991301", DateContext::Birth), None);
        assert_eq!(in_2024().format_mrz_date("991301", DateContext::Birth), "");
    }

    #[test]
    fn test_invalid_day_and_shape() {
        assert_eq!(in_2024().disambiguate("990132", DateContext::Birth), None);
        assert_eq!(in_2024().disambiguate("990100", DateContext::Birth), None);
        assert_eq!(in_2024().disambiguate("99O101", DateContext::Birth), None);
        assert_eq!(in_2024().disambiguate("<<<<<<", DateContext::Expiry), None);
        assert_eq!(in_2024().disambiguate("9901", DateContext::Expiry), None);
    }

    #[test]
    fn test_implausible_birth_year() {
        // 39 > 24, so 1939, which is before 1940
        assert_eq!(in_2024().disambiguate("390101", DateContext::Birth), None);
        assert_eq!(in_2024().disambiguate("400101", DateContext::Birth), Some("01.01.1940".to_string()));
    }

    #[test]
    fn test_config_thresholds() {
        let config = ScanConfig {
            reference_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            min_birth_year: 1900,
            expiry_past_window_years: 50,
            ..ScanConfig::default()
        };
        let dates = DateDisambiguator::from_config(&config);
        assert_eq!(dates.disambiguate("300101", DateContext::Birth), Some("01.01.1930".to_string()));
        assert_eq!(dates.disambiguate("100101", DateContext::Expiry), Some("01.01.2010".to_string()));
    }

    #[test]
    fn test_normalize_date_formats() {
        let dates = in_2024();
        assert_eq!(dates.normalize_date("25.08.1985", DateContext::Birth), "25.08.1985");
        assert_eq!(dates.normalize_date("5/8/1985", DateContext::Birth), "05.08.1985");
        assert_eq!(dates.normalize_date("26 11 1983", DateContext::Birth), "26.11.1983");
        assert_eq!(dates.normalize_date("2030-08-25", DateContext::Expiry), "25.08.2030");
        assert_eq!(dates.normalize_date("300825", DateContext::Expiry), "25.08.2030");
        assert_eq!(dates.normalize_date(" ", DateContext::Expiry), "");
        assert_eq!(dates.normalize_date("25.13.1985", DateContext::Birth), "");
        assert_eq!(dates.normalize_date("August 1985", DateContext::Birth), "");
    }

    #[test]
    fn test_issue_date_past_policy_without_floor() {
        assert_eq!(in_2024().normalize_date("200929", DateContext::Issue), "29.09.2020");
        assert_eq!(in_2024().normalize_date("300101", DateContext::Issue), "01.01.1930");
    }
}
