use std::collections::HashMap;

use log::warn;

pub struct CountryRules {
    pub countries: Vec<CountryRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryRule {
    pub country_code: String,
    pub validation_rules: Vec<ValidationRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationRule {
    PersonalNumberLength(usize), // Exact number of characters kept
}

impl CountryRules {
    pub fn new() -> Self {
        let mut countries = Vec::new();

        // Uzbekistan: 14-digit PINFL
        countries.push(CountryRule {
            country_code: "UZB".to_string(),
            validation_rules: vec![ValidationRule::PersonalNumberLength(14)],
        });

        // Kyrgyzstan: 14-digit PIN
        countries.push(CountryRule {
            country_code: "KGZ".to_string(),
            validation_rules: vec![ValidationRule::PersonalNumberLength(14)],
        });

        // Kazakhstan: 12-digit IIN
        countries.push(CountryRule {
            country_code: "KAZ".to_string(),
            validation_rules: vec![ValidationRule::PersonalNumberLength(12)],
        });

        CountryRules { countries }
    }

    /// Built-in rules plus per-country personal number lengths from config.
    /// A configured country replaces the built-in rule for that code.
    pub fn with_overrides(overrides: &HashMap<String, usize>) -> Self {
        let mut rules = Self::new();
        for (code, length) in overrides {
            let code = code.trim().to_uppercase();
            rules.countries.retain(|rule| rule.country_code != code);
            rules.countries.push(CountryRule {
                country_code: code,
                validation_rules: vec![ValidationRule::PersonalNumberLength(*length)],
            });
        }
        rules
    }

    pub fn get_rule(&self, country_code: &str) -> Option<&CountryRule> {
        self.countries.iter().find(|rule| rule.country_code == country_code)
    }

    /// Applies the issuing country's personal number rules.
    /// Values longer than the rule are truncated; shorter ones are kept.
    pub fn apply_personal_number(&self, issuing_country: &str, personal_number: &str) -> String {
        let Some(rule) = self.get_rule(issuing_country) else {
            return personal_number.to_string();
        };
        if personal_number.is_empty() {
            return String::new();
        }

        let mut value = personal_number.to_string();
        for validation in &rule.validation_rules {
            match validation {
                ValidationRule::PersonalNumberLength(length) => {
                    let count = value.chars().count();
                    if count > *length {
                        warn!(
                            "Personal number for {} has {} characters, truncating to {}",
                            rule.country_code, count, length
                        );
                        value = value.chars().take(*length).collect();
                    } else if count < *length {
                        warn!(
                            "Personal number for {} has {} characters, expected {}",
                            rule.country_code, count, length
                        );
                    }
                }
            }
        }
        value
    }
}

impl Default for CountryRules {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uzb_personal_number_truncated_to_14() {
        let rules = CountryRules::new();
        assert_eq!(rules.apply_personal_number("UZB", "123456789012345"), "12345678901234");
    }

    #[test]
    fn test_short_personal_number_kept() {
        let rules = CountryRules::new();
        assert_eq!(rules.apply_personal_number("KAZ", "12345"), "12345");
    }

    #[test]
    fn test_unknown_country_untouched() {
        let rules = CountryRules::new();
        assert_eq!(rules.apply_personal_number("USA", "ABCDEFGHIJKLMNOP"), "ABCDEFGHIJKLMNOP");
        assert_eq!(rules.apply_personal_number("UZB", ""), "");
    }

    #[test]
    fn test_override_replaces_builtin_rule() {
        let mut overrides = HashMap::new();
        overrides.insert("uzb".to_string(), 4);
        overrides.insert("TJK".to_string(), 9);
        let rules = CountryRules::with_overrides(&overrides);
        assert_eq!(rules.apply_personal_number("UZB", "123456"), "1234");
        assert_eq!(rules.apply_personal_number("TJK", "1234567890"), "123456789");
        assert_eq!(rules.countries.iter().filter(|r| r.country_code == "UZB").count(), 1);
    }
}
