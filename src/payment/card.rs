use chrono::{Datelike, NaiveDate, Utc};

use crate::error::{AppError, AppResult};

/// Card fields as collected by the checkout form.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: i32,
    pub cvc: String,
    pub postal_code: Option<String>,
}

impl CardDetails {
    pub fn new(number: impl Into<String>, exp_month: u32, exp_year: i32, cvc: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            exp_month,
            exp_year,
            cvc: cvc.into(),
            postal_code: None,
        }
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    /// Digits only, with spaces and dashes removed.
    pub fn normalized_number(&self) -> String {
        self.number
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect()
    }

    pub fn last4(&self) -> String {
        let mut tail: Vec<char> = self.normalized_number().chars().rev().take(4).collect();
        tail.reverse();
        tail.into_iter().collect()
    }

    pub fn validate(&self) -> AppResult<()> {
        self.validate_on(Utc::now().date_naive())
    }

    pub fn validate_on(&self, today: NaiveDate) -> AppResult<()> {
        let number = self.normalized_number();
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("Your card number is invalid."));
        }
        if number.len() < 12 {
            return Err(invalid("Your card number is incomplete."));
        }
        if number.len() > 19 || !luhn_valid(&number) {
            return Err(invalid("Your card number is invalid."));
        }
        if !(1..=12).contains(&self.exp_month) {
            return Err(invalid("Your card's expiration month is invalid."));
        }
        if (self.exp_year, self.exp_month) < (today.year(), today.month()) {
            return Err(invalid("Your card's expiration date is in the past."));
        }
        let cvc = self.cvc.trim();
        if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("Your card's security code is incomplete."));
        }
        Ok(())
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("last4", &self.last4())
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .finish_non_exhaustive()
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Validation(message.to_string())
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    #[test]
    fn accepts_formatted_test_card() {
        let card = CardDetails::new("4242 4242 4242 4242", 12, 2030, "123");
        assert!(card.validate_on(today()).is_ok());
        assert_eq!(card.last4(), "4242");
    }

    #[test]
    fn last4_of_non_ascii_input_does_not_panic() {
        let card = CardDetails::new("4242 4242 4242 42é4", 12, 2030, "123");
        assert_eq!(card.last4(), "42é4");
        assert!(format!("{card:?}").contains("42é4"));
        assert!(card.validate_on(today()).is_err());

        assert_eq!(CardDetails::new("42", 12, 2030, "123").last4(), "42");
    }

    #[test]
    fn rejects_incomplete_fields() {
        let cases = [
            CardDetails::new("4242", 12, 2030, "123"),
            CardDetails::new("4242424242424241", 12, 2030, "123"),
            CardDetails::new("4242424242424242", 13, 2030, "123"),
            CardDetails::new("4242424242424242", 9, 2026, "123"),
            CardDetails::new("4242424242424242", 12, 2030, "12"),
        ];
        for card in cases {
            assert!(
                matches!(card.validate_on(today()), Err(AppError::Validation(_))),
                "{card:?} should be rejected"
            );
        }
    }

    #[test]
    fn current_month_is_not_expired() {
        let card = CardDetails::new("4242424242424242", 10, 2026, "1234");
        assert!(card.validate_on(today()).is_ok());
    }

    #[test]
    fn debug_never_prints_full_number() {
        let rendered = format!("{:?}", CardDetails::new("4242424242424242", 12, 2030, "123"));
        assert!(!rendered.contains("4242424242424242"));
        assert!(!rendered.contains("123\""));
    }
}
