//! Course model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A course offering. Identity is the course name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    /// Free-text level label, matched against quiz tiers.
    pub level: String,
    pub teacher: String,
    pub schedule: String,
    pub description: String,
    pub price: Decimal,
}

impl Course {
    pub fn new(
        name: impl Into<String>,
        level: impl Into<String>,
        teacher: impl Into<String>,
        schedule: impl Into<String>,
        description: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            level: level.into(),
            teacher: teacher.into(),
            schedule: schedule.into(),
            description: description.into(),
            price,
        }
    }

    /// Price with two decimal places, e.g. `9900.00`.
    pub fn price_display(&self) -> String {
        format!("{:.2}", self.price.round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn price_always_has_two_decimals() {
        let course = Course::new("Go Basics", "Beginner", "Ann", "Mon", "Intro", dec!(9900));
        assert_eq!(course.price_display(), "9900.00");

        let course = Course { price: dec!(14.5), ..course };
        assert_eq!(course.price_display(), "14.50");
    }

    #[test]
    fn serde_keeps_price_as_string() {
        let course = Course::new("Go Basics", "Beginner", "Ann", "Mon", "Intro", dec!(9900.00));
        let json = serde_json::to_value(&course).unwrap();
        assert_eq!(json["price"], "9900.00");
    }
}
