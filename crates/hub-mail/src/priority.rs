use std::fmt;

/// Message priority, 1 (highest) through 5 (lowest).
///
/// Converts from the legacy level names as well as numbers:
///
/// ```rust
/// use hub_mail::Priority;
///
/// assert_eq!(Priority::from("high").value(), 1);
/// assert_eq!(Priority::from("LOW").value(), 5);
/// assert_eq!(Priority::from("urgent").value(), 3);
/// assert_eq!(Priority::from(9).value(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const HIGH: Priority = Priority(2);
    pub const NORMAL: Priority = Priority(3);
    pub const LOW: Priority = Priority(4);
    pub const LOWEST: Priority = Priority(5);

    pub fn value(self) -> u8 {
        self.0
    }

    /// `X-Priority` header value, e.g. `1 (Highest)`.
    pub fn header_value(self) -> String {
        let label = match self.0 {
            1 => "Highest",
            2 => "High",
            4 => "Low",
            5 => "Lowest",
            _ => "Normal",
        };
        format!("{} ({})", self.0, label)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Priority {
    fn from(level: &str) -> Self {
        match level.trim().to_ascii_lowercase().as_str() {
            "high" => Priority(1),
            "low" => Priority(5),
            _ => Priority::NORMAL,
        }
    }
}

impl From<String> for Priority {
    fn from(level: String) -> Self {
        Priority::from(level.as_str())
    }
}

impl From<i64> for Priority {
    fn from(value: i64) -> Self {
        Priority(value.clamp(1, 5) as u8)
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority::from(i64::from(value))
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        Priority::from(i64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_named_levels() {
        assert_eq!(Priority::from("high"), Priority::HIGHEST);
        assert_eq!(Priority::from("High"), Priority::HIGHEST);
        assert_eq!(Priority::from("normal"), Priority::NORMAL);
        assert_eq!(Priority::from("LOW"), Priority::LOWEST);
        assert_eq!(Priority::from(""), Priority::NORMAL);
    }

    #[test]
    fn test_header_value() {
        assert_eq!(Priority::HIGHEST.header_value(), "1 (Highest)");
        assert_eq!(Priority::default().header_value(), "3 (Normal)");
        assert_eq!(Priority::from(0).header_value(), "1 (Highest)");
    }

    proptest! {
        #[test]
        fn numbers_clamp_into_range(n in any::<i64>()) {
            let p = Priority::from(n).value();
            prop_assert!((1..=5).contains(&p));
            if (1..=5).contains(&n) {
                prop_assert_eq!(i64::from(p), n);
            }
        }

        #[test]
        fn unknown_names_are_normal(s in "[a-z]{0,12}") {
            prop_assume!(s != "high" && s != "low");
            prop_assert_eq!(Priority::from(s.as_str()), Priority::NORMAL);
        }
    }
}
