//! Human-readable rendering of prediction outcomes.

use serde::{Deserialize, Serialize};
use tabula_model::Outcome;

/// How a predictor presents its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum DisplayFormat {
    /// Class label plus a confidence line
    Label {
        /// Name of the predicted quantity, e.g. `Species`
        title: String,
    },
    /// Value on a fixed scale, one decimal
    Score {
        /// Name of the predicted quantity, e.g. `Rating`
        title: String,
        /// Top of the scale
        out_of: f64,
    },
    /// Monetary value with thousands separators, two decimals
    Currency {
        /// Name of the predicted quantity, e.g. `Sales`
        title: String,
        /// Currency symbol placed before the amount
        symbol: String,
    },
}

impl DisplayFormat {
    /// Title of the predicted quantity
    pub fn title(&self) -> &str {
        match self {
            Self::Label { title } | Self::Score { title, .. } | Self::Currency { title, .. } => {
                title
            }
        }
    }

    /// Render an outcome.
    ///
    /// ```
    /// use tabula_model::Outcome;
    /// use tabula_output::DisplayFormat;
    ///
    /// let format = DisplayFormat::Score { title: "Rating".into(), out_of: 10.0 };
    /// assert_eq!(format.render(&Outcome::Value { value: 7.26 }), "Predicted Rating: 7.3/10");
    /// ```
    pub fn render(&self, outcome: &Outcome) -> String {
        match (self, outcome) {
            (
                Self::Label { title },
                Outcome::Class {
                    label, confidence, ..
                },
            ) => format!(
                "Predicted {}: {}\nConfidence: {:.2}%",
                title,
                capitalize(label),
                confidence
            ),
            (Self::Score { title, out_of }, Outcome::Value { value }) => {
                format!("Predicted {}: {:.1}/{}", title, value, out_of)
            }
            (Self::Currency { title, symbol }, Outcome::Value { value }) => {
                format!("Predicted {}: {}{}", title, symbol, group_thousands(*value, 2))
            }
            (_, Outcome::Class { label, .. }) => {
                format!("Predicted {}: {}", self.title(), capitalize(label))
            }
            (_, Outcome::Value { value }) => format!("Predicted {}: {}", self.title(), value),
        }
    }
}

/// Format a number with `,` between groups of three integer digits.
///
/// ```
/// assert_eq!(tabula_output::group_thousands(1234567.891, 2), "1,234,567.89");
/// assert_eq!(tabula_output::group_thousands(-950.0, 0), "-950");
/// ```
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    if value < 0.0 && formatted.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
