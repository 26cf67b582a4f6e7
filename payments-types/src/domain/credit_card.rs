//! Credit card supplied by the payer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Card details as sent by the caller and forwarded to the fraud checker.
///
/// `Debug` masks the number and CVV so cards can be logged safely.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    #[schema(example = "4485-2847-2013-4093")]
    pub number: String,
    #[schema(example = "Jumping Jack")]
    pub holder_name: String,
    #[schema(example = "Bank of Test")]
    pub issuing_bank: String,
    #[schema(value_type = String, example = "2030-01-01T00:00:00Z")]
    pub valid_until: DateTime<Utc>,
    #[schema(example = 456)]
    pub cvv: u16,
}

impl CreditCard {
    /// Last four digits of the card number.
    pub fn last_four(&self) -> String {
        let digits: Vec<char> = self.number.chars().filter(char::is_ascii_digit).collect();
        let start = digits.len().saturating_sub(4);
        digits[start..].iter().collect()
    }
}

impl std::fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditCard")
            .field("number", &format_args!("****{}", self.last_four()))
            .field("holder_name", &self.holder_name)
            .field("issuing_bank", &self.issuing_bank)
            .field("valid_until", &self.valid_until)
            .field("cvv", &format_args!("***"))
            .finish()
    }
}
