//! Card detail validation
//!
//! Pure validation of card number, expiry, and CVV. Nothing here talks to a
//! network or consumes a payment id; a rejection is a structured
//! [`CardError`] naming the exact rule that failed.
//!
//! Rules, in the order they are checked:
//! 1. The card number, after stripping whitespace, must be 13-19 ASCII digits.
//! 2. The digits must satisfy the Luhn checksum.
//! 3. The expiry must be `MM/YY` with the month in 01-12.
//! 4. The CVV must be exactly 3 digits.

use crate::types::CardError;

/// Card details as captured at the terminal
///
/// The number may contain whitespace (as embossed on the card); it is
/// stripped before validation. The card type (e.g. "VISA") is passed through
/// to the gateway and not interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    /// Card number, possibly with embedded whitespace
    pub number: String,
    /// Expiry in MM/YY form
    pub expiry: String,
    /// Card verification value
    pub cvv: String,
    /// Card scheme label, forwarded to the gateway untouched
    pub card_type: String,
}

impl CardDetails {
    /// Convenience constructor
    pub fn new(
        number: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
        card_type: impl Into<String>,
    ) -> Self {
        CardDetails {
            number: number.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
            card_type: card_type.into(),
        }
    }
}

/// Validate card details
///
/// # Errors
///
/// Returns the first [`CardError`] encountered, in the rule order documented
/// at the module level.
pub fn validate(card: &CardDetails) -> Result<(), CardError> {
    let digits: String = card
        .number
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CardError::NonNumeric);
    }
    if !(13..=19).contains(&digits.len()) {
        return Err(CardError::InvalidLength { len: digits.len() });
    }
    if !luhn_valid(&digits) {
        return Err(CardError::ChecksumFailed);
    }

    validate_expiry(&card.expiry)?;
    validate_cvv(&card.cvv)
}

/// Luhn checksum over a digits-only string
///
/// Doubles every second digit from the rightmost, subtracting 9 when the
/// doubled value exceeds 9; the sum of all digits must be divisible by 10.
fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}

fn validate_expiry(expiry: &str) -> Result<(), CardError> {
    let Some((month, year)) = expiry.split_once('/') else {
        return Err(CardError::InvalidExpiryFormat);
    };
    if month.len() != 2 || year.len() != 2 {
        return Err(CardError::InvalidExpiryFormat);
    }
    if !month.chars().all(|c| c.is_ascii_digit()) || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(CardError::InvalidExpiryFormat);
    }

    let month: u8 = month.parse().map_err(|_| CardError::InvalidExpiryFormat)?;
    if !(1..=12).contains(&month) {
        return Err(CardError::InvalidExpiryMonth { month });
    }
    Ok(())
}

fn validate_cvv(cvv: &str) -> Result<(), CardError> {
    if cvv.len() != 3 || !cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(CardError::InvalidCvv);
    }
    Ok(())
}
