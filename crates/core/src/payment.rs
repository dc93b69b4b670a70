//! Payment form validation and order confirmations.
//!
//! No card data leaves this module: a valid form is reduced to a
//! [`CardSummary`] holding only the last four digits.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{CartLineItem, CartState};
use crate::checkout::{Address, CheckoutDetails, CheckoutQuote, DeliveryWindow, GiftOptions, ShippingMethod};
use crate::types::{Email, Money, OrderNumber};

/// Reasons a payment form is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("unsupported payment method: {0}")]
    UnsupportedMethod(String),

    #[error("card number is invalid")]
    InvalidCardNumber,

    #[error("expiry date must be MM/YY")]
    InvalidExpiry,

    #[error("card has expired")]
    CardExpired,

    #[error("CVV must be 3 or 4 digits")]
    InvalidCvv,

    #[error("cardholder name is required")]
    MissingCardholder,

    #[error("terms and conditions must be accepted")]
    TermsNotAccepted,
}

/// The payment form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentForm {
    pub payment_method: Option<String>,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub cardholder_name: String,
    pub save_card: bool,
    pub terms_accepted: bool,
}

/// What is kept of a card after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSummary {
    pub last4: String,
    pub cardholder_name: String,
}

impl CardSummary {
    /// "Credit Card ending in 1234".
    #[must_use]
    pub fn describe(&self) -> String {
        format!("Credit Card ending in {}", self.last4)
    }
}

impl PaymentForm {
    /// Validate the form against today's date.
    ///
    /// # Errors
    ///
    /// Returns the first [`PaymentError`] found, checking method, card
    /// number, expiry, CVV, cardholder and terms in that order.
    pub fn validate(&self, today: NaiveDate) -> Result<CardSummary, PaymentError> {
        if let Some(method) = self
            .payment_method
            .as_deref()
            .filter(|m| !m.eq_ignore_ascii_case("card"))
        {
            return Err(PaymentError::UnsupportedMethod(method.to_owned()));
        }

        let digits: String = self.card_number.chars().filter(|c| !c.is_whitespace()).collect();
        if !(13..=19).contains(&digits.len())
            || !digits.chars().all(|c| c.is_ascii_digit())
            || !luhn_valid(&digits)
        {
            return Err(PaymentError::InvalidCardNumber);
        }

        let (month, year) = parse_expiry(&self.expiry_date)?;
        if (year, month) < (today.year(), today.month()) {
            return Err(PaymentError::CardExpired);
        }

        let cvv = self.cvv.trim();
        if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::InvalidCvv);
        }

        let cardholder_name = self.cardholder_name.trim();
        if cardholder_name.is_empty() {
            return Err(PaymentError::MissingCardholder);
        }

        if !self.terms_accepted {
            return Err(PaymentError::TermsNotAccepted);
        }

        Ok(CardSummary {
            last4: digits.get(digits.len() - 4..).unwrap_or_default().to_owned(),
            cardholder_name: cardholder_name.to_owned(),
        })
    }
}

/// Luhn checksum over an all-digit string.
#[must_use]
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

/// Parse `MM/YY` into (month, four-digit year).
fn parse_expiry(raw: &str) -> Result<(u32, i32), PaymentError> {
    let (mm, yy) = raw.trim().split_once('/').ok_or(PaymentError::InvalidExpiry)?;
    if mm.len() != 2 || yy.len() != 2 {
        return Err(PaymentError::InvalidExpiry);
    }
    let month: u32 = mm.parse().map_err(|_| PaymentError::InvalidExpiry)?;
    let year: i32 = yy.parse().map_err(|_| PaymentError::InvalidExpiry)?;
    if !(1..=12).contains(&month) {
        return Err(PaymentError::InvalidExpiry);
    }
    Ok((month, 2000 + year))
}

/// Build an order number from the placement time and a serial.
///
/// Only the last six digits of `serial` are used.
#[must_use]
pub fn order_number(placed_at: DateTime<Utc>, serial: u32) -> OrderNumber {
    OrderNumber::new(format!("SAV-{}-{:06}", placed_at.year(), serial % 1_000_000))
}

/// Payment line of a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub method: String,
    pub card_last4: String,
    pub amount: Money,
}

/// Shipping line of a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSummary {
    pub method: ShippingMethod,
    pub label: String,
    pub address: Address,
}

/// What the shopper sees after paying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_number: OrderNumber,
    pub status: String,
    pub placed_at: DateTime<Utc>,
    pub estimated_delivery: DeliveryWindow,
    pub email: Email,
    pub items: Vec<CartLineItem>,
    pub totals: CheckoutQuote,
    pub shipping: ShippingSummary,
    pub payment: PaymentSummary,
    pub gift: GiftOptions,
}

impl OrderConfirmation {
    /// Assemble a confirmation from the cart being paid for.
    #[must_use]
    pub fn build(
        order_number: OrderNumber,
        placed_at: DateTime<Utc>,
        cart: &CartState,
        details: &CheckoutDetails,
        card: &CardSummary,
    ) -> Self {
        let totals = details.quote(cart);
        Self {
            order_number,
            status: "confirmed".to_owned(),
            placed_at,
            estimated_delivery: details
                .shipping_method
                .delivery_window(placed_at.date_naive()),
            email: details.email.clone(),
            items: cart.items().to_vec(),
            shipping: ShippingSummary {
                method: details.shipping_method,
                label: details.shipping_method.label().to_owned(),
                address: details.shipping_address.clone(),
            },
            payment: PaymentSummary {
                method: card.describe(),
                card_last4: card.last4.clone(),
                amount: totals.total,
            },
            gift: details.gift.clone(),
            totals,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{CartAction, CartItemInput};
    use crate::checkout::CheckoutForm;
    use crate::types::ProductId;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn form() -> PaymentForm {
        PaymentForm {
            payment_method: Some("card".to_string()),
            card_number: "4111 1111 1111 1111".to_string(),
            expiry_date: "12/27".to_string(),
            cvv: "123".to_string(),
            cardholder_name: "Ana Lopez".to_string(),
            save_card: false,
            terms_accepted: true,
        }
    }

    #[test]
    fn test_valid_form_keeps_last_four() {
        let card = form().validate(today()).unwrap();
        assert_eq!(card.last4, "1111");
        assert_eq!(card.describe(), "Credit Card ending in 1111");
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4111111111111111"));
        assert!(luhn_valid("5555555555554444"));
        assert!(!luhn_valid("4111111111111112"));
    }

    #[test]
    fn test_card_number_rules() {
        let mut bad = form();
        bad.card_number = "4111 1111 1111 1112".to_string();
        assert_eq!(bad.validate(today()), Err(PaymentError::InvalidCardNumber));

        bad.card_number = "4111".to_string();
        assert_eq!(bad.validate(today()), Err(PaymentError::InvalidCardNumber));

        bad.card_number = "4111-1111-1111-1111".to_string();
        assert_eq!(bad.validate(today()), Err(PaymentError::InvalidCardNumber));
    }

    #[test]
    fn test_expiry_rules() {
        let mut f = form();
        f.expiry_date = "13/27".to_string();
        assert_eq!(f.validate(today()), Err(PaymentError::InvalidExpiry));

        f.expiry_date = "1227".to_string();
        assert_eq!(f.validate(today()), Err(PaymentError::InvalidExpiry));

        f.expiry_date = "05/25".to_string();
        assert_eq!(f.validate(today()), Err(PaymentError::CardExpired));

        // Valid through the end of the expiry month.
        f.expiry_date = "06/25".to_string();
        assert!(f.validate(today()).is_ok());
    }

    #[test]
    fn test_cvv_cardholder_terms() {
        let mut f = form();
        f.cvv = "12".to_string();
        assert_eq!(f.validate(today()), Err(PaymentError::InvalidCvv));

        let mut f = form();
        f.cardholder_name = "  ".to_string();
        assert_eq!(f.validate(today()), Err(PaymentError::MissingCardholder));

        let mut f = form();
        f.terms_accepted = false;
        assert_eq!(f.validate(today()), Err(PaymentError::TermsNotAccepted));

        let mut f = form();
        f.payment_method = Some("paypal".to_string());
        assert!(matches!(f.validate(today()), Err(PaymentError::UnsupportedMethod(_))));
    }

    #[test]
    fn test_order_number_format() {
        let placed = DateTime::parse_from_rfc3339("2025-06-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(order_number(placed, 1234).as_str(), "SAV-2025-001234");
        assert_eq!(order_number(placed, 12_345_678).as_str(), "SAV-2025-345678");
    }

    #[test]
    fn test_confirmation_uses_checkout_totals() {
        let cart = CartState::new().apply(CartAction::Add {
            item: CartItemInput {
                id: ProductId::new("1"),
                name: "Dark Truffle".to_string(),
                price: Money::from(45),
                image: String::new(),
                description: String::new(),
                in_stock: true,
            },
            quantity: 2,
        });
        let details: CheckoutForm = serde_json::from_value(serde_json::json!({
            "firstName": "Ana", "lastName": "Lopez", "email": "ana@example.com",
            "phone": "555-0100", "address": "123 Main Street", "city": "New York",
            "state": "NY", "zipCode": "10001", "country": "United States",
            "shippingMethod": "overnight"
        }))
        .unwrap();
        let details = details.validate().unwrap();
        let card = form().validate(today()).unwrap();
        let placed = DateTime::parse_from_rfc3339("2025-06-13T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let confirmation =
            OrderConfirmation::build(order_number(placed, 7), placed, &cart, &details, &card);

        assert_eq!(confirmation.items.len(), 1);
        assert_eq!(confirmation.totals.shipping, Money::from_cents(2599));
        assert_eq!(confirmation.payment.amount, confirmation.totals.total);
        assert_eq!(confirmation.payment.card_last4, "1111");
        // Friday order, overnight: Monday.
        assert_eq!(
            confirmation.estimated_delivery.earliest,
            NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
        );
    }
}
