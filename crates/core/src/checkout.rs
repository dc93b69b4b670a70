//! Checkout totals and the details collected on the checkout page.
//!
//! [`compute_quote`] is the only place shipping, tax and gift wrap are added
//! up. The checkout page, the payment step and the order confirmation all go
//! through it.

use core::fmt;
use core::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartState;
use crate::types::{Email, EmailError, Money};

/// Sales tax applied to the subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Flat surcharge for gift wrapping.
pub const GIFT_WRAP_FEE: Money = Money::new(Decimal::from_parts(599, 0, 0, false, 2));

/// Errors raised while validating checkout details.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("your cart is empty")]
    EmptyCart,

    #[error("unknown shipping method: {0}")]
    UnknownShippingMethod(String),
}

/// Delivery speed offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
    Overnight,
}

impl ShippingMethod {
    /// Flat shipping charge.
    #[must_use]
    pub fn price(self) -> Money {
        match self {
            Self::Standard => Money::from_cents(899),
            Self::Express => Money::from_cents(1599),
            Self::Overnight => Money::from_cents(2599),
        }
    }

    /// Human-readable delivery promise.
    #[must_use]
    pub const fn delivery_estimate(self) -> &'static str {
        match self {
            Self::Standard => "5-7 business days",
            Self::Express => "2-3 business days",
            Self::Overnight => "Next business day",
        }
    }

    /// Fastest and slowest delivery, in business days.
    #[must_use]
    pub const fn business_days(self) -> (u64, u64) {
        match self {
            Self::Standard => (5, 7),
            Self::Express => (2, 3),
            Self::Overnight => (1, 1),
        }
    }

    /// Display label used on receipts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard Shipping",
            Self::Express => "Express Shipping",
            Self::Overnight => "Overnight Shipping",
        }
    }

    /// Delivery window for an order placed on `placed`.
    #[must_use]
    pub fn delivery_window(self, placed: NaiveDate) -> DeliveryWindow {
        let (fastest, slowest) = self.business_days();
        DeliveryWindow {
            earliest: add_business_days(placed, fastest),
            latest: add_business_days(placed, slowest),
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::Overnight => "overnight",
        })
    }
}

impl FromStr for ShippingMethod {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            "overnight" => Ok(Self::Overnight),
            _ => Err(CheckoutError::UnknownShippingMethod(s.to_owned())),
        }
    }
}

/// Inclusive range of expected delivery dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryWindow {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

fn add_business_days(start: NaiveDate, days: u64) -> NaiveDate {
    let mut date = start;
    let mut remaining = days;
    while remaining > 0 {
        date = date.checked_add_days(Days::new(1)).unwrap_or(date);
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            remaining -= 1;
        }
    }
    date
}

/// Every figure shown in an order summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuote {
    pub item_count: u32,
    pub subtotal: Money,
    pub shipping_method: ShippingMethod,
    pub delivery_estimate: String,
    pub shipping: Money,
    pub gift_wrap: Money,
    pub tax: Money,
    pub total: Money,
}

/// Compute the order totals for a cart.
///
/// Tax is 8% of the subtotal rounded to cents; shipping and gift wrap are not
/// taxed.
///
/// ```
/// use savron_core::checkout::{compute_quote, ShippingMethod};
/// use savron_core::cart::CartState;
/// use savron_core::Money;
///
/// let quote = compute_quote(&CartState::new(), ShippingMethod::Standard, false);
/// assert_eq!(quote.total, Money::from_cents(899));
/// ```
#[must_use]
pub fn compute_quote(cart: &CartState, method: ShippingMethod, gift_wrap: bool) -> CheckoutQuote {
    let subtotal = cart.total();
    let shipping = method.price();
    let gift_wrap = if gift_wrap { GIFT_WRAP_FEE } else { Money::ZERO };
    let tax = subtotal.scale(TAX_RATE).round_cents();

    CheckoutQuote {
        item_count: cart.item_count(),
        subtotal,
        shipping_method: method,
        delivery_estimate: method.delivery_estimate().to_owned(),
        shipping,
        gift_wrap,
        tax,
        total: subtotal + shipping + gift_wrap + tax,
    }
}

/// A postal address as typed into a checkout form.
///
/// Missing fields deserialize as empty strings so validation can name them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressForm {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// A validated postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl AddressForm {
    fn validate(self, billing: bool, missing: &mut Vec<&'static str>) -> Address {
        let fields = [
            (self.first_name.as_str(), "firstName", "billing.firstName"),
            (self.last_name.as_str(), "lastName", "billing.lastName"),
            (self.address.as_str(), "address", "billing.address"),
            (self.city.as_str(), "city", "billing.city"),
            (self.state.as_str(), "state", "billing.state"),
            (self.zip_code.as_str(), "zipCode", "billing.zipCode"),
            (self.country.as_str(), "country", "billing.country"),
        ];
        for (value, shipping_name, billing_name) in fields {
            if value.trim().is_empty() {
                missing.push(if billing { billing_name } else { shipping_name });
            }
        }

        Address {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip_code: self.zip_code.trim().to_owned(),
            country: self.country.trim().to_owned(),
        }
    }
}

/// Gift options chosen at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftOptions {
    pub is_gift: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gift_message: Option<String>,
    pub gift_wrap: bool,
}

/// The checkout form as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    #[serde(flatten)]
    pub shipping_address: AddressForm,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
    #[serde(default = "default_same_as_shipping")]
    pub same_as_shipping: bool,
    #[serde(default)]
    pub billing_address: Option<AddressForm>,
    #[serde(default)]
    pub is_gift: bool,
    #[serde(default)]
    pub gift_message: String,
    #[serde(default)]
    pub gift_wrap: bool,
}

const fn default_same_as_shipping() -> bool {
    true
}

/// Checkout details that passed validation, kept in the session until payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    pub email: Email,
    pub phone: String,
    pub shipping_address: Address,
    pub shipping_method: ShippingMethod,
    pub billing_address: Address,
    pub gift: GiftOptions,
}

impl CheckoutDetails {
    /// Quote for `cart` using the chosen shipping method and gift wrap.
    #[must_use]
    pub fn quote(&self, cart: &CartState) -> CheckoutQuote {
        compute_quote(cart, self.shipping_method, self.gift.gift_wrap)
    }
}

impl CheckoutForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingFields`] listing every blank required
    /// field (billing fields only when billing differs from shipping), or
    /// [`CheckoutError::InvalidEmail`].
    pub fn validate(self) -> Result<CheckoutDetails, CheckoutError> {
        let mut missing = Vec::new();

        let shipping_address = self.shipping_address.validate(false, &mut missing);
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        let billing_address = if self.same_as_shipping {
            shipping_address.clone()
        } else {
            self.billing_address
                .unwrap_or_default()
                .validate(true, &mut missing)
        };

        if !missing.is_empty() {
            return Err(CheckoutError::MissingFields(missing));
        }
        let email = Email::parse(&self.email)?;

        let gift_message = Some(self.gift_message.trim().to_owned())
            .filter(|message| self.is_gift && !message.is_empty());

        Ok(CheckoutDetails {
            email,
            phone: self.phone.trim().to_owned(),
            shipping_address,
            shipping_method: self.shipping_method,
            billing_address,
            gift: GiftOptions {
                is_gift: self.is_gift,
                gift_message,
                gift_wrap: self.gift_wrap,
            },
        })
    }
}
