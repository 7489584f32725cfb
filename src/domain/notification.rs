use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{booking::DEFAULT_BOOKING_TYPE, Pass};

/// Email template selected by the transport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    BookingConfirmation,
    PassPurchase,
    PassRenewal,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::BookingConfirmation => "booking-confirmation",
            TemplateKind::PassPurchase => "pass-purchase",
            TemplateKind::PassRenewal => "pass-renewal",
        }
    }
}

/// Validated, benefit-aware notification ready for dispatch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationRequest {
    BookingConfirmation(BookingConfirmation),
    PassPurchase(PassPurchase),
    PassRenewal(PassRenewal),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingConfirmation {
    pub email: String,
    pub name: String,
    pub booking_id: String,
    pub venue_name: String,
    pub booking_date: String,
    pub booking_type: String,
    pub original_amount: Decimal,
    pub total_amount: Decimal,
    pub pass_benefit_applied: Option<String>,
    pub savings_amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassPurchase {
    pub email: String,
    pub name: String,
    pub pass_id: String,
    pub purchase_date: String,
    pub expiry_date: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassRenewal {
    pub email: String,
    pub name: String,
    pub pass_id: String,
    pub renewal_date: String,
    pub new_expiry_date: String,
}

impl NotificationRequest {
    /// Pass purchase email for a freshly created pass
    pub fn pass_purchase(pass: &Pass, email: &str, name: &str) -> Self {
        NotificationRequest::PassPurchase(PassPurchase {
            email: email.to_string(),
            name: name.to_string(),
            pass_id: pass.id.to_string(),
            purchase_date: format_date(pass.purchase_date),
            expiry_date: format_date(pass.expiry_date),
            amount: pass.amount_paid,
        })
    }

    /// Pass renewal email for a renewed pass
    pub fn pass_renewal(pass: &Pass, email: &str, name: &str) -> Self {
        NotificationRequest::PassRenewal(PassRenewal {
            email: email.to_string(),
            name: name.to_string(),
            pass_id: pass.id.to_string(),
            renewal_date: format_date(pass.renewed_at.unwrap_or_else(Utc::now)),
            new_expiry_date: format_date(pass.expiry_date),
        })
    }

    pub fn kind(&self) -> TemplateKind {
        match self {
            NotificationRequest::BookingConfirmation(_) => TemplateKind::BookingConfirmation,
            NotificationRequest::PassPurchase(_) => TemplateKind::PassPurchase,
            NotificationRequest::PassRenewal(_) => TemplateKind::PassRenewal,
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            NotificationRequest::BookingConfirmation(req) => &req.email,
            NotificationRequest::PassPurchase(req) => &req.email,
            NotificationRequest::PassRenewal(req) => &req.email,
        }
    }

    pub fn subject(&self) -> String {
        match self {
            NotificationRequest::BookingConfirmation(req) => {
                format!("Booking confirmed: {}", req.venue_name)
            }
            NotificationRequest::PassPurchase(_) => "Your membership pass is active".to_string(),
            NotificationRequest::PassRenewal(_) => "Your membership pass has been renewed".to_string(),
        }
    }

    /// Plain-text body of the email
    pub fn body(&self) -> String {
        match self {
            NotificationRequest::BookingConfirmation(req) => {
                let mut body = format!(
                    "Hi {},\n\nYour {} booking at {} on {} is confirmed.\nBooking ID: {}\n",
                    req.name, req.booking_type, req.venue_name, req.booking_date, req.booking_id
                );
                if let Some(benefit) = &req.pass_benefit_applied {
                    body.push_str(&format!(
                        "Original price: {}\nPass benefit: {}\nYou saved: {}\n",
                        req.original_amount, benefit, req.savings_amount
                    ));
                }
                body.push_str(&format!("Total paid: {}\n", req.total_amount));
                body
            }
            NotificationRequest::PassPurchase(req) => format!(
                "Hi {},\n\nThanks for purchasing a membership pass.\nPass ID: {}\nValid from {} until {}\nAmount paid: {}\n",
                req.name, req.pass_id, req.purchase_date, req.expiry_date, req.amount
            ),
            NotificationRequest::PassRenewal(req) => format!(
                "Hi {},\n\nYour membership pass {} was renewed on {}.\nIt is now valid until {}.\n",
                req.name, req.pass_id, req.renewal_date, req.new_expiry_date
            ),
        }
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Inbound booking confirmation body, before validation
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmationPayload {
    pub email: Option<String>,
    pub name: Option<String>,
    pub booking_id: Option<String>,
    pub venue_name: Option<String>,
    pub booking_date: Option<String>,
    pub total_amount: Option<Decimal>,
    pub booking_type: Option<String>,
    pub original_amount: Option<Decimal>,
    pub pass_benefit_applied: Option<String>,
    pub savings_amount: Option<Decimal>,
}

impl BookingConfirmationPayload {
    pub fn validate(self) -> Result<NotificationRequest, ValidationError> {
        let mut fields = Fields::default();
        let email = fields.text("email", self.email);
        let name = fields.text("name", self.name);
        let booking_id = fields.text("bookingId", self.booking_id);
        let venue_name = fields.text("venueName", self.venue_name);
        let booking_date = fields.text("bookingDate", self.booking_date);
        let total_amount = fields.amount("totalAmount", self.total_amount);
        let original_amount = fields.optional_amount("originalAmount", self.original_amount);
        let savings_amount = fields.optional_amount("savingsAmount", self.savings_amount);
        fields.finish()?;

        let original_amount = original_amount.unwrap_or(total_amount);
        let pass_benefit_applied = non_blank(self.pass_benefit_applied);
        let savings_amount = reconcile_savings(
            original_amount,
            total_amount,
            savings_amount,
            pass_benefit_applied.is_some(),
        )?;

        Ok(NotificationRequest::BookingConfirmation(BookingConfirmation {
            email,
            name,
            booking_id,
            venue_name,
            booking_date,
            booking_type: non_blank(self.booking_type)
                .unwrap_or_else(|| DEFAULT_BOOKING_TYPE.to_string()),
            original_amount,
            total_amount,
            pass_benefit_applied,
            savings_amount,
        }))
    }
}

/// Inbound pass purchase body, before validation
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassPurchasePayload {
    pub email: Option<String>,
    pub name: Option<String>,
    pub purchase_date: Option<String>,
    pub expiry_date: Option<String>,
    pub pass_id: Option<String>,
    pub amount: Option<Decimal>,
}

impl PassPurchasePayload {
    pub fn validate(self) -> Result<NotificationRequest, ValidationError> {
        let mut fields = Fields::default();
        let email = fields.text("email", self.email);
        let name = fields.text("name", self.name);
        let purchase_date = fields.text("purchaseDate", self.purchase_date);
        let expiry_date = fields.text("expiryDate", self.expiry_date);
        let pass_id = fields.text("passId", self.pass_id);
        let amount = fields.amount("amount", self.amount);
        fields.finish()?;

        Ok(NotificationRequest::PassPurchase(PassPurchase {
            email,
            name,
            pass_id,
            purchase_date,
            expiry_date,
            amount,
        }))
    }
}

/// Inbound pass renewal body, before validation
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassRenewalPayload {
    pub email: Option<String>,
    pub name: Option<String>,
    pub renewal_date: Option<String>,
    pub new_expiry_date: Option<String>,
    pub pass_id: Option<String>,
}

impl PassRenewalPayload {
    pub fn validate(self) -> Result<NotificationRequest, ValidationError> {
        let mut fields = Fields::default();
        let email = fields.text("email", self.email);
        let name = fields.text("name", self.name);
        let renewal_date = fields.text("renewalDate", self.renewal_date);
        let new_expiry_date = fields.text("newExpiryDate", self.new_expiry_date);
        let pass_id = fields.text("passId", self.pass_id);
        fields.finish()?;

        Ok(NotificationRequest::PassRenewal(PassRenewal {
            email,
            name,
            pass_id,
            renewal_date,
            new_expiry_date,
        }))
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Amounts cannot be negative: {}", .0.join(", "))]
    NegativeAmounts(Vec<&'static str>),
    #[error("Inconsistent amounts: {0}")]
    InconsistentAmounts(&'static str),
}

/// Savings for a confirmed booking, derived as `original - total` when not given
///
/// A charged total above the original price, savings that don't add up, or savings without a
/// benefit to explain them are rejected.
fn reconcile_savings(
    original_amount: Decimal,
    total_amount: Decimal,
    savings_amount: Option<Decimal>,
    benefit_applied: bool,
) -> Result<Decimal, ValidationError> {
    if total_amount > original_amount {
        return Err(ValidationError::InconsistentAmounts(
            "totalAmount cannot exceed originalAmount",
        ));
    }
    let expected = original_amount - total_amount;

    if matches!(savings_amount, Some(savings) if savings != expected) {
        return Err(ValidationError::InconsistentAmounts(
            "savingsAmount must equal originalAmount - totalAmount",
        ));
    }
    if !benefit_applied && expected != Decimal::ZERO {
        return Err(ValidationError::InconsistentAmounts(
            "a discount requires passBenefitApplied",
        ));
    }

    Ok(expected)
}

/// Collects field problems so a single error names all of them
#[derive(Default)]
struct Fields {
    missing: Vec<&'static str>,
    negative: Vec<&'static str>,
}

impl Fields {
    fn text(&mut self, name: &'static str, value: Option<String>) -> String {
        non_blank(value).unwrap_or_else(|| {
            self.missing.push(name);
            String::new()
        })
    }

    fn amount(&mut self, name: &'static str, value: Option<Decimal>) -> Decimal {
        match self.optional_amount(name, value) {
            Some(amount) => amount,
            None => {
                self.missing.push(name);
                Decimal::ZERO
            }
        }
    }

    fn optional_amount(&mut self, name: &'static str, value: Option<Decimal>) -> Option<Decimal> {
        if matches!(value, Some(amount) if amount < Decimal::ZERO) {
            self.negative.push(name);
        }
        value
    }

    fn finish(self) -> Result<(), ValidationError> {
        if !self.missing.is_empty() {
            return Err(ValidationError::MissingFields(self.missing));
        }
        if !self.negative.is_empty() {
            return Err(ValidationError::NegativeAmounts(self.negative));
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
