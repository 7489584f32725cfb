use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub mod benefit;
pub mod booking;
pub mod notification;

pub type PassId = Uuid;

/// Identity keys used to look up a pass
///
/// At least one of the keys is always present. Emails are stored lower-cased and both keys are
/// trimmed, so lookups are insensitive to how the client typed them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    email: Option<String>,
    phone: Option<String>,
}

impl Identity {
    /// Build an identity from optional keys
    ///
    /// Returns `None` when both keys are missing or blank.
    pub fn new(email: Option<&str>, phone: Option<&str>) -> Option<Self> {
        let email = email
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_lowercase);
        let phone = phone
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string);

        if email.is_none() && phone.is_none() {
            return None;
        }

        Some(Self { email, phone })
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// A pass qualifies if either key matches
    pub fn matches(&self, pass: &Pass) -> bool {
        let email_matches = matches!(
            (self.email(), pass.owner_email.as_deref()),
            (Some(wanted), Some(owner)) if wanted == owner
        );
        let phone_matches = matches!(
            (self.phone(), pass.owner_phone.as_deref()),
            (Some(wanted), Some(owner)) if wanted == owner
        );

        email_matches || phone_matches
    }
}

/// A purchased, time-bounded membership entitlement
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pass {
    /// Unique identifier for the `Pass`
    ///
    /// Never changes, including across renewals.
    pub id: PassId,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub purchase_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    /// Set on the latest renewal, `None` if the pass was never renewed
    pub renewed_at: Option<DateTime<Utc>>,
    pub amount_paid: Decimal,
    /// Optimistic concurrency token
    ///
    /// Incremented by the store on every successful save.
    #[serde(skip)]
    pub version: u64,
}

impl Pass {
    /// Create a new pass purchased at `now`
    pub fn purchase(
        owner: &Identity,
        amount_paid: Decimal,
        now: DateTime<Utc>,
        duration_days: u32,
    ) -> Result<Self, PassError> {
        if amount_paid < Decimal::ZERO {
            return Err(PassError::NegativeAmount(amount_paid));
        }
        if duration_days == 0 {
            return Err(PassError::InvalidDuration(duration_days));
        }
        let expiry_date = now
            .checked_add_signed(Duration::days(duration_days.into()))
            .ok_or(PassError::DurationTooLong(duration_days))?;

        Ok(Self {
            id: Uuid::new_v4(),
            owner_email: owner.email().map(str::to_string),
            owner_phone: owner.phone().map(str::to_string),
            purchase_date: now,
            expiry_date,
            renewed_at: None,
            amount_paid,
            version: 0,
        })
    }

    /// Extend this pass by `duration_days`
    ///
    /// The new expiry starts from the current expiry when the pass is still active, so unused
    /// days are never lost.
    pub fn renew(&mut self, now: DateTime<Utc>, duration_days: u32) -> Result<(), PassError> {
        if duration_days == 0 {
            return Err(PassError::InvalidDuration(duration_days));
        }

        self.expiry_date = extended_expiry(self.expiry_date, now, duration_days)
            .ok_or(PassError::DurationTooLong(duration_days))?;
        self.renewed_at = Some(now);

        Ok(())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> PassStatus {
        if self.expiry_date > now {
            PassStatus::Active
        } else {
            PassStatus::Expired
        }
    }

    /// Status against the wall clock
    pub fn status(&self) -> PassStatus {
        self.status_at(Utc::now())
    }
}

/// New expiry for a renewal: `max(now, current_expiry) + duration_days`
///
/// Returns `None` when the result does not fit in a timestamp.
pub fn extended_expiry(
    current_expiry: DateTime<Utc>,
    now: DateTime<Utc>,
    duration_days: u32,
) -> Option<DateTime<Utc>> {
    current_expiry
        .max(now)
        .checked_add_signed(Duration::days(duration_days.into()))
}

/// Pick the current pass among several records for the same owner
///
/// The latest expiry wins, ties are broken by the latest purchase date.
pub fn select_current<I>(passes: I) -> Option<Pass>
where
    I: IntoIterator<Item = Pass>,
{
    passes.into_iter().max_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then(a.purchase_date.cmp(&b.purchase_date))
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PassStatus {
    Active,
    Expired,
    NotFound,
}

/// Outcome of resolving an identity to its current pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassLookup {
    Found { pass: Pass, status: PassStatus },
    NotFound,
}

impl PassLookup {
    pub fn status(&self) -> PassStatus {
        match self {
            PassLookup::Found { status, .. } => *status,
            PassLookup::NotFound => PassStatus::NotFound,
        }
    }

    pub fn pass(&self) -> Option<&Pass> {
        match self {
            PassLookup::Found { pass, .. } => Some(pass),
            PassLookup::NotFound => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PassError {
    #[error("amount paid cannot be negative: {0}")]
    NegativeAmount(Decimal),
    #[error("pass duration must be at least one day, got {0}")]
    InvalidDuration(u32),
    #[error("pass duration of {0} days is too long")]
    DurationTooLong(u32),
}
