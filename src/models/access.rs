use super::*;

/// The effective access tier of a visitor, derived from an account snapshot
/// and the clock. Every entry point derives it through here so the expiry
/// rules live in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
  NoAccount,
  Free,
  PremiumActive,
  PremiumExpired,
}

impl AccessTier {
  pub fn evaluate(is_premium: bool, renew_date: Option<UtcDateTime>, now: UtcDateTime) -> AccessTier {
    if !is_premium {
      return AccessTier::Free;
    }
    match renew_date {
      Some(date) if date > now => AccessTier::PremiumActive,
      // A premium flag with no renewal date is a broken invariant: lapse it.
      _ => AccessTier::PremiumExpired,
    }
  }

  /// The stored account still claims premium but the date has elapsed.
  pub fn needs_correction(self) -> bool {
    self == AccessTier::PremiumExpired
  }

  pub fn is_premium(self) -> bool {
    self == AccessTier::PremiumActive
  }
}

/// Premium runs for three calendar months. Day-of-month is preserved,
/// clamped when the target month is shorter: Jan 31st lapses Apr 30th.
pub fn premium_renewal_from(now: UtcDateTime) -> UtcDateTime {
  chronoutil::shift_months(now, 3)
}
