use super::*;
use rust_decimal::RoundingStrategy;

/// The discounts an admin can hand out. Percentages travel as strings in
/// storage and on the wire; they only become numbers for arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Discount {
  Fifty,
  Sixty,
  Seventy,
}

impl Discount {
  pub fn from_key(key: &str) -> Option<Discount> {
    match key {
      "50" => Some(Discount::Fifty),
      "60" => Some(Discount::Sixty),
      "70" => Some(Discount::Seventy),
      _ => None,
    }
  }

  pub fn key(self) -> &'static str {
    match self {
      Discount::Fifty => "50",
      Discount::Sixty => "60",
      Discount::Seventy => "70",
    }
  }

  pub fn percent(self) -> Decimal {
    match self {
      Discount::Fifty => Decimal::new(50, 0),
      Discount::Sixty => Decimal::new(60, 0),
      Discount::Seventy => Decimal::new(70, 0),
    }
  }
}

/// Ephemeral: computed at checkout, never stored on its own. The consumed
/// code and the checkout row are its only traces.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct PricingQuote {
  pub full_price: Decimal,
  pub discount_percentage: String,
  pub final_price: Decimal,
}

impl PricingQuote {
  pub fn full(full_price: Decimal) -> Self {
    Self {
      full_price,
      discount_percentage: "0".to_string(),
      final_price: full_price,
    }
  }

  pub fn discounted(full_price: Decimal, discount: Discount) -> Self {
    let rate = discount.percent() / Decimal::ONE_HUNDRED;
    let final_price = (full_price * (Decimal::ONE - rate))
      .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Self {
      full_price,
      discount_percentage: discount.key().to_string(),
      final_price,
    }
  }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PromoCode {
  pub id: i32,
  pub title: String,
  pub percentage: String,
  pub active: bool,
  pub created_at: UtcDateTime,
}

#[derive(Debug, PartialEq, Clone, Deserialize, Validate)]
pub struct PromoCodeForm {
  #[validate(length(min = 1, max = 64))]
  pub title: String,
  pub percentage: String,
}

impl PromoCodeForm {
  pub async fn save(&self, site: &Site) -> Result<PromoCode> {
    self.validate()?;
    let discount = Discount::from_key(&self.percentage)
      .ok_or_else(|| Error::validation("percentage", "must be one of 50, 60, 70"))?;

    let code = sqlx::query_as::<_, PromoCode>(
      "INSERT INTO promo_codes (title, percentage) VALUES ($1, $2) RETURNING *",
    )
    .bind(&self.title)
    .bind(discount.key())
    .fetch_one(&site.db)
    .await?;

    Ok(code)
  }
}

// A wrong title and an already used code fail identically, so callers can't
// probe which codes exist.
fn invalid_or_used() -> Error {
  Error::validation("promo_code", "invalid or already used")
}

impl PromoCode {
  pub async fn all(site: &Site) -> sqlx::Result<Vec<PromoCode>> {
    sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes ORDER BY created_at DESC")
      .fetch_all(&site.db)
      .await
  }

  pub async fn find_by_id(site: &Site, id: i32) -> sqlx::Result<PromoCode> {
    sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes WHERE id = $1")
      .bind(id)
      .fetch_one(&site.db)
      .await
  }

  /// Exact-match lookup on an active code, pricing the given full price.
  pub async fn validate(site: &Site, title: &str, full_price: Decimal) -> Result<(PromoCode, PricingQuote)> {
    let maybe = sqlx::query_as::<_, PromoCode>(
      "SELECT * FROM promo_codes WHERE title = $1 AND active",
    )
    .bind(title)
    .fetch_optional(&site.db)
    .await?;

    let code = maybe.ok_or_else(invalid_or_used)?;
    let discount = Discount::from_key(&code.percentage).ok_or_else(invalid_or_used)?;
    let quote = PricingQuote::discounted(full_price, discount);

    Ok((code, quote))
  }

  /// Consumes the code. The conditional update is the only double-spend
  /// gate: a second redeemer matches zero rows and is turned away.
  pub async fn redeem(&self, db: impl sqlx::PgExecutor<'_>) -> Result<()> {
    let redeemed = sqlx::query("UPDATE promo_codes SET active = false WHERE id = $1 AND active")
      .bind(self.id)
      .execute(db)
      .await?;

    if redeemed.rows_affected() == 0 {
      return Err(Error::validation("promo_code", "no longer valid"));
    }
    Ok(())
  }

  pub async fn deactivate(&self, site: &Site) -> Result<()> {
    sqlx::query("UPDATE promo_codes SET active = false WHERE id = $1")
      .bind(self.id)
      .execute(&site.db)
      .await?;
    Ok(())
  }
}
