use super::*;

/// A committed purchase attempt: the priced quote, the link the buyer was
/// sent to, and the code that was burned for it. Its id is the cartId the
/// gateway echoes back in the payment callback.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Checkout {
  pub id: i32,
  pub account_id: i32,
  pub promo_code_id: Option<i32>,
  pub full_price: Decimal,
  pub discount_percentage: String,
  pub final_price: Decimal,
  pub checkout_url: String,
  pub created_at: UtcDateTime,
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct CheckoutForm {
  pub promo_code: Option<String>,
}

impl CheckoutForm {
  pub async fn save(&self, site: &Site, account: &Account) -> Result<Checkout> {
    let full_price = site.settings.course_price;

    let (code, quote) = match &self.promo_code {
      Some(title) => {
        let (code, quote) = PromoCode::validate(site, title, full_price).await?;
        (Some(code), quote)
      }
      None => (None, PricingQuote::full(full_price)),
    };

    // Resolve the link before consuming anything: a pricing misconfiguration
    // must not burn the code.
    let link = PricingLink::resolve(site, &quote.discount_percentage).await?;

    let mut tx = site.db.begin().await?;

    if let Some(ref code) = code {
      code.redeem(&mut tx).await?;
    }

    let checkout = sqlx::query_as::<_, Checkout>(
      "INSERT INTO checkouts (
        account_id,
        promo_code_id,
        full_price,
        discount_percentage,
        final_price,
        checkout_url
      ) VALUES ($1, $2, $3, $4, $5, $6)
      RETURNING *",
    )
    .bind(account.id)
    .bind(code.as_ref().map(|c| c.id))
    .bind(quote.full_price)
    .bind(&quote.discount_percentage)
    .bind(quote.final_price)
    .bind(&link.url)
    .fetch_one(&mut tx)
    .await?;

    tx.commit().await?;

    Ok(checkout)
  }
}

#[derive(Debug, Serialize)]
pub struct CheckoutState {
  pub cart_id: String,
  pub checkout_url: String,
  pub full_price: Decimal,
  pub discount_percentage: String,
  pub final_price: Decimal,
}

impl Checkout {
  pub fn cart_id(&self) -> String {
    self.id.to_string()
  }

  pub fn state(&self) -> CheckoutState {
    CheckoutState {
      cart_id: self.cart_id(),
      checkout_url: self.checkout_url.clone(),
      full_price: self.full_price,
      discount_percentage: self.discount_percentage.clone(),
      final_price: self.final_price,
    }
  }

  /// cartId comes straight from the gateway: anything that isn't one of our
  /// checkout ids is simply unknown.
  pub async fn find_by_cart_id(site: &Site, cart_id: &str) -> Result<Option<Checkout>> {
    let id: i32 = match cart_id.parse() {
      Ok(id) => id,
      Err(_) => return Ok(None),
    };

    let maybe = sqlx::query_as::<_, Checkout>("SELECT * FROM checkouts WHERE id = $1")
      .bind(id)
      .fetch_optional(&site.db)
      .await?;

    Ok(maybe)
  }
}
