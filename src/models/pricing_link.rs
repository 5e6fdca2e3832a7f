use super::*;

/// Where to send a buyer for a given discount percentage. The "0" row is the
/// full-price link and doubles as the fallback for any percentage that has
/// no link of its own.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PricingLink {
  pub id: i32,
  pub percentage: String,
  pub url: String,
  pub created_at: UtcDateTime,
}

#[derive(Debug, PartialEq, Clone, Deserialize, Validate)]
pub struct PricingLinkForm {
  pub percentage: String,
  #[validate(url)]
  pub url: String,
}

impl PricingLinkForm {
  pub async fn save(&self, site: &Site) -> Result<PricingLink> {
    self.validate()?;
    if self.percentage != "0" && Discount::from_key(&self.percentage).is_none() {
      return Err(Error::validation("percentage", "must be one of 0, 50, 60, 70"));
    }

    let link = sqlx::query_as::<_, PricingLink>(
      "INSERT INTO pricing_links (percentage, url) VALUES ($1, $2)
       ON CONFLICT (percentage) DO UPDATE SET url = EXCLUDED.url
       RETURNING *",
    )
    .bind(&self.percentage)
    .bind(&self.url)
    .fetch_one(&site.db)
    .await?;

    Ok(link)
  }
}

impl PricingLink {
  pub async fn all(site: &Site) -> sqlx::Result<Vec<PricingLink>> {
    sqlx::query_as::<_, PricingLink>("SELECT * FROM pricing_links ORDER BY percentage")
      .fetch_all(&site.db)
      .await
  }

  pub async fn find_by_percentage(site: &Site, percentage: &str) -> sqlx::Result<Option<PricingLink>> {
    sqlx::query_as::<_, PricingLink>("SELECT * FROM pricing_links WHERE percentage = $1")
      .bind(percentage)
      .fetch_optional(&site.db)
      .await
  }

  /// Missing links fall back to full price; a missing fallback means nobody
  /// can be charged a defined amount, so the checkout aborts.
  pub async fn resolve(site: &Site, percentage: &str) -> Result<PricingLink> {
    if let Some(link) = Self::find_by_percentage(site, percentage).await? {
      return Ok(link);
    }

    match Self::find_by_percentage(site, "0").await? {
      Some(fallback) => Ok(fallback),
      None => Err(Error::MisconfiguredPricing),
    }
  }
}
