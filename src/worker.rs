use g2d_api::{
  error::Result,
  models::{Account, Site, SiteSettings},
};
use chrono::Utc;
use std::time::Duration;

#[tokio::main]
async fn main() {
  let site = SiteSettings::default()
    .into_site()
    .await
    .expect("Could not validate site state");

  loop {
    if let Err(e) = expire_lapsed_subscriptions(&site).await {
      println!("Unexpected error occurred {}", e);
    }
    tokio::time::sleep(Duration::from_secs(3600)).await;
  }
}

// Browsers apply the same correction on sign-in and page loads; this sweep
// catches the accounts nobody has looked at lately.
async fn expire_lapsed_subscriptions(site: &Site) -> Result<()> {
  let lapsed = Account::all_lapsed(site).await?;
  for account in lapsed.into_iter() {
    account.apply_expiry_correction(site, Utc::now()).await?;
  }
  Ok(())
}
