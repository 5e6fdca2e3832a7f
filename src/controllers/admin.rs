use super::*;

#[derive(Debug, Serialize)]
pub struct AdminStats {
  pub total_users: i64,
  pub premium_users: i64,
  pub free_users: i64,
  pub total_sales: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
  pub stats: AdminStats,
  pub accounts: Vec<AccountState>,
}

#[get("/accounts")]
pub async fn accounts(site: &State<Site>, _session: AdminSession) -> JsonResult<AdminDashboard> {
  let accounts = Account::all(&site).await?;
  let now = Utc::now();

  let total_users = accounts.len() as i64;
  let premium_users = accounts.iter().filter(|a| a.access_tier(now).is_premium()).count() as i64;
  let total_sales = accounts.iter().filter(|a| a.payment_completed).count() as i64;
  let states = accounts
    .iter()
    .map(|a| AccountState::new(a, a.access_tier(now)))
    .collect();

  Ok(Json(AdminDashboard {
    stats: AdminStats {
      total_users,
      premium_users,
      free_users: total_users - premium_users,
      total_sales,
    },
    accounts: states,
  }))
}

#[post("/accounts/<account_id>/grant_premium")]
pub async fn grant_premium(
  site: &State<Site>,
  account_id: i32,
  _session: AdminSession,
) -> JsonResult<AccountState> {
  let account = Account::find_by_id(&site, account_id).await?;
  let account = account.grant_premium(&site, Utc::now()).await?;
  Ok(Json(AccountState::new(&account, account.access_tier(Utc::now()))))
}

#[post("/accounts/<account_id>/revoke_premium")]
pub async fn revoke_premium(
  site: &State<Site>,
  account_id: i32,
  _session: AdminSession,
) -> JsonResult<AccountState> {
  let account = Account::find_by_id(&site, account_id).await?;
  let account = account.revoke_premium(&site).await?;
  Ok(Json(AccountState::new(&account, account.access_tier(Utc::now()))))
}
