use super::*;

pub struct Session {
  pub token: SessionToken,
  pub account: Account,
  pub tier: AccessTier,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session {
  type Error = ();

  async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
    async fn build(req: &Request<'_>) -> Option<Session> {
      let site = req.rocket().state::<Site>()?;
      let token_str = req.query_value::<&str>("token").and_then(|r| r.ok())?;
      SessionToken::consume(site, token_str).await.ok()
    }

    match build(req).await {
      Some(session) => Outcome::Success(session),
      None => Outcome::Error((Status::Unauthorized, ())),
    }
  }
}

pub struct AdminSession(pub Session);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
  type Error = ();

  async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
    match Session::from_request(req).await {
      Outcome::Success(session) => {
        let is_admin = req
          .rocket()
          .state::<Site>()
          .map(|site| site.settings.is_admin(&session.account.email))
          .unwrap_or(false);

        if is_admin {
          Outcome::Success(AdminSession(session))
        } else {
          Outcome::Error((Status::Unauthorized, ()))
        }
      }
      _ => Outcome::Error((Status::Unauthorized, ())),
    }
  }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionToken {
  pub id: i32,
  pub account_id: i32,
  pub value: String,
  pub expires_on: UtcDateTime,
}

impl SessionToken {
  pub async fn create(site: &Site, account_id: i32, hours: i64) -> sqlx::Result<Self> {
    sqlx::query_as::<_, SessionToken>(
      "INSERT INTO session_tokens (account_id, value, expires_on) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(account_id)
    .bind(gen_passphrase())
    .bind(Utc::now() + Duration::hours(hours))
    .fetch_one(&site.db)
    .await
  }

  /// Token lookup doubles as the per-request subscription evaluation point:
  /// whatever page the user lands on, the expiry check has already run by
  /// the time a handler sees the session.
  pub async fn consume(site: &Site, value: &str) -> Result<Session> {
    let token = sqlx::query_as::<_, SessionToken>(
      "SELECT * FROM session_tokens WHERE value = $1 AND expires_on > now()",
    )
    .bind(value)
    .fetch_one(&site.db)
    .await?;

    let account = Account::find_by_id(site, token.account_id).await?;
    let (account, tier) = account.refresh_access(site).await;

    Ok(Session { token, account, tier })
  }

  pub async fn destroy(&self, site: &Site) -> Result<()> {
    sqlx::query("DELETE FROM session_tokens WHERE id = $1")
      .bind(self.id)
      .execute(&site.db)
      .await?;
    Ok(())
  }
}

/// Login and signup hand this back: the fresh token plus the account as the
/// client is allowed to see it.
#[derive(Debug, Serialize)]
pub struct SessionState {
  pub token: String,
  pub account: AccountState,
}

impl SessionState {
  pub fn new(token: &SessionToken, account: &Account, tier: AccessTier) -> Self {
    Self {
      token: token.value.clone(),
      account: AccountState::new(account, tier),
    }
  }
}
