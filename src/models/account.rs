use super::*;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};

#[derive(Debug, PartialEq, Clone, Deserialize, Serialize, Validate)]
pub struct SignupForm {
  #[validate(email)]
  pub email: String,
  #[validate(length(min = 1))]
  pub first_name: String,
  #[validate(length(min = 1))]
  pub last_name: String,
  #[validate(length(min = 6))]
  pub password: String,
  pub birthday: Option<NaiveDate>,
  pub graduation_year: Option<String>,
}

impl SignupForm {
  pub async fn save(&self, site: &Site) -> Result<Account> {
    self.validate()?;

    let account = sqlx::query_as::<_, Account>(
      "INSERT INTO accounts (email, password_hash, first_name, last_name, birthday, graduation_year)
       VALUES ($1, $2, $3, $4, $5, $6)
       RETURNING *",
    )
    .bind(self.email.to_lowercase())
    .bind(hash_password(&self.password)?)
    .bind(&self.first_name)
    .bind(&self.last_name)
    .bind(self.birthday)
    .bind(&self.graduation_year)
    .fetch_one(&site.db)
    .await?;

    if let Err(e) = account.send_welcome_email(site) {
      warn!("Could not send welcome email to account {}: {}", account.id, e);
    }

    Ok(account)
  }
}

#[derive(Debug, PartialEq, Clone, Deserialize, Validate)]
pub struct LoginForm {
  #[validate(email)]
  pub email: String,
  pub password: String,
}

impl LoginForm {
  pub async fn authenticate(&self, site: &Site) -> Result<Account> {
    let maybe = Account::find_optional(
      site,
      &AccountQuery {
        email: Some(self.email.to_lowercase()),
        ..Default::default()
      },
    )
    .await?;

    let account = maybe.ok_or_else(bad_credentials)?;
    account.verify_password(&self.password)?;
    Ok(account)
  }
}

// Wrong email and wrong password fail identically.
fn bad_credentials() -> Error {
  Error::validation("credentials", "invalid email or password")
}

pub fn hash_password(plain: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(plain.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|_| Error::validation("password", "could not be processed"))
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
  pub id: i32,
  pub email: String,
  pub password_hash: String,
  pub first_name: String,
  pub last_name: String,
  pub birthday: Option<NaiveDate>,
  pub graduation_year: Option<String>,
  pub is_premium: bool,
  pub renew_date: Option<UtcDateTime>,
  pub subscription_expired: bool,
  pub expired_date: Option<UtcDateTime>,
  pub payment_completed: bool,
  pub payment_date: Option<UtcDateTime>,
  pub transaction_id: Option<String>,
  pub cart_id: Option<String>,
  pub created_at: UtcDateTime,
}

#[derive(Default, Clone)]
pub struct AccountQuery {
  pub id: Option<i32>,
  pub email: Option<String>,
}

impl Account {
  pub async fn find(site: &Site, q: &AccountQuery) -> sqlx::Result<Account> {
    Account::query(q).fetch_one(&site.db).await
  }

  pub async fn find_optional(site: &Site, q: &AccountQuery) -> sqlx::Result<Option<Account>> {
    Account::query(q).fetch_optional(&site.db).await
  }

  pub async fn find_by_id(site: &Site, id: i32) -> sqlx::Result<Account> {
    Account::find(site, &AccountQuery { id: Some(id), ..Default::default() }).await
  }

  fn query<'a>(
    q: &AccountQuery,
  ) -> sqlx::query::QueryAs<'a, sqlx::Postgres, Account, sqlx::postgres::PgArguments> {
    sqlx::query_as::<_, Account>(
      "SELECT * FROM accounts
        WHERE
          ($1::int4 IS NULL OR id = $1::int4)
          AND
          ($2::varchar IS NULL OR email = $2::varchar)
        ",
    )
    .bind(q.id)
    .bind(q.email.clone())
  }

  pub async fn all(site: &Site) -> sqlx::Result<Vec<Account>> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY created_at DESC")
      .fetch_all(&site.db)
      .await
  }

  /// Accounts whose stored premium flag no longer matches the clock.
  pub async fn all_lapsed(site: &Site) -> sqlx::Result<Vec<Account>> {
    sqlx::query_as::<_, Account>(
      "SELECT * FROM accounts WHERE is_premium AND (renew_date IS NULL OR renew_date <= now())",
    )
    .fetch_all(&site.db)
    .await
  }

  pub fn verify_password(&self, plain: &str) -> Result<()> {
    let parsed = PasswordHash::new(&self.password_hash).map_err(|_| bad_credentials())?;
    Argon2::default()
      .verify_password(plain.as_bytes(), &parsed)
      .map_err(|_| bad_credentials())
  }

  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }

  pub fn access_tier(&self, now: UtcDateTime) -> AccessTier {
    AccessTier::evaluate(self.is_premium, self.renew_date, now)
  }

  /// Writes the expiry correction for an account whose renewal has elapsed:
  /// premium comes off, the expiry is flagged and stamped. Running it again
  /// on an already corrected account leaves the same state behind.
  pub async fn apply_expiry_correction(&self, site: &Site, now: UtcDateTime) -> Result<()> {
    sqlx::query(
      "UPDATE accounts SET is_premium = false, subscription_expired = true, expired_date = $2
       WHERE id = $1",
    )
    .bind(self.id)
    .bind(now)
    .execute(&site.db)
    .await?;
    Ok(())
  }

  /// The per-request evaluation point: derives the tier and, when the stored
  /// state is stale, corrects it. The correction is best effort: a failed
  /// write is logged and the request goes on with the corrected snapshot,
  /// since the next evaluation will try again.
  pub async fn refresh_access(mut self, site: &Site) -> (Account, AccessTier) {
    let now = Utc::now();
    let tier = self.access_tier(now);

    if tier.needs_correction() {
      if let Err(e) = self.apply_expiry_correction(site, now).await {
        warn!("Could not persist expiry of account {}: {}", self.id, e);
      }
      self.is_premium = false;
      self.subscription_expired = true;
      self.expired_date = Some(now);
    }

    (self, tier)
  }

  /// Administrative grant: three months from now, whatever was there before.
  pub async fn grant_premium(self, site: &Site, now: UtcDateTime) -> Result<Account> {
    let account = sqlx::query_as::<_, Account>(
      "UPDATE accounts SET is_premium = true, renew_date = $2, subscription_expired = false
       WHERE id = $1 RETURNING *",
    )
    .bind(self.id)
    .bind(premium_renewal_from(now))
    .fetch_one(&site.db)
    .await?;
    Ok(account)
  }

  /// Administrative revocation. The stale renew_date stays behind unless the
  /// site opted into clearing it.
  pub async fn revoke_premium(self, site: &Site) -> Result<Account> {
    let sql = if site.settings.revoke_clears_renew_date {
      "UPDATE accounts SET is_premium = false, renew_date = NULL WHERE id = $1 RETURNING *"
    } else {
      "UPDATE accounts SET is_premium = false WHERE id = $1 RETURNING *"
    };
    let account = sqlx::query_as::<_, Account>(sql)
      .bind(self.id)
      .fetch_one(&site.db)
      .await?;
    Ok(account)
  }

  pub fn send_welcome_email(&self, site: &Site) -> Result<()> {
    let mut context = tera::Context::new();
    context.insert("first_name", &self.first_name);
    self.send_email(site, "Welcome to Grad To Dentist", "emails/welcome", &context)
  }

  pub fn send_payment_receipt(&self, site: &Site, tran_ref: &str) -> Result<()> {
    let mut context = tera::Context::new();
    context.insert("first_name", &self.first_name);
    context.insert("tran_ref", tran_ref);
    context.insert("renew_date", &self.renew_date.map(|d| d.format("%Y-%m-%d").to_string()));
    self.send_email(site, "Your premium access is active", "emails/payment_receipt", &context)
  }

  fn send_email(&self, site: &Site, subject: &str, template: &str, context: &tera::Context) -> Result<()> {
    let html = crate::TEMPLATES.render(template, context)?;

    ureq::post(&format!("{}/v3/smtp/email", site.settings.sendinblue.api_url))
      .set("api-key", &site.settings.sendinblue.api_key)
      .send_json(serde_json::json!({
        "sender": {
          "name": "Grad To Dentist",
          "email": "no-reply@gradtodentist.com",
        },
        "to": [{
          "email": &self.email,
          "name": self.full_name(),
        }],
        "subject": subject,
        "htmlContent": html
      }))?;

    Ok(())
  }
}

/// What the client gets to see about an account. Never the password hash.
#[derive(Debug, Serialize)]
pub struct AccountState {
  pub id: i32,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub graduation_year: Option<String>,
  pub access_tier: AccessTier,
  pub is_premium: bool,
  pub renew_date: Option<UtcDateTime>,
  pub subscription_expired: bool,
  pub payment_completed: bool,
  pub transaction_id: Option<String>,
  pub joined_at: UtcDateTime,
}

impl AccountState {
  pub fn new(account: &Account, tier: AccessTier) -> Self {
    Self {
      id: account.id,
      email: account.email.clone(),
      first_name: account.first_name.clone(),
      last_name: account.last_name.clone(),
      graduation_year: account.graduation_year.clone(),
      access_tier: tier,
      is_premium: tier.is_premium(),
      renew_date: account.renew_date,
      subscription_expired: account.subscription_expired,
      payment_completed: account.payment_completed,
      transaction_id: account.transaction_id.clone(),
      joined_at: account.created_at,
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn form() -> SignupForm {
    SignupForm {
      email: "new.dentist@example.com".to_string(),
      first_name: "Sara".to_string(),
      last_name: "Hassan".to_string(),
      password: "hunter22".to_string(),
      birthday: None,
      graduation_year: Some("2024".to_string()),
    }
  }

  #[test]
  fn signup_form_rejects_bad_email_and_short_password() {
    assert!(form().validate().is_ok());

    let mut bad_email = form();
    bad_email.email = "not-an-email".to_string();
    assert!(bad_email.validate().is_err());

    let mut short_password = form();
    short_password.password = "12345".to_string();
    assert!(short_password.validate().is_err());
  }

  #[test]
  fn password_hashes_verify_and_reject() {
    let hash = hash_password("hunter22").unwrap();
    assert!(hash.starts_with("$argon2"));

    let account = account_with_hash(hash);
    assert!(account.verify_password("hunter22").is_ok());
    assert!(account.verify_password("wrong").is_err());
  }

  #[test]
  fn garbage_hashes_never_verify() {
    let account = account_with_hash("not-a-phc-string".to_string());
    assert!(account.verify_password("hunter22").is_err());
  }

  #[test]
  fn welcome_email_goes_through_the_transactional_api() {
    let mock = mockito::mock("POST", "/v3/smtp/email")
      .match_header("api-key", "xkeysib-test")
      .with_body("{}")
      .create();

    let mut settings = SiteSettings::default();
    settings.sendinblue.api_url = mockito::server_url();
    settings.sendinblue.api_key = "xkeysib-test".to_string();
    let site = crate::test_support::test_site(settings);

    let account = account_with_hash("irrelevant".to_string());
    account.send_welcome_email(&site).unwrap();

    mock.assert();
  }

  fn account_with_hash(password_hash: String) -> Account {
    Account {
      id: 1,
      email: "new.dentist@example.com".to_string(),
      password_hash,
      first_name: "Sara".to_string(),
      last_name: "Hassan".to_string(),
      birthday: None,
      graduation_year: None,
      is_premium: false,
      renew_date: None,
      subscription_expired: false,
      expired_date: None,
      payment_completed: false,
      payment_date: None,
      transaction_id: None,
      cart_id: None,
      created_at: Utc::now(),
    }
  }
}
