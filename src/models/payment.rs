use super::*;
use hmac::{Hmac, Mac, NewMac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Payment {
  pub id: i32,
  pub account_id: i32,
  pub checkout_id: Option<i32>,
  pub tran_ref: String,
  pub amount: Decimal,
  pub created_at: UtcDateTime,
}

/// What the gateway sends back once the customer has been through the
/// hosted payment page. The endpoint is public, so every field is attacker
/// controllable until the signature (when configured) says otherwise.
#[derive(Debug, Default, PartialEq, Clone, FromForm)]
pub struct CallbackParams {
  #[field(name = "respStatus")]
  pub resp_status: Option<String>,
  #[field(name = "tranRef")]
  pub tran_ref: Option<String>,
  #[field(name = "cartId")]
  pub cart_id: Option<String>,
  #[field(name = "respMessage")]
  pub resp_message: Option<String>,
  pub signature: Option<String>,
}

impl CallbackParams {
  // 'A' is the gateway's approved status. Everything else, including a
  // missing status, is a non-payment.
  pub fn approved(&self) -> bool {
    self.resp_status.as_deref() == Some("A")
  }

  pub fn canonical_payload(&self) -> String {
    format!(
      "cartId={}&respMessage={}&respStatus={}&tranRef={}",
      self.cart_id.as_deref().unwrap_or(""),
      self.resp_message.as_deref().unwrap_or(""),
      self.resp_status.as_deref().unwrap_or(""),
      self.tran_ref.as_deref().unwrap_or(""),
    )
  }

  /// HMAC-SHA256 of the canonical field string, hex encoded.
  pub fn signature_valid(&self, key: &str) -> bool {
    let signature = match self.signature.as_deref().and_then(|s| hex::decode(s).ok()) {
      Some(bytes) => bytes,
      None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(key.as_bytes()) {
      Ok(mac) => mac,
      Err(_) => return false,
    };
    mac.update(self.canonical_payload().as_bytes());

    mac.verify(&signature).is_ok()
  }
}

impl Payment {
  /// Applies an approved gateway callback exactly once. The payment insert
  /// and the premium grant commit together; a replayed tranRef inserts
  /// nothing and leaves renew_date alone.
  pub async fn from_gateway_callback(site: &Site, params: &CallbackParams) -> Result<Option<Payment>> {
    let tran_ref = params
      .tran_ref
      .as_deref()
      .ok_or_else(|| Error::validation("tranRef", "missing"))?;
    let cart_id = params
      .cart_id
      .as_deref()
      .ok_or_else(|| Error::validation("cartId", "missing"))?;

    let checkout = Checkout::find_by_cart_id(site, cart_id)
      .await?
      .ok_or_else(|| Error::validation("cartId", "unknown cart"))?;

    let now = Utc::now();
    let mut tx = site.db.begin().await?;

    let inserted = sqlx::query_as::<_, Payment>(
      "INSERT INTO payments (account_id, checkout_id, tran_ref, amount)
       VALUES ($1, $2, $3, $4)
       ON CONFLICT (tran_ref) DO NOTHING
       RETURNING *",
    )
    .bind(checkout.account_id)
    .bind(checkout.id)
    .bind(tran_ref)
    .bind(checkout.final_price)
    .fetch_optional(&mut tx)
    .await?;

    let payment = match inserted {
      Some(payment) => payment,
      None => {
        tx.commit().await?;
        return Ok(None);
      }
    };

    sqlx::query(
      "UPDATE accounts SET
        is_premium = true,
        renew_date = $2,
        subscription_expired = false,
        expired_date = NULL,
        payment_completed = true,
        payment_date = $3,
        transaction_id = $4,
        cart_id = $5
       WHERE id = $1",
    )
    .bind(checkout.account_id)
    .bind(premium_renewal_from(now))
    .bind(now)
    .bind(tran_ref)
    .bind(cart_id)
    .execute(&mut tx)
    .await?;

    tx.commit().await?;

    if let Ok(account) = Account::find_by_id(site, checkout.account_id).await {
      if let Err(e) = account.send_payment_receipt(site, tran_ref) {
        warn!("Could not send receipt for payment {}: {}", payment.id, e);
      }
    }

    Ok(Some(payment))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn params() -> CallbackParams {
    CallbackParams {
      resp_status: Some("A".to_string()),
      tran_ref: Some("TST2199900000001".to_string()),
      cart_id: Some("42".to_string()),
      resp_message: Some("Authorised".to_string()),
      signature: None,
    }
  }

  fn sign(params: &CallbackParams, key: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).unwrap();
    mac.update(params.canonical_payload().as_bytes());
    hex::encode(mac.finalize().into_bytes())
  }

  #[test]
  fn only_the_approved_status_counts() {
    assert!(params().approved());

    let mut declined = params();
    declined.resp_status = Some("D".to_string());
    assert!(!declined.approved());

    let mut missing = params();
    missing.resp_status = None;
    assert!(!missing.approved());
  }

  #[test]
  fn a_correctly_signed_callback_verifies() {
    let mut signed = params();
    signed.signature = Some(sign(&signed, "topsecret"));
    assert!(signed.signature_valid("topsecret"));
  }

  #[test]
  fn tampering_with_any_field_breaks_the_signature() {
    let mut signed = params();
    signed.signature = Some(sign(&signed, "topsecret"));
    signed.cart_id = Some("43".to_string());
    assert!(!signed.signature_valid("topsecret"));
  }

  #[test]
  fn missing_or_malformed_signatures_never_verify() {
    assert!(!params().signature_valid("topsecret"));

    let mut garbled = params();
    garbled.signature = Some("zz-not-hex".to_string());
    assert!(!garbled.signature_valid("topsecret"));
  }

  #[test]
  fn the_wrong_key_never_verifies() {
    let mut signed = params();
    signed.signature = Some(sign(&signed, "topsecret"));
    assert!(!signed.signature_valid("anotherkey"));
  }
}
