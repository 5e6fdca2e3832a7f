use crate::models::SiteSettings;
use crate::test_support::*;
use rocket::http::{ContentType, Status};

// None of these touch the database: they exercise the decisions the server
// makes before any store read, which is exactly where untrusted callback
// input has to be stopped.

#[test]
fn declined_callback_redirects_with_the_gateway_message_and_changes_nothing() {
  let api = PublicApiClient::new();

  let response = api
    .client
    .post("/payments/gateway_callback")
    .header(ContentType::Form)
    .body("respStatus=D&tranRef=TST2199900000001&cartId=42&respMessage=Payment%20declined")
    .dispatch();

  let location = PublicApiClient::redirect_location(&response);
  assert_that!(&location, rematch("/payment\\?success=false"));
  assert_that!(&location, rematch("message=Payment\\+declined"));
}

#[test]
fn callback_without_a_status_is_not_a_payment() {
  let api = PublicApiClient::new();

  let response = api
    .client
    .post("/payments/gateway_callback")
    .header(ContentType::Form)
    .body("tranRef=TST2199900000001&cartId=42")
    .dispatch();

  let location = PublicApiClient::redirect_location(&response);
  assert_that!(&location, rematch("success=false"));
  assert_that!(&location, rematch("message=Payment\\+was\\+not\\+successful"));
}

#[test]
fn approved_callback_with_an_unknown_cart_is_rejected_politely() {
  let api = PublicApiClient::new();

  // A cartId we never issued. The redirect explains, the gateway payload
  // is never echoed back.
  let response = api
    .client
    .post("/payments/gateway_callback")
    .header(ContentType::Form)
    .body("respStatus=A&tranRef=TST2199900000001&cartId=not-one-of-ours")
    .dispatch();

  let location = PublicApiClient::redirect_location(&response);
  assert_that!(&location, rematch("success=false"));
  assert_that!(&location, rematch("message=Payment\\+could\\+not\\+be\\+matched"));
}

#[test]
fn the_get_variant_applies_the_same_rules() {
  let api = PublicApiClient::new();

  let response = api
    .client
    .get("/payments/gateway_callback?respStatus=D&respMessage=Declined")
    .dispatch();

  let location = PublicApiClient::redirect_location(&response);
  assert_that!(&location, rematch("success=false"));
  assert_that!(&location, rematch("message=Declined"));
}

#[test]
fn an_unsigned_callback_is_dropped_when_a_signing_key_is_configured() {
  let mut settings = SiteSettings::default();
  settings.gateway.signing_key = Some("topsecret".to_string());
  let api = PublicApiClient::with_settings(settings);

  let response = api
    .client
    .post("/payments/gateway_callback")
    .header(ContentType::Form)
    .body("respStatus=A&tranRef=TST2199900000001&cartId=42")
    .dispatch();

  let location = PublicApiClient::redirect_location(&response);
  assert_that!(&location, rematch("error=true"));
  assert!(!location.contains("success=true"));
}

#[test]
fn protected_surfaces_require_a_session() {
  let api = PublicApiClient::new();

  api.assert_unauthorized_get("/episodes");
  api.assert_unauthorized_get("/accounts/state");
  api.assert_unauthorized_get("/admin/accounts");
  api.assert_unauthorized_get("/admin/promo_codes");
  api.assert_unauthorized_get("/admin/pricing_links");
}

#[test]
fn signup_validation_fails_before_anything_is_written() {
  let api = PublicApiClient::new();

  let bad_email = api
    .client
    .post("/accounts")
    .header(ContentType::JSON)
    .body(r#"{"email":"not-an-email","first_name":"Sara","last_name":"Hassan","password":"hunter22"}"#)
    .dispatch();
  assert_eq!(bad_email.status(), Status::UnprocessableEntity);

  let short_password = api
    .client
    .post("/accounts")
    .header(ContentType::JSON)
    .body(r#"{"email":"sara@example.com","first_name":"Sara","last_name":"Hassan","password":"12345"}"#)
    .dispatch();
  assert_eq!(short_password.status(), Status::UnprocessableEntity);
}
