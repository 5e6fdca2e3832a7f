use super::*;

#[post("/", data = "<form>")]
pub async fn create(
  form: Json<CheckoutForm>,
  session: Session,
  site: &State<Site>,
) -> JsonResult<CheckoutState> {
  if session.tier.is_premium() {
    return Err(Error::validation("access", "already premium"));
  }

  let checkout = form.save(&site, &session.account).await?;
  Ok(Json(checkout.state()))
}
