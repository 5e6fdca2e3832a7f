use super::*;

#[post("/", data = "<form>")]
pub async fn create(form: Json<LoginForm>, site: &State<Site>) -> JsonResult<SessionState> {
  let account = form.authenticate(&site).await?;
  // Sign-in is an evaluation point: lapsed subscriptions come off here.
  let (account, tier) = account.refresh_access(&site).await;
  let token = SessionToken::create(&site, account.id, 72).await?;
  Ok(Json(SessionState::new(&token, &account, tier)))
}

#[delete("/")]
pub async fn destroy(session: Session, site: &State<Site>) -> JsonResult<&'static str> {
  session.token.destroy(&site).await?;
  Ok(Json("OK"))
}
