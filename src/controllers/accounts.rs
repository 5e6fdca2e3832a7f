use super::*;

#[post("/", data = "<form>")]
pub async fn create(form: Json<SignupForm>, site: &State<Site>) -> JsonResult<SessionState> {
  let account = form.save(&site).await?;
  let token = SessionToken::create(&site, account.id, 72).await?;
  let tier = account.access_tier(Utc::now());
  Ok(Json(SessionState::new(&token, &account, tier)))
}

#[get("/state")]
pub async fn state(session: Session) -> JsonResult<AccountState> {
  Ok(Json(AccountState::new(&session.account, session.tier)))
}
