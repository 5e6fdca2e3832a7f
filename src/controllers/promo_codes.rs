use super::*;

#[get("/")]
pub async fn index(site: &State<Site>, _session: AdminSession) -> JsonResult<Vec<PromoCode>> {
  Ok(Json(PromoCode::all(&site).await?))
}

#[post("/", data = "<form>")]
pub async fn create(
  form: Json<PromoCodeForm>,
  site: &State<Site>,
  _session: AdminSession,
) -> JsonResult<PromoCode> {
  Ok(Json(form.save(&site).await?))
}

#[delete("/<code_id>")]
pub async fn destroy(
  site: &State<Site>,
  code_id: i32,
  _session: AdminSession,
) -> JsonResult<&'static str> {
  PromoCode::find_by_id(&site, code_id).await?.deactivate(&site).await?;
  Ok(Json("OK"))
}
