use super::*;

#[get("/")]
pub async fn index(site: &State<Site>, _session: AdminSession) -> JsonResult<Vec<PricingLink>> {
  Ok(Json(PricingLink::all(&site).await?))
}

#[post("/", data = "<form>")]
pub async fn create(
  form: Json<PricingLinkForm>,
  site: &State<Site>,
  _session: AdminSession,
) -> JsonResult<PricingLink> {
  Ok(Json(form.save(&site).await?))
}
