use super::*;

#[get("/")]
pub async fn index(session: Session, site: &State<Site>) -> JsonResult<Vec<EpisodeState>> {
  let episodes = Episode::all(&site).await?;
  Ok(Json(
    episodes
      .iter()
      .map(|e| e.state(&site.settings, session.tier))
      .collect(),
  ))
}

#[get("/<episode_id>/comments")]
pub async fn comments(
  site: &State<Site>,
  episode_id: i32,
  _session: Session,
) -> JsonResult<Vec<EpisodeComment>> {
  Ok(Json(EpisodeComment::for_episode(&site, episode_id).await?))
}

#[post("/<episode_id>/comments", data = "<form>")]
pub async fn create_comment(
  site: &State<Site>,
  episode_id: i32,
  form: Json<CommentForm>,
  session: Session,
) -> JsonResult<EpisodeComment> {
  if !session.tier.is_premium() {
    return Err(Error::validation("access", "premium required"));
  }
  Ok(Json(form.save(&site, episode_id, &session.account).await?))
}
