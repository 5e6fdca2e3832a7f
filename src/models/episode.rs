use super::*;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Episode {
  pub id: i32,
  pub position: i32,
  pub title: String,
  pub description: String,
  pub duration_seconds: i32,
  pub video_url: String,
  pub created_at: UtcDateTime,
}

/// Listing entry. Free accounts get the metadata only; premium accounts
/// also get a playable URL.
#[derive(Debug, Serialize)]
pub struct EpisodeState {
  pub id: i32,
  pub position: i32,
  pub title: String,
  pub description: String,
  pub duration_seconds: i32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub video_url: Option<String>,
}

impl Episode {
  pub async fn all(site: &Site) -> sqlx::Result<Vec<Episode>> {
    sqlx::query_as::<_, Episode>("SELECT * FROM episodes ORDER BY position")
      .fetch_all(&site.db)
      .await
  }

  pub async fn find_by_id(site: &Site, id: i32) -> sqlx::Result<Episode> {
    sqlx::query_as::<_, Episode>("SELECT * FROM episodes WHERE id = $1")
      .bind(id)
      .fetch_one(&site.db)
      .await
  }

  /// Episodes uploaded to the media store are referenced by path; those get
  /// served through the media host. Full URLs are already playable.
  pub fn playable_url(&self, settings: &SiteSettings) -> String {
    if self.video_url.starts_with("http://") || self.video_url.starts_with("https://") {
      return self.video_url.clone();
    }

    let path = self.video_url.trim_start_matches("gs://").trim_start_matches('/');
    format!("{}/{}", settings.media_base_url.trim_end_matches('/'), path)
  }

  pub fn state(&self, settings: &SiteSettings, tier: AccessTier) -> EpisodeState {
    EpisodeState {
      id: self.id,
      position: self.position,
      title: self.title.clone(),
      description: self.description.clone(),
      duration_seconds: self.duration_seconds,
      video_url: if tier.is_premium() {
        Some(self.playable_url(settings))
      } else {
        None
      },
    }
  }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct EpisodeComment {
  pub id: i32,
  pub episode_id: i32,
  pub account_id: i32,
  pub author_name: String,
  pub body: String,
  pub created_at: UtcDateTime,
}

#[derive(Debug, PartialEq, Clone, Deserialize, Validate)]
pub struct CommentForm {
  #[validate(length(min = 1, max = 2000))]
  pub body: String,
}

impl CommentForm {
  pub async fn save(&self, site: &Site, episode_id: i32, account: &Account) -> Result<EpisodeComment> {
    self.validate()?;
    let body = self.body.trim();
    if body.is_empty() {
      return Err(Error::validation("body", "cannot be empty"));
    }

    // 404 for comments on episodes that don't exist.
    let episode = Episode::find_by_id(site, episode_id).await?;

    let comment = sqlx::query_as::<_, EpisodeComment>(
      "INSERT INTO episode_comments (episode_id, account_id, author_name, body)
       VALUES ($1, $2, $3, $4)
       RETURNING *",
    )
    .bind(episode.id)
    .bind(account.id)
    .bind(account.full_name())
    .bind(body)
    .fetch_one(&site.db)
    .await?;

    Ok(comment)
  }
}

impl EpisodeComment {
  pub async fn for_episode(site: &Site, episode_id: i32) -> sqlx::Result<Vec<EpisodeComment>> {
    sqlx::query_as::<_, EpisodeComment>(
      "SELECT * FROM episode_comments WHERE episode_id = $1 ORDER BY created_at DESC",
    )
    .bind(episode_id)
    .fetch_all(&site.db)
    .await
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn episode(video_url: &str) -> Episode {
    Episode {
      id: 1,
      position: 1,
      title: "Rotary RCT".to_string(),
      description: "Root canal therapy with rotary instruments".to_string(),
      duration_seconds: 1260,
      video_url: video_url.to_string(),
      created_at: Utc::now(),
    }
  }

  fn settings() -> SiteSettings {
    SiteSettings::default()
  }

  #[test]
  fn absolute_urls_are_served_untouched() {
    let url = "https://cdn.example.com/videos/rct.mp4";
    assert_eq!(episode(url).playable_url(&settings()), url);
  }

  #[test]
  fn storage_paths_go_through_the_media_host() {
    assert_eq!(
      episode("gs://g2d-media/course1/rct.mp4").playable_url(&settings()),
      "https://media.gradtodentist.com/g2d-media/course1/rct.mp4"
    );
    assert_eq!(
      episode("course1/rct.mp4").playable_url(&settings()),
      "https://media.gradtodentist.com/course1/rct.mp4"
    );
  }

  #[test]
  fn only_premium_listings_carry_the_video_url() {
    let episode = episode("course1/rct.mp4");

    let premium = episode.state(&settings(), AccessTier::PremiumActive);
    assert!(premium.video_url.is_some());

    let free = episode.state(&settings(), AccessTier::Free);
    assert!(free.video_url.is_none());

    let expired = episode.state(&settings(), AccessTier::PremiumExpired);
    assert!(expired.video_url.is_none());
  }
}
