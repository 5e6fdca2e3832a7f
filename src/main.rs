use g2d_api::models::SiteSettings;

#[rocket::launch]
async fn rocket() -> _ {
  let settings = rocket::build()
    .figment()
    .extract::<SiteSettings>()
    .expect("Config could not be parsed");

  let site = settings
    .into_site()
    .await
    .expect("Could not validate site state");

  g2d_api::server(site)
}
