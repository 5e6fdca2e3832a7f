use rocket::{
  http::Status,
  local::blocking::{Client, LocalResponse},
};

pub use galvanic_assert::{
  self,
  matchers::{collection::*, *},
  *,
};

use crate::models::{Site, SiteSettings};

// The pool is lazy, so a Site built this way never opens a connection
// unless a test actually queries something.
pub fn test_site(settings: SiteSettings) -> Site {
  tokio::runtime::Runtime::new()
    .expect("could not build runtime")
    .block_on(settings.into_site())
    .expect("could not build site")
}

pub struct PublicApiClient {
  pub client: Client,
}

impl PublicApiClient {
  pub fn new() -> Self {
    Self::with_settings(SiteSettings::default())
  }

  pub fn with_settings(settings: SiteSettings) -> Self {
    let server = crate::server(test_site(settings));
    Self {
      client: Client::tracked(server).expect("valid `Rocket`"),
    }
  }

  pub fn assert_unauthorized_get(&self, path: &str) {
    let response = self.client.get(path).dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
  }

  pub fn redirect_location(response: &LocalResponse) -> String {
    assert_eq!(response.status(), Status::SeeOther);
    response
      .headers()
      .get_one("Location")
      .expect("redirect without a Location header")
      .to_string()
  }
}

pub fn rematch<'a>(expr: &'a str) -> Box<dyn Matcher<'a, String> + 'a> {
  Box::new(move |actual: &String| {
    let re = regex::Regex::new(expr).unwrap();
    let builder = MatchResultBuilder::for_("rematch");
    if re.is_match(actual) {
      builder.matched()
    } else {
      builder.failed_because(&format!("{:?} does not match {:?}", expr, actual))
    }
  })
}
