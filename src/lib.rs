#[macro_use]
extern crate rocket;

use tera::Tera;
lazy_static::lazy_static! {
  pub static ref TEMPLATES: Tera = {
    let mut tera = Tera::default();
    tera.add_raw_templates([
      ("emails/welcome", include_str!("templates/emails/welcome.html.tera")),
      ("emails/payment_receipt", include_str!("templates/emails/payment_receipt.html.tera"))
    ]).expect("No static");
    tera
  };
}

pub mod models;
pub mod error;
pub mod controllers;
pub use controllers::*;

use models::Site;

pub fn server(site: Site) -> rocket::Rocket<rocket::Build> {
  let cors = rocket_cors::CorsOptions::default()
    .to_cors()
    .expect("Cors options");

  rocket::build()
    .manage(site)
    .attach(cors)
    .mount("/accounts", routes![accounts::create, accounts::state])
    .mount("/sessions", routes![sessions::create, sessions::destroy])
    .mount(
      "/episodes",
      routes![episodes::index, episodes::comments, episodes::create_comment],
    )
    .mount("/checkouts", routes![checkouts::create])
    .mount(
      "/payments",
      routes![payments::callback_post, payments::callback_get],
    )
    .mount(
      "/admin",
      routes![admin::accounts, admin::grant_premium, admin::revoke_premium],
    )
    .mount(
      "/admin/promo_codes",
      routes![promo_codes::index, promo_codes::create, promo_codes::destroy],
    )
    .mount(
      "/admin/pricing_links",
      routes![pricing_links::index, pricing_links::create],
    )
}

#[cfg(test)]
pub mod test_support;
#[cfg(test)]
mod tests;
