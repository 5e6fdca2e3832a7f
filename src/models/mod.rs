use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::error::{Result, Error};
pub use rocket::{
  http::Status,
  request::{FromRequest, Outcome, Request},
  warn,
};

pub mod site;
pub use site::*;
pub mod access;
pub use access::*;
pub mod account;
pub use account::*;
pub mod session;
pub use session::*;
pub mod promo_code;
pub use promo_code::*;
pub mod pricing_link;
pub use pricing_link::*;
pub mod checkout;
pub use checkout::*;
pub mod payment;
pub use payment::*;
pub mod episode;
pub use episode::*;

pub type UtcDateTime = DateTime<Utc>;

pub fn gen_passphrase() -> String {
  use chbs::{config::BasicConfig, prelude::*};
  let mut config = BasicConfig::default();
  config.separator = "+".into();
  config.capitalize_first = false.into();
  config.to_scheme().generate()
}
