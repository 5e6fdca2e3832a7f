use rocket::{
  self,
  form::Form,
  response::Redirect,
  serde::json::Json,
  State,
};
use chrono::Utc;
use serde::Serialize;
use crate::error::*;
use crate::models::*;

pub type JsonResult<T> = Result<Json<T>>;

pub mod accounts;
pub mod sessions;
pub mod episodes;
pub mod checkouts;
pub mod payments;
pub mod promo_codes;
pub mod pricing_links;
pub mod admin;
