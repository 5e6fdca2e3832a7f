use super::*;

// The gateway only ever gets a redirect back: no payload echo, no error
// bodies, just the sanctioned query parameters on our own status page.

#[post("/gateway_callback", data = "<params>")]
pub async fn callback_post(params: Form<CallbackParams>, site: &State<Site>) -> Redirect {
  process_callback(params.into_inner(), site).await
}

// Some gateway configurations send the return trip as a GET instead.
#[get("/gateway_callback?<params..>")]
pub async fn callback_get(params: CallbackParams, site: &State<Site>) -> Redirect {
  process_callback(params, site).await
}

async fn process_callback(params: CallbackParams, site: &State<Site>) -> Redirect {
  let domain = &site.settings.checkout_domain;

  if let Some(key) = &site.settings.gateway.signing_key {
    if !params.signature_valid(key) {
      warn!("Gateway callback with a bad signature, tranRef {:?}", params.tran_ref);
      return Redirect::to(format!("{}/payment?error=true", domain));
    }
  }

  if !params.approved() {
    let message = params
      .resp_message
      .as_deref()
      .unwrap_or("Payment was not successful");
    return Redirect::to(format!(
      "{}/payment?success=false&message={}",
      domain,
      sanitize(message)
    ));
  }

  match Payment::from_gateway_callback(&site, &params).await {
    Ok(_) => Redirect::to(format!(
      "{}/payment?success=true&tranRef={}&cartId={}",
      domain,
      sanitize(params.tran_ref.as_deref().unwrap_or("")),
      sanitize(params.cart_id.as_deref().unwrap_or("")),
    )),
    Err(Error::Validation { .. }) => Redirect::to(format!(
      "{}/payment?success=false&message={}",
      domain,
      sanitize("Payment could not be matched to a purchase")
    )),
    Err(e) => {
      warn!("Gateway callback failed: {}", e);
      Redirect::to(format!("{}/payment?error=true", domain))
    }
  }
}

// Gateway messages are plain ascii; anything else is dropped rather than
// escaped so the redirect URL stays trivially safe.
fn sanitize(value: &str) -> String {
  value
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-' | ':'))
    .map(|c| if c == ' ' { '+' } else { c })
    .collect()
}

#[cfg(test)]
mod test {
  use super::sanitize;

  #[test]
  fn sanitize_keeps_gateway_messages_readable() {
    assert_eq!(sanitize("Payment declined"), "Payment+declined");
    assert_eq!(sanitize("Ref: TST-01.A_b"), "Ref:+TST-01.A_b");
  }

  #[test]
  fn sanitize_drops_url_metacharacters() {
    assert_eq!(sanitize("a&b=c?d#e%f"), "abcdef");
    assert_eq!(sanitize("<script>"), "script");
  }
}
