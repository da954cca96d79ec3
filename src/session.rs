//! Portal session: anti-forgery token handshake and authenticated fetches.

use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::{header, StatusCode};
use scraper::{Html, Selector};
use thiserror::Error;

/// Hidden form field the portal pairs with its session cookie.
pub const TOKEN_FIELD: &str = "__RequestVerificationToken";

const USER_AGENT: &str = "Mozilla/5.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fatal failures while establishing the session. Without a token no
/// download can succeed, so these abort the whole run.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to fetch landing page: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("landing page has no {TOKEN_FIELD} input field")]
    TokenNotFound,
}

/// Pull the verification token out of the landing page HTML.
pub fn extract_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"input[name="__RequestVerificationToken"]"#).unwrap();
    let input = document.select(&selector).next()?;
    input.value().attr("value").map(|v| v.to_string())
}

/// One download attempt against a candidate URL. `None` means the
/// candidate missed and the next one should be tried; transport errors
/// and non-200 statuses are deliberately not distinguished here.
pub trait FileFetcher {
    fn fetch(&self, url: &str) -> Option<Vec<u8>>;
}

/// Long-lived HTTP session for one run. Holds the cookie jar populated
/// by the landing page and the verification token extracted from it;
/// both are read-only after construction.
pub struct PortalSession {
    client: Client,
    landing_url: String,
    token: String,
}

impl PortalSession {
    /// Fetch the landing page and extract the token. The cookie set by
    /// this response stays in the client's jar and rides along on every
    /// later request.
    pub fn connect(landing_url: &str) -> Result<Self, TokenError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let body = client
            .get(landing_url)
            .send()?
            .error_for_status()?
            .text()?;

        let token = extract_token(&body).ok_or(TokenError::TokenNotFound)?;
        debug!("verification token acquired ({} chars)", token.len());

        Ok(Self {
            client,
            landing_url: landing_url.to_string(),
            token,
        })
    }

}

impl FileFetcher for PortalSession {
    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        // The portal expects the token as form data even on GET, plus a
        // Referer pointing back at the landing page.
        let response = self
            .client
            .get(url)
            .header(header::REFERER, self.landing_url.as_str())
            .form(&[(TOKEN_FIELD, self.token.as_str())])
            .send();

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!("request to {url} failed: {e}");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!("{url} answered {}", response.status());
            return None;
        }

        match response.bytes() {
            Ok(body) => Some(body.to_vec()),
            Err(e) => {
                warn!("failed to read body from {url}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token() {
        let html = r#"
            <html><body>
            <form action="/portalv2/Conteudo/emplacamentos" method="post">
            <input name="__RequestVerificationToken" type="hidden" value="CfDJ8abc123" />
            </form>
            </body></html>
        "#;
        assert_eq!(extract_token(html), Some("CfDJ8abc123".to_string()));
    }

    #[test]
    fn test_extract_token_missing_field() {
        let html = "<html><body><form><input name=\"other\" value=\"x\"/></form></body></html>";
        assert_eq!(extract_token(html), None);
    }

    #[test]
    fn test_extract_token_missing_value_attr() {
        let html = "<html><input name=\"__RequestVerificationToken\" type=\"hidden\"/></html>";
        assert_eq!(extract_token(html), None);
    }

    #[test]
    fn test_extract_token_takes_first_match() {
        let html = r#"
            <input name="__RequestVerificationToken" value="first"/>
            <input name="__RequestVerificationToken" value="second"/>
        "#;
        assert_eq!(extract_token(html), Some("first".to_string()));
    }
}
