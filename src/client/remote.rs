use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::CartItem,
    routes::cart::{AddCartItemBody, UpdateCartItemBody},
    utils::error_fmt_chain
};

/// Signed-in buyer: the id owning queued operations and the bearer token
#[derive(Clone)]
pub struct Credentials{
    pub user_id: Uuid,
    pub token: SecretString
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[derive(Error)]
pub enum RemoteError{
    #[error("Cart service could not be reached")]
    Transport(#[from] reqwest::Error),
    #[error("Cart service is unavailable (status {0})")]
    Unavailable(u16),
    /// The server has no cart routes to offer, as opposed to failing to
    /// serve them right now
    #[error("Cart service is not provisioned on this server (status {0})")]
    NotProvisioned(u16),
    #[error("Cart service rejected the session token")]
    Unauthorized,
    #[error("{message}")]
    Rejected{ status: u16, message: String }
}

impl Debug for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &std::error::Error::source(self))
    }
}

impl RemoteError {
    /// Failures worth retrying later, as opposed to requests the server
    /// will keep refusing
    pub fn is_transient(&self) -> bool{
        matches!(self, RemoteError::Transport(_) | RemoteError::Unavailable(_))
    }
}

/// Server-side cart of the signed-in buyer
#[async_trait]
pub trait RemoteCart: Send + Sync{
    async fn fetch(&self, credentials: &Credentials) -> Result<Vec<CartItem>, RemoteError>;
    async fn add(&self, credentials: &Credentials, item: &AddCartItemBody) -> Result<CartItem, RemoteError>;
    /// `None` when the quantity removed the entry
    async fn update(&self, credentials: &Credentials, cart_item_id: Uuid, quantity: i32) -> Result<Option<CartItem>, RemoteError>;
    async fn remove(&self, credentials: &Credentials, cart_item_id: Uuid) -> Result<(), RemoteError>;
    async fn clear(&self, credentials: &Credentials) -> Result<(), RemoteError>;
}

#[async_trait]
impl<T: RemoteCart + ?Sized> RemoteCart for Arc<T> {
    async fn fetch(&self, credentials: &Credentials) -> Result<Vec<CartItem>, RemoteError> {
        (**self).fetch(credentials).await
    }

    async fn add(&self, credentials: &Credentials, item: &AddCartItemBody) -> Result<CartItem, RemoteError> {
        (**self).add(credentials, item).await
    }

    async fn update(&self, credentials: &Credentials, cart_item_id: Uuid, quantity: i32) -> Result<Option<CartItem>, RemoteError> {
        (**self).update(credentials, cart_item_id, quantity).await
    }

    async fn remove(&self, credentials: &Credentials, cart_item_id: Uuid) -> Result<(), RemoteError> {
        (**self).remove(credentials, cart_item_id).await
    }

    async fn clear(&self, credentials: &Credentials) -> Result<(), RemoteError> {
        (**self).clear(credentials).await
    }
}

/// [`RemoteCart`] over the server's `/cart` routes
#[derive(Clone, Debug)]
pub struct HttpCartClient{
    http_client: Client,
    base_url: String
}

impl HttpCartClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error>{
        let http_client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(HttpCartClient{
            http_client,
            base_url: base_url.trim_end_matches('/').to_string()
        })
    }

    fn url(&self, path: &str) -> String{
        format!("{}/cart{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, credentials: &Credentials) -> Result<Response, RemoteError>{
        let response = request
            .bearer_auth(credentials.token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_IMPLEMENTED {
            return Err(RemoteError::NotProvisioned(status.as_u16()));
        }
        if status.is_server_error() {
            return Err(RemoteError::Unavailable(status.as_u16()));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }

        let message = response.json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("error").and_then(|m| m.as_str()).map(str::to_owned));

        match message {
            Some(message) => Err(RemoteError::Rejected{ status: status.as_u16(), message }),
            // Every cart route answers a 404 with an error body; a bare one
            // means the route itself is missing
            None if status == StatusCode::NOT_FOUND => Err(RemoteError::NotProvisioned(status.as_u16())),
            None => Err(RemoteError::Rejected{
                status: status.as_u16(),
                message: format!("Cart request failed with status {}", status)
            })
        }
    }
}

#[async_trait]
impl RemoteCart for HttpCartClient {
    #[tracing::instrument("Fetching remote cart", skip(self, credentials), fields(user_id = %credentials.user_id))]
    async fn fetch(&self, credentials: &Credentials) -> Result<Vec<CartItem>, RemoteError> {
        let response = self.send(self.http_client.get(self.url("")), credentials).await?;
        Ok(response.json().await?)
    }

    #[tracing::instrument("Adding remote cart item", skip(self, credentials), fields(user_id = %credentials.user_id))]
    async fn add(&self, credentials: &Credentials, item: &AddCartItemBody) -> Result<CartItem, RemoteError> {
        let response = self.send(self.http_client.post(self.url("")).json(item), credentials).await?;
        Ok(response.json().await?)
    }

    #[tracing::instrument("Updating remote cart item", skip(self, credentials), fields(user_id = %credentials.user_id))]
    async fn update(&self, credentials: &Credentials, cart_item_id: Uuid, quantity: i32) -> Result<Option<CartItem>, RemoteError> {
        let request = self.http_client
            .put(self.url(&format!("/{}", cart_item_id)))
            .json(&UpdateCartItemBody{ quantity });

        let response = self.send(request, credentials).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    #[tracing::instrument("Removing remote cart item", skip(self, credentials), fields(user_id = %credentials.user_id))]
    async fn remove(&self, credentials: &Credentials, cart_item_id: Uuid) -> Result<(), RemoteError> {
        self.send(self.http_client.delete(self.url(&format!("/{}", cart_item_id))), credentials).await?;
        Ok(())
    }

    #[tracing::instrument("Clearing remote cart", skip(self, credentials), fields(user_id = %credentials.user_id))]
    async fn clear(&self, credentials: &Credentials) -> Result<(), RemoteError> {
        self.send(self.http_client.delete(self.url("")), credentials).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use claim::{assert_err, assert_none, assert_ok};
    use secrecy::SecretString;
    use uuid::Uuid;
    use wiremock::{
        matchers::{any, bearer_token, body_json, method, path},
        Mock, MockServer, ResponseTemplate
    };

    use super::*;

    fn credentials() -> Credentials{
        Credentials{ user_id: Uuid::new_v4(), token: SecretString::from("session-token") }
    }

    fn client(base_url: String) -> HttpCartClient{
        HttpCartClient::new(base_url, Duration::from_secs(2)).unwrap()
    }

    fn cart_item(buyer_id: Uuid, product_id: Uuid, quantity: i32) -> CartItem{
        CartItem{
            id: Uuid::new_v4(),
            buyer_id,
            product_id,
            variant_id: None,
            quantity,
            created_at: Utc::now(),
            updated_at: Utc::now()
        }
    }

    #[actix_web::test]
    async fn add_posts_the_item_with_the_bearer_token(){
        let mock_server = MockServer::start().await;
        let credentials = credentials();
        let body = AddCartItemBody{ product_id: Uuid::new_v4(), variant_id: None, quantity: 2 };

        Mock::given(method("POST"))
            .and(path("/cart"))
            .and(bearer_token("session-token"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_item(credentials.user_id, body.product_id, 2)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let item = assert_ok!(client(mock_server.uri()).add(&credentials, &body).await);
        assert_eq!(item.quantity, 2);
    }

    #[actix_web::test]
    async fn no_content_update_means_the_entry_was_removed(){
        let mock_server = MockServer::start().await;
        let item_id = Uuid::new_v4();

        Mock::given(method("PUT"))
            .and(path(format!("/cart/{}", item_id)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outcome = assert_ok!(client(mock_server.uri()).update(&credentials(), item_id, 0).await);
        assert_none!(outcome);
    }

    #[actix_web::test]
    async fn server_errors_are_transient(){
        let mock_server = MockServer::start().await;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let error = assert_err!(client(mock_server.uri()).fetch(&credentials()).await);
        assert!(error.is_transient());
    }

    #[actix_web::test]
    async fn client_errors_carry_the_server_message(){
        let mock_server = MockServer::start().await;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({ "error": "product not found" })))
            .mount(&mock_server)
            .await;

        let error = assert_err!(client(mock_server.uri()).remove(&credentials(), Uuid::new_v4()).await);
        assert!(!error.is_transient());
        match error {
            RemoteError::Rejected{ status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "product not found");
            },
            other => panic!("unexpected error: {:?}", other)
        }
    }

    #[actix_web::test]
    async fn missing_cart_routes_mean_the_service_is_not_provisioned(){
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(501))
            .mount(&mock_server)
            .await;

        let client = client(mock_server.uri());
        let missing = assert_err!(client.fetch(&credentials()).await);
        assert!(matches!(missing, RemoteError::NotProvisioned(404)));
        assert!(!missing.is_transient());

        let unimplemented = assert_err!(client.clear(&credentials()).await);
        assert!(matches!(unimplemented, RemoteError::NotProvisioned(501)));
    }

    #[actix_web::test]
    async fn slow_server_times_out_as_transient(){
        let mock_server = MockServer::start().await;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
            .mount(&mock_server)
            .await;

        let error = assert_err!(client(mock_server.uri()).clear(&credentials()).await);
        assert!(error.is_transient());
    }
}
