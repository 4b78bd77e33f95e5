use super::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// PostgREST gateways usually want the key twice (`apikey` plus a bearer
/// `Authorization`), which is done by nesting two wrappers; see
/// [`ApiKey::gateway`].
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    /// Wraps `inner`, sending `value` under `header_name` on every request.
    pub fn new(inner: C, header_name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut value =
            HeaderValue::from_str(value).context("API key is not a valid header value")?;
        value.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// `Authorization: Bearer <key>`.
    pub fn bearer(inner: C, key: &str) -> Result<Self> {
        Self::new(inner, "Authorization", &format!("Bearer {key}"))
    }
}

impl<C: HttpClient> ApiKey<ApiKey<C>> {
    /// Both the `apikey` header and the bearer token, as a Supabase-style
    /// gateway expects.
    pub fn gateway(inner: C, key: &str) -> Result<Self> {
        ApiKey::new(ApiKey::bearer(inner, key)?, "apikey", key)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}
