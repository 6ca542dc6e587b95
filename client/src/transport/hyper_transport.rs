use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::COOKIE;
use http::{HeaderValue, Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use super::{CookieJar, HttpRequest, HttpResponse, Transport, TransportError};

/// [`Transport`] over a pooled `hyper` HTTP/1 client.
///
/// The timeout covers the whole exchange: connect, headers and body.
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
    jar: CookieJar,
}

impl HyperTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout,
            jar: CookieJar::new(),
        }
    }

    pub fn cookie_jar(&self) -> &CookieJar {
        &self.jar
    }

    fn build(&self, request: HttpRequest) -> Result<Request<Full<Bytes>>, TransportError> {
        let uri: Uri = request
            .url
            .parse()
            .map_err(|e: http::uri::InvalidUri| TransportError::InvalidRequest(e.to_string()))?;

        let mut builder = Request::builder().method(request.method).uri(uri);

        if let Some(headers) = builder.headers_mut() {
            headers.extend(request.headers);

            if request.include_credentials {
                if let Some(cookies) = self.jar.header_value() {
                    let value = HeaderValue::from_str(&cookies)
                        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                    headers.insert(COOKIE, value);
                }
            }
        }

        builder
            .body(Full::new(request.body.unwrap_or_default()))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let include_credentials = request.include_credentials;
        let label = format!("{} {}", request.method, request.url);
        let req = self.build(request)?;

        let exchange = async {
            let response = self
                .client
                .request(req)
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;

            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?
                .to_bytes();

            Ok::<_, TransportError>(HttpResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        };

        let response = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("{} timed out after {:?}", label, self.timeout);
                return Err(TransportError::Timeout(self.timeout));
            }
        };

        if include_credentials {
            self.jar.store_from(&response.headers);
        }

        debug!("{} -> {}", label, response.status);
        Ok(response)
    }
}
