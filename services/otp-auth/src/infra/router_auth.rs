use std::time::Duration;

use anyhow::Context as _;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::domain::ports::NetworkAuthorizer;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct RouterReply {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// Captive-portal router reached over its CGI auth endpoint.
///
/// `GET {endpoint}?action=auth&mac=<device>[&ip=<caller>]`, success iff HTTP 200 with
/// `{"status": "success"}`.
#[derive(Debug, Clone)]
pub struct HttpNetworkAuthorizer {
    client: Client,
    endpoint: Url,
}

impl HttpNetworkAuthorizer {
    pub fn new(endpoint: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("build router client")?;
        Ok(Self { client, endpoint })
    }

    pub fn grant_url(&self, device_id: &str, caller_address: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("action", "auth");
            query.append_pair("mac", device_id);
            if let Some(ip) = caller_address {
                query.append_pair("ip", ip);
            }
        }
        url
    }
}

impl NetworkAuthorizer for HttpNetworkAuthorizer {
    async fn grant(&self, device_id: &str, caller_address: Option<&str>) -> bool {
        let url = self.grant_url(device_id, caller_address);
        info!(device_id = %device_id, "authorizing device on router");

        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "router auth request failed");
                return false;
            }
        };
        if resp.status() != StatusCode::OK {
            warn!(device_id = %device_id, status = %resp.status(), "router auth http error");
            return false;
        }
        match resp.json::<RouterReply>().await {
            Ok(reply) if reply.status == "success" => {
                info!(device_id = %device_id, "router auth successful");
                true
            }
            Ok(reply) => {
                warn!(
                    device_id = %device_id,
                    message = reply.message.as_deref().unwrap_or(""),
                    "router refused device"
                );
                false
            }
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "router reply unreadable");
                false
            }
        }
    }
}
