//! HTTP backend for the live game API.
//!
//! Every request carries the account token as a bearer token. Network
//! failures and 5xx responses are retried with a doubling delay; game
//! error codes (4xx and the 4xx-like 49x/598 range) are returned as
//! [`ApiError::Status`] for the caller to interpret.

use std::collections::BTreeMap;

use artifacts_catalog::CatalogSnapshot;
use artifacts_types::{Action, ActionResponse, CharacterSnapshot, RequestId};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::schema::{
    DataEnvelope, ErrorEnvelope, Page, WireActionData, WireCharacter, WireItem, WireMapTile,
    WireMonster, WireQuantity, WireResource,
};

/// Records requested per page on listing endpoints.
const PAGE_SIZE: u32 = 100;

/// Client for the game API.
pub struct HttpBackend {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpBackend {
    /// Create a client with the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Perform one action for `character`.
    pub async fn execute(
        &self,
        character: &str,
        action: &Action,
    ) -> Result<ActionResponse, ApiError> {
        let path = format!("/my/{character}/action/{}", action.name());
        let body = action_body(action);
        let envelope: DataEnvelope<WireActionData> =
            self.request(Method::POST, &path, body.as_ref()).await?;
        envelope.data.into_response()
    }

    /// Current state of one character.
    pub async fn character(&self, name: &str) -> Result<CharacterSnapshot, ApiError> {
        let envelope: DataEnvelope<WireCharacter> = self
            .request(Method::GET, &format!("/characters/{name}"), None)
            .await?;
        Ok(envelope.data.into_snapshot())
    }

    /// Every character on the account.
    pub async fn characters(&self) -> Result<Vec<CharacterSnapshot>, ApiError> {
        let envelope: DataEnvelope<Vec<WireCharacter>> =
            self.request(Method::GET, "/my/characters", None).await?;
        Ok(envelope
            .data
            .into_iter()
            .map(WireCharacter::into_snapshot)
            .collect())
    }

    /// Full bank contents.
    pub async fn bank_items(&self) -> Result<BTreeMap<String, u32>, ApiError> {
        let items: Vec<WireQuantity> = self.get_all("/my/bank/items").await?;
        Ok(items
            .into_iter()
            .filter(|q| q.quantity > 0)
            .map(|q| (q.code, q.quantity))
            .collect())
    }

    /// Download items, monsters, resources and map tiles.
    ///
    /// Records that reference skills or types this client does not know are
    /// skipped with a warning.
    pub async fn fetch_catalog(&self) -> Result<CatalogSnapshot, ApiError> {
        let items: Vec<WireItem> = self.get_all("/items").await?;
        let monsters: Vec<WireMonster> = self.get_all("/monsters").await?;
        let resources: Vec<WireResource> = self.get_all("/resources").await?;
        let maps: Vec<WireMapTile> = self.get_all("/maps").await?;

        let snapshot = CatalogSnapshot {
            items: items
                .into_iter()
                .filter_map(|w| {
                    w.into_item()
                        .inspect_err(|e| warn!(error = %e, "Skipping item"))
                        .ok()
                })
                .collect(),
            monsters: monsters.into_iter().map(WireMonster::into_monster).collect(),
            resources: resources
                .into_iter()
                .filter_map(|w| {
                    w.into_resource()
                        .inspect_err(|e| warn!(error = %e, "Skipping resource"))
                        .ok()
                })
                .collect(),
            maps: maps.into_iter().map(WireMapTile::into_tile).collect(),
        };
        info!(
            items = snapshot.items.len(),
            monsters = snapshot.monsters.len(),
            resources = snapshot.resources.len(),
            tiles = snapshot.maps.len(),
            "Catalog fetched"
        );
        Ok(snapshot)
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    /// Fetch every page of a listing endpoint.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let mut records = Vec::new();
        let mut page: u32 = 1;
        loop {
            let url = format!("{path}?page={page}&size={PAGE_SIZE}");
            let batch: Page<T> = self.request(Method::GET, &url, None).await?;
            let empty = batch.data.is_empty();
            records.extend(batch.data);
            if empty || batch.pages.is_none_or(|pages| page >= pages) {
                return Ok(records);
            }
            page = page.saturating_add(1);
        }
    }

    /// Send a request, retrying transport-level failures.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let request_id = RequestId::new();
        let mut delay = self.config.retry_delay;
        let mut attempt: u32 = 0;
        loop {
            match self.send_once(method.clone(), path, body, request_id).await {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt = attempt.saturating_add(1);
                    warn!(
                        %request_id,
                        path,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis(),
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                other => return other,
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        request_id: RequestId,
    ) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.config.api_url);
        debug!(%request_id, %method, %url, "Sending request");

        let mut builder = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Accept", "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("{url}: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("{url}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{url}: {e}")))
    }
}

/// JSON body of an action request.
fn action_body(action: &Action) -> Option<Value> {
    match action {
        Action::Move { position } => Some(json!({"x": position.x, "y": position.y})),
        Action::Craft(q) | Action::Deposit(q) | Action::Withdraw(q) | Action::Recycle(q) => {
            Some(json!({"code": q.code, "quantity": q.quantity}))
        }
        Action::Equip { slot, code } => Some(json!({"code": code, "slot": slot.as_str()})),
        Action::Unequip { slot } => Some(json!({"slot": slot.as_str()})),
        Action::Gather
        | Action::Fight
        | Action::AcceptTask
        | Action::CompleteTask
        | Action::ExchangeTask
        | Action::CancelTask => None,
    }
}

/// Turn a failed response into a status error, preferring the game code.
fn parse_error(http_status: u16, body: &str) -> ApiError {
    serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| ApiError::status(http_status, body.trim()),
        |envelope| ApiError::status(envelope.error.code, envelope.error.message),
    )
}
