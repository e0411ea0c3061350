//! High-level client for the WinMiner REST API.
//!
//! [`ApiClient`] logs in once, keeps the user token, and exposes every
//! REST endpoint plus management of a single live session.

use std::sync::Arc;

use reqwest::Url;
use tokio::sync::Mutex;
use tracing::{debug, info};
use winminer_settings::WinminerSettings;

use crate::errors::{ApiError, LiveError};
use crate::http::{ApiRequest, HttpClient};
use crate::live::LiveSession;
use crate::types::{
    ExchangeRequest, ExchangeResponse, LoginRequest, LoginResponse, MachinesResponse,
    StatsResponse, WithdrawDataResponse, WithdrawHistoryResponse,
};

/// Endpoint paths, relative to the API base URL.
pub mod endpoints {
    /// `POST`, unauthenticated.
    pub const LOGIN: &str = "/user/login";
    /// `GET`.
    pub const STATS: &str = "/user/stats";
    /// `GET`.
    pub const WITHDRAW_HISTORY: &str = "/user/withdraw-history";
    /// `POST`, unauthenticated.
    pub const EXCHANGE: &str = "/coin/exchange";
    /// `GET`.
    pub const WITHDRAW_DATA: &str = "/withdraw/data";
    /// `GET`.
    pub const MACHINES: &str = "/hub/machines";
    /// `POST`, exchanges the user token for a live-auth token.
    pub const HUB_AUTH: &str = "/hub/auth2";
}

/// Client for the REST API and the live API.
pub struct ApiClient {
    http: Arc<HttpClient>,
    base_url: String,
    settings: WinminerSettings,
    live: Mutex<Option<Arc<LiveSession>>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// A client that is not logged in yet.
    pub fn new(settings: WinminerSettings) -> Result<Self, ApiError> {
        let base_url = settings.api.base_url.trim_end_matches('/').to_string();
        let _ = Url::parse(&base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        let http = HttpClient::new(settings.api.request_timeout())?;

        Ok(Self {
            http: Arc::new(http),
            base_url,
            settings,
            live: Mutex::new(None),
        })
    }

    /// Create a client and log in.
    pub async fn login(
        email: &str,
        password: &str,
        settings: WinminerSettings,
    ) -> Result<Self, ApiError> {
        let client = Self::new(settings)?;
        let _ = client.post_login(email, password).await?;
        Ok(client)
    }

    /// Log in and store the user token for subsequent calls.
    pub async fn post_login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = ApiRequest::post(self.url(endpoints::LOGIN)).json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            hub_client_type: self.settings.api.client_type,
        })?;
        let resp: LoginResponse = self.http.call(request).await?;
        self.http.set_user_token(resp.user_token.clone());
        info!("logged in");
        Ok(resp)
    }

    /// Historical statistics and balance.
    pub async fn get_stats(&self) -> Result<StatsResponse, ApiError> {
        self.get(endpoints::STATS).await
    }

    /// Machines and their devices.
    ///
    /// The live fields of this listing are not reliable; in particular every
    /// device reports `enabled == true`. Use the live API for device state.
    pub async fn get_machines(&self) -> Result<MachinesResponse, ApiError> {
        self.get(endpoints::MACHINES).await
    }

    /// Past withdrawals.
    pub async fn get_withdraw_history(&self) -> Result<WithdrawHistoryResponse, ApiError> {
        self.get(endpoints::WITHDRAW_HISTORY).await
    }

    /// Current withdraw options, fees and exchange rates.
    pub async fn get_withdraw_data(&self) -> Result<WithdrawDataResponse, ApiError> {
        self.get(endpoints::WITHDRAW_DATA).await
    }

    /// Balance as seen by the mining client.
    pub async fn get_exchange_balance(
        &self,
        mining_token: &str,
        balance_token: &str,
    ) -> Result<ExchangeResponse, ApiError> {
        let request = ApiRequest::post(self.url(endpoints::EXCHANGE)).json(&ExchangeRequest {
            mining_token: mining_token.to_string(),
            balance_token: balance_token.to_string(),
        })?;
        self.http.call(request).await
    }

    /// Open the live session, or return the one already open.
    ///
    /// A session closed directly through [`LiveSession::close`] is not
    /// reused; a fresh one is opened in its place.
    pub async fn connect_live(&self) -> Result<Arc<LiveSession>, LiveError> {
        let mut live = self.live.lock().await;
        self.connect_live_locked(&mut live).await
    }

    /// Close the live session.
    ///
    /// Fails with [`LiveError::NotConnected`] when no session is open.
    pub async fn close_live(&self) -> Result<(), LiveError> {
        let mut live = self.live.lock().await;
        Self::close_live_locked(&mut live).await
    }

    /// Close the live session if one is open, then open a fresh one.
    ///
    /// This is the recovery path for any live failure, including state drift.
    pub async fn reconnect_live(&self) -> Result<Arc<LiveSession>, LiveError> {
        let mut live = self.live.lock().await;
        match Self::close_live_locked(&mut live).await {
            Ok(()) | Err(LiveError::NotConnected) => {}
            Err(err) => return Err(err),
        }
        self.connect_live_locked(&mut live).await
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }

    /// Settings this client was built with.
    pub fn settings(&self) -> &WinminerSettings {
        &self.settings
    }

    async fn connect_live_locked(
        &self,
        live: &mut Option<Arc<LiveSession>>,
    ) -> Result<Arc<LiveSession>, LiveError> {
        if let Some(session) = live.as_ref() {
            if !session.is_closed() {
                return Ok(session.clone());
            }
            debug!(connection_id = session.connection_id(), "discarding closed live session");
        }
        let session = Arc::new(
            LiveSession::open(
                self.http.clone(),
                &self.url(endpoints::HUB_AUTH),
                self.settings.api.client_type,
                &self.settings.live,
            )
            .await?,
        );
        *live = Some(session.clone());
        Ok(session)
    }

    async fn close_live_locked(live: &mut Option<Arc<LiveSession>>) -> Result<(), LiveError> {
        let session = live.take().ok_or(LiveError::NotConnected)?;
        session.close().await;
        Ok(())
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "fetching");
        self.http
            .call(ApiRequest::get(self.url(path)).authenticated())
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
