//! Login and coin exchange.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /user/login`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Client type tag; 200 for this client.
    pub hub_client_type: i64,
}

/// Response to a login.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginResponse {
    /// Durable user token, sent as bearer token on authenticated calls.
    pub user_token: String,
    /// Hub token issued at login. Unused; the live API uses `/hub/auth2`.
    pub hub_token: String,
    /// Hub host issued at login.
    pub hub_host: String,
}

/// Body of `POST /coin/exchange`.
///
/// Only the mining client uses this endpoint, not the website.
#[derive(Clone, Debug, Serialize)]
pub struct ExchangeRequest {
    /// Mining token of the client installation.
    #[serde(rename = "MiningToken")]
    pub mining_token: String,
    /// Balance token of the client installation.
    #[serde(rename = "BalanceToken")]
    pub balance_token: String,
}

/// Response to an exchange request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExchangeResponse {
    /// Balance in US dollars.
    pub user_balance: Decimal,
}
