//! Withdraw history and withdraw options.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response to `GET /user/withdraw-history`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawHistoryResponse {
    /// Current balance.
    pub balance: Decimal,
    /// Past withdrawals.
    pub transactions: Vec<TransactionEntry>,
}

/// One withdrawal.
///
/// `transaction_data` is itself a JSON document whose shape depends on the
/// transaction type; decode it with e.g.
/// [`TransactionEntry::parse_litecoin_transaction`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionEntry {
    /// Transaction ID.
    pub transaction_id: String,
    /// Whether the withdrawal went through.
    pub is_completed: bool,
    /// Completion time, RFC 3339.
    pub completed_date: String,
    /// Request time, RFC 3339.
    pub request_date: String,
    /// Withdraw type; selects the shape of `transaction_data`.
    pub transaction_type: i32,
    /// Raw status code.
    pub status: i32,
    /// Embedded JSON document.
    pub transaction_data: String,
    /// Display status.
    pub friendly_status: String,
    /// Display transaction type.
    pub friendly_transaction_type: String,
    /// Never observed populated.
    pub data: String,
    /// Display total amount.
    pub friendly_total_amount: String,
    /// Display net amount.
    pub friendly_net_amount: String,
    /// Display WinMiner fees.
    pub friendly_win_miner_fees: String,
    /// Display provider fees.
    pub friendly_provider_fees: String,
    /// Payout provider.
    pub provider_name: String,
    /// Transaction ID at the provider.
    pub external_transaction_id: String,
    /// Address the withdrawal was requested from.
    pub ip: String,
}

impl TransactionEntry {
    /// Decode `transaction_data` as a litecoin withdrawal.
    pub fn parse_litecoin_transaction(&self) -> Result<LitecoinTransaction, serde_json::Error> {
        serde_json::from_str(&self.transaction_data)
    }
}

/// Payload of a litecoin withdrawal.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LitecoinTransaction {
    /// Destination wallet.
    #[serde(rename = "WalletAddress")]
    pub wallet_address: String,
    /// Withdraw type.
    #[serde(rename = "WithdrawType")]
    pub withdraw_type: i32,
    /// Signed amounts and fees.
    #[serde(rename = "jwt")]
    pub jwt: JwtEntry,
}

/// Signed details of a litecoin withdrawal.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JwtEntry {
    /// Never observed populated.
    pub data: String,
    /// Currency the amounts are given in.
    pub base_currency: String,
    /// Gross amount.
    pub base_amount: Decimal,
    /// Tax withheld.
    pub withholding_tax: Decimal,
    /// WinMiner fee.
    pub winminer_fee: Decimal,
    /// Provider fee.
    pub provider_fee: Decimal,
    /// Amount paid out.
    pub net_amount: Decimal,
    /// Exchange rate applied.
    pub exchange: Decimal,
    /// Payout provider.
    pub provider_name: String,
    /// Display gross amount.
    #[serde(rename = "fAmount")]
    pub friendly_amount: String,
    /// Display WinMiner fee.
    #[serde(rename = "fWinminerFee")]
    pub friendly_winminer_fee: String,
    /// Display provider fee.
    #[serde(rename = "fProviderFee")]
    pub friendly_provider_fee: String,
    /// Display net amount.
    #[serde(rename = "fNetAmount")]
    pub friendly_net_amount: String,
    /// JWT `exp` claim.
    #[serde(rename = "exp")]
    pub expiration_time: f64,
    /// JWT `jti` claim.
    #[serde(rename = "jti")]
    pub jwt_id: String,
    /// JWT `iat` claim.
    #[serde(rename = "iat")]
    pub issued_at: f64,
    /// JWT `iss` claim.
    #[serde(rename = "iss")]
    pub issuer: String,
}

/// Response to `GET /withdraw/data`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WithdrawDataResponse {
    /// Apple gift card options.
    pub apple_gift_cards: Vec<GiftCardEntry>,
    /// Amazon gift card options.
    pub amazon_gift_cards: Vec<GiftCardEntry>,
    /// Fees per withdraw type.
    pub fees: Vec<FeeEntry>,
    /// Current exchange rates.
    pub exchange: ExchangeRates,
    /// Current balance.
    pub balance: Decimal,
}

/// One withdraw option. Most fields only matter for rendering.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WithdrawOption {
    /// Logo URL.
    pub logo: String,
    /// Display description.
    pub description: String,
    /// Additional description.
    pub description_add: String,
    /// Form template URL.
    pub template_url: String,
    /// Display height.
    pub height: i32,
    /// Withdraw type.
    pub type_id: i32,
    /// Route of the withdraw form.
    pub path: String,
    /// Smallest allowed amount.
    pub minimum_to_withdraw: Decimal,
    /// Largest allowed amount.
    pub maximum_to_withdraw: Decimal,
    /// Whether the option skips checkout.
    pub no_checkout: bool,
    /// Confirmation lines.
    pub confirm_message: Vec<String>,
    /// Property substituted into the confirmation.
    pub confirm_message_token_value_property: String,
    /// Whether the option is unavailable.
    pub disabled: bool,
    /// Notice shown with the option.
    pub message: String,
    /// Whether a high-fee payout may be chosen.
    pub allow_high_fee: bool,
}

/// Exchange rates from US dollars to crypto currencies.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeRates {
    /// Bitcoin per US dollar.
    pub btc: Decimal,
    /// Ether per US dollar.
    pub eth: Decimal,
    /// Litecoin per US dollar.
    pub ltc: Decimal,
}

/// Fees applied on withdrawal.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeEntry {
    /// Withdraw type the fees apply to.
    #[serde(rename = "type")]
    pub kind: i32,
    /// Provider fee at low priority.
    pub provider_low_fee: Decimal,
    /// Provider fee at normal priority.
    pub provider_fee: Decimal,
    /// Provider fee at high priority.
    pub provider_high_fee: Decimal,
    /// Whether provider fees are fixed rather than relative.
    pub provider_fixed_fee: bool,
    /// Tax withheld.
    pub withholding_tax: Decimal,
    /// WinMiner fee.
    pub win_miner_fee: Decimal,
}

/// Gift card withdraw option.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GiftCardEntry {
    /// Card ID.
    pub id: i64,
    /// Country code.
    pub country: String,
    /// Face value in local currency.
    pub local_amount: i64,
    /// Price in US dollars.
    pub amount: i64,
    /// Local currency symbol.
    pub symbol: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn litecoin_transaction_from_embedded_json() {
        let entry = TransactionEntry {
            transaction_data: serde_json::json!({
                "WalletAddress": "LTC-address",
                "WithdrawType": 3,
                "jwt": {
                    "baseCurrency": "USD",
                    "baseAmount": 10.5,
                    "netAmount": "9.75",
                    "fAmount": "$10.50",
                    "exp": 1_520_000_000.0,
                    "iss": "winminer"
                }
            })
            .to_string(),
            ..TransactionEntry::default()
        };

        let ltc = entry.parse_litecoin_transaction().unwrap();
        assert_eq!(ltc.wallet_address, "LTC-address");
        assert_eq!(ltc.withdraw_type, 3);
        assert_eq!(ltc.jwt.net_amount, Decimal::from_str("9.75").unwrap());
        assert_eq!(ltc.jwt.friendly_amount, "$10.50");
        assert_eq!(ltc.jwt.issuer, "winminer");
    }

    #[test]
    fn litecoin_transaction_rejects_non_json() {
        let entry = TransactionEntry {
            transaction_data: "gift card #12".to_string(),
            ..TransactionEntry::default()
        };
        assert!(entry.parse_litecoin_transaction().is_err());
    }

    #[test]
    fn withdraw_data_from_wire() {
        let data: WithdrawDataResponse = serde_json::from_value(serde_json::json!({
            "amazonGiftCards": [{"id": 1, "country": "US", "localAmount": 10, "amount": 10, "symbol": "$"}],
            "fees": [{"type": 2, "providerFee": 0.01, "providerFixedFee": true}],
            "exchange": {"btc": 0.0001, "eth": 0.002, "ltc": 0.005},
            "balance": 3
        }))
        .unwrap();

        assert!(data.apple_gift_cards.is_empty());
        assert_eq!(data.amazon_gift_cards[0].country, "US");
        assert_eq!(data.fees[0].kind, 2);
        assert!(data.fees[0].provider_fixed_fee);
        assert_eq!(data.balance, Decimal::from(3));
    }
}
