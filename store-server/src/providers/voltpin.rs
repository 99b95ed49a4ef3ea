//! VoltPin adapter
//!
//! Query-string-authenticated API answering with `;`-delimited text.
//! Every request carries `key`, `nonce` and `sign = sha256(key + secret
//! + nonce)`. Responses are single lines (or one line per record):
//!
//! ```text
//! purchase:  <code>;<message>;<ref>;<state>;<price>;<currency>
//! status:    <ref>;<state>;<message>[;PIN=<redemption code>]
//! balance:   <code>;<amount>;<currency>
//! products:  <ref>;<name>;<price>;<currency>;<min>;<max>;<active>
//! ```
//!
//! `code` 非 0 表示调用失败。Anything that does not parse (including an
//! HTML error page) is a [`AdapterError::Malformed`], never a mapped
//! state.

use super::{
    AdapterError, AdapterResult, MappedStatus, OrderCheck, PlaceOrder, PlacedOrder,
    ProviderAdapter, ProviderBalance, ProviderProduct,
};
use async_trait::async_trait;
use rand::Rng;
use sha2::{Digest, Sha256};

pub struct VoltPin {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl VoltPin {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    fn sign(&self, nonce: &str) -> String {
        let digest = Sha256::digest(format!("{}{}{}", self.api_key, self.api_secret, nonce));
        hex::encode(digest)
    }

    async fn get_text(&self, path: &str, extra: &[(&str, String)]) -> AdapterResult<String> {
        let nonce: String = rand::thread_rng().gen_range(100_000_000u64..1_000_000_000u64).to_string();
        let sign = self.sign(&nonce);
        let mut params: Vec<(&str, String)> = vec![
            ("key", self.api_key.clone()),
            ("nonce", nonce),
            ("sign", sign),
        ];
        params.extend(extra.iter().cloned());

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let resp = self.http.get(&url).query(&params).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(AdapterError::Http {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }
        guard_not_html(&body)?;
        Ok(body)
    }
}

#[async_trait]
impl ProviderAdapter for VoltPin {
    async fn get_balance(&self) -> AdapterResult<ProviderBalance> {
        let body = self.get_text("/api/v2/balance", &[]).await?;
        parse_balance(body.trim())
    }

    async fn list_products(&self) -> AdapterResult<Vec<ProviderProduct>> {
        let body = self.get_text("/api/v2/products", &[]).await?;
        body.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(parse_product_line)
            .collect()
    }

    async fn place_order(&self, req: &PlaceOrder) -> AdapterResult<PlacedOrder> {
        let mut extra = vec![
            ("product", req.product_ref.clone()),
            ("qty", req.quantity.to_string()),
            ("ref", req.idempotency_key.clone()),
        ];
        if let Some(player) = &req.player_id {
            extra.push(("player", player.clone()));
        }
        if let Some(field) = &req.extra_field {
            extra.push(("extra", field.clone()));
        }
        let body = self.get_text("/api/v2/purchase", &extra).await?;
        parse_place_response(body.trim())
    }

    async fn check_orders(&self, refs: &[String]) -> AdapterResult<Vec<OrderCheck>> {
        let body = self
            .get_text("/api/v2/status", &[("refs", refs.join(","))])
            .await?;
        body.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(parse_check_line)
            .collect()
    }
}

/// VoltPin state tokens → three-way status. The only place these tokens
/// are known.
fn map_state(token: &str) -> AdapterResult<MappedStatus> {
    match token.to_ascii_uppercase().as_str() {
        "DONE" | "SUCCESS" => Ok(MappedStatus::Success),
        "WAIT" | "PENDING" | "PROCESS" => Ok(MappedStatus::Pending),
        "FAILED" | "REFUND" | "REJECT" => Ok(MappedStatus::Failed),
        other => Err(AdapterError::UnknownStatus(format!("voltpin state '{other}'"))),
    }
}

fn guard_not_html(body: &str) -> AdapterResult<()> {
    if body.trim_start().starts_with('<') {
        return Err(AdapterError::Malformed(
            "HTML response where delimited text was expected".into(),
        ));
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}

fn parse_place_response(line: &str) -> AdapterResult<PlacedOrder> {
    let parts: Vec<&str> = line.split(';').collect();
    if parts.len() < 2 {
        return Err(AdapterError::Malformed(format!(
            "purchase response has {} field(s): '{}'",
            parts.len(),
            truncate(line, 120)
        )));
    }
    if parts[0] != "0" {
        return Err(AdapterError::Provider {
            code: parts[0].to_string(),
            message: parts[1].to_string(),
        });
    }
    if parts.len() < 4 {
        return Err(AdapterError::Malformed(format!(
            "purchase response missing ref/state: '{}'",
            truncate(line, 120)
        )));
    }
    let mapped = map_state(parts[3])?;
    let price = parts.get(4).and_then(|p| p.parse::<f64>().ok());
    let currency = parts.get(5).map(|c| c.to_string()).filter(|c| !c.is_empty());
    Ok(PlacedOrder {
        external_ref: parts[2].to_string(),
        raw_status: parts[3].to_string(),
        mapped,
        message: Some(parts[1].to_string()),
        price,
        currency,
    })
}

fn parse_check_line(line: &str) -> AdapterResult<OrderCheck> {
    let parts: Vec<&str> = line.split(';').collect();
    if parts.len() < 2 {
        return Err(AdapterError::Malformed(format!(
            "status line has {} field(s): '{}'",
            parts.len(),
            truncate(line, 120)
        )));
    }
    let mapped = map_state(parts[1])?;
    let redemption_code = parts
        .iter()
        .skip(2)
        .find_map(|p| p.strip_prefix("PIN="))
        .map(str::to_string);
    Ok(OrderCheck {
        external_ref: parts[0].to_string(),
        raw_status: parts[1].to_string(),
        mapped,
        message: parts.get(2).map(|m| m.to_string()),
        redemption_code,
    })
}

fn parse_balance(line: &str) -> AdapterResult<ProviderBalance> {
    let parts: Vec<&str> = line.split(';').collect();
    if parts.len() < 3 || parts[0] != "0" {
        return Err(AdapterError::Malformed(format!(
            "balance response: '{}'",
            truncate(line, 120)
        )));
    }
    let amount = parts[1]
        .parse::<f64>()
        .map_err(|_| AdapterError::Malformed(format!("balance amount '{}'", parts[1])))?;
    Ok(ProviderBalance {
        amount,
        currency: parts[2].to_string(),
    })
}

fn parse_product_line(line: &str) -> AdapterResult<ProviderProduct> {
    let parts: Vec<&str> = line.split(';').collect();
    if parts.len() < 7 {
        return Err(AdapterError::Malformed(format!(
            "product line has {} field(s): '{}'",
            parts.len(),
            truncate(line, 120)
        )));
    }
    let price = parts[2]
        .parse::<f64>()
        .map_err(|_| AdapterError::Malformed(format!("product price '{}'", parts[2])))?;
    Ok(ProviderProduct {
        product_ref: parts[0].to_string(),
        name: parts[1].to_string(),
        price,
        currency: parts[3].to_string(),
        min_qty: parts[4].parse().unwrap_or(1),
        max_qty: parts[5].parse().unwrap_or(1),
        available: parts[6] == "1",
        required_fields: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place_response_pending() {
        let placed = parse_place_response("0;OK;VP-889123;WAIT;9.85;USD").unwrap();
        assert_eq!(placed.external_ref, "VP-889123");
        assert_eq!(placed.mapped, MappedStatus::Pending);
        assert_eq!(placed.price, Some(9.85));
        assert_eq!(placed.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_parse_place_response_immediate_done() {
        let placed = parse_place_response("0;Delivered;VP-1;DONE;4.20;USD").unwrap();
        assert_eq!(placed.mapped, MappedStatus::Success);
    }

    #[test]
    fn test_parse_place_response_provider_error() {
        let err = parse_place_response("20;Out of stock").unwrap_err();
        match err {
            AdapterError::Provider { code, message } => {
                assert_eq!(code, "20");
                assert_eq!(message, "Out of stock");
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_check_line_with_pin() {
        let check = parse_check_line("VP-889123;DONE;Delivered;PIN=ABCD-1234").unwrap();
        assert_eq!(check.mapped, MappedStatus::Success);
        assert_eq!(check.redemption_code.as_deref(), Some("ABCD-1234"));
    }

    #[test]
    fn test_unknown_state_is_error_not_mapped() {
        let err = parse_check_line("VP-1;BANANA;huh").unwrap_err();
        assert!(matches!(err, AdapterError::UnknownStatus(_)));
    }

    #[test]
    fn test_html_response_is_malformed() {
        let err = guard_not_html("<html><body>504 Gateway Timeout</body></html>").unwrap_err();
        assert!(matches!(err, AdapterError::Malformed(_)));
    }

    #[test]
    fn test_parse_balance() {
        let b = parse_balance("0;1520.75;USD").unwrap();
        assert_eq!(b.amount, 1520.75);
        assert_eq!(b.currency, "USD");
    }

    #[test]
    fn test_parse_product_line() {
        let p = parse_product_line("MLBB-86;Mobile Legends 86dm;1.45;USD;1;10;1").unwrap();
        assert_eq!(p.product_ref, "MLBB-86");
        assert!(p.available);
        assert_eq!(p.max_qty, 10);
    }
}
