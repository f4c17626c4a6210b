//! Payment link codec.
//!
//! A link is either *simple* (everything encoded in the path) or *tracked*
//! (`/pay?id=<requestId>`, details held by the external service).
//!
//! Simple path shapes:
//!
//! ```text
//! /pay/<recipient>                               open-ended
//! /pay/<recipient>/<amount><token>               e.g. /pay/alice.eth/10usdc
//! /pay/<recipient>/<chain>/<amount>/<token>      advanced mode
//! ```
//!
//! A chain other than [`DEFAULT_CHAIN`] is always written, as
//! `/pay/<recipient>/<chain>` or `/pay/<recipient>/<chain>/<amount><token>`,
//! so a link pays on the same network wherever it is opened.
//!
//! The decoder also accepts `/pay/<recipient>/<chain>`,
//! `/pay/<recipient>/<chain>/<amount><token>`, `/pay/<recipient>/<amount>/<token>`
//! and the query form `/pay?recipient=..&amount=..&chain=..&token=..`.

use crate::amount::Amount;
use crate::config::{AppConfig, LinkMode};
use crate::constants::{Chain, Token, DEFAULT_CHAIN, PEANUT_REQUEST_LINK};
use crate::error::{LinkError, ServiceError};
use crate::payment::PaymentRequest;
use crate::service::{CreateRequest, PaymentService};
use crate::transfer::TokenType;
use crate::validation::is_valid_address_or_ens;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Path prefix every payment link lives under.
pub const PAY_PATH: &str = "/pay";

/// Opaque identifier of a request tracked by the external service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(String);

impl RequestId {
    pub fn new(raw: &str) -> Result<Self, LinkError> {
        let trimmed = raw.trim();
        let well_formed = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !well_formed {
            return Err(LinkError::InvalidLink(format!(
                "malformed request id '{raw}'"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RequestId {
    type Error = LinkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RequestId::new(&value)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

/// Fields carried directly by a simple link. Unset fields take defaults at
/// resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteralRequest {
    pub recipient: String,
    pub chain: Option<Chain>,
    pub amount: Option<Amount>,
    pub token: Option<Token>,
}

impl LiteralRequest {
    pub fn is_open_ended(&self) -> bool {
        self.amount.is_none()
    }
}

/// What a payment link points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaymentDescriptor {
    #[serde(rename_all = "camelCase")]
    ByIdentifier { request_id: RequestId },
    ByLiteral(LiteralRequest),
}

/// Path for a simple link, without scheme or host.
pub fn encode_path(request: &PaymentRequest) -> String {
    let mut segments = vec![urlencoding::encode(&request.recipient).into_owned()];
    let pin_chain = request.chain != DEFAULT_CHAIN;

    match &request.amount {
        Some(amount) if request.is_advanced_mode => {
            segments.push(request.chain.name().to_string());
            segments.push(amount.to_string());
            segments.push(request.token.slug().to_string());
        }
        Some(amount) => {
            if pin_chain {
                segments.push(request.chain.name().to_string());
            }
            segments.push(format!("{amount}{}", request.token.slug()));
        }
        None if pin_chain => segments.push(request.chain.name().to_string()),
        None => {}
    }

    format!("{PAY_PATH}/{}", segments.join("/"))
}

/// Full simple link under `base_url`.
pub fn encode_url(base_url: &Url, request: &PaymentRequest) -> String {
    join(base_url, &encode_path(request))
}

/// This application's link for a tracked request: `<base>/pay?id=<id>`.
pub fn tracked_url(base_url: &Url, request_id: &RequestId) -> String {
    join(
        base_url,
        &format!("{PAY_PATH}?id={}", urlencoding::encode(request_id.as_str())),
    )
}

/// The external service's own page for a tracked request.
pub fn service_url(request_id: &RequestId) -> String {
    format!(
        "{PEANUT_REQUEST_LINK}?id={}",
        urlencoding::encode(request_id.as_str())
    )
}

/// Rewrite a link minted by the external service onto this application's
/// host, so every distributed link shares one domain.
pub fn normalize_service_link(base_url: &Url, service_link: &str) -> Result<String, LinkError> {
    let request_id = request_id_from_link(service_link)?;
    Ok(tracked_url(base_url, &request_id))
}

/// Extract the `id` query parameter from any absolute link.
pub fn request_id_from_link(link: &str) -> Result<RequestId, LinkError> {
    let parsed = Url::parse(link)
        .map_err(|e| LinkError::InvalidLink(format!("unparseable link '{link}': {e}")))?;
    let id = parsed
        .query_pairs()
        .find(|(k, _)| k == "id")
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| LinkError::InvalidLink(format!("no request id in '{link}'")))?;
    RequestId::new(&id)
}

fn join(base_url: &Url, path_and_query: &str) -> String {
    format!("{}{path_and_query}", base_url.as_str().trim_end_matches('/'))
}

/// Decode an absolute URL or a `path?query` string into a descriptor.
pub fn decode(link: &str) -> Result<PaymentDescriptor, LinkError> {
    let link = link.trim();
    let (path, query) = match Url::parse(link) {
        Ok(url) => (url.path().to_string(), url.query().map(String::from)),
        Err(_) => {
            let without_fragment = link.split('#').next().unwrap_or(link);
            match without_fragment.split_once('?') {
                Some((p, q)) => (p.to_string(), Some(q.to_string())),
                None => (without_fragment.to_string(), None),
            }
        }
    };
    decode_parts(&path, query.as_deref())
}

/// Decode a link given its path and raw query separately.
pub fn decode_parts(path: &str, query: Option<&str>) -> Result<PaymentDescriptor, LinkError> {
    let params: Vec<(String, String)> = query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();
    let param = |name: &str| {
        params
            .iter()
            .find(|(k, v)| k == name && !v.trim().is_empty())
            .map(|(_, v)| v.as_str())
    };

    // A request id wins over anything else in the link.
    if let Some(id) = param("id") {
        return Ok(PaymentDescriptor::ByIdentifier {
            request_id: RequestId::new(id)?,
        });
    }

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    if segments.next() != Some(PAY_PATH.trim_start_matches('/')) {
        return Err(LinkError::InvalidLink(format!("not a payment path: '{path}'")));
    }
    let segments = segments
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .map_err(|_| LinkError::InvalidLink(format!("bad percent-encoding in '{s}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let literal = if segments.is_empty() {
        let recipient = param("recipient").ok_or_else(|| {
            LinkError::InvalidLink("missing request id or recipient".to_string())
        })?;
        LiteralRequest {
            recipient: recipient.trim().to_string(),
            chain: param("chain").map(parse_chain).transpose()?,
            amount: param("amount").map(parse_amount).transpose()?,
            token: param("token").map(parse_token).transpose()?,
        }
    } else {
        decode_segments(&segments)?
    };

    if !is_valid_address_or_ens(&literal.recipient) {
        return Err(LinkError::InvalidLink(format!(
            "'{}' is not an address or ENS name",
            literal.recipient
        )));
    }
    Ok(PaymentDescriptor::ByLiteral(literal))
}

fn decode_segments(segments: &[String]) -> Result<LiteralRequest, LinkError> {
    let recipient = segments[0].clone();
    let (chain, amount, token) = match &segments[1..] {
        [] => (None, None, None),
        [one] => match one.parse::<Chain>() {
            Ok(chain) => (Some(chain), None, None),
            Err(_) => {
                let (amount, token) = split_amount_token(one)?;
                (None, Some(amount), token)
            }
        },
        [first, second] => match first.parse::<Chain>() {
            Ok(chain) => {
                let (amount, token) = split_amount_token(second)?;
                (Some(chain), Some(amount), token)
            }
            Err(_) => (None, Some(parse_amount(first)?), Some(parse_token(second)?)),
        },
        [chain, amount, token] => (
            Some(parse_chain(chain)?),
            Some(parse_amount(amount)?),
            Some(parse_token(token)?),
        ),
        _ => {
            return Err(LinkError::InvalidLink(format!(
                "too many path segments ({})",
                segments.len() + 1
            )))
        }
    };
    Ok(LiteralRequest {
        recipient,
        chain,
        amount,
        token,
    })
}

/// Split `10usdc` into `("10", Some(Usdc))`; a bare `10` has no token.
fn split_amount_token(segment: &str) -> Result<(Amount, Option<Token>), LinkError> {
    let split_at = segment
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .len();
    let (amount, token) = segment.split_at(split_at);
    let token = if token.is_empty() {
        None
    } else {
        Some(parse_token(token)?)
    };
    Ok((parse_amount(amount)?, token))
}

fn parse_chain(raw: &str) -> Result<Chain, LinkError> {
    raw.parse()
        .map_err(|_| LinkError::InvalidLink(format!("unsupported chain '{raw}'")))
}

fn parse_token(raw: &str) -> Result<Token, LinkError> {
    raw.parse()
        .map_err(|_| LinkError::InvalidLink(format!("unsupported token '{raw}'")))
}

fn parse_amount(raw: &str) -> Result<Amount, LinkError> {
    Amount::parse(raw).map_err(|e| LinkError::InvalidLink(format!("amount '{raw}': {e}")))
}

/// A link ready to hand to a payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLink {
    pub link: String,
    /// Path and query, relative to the application base URL.
    pub path: String,
    pub mode: LinkMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

/// Produce the link for a validated request.
///
/// Open-ended requests and [`LinkMode::Simple`] are encoded in the path.
/// Otherwise the request is minted with the external service and the link it
/// returns is rewritten onto `config.app_base_url`.
pub async fn generate<S: PaymentService>(
    request: &PaymentRequest,
    config: &AppConfig,
    service: &S,
) -> Result<GeneratedLink, ServiceError> {
    let simple = || GeneratedLink {
        link: encode_url(&config.app_base_url, request),
        path: encode_path(request),
        mode: LinkMode::Simple,
        request_id: None,
    };

    let Some(amount) = request.amount.as_ref() else {
        return Ok(simple());
    };
    if config.link_mode == LinkMode::Simple {
        return Ok(simple());
    }
    if config.api_key.is_none() {
        return Err(ServiceError::NotConfigured);
    }

    let created = service
        .create_request(&CreateRequest {
            chain_id: request.chain.id(),
            token_address: request.token.address_on(request.chain),
            token_amount: amount.to_string(),
            token_decimals: request.token.decimals(),
            token_type: TokenType::Erc20,
            token_symbol: request.token.symbol().to_string(),
            recipient_address: request.recipient.clone(),
        })
        .await?;

    let link = normalize_service_link(&config.app_base_url, &created.link).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "service link has no request id; using the minted id");
        tracked_url(&config.app_base_url, &created.request_id)
    });
    Ok(GeneratedLink {
        link,
        path: format!(
            "{PAY_PATH}?id={}",
            urlencoding::encode(created.request_id.as_str())
        ),
        mode: LinkMode::Tracked,
        request_id: Some(created.request_id),
    })
}
