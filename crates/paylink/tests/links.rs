use paylink::{
    link, validate, AppConfig, Chain, CreateRequest, CreatedRequest, FulfillmentReport,
    LinkMode, PaymentDescriptor, PaymentForm, PaymentService, RequestDetails, RequestId,
    RequestedAmount, ServiceError, Token, DEFAULT_CHAIN, DEFAULT_TOKEN,
};
use paylink::resolver::resolve_literal;
use std::cell::RefCell;
use url::Url;

const RECIPIENT: &str = "0xabc0000000000000000000000000000000000123";

#[derive(Default)]
struct RecordingService {
    created: RefCell<Vec<CreateRequest>>,
    link: Option<String>,
}

impl PaymentService for RecordingService {
    async fn create_request(&self, request: &CreateRequest) -> Result<CreatedRequest, ServiceError> {
        self.created.borrow_mut().push(request.clone());
        Ok(CreatedRequest {
            request_id: RequestId::new("req-42").unwrap(),
            link: self
                .link
                .clone()
                .unwrap_or_else(|| "https://peanut.to/request/pay?id=req-42".to_string()),
        })
    }

    async fn get_request_details(&self, _id: &RequestId) -> Result<RequestDetails, ServiceError> {
        Err(ServiceError::NotFound("req".into()))
    }

    async fn submit_fulfillment(&self, _report: &FulfillmentReport) -> Result<(), ServiceError> {
        Ok(())
    }
}

fn config(mode: LinkMode, api_key: Option<&str>) -> AppConfig {
    AppConfig {
        app_base_url: Url::parse("https://pay.example.com").unwrap(),
        link_mode: mode,
        api_key: api_key.map(str::to_string),
        ..AppConfig::default()
    }
}

fn form(amount: Option<&str>) -> PaymentForm {
    PaymentForm {
        recipient: RECIPIENT.to_string(),
        chain: Some("optimism".to_string()),
        amount: amount.map(str::to_string),
        ..Default::default()
    }
}

#[test]
fn test_form_to_link_and_back() {
    let request = validate(&form(Some("10"))).unwrap();
    let path = link::encode_path(&request);
    assert_eq!(path, format!("/pay/{RECIPIENT}/10usdc"));

    let PaymentDescriptor::ByLiteral(literal) = link::decode(&path).unwrap() else {
        panic!("expected literal descriptor");
    };
    assert_eq!(literal.recipient, RECIPIENT);
    assert_eq!(literal.amount.unwrap().as_str(), "10");
    assert_eq!(literal.token, Some(Token::Usdc));
    assert_eq!(literal.chain.unwrap_or(Chain::Optimism), Chain::Optimism);
}

/// Every simple link decodes and resolves to what its form asked for, with
/// the chain a server configured for non-advanced forms carried along.
#[test]
fn test_simple_links_resolve_to_their_form() {
    let amounts = [Some("10"), Some("0.5"), Some(".25"), Some("10."), None];
    let recipients = [RECIPIENT, "alice.eth"];

    for chain in Chain::ALL {
        for token in Token::ALL {
            for advanced in [false, true] {
                for amount in amounts {
                    for recipient in recipients {
                        let case = format!(
                            "{recipient} {chain:?} {token:?} advanced={advanced} amount={amount:?}"
                        );
                        let mut request = validate(&PaymentForm {
                            recipient: recipient.to_string(),
                            is_advanced_mode: advanced,
                            chain: Some(chain.name().to_string()),
                            token: Some(token.slug().to_string()),
                            amount: amount.map(str::to_string),
                        })
                        .unwrap_or_else(|e| panic!("{case}: {e}"));
                        if !advanced {
                            assert_eq!(request.chain, DEFAULT_CHAIN, "{case}");
                            request.chain = chain;
                        }

                        let path = link::encode_path(&request);
                        let PaymentDescriptor::ByLiteral(literal) = link::decode(&path)
                            .unwrap_or_else(|e| panic!("{case}: {path}: {e}"))
                        else {
                            panic!("{case}: {path} is not a literal link");
                        };
                        let details = resolve_literal(&literal, DEFAULT_CHAIN);

                        assert_eq!(details.recipient, recipient, "{case}: {path}");
                        assert_eq!(details.chain_id, chain.id(), "{case}: {path}");
                        match amount {
                            Some(raw) => {
                                assert_eq!(
                                    details.amount.exact().map(|a| a.as_str()),
                                    Some(raw),
                                    "{case}: {path}"
                                );
                                assert_eq!(details.token_symbol, token.symbol(), "{case}: {path}");
                            }
                            None => {
                                assert_eq!(details.amount, RequestedAmount::Open, "{case}: {path}");
                                assert_eq!(
                                    details.token_symbol,
                                    DEFAULT_TOKEN.symbol(),
                                    "{case}: {path}"
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_open_and_exact_links_differ() {
    let open = link::decode(&link::encode_path(&validate(&form(None)).unwrap())).unwrap();
    let exact = link::decode(&link::encode_path(&validate(&form(Some("1"))).unwrap())).unwrap();
    assert_ne!(open, exact);
    match open {
        PaymentDescriptor::ByLiteral(l) => assert!(l.is_open_ended()),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_tracked_link_is_minted_and_rehosted() {
    let service = RecordingService::default();
    let request = validate(&form(Some("10"))).unwrap();

    let generated = link::generate(&request, &config(LinkMode::Tracked, Some("k")), &service)
        .await
        .unwrap();
    assert_eq!(generated.link, "https://pay.example.com/pay?id=req-42");
    assert_eq!(generated.path, "/pay?id=req-42");
    assert_eq!(generated.mode, LinkMode::Tracked);

    let created = service.created.borrow();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].chain_id, 10);
    assert_eq!(created[0].token_amount, "10");
    assert_eq!(created[0].token_decimals, 6);
    assert_eq!(created[0].token_address, Token::Usdc.address_on(Chain::Optimism));
}

#[tokio::test]
async fn test_open_request_stays_simple_in_tracked_mode() {
    let service = RecordingService::default();
    let request = validate(&form(None)).unwrap();

    let generated = link::generate(&request, &config(LinkMode::Tracked, Some("k")), &service)
        .await
        .unwrap();
    assert_eq!(generated.mode, LinkMode::Simple);
    assert_eq!(generated.link, format!("https://pay.example.com/pay/{RECIPIENT}"));
    assert!(service.created.borrow().is_empty());
}

#[tokio::test]
async fn test_tracked_mode_without_key_is_unavailable() {
    let service = RecordingService::default();
    let request = validate(&form(Some("10"))).unwrap();
    assert_eq!(
        link::generate(&request, &config(LinkMode::Tracked, None), &service).await,
        Err(ServiceError::NotConfigured)
    );
}

#[tokio::test]
async fn test_service_link_without_id_falls_back_to_minted_id() {
    let service = RecordingService {
        link: Some("https://peanut.to/request/pay".to_string()),
        ..Default::default()
    };
    let request = validate(&form(Some("3"))).unwrap();
    let generated = link::generate(&request, &config(LinkMode::Tracked, Some("k")), &service)
        .await
        .unwrap();
    assert_eq!(generated.link, "https://pay.example.com/pay?id=req-42");
}
