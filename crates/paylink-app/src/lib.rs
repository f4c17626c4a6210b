use leptos::*;
use leptos_meta::*;
use leptos_router::*;
use paylink::{
    link, validate, Action, Amount, Chain, Field, Fulfillment, FulfillmentState, PaymentDetails,
    PaymentForm, Token, ValidationErrors, WalletStatus, DEFAULT_CHAIN,
};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

mod api;
mod format;
mod wallet;

use api::{ApiService, CreateLinkError};
use wallet::BrowserWallet;

type PaymentFlow = Fulfillment<ApiService, BrowserWallet>;

/// Main application component
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let wallet = BrowserWallet::new();
    wallet.watch();
    provide_context(wallet);

    view! {
        <Html lang="en" />
        <Meta charset="utf-8" />
        <Meta name="viewport" content="width=device-width, initial-scale=1" />
        <Title text="Paylink - Stablecoin Payment Links" />
        <Stylesheet href="/style.css" />

        <Router>
            <main class="container">
                <Header />
                <Routes>
                    <Route path="/" view=HomePage />
                    <Route path="/pay" view=PayPage />
                    <Route path="/pay/*rest" view=PayPage />
                    <Route path="/*any" view=NotFound />
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn Header() -> impl IntoView {
    view! {
        <header class="header">
            <nav class="nav">
                <a href="/" class="logo">"paylink"</a>
                <WalletButton />
            </nav>
        </header>
    }
}

/// Connect button, or the connected address and network.
#[component]
fn WalletButton() -> impl IntoView {
    let wallet = expect_context::<BrowserWallet>();
    let status = wallet.status_signal();
    let (error, set_error) = create_signal(None::<String>);

    let connect = move |_| {
        set_error.set(None);
        spawn_local(async move {
            if let Err(e) = wallet.connect().await {
                web_sys::console::error_1(&format!("Wallet error: {}", e).into());
                set_error.set(Some(e.to_string()));
            }
        });
    };

    view! {
        {move || match status.get() {
            WalletStatus::Connected { address, chain_id } => view! {
                <div class="wallet-info">
                    <span class="wallet-network">{format::network_name(chain_id)}</span>
                    <span class="wallet-address">
                        {format::short_address(&address.to_checksum(None))}
                    </span>
                    <button class="btn btn-secondary" on:click=move |_| wallet.disconnect()>
                        "Disconnect"
                    </button>
                </div>
            }
            .into_view(),
            WalletStatus::Disconnected => view! {
                <div class="wallet-buttons">
                    <button class="btn btn-primary" on:click=connect>
                        "Connect Wallet"
                    </button>
                    <Show when=move || error.get().is_some() fallback=|| ()>
                        <span class="error-text">{move || error.get().unwrap_or_default()}</span>
                    </Show>
                </div>
            }
            .into_view(),
        }}
    }
}

/// Payment link creation form
#[component]
fn HomePage() -> impl IntoView {
    let (recipient, set_recipient) = create_signal(String::new());
    let (advanced, set_advanced) = create_signal(false);
    let (chain, set_chain) = create_signal(DEFAULT_CHAIN.name().to_string());
    let (amount, set_amount) = create_signal(String::new());
    let (token, set_token) = create_signal(Token::Usdc.slug().to_string());

    let (field_errors, set_field_errors) = create_signal(ValidationErrors::default());
    let (error, set_error) = create_signal(None::<String>);
    let (creating, set_creating) = create_signal(false);
    let (generated, set_generated) = create_signal(None::<String>);
    let (copied, set_copied) = create_signal(false);

    let field_error = move |field: Field| {
        move || field_errors.with(|errors| errors.message_for(field).map(str::to_string))
    };

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if creating.get_untracked() {
            return;
        }

        let optional = |value: String| {
            let value = value.trim().to_string();
            (!value.is_empty()).then_some(value)
        };
        let form = PaymentForm {
            recipient: recipient.get_untracked().trim().to_string(),
            is_advanced_mode: advanced.get_untracked(),
            chain: Some(chain.get_untracked()),
            amount: optional(amount.get_untracked()),
            token: Some(token.get_untracked()),
        };

        set_error.set(None);
        set_generated.set(None);
        set_copied.set(false);
        if let Err(errors) = validate(&form) {
            set_field_errors.set(errors);
            return;
        }
        set_field_errors.set(ValidationErrors::default());

        set_creating.set(true);
        spawn_local(async move {
            match api::create_link(&form).await {
                Ok(created) => set_generated.set(Some(created.link)),
                Err(CreateLinkError::Invalid(errors)) => set_field_errors.set(errors),
                Err(CreateLinkError::Failed(e)) => {
                    web_sys::console::error_1(&format!("Create link failed: {}", e).into());
                    set_error.set(Some(e));
                }
            }
            set_creating.set(false);
        });
    };

    let copy_link = move |_| {
        if let Some(url) = generated.get() {
            copy_to_clipboard(&url);
            set_copied.set(true);
        }
    };

    view! {
        <div class="page">
            <h1>"Request a payment"</h1>
            <p class="subtitle">"Create a link anyone can pay in USDC or USDT."</p>

            <form class="card link-form" on:submit=on_submit>
                <label class="field">
                    <span>"Recipient"</span>
                    <input
                        type="text"
                        class="input"
                        placeholder="0x... or name.eth"
                        prop:value=move || recipient.get()
                        on:input=move |ev| set_recipient.set(event_target_value(&ev))
                    />
                    <FieldMessage message=Signal::derive(field_error(Field::Recipient)) />
                </label>

                <label class="field checkbox">
                    <input
                        type="checkbox"
                        prop:checked=move || advanced.get()
                        on:change=move |ev| set_advanced.set(event_target_checked(&ev))
                    />
                    <span>"Choose network"</span>
                </label>

                <Show when=move || advanced.get() fallback=|| ()>
                    <label class="field">
                        <span>"Network"</span>
                        <select
                            class="input"
                            prop:value=move || chain.get()
                            on:change=move |ev| set_chain.set(event_target_value(&ev))
                        >
                            {Chain::ALL
                                .into_iter()
                                .map(|c| view! { <option value=c.name()>{c.display_name()}</option> })
                                .collect_view()}
                        </select>
                        <FieldMessage message=Signal::derive(field_error(Field::Chain)) />
                    </label>
                </Show>

                <div class="field-row">
                    <label class="field">
                        <span>"Amount"</span>
                        <input
                            type="text"
                            inputmode="decimal"
                            class="input"
                            placeholder="Leave empty to let the payer choose"
                            prop:value=move || amount.get()
                            on:input=move |ev| set_amount.set(event_target_value(&ev))
                        />
                        <FieldMessage message=Signal::derive(field_error(Field::Amount)) />
                    </label>
                    <label class="field">
                        <span>"Token"</span>
                        <select
                            class="input"
                            prop:value=move || token.get()
                            on:change=move |ev| set_token.set(event_target_value(&ev))
                        >
                            {Token::ALL
                                .into_iter()
                                .map(|t| view! { <option value=t.slug()>{t.symbol()}</option> })
                                .collect_view()}
                        </select>
                        <FieldMessage message=Signal::derive(field_error(Field::Token)) />
                    </label>
                </div>

                <button type="submit" class="btn btn-primary" disabled=move || creating.get()>
                    {move || if creating.get() { "Creating..." } else { "Create link" }}
                </button>

                <Show when=move || error.get().is_some() fallback=|| ()>
                    <p class="error-text">{move || error.get().unwrap_or_default()}</p>
                </Show>
            </form>

            <Show when=move || generated.get().is_some() fallback=|| ()>
                <div class="card generated-link">
                    <h3>"Your payment link"</h3>
                    <code class="link-value">{move || generated.get().unwrap_or_default()}</code>
                    <div class="link-actions">
                        <button class="btn btn-secondary btn-sm" on:click=copy_link>
                            {move || if copied.get() { "Copied!" } else { "Copy" }}
                        </button>
                        <a
                            class="btn btn-secondary btn-sm"
                            href=move || generated.get().unwrap_or_default()
                            target="_blank"
                        >
                            "Open"
                        </a>
                    </div>
                </div>
            </Show>
        </div>
    }
}

#[component]
fn FieldMessage(#[prop(into)] message: Signal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || message.get().is_some() fallback=|| ()>
            <span class="field-error">{move || message.get().unwrap_or_default()}</span>
        </Show>
    }
}

/// Decodes the current URL and hands it to the payment flow.
#[component]
fn PayPage() -> impl IntoView {
    let href = window().location().href().unwrap_or_default();

    match link::decode(&href) {
        Ok(descriptor) => view! { <ProcessPayment descriptor=descriptor /> }.into_view(),
        Err(e) => {
            web_sys::console::warn_1(&format!("Invalid payment link: {}", e).into());
            view! {
                <div class="page">
                    <h1>"Invalid Payment Link"</h1>
                    <p class="error-text">{e.to_string()}</p>
                    <p><a href="/">"Create a new link"</a></p>
                </div>
            }
            .into_view()
        }
    }
}

#[component]
fn ProcessPayment(descriptor: paylink::PaymentDescriptor) -> impl IntoView {
    let wallet = expect_context::<BrowserWallet>();
    let status = wallet.status_signal();
    let (state, set_state) = create_signal(FulfillmentState::Idle);

    let flow = PaymentFlow::new(descriptor, ApiService, wallet, DEFAULT_CHAIN);
    flow.on_state_change(move |s| set_state.set(s.clone()));
    let flow = store_value(Rc::new(flow));

    let (details, set_details) = create_signal(None::<PaymentDetails>);
    let (load_error, set_load_error) = create_signal(None::<String>);
    let (amount_input, set_amount_input) = create_signal(String::new());
    let (input_error, set_input_error) = create_signal(None::<String>);

    let sync = move || {
        let f = flow.get_value();
        set_state.set(f.state());
        set_details.set(f.details());
    };

    spawn_local(async move {
        let f = flow.get_value();
        if let Err(e) = f.load().await {
            set_load_error.set(Some(e.to_string()));
        }
        sync();
    });

    // Wallet connects, disconnects and chain switches re-evaluate the page.
    create_effect(move |_| {
        status.with(|_| ());
        flow.get_value().refresh();
        sync();
    });

    let action = create_memo(move |_| {
        state.with(|_| ());
        status.with(|_| ());
        flow.get_value().action()
    });

    let connect = move |_| {
        spawn_local(async move {
            if let Err(e) = wallet.connect().await {
                web_sys::console::error_1(&format!("Wallet error: {}", e).into());
                set_input_error.set(Some(e.to_string()));
            }
        });
    };

    let switch = move |_| {
        spawn_local(async move {
            let f = flow.get_value();
            if let Err(e) = f.switch_network().await {
                web_sys::console::warn_1(&format!("Switch failed: {}", e).into());
            }
            sync();
        });
    };

    let pay = move |_| {
        set_input_error.set(None);
        let raw = amount_input.get_untracked();
        let chosen = match raw.trim() {
            "" => None,
            value => match Amount::parse(value) {
                Ok(amount) => Some(amount),
                Err(e) => {
                    set_input_error.set(Some(e.to_string()));
                    return;
                }
            },
        };

        spawn_local(async move {
            let f = flow.get_value();
            if let Err(e) = f.pay(chosen).await {
                web_sys::console::warn_1(&format!("Payment failed: {}", e).into());
            }
            sync();
        });
    };

    let summary = move || {
        details.get().map(|d| {
            let recipient = d.recipient.clone();
            view! {
                <div class="card payment-summary">
                    <p class="amount">{format::amount_label(&d)}</p>
                    <dl>
                        <dt>"To"</dt>
                        <dd class="mono">{recipient}</dd>
                        <dt>"Network"</dt>
                        <dd>{d.network_label()}</dd>
                    </dl>
                </div>
            }
        })
    };

    let action_view = move || match action.get() {
        Action::None => ().into_view(),
        Action::ConnectWallet => view! {
            <button class="btn btn-primary" on:click=connect>"Connect Wallet"</button>
        }
        .into_view(),
        Action::SwitchNetwork { label, .. } => view! {
            <button class="btn btn-primary" on:click=switch>{label}</button>
        }
        .into_view(),
        Action::Pay { amount_required } => view! {
            <div class="pay-action">
                <Show when=move || amount_required fallback=|| ()>
                    <input
                        type="text"
                        inputmode="decimal"
                        class="input"
                        placeholder="Amount"
                        prop:value=move || amount_input.get()
                        on:input=move |ev| set_amount_input.set(event_target_value(&ev))
                    />
                </Show>
                <button class="btn btn-primary" on:click=pay>"Pay"</button>
            </div>
        }
        .into_view(),
    };

    let status_view = move || match state.get() {
        FulfillmentState::Resolving => view! { <p class="loading">"Loading..."</p> }.into_view(),
        FulfillmentState::Submitting => {
            view! { <p class="loading">"Confirm the payment in your wallet..."</p> }.into_view()
        }
        FulfillmentState::Confirming { tx_hash } => view! {
            <p class="loading">"Waiting for confirmation of " <code>{tx_hash.to_string()}</code></p>
        }
        .into_view(),
        FulfillmentState::Succeeded { tx_hash } => {
            let hash = tx_hash.to_string();
            let explorer = details
                .get_untracked()
                .and_then(|d| format::explorer_tx_url(d.chain_id, &hash));
            view! {
                <div class="result-box success">
                    <h3>"Payment sent"</h3>
                    <code class="mono">{hash}</code>
                    {explorer.map(|url| view! {
                        <p><a href=url target="_blank">"View on explorer"</a></p>
                    })}
                </div>
            }
            .into_view()
        }
        FulfillmentState::Failed { error } if load_error.get().is_none() => view! {
            <div class="result-box error">
                <p class="error-text">{error.to_string()}</p>
            </div>
        }
        .into_view(),
        _ => ().into_view(),
    };

    view! {
        <Show
            when=move || load_error.get().is_none()
            fallback=move || view! {
                <div class="page">
                    <h1>"Payment unavailable"</h1>
                    <p class="error-text">{move || load_error.get().unwrap_or_default()}</p>
                </div>
            }
        >
            <div class="page">
                <h1>"Payment request"</h1>
                {summary}
                {status_view}
                {action_view}
                <Show when=move || input_error.get().is_some() fallback=|| ()>
                    <p class="error-text">{move || input_error.get().unwrap_or_default()}</p>
                </Show>
            </div>
        </Show>
    }
}

fn copy_to_clipboard(text: &str) {
    if let Some(window) = web_sys::window() {
        let clipboard = window.navigator().clipboard();
        let _ = clipboard.write_text(text);
    }
}

/// 404 page
#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="page">
            <h1>"404 - Not Found"</h1>
            <p><a href="/">"Go home"</a></p>
        </div>
    }
}

/// Initialize the app
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(|| view! { <App /> });
}
