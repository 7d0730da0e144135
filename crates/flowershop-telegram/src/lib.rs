// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram notification gateway for the Flowershop bot.
//!
//! Implements [`NotificationGateway`] for the Telegram Bot API via teloxide:
//! long polling feeds customer messages, button presses, and payments into
//! an inbound queue, and outbound actions become messages, files, and
//! invoices.

pub mod handler;
pub mod media;

use async_trait::async_trait;
use flowershop_config::model::TelegramConfig;
use flowershop_core::error::FlowerError;
use flowershop_core::traits::{NotificationGateway, PluginAdapter};
use flowershop_core::types::{AdapterType, HealthStatus, InboundEvent, OutboundAction};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, PreCheckoutQuery};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Inbound queue depth between the poller and the dialog loop.
const INBOUND_BUFFER: usize = 100;

fn send_err(what: &str, e: teloxide::RequestError) -> FlowerError {
    FlowerError::Gateway {
        message: format!("failed to send {what}: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn forward(tx: &mpsc::Sender<InboundEvent>, event: InboundEvent) {
    debug!(kind = event.kind(), "telegram update received");
    if tx.send(event).await.is_err() {
        warn!("inbound queue closed, dropping update");
    }
}

/// Telegram gateway implementing [`NotificationGateway`].
pub struct TelegramGateway {
    bot: Bot,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramGateway {
    /// Creates a new Telegram gateway.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, FlowerError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            FlowerError::Config("telegram.bot_token is required for the Telegram gateway".into())
        })?;

        if token.is_empty() {
            return Err(FlowerError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);

        Ok(Self {
            bot,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    async fn send_invoice(
        &self,
        chat: ChatId,
        title: String,
        description: String,
        line_items: &[flowershop_core::types::LineItem],
        payload_ref: String,
    ) -> Result<(), FlowerError> {
        let prices = handler::labeled_prices(line_items)?;
        let mut request = self.bot.send_invoice(
            chat,
            title,
            description,
            payload_ref,
            self.config.currency.clone(),
            prices,
        );
        if let Some(token) = &self.config.payment_provider_token {
            request = request.provider_token(token.clone());
        }
        request.await.map_err(|e| send_err("invoice", e))?;
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for TelegramGateway {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, FlowerError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), FlowerError> {
        debug!("Telegram gateway shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for TelegramGateway {
    async fn connect(&mut self) -> Result<(), FlowerError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let message_tx = self.inbound_tx.clone();
        let callback_tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_pre_checkout_query().endpoint(
                    |bot: Bot, q: PreCheckoutQuery| async move {
                        // The amount was fixed when the invoice was issued.
                        if let Err(e) = bot.answer_pre_checkout_query(q.id, true).await {
                            warn!(error = %e, "failed to approve pre-checkout query");
                        }
                        respond(())
                    },
                ))
                .branch(Update::filter_callback_query().endpoint(
                    move |bot: Bot, q: CallbackQuery| {
                        let tx = callback_tx.clone();
                        async move {
                            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                                debug!(error = %e, "failed to answer callback query");
                            }
                            if let Some(event) = handler::callback_event(&q) {
                                forward(&tx, event).await;
                            }
                            respond(())
                        }
                    },
                ))
                .branch(Update::filter_message().endpoint(move |msg: Message| {
                    let tx = message_tx.clone();
                    async move {
                        if !handler::is_dm(&msg) {
                            debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                            return respond(());
                        }
                        match handler::message_event(&msg) {
                            Some(event) => forward(&tx, event).await,
                            None => debug!(msg_id = msg.id.0, "ignoring unsupported message type"),
                        }
                        respond(())
                    }
                }));

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, action: OutboundAction) -> Result<(), FlowerError> {
        match action {
            OutboundAction::Prompt {
                user,
                text,
                choices,
            } => {
                let mut request = self.bot.send_message(handler::chat_id(&user.0)?, text);
                if let Some(markup) = handler::keyboard(&choices) {
                    request = request.reply_markup(markup);
                }
                request.await.map_err(|e| send_err("message", e))?;
            }
            OutboundAction::SendDocument { user, doc_ref } => {
                self.bot
                    .send_document(handler::chat_id(&user.0)?, media::input_file(&doc_ref))
                    .await
                    .map_err(|e| send_err("document", e))?;
            }
            OutboundAction::SendPhoto { user, photo_ref } => {
                self.bot
                    .send_photo(handler::chat_id(&user.0)?, media::input_file(&photo_ref))
                    .await
                    .map_err(|e| send_err("photo", e))?;
            }
            OutboundAction::RequestPayment {
                user,
                title,
                description,
                line_items,
                payload_ref,
            } => {
                self.send_invoice(
                    handler::chat_id(&user.0)?,
                    title,
                    description,
                    &line_items,
                    payload_ref,
                )
                .await?;
            }
            OutboundAction::NotifyWorker {
                worker_id,
                contact,
                text,
                ack,
            } => {
                let mut request = self.bot.send_message(handler::chat_id(&contact)?, text);
                if let Some(button) = ack
                    && let Some(markup) = handler::keyboard(&[vec![button]])
                {
                    request = request.reply_markup(markup);
                }
                request.await.map_err(|e| send_err("worker notification", e))?;
                debug!(worker_id = %worker_id, "worker notified");
            }
        }
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, FlowerError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| FlowerError::Gateway {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(String::from),
            payment_provider_token: None,
            currency: "RUB".into(),
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramGateway::new(config(None)).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramGateway::new(config(Some(""))).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        assert!(TelegramGateway::new(config(Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11"))).is_ok());
    }

    #[test]
    fn plugin_adapter_metadata() {
        let gateway = TelegramGateway::new(config(Some("test:token"))).unwrap();
        assert_eq!(gateway.name(), "telegram");
        assert_eq!(gateway.version(), semver::Version::new(0, 1, 0));
        assert_eq!(gateway.adapter_type(), AdapterType::Gateway);
    }

    #[tokio::test]
    async fn prompt_to_non_numeric_chat_fails_before_sending() {
        let gateway = TelegramGateway::new(config(Some("test:token"))).unwrap();
        let err = gateway
            .send(OutboundAction::text(&flowershop_core::UserId::from("nobody"), "hi"))
            .await
            .unwrap_err();
        assert!(err.is_gateway());
    }
}
