use anyhow::{Error, Result};
use reqwest::Client;
use serde::Serialize;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Posts run summaries to a Telegram chat. Nothing in the pipeline waits on it.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_api: String,
    token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self::with_base_api(TELEGRAM_API.to_string(), token, chat_id)
    }

    pub fn with_base_api(base_api: String, token: String, chat_id: String) -> Self {
        Self {
            client: Client::new(),
            base_api,
            token,
            chat_id,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.base_api.trim_end_matches('/'),
            self.token
        )
    }

    pub async fn send(&self, text: &str) -> Result<(), Error> {
        self.client
            .post(self.endpoint())
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
