//! Discord channel sink over the bot REST API.
//!
//! Messages use Discord markdown: role mentions, masked links and
//! `<t:unix:style>` timestamps. Event icons come from the guild's custom
//! emojis, named after WCA event ids, and are fetched once per sink.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::error::{AppError, Result};
use crate::models::{CompetitionRef, DiscordConfig, Notification};
use crate::notify::NotificationSink;

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    guild_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GuildEmoji {
    id: Option<String>,
    name: Option<String>,
}

/// Posts notifications to one Discord channel.
pub struct DiscordSink {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    channel_id: String,
    role_id: Option<String>,
    emojis: OnceCell<HashMap<String, String>>,
}

impl DiscordSink {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        bot_token: impl Into<String>,
        channel_id: impl Into<String>,
        role_id: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            channel_id: channel_id.into(),
            role_id,
            emojis: OnceCell::new(),
        }
    }

    /// Build from configuration; token and channel are required.
    pub fn from_config(client: reqwest::Client, config: &DiscordConfig) -> Result<Self> {
        let token = config
            .bot_token
            .clone()
            .ok_or_else(|| AppError::config("Discord bot token is not set (DISCORD_BOT_TOKEN)"))?;
        let channel = config
            .channel_id
            .clone()
            .ok_or_else(|| AppError::config("Discord channel is not set (DISCORD_CHANNEL_ID)"))?;

        Ok(Self::new(
            client,
            config.api_url.clone(),
            token,
            channel,
            config.role_id.clone(),
        ))
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.bot_token)
    }

    /// Event id to emoji markup, loaded on first use.
    ///
    /// A failed lookup is logged and cached as empty; messages then fall back
    /// to plain event codes.
    async fn event_icons(&self) -> &HashMap<String, String> {
        self.emojis
            .get_or_init(|| async {
                self.fetch_emojis().await.unwrap_or_else(|e| {
                    log::warn!("Could not load guild emojis: {}", e);
                    HashMap::new()
                })
            })
            .await
    }

    async fn fetch_emojis(&self) -> Result<HashMap<String, String>> {
        let channel: ChannelInfo = self
            .client
            .get(format!("{}/channels/{}", self.api_url, self.channel_id))
            .header("Authorization", self.authorization())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let guild_id = channel
            .guild_id
            .ok_or_else(|| AppError::notify("channel does not belong to a guild"))?;

        let emojis: Vec<GuildEmoji> = self
            .client
            .get(format!("{}/guilds/{}/emojis", self.api_url, guild_id))
            .header("Authorization", self.authorization())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let icons: HashMap<String, String> = emojis
            .into_iter()
            .filter_map(|e| {
                let (id, name) = (e.id?, e.name?);
                Some((name.clone(), format!("<:{}:{}>", name, id)))
            })
            .collect();

        log::debug!("Loaded {} guild emojis", icons.len());
        Ok(icons)
    }

    async fn post(&self, content: &str) -> Result<()> {
        let url = format!("{}/channels/{}/messages", self.api_url, self.channel_id);
        let body = serde_json::json!({ "content": content });

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.authorization())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!("Discord {}: {}", status, text)));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for DiscordSink {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let role = self.role_id.as_deref();
        let content = match notification {
            Notification::NewCompetition { .. } => {
                render(notification, role, self.event_icons().await)
            }
            _ => render(notification, role, &HashMap::new()),
        };
        self.post(&content).await
    }
}

fn link(competition: &CompetitionRef) -> String {
    format!("[{}](<{}>)", competition.name, competition.url)
}

/// Render a notification as Discord markdown.
pub fn render(
    notification: &Notification,
    role_id: Option<&str>,
    icons: &HashMap<String, String>,
) -> String {
    let mention = role_id
        .map(|role| format!("<@&{}> ", role))
        .unwrap_or_default();

    match notification {
        Notification::NewCompetition {
            competition,
            start,
            events,
        } => {
            let featuring: String = events
                .iter()
                .map(|event| {
                    icons
                        .get(event)
                        .cloned()
                        .unwrap_or_else(|| format!("`{}`", event))
                })
                .collect();
            format!(
                "{}{} is happening on <t:{}:D> featuring {}",
                mention,
                link(competition),
                start.timestamp(),
                featuring
            )
        }
        Notification::NewRegistrants { competition, names } => {
            format!(
                "{} just registered for {}",
                names.join(", "),
                link(competition)
            )
        }
        Notification::RegistrationOpened {
            competition,
            open_time,
        } => format!(
            "{}Registration for {} has opened <t:{}:R>!",
            mention,
            link(competition),
            open_time.timestamp()
        ),
        Notification::RegistrationClosing {
            competition,
            close_time,
        } => format!(
            "{}Registration for {} closes in <t:{}:R>",
            mention,
            link(competition),
            close_time.timestamp()
        ),
    }
}
