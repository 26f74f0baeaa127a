use anyhow::Context as _;
use serenity::async_trait;
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateMessage};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::Colour;
use serenity::prelude::{Client, Context, EventHandler, GatewayIntents};
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use super::commands::Command;
use super::handlers::{CommandRouter, Reply};
use crate::ledger::UserId;
use crate::state::AppState;

/// Discord rejects messages longer than this.
const DISCORD_MESSAGE_LIMIT: usize = 2000;
/// Field names must be non-empty; a zero-width space renders as nothing.
const BLANK_FIELD_NAME: &str = "\u{200b}";

struct Handler {
    router: CommandRouter,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, "logged in to discord");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(parsed) = Command::parse(&msg.content, self.router.prefix()) else {
            return;
        };

        let user_id = UserId(msg.author.id.get());
        let span = info_span!(
            "command",
            request_id = %Uuid::new_v4(),
            %user_id,
            channel_id = %msg.channel_id,
            command = parsed.as_ref().map(Command::name).unwrap_or("invalid")
        );

        async {
            if matches!(parsed, Ok(Command::Ask(_))) {
                if let Err(e) = msg.channel_id.broadcast_typing(&ctx.http).await {
                    debug!(error = %e, "typing indicator failed");
                }
            }
            let reply = self.router.dispatch(user_id, parsed).await;
            send_reply(&ctx, &msg, reply).await;
        }
        .instrument(span)
        .await;
    }
}

async fn send_reply(ctx: &Context, msg: &Message, reply: Reply) {
    match reply {
        Reply::Text(text) => {
            for chunk in split_message(&text, DISCORD_MESSAGE_LIMIT) {
                if let Err(e) = msg.channel_id.say(&ctx.http, chunk).await {
                    error!(error = %e, "failed to send reply");
                    return;
                }
            }
        }
        Reply::Embed { body, footer } => {
            let embed = CreateEmbed::new()
                .title(" ")
                .colour(Colour::from_rgb(46, 204, 113))
                .field(BLANK_FIELD_NAME, body, false)
                .footer(CreateEmbedFooter::new(footer));
            if let Err(e) = msg
                .channel_id
                .send_message(&ctx.http, CreateMessage::new().embed(embed))
                .await
            {
                error!(error = %e, "failed to send embed");
            }
        }
    }
}

/// Splits `text` into chunks of at most `limit` chars, preferring line breaks.
fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { line_len + 1 };

        if current_len + needed <= limit {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            current_len += needed;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        // a single line longer than the limit gets hard-split
        let mut chars = line.chars().peekable();
        while chars.peek().is_some() {
            let piece: String = chars.by_ref().take(limit).collect();
            if chars.peek().is_some() {
                chunks.push(piece);
            } else {
                current_len = piece.chars().count();
                current = piece;
            }
        }
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub async fn run(state: AppState) -> anyhow::Result<()> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let token = state.config.discord_token.clone();
    let handler = Handler {
        router: CommandRouter::new(state),
    };

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .context("build discord client")?;

    client.start().await.context("discord client stopped")?;
    Ok(())
}
