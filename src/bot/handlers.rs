use tracing::{error, info, instrument, warn};

use super::commands::{help_text, Command};
use crate::answers::DEFAULT_MAX_CHARS;
use crate::errors::AppError;
use crate::ledger::repo_types::HistoryEntry;
use crate::ledger::{format_amount, UserId};
use crate::state::AppState;

/// Hard ceiling for a single answer; Discord embed field values stop at 1024.
pub const MAX_ANSWER_CHARS: usize = 1024;
/// Longest question forwarded to the backend.
pub const MAX_QUESTION_CHARS: usize = 1024;

pub const ADD_FAILED: &str =
    "Sorry, I couldn't process that food item. Please try again with a more specific description.";
pub const QUESTION_TOO_LONG: &str =
    "Sorry, your question is too long. Please try to ask a shorter question (under 1024 characters).";
pub const ANSWER_TOO_LONG: &str = "I apologize, but I'm having trouble providing a concise answer. Could you try asking a more specific question?";
pub const QUESTION_BACKEND_FAILED: &str =
    "Sorry, I'm having trouble connecting to the nutrition database. Please try again later.";
pub const QUESTION_FAILED: &str = "Sorry, I couldn't process your question. Please try again.";
pub const NO_HISTORY: &str = "No food history found for today.";
pub const NO_ENTRIES_TO_CLEAR: &str = "No entries to clear.";
pub const CLEAR_FAILED: &str = "Sorry, I couldn't clear your last entry. Please try again.";
pub const ANSWER_FOOTER: &str = "Powered by MacroMind";

const BRIEF_PREFIX: &str = "Please answer this very briefly: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Embed { body: String, footer: String },
}

impl Reply {
    fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

/// Maps chat commands onto ledger and backend operations and renders replies.
#[derive(Clone)]
pub struct CommandRouter {
    state: AppState,
}

impl CommandRouter {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn prefix(&self) -> &str {
        &self.state.config.command_prefix
    }

    /// Handles a parsed command, or renders the usage hint for a bad one.
    pub async fn dispatch(&self, user_id: UserId, parsed: Result<Command, AppError>) -> Reply {
        match parsed {
            Ok(command) => self.handle(user_id, command).await,
            Err(e) => Reply::Text(user_message(&e)),
        }
    }

    pub async fn handle(&self, user_id: UserId, command: Command) -> Reply {
        match command {
            Command::Add(items) => self.add(user_id, items).await,
            Command::Left => self.left(user_id).await,
            Command::History => self.history(user_id).await,
            Command::ClearRecent => self.clear_recent(user_id).await,
            Command::ClearAll => self.clear_all(user_id).await,
            Command::Ask(question) => self.ask(&question).await,
            Command::Help => Reply::Text(help_text(self.prefix())),
        }
    }

    #[instrument(skip(self))]
    async fn add(&self, user_id: UserId, items: Vec<String>) -> Reply {
        let outcome = match self
            .state
            .ledger
            .add_entries(user_id, &items, self.state.nutrition.as_ref())
            .await
        {
            Ok(o) => o,
            Err(e) => {
                error!(error = %e, %user_id, "add failed");
                return Reply::text(ADD_FAILED);
            }
        };

        let lines: Vec<&str> = outcome.entries.iter().map(|e| e.rendered.as_str()).collect();
        Reply::Text(format!(
            "Added:\n{}\n\nDaily totals - **Calories:** {} kcal, **Protein:** {}g",
            lines.join("\n"),
            format_amount(outcome.totals.calories),
            format_amount(outcome.totals.protein_grams),
        ))
    }

    async fn left(&self, user_id: UserId) -> Reply {
        let left = self.state.ledger.remaining_allowance(user_id).await;
        Reply::Text(format!(
            "You have {} calories and {}g of protein left for today.",
            format_amount(left.calories_left),
            format_amount(left.protein_left),
        ))
    }

    async fn history(&self, user_id: UserId) -> Reply {
        let entries = self.state.ledger.history(user_id).await;
        if entries.is_empty() {
            return Reply::text(NO_HISTORY);
        }
        let lines: Vec<&str> = entries.iter().map(|e| e.rendered.as_str()).collect();
        Reply::Text(format!("**Food history:**\n{}", lines.join("\n")))
    }

    async fn clear_recent(&self, user_id: UserId) -> Reply {
        let result = self.state.ledger.undo_last(user_id).await;
        if let Err(e) = &result {
            if !matches!(e, AppError::NotFound(_)) {
                error!(error = %e, %user_id, "undo failed");
            }
        }
        clear_recent_reply(result)
    }

    async fn clear_all(&self, user_id: UserId) -> Reply {
        self.state.ledger.clear_all(user_id).await;
        info!(%user_id, "user cleared all data");
        Reply::text("Cleared all data.")
    }

    #[instrument(skip(self, question), fields(question_len = question.chars().count()))]
    async fn ask(&self, question: &str) -> Reply {
        if question.chars().count() > MAX_QUESTION_CHARS {
            warn!("question rejected as too long");
            return Reply::text(QUESTION_TOO_LONG);
        }

        match self.answer_within_limit(question).await {
            Ok(Some(answer)) => Reply::Embed {
                body: answer,
                footer: ANSWER_FOOTER.to_string(),
            },
            Ok(None) => Reply::text(ANSWER_TOO_LONG),
            Err(e) => {
                error!(error = %e, "question failed");
                if e.is_backend() {
                    Reply::text(QUESTION_BACKEND_FAILED)
                } else {
                    Reply::text(QUESTION_FAILED)
                }
            }
        }
    }

    /// One retry with a brevity hint if the first answer is over the ceiling.
    /// `Ok(None)` when both attempts are too long; answers are never cut.
    async fn answer_within_limit(&self, question: &str) -> Result<Option<String>, AppError> {
        let answers = &self.state.answers;

        let answer = answers.answer(question, DEFAULT_MAX_CHARS).await?;
        if answer.chars().count() <= MAX_ANSWER_CHARS {
            return Ok(Some(answer));
        }

        warn!(len = answer.chars().count(), "answer too long, asking for a briefer one");
        let brief = format!("{BRIEF_PREFIX}{question}");
        let answer = answers.answer(&brief, DEFAULT_MAX_CHARS).await?;
        if answer.chars().count() <= MAX_ANSWER_CHARS {
            return Ok(Some(answer));
        }
        warn!(len = answer.chars().count(), "retry still too long");
        Ok(None)
    }
}

fn clear_recent_reply(result: Result<HistoryEntry, AppError>) -> Reply {
    match result {
        Ok(entry) => Reply::Text(format!("Cleared most recent entry: {}", entry.rendered)),
        Err(AppError::NotFound(_)) => Reply::text(NO_ENTRIES_TO_CLEAR),
        Err(_) => Reply::text(CLEAR_FAILED),
    }
}

fn user_message(e: &AppError) -> String {
    match e {
        AppError::Validation(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::answers::AnswerQueryClient;
    use crate::errors::LlmError;
    use crate::ledger::services::testing::TableEstimator;
    use crate::llm::testing::ScriptedModel;

    const USER: UserId = UserId(42);

    fn router_with(model: Arc<ScriptedModel>) -> CommandRouter {
        let nutrition = Arc::new(TableEstimator::with(&[("2 eggs", 70.0, 6.0), ("toast", 120.0, 4.0)]));
        let answers = Arc::new(AnswerQueryClient::new(model));
        CommandRouter::new(AppState::fake(nutrition, answers))
    }

    fn router() -> CommandRouter {
        router_with(Arc::new(ScriptedModel::default()))
    }

    impl CommandRouter {
        async fn respond(&self, user_id: UserId, content: &str) -> Option<Reply> {
            let parsed = Command::parse(content, self.prefix())?;
            Some(self.dispatch(user_id, parsed).await)
        }
    }

    fn text(reply: Option<Reply>) -> String {
        match reply.expect("a reply") {
            Reply::Text(s) => s,
            other => panic!("expected text reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn add_reports_entries_and_totals() {
        let r = router();
        let reply = text(r.respond(USER, "!add 2 eggs, toast").await);
        assert_eq!(
            reply,
            "Added:\n\
             2 eggs (**Calories:** 70 kcal, **Protein:** 6g)\n\
             toast (**Calories:** 120 kcal, **Protein:** 4g)\n\
             \n\
             Daily totals - **Calories:** 190 kcal, **Protein:** 10g"
        );
    }

    #[tokio::test]
    async fn failed_add_apologises_and_commits_nothing() {
        let r = router();
        let reply = text(r.respond(USER, "!add 2 eggs, unicorn steak").await);
        assert_eq!(reply, ADD_FAILED);
        assert_eq!(text(r.respond(USER, "!history").await), NO_HISTORY);
    }

    #[tokio::test]
    async fn add_without_items_gets_usage_hint() {
        let reply = text(router().respond(USER, "!add ,").await);
        assert!(reply.contains("!add 2 eggs, toast"));
    }

    #[tokio::test]
    async fn left_history_and_clear_flow() {
        let r = router();
        assert_eq!(
            text(r.respond(USER, "!left").await),
            "You have 2250 calories and 180g of protein left for today."
        );

        r.respond(USER, "!add 2 eggs, toast").await;
        assert_eq!(
            text(r.respond(USER, "!left").await),
            "You have 2060 calories and 170g of protein left for today."
        );
        assert_eq!(
            text(r.respond(USER, "!history").await),
            "**Food history:**\n\
             2 eggs (**Calories:** 70 kcal, **Protein:** 6g)\n\
             toast (**Calories:** 120 kcal, **Protein:** 4g)"
        );

        assert_eq!(
            text(r.respond(USER, "!clear r").await),
            "Cleared most recent entry: toast (**Calories:** 120 kcal, **Protein:** 4g)"
        );
        assert_eq!(
            text(r.respond(USER, "!left").await),
            "You have 2180 calories and 174g of protein left for today."
        );

        assert_eq!(text(r.respond(USER, "!clear").await), "Cleared all data.");
        assert_eq!(text(r.respond(USER, "!clear r").await), NO_ENTRIES_TO_CLEAR);
        assert_eq!(text(r.respond(USER, "!history").await), NO_HISTORY);
    }

    #[tokio::test]
    async fn non_commands_get_no_reply() {
        let r = router();
        assert!(r.respond(USER, "just chatting").await.is_none());
        assert!(r.respond(USER, "!unknown").await.is_none());
    }

    #[tokio::test]
    async fn help_lists_commands() {
        assert!(text(router().respond(USER, "!help").await).contains("!clear r"));
    }

    #[tokio::test]
    async fn short_answer_is_embedded() {
        let model = Arc::new(ScriptedModel::replying(vec![ScriptedModel::text("Eat lentils.")]));
        let reply = router_with(model.clone())
            .respond(USER, "!q good vegan protein?")
            .await;
        assert_eq!(
            reply,
            Some(Reply::Embed {
                body: "Eat lentils.".into(),
                footer: ANSWER_FOOTER.into()
            })
        );
        assert_eq!(model.recorded().len(), 1);
    }

    #[tokio::test]
    async fn oversized_answer_is_retried_once_with_brief_prompt() {
        let long = "a".repeat(MAX_ANSWER_CHARS + 1);
        let model = Arc::new(ScriptedModel::replying(vec![
            ScriptedModel::text(&long),
            ScriptedModel::text("Short now."),
        ]));
        let reply = router_with(model.clone())
            .respond(USER, "!q explain keto")
            .await;

        assert!(matches!(reply, Some(Reply::Embed { ref body, .. }) if body == "Short now."));
        let sent = model.recorded();
        assert_eq!(sent.len(), 2);
        assert!(!sent[0].prompt.contains(BRIEF_PREFIX));
        assert!(sent[1].prompt.contains("Please answer this very briefly: explain keto"));
    }

    #[tokio::test]
    async fn still_oversized_answer_gets_apology_not_truncation() {
        let long = "b".repeat(MAX_ANSWER_CHARS + 50);
        let model = Arc::new(ScriptedModel::replying(vec![
            ScriptedModel::text(&long),
            ScriptedModel::text(&long),
            ScriptedModel::text("never asked"),
        ]));
        let reply = text(router_with(model.clone()).respond(USER, "!q explain keto").await);
        assert_eq!(reply, ANSWER_TOO_LONG);
        assert_eq!(model.recorded().len(), 2);
    }

    #[tokio::test]
    async fn answer_exactly_at_limit_is_accepted() {
        let exact = "c".repeat(MAX_ANSWER_CHARS);
        let model = Arc::new(ScriptedModel::replying(vec![ScriptedModel::text(&exact)]));
        let reply = router_with(model.clone()).respond(USER, "!q hi").await;
        assert!(matches!(reply, Some(Reply::Embed { .. })));
        assert_eq!(model.recorded().len(), 1);
    }

    #[tokio::test]
    async fn overlong_question_never_reaches_backend() {
        let model = Arc::new(ScriptedModel::default());
        let question = format!("!q {}", "x".repeat(MAX_QUESTION_CHARS + 1));
        let reply = text(router_with(model.clone()).respond(USER, &question).await);
        assert_eq!(reply, QUESTION_TOO_LONG);
        assert!(model.recorded().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_gets_connection_apology() {
        let model = Arc::new(ScriptedModel::replying(vec![Err(LlmError::Backend(
            "HTTP 500".into(),
        ))]));
        let reply = text(router_with(model).respond(USER, "!q hi").await);
        assert_eq!(reply, QUESTION_BACKEND_FAILED);
    }

    #[tokio::test]
    async fn empty_answer_gets_generic_apology() {
        let model = Arc::new(ScriptedModel::replying(vec![Err(LlmError::EmptyResponse)]));
        let reply = text(router_with(model).respond(USER, "!q hi").await);
        assert_eq!(reply, QUESTION_FAILED);
    }

    #[tokio::test]
    async fn question_exactly_at_limit_reaches_backend() {
        let question = "x".repeat(MAX_QUESTION_CHARS);
        let model = Arc::new(ScriptedModel::replying(vec![ScriptedModel::text("Sure.")]));
        let reply = router_with(model.clone())
            .respond(USER, &format!("!q {question}"))
            .await;

        assert!(matches!(reply, Some(Reply::Embed { ref body, .. }) if body == "Sure."));
        let sent = model.recorded();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].prompt.contains(&question));
    }

    #[test]
    fn failed_undo_is_not_reported_as_empty_history() {
        assert_eq!(
            clear_recent_reply(Err(AppError::NotFound("no entries to undo"))),
            Reply::text(NO_ENTRIES_TO_CLEAR)
        );
        assert_eq!(
            clear_recent_reply(Err(AppError::Backend("store unavailable".into()))),
            Reply::text(CLEAR_FAILED)
        );
    }
}
