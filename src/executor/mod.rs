//! Command executor
//!
//! Expands a command template once per request and once per target, sends each
//! command in turn and folds the classified replies into a single summary.

pub mod actions;
pub mod classify;
pub mod compat;

use tracing::{debug, error, info, warn};

use crate::rcon::RconError;
use crate::roster::RosterUpdate;
use crate::session::action_channel::{Notification, SessionEvent};
use crate::session::state::Session;

pub use classify::{Outcome, ResponsePattern, ResponseRules};
pub use compat::{AdminAction, ServerRelease};

/// Placeholder replaced with each target's quoted name.
const TARGET_PLACEHOLDER: &str = "{name}";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    /// Emits only the flag token when set
    Flag(bool),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParam {
    pub name: String,
    pub flag: Option<String>,
    pub value: ParamValue,
    pub mandatory: bool,
    pub quoted: bool,
}

impl CommandParam {
    pub fn required(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flag: None,
            value: ParamValue::Text(value.into()),
            mandatory: true,
            quoted: false,
        }
    }

    pub fn optional(name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            flag: None,
            value: value.map_or(ParamValue::Missing, |v| ParamValue::Text(v.into())),
            mandatory: false,
            quoted: false,
        }
    }

    pub fn switch(name: impl Into<String>, flag: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            flag: Some(flag.into()),
            value: ParamValue::Flag(enabled),
            mandatory: false,
            quoted: false,
        }
    }

    /// Prefix the value with a flag token such as `-r`
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    pub fn quoted(mut self) -> Self {
        self.quoted = true;
        self
    }

    fn placeholder(&self) -> String {
        format!("{{{}}}", self.name)
    }

    fn render(&self) -> Result<String, ExecutorError> {
        let rendered = match &self.value {
            ParamValue::Text(value) if !value.trim().is_empty() => {
                let value = if self.quoted {
                    quote(value)
                } else {
                    value.trim().to_string()
                };
                match &self.flag {
                    Some(flag) => format!("{} {}", flag, value),
                    None => value,
                }
            }
            ParamValue::Flag(true) => self.flag.clone().unwrap_or_default(),
            ParamValue::Flag(false) => String::new(),
            ParamValue::Text(_) | ParamValue::Missing => {
                if self.mandatory {
                    return Err(ExecutorError::MissingParameter(self.name.clone()));
                }
                String::new()
            }
        };
        Ok(rendered)
    }
}

/// Wrap in double quotes; inner double quotes become single quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.trim().replace('"', "'"))
}

/// Collapse whitespace runs outside double quotes and trim the ends.
pub fn normalize_whitespace(command: &str) -> String {
    let mut out = String::with_capacity(command.len());
    let mut in_quotes = false;
    let mut pending_space = false;

    for ch in command.trim().chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        }
        if !in_quotes && ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

/// Title templates for the batch summary.
///
/// Titles may use `{name}`, `{count}`, `{success}`, `{failed}` and `{total}`.
/// A missing template suppresses that notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationTemplates {
    pub success: Option<String>,
    pub failure: Option<String>,
    pub single_success: Option<String>,
    pub single_failure: Option<String>,
    pub all_succeeded: Option<String>,
    pub all_failed: Option<String>,
    pub partial: Option<String>,
}

impl NotificationTemplates {
    /// For commands that run once without targets
    pub fn untargeted(success: &str, failure: &str) -> Self {
        Self {
            success: Some(success.to_string()),
            failure: Some(failure.to_string()),
            ..Self::default()
        }
    }

    /// `done` is the past tense ("Banned"), `verb` the infinitive ("ban")
    pub fn for_targets(done: &str, verb: &str) -> Self {
        Self {
            single_success: Some(format!("{} {{name}}", done)),
            single_failure: Some(format!("Failed to {} {{name}}", verb)),
            all_succeeded: Some(format!("{} {{count}} players", done)),
            all_failed: Some(format!("Failed to {} {{count}} players", verb)),
            partial: Some(format!("{} {{success}} of {{total}} players", done)),
            ..Self::default()
        }
    }
}

/// One administrative operation.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub template: String,
    /// `None` runs once; otherwise once per entry
    pub targets: Option<Vec<String>>,
    pub params: Vec<CommandParam>,
    pub rules: ResponseRules,
    /// Rewrites a reply before classification
    pub post_process: Option<fn(&str) -> String>,
    pub on_success: Option<RosterUpdate>,
    pub notifications: NotificationTemplates,
    pub emit_roster_changed: bool,
}

impl CommandRequest {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            targets: None,
            params: Vec::new(),
            rules: ResponseRules::default(),
            post_process: None,
            on_success: None,
            notifications: NotificationTemplates::default(),
            emit_roster_changed: false,
        }
    }

    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn param(mut self, param: CommandParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn rules(mut self, rules: ResponseRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn post_process(mut self, hook: fn(&str) -> String) -> Self {
        self.post_process = Some(hook);
        self
    }

    pub fn on_success(mut self, update: RosterUpdate) -> Self {
        self.on_success = Some(update);
        self
    }

    pub fn notifications(mut self, templates: NotificationTemplates) -> Self {
        self.notifications = templates;
        self
    }

    pub fn emit_roster_changed(mut self) -> Self {
        self.emit_roster_changed = true;
        self
    }

    /// Substitute every parameter, leaving the target placeholder in place
    pub fn expand_params(&self) -> Result<String, ExecutorError> {
        self.params.iter().try_fold(self.template.clone(), |acc, param| {
            Ok(acc.replace(&param.placeholder(), &param.render()?))
        })
    }

    /// Final command text for one run
    pub fn command_for(expanded: &str, target: Option<&str>) -> String {
        let command = match target {
            Some(name) => expanded.replace(TARGET_PLACEHOLDER, &quote(name)),
            None => expanded.to_string(),
        };
        normalize_whitespace(&command)
    }
}

/// Pick and fill the summary notification for a finished batch
pub fn summarize(
    request: &CommandRequest,
    successes: usize,
    last_failure: Option<&str>,
) -> Option<Notification> {
    let templates = &request.notifications;
    let failure_detail = |n: Notification| match last_failure {
        Some(detail) => n.with_message(detail),
        None => n,
    };

    match request.targets.as_deref() {
        None => {
            if successes > 0 {
                templates.success.as_deref().map(Notification::success)
            } else {
                templates
                    .failure
                    .as_deref()
                    .map(|t| failure_detail(Notification::error(t)))
            }
        }
        Some([]) => None,
        Some([name]) => {
            if successes == 1 {
                templates
                    .single_success
                    .as_deref()
                    .map(|t| Notification::success(t).with_param("name", name))
            } else {
                templates
                    .single_failure
                    .as_deref()
                    .map(|t| failure_detail(Notification::error(t).with_param("name", name)))
            }
        }
        Some(all) => {
            let total = all.len();
            if successes == total {
                templates
                    .all_succeeded
                    .as_deref()
                    .map(|t| Notification::success(t).with_param("count", total))
            } else if successes == 0 {
                templates
                    .all_failed
                    .as_deref()
                    .map(|t| failure_detail(Notification::error(t).with_param("count", total)))
            } else {
                templates.partial.as_deref().map(|t| {
                    failure_detail(
                        Notification::warning(t)
                            .with_param("success", successes)
                            .with_param("failed", total - successes)
                            .with_param("total", total),
                    )
                })
            }
        }
    }
}

impl Session {
    /// Run `request` and return how many runs succeeded.
    pub async fn execute(&mut self, request: &CommandRequest) -> usize {
        if !self.is_connected() {
            self.events
                .notify(Notification::error("RCON is not connected").with_message(&request.template));
            return 0;
        }

        let expanded = match request.expand_params() {
            Ok(expanded) => expanded,
            Err(err) => {
                error!("Aborting '{}': {}", request.template, err);
                self.events
                    .notify(Notification::error("Invalid command").with_message(err.to_string()));
                return 0;
            }
        };

        let runs: Vec<Option<&str>> = match &request.targets {
            None => vec![None],
            Some(targets) => targets.iter().map(|t| Some(t.as_str())).collect(),
        };
        if runs.is_empty() {
            self.events.notify(Notification::warning("No players selected"));
            return 0;
        }

        let total = runs.len();
        let mut successes = 0;
        let mut last_failure: Option<String> = None;
        let mut roster_changed = false;

        for (idx, target) in runs.iter().copied().enumerate() {
            let command = CommandRequest::command_for(&expanded, target);
            let outcome = match self.round_trip(&command).await {
                Ok(reply) => {
                    let reply = match request.post_process {
                        Some(hook) => hook(&reply),
                        None => reply,
                    };
                    let outcome = request.rules.classify(&reply, target);
                    match outcome {
                        Outcome::Succeeded => debug!("'{}' succeeded: {}", command, reply.trim()),
                        Outcome::Unrecognized => {
                            warn!("Unrecognized response to '{}': {}", command, reply.trim())
                        }
                        _ => warn!("'{}' rejected: {}", command, reply.trim()),
                    }
                    if !outcome.is_success() {
                        last_failure = Some(reply.trim().to_string());
                    }
                    outcome
                }
                Err(err @ RconError::CommandTooLong { .. }) => {
                    warn!("Skipping oversized command for {:?}: {}", target, err);
                    last_failure = Some(err.to_string());
                    Outcome::Oversized
                }
                Err(err) => {
                    warn!("Transport error on '{}': {}", command, err);
                    last_failure = Some(err.to_string());
                    Outcome::TransportFailed
                }
            };

            if outcome.is_success() {
                successes += 1;
                if let (Some(update), Some(name)) = (request.on_success, target) {
                    roster_changed |= self.roster.apply_update(name, update);
                }
            }

            self.events.progress(((idx + 1) * 100 / total) as u8);
        }
        self.events.progress(0);

        info!(
            "'{}' finished: {}/{} succeeded",
            request.template, successes, total
        );
        if let Some(notification) = summarize(request, successes, last_failure.as_deref()) {
            self.events.notify(notification);
        }
        if roster_changed || request.emit_roster_changed {
            self.events.emit(SessionEvent::PlayersUpdated {
                players: self.roster.players().to_vec(),
            });
        }

        successes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_expand_once() {
        let request = CommandRequest::new("banuser {name} {ip} {reason}")
            .param(CommandParam::switch("ip", "-ip", true))
            .param(CommandParam::optional("reason", Some("griefing \"base\"")).with_flag("-r").quoted());
        let expanded = request.expand_params().unwrap();
        assert_eq!(
            CommandRequest::command_for(&expanded, Some("Bob")),
            "banuser \"Bob\" -ip -r \"griefing 'base'\""
        );
    }

    #[test]
    fn test_missing_optional_collapses() {
        let request = CommandRequest::new("kickuser {name}   {reason}")
            .param(CommandParam::optional("reason", None::<String>).with_flag("-r"))
            .param(CommandParam::switch("ip", "-ip", false));
        let expanded = request.expand_params().unwrap();
        assert_eq!(
            CommandRequest::command_for(&expanded, Some("Bob")),
            "kickuser \"Bob\""
        );
    }

    #[test]
    fn test_missing_mandatory_aborts() {
        let request = CommandRequest::new("servermsg {message}")
            .param(CommandParam::required("message", "   "));
        assert_eq!(
            request.expand_params(),
            Err(ExecutorError::MissingParameter("message".into()))
        );
    }

    #[test]
    fn test_normalize_keeps_quoted_spacing() {
        assert_eq!(
            normalize_whitespace("  servermsg   \"hello   world\"  "),
            "servermsg \"hello   world\""
        );
    }

    #[test]
    fn test_summaries() {
        let batch = CommandRequest::new("banuser {name}")
            .targets(["A", "B", "C"])
            .notifications(NotificationTemplates::for_targets("Banned", "ban"));

        let partial = summarize(&batch, 2, Some("User C doesn't exist")).unwrap();
        assert_eq!(partial.rendered_title(), "Banned 2 of 3 players");
        assert_eq!(partial.message, "User C doesn't exist");
        assert_eq!(
            summarize(&batch, 3, None).unwrap().rendered_title(),
            "Banned 3 players"
        );
        assert_eq!(
            summarize(&batch, 0, Some("x")).unwrap().rendered_title(),
            "Failed to ban 3 players"
        );

        let single = CommandRequest::new("banuser {name}")
            .targets(["A"])
            .notifications(NotificationTemplates::for_targets("Banned", "ban"));
        assert_eq!(summarize(&single, 1, None).unwrap().rendered_title(), "Banned A");

        let untargeted = CommandRequest::new("save")
            .notifications(NotificationTemplates::untargeted("World saved", "Failed to save world"));
        assert_eq!(summarize(&untargeted, 0, None).unwrap().title, "Failed to save world");

        let silent = CommandRequest::new("save");
        assert!(summarize(&silent, 1, None).is_none());
    }
}
