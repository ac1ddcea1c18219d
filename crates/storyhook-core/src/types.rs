use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// GitHub sends `null` for unset strings (an issue with no description has
/// `"body": null`). Treat `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub id: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub number: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub labels: Vec<Label>,
    #[serde(default, deserialize_with = "nullable")]
    pub state: String,
    #[serde(default, deserialize_with = "nullable")]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub color: String,
}

/// PATCH payload for an issue. Only the body is ever rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueUpdate {
    pub body: String,
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, deserialize_with = "nullable")]
    pub id: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub full_name: String,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default, deserialize_with = "nullable")]
    pub hooks_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default, deserialize_with = "nullable")]
    pub login: String,
}

impl Repository {
    /// Owner login and short name, as used in `owner/repo#N` tokens.
    ///
    /// Prefers the explicit `owner.login` / `name` fields and falls back to
    /// splitting `full_name` when either is missing.
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        let login = self.owner.as_ref().map(|o| o.login.as_str()).unwrap_or("");
        if !login.is_empty() && !self.name.is_empty() {
            return Some((login, self.name.as_str()));
        }
        split_full_name(&self.full_name)
    }
}

/// Split `owner/name` into its two halves. Both halves must be non-empty.
pub fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
    let (owner, name) = full_name.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner, name))
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub active: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub events: Vec<String>,
    #[serde(default)]
    pub config: HookConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl Hook {
    /// The hook installed on work repositories: JSON `issues` deliveries to
    /// `url`, signed with `secret` when one is configured.
    pub fn issues_webhook(url: &str, secret: Option<&str>) -> Self {
        Self {
            name: "web".to_string(),
            active: true,
            events: vec!["issues".to_string()],
            config: HookConfig {
                url: url.to_string(),
                content_type: "json".to_string(),
                secret: secret.map(str::to_string),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuesEvent {
    #[serde(default, deserialize_with = "nullable")]
    pub action: String,
    #[serde(default)]
    pub issue: Option<Issue>,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub label: Option<Label>,
}

impl IssuesEvent {
    pub fn is_closed(&self) -> bool {
        self.action == "closed"
    }

    /// URL of the triggering issue, or `""` when the payload had none.
    pub fn issue_url(&self) -> &str {
        self.issue.as_ref().map(|i| i.url.as_str()).unwrap_or("")
    }
}

/// A decoded webhook delivery, keyed by the `X-GitHub-Event` header.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    Ping,
    Issues(IssuesEvent),
    Other(String),
}

impl WebhookEvent {
    /// Decode a delivery body for the given event kind.
    ///
    /// `ping` bodies are not inspected. Kinds other than `ping` and `issues`
    /// are returned as [`WebhookEvent::Other`] without parsing.
    pub fn decode(kind: &str, body: &[u8]) -> std::result::Result<Self, serde_json::Error> {
        match kind {
            "ping" => Ok(WebhookEvent::Ping),
            "issues" => Ok(WebhookEvent::Issues(serde_json::from_slice(body)?)),
            other => Ok(WebhookEvent::Other(other.to_string())),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            WebhookEvent::Ping => "ping",
            WebhookEvent::Issues(_) => "issues",
            WebhookEvent::Other(kind) => kind,
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CLOSED_EVENT: &str = r#"{
        "action": "closed",
        "issue": {
            "url": "https://api.github.com/repos/acme/worker/issues/7",
            "id": 1001,
            "number": 7,
            "title": "Ship it",
            "labels": [{"url": "u", "name": "bug", "color": "f00"}],
            "state": "closed",
            "body": "fixes acme/stories#4",
            "comments": 3
        },
        "repository": {
            "id": 55,
            "name": "worker",
            "full_name": "acme/worker",
            "owner": {"login": "acme", "type": "Organization"},
            "hooks_url": "https://api.github.com/repos/acme/worker/hooks",
            "private": true
        },
        "sender": {"login": "someone"}
    }"#;

    #[test]
    fn decodes_closed_issues_event() {
        let event = WebhookEvent::decode("issues", CLOSED_EVENT.as_bytes()).unwrap();
        let WebhookEvent::Issues(ev) = event else {
            panic!("expected issues event");
        };
        assert!(ev.is_closed());
        let issue = ev.issue.as_ref().unwrap();
        assert_eq!(issue.number, 7);
        assert_eq!(issue.body, "fixes acme/stories#4");
        assert_eq!(issue.labels[0].name, "bug");
        let repo = ev.repository.as_ref().unwrap();
        assert_eq!(repo.full_name, "acme/worker");
        assert_eq!(repo.owner_and_name(), Some(("acme", "worker")));
    }

    #[test]
    fn null_body_decodes_as_empty() {
        let json = r#"{"action":"closed","issue":{"number":3,"body":null,"title":null}}"#;
        let event = WebhookEvent::decode("issues", json.as_bytes()).unwrap();
        let WebhookEvent::Issues(ev) = event else {
            panic!("expected issues event");
        };
        let issue = ev.issue.unwrap();
        assert_eq!(issue.body, "");
        assert_eq!(issue.title, "");
        assert!(ev.repository.is_none());
    }

    #[test]
    fn partial_payload_defaults_missing_fields() {
        let event = WebhookEvent::decode("issues", b"{}").unwrap();
        assert_eq!(event, WebhookEvent::Issues(IssuesEvent::default()));
    }

    #[test]
    fn malformed_issues_payload_is_an_error() {
        assert!(WebhookEvent::decode("issues", b"{not json").is_err());
    }

    #[test]
    fn ping_ignores_body() {
        assert_eq!(
            WebhookEvent::decode("ping", b"this is the body").unwrap(),
            WebhookEvent::Ping
        );
        assert_eq!(WebhookEvent::decode("ping", b"").unwrap(), WebhookEvent::Ping);
    }

    #[test]
    fn unknown_kind_is_other() {
        let event = WebhookEvent::decode("push", b"{\"ref\":\"main\"}").unwrap();
        assert_eq!(event, WebhookEvent::Other("push".into()));
        assert_eq!(event.to_string(), "push");
    }

    #[test]
    fn owner_and_name_falls_back_to_full_name() {
        let repo = Repository {
            full_name: "acme/worker".into(),
            ..Default::default()
        };
        assert_eq!(repo.owner_and_name(), Some(("acme", "worker")));

        let empty = Repository::default();
        assert_eq!(empty.owner_and_name(), None);
    }

    #[test]
    fn split_full_name_rejects_malformed() {
        assert_eq!(split_full_name("acme/stories"), Some(("acme", "stories")));
        assert_eq!(split_full_name("acme"), None);
        assert_eq!(split_full_name("/stories"), None);
        assert_eq!(split_full_name("acme/"), None);
        assert_eq!(split_full_name("a/b/c"), None);
    }

    #[test]
    fn issues_webhook_shape() {
        let hook = Hook::issues_webhook("https://hooks.example.com/", Some("s3cret"));
        let json = serde_json::to_value(&hook).unwrap();
        assert_eq!(json["name"], "web");
        assert_eq!(json["active"], true);
        assert_eq!(json["events"], serde_json::json!(["issues"]));
        assert_eq!(json["config"]["content_type"], "json");
        assert_eq!(json["config"]["secret"], "s3cret");

        let open = Hook::issues_webhook("https://hooks.example.com/", None);
        let json = serde_json::to_value(&open).unwrap();
        assert!(json["config"].get("secret").is_none());
    }
}
