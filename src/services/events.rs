use crate::models::{AuditEvent, ChangeType, IdentityEvent};
use crate::utils::text::non_empty;
use serde_json::Value;

/// First case-sensitive match on the event type wins.
const ITEM_TYPE_RULES: &[(&str, &str)] = &[
    ("ROLE", "Role"),
    ("ACCESS_PROFILE", "Access Profile"),
    ("ENTITLEMENT", "Entitlement"),
    ("ACCOUNT", "Account"),
];

struct ChangeRule {
    change: ChangeType,
    action_terms: &'static [&'static str],
    type_terms: &'static [&'static str],
}

/// Evaluated in order; ADDED outranks REMOVED when both match.
const CHANGE_TYPE_RULES: &[ChangeRule] = &[
    ChangeRule {
        change: ChangeType::Added,
        action_terms: &["assign", "grant", "add"],
        type_terms: &["assigned", "granted"],
    },
    ChangeRule {
        change: ChangeType::Removed,
        action_terms: &["remove", "revoke", "delete"],
        type_terms: &["removed", "revoked"],
    },
];

const ITEM_NAME_KEYS: &[&str] = &[
    "roleName",
    "accessProfileName",
    "entitlementName",
    "accountName",
    "name",
];

const ITEM_ID_KEYS: &[&str] = &["roleId", "accessProfileId", "entitlementId", "accountId", "id"];

pub const UNKNOWN_ITEM: &str = "Unknown";

pub fn item_type(event: &AuditEvent) -> String {
    ITEM_TYPE_RULES
        .iter()
        .find(|(needle, _)| event.kind.contains(needle))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| event.kind.clone())
}

pub fn change_type(event: &AuditEvent) -> ChangeType {
    let action = event.action.to_lowercase();
    let kind = event.kind.to_lowercase();
    CHANGE_TYPE_RULES
        .iter()
        .find(|rule| {
            rule.action_terms.iter().any(|t| action.contains(t))
                || rule.type_terms.iter().any(|t| kind.contains(t))
        })
        .map(|rule| rule.change)
        .unwrap_or(ChangeType::Modified)
}

fn detail_string<'a>(details: Option<&'a Value>, key: &str) -> Option<&'a str> {
    non_empty(details.and_then(|d| d.get(key)).and_then(Value::as_str))
}

fn first_present(event: &AuditEvent, target: Option<&str>, keys: &[&str]) -> Option<String> {
    non_empty(target)
        .or_else(|| {
            keys.iter()
                .find_map(|key| detail_string(event.details.as_ref(), key))
        })
        .map(str::to_string)
}

pub fn item_name(event: &AuditEvent) -> String {
    let target = event.target.as_ref().and_then(|t| t.name.as_deref());
    first_present(event, target, ITEM_NAME_KEYS).unwrap_or_else(|| UNKNOWN_ITEM.to_string())
}

pub fn item_id(event: &AuditEvent) -> String {
    let target = event.target.as_ref().and_then(|t| t.id.as_deref());
    first_present(event, target, ITEM_ID_KEYS).unwrap_or_default()
}

pub fn to_identity_event(event: &AuditEvent) -> IdentityEvent {
    IdentityEvent {
        timestamp: event.created.clone(),
        event_type: event.kind.clone(),
        action: event.action.clone(),
        item_type: item_type(event),
        item_name: item_name(event),
        item_id: item_id(event),
        change_type: change_type(event),
        actor: non_empty(event.actor.as_ref().and_then(|a| a.name.as_deref()))
            .unwrap_or("System")
            .to_string(),
        source: non_empty(event.source.as_ref().and_then(|s| s.name.as_deref()))
            .map(str::to_string),
        details: event
            .details
            .as_ref()
            .filter(|d| !d.is_null())
            .map(|d| d.to_string())
            .unwrap_or_else(|| "{}".to_string()),
    }
}

/// Classifies events and drops those whose item could not be named.
pub fn classify(events: &[AuditEvent]) -> Vec<IdentityEvent> {
    events
        .iter()
        .map(to_identity_event)
        .filter(|e| e.item_name != UNKNOWN_ITEM)
        .collect()
}
