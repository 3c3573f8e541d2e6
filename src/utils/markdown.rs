use crate::models::{AccessItem, Account, ChangeType, Identity, IdentityEvent};
use crate::utils::text::non_empty;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

pub const NO_EVENTS: &str = "No events found for the specified time period.";

fn or_na(value: Option<&str>) -> &str {
    non_empty(value).unwrap_or("N/A")
}

fn reference(name: Option<&str>, id: Option<&str>) -> String {
    format!("{} ({})", name.unwrap_or(""), id.unwrap_or(""))
}

fn access_section(out: &mut String, title: &str, items: &[AccessItem]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n## {} ({})\n\n", title, items.len()));
    for item in items {
        out.push_str(&format!("- **{}**\n", item.name));
        if let Some(description) = non_empty(item.description.as_deref()) {
            out.push_str(&format!("  - {}\n", description));
        }
    }
}

pub fn identity_markdown(
    identity: &Identity,
    accounts: &[Account],
    access_profiles: &[AccessItem],
    roles: &[AccessItem],
) -> String {
    let mut fields = vec![
        ("ID", identity.id.clone()),
        ("Display Name", or_na(identity.display_name.as_deref()).to_string()),
        ("Email", or_na(identity.email.as_deref()).to_string()),
        ("First Name", or_na(identity.first_name.as_deref()).to_string()),
        ("Last Name", or_na(identity.last_name.as_deref()).to_string()),
        ("Department", or_na(identity.department.as_deref()).to_string()),
    ];
    if let Some(manager) = &identity.manager {
        fields.push(("Manager", reference(manager.name.as_deref(), manager.id.as_deref())));
    }
    if let Some(source) = &identity.source {
        fields.push(("Source", reference(source.name.as_deref(), source.id.as_deref())));
    }

    let mut md = format!("# Identity: {}\n\n## Basic Information\n\n", identity.name);
    for (label, value) in fields {
        md.push_str(&format!("- **{}**: {}\n", label, value));
    }

    if !accounts.is_empty() {
        md.push_str(&format!("\n## Accounts ({})\n\n", accounts.len()));
        for account in accounts {
            let source = non_empty(account.source_name.as_deref())
                .or_else(|| non_empty(account.source_id.as_deref()))
                .unwrap_or("");
            md.push_str(&format!("- **{}** - {}\n", account.name, source));
            if account.is_disabled() {
                md.push_str("  - Status: DISABLED\n");
            }
        }
    }

    access_section(&mut md, "Access Profiles", access_profiles);
    access_section(&mut md, "Roles", roles);
    md
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn event_block(time: &str, event: &IdentityEvent) -> String {
    let mut lines = vec![
        format!(
            "### {} {} - {} {}\n",
            event.change_type.icon(),
            time,
            event.change_type,
            event.item_type
        ),
        format!("- **Item**: {}", event.item_name),
        format!("- **Action**: {}", event.action),
        format!("- **Actor**: {}", event.actor),
    ];
    if let Some(source) = &event.source {
        lines.push(format!("- **Source**: {}", source));
    }
    lines.push(format!("- **Event Type**: {}", event.event_type));
    if !event.details.is_empty() && event.details != "{}" {
        lines.push(format!("- **Details**: {}", event.details));
    }
    lines.join("\n") + "\n\n"
}

/// Events grouped by UTC day, newest day and newest event first.
pub fn identity_events_detailed(events: &[IdentityEvent]) -> String {
    if events.is_empty() {
        return NO_EVENTS.to_string();
    }
    let mut out = format!(
        "# Identity Access Change History\n\nFound {} events:\n\n",
        events.len()
    );

    let mut by_day: BTreeMap<Option<NaiveDate>, Vec<(Option<DateTime<Utc>>, &IdentityEvent)>> =
        BTreeMap::new();
    for event in events {
        let ts = parse_timestamp(&event.timestamp);
        by_day
            .entry(ts.map(|t| t.date_naive()))
            .or_default()
            .push((ts, event));
    }

    // BTreeMap orders None first; undated events go last.
    let mut days: Vec<_> = by_day.into_iter().collect();
    days.reverse();

    for (day, mut day_events) in days {
        let heading = day
            .map(|d| d.format("%a %b %d %Y").to_string())
            .unwrap_or_else(|| "Unknown date".to_string());
        out.push_str(&format!("## {}\n\n", heading));
        day_events.sort_by(|a, b| b.0.cmp(&a.0));
        for (ts, event) in day_events {
            let time = ts
                .map(|t| t.format("%H:%M:%S UTC").to_string())
                .unwrap_or_else(|| event.timestamp.clone());
            out.push_str(&event_block(&time, event));
        }
    }
    out
}

/// Counts per change type and item type, then one line per event.
pub fn identity_events_summary(events: &[IdentityEvent]) -> String {
    if events.is_empty() {
        return NO_EVENTS.to_string();
    }
    let mut out = format!(
        "# Identity Access Change Summary\n\nFound {} events.\n\n## By change type\n\n",
        events.len()
    );
    for change in [ChangeType::Added, ChangeType::Removed, ChangeType::Modified] {
        let count = events.iter().filter(|e| e.change_type == change).count();
        if count > 0 {
            out.push_str(&format!("- {} {}: {}\n", change.icon(), change, count));
        }
    }

    let mut by_item: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events {
        *by_item.entry(event.item_type.as_str()).or_default() += 1;
    }
    out.push_str("\n## By item type\n\n");
    for (item_type, count) in by_item {
        out.push_str(&format!("- {}: {}\n", item_type, count));
    }

    out.push_str("\n## Events\n\n");
    for event in events {
        out.push_str(&format!(
            "- {} {} {} {} \"{}\" by {}\n",
            event.timestamp,
            event.change_type.icon(),
            event.change_type,
            event.item_type,
            event.item_name,
            event.actor
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reference;

    fn ev(ts: &str, change: ChangeType, name: &str) -> IdentityEvent {
        IdentityEvent {
            timestamp: ts.to_string(),
            event_type: "ROLE_ASSIGNED".to_string(),
            action: "Role Assigned".to_string(),
            item_type: "Role".to_string(),
            item_name: name.to_string(),
            item_id: "r1".to_string(),
            change_type: change,
            actor: "System".to_string(),
            source: None,
            details: "{}".to_string(),
        }
    }

    #[test]
    fn detailed_groups_newest_day_first() {
        let events = vec![
            ev("2024-05-01T09:00:00Z", ChangeType::Added, "Older"),
            ev("2024-05-02T08:00:00Z", ChangeType::Removed, "Early"),
            ev("2024-05-02T18:30:00Z", ChangeType::Modified, "Late"),
        ];
        let out = identity_events_detailed(&events);
        assert!(out.starts_with("# Identity Access Change History\n\nFound 3 events:\n\n"));
        let may2 = out.find("## Thu May 02 2024").expect("may 2 heading");
        let may1 = out.find("## Wed May 01 2024").expect("may 1 heading");
        assert!(may2 < may1);
        let late = out.find("Late").expect("late");
        let early = out.find("Early").expect("early");
        assert!(late < early);
        assert!(out.contains("### \u{274c} 08:00:00 UTC - REMOVED Role"));
        assert!(!out.contains("**Details**"));
    }

    #[test]
    fn empty_event_reports() {
        assert_eq!(identity_events_detailed(&[]), NO_EVENTS);
        assert_eq!(identity_events_summary(&[]), NO_EVENTS);
    }

    #[test]
    fn summary_counts_change_types() {
        let events = vec![
            ev("2024-05-01T09:00:00Z", ChangeType::Added, "A"),
            ev("2024-05-01T10:00:00Z", ChangeType::Added, "B"),
        ];
        let out = identity_events_summary(&events);
        assert!(out.contains("ADDED: 2"));
        assert!(!out.contains("REMOVED:"));
        assert!(out.contains("- Role: 2"));
    }

    #[test]
    fn identity_markdown_lists_sections() {
        let identity = Identity {
            id: "i1".to_string(),
            name: "jdoe".to_string(),
            email: Some("jdoe@example.com".to_string()),
            manager: Some(Reference {
                id: Some("m1".to_string()),
                name: Some("boss".to_string()),
                kind: None,
            }),
            ..Identity::default()
        };
        let accounts = vec![Account {
            name: "jdoe-ad".to_string(),
            source_id: Some("src1".to_string()),
            disabled: Some(true),
            ..Account::default()
        }];
        let roles = vec![AccessItem {
            name: "Auditor".to_string(),
            description: Some("Read-only".to_string()),
            ..AccessItem::default()
        }];
        let md = identity_markdown(&identity, &accounts, &[], &roles);
        assert!(md.starts_with("# Identity: jdoe\n\n## Basic Information\n\n- **ID**: i1\n"));
        assert!(md.contains("- **Display Name**: N/A\n"));
        assert!(md.contains("- **Manager**: boss (m1)\n"));
        assert!(md.contains("## Accounts (1)\n\n- **jdoe-ad** - src1\n  - Status: DISABLED\n"));
        assert!(!md.contains("Access Profiles"));
        assert!(md.contains("## Roles (1)\n\n- **Auditor**\n  - Read-only\n"));
    }
}
