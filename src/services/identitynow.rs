use crate::constants::{endpoints, events as event_defaults, limits};
use crate::errors::{IdentityNowError, ToolError};
use crate::models::{AccessItem, Account, AuditEvent, Entitlement, Identity, IdentityEvent, IdentityProfile};
use crate::services::api_client::ApiClient;
use crate::services::events::classify;
use crate::services::filters;
use crate::services::logger::Logger;
use crate::utils::text::non_empty;
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

const IDENTITY_SEARCH_FIELDS: &[&str] = &[
    "id",
    "name",
    "email",
    "displayName",
    "firstName",
    "lastName",
    "manager",
    "department",
    "source",
];

/// Parameters of an `events` index search. Every field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub identity_id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub event_types: Vec<String>,
    pub limit: Option<usize>,
}

impl AuditQuery {
    pub fn search_body(&self) -> Value {
        let mut must: Vec<Value> = Vec::new();
        if let Some(id) = non_empty(self.identity_id.as_deref()) {
            must.push(json!({ "term": { "target.id": id } }));
        }
        if let Some(start) = non_empty(self.start.as_deref()) {
            must.push(json!({ "range": { "created": { "gte": start } } }));
        }
        if let Some(end) = non_empty(self.end.as_deref()) {
            must.push(json!({ "range": { "created": { "lte": end } } }));
        }
        if !self.event_types.is_empty() {
            must.push(json!({ "terms": { "type": self.event_types } }));
        }
        json!({
            "indices": ["events"],
            "query": { "bool": { "must": must } },
            "sort": [{ "created": { "order": "desc" } }]
        })
    }
}

fn text_query(query: Option<&str>) -> Option<Value> {
    non_empty(query).map(|q| json!({ "query": q }))
}

/// Start of a window reaching `days_back` days before `end`, if representable.
pub fn lookback_start(end: DateTime<Utc>, days_back: u32) -> Option<DateTime<Utc>> {
    ChronoDuration::try_days(i64::from(days_back)).and_then(|span| end.checked_sub_signed(span))
}

fn truncate<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.truncate(limit);
    items
}

/// One function per tenant resource. All calls go through the shared
/// authenticated dispatcher.
pub struct IdentityNowService {
    logger: Logger,
    api: Arc<ApiClient>,
}

impl IdentityNowService {
    pub fn new(logger: Logger, api: Arc<ApiClient>) -> Self {
        Self {
            logger: logger.child("identitynow"),
            api,
        }
    }

    pub async fn search_identities(
        &self,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Identity>, IdentityNowError> {
        let mut body = json!({
            "indices": ["identities"],
            "sort": ["name"],
            "queryResultFilter": { "includes": IDENTITY_SEARCH_FIELDS },
        });
        if let Some(q) = text_query(query) {
            body["query"] = q;
        }
        let results: Vec<Identity> = self.api.post(endpoints::SEARCH, &body).await?;
        Ok(truncate(results, limit))
    }

    pub async fn get_identity(&self, id: &str) -> Result<Identity, IdentityNowError> {
        self.api
            .get(&format!("{}/{}", endpoints::IDENTITIES, id))
            .await
    }

    fn access_items_path(id: &str, kind: &str) -> String {
        format!(
            "{}/{}/access-items?type={}",
            endpoints::HISTORICAL_IDENTITIES,
            id,
            kind
        )
    }

    pub async fn get_identity_accounts(&self, id: &str) -> Result<Vec<Account>, IdentityNowError> {
        self.api.get(&Self::access_items_path(id, "account")).await
    }

    pub async fn get_identity_access_profiles(
        &self,
        id: &str,
    ) -> Result<Vec<AccessItem>, IdentityNowError> {
        self.api
            .get(&Self::access_items_path(id, "access-profile"))
            .await
    }

    pub async fn get_identity_roles(&self, id: &str) -> Result<Vec<AccessItem>, IdentityNowError> {
        self.api.get(&Self::access_items_path(id, "role")).await
    }

    pub async fn search_accounts(
        &self,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Account>, IdentityNowError> {
        let mut body = json!({ "indices": ["accounts"], "sort": ["name"] });
        if let Some(q) = text_query(query) {
            body["query"] = q;
        }
        let results: Vec<Account> = self.api.post(endpoints::SEARCH, &body).await?;
        Ok(truncate(results, limit))
    }

    pub async fn search_access_profiles(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<AccessItem>, IdentityNowError> {
        let path = filters::with_query(
            endpoints::ACCESS_PROFILES,
            filters::name_contains(query).as_deref(),
            Some(limits::FILTER_PAGE_SIZE),
        );
        self.api.get(&path).await
    }

    pub async fn search_roles(&self, query: Option<&str>) -> Result<Vec<AccessItem>, IdentityNowError> {
        let path = filters::with_query(
            endpoints::ROLES,
            filters::name_contains(query).as_deref(),
            Some(limits::FILTER_PAGE_SIZE),
        );
        self.api.get(&path).await
    }

    pub async fn search_entitlements(
        &self,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Entitlement>, IdentityNowError> {
        let path = filters::with_query(
            endpoints::ENTITLEMENTS,
            filters::name_contains(query).as_deref(),
            Some(limit),
        );
        self.api.get(&path).await
    }

    pub async fn get_entitlement(&self, id: &str) -> Result<Entitlement, IdentityNowError> {
        self.api
            .get(&format!("{}/{}", endpoints::ENTITLEMENTS, id))
            .await
    }

    pub async fn search_entitlements_by_source(
        &self,
        source_id: &str,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Entitlement>, IdentityNowError> {
        let filter = filters::source_entitlements(source_id, query);
        let path = filters::with_query(endpoints::ENTITLEMENTS, Some(&filter), Some(limit));
        self.api.get(&path).await
    }

    pub async fn get_identity_profiles(&self) -> Result<Vec<IdentityProfile>, IdentityNowError> {
        self.api.get(endpoints::IDENTITY_PROFILES).await
    }

    pub async fn get_identity_profile(&self, id: &str) -> Result<IdentityProfile, IdentityNowError> {
        self.api
            .get(&format!("{}/{}", endpoints::IDENTITY_PROFILES, id))
            .await
    }

    /// Case-insensitive substring match on name or description.
    pub async fn search_identity_profiles(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<IdentityProfile>, IdentityNowError> {
        let profiles = self.get_identity_profiles().await?;
        let Some(needle) = non_empty(query).map(str::to_lowercase) else {
            return Ok(profiles);
        };
        Ok(profiles
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p
                        .description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .collect())
    }

    pub async fn search_audit_events(
        &self,
        query: &AuditQuery,
    ) -> Result<Vec<AuditEvent>, IdentityNowError> {
        let results: Vec<AuditEvent> = self
            .api
            .post(endpoints::SEARCH, &query.search_body())
            .await?;
        Ok(truncate(
            results,
            query.limit.unwrap_or(limits::AUDIT_EVENT_LIMIT),
        ))
    }

    /// Access changes on one identity over the trailing `days_back` days.
    pub async fn get_identity_events(
        &self,
        identity_id: &str,
        days_back: u32,
        event_types: Option<Vec<String>>,
    ) -> Result<Vec<IdentityEvent>, ToolError> {
        let end = Utc::now();
        let start = lookback_start(end, days_back)
            .ok_or_else(|| ToolError::invalid_params("days_back is too large"))?;
        let event_types = event_types.filter(|t| !t.is_empty()).unwrap_or_else(|| {
            event_defaults::DEFAULT_EVENT_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect()
        });
        let query = AuditQuery {
            identity_id: Some(identity_id.to_string()),
            start: Some(start.to_rfc3339_opts(SecondsFormat::Millis, true)),
            end: Some(end.to_rfc3339_opts(SecondsFormat::Millis, true)),
            event_types,
            limit: Some(limits::IDENTITY_EVENT_LIMIT),
        };
        let raw = self.search_audit_events(&query).await?;
        let events = classify(&raw);
        self.logger.debug(
            "classified identity events",
            Some(&json!({ "raw": raw.len(), "kept": events.len() })),
        );
        Ok(events)
    }

    pub async fn test_connectivity(&self) -> Result<(), IdentityNowError> {
        let path = filters::with_query(endpoints::IDENTITY_PROFILES, None, Some(1));
        let _: Value = self.api.get(&path).await?;
        self.logger.info("connectivity check passed", None);
        Ok(())
    }
}
