pub mod network {
    pub const DEFAULT_BASE_URL: &str = "https://your-tenant.api.identitynow.com";
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const TIMEOUT_TOKEN_REQUEST_MS: u64 = 15_000;
    pub const USER_AGENT: &str = "identitynow-mcp/1.0";
}

pub mod token {
    /// Subtracted from `expires_in` so an about-to-expire token is never handed out.
    pub const EXPIRY_SKEW_SECS: u64 = 60;
    pub const GRANT_TYPE: &str = "client_credentials";
}

pub mod retry {
    pub const MAX_ATTEMPTS: usize = 3;
    pub const BASE_DELAY_MS: u64 = 250;
    pub const MAX_DELAY_MS: u64 = 5_000;
    pub const JITTER: f64 = 0.2;
    pub const STATUS_CODES: &[u16] = &[408, 429, 500, 502, 503, 504];
}

pub mod limits {
    pub const TOOL_SEARCH_LIMIT: usize = 50;
    pub const FILTER_PAGE_SIZE: usize = 250;
    pub const RESOURCE_LIST_LIMIT: usize = 100;
    pub const AUDIT_EVENT_LIMIT: usize = 100;
    pub const IDENTITY_EVENT_LIMIT: usize = 500;
    pub const EXPRESSION_COLUMN_WIDTH: usize = 50;
    pub const LOG_BODY_LENGTH: usize = 2048;
}

pub mod endpoints {
    pub const TOKEN: &str = "/oauth/token";
    pub const SEARCH: &str = "/v2025/search";
    pub const IDENTITIES: &str = "/v2025/identities";
    pub const HISTORICAL_IDENTITIES: &str = "/beta/historical-identities";
    pub const ACCESS_PROFILES: &str = "/v2025/access-profiles";
    pub const ROLES: &str = "/v2025/roles";
    pub const ENTITLEMENTS: &str = "/v2025/entitlements";
    pub const IDENTITY_PROFILES: &str = "/v3/identity-profiles";
}

pub mod events {
    pub const DEFAULT_DAYS_BACK: i64 = 30;
    pub const DEFAULT_EVENT_TYPES: &[&str] = &[
        "ROLE_ASSIGNED",
        "ROLE_REMOVED",
        "ACCESS_PROFILE_ASSIGNED",
        "ACCESS_PROFILE_REMOVED",
        "ENTITLEMENT_ASSIGNED",
        "ENTITLEMENT_REMOVED",
    ];
}

pub mod resources {
    pub const IDENTITY_URI_PREFIX: &str = "sailpoint://identity/";
    pub const MARKDOWN_MIME: &str = "text/markdown";
}
