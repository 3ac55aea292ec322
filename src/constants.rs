//! Configuration keys, defaults and fixed strings

// Environment keys
pub const ENV_AUTH_URL: &str = "HIT_AUTH_URL";
pub const ENV_AUTH_PUBLIC_URL: &str = "HIT_AUTH_PUBLIC_URL";
pub const ENV_SERVICE_TOKEN: &str = "HIT_SERVICE_TOKEN";
pub const ENV_READ_POLICY: &str = "HIT_PROJECTS_READ_POLICY";
pub const ENV_AUTH_TIMEOUT_MS: &str = "HIT_AUTH_TIMEOUT_MS";
pub const ENV_DB_PATH: &str = "PROJGRANT_DB";
pub const ENV_PORT: &str = "PORT";

// Defaults
pub const DEFAULT_AUTH_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_DB_PATH: &str = "./data/projgrant.mdb";
pub const DEFAULT_PORT: u16 = 3000;

/// Global role flag that bypasses project grants
pub const ADMIN_ROLE: &str = "admin";

/// Header carrying the service-to-service credential on identity lookups
pub const SERVICE_TOKEN_HEADER: &str = "X-Service-Token";

// Decision reasons, used verbatim as HTTP error bodies
pub const REASON_UNAUTHORIZED: &str = "Unauthorized";
pub const REASON_FORBIDDEN: &str = "Forbidden";

pub const STATUS_OK: u16 = 200;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_FORBIDDEN: u16 = 403;

// Gateway headers carrying the authenticated principal to the server
pub const HEADER_PRINCIPAL_ID: &str = "x-principal-id";
pub const HEADER_PRINCIPAL_ROLES: &str = "x-principal-roles";
pub const HEADER_PRINCIPAL_GROUPS: &str = "x-principal-groups";
