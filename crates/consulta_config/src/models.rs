// --- File: crates/consulta_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8086,
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// e.g. `sqlite:data/consulta.db` or `postgres://...`
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level for the `consulta` targets (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are additionally written to a daily rolling file in this directory.
    pub directory: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

// --- Scheduling Config ---
/// Advisor-side scheduling rules shared by availability, reservation and reminders.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulingConfig {
    /// IANA time zone of the advisor, e.g. "Europe/Zurich".
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Earliest bookable day, counted from today in the advisor's time zone.
    #[serde(default = "default_min_lead_days")]
    pub min_lead_days: i64,
    /// Latest bookable day, counted from today in the advisor's time zone.
    #[serde(default = "default_max_lead_days")]
    pub max_lead_days: i64,
    /// Grid on which slot start times are offered.
    #[serde(default = "default_slot_granularity_minutes")]
    pub slot_granularity_minutes: i64,
    #[serde(default)]
    pub buffer_before_minutes: i64,
    #[serde(default)]
    pub buffer_after_minutes: i64,
    /// Metadata tag a payment session must carry to count as an advisory purchase.
    #[serde(default = "default_advisory_product_tag")]
    pub advisory_product_tag: String,
    #[serde(default = "default_payment_lookup_retries")]
    pub payment_lookup_retries: u32,
    #[serde(default = "default_payment_lookup_base_delay_ms")]
    pub payment_lookup_base_delay_ms: u64,
    #[serde(default = "default_cancellation_reason")]
    pub default_cancellation_reason: String,
}

fn default_time_zone() -> String {
    "Europe/Zurich".to_string()
}
fn default_min_lead_days() -> i64 {
    1
}
fn default_max_lead_days() -> i64 {
    60
}
fn default_slot_granularity_minutes() -> i64 {
    30
}
fn default_advisory_product_tag() -> String {
    "advisory".to_string()
}
fn default_payment_lookup_retries() -> u32 {
    3
}
fn default_payment_lookup_base_delay_ms() -> u64 {
    1000
}
fn default_cancellation_reason() -> String {
    "Cancelled by client".to_string()
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            min_lead_days: default_min_lead_days(),
            max_lead_days: default_max_lead_days(),
            slot_granularity_minutes: default_slot_granularity_minutes(),
            buffer_before_minutes: 0,
            buffer_after_minutes: 0,
            advisory_product_tag: default_advisory_product_tag(),
            payment_lookup_retries: default_payment_lookup_retries(),
            payment_lookup_base_delay_ms: default_payment_lookup_base_delay_ms(),
            default_cancellation_reason: default_cancellation_reason(),
        }
    }
}

// --- Plans ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PlanConfig {
    pub id: String,
    pub name: String,
    /// Session length in minutes.
    pub duration_minutes: i64,
    /// Price in the smallest currency unit (e.g., cents).
    pub unit_amount: i64,
    pub currency: Option<String>,
}

// --- Stripe Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StripeConfig {
    /// Usually `secret_from_env`, resolved from STRIPE_SECRET_KEY.
    pub secret_key: String,
    /// Usually `secret_from_env`, resolved from STRIPE_WEBHOOK_SECRET.
    pub webhook_secret: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub portal_return_url: Option<String>,
    pub default_currency: Option<String>,
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

// --- Zoom Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ZoomConfig {
    pub account_id: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_zoom_api_base")]
    pub api_base: String,
    #[serde(default = "default_zoom_oauth_base")]
    pub oauth_base: String,
    /// Host user for created meetings; "me" is the app's own account.
    #[serde(default = "default_zoom_user_id")]
    pub user_id: String,
}

fn default_zoom_api_base() -> String {
    "https://api.zoom.us/v2".to_string()
}
fn default_zoom_oauth_base() -> String {
    "https://zoom.us".to_string()
}
fn default_zoom_user_id() -> String {
    "me".to_string()
}

// --- Google Calendar Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GcalConfig {
    pub key_path: Option<String>,
    pub calendar_id: Option<String>,
    /// Service accounts without domain-wide delegation cannot invite attendees.
    #[serde(default)]
    pub invite_attendees: bool,
}

// --- Mailer Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MailerConfig {
    pub api_key: String,
    pub from_email: String,
    pub from_name: Option<String>,
    #[serde(default = "default_mailer_api_base")]
    pub api_base: String,
}

fn default_mailer_api_base() -> String {
    "https://api.sendgrid.com".to_string()
}

// --- Shared secrets for internal endpoints ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SecurityConfig {
    /// Expected `X-Internal-Auth-Secret` for the reminder sweep trigger.
    pub cron_secret: Option<String>,
    /// Expected `X-Internal-Auth-Secret` for availability administration.
    pub admin_secret: Option<String>,
}

// --- Top-level Application Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub plans: Vec<PlanConfig>,

    #[serde(default)]
    pub use_gcal: bool,

    pub stripe: Option<StripeConfig>,
    pub zoom: Option<ZoomConfig>,
    pub gcal: Option<GcalConfig>,
    pub mailer: Option<MailerConfig>,
    #[serde(default)]
    pub security: SecurityConfig,
}

impl AppConfig {
    /// Looks up a plan by id.
    pub fn plan(&self, plan_id: &str) -> Option<&PlanConfig> {
        self.plans.iter().find(|p| p.id == plan_id)
    }

    /// Returns true when some plan has exactly this session length.
    pub fn has_plan_duration(&self, duration_minutes: i64) -> bool {
        self.plans
            .iter()
            .any(|p| p.duration_minutes == duration_minutes)
    }
}
