use tracing::warn;

pub const MEMBER_VAR: &str = "SHOP_DEMO_MEMBER";
pub const CITY_VAR: &str = "SHOP_DEMO_CITY";

const DEFAULT_MEMBER: &str = "userA";
const DEFAULT_CITY: &str = "Seoul";

/// Settings for the demo run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub member_name: String,
    pub city: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            member_name: DEFAULT_MEMBER.to_string(),
            city: DEFAULT_CITY.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            member_name: read_var(MEMBER_VAR, DEFAULT_MEMBER),
            city: read_var(CITY_VAR, DEFAULT_CITY),
        }
    }
}

fn read_var(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => {
            warn!("{name} not set; using default {default:?}");
            default.to_string()
        }
    }
}
