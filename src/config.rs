//! Process configuration, loaded once at startup from the environment.
//!
//! Grounded in `utils/env.py` for the variable names and in the teacher's
//! `config::load_config` for the loader shape: `dotenv().ok()` first, then
//! one `std::env::var` per field, missing required keys surfaced as typed
//! errors rather than `anyhow::Context` (library callers get a
//! `ConfigError`, the binary adds `anyhow::Context` on top at the edge).

use crate::error::ConfigError;

/// One venue-family on-chain address. Missing means "skip that family
/// during sync", per §6: venue addresses are individually optional.
#[derive(Debug, Clone, Default)]
pub struct VenueAddresses {
    pub onedex: Option<String>,
    pub jex_lp_deployer: Option<String>,
    pub vestadex_router: Option<String>,
    pub vestax_staking: Option<String>,
    pub hatom_staking: Option<String>,
    pub hatom_price_feed: Option<String>,
    pub hatom_system_tokens: Option<String>,
    pub xoxno_liquid_staking: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gateway_url: String,
    pub public_gateway_url: String,
    pub redis_host: String,
    pub router_pools_dir: Option<String>,
    pub sc_address_aggregator: String,
    pub venues: VenueAddresses,
    /// When set, the sync worker never starts; the process serves from
    /// whatever snapshot it's handed (used for read-only replicas and
    /// integration tests).
    pub no_tasks: bool,
    pub sync_interval_secs: u64,
    pub sync_lease_ttl_secs: u64,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn truthy(name: &str) -> bool {
    std::env::var(name)
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

fn parse_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidVar { name: name.to_string(), value }),
    }
}

pub fn load_config() -> Result<Config, ConfigError> {
    dotenv::dotenv().ok();

    Ok(Config {
        gateway_url: required("GATEWAY_URL")?,
        public_gateway_url: required("PUBLIC_GATEWAY_URL")?,
        redis_host: required("REDIS_HOST")?,
        router_pools_dir: optional("ROUTER_POOLS_DIR"),
        sc_address_aggregator: required("SC_ADDRESS_AGGREGATOR")?,
        venues: VenueAddresses {
            onedex: optional("SC_ADDRESS_ONEDEX"),
            jex_lp_deployer: optional("SC_ADDRESS_JEX_LP_DEPLOYER"),
            vestadex_router: optional("SC_ADDRESS_VESTADEX_ROUTER"),
            vestax_staking: optional("SC_ADDRESS_VESTAX_STAKING"),
            hatom_staking: optional("SC_ADDRESS_HATOM_STAKING"),
            hatom_price_feed: optional("SC_ADDRESS_HATOM_PRICE_FEED"),
            hatom_system_tokens: optional("SC_ADDRESS_HATOM_SYSTEM_TOKENS"),
            xoxno_liquid_staking: optional("SC_ADDRESS_XOXNO_LIQUID_STAKING"),
        },
        no_tasks: truthy("NO_TASKS"),
        sync_interval_secs: parse_u64("SYNC_INTERVAL_SECS", 30)?,
        sync_lease_ttl_secs: parse_u64("SYNC_LEASE_TTL_SECS", 60)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_required_var_is_a_typed_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("GATEWAY_URL");
        let err = required("GATEWAY_URL").unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(name) if name == "GATEWAY_URL"));
    }

    #[test]
    fn no_tasks_accepts_common_truthy_spellings() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("NO_TASKS", "1");
        assert!(truthy("NO_TASKS"));
        std::env::set_var("NO_TASKS", "false");
        assert!(!truthy("NO_TASKS"));
        std::env::remove_var("NO_TASKS");
    }
}
