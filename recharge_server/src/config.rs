use std::env;

use log::*;
use recharge_engine::payment::PaymentConfig;
use rpg_common::{helpers::parse_key_value_list, Cents};

const DEFAULT_RPG_HOST: &str = "127.0.0.1";
const DEFAULT_RPG_PORT: u16 = 8360;
const DEFAULT_SEED_ACCOUNTS: &str = "13812345678:200";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The SQLite ledger URL. When `None`, the ledger is kept in memory and is lost on shutdown.
    pub database_url: Option<String>,
    /// Payment processing and callback verification settings
    pub payment: PaymentConfig,
    /// Accounts given an opening balance on start-up. Accounts that are already in use are left alone.
    pub seed_accounts: Vec<(String, Cents)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPG_HOST.to_string(),
            port: DEFAULT_RPG_PORT,
            database_url: None,
            payment: PaymentConfig::default(),
            seed_accounts: parse_seed_accounts(DEFAULT_SEED_ACCOUNTS),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("RPG_HOST").ok().unwrap_or_else(|| DEFAULT_RPG_HOST.into());
        let port = env::var("RPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for RPG_PORT. {e} Using the default, {DEFAULT_RPG_PORT}, instead."
                    );
                    DEFAULT_RPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_RPG_PORT);
        let database_url = env::var("RPG_DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
        if database_url.is_none() {
            warn!("🪛️ RPG_DATABASE_URL is not set. Orders and balances will be kept in memory, and lost on shutdown.");
        }
        let payment = PaymentConfig::from_env_or_defaults();
        let seed_accounts = env::var("RPG_SEED_ACCOUNTS").ok().unwrap_or_else(|| {
            info!("🪛️ RPG_SEED_ACCOUNTS is not set. Using the default seed, {DEFAULT_SEED_ACCOUNTS}");
            DEFAULT_SEED_ACCOUNTS.to_string()
        });
        let seed_accounts = parse_seed_accounts(&seed_accounts);
        Self { host, port, database_url, payment, seed_accounts }
    }
}

/// Parses `account:amount` pairs. Pairs with an invalid amount are skipped with a warning.
pub fn parse_seed_accounts(value: &str) -> Vec<(String, Cents)> {
    parse_key_value_list(value)
        .into_iter()
        .filter_map(|(account, amount)| match amount.parse::<Cents>() {
            Ok(amount) => Some((account, amount)),
            Err(e) => {
                warn!("🪛️ Ignoring the seed balance for {account}. {e}");
                None
            },
        })
        .collect()
}
