use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;
use shared::domain::Address;
use tracing::warn;

use crate::{amount::NATIVE_DECIMALS, transfer::TokenRegistry};

pub const DEFAULT_SETTINGS_FILE: &str = "dca.toml";
const DEFAULT_ERC20_GAS_LIMIT: u64 = 65_000;

/// A token that moves through a contract call instead of a native transfer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenEntry {
    pub contract: Address,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub wallet_rpc_url: String,
    pub native_symbol: String,
    pub erc20_gas_limit: u64,
    pub tokens: HashMap<String, TokenEntry>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".into(),
            // Sonic Blaze testnet, chain id 57054.
            wallet_rpc_url: "https://rpc.blaze.soniclabs.com".into(),
            native_symbol: "sonic".into(),
            erc20_gas_limit: DEFAULT_ERC20_GAS_LIMIT,
            tokens: HashMap::new(),
        }
    }
}

impl Settings {
    pub fn token_registry(&self) -> TokenRegistry {
        TokenRegistry::new(
            self.native_symbol.clone(),
            NATIVE_DECIMALS,
            self.erc20_gas_limit,
            self.tokens.clone(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    wallet_rpc_url: Option<String>,
    native_symbol: Option<String>,
    erc20_gas_limit: Option<u64>,
    #[serde(default)]
    tokens: HashMap<String, TokenEntry>,
}

/// Defaults, then `dca.toml` from the working directory, then the environment.
pub fn load_settings() -> Settings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => warn!(path = %path.display(), %error, "ignoring unreadable settings file"),
        }
    }

    apply_env(&mut settings, env);
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.wallet_rpc_url {
        settings.wallet_rpc_url = v;
    }
    if let Some(v) = file_cfg.native_symbol {
        settings.native_symbol = v;
    }
    if let Some(v) = file_cfg.erc20_gas_limit {
        settings.erc20_gas_limit = v;
    }
    settings.tokens.extend(
        file_cfg
            .tokens
            .into_iter()
            .map(|(symbol, entry)| (symbol.to_ascii_lowercase(), entry)),
    );
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    // Later keys win, matching the order the web build resolved them in.
    for key in ["NEXT_PUBLIC_API_URL", "DCA_API_URL", "APP__API_URL"] {
        if let Some(v) = env(key) {
            settings.api_url = v;
        }
    }
    for key in ["DCA_WALLET_RPC_URL", "APP__WALLET_RPC_URL"] {
        if let Some(v) = env(key) {
            settings.wallet_rpc_url = v;
        }
    }
    if let Some(v) = env("APP__NATIVE_SYMBOL") {
        settings.native_symbol = v;
    }
    if let Some(v) = env("APP__ERC20_GAS_LIMIT") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.erc20_gas_limit = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric APP__ERC20_GAS_LIMIT"),
        }
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
