use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

fn temp_settings_file(label: &str, contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("dca_settings_{label}_{suffix}.toml"));
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn missing_file_keeps_defaults() {
    let settings = load_settings_from(Path::new("./does-not-exist/dca.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.api_url, "http://localhost:3000");
}

#[test]
fn file_values_override_defaults_and_tokens_are_lowercased() {
    let path = temp_settings_file(
        "file",
        r#"
api_url = "http://backend.internal:4000"
erc20_gas_limit = 90000

[tokens.USDC]
contract = "0x29219dd400f2bf60e5a23d13be72b486d4038894"
decimals = 6
"#,
    );

    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings.api_url, "http://backend.internal:4000");
    assert_eq!(settings.erc20_gas_limit, 90_000);
    assert_eq!(settings.tokens.get("usdc").map(|t| t.decimals), Some(6));
    assert_eq!(settings.wallet_rpc_url, Settings::default().wallet_rpc_url);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn environment_overrides_file_and_app_prefix_wins() {
    let path = temp_settings_file("env", "api_url = \"http://from-file:1\"\n");

    let settings = load_settings_from(&path, |key| match key {
        "NEXT_PUBLIC_API_URL" => Some("http://next-public:2".to_string()),
        "APP__API_URL" => Some("http://app:3".to_string()),
        "APP__WALLET_RPC_URL" => Some("http://127.0.0.1:8545".to_string()),
        _ => None,
    });
    assert_eq!(settings.api_url, "http://app:3");
    assert_eq!(settings.wallet_rpc_url, "http://127.0.0.1:8545");

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn malformed_gas_limit_is_ignored() {
    let settings = load_settings_from(Path::new("./does-not-exist/dca.toml"), |key| {
        (key == "APP__ERC20_GAS_LIMIT").then(|| "lots".to_string())
    });
    assert_eq!(settings.erc20_gas_limit, 65_000);
}

#[test]
fn unreadable_file_falls_back_to_defaults() {
    let path = temp_settings_file("broken", "api_url = [not toml");
    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings.api_url, "http://localhost:3000");
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn default_native_symbol_is_the_plan_form_token() {
    let mut settings = Settings::default();
    assert_eq!(settings.native_symbol, "sonic");
    settings.tokens.insert(
        "SONIC".into(),
        TokenEntry {
            contract: Address::from("0x29219dd400f2bf60e5a23d13be72b486d4038894"),
            decimals: 6,
        },
    );

    let registry = settings.token_registry();
    assert_eq!(
        registry.resolve(Some("SONIC")),
        crate::transfer::TransferKind::Native { decimals: 18 }
    );
}
