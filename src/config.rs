use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub provider: ProviderSettings,
    pub relay: RelaySettings,
    pub topup: TopupSettings,
    pub application: ApplicationSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub pool_size: u32,
    pub connect_timeout_secs: u64,
}

/// Payment provider endpoint and credentials. The private key signs
/// callbacks; the API key authenticates outbound calls.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    pub private_key: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    pub port: u16,
    pub destination_url: String,
    pub forward_timeout_secs: u64,
}

/// Fee estimate applied when a top-up is created. The provider reports the
/// actual deduction through `amount_received` on the callback.
#[derive(Debug, Clone, Deserialize)]
pub struct TopupSettings {
    pub flat_fee: i64,
    pub fee_basis_points: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: String,
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        builder.build()?.try_deserialize()
    }
}
