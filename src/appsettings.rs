use chime_models::settings::Settings;
use config::{Config, ConfigError, Environment, File};

pub fn load() -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name("chime").required(false))
        .add_source(File::with_name("chime.local").required(false))
        .add_source(Environment::with_prefix("CHIME").separator("__"))
        .build()?;

    settings.try_deserialize()
}
