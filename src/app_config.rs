use std::{collections::HashMap, env, time::Duration};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    commands::Settings,
    domain::benefit::{BenefitRules, FlatDiscount, PercentageDiscount},
};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub passes: PassConfig,
    pub notifications: NotificationConfig,
    /// Benefit rule per booking type
    #[serde(default)]
    pub benefits: HashMap<String, BenefitConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PassConfig {
    #[serde(default = "default_duration_days")]
    pub default_duration_days: u32,
    #[serde(default = "default_allow_overlapping")]
    pub allow_overlapping: bool,
    #[serde(default = "default_max_renew_attempts")]
    pub max_renew_attempts: u32,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            default_duration_days: default_duration_days(),
            allow_overlapping: default_allow_overlapping(),
            max_renew_attempts: default_max_renew_attempts(),
        }
    }
}

fn default_duration_days() -> u32 {
    30
}

fn default_allow_overlapping() -> bool {
    true
}

fn default_max_renew_attempts() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub from_address: String,
    /// Bound for one call to the email transport or the pass store
    pub timeout_ms: u64,
}

/// Either a percentage or a flat amount off
#[derive(Debug, Deserialize, Clone)]
pub struct BenefitConfig {
    pub percent: Option<Decimal>,
    pub flat: Option<Decimal>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file, this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `PASS_SERVER__PORT=9000` would set `server.port`
            .add_source(config::Environment::with_prefix("PASS").separator("__"));

        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            port_timeout: Duration::from_millis(self.notifications.timeout_ms),
            allow_overlapping_passes: self.passes.allow_overlapping,
            max_renew_attempts: self.passes.max_renew_attempts,
        }
    }

    /// Build the benefit registry, rejecting rules that are missing or out of range
    pub fn benefit_rules(&self) -> Result<BenefitRules, ConfigError> {
        self.benefits
            .iter()
            .try_fold(BenefitRules::empty(), |rules, (booking_type, rule)| {
                match (rule.percent, rule.flat) {
                    (Some(percent), None) => PercentageDiscount::new(percent)
                        .map(|discount| rules.with_rule(booking_type, discount))
                        .ok_or_else(|| {
                            ConfigError::Message(format!(
                                "benefits.{booking_type}.percent must be between 0 and 100"
                            ))
                        }),
                    (None, Some(flat)) => FlatDiscount::new(flat)
                        .map(|discount| rules.with_rule(booking_type, discount))
                        .ok_or_else(|| {
                            ConfigError::Message(format!(
                                "benefits.{booking_type}.flat cannot be negative"
                            ))
                        }),
                    _ => Err(ConfigError::Message(format!(
                        "benefits.{booking_type} needs exactly one of `percent` or `flat`"
                    ))),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{booking::BookingCandidate, PassStatus};
    use config::{File, FileFormat};
    use speculoos::prelude::*;

    fn parse(toml: &str) -> Result<Config, ConfigError> {
        Config::build(config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    const BASE: &str = r#"
        [server]
        port = 8080

        [notifications]
        from_address = "noreply@example.com"
        timeout_ms = 250
    "#;

    #[test]
    fn test_defaults() {
        let config = parse(BASE).unwrap();

        assert_that!(config.passes.default_duration_days).is_equal_to(30);
        assert_that!(config.passes.allow_overlapping).is_true();
        assert_that!(config.settings().port_timeout).is_equal_to(Duration::from_millis(250));
        assert_that!(config.benefit_rules().unwrap().is_empty()).is_true();
    }

    #[test]
    fn test_default_file() {
        let config = Config::build(
            config::Config::builder().add_source(File::from_str(
                include_str!("../config/default.toml"),
                FileFormat::Toml,
            )),
        )
        .unwrap();
        let rules = config.benefit_rules().unwrap();
        let candidate = BookingCandidate::new(Some("play"), Decimal::new(1000, 0)).unwrap();

        let res = rules.apply(PassStatus::Active, &candidate);

        assert_that!(res.total_amount).is_equal_to(Decimal::new(800, 0));
    }

    #[test]
    fn test_flat_rule() {
        let config = parse(&format!("{BASE}\n[benefits.dining]\nflat = 150\n")).unwrap();
        let rules = config.benefit_rules().unwrap();
        let candidate = BookingCandidate::new(Some("dining"), Decimal::new(1000, 0)).unwrap();

        let res = rules.apply(PassStatus::Active, &candidate);

        assert_that!(res.savings_amount).is_equal_to(Decimal::new(150, 0));
    }

    #[test]
    fn test_invalid_rules() {
        let too_much = parse(&format!("{BASE}\n[benefits.play]\npercent = 120\n")).unwrap();
        let both = parse(&format!("{BASE}\n[benefits.play]\npercent = 10\nflat = 5\n")).unwrap();

        assert_that!(too_much.benefit_rules()).is_err();
        assert_that!(both.benefit_rules()).is_err();
    }
}
