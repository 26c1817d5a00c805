use crate::domain::data::RegionalDirection;
use crate::domain::model::{Contract, PostingCard, User};
use crate::domain::ports::LayoutOptions;
use crate::utils::error::{Result, SigepError};
use crate::utils::validation::{digits_only, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub credentials: CredentialsConfig,
    pub company: CompanyConfig,
    pub contract: ContractConfig,
    pub registrar: RegistrarConfig,
    pub layout: Option<LayoutOptions>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyConfig {
    pub name: String,
    pub cnpj: String,
}

/// Regional direction as written in the config: table number or code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionalDirectionRef {
    Number(u32),
    Code(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    pub number: String,
    pub regional_direction: RegionalDirectionRef,
    pub posting_card: String,
    pub admin_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<LogFormat>,
    pub verbose: Option<bool>,
}

impl SessionConfig {
    /// Loads a session configuration file, expanding `${VAR}` placeholders first.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SigepError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| {
            SigepError::configuration("toml_parsing", format!("TOML parsing error: {}", e))
        })
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("registrar.endpoint", &self.registrar.endpoint)?;

        if self.credentials.username.trim().is_empty() {
            return Err(SigepError::configuration(
                "credentials.username",
                "Username cannot be empty",
            ));
        }
        if self.credentials.password.is_empty() {
            return Err(SigepError::configuration(
                "credentials.password",
                "Password cannot be empty",
            ));
        }
        if let Some(0) = self.registrar.timeout_seconds {
            return Err(SigepError::configuration(
                "registrar.timeout_seconds",
                "Timeout must be at least one second",
            ));
        }

        for (field, value) in [
            ("contract.number", &self.contract.number),
            ("contract.posting_card", &self.contract.posting_card),
            ("contract.admin_code", &self.contract.admin_code),
        ] {
            digits_only(field, value, 1, 12).map_err(|_| {
                SigepError::configuration(field, format!("'{}' must be a numeric code", value))
            })?;
        }

        self.regional_direction()?;
        self.user()?;
        Ok(())
    }

    pub fn regional_direction(&self) -> Result<RegionalDirection> {
        match &self.contract.regional_direction {
            RegionalDirectionRef::Number(number) => RegionalDirection::by_number(*number),
            RegionalDirectionRef::Code(code) => match code.trim().parse::<u32>() {
                Ok(number) => RegionalDirection::by_number(number),
                Err(_) => RegionalDirection::by_code(code),
            },
        }
    }

    pub fn user(&self) -> Result<User> {
        User::new(&self.company.name, &self.company.cnpj)
    }

    pub fn posting_card(&self) -> Result<PostingCard> {
        let contract = Contract {
            user: self.user()?,
            number: self.contract.number.trim().to_string(),
            regional_direction: self.regional_direction()?,
        };
        Ok(PostingCard {
            contract,
            number: self.contract.posting_card.trim().to_string(),
            administrative_code: self.contract.admin_code.trim().to_string(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.registrar
                .timeout_seconds
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        )
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging
            .as_ref()
            .and_then(|l| l.format)
            .unwrap_or_default()
    }

    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }
}

impl Validate for SessionConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// Replaces `${VAR}` with the environment value; unknown variables are left as written.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
        SigepError::configuration("environment", format!("Invalid substitution pattern: {}", e))
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}
