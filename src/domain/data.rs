//! Static carrier tables: products, regional directions and federative units.

use crate::utils::error::{Result, SigepError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A carrier product, identified by its contract service code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ServiceSelector", into = "u32")]
pub enum Service {
    Pac,
    PacIndustrial,
    Sedex,
    Sedex10,
    Sedex12,
    ESedex,
    SedexIndustrial,
}

struct ServiceEntry {
    service: Service,
    code: u32,
    mnemonic: &'static str,
    description: &'static str,
}

const SERVICES: &[ServiceEntry] = &[
    ServiceEntry { service: Service::Pac, code: 4669, mnemonic: "pac", description: "PAC" },
    ServiceEntry { service: Service::PacIndustrial, code: 4812, mnemonic: "pac-industrial", description: "PAC industrial" },
    ServiceEntry { service: Service::Sedex, code: 4162, mnemonic: "sedex", description: "SEDEX" },
    ServiceEntry { service: Service::Sedex10, code: 40789, mnemonic: "sedex10", description: "SEDEX 10" },
    ServiceEntry { service: Service::Sedex12, code: 40790, mnemonic: "sedex12", description: "SEDEX 12" },
    ServiceEntry { service: Service::ESedex, code: 81019, mnemonic: "esedex", description: "e-SEDEX" },
    ServiceEntry { service: Service::SedexIndustrial, code: 4316, mnemonic: "sedex-industrial", description: "SEDEX industrial" },
];

impl Service {
    pub const STANDARD: Service = Service::Pac;
    pub const EXPRESS: Service = Service::Sedex;
    pub const SAME_DAY: Service = Service::Sedex10;

    fn entry(self) -> &'static ServiceEntry {
        // every variant has exactly one row
        SERVICES
            .iter()
            .find(|e| e.service == self)
            .unwrap_or(&SERVICES[0])
    }

    pub fn all() -> impl Iterator<Item = Service> {
        SERVICES.iter().map(|e| e.service)
    }

    pub fn code(self) -> u32 {
        self.entry().code
    }

    pub fn mnemonic(self) -> &'static str {
        self.entry().mnemonic
    }

    pub fn description(self) -> &'static str {
        self.entry().description
    }

    pub fn from_code(code: u32) -> Result<Service> {
        SERVICES
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.service)
            .ok_or_else(|| SigepError::validation("service", format!("Unknown service code {}", code)))
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:05})", self.description(), self.code())
    }
}

impl FromStr for Service {
    type Err = SigepError;

    /// Accepts a mnemonic (`sedex10`), a symbolic alias (`EXPRESS`, `same_day`)
    /// or a numeric code, zero padded or not (`04162`).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u32>() {
            return Service::from_code(code);
        }
        let wanted = s.to_ascii_lowercase().replace(['_', ' '], "-");
        match wanted.as_str() {
            "standard" => return Ok(Service::STANDARD),
            "express" => return Ok(Service::EXPRESS),
            "same-day" | "sameday" => return Ok(Service::SAME_DAY),
            _ => {}
        }
        SERVICES
            .iter()
            .find(|e| e.mnemonic == wanted || e.mnemonic.replace('-', "") == wanted)
            .map(|e| e.service)
            .ok_or_else(|| SigepError::validation("service", format!("Unknown service '{}'", s)))
    }
}

impl From<Service> for u32 {
    fn from(service: Service) -> Self {
        service.code()
    }
}

/// Any of the accepted ways to name a service before it is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceSelector {
    Code(u32),
    Mnemonic(String),
}

impl ServiceSelector {
    pub fn resolve(&self) -> Result<Service> {
        match self {
            ServiceSelector::Code(code) => Service::from_code(*code),
            ServiceSelector::Mnemonic(name) => name.parse(),
        }
    }
}

impl From<Service> for ServiceSelector {
    fn from(service: Service) -> Self {
        ServiceSelector::Code(service.code())
    }
}

impl From<u32> for ServiceSelector {
    fn from(code: u32) -> Self {
        ServiceSelector::Code(code)
    }
}

impl From<&str> for ServiceSelector {
    fn from(name: &str) -> Self {
        ServiceSelector::Mnemonic(name.to_string())
    }
}

impl From<String> for ServiceSelector {
    fn from(name: String) -> Self {
        ServiceSelector::Mnemonic(name)
    }
}

impl TryFrom<ServiceSelector> for Service {
    type Error = SigepError;

    fn try_from(selector: ServiceSelector) -> Result<Self> {
        selector.resolve()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionalDirection {
    pub number: u32,
    pub code: &'static str,
    pub name: &'static str,
}

pub const REGIONAL_DIRECTIONS: &[RegionalDirection] = &[
    RegionalDirection { number: 1, code: "AC", name: "AC - Administração Central" },
    RegionalDirection { number: 3, code: "ACR", name: "DR - Acre" },
    RegionalDirection { number: 4, code: "AL", name: "DR - Alagoas" },
    RegionalDirection { number: 5, code: "AP", name: "DR - Amapá" },
    RegionalDirection { number: 6, code: "AM", name: "DR - Amazonas" },
    RegionalDirection { number: 8, code: "BA", name: "DR - Bahia" },
    RegionalDirection { number: 10, code: "BSB", name: "DR - Brasília" },
    RegionalDirection { number: 12, code: "CE", name: "DR - Ceará" },
    RegionalDirection { number: 14, code: "ES", name: "DR - Espírito Santo" },
    RegionalDirection { number: 16, code: "GO", name: "DR - Goiás" },
    RegionalDirection { number: 18, code: "MA", name: "DR - Maranhão" },
    RegionalDirection { number: 20, code: "MG", name: "DR - Minas Gerais" },
    RegionalDirection { number: 22, code: "MS", name: "DR - Mato Grosso do Sul" },
    RegionalDirection { number: 24, code: "MT", name: "DR - Mato Grosso" },
    RegionalDirection { number: 26, code: "RO", name: "DR - Rondônia" },
    RegionalDirection { number: 28, code: "PA", name: "DR - Pará" },
    RegionalDirection { number: 30, code: "PB", name: "DR - Paraíba" },
    RegionalDirection { number: 32, code: "PE", name: "DR - Pernambuco" },
    RegionalDirection { number: 34, code: "PI", name: "DR - Piauí" },
    RegionalDirection { number: 36, code: "PR", name: "DR - Paraná" },
    RegionalDirection { number: 50, code: "RJ", name: "DR - Rio de Janeiro" },
    RegionalDirection { number: 60, code: "RN", name: "DR - Rio Grande do Norte" },
    RegionalDirection { number: 64, code: "RS", name: "DR - Rio Grande do Sul" },
    RegionalDirection { number: 65, code: "RR", name: "DR - Roraima" },
    RegionalDirection { number: 68, code: "SC", name: "DR - Santa Catarina" },
    RegionalDirection { number: 70, code: "SE", name: "DR - Sergipe" },
    RegionalDirection { number: 72, code: "SPM", name: "DR - São Paulo Metropolitana" },
    RegionalDirection { number: 74, code: "SPI", name: "DR - São Paulo Interior" },
    RegionalDirection { number: 75, code: "TO", name: "DR - Tocantins" },
];

impl RegionalDirection {
    pub fn by_number(number: u32) -> Result<RegionalDirection> {
        Self::single(
            REGIONAL_DIRECTIONS.iter().filter(|rd| rd.number == number),
            &number.to_string(),
        )
    }

    /// Code lookup is case-insensitive and must match exactly one entry.
    pub fn by_code(code: &str) -> Result<RegionalDirection> {
        let code = code.trim();
        Self::single(
            REGIONAL_DIRECTIONS
                .iter()
                .filter(|rd| rd.code.eq_ignore_ascii_case(code)),
            code,
        )
    }

    fn single<'a>(
        mut matches: impl Iterator<Item = &'a RegionalDirection>,
        wanted: &str,
    ) -> Result<RegionalDirection> {
        match (matches.next(), matches.next()) {
            (Some(rd), None) => Ok(*rd),
            (None, _) => Err(SigepError::configuration(
                "contract.regional_direction",
                format!("Unknown regional direction '{}'", wanted),
            )),
            (Some(_), Some(_)) => Err(SigepError::configuration(
                "contract.regional_direction",
                format!("Ambiguous regional direction '{}'", wanted),
            )),
        }
    }
}

pub const STATES: &[&str] = &[
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA", "MG", "MS", "MT", "PA", "PB",
    "PE", "PI", "PR", "RJ", "RN", "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];
