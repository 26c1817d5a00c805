use crate::domain::data::{RegionalDirection, Service, ServiceSelector, STATES};
use crate::utils::error::{Result, SigepError};
use crate::utils::validation::{
    digits_only, validate_measure, validate_non_empty_string, validate_range,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Brazilian postal code (CEP), stored as 8 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    pub fn new(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let digits: String = raw.chars().filter(|c| *c != '-').collect();
        let dash_ok = match raw.find('-') {
            None => true,
            Some(pos) => pos == 5 && raw.matches('-').count() == 1,
        };
        if !dash_ok || digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(SigepError::validation(
                "zip_code",
                format!("'{}' is not a valid postal code", raw),
            ));
        }
        Ok(ZipCode(digits))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl FromStr for ZipCode {
    type Err = SigepError;

    fn from_str(s: &str) -> Result<Self> {
        ZipCode::new(s)
    }
}

impl TryFrom<String> for ZipCode {
    type Error = SigepError;

    fn try_from(value: String) -> Result<Self> {
        ZipCode::new(&value)
    }
}

impl From<ZipCode> for String {
    fn from(zip: ZipCode) -> Self {
        zip.0
    }
}

/// Federative unit abbreviation (`SP`, `RJ`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct State(String);

impl State {
    pub fn new(raw: &str) -> Result<Self> {
        let upper = raw.trim().to_ascii_uppercase();
        if STATES.contains(&upper.as_str()) {
            Ok(State(upper))
        } else {
            Err(SigepError::validation(
                "state",
                format!("'{}' is not a Brazilian state", raw),
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phone(String);

impl Phone {
    pub fn new(field: &str, raw: &str) -> Result<Self> {
        digits_only(field, raw, 8, 12).map(Phone)
    }

    pub fn digits(&self) -> &str {
        &self.0
    }
}

/// Input for [`PartyAddress::new`].
///
/// `name`, `street`, `number`, `city`, `state` and `zip_code` are required.
/// The remaining fields default to empty strings and `0.0` coordinates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressFields {
    pub name: String,
    pub street: String,
    pub number: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub complement: String,
    pub neighborhood: String,
    pub phone: String,
    pub cellphone: String,
    pub email: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Sender or receiver of a shipment. Only constructed through [`PartyAddress::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyAddress {
    name: String,
    street: String,
    number: String,
    city: String,
    state: State,
    zip_code: ZipCode,
    complement: Option<String>,
    neighborhood: Option<String>,
    phone: Option<Phone>,
    cellphone: Option<Phone>,
    email: Option<String>,
    latitude: f64,
    longitude: f64,
}

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl PartyAddress {
    pub fn new(fields: AddressFields) -> Result<Self> {
        validate_non_empty_string("name", &fields.name)?;
        validate_non_empty_string("street", &fields.street)?;
        validate_non_empty_string("number", &fields.number)?;
        validate_non_empty_string("city", &fields.city)?;
        let state = State::new(&fields.state)?;
        let zip_code = ZipCode::new(&fields.zip_code)?;

        let phone = optional(fields.phone)
            .map(|p| Phone::new("phone", &p))
            .transpose()?;
        let cellphone = optional(fields.cellphone)
            .map(|p| Phone::new("cellphone", &p))
            .transpose()?;
        let email = optional(fields.email);
        if let Some(email) = &email {
            if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
                return Err(SigepError::validation(
                    "email",
                    format!("'{}' is not an email address", email),
                ));
            }
        }
        validate_range("latitude", fields.latitude, -90.0, 90.0)?;
        validate_range("longitude", fields.longitude, -180.0, 180.0)?;

        Ok(PartyAddress {
            name: fields.name.trim().to_string(),
            street: fields.street.trim().to_string(),
            number: fields.number.trim().to_string(),
            city: fields.city.trim().to_string(),
            state,
            zip_code,
            complement: optional(fields.complement),
            neighborhood: optional(fields.neighborhood),
            phone,
            cellphone,
            email,
            latitude: fields.latitude,
            longitude: fields.longitude,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn zip_code(&self) -> &ZipCode {
        &self.zip_code
    }

    pub fn complement(&self) -> Option<&str> {
        self.complement.as_deref()
    }

    pub fn neighborhood(&self) -> Option<&str> {
        self.neighborhood.as_deref()
    }

    pub fn phone(&self) -> Option<&Phone> {
        self.phone.as_ref()
    }

    pub fn cellphone(&self) -> Option<&Phone> {
        self.cellphone.as_ref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Envelope,
    #[default]
    Box,
    Cylinder,
}

impl PackageType {
    /// Format code used by the carrier (1 envelope, 2 box, 3 cylinder).
    pub fn code(self) -> u8 {
        match self {
            PackageType::Envelope => 1,
            PackageType::Box => 2,
            PackageType::Cylinder => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraService {
    ReceiptNotice,
    OwnHands,
    Registration,
    DeclaredValue,
}

impl ExtraService {
    pub fn code(self) -> u32 {
        match self {
            ExtraService::ReceiptNotice => 1,
            ExtraService::OwnHands => 2,
            ExtraService::DeclaredValue => 19,
            ExtraService::Registration => 25,
        }
    }
}

fn default_sequence() -> (u32, u32) {
    (1, 1)
}

/// Input for [`Package::new`]. `service` is required; everything else has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageFields {
    #[serde(default)]
    pub package_type: PackageType,
    /// Centimetres.
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub diameter: f64,
    /// Grams.
    #[serde(default)]
    pub weight: u32,
    /// `(index, total)` for multi-volume shipments.
    #[serde(default = "default_sequence")]
    pub sequence: (u32, u32),
    #[serde(default)]
    pub service: Option<ServiceSelector>,
    #[serde(default)]
    pub declared_value: f64,
    #[serde(default)]
    pub extra_services: Vec<ExtraService>,
}

impl Default for PackageFields {
    fn default() -> Self {
        PackageFields {
            package_type: PackageType::default(),
            width: 0.0,
            height: 0.0,
            length: 0.0,
            diameter: 0.0,
            weight: 0,
            sequence: default_sequence(),
            service: None,
            declared_value: 0.0,
            extra_services: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Package {
    package_type: PackageType,
    width: f64,
    height: f64,
    length: f64,
    diameter: f64,
    weight: u32,
    sequence: (u32, u32),
    service: Service,
    declared_value: f64,
    extra_services: Vec<ExtraService>,
}

impl Package {
    pub fn new(fields: PackageFields) -> Result<Self> {
        let service = fields
            .service
            .as_ref()
            .ok_or_else(|| SigepError::validation("service", "The package's service is required"))?
            .resolve()?;

        validate_measure("width", fields.width)?;
        validate_measure("height", fields.height)?;
        validate_measure("length", fields.length)?;
        validate_measure("diameter", fields.diameter)?;
        validate_measure("declared_value", fields.declared_value)?;

        let (index, total) = fields.sequence;
        if index == 0 || index > total {
            return Err(SigepError::validation(
                "sequence",
                format!("Volume {} of {} is out of range", index, total),
            ));
        }

        let mut seen = HashSet::new();
        let mut extra_services = fields.extra_services;
        extra_services.retain(|extra| seen.insert(*extra));

        Ok(Package {
            package_type: fields.package_type,
            width: fields.width,
            height: fields.height,
            length: fields.length,
            diameter: fields.diameter,
            weight: fields.weight,
            sequence: fields.sequence,
            service,
            declared_value: fields.declared_value,
            extra_services,
        })
    }

    pub fn package_type(&self) -> PackageType {
        self.package_type
    }

    /// `(width, height, length, diameter)` in centimetres.
    pub fn dimensions(&self) -> (f64, f64, f64, f64) {
        (self.width, self.height, self.length, self.diameter)
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn sequence(&self) -> (u32, u32) {
        self.sequence
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn declared_value(&self) -> f64 {
        self.declared_value
    }

    pub fn extra_services(&self) -> &[ExtraService] {
        &self.extra_services
    }
}

/// Carrier-issued shipment identifier. Never generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingCode(String);

impl TrackingCode {
    pub fn new(raw: &str) -> Result<Self> {
        let code: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SigepError::validation(
                "tracking_code",
                format!("'{}' is not a tracking code", raw),
            ));
        }
        Ok(TrackingCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TrackingCode {
    type Error = SigepError;

    fn try_from(value: String) -> Result<Self> {
        TrackingCode::new(&value)
    }
}

impl From<TrackingCode> for String {
    fn from(code: TrackingCode) -> Self {
        code.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub name: String,
    pub federal_tax_number: String,
}

impl User {
    pub fn new(name: &str, cnpj: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(SigepError::configuration("company.name", "Company name cannot be empty"));
        }
        let federal_tax_number = digits_only("company.cnpj", cnpj, 14, 14).map_err(|_| {
            SigepError::configuration("company.cnpj", format!("'{}' is not a 14 digit CNPJ", cnpj))
        })?;
        Ok(User {
            name: name.trim().to_string(),
            federal_tax_number,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub user: User,
    pub number: String,
    pub regional_direction: RegionalDirection,
}

/// Carrier credential attached to every label and registrar call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingCard {
    pub contract: Contract,
    pub number: String,
    pub administrative_code: String,
}

impl PostingCard {
    pub fn user(&self) -> &User {
        &self.contract.user
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingLabel {
    pub posting_card: PostingCard,
    pub sender: PartyAddress,
    pub receiver: PartyAddress,
    pub service: Service,
    pub tracking_code: TrackingCode,
    pub package: Package,
}

impl ShippingLabel {
    pub fn declared_value(&self) -> f64 {
        self.package.declared_value()
    }

    pub fn extra_services(&self) -> &[ExtraService] {
        self.package.extra_services()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreightResponse {
    pub service: Service,
    /// Estimated delivery time, whole days.
    #[serde(with = "days")]
    pub delivery_time: chrono::Duration,
    pub total: f64,
    #[serde(default)]
    pub declared_value_surcharge: f64,
    #[serde(default)]
    pub home_delivery: bool,
    #[serde(default)]
    pub saturday_delivery: bool,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl FreightResponse {
    pub fn is_error(&self) -> bool {
        self.error_code.as_deref().is_some_and(|c| c != "0")
    }
}

mod days {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &chrono::Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_days())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<chrono::Duration, D::Error> {
        i64::deserialize(deserializer).map(chrono::Duration::days)
    }
}
