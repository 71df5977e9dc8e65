//! Entities and closed enumerations of the pickup point domain.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ParcelId, PickupPointId, ReceptionId};

/// Error returned when a string is not a member of one of the closed sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}', expected one of: {expected}")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Cities a pickup point may be registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    #[serde(rename = "Москва")]
    Moscow,
    #[serde(rename = "Санкт-Петербург")]
    SaintPetersburg,
    #[serde(rename = "Казань")]
    Kazan,
}

impl City {
    pub const ALL: [City; 3] = [City::Moscow, City::SaintPetersburg, City::Kazan];

    /// Returns the canonical (stored and wire) name of the city.
    pub fn as_str(&self) -> &'static str {
        match self {
            City::Moscow => "Москва",
            City::SaintPetersburg => "Санкт-Петербург",
            City::Kazan => "Казань",
        }
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for City {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        City::ALL
            .into_iter()
            .find(|city| city.as_str() == s.trim())
            .ok_or_else(|| ParseVariantError {
                kind: "city",
                value: s.to_string(),
                expected: "Москва, Санкт-Петербург, Казань",
            })
    }
}

/// Category of a parcel accepted during a reception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParcelType {
    #[serde(rename = "электроника", alias = "electronics")]
    Electronics,
    #[serde(rename = "одежда", alias = "clothing")]
    Clothing,
    #[serde(rename = "обувь", alias = "footwear")]
    Footwear,
}

impl ParcelType {
    pub const ALL: [ParcelType; 3] = [
        ParcelType::Electronics,
        ParcelType::Clothing,
        ParcelType::Footwear,
    ];

    /// Returns the canonical (stored and wire) name of the parcel type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelType::Electronics => "электроника",
            ParcelType::Clothing => "одежда",
            ParcelType::Footwear => "обувь",
        }
    }

    fn alias(&self) -> &'static str {
        match self {
            ParcelType::Electronics => "electronics",
            ParcelType::Clothing => "clothing",
            ParcelType::Footwear => "footwear",
        }
    }
}

impl std::fmt::Display for ParcelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParcelType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ParcelType::ALL
            .into_iter()
            .find(|t| t.as_str() == needle || t.alias() == needle)
            .ok_or_else(|| ParseVariantError {
                kind: "parcel type",
                value: s.to_string(),
                expected: "электроника, одежда, обувь",
            })
    }
}

/// Role of an authenticated operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Moderator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Moderator => "moderator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "employee" => Ok(Role::Employee),
            "moderator" => Ok(Role::Moderator),
            _ => Err(ParseVariantError {
                kind: "role",
                value: s.to_string(),
                expected: "employee, moderator",
            }),
        }
    }
}

/// Status of a reception.
///
/// A reception only ever moves from `InProgress` to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceptionStatus {
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "close")]
    Closed,
}

impl ReceptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptionStatus::InProgress => "in_progress",
            ReceptionStatus::Closed => "close",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ReceptionStatus::InProgress)
    }
}

impl std::fmt::Display for ReceptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceptionStatus {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ReceptionStatus::InProgress),
            "close" => Ok(ReceptionStatus::Closed),
            _ => Err(ParseVariantError {
                kind: "reception status",
                value: s.to_string(),
                expected: "in_progress, close",
            }),
        }
    }
}

/// A registered pickup point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupPoint {
    pub id: PickupPointId,
    #[serde(rename = "registrationDate")]
    pub registered_at: DateTime<Utc>,
    pub city: City,
}

/// An intake session at a pickup point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reception {
    pub id: ReceptionId,
    #[serde(rename = "dateTime")]
    pub opened_at: DateTime<Utc>,
    #[serde(rename = "pvzId")]
    pub pickup_point_id: PickupPointId,
    pub status: ReceptionStatus,
}

impl Reception {
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

/// A parcel logged against a reception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    pub id: ParcelId,
    #[serde(rename = "dateTime")]
    pub added_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub parcel_type: ParcelType,
    pub reception_id: ReceptionId,
}
