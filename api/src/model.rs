// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! High-level data types.

use derive_getters::Getters;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt::Write;
use time::OffsetDateTime;
use vehicle_world_core::model::{ModelError, ModelResult};

/// Length of the textual representation of a `VehicleId`.
const VEHICLE_ID_LENGTH: usize = 24;

/// Identifier of a vehicle, represented as 24 lowercase hexadecimal characters.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String")]
pub(crate) struct VehicleId(String);

impl VehicleId {
    /// Creates a new identifier from an untrusted string, accepting hex digits in any case.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.len() != VEHICLE_ID_LENGTH {
            return Err(ModelError(format!(
                "Vehicle identifier must have {} characters but has {}",
                VEHICLE_ID_LENGTH,
                s.len()
            )));
        }
        if !s.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ModelError(format!(
                "Vehicle identifier '{}' contains non-hexadecimal characters",
                s
            )));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Generates a new identifier for a vehicle created at `now`.
    ///
    /// The identifier packs the low 32 bits of the Unix timestamp in big-endian order followed by
    /// 8 random bytes, so identifiers generated later sort after earlier ones at the granularity of
    /// seconds.
    pub(crate) fn generate(now: OffsetDateTime) -> Self {
        let secs = now.unix_timestamp() as u32;
        let suffix = rand::random::<[u8; 8]>();

        let mut s = String::with_capacity(VEHICLE_ID_LENGTH);
        for byte in secs.to_be_bytes().iter().chain(suffix.iter()) {
            write!(s, "{:02x}", byte).expect("Writing to a String cannot fail");
        }
        Self(s)
    }

    /// Returns the string representation of the identifier.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VehicleId {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        VehicleId::new(value)
    }
}

/// The attributes of a vehicle as supplied by clients on creation.
#[derive(Clone, Constructor, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub(crate) struct VehicleFields {
    /// Name of the company that built the vehicle.
    manufacturer: String,

    /// Commercial name of the vehicle.
    model: String,

    /// Kind of fuel the vehicle runs on.
    fuel: String,

    /// Body style of the vehicle.
    #[serde(rename = "type")]
    kind: String,

    /// Paint color.
    color: String,

    /// Vehicle Identification Number.
    #[serde(rename = "VIN")]
    vin: String,

    /// Vehicle Registration Mark.
    #[serde(rename = "VRM")]
    vrm: String,

    /// Whether the vehicle had previous owners.
    used: bool,

    /// Year of the model, which clients may send as any JSON number.
    #[serde(rename = "modelYear")]
    model_year: Number,
}

/// A partial modification to the attributes of a vehicle.
///
/// Absent fields are left untouched and are omitted when serializing the patch.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub(crate) struct VehiclePatch {
    /// New manufacturer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) manufacturer: Option<String>,

    /// New model, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) model: Option<String>,

    /// New fuel, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) fuel: Option<String>,

    /// New type, if any.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub(crate) kind: Option<String>,

    /// New color, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) color: Option<String>,

    /// New VIN, if any.
    #[serde(rename = "VIN", skip_serializing_if = "Option::is_none")]
    pub(crate) vin: Option<String>,

    /// New VRM, if any.
    #[serde(rename = "VRM", skip_serializing_if = "Option::is_none")]
    pub(crate) vrm: Option<String>,

    /// New used flag, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) used: Option<bool>,

    /// New model year, if any.
    #[serde(rename = "modelYear", skip_serializing_if = "Option::is_none")]
    pub(crate) model_year: Option<Number>,
}

impl VehiclePatch {
    /// Applies this patch on top of `fields`.
    #[cfg(test)]
    pub(crate) fn apply(self, mut fields: VehicleFields) -> VehicleFields {
        fields.manufacturer = self.manufacturer.unwrap_or(fields.manufacturer);
        fields.model = self.model.unwrap_or(fields.model);
        fields.fuel = self.fuel.unwrap_or(fields.fuel);
        fields.kind = self.kind.unwrap_or(fields.kind);
        fields.color = self.color.unwrap_or(fields.color);
        fields.vin = self.vin.unwrap_or(fields.vin);
        fields.vrm = self.vrm.unwrap_or(fields.vrm);
        fields.used = self.used.unwrap_or(fields.used);
        fields.model_year = self.model_year.unwrap_or(fields.model_year);
        fields
    }
}

/// A stored vehicle, as returned to clients.
#[derive(Clone, Constructor, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub(crate) struct Vehicle {
    /// Identifier assigned on creation.
    #[serde(rename = "_id")]
    id: VehicleId,

    /// Attributes of the vehicle.
    #[serde(flatten)]
    fields: VehicleFields,

    /// Time of creation.
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// Time of the latest modification.
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

/// Test utilities for the model.
#[cfg(test)]
pub(crate) mod testutils {
    use super::*;

    /// Returns a valid set of vehicle attributes for a vehicle of `model_year`.
    pub(crate) fn make_fields(model_year: i64) -> VehicleFields {
        VehicleFields::new(
            "toyota".to_owned(),
            "camry".to_owned(),
            "gas".to_owned(),
            "sedan".to_owned(),
            "white".to_owned(),
            "TNRU392EESIR93ERF".to_owned(),
            "ETHR382".to_owned(),
            true,
            Number::from(model_year),
        )
    }
}
