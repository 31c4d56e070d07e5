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

//! API to create a vehicle.

use crate::driver::Driver;
use crate::model::VehicleFields;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Json, http};
use serde::Deserialize;
use vehicle_world_core::rest::{DataResponse, ParsedBody, RestError};

/// API handler.
///
/// The body has already been validated against the creation rules by the time this runs.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    body: ParsedBody,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let fields = VehicleFields::deserialize(body.value())?;

    let vehicle = driver.create_vehicle(fields).await?;
    Ok((http::StatusCode::CREATED, Json(DataResponse::new(vehicle))))
}
