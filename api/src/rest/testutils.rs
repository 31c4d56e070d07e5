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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::testutils::make_fields;
use crate::model::{Vehicle, VehicleId};
use crate::rest::app;
use axum::Router;
use serde_json::{Value, json};
use vehicle_world_core::clocks::testutils::SettableClock;
use vehicle_world_core::db::DbError;

pub(crate) use crate::driver::testutils::TEST_NOW;

pub(crate) struct TestContext {
    context: DriverTestContext,
    app: Router,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let context = DriverTestContext::setup().await;
        let app = app(context.driver());
        Self { context, app }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    pub(crate) fn clock(&self) -> &SettableClock {
        self.context.clock()
    }

    pub(crate) async fn close_db(&self) {
        self.context.close_db().await;
    }

    /// Creates a vehicle with the reference attributes through the driver.
    pub(crate) async fn create_vehicle(&self) -> Vehicle {
        self.context.driver().create_vehicle(make_fields(2024)).await.unwrap()
    }

    /// Fetches the vehicle `id` straight from the database, if it exists.
    pub(crate) async fn get_vehicle(&self, id: &VehicleId) -> Option<Vehicle> {
        match db::get_vehicle(&mut self.context.ex().await, id).await {
            Ok(vehicle) => Some(vehicle),
            Err(DbError::NotFound) => None,
            Err(e) => panic!("Failed to query vehicle {}: {}", id.as_str(), e),
        }
    }
}

/// Returns a request payload with the reference attributes, which satisfies the creation rules.
pub(crate) fn reference_body() -> Value {
    json!({
        "manufacturer": "toyota",
        "model": "camry",
        "fuel": "gas",
        "type": "sedan",
        "color": "white",
        "VIN": "TNRU392EESIR93ERF",
        "VRM": "ETHR382",
        "used": true,
        "modelYear": 2024,
    })
}
