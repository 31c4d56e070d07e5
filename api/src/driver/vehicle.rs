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

//! Operations on one vehicle.

use crate::db;
use crate::driver::Driver;
use crate::model::{Vehicle, VehicleFields, VehicleId, VehiclePatch};
use vehicle_world_core::driver::DriverResult;

impl Driver {
    /// Creates a new vehicle with the given `fields`, assigning it a fresh identifier.
    pub(crate) async fn create_vehicle(self, fields: VehicleFields) -> DriverResult<Vehicle> {
        let now = self.clock.now_utc();
        let vehicle = Vehicle::new(VehicleId::generate(now), fields, now, now);
        db::create_vehicle(&mut self.db.ex().await?, &vehicle).await?;
        Ok(vehicle)
    }

    /// Deletes the existing vehicle `id`.
    pub(crate) async fn delete_vehicle(self, id: &VehicleId) -> DriverResult<()> {
        db::delete_vehicle(&mut self.db.ex().await?, id).await?;
        Ok(())
    }

    /// Gets the vehicle `id`.
    pub(crate) async fn get_vehicle(self, id: &VehicleId) -> DriverResult<Vehicle> {
        let vehicle = db::get_vehicle(&mut self.db.ex().await?, id).await?;
        Ok(vehicle)
    }

    /// Modifies the existing vehicle `id` with the fields present in `patch`.
    pub(crate) async fn update_vehicle(
        self,
        id: &VehicleId,
        patch: VehiclePatch,
    ) -> DriverResult<()> {
        let now = self.clock.now_utc();
        db::update_vehicle(&mut self.db.ex().await?, id, &patch, now).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use crate::model::testutils::make_fields;
    use std::time::Duration;
    use vehicle_world_core::db::DbError;
    use vehicle_world_core::driver::DriverError;

    /// Fixed identifier for tests that need a vehicle that does not exist.
    const MISSING_ID: &str = "0123456789abcdef01234567";

    #[tokio::test]
    async fn test_create_vehicle_ok() {
        let context = TestContext::setup().await;

        let vehicle = context.driver().create_vehicle(make_fields(2024)).await.unwrap();
        assert_eq!(&make_fields(2024), vehicle.fields());
        assert_eq!(TEST_NOW, *vehicle.created_at());
        assert_eq!(TEST_NOW, *vehicle.updated_at());
        assert_eq!(format!("{:08x}", TEST_NOW.unix_timestamp()), vehicle.id().as_str()[0..8]);

        assert_eq!(vehicle, db::get_vehicle(&mut context.ex().await, vehicle.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_vehicle_unique_ids() {
        let context = TestContext::setup().await;

        let vehicle1 = context.driver().create_vehicle(make_fields(2024)).await.unwrap();
        let vehicle2 = context.driver().create_vehicle(make_fields(2024)).await.unwrap();
        assert_ne!(vehicle1.id(), vehicle2.id());
    }

    #[tokio::test]
    async fn test_create_vehicle_db_error() {
        let context = TestContext::setup().await;
        context.close_db().await;

        match context.driver().create_vehicle(make_fields(2024)).await {
            Err(DriverError::BackendError(_)) => (),
            e => panic!("Must have failed with a BackendError but got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_get_vehicle_ok() {
        let context = TestContext::setup().await;

        let vehicle = context.driver().create_vehicle(make_fields(2020)).await.unwrap();
        assert_eq!(vehicle, context.driver().get_vehicle(vehicle.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_vehicle_not_found() {
        let context = TestContext::setup().await;

        let id = VehicleId::new(MISSING_ID).unwrap();
        assert_eq!(
            DriverError::NotFound("Entity not found".to_owned()),
            context.driver().get_vehicle(&id).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_update_vehicle_ok() {
        let context = TestContext::setup().await;

        let vehicle = context.driver().create_vehicle(make_fields(2024)).await.unwrap();
        context.clock().advance(Duration::from_secs(60));

        let patch = VehiclePatch { fuel: Some("electric".to_owned()), ..Default::default() };
        context.driver().update_vehicle(vehicle.id(), patch.clone()).await.unwrap();

        let stored = db::get_vehicle(&mut context.ex().await, vehicle.id()).await.unwrap();
        assert_eq!(&patch.apply(make_fields(2024)), stored.fields());
        assert_eq!(TEST_NOW, *stored.created_at());
        assert_eq!(TEST_NOW + Duration::from_secs(60), *stored.updated_at());
    }

    #[tokio::test]
    async fn test_update_vehicle_not_found() {
        let context = TestContext::setup().await;

        let id = VehicleId::new(MISSING_ID).unwrap();
        let patch = VehiclePatch { fuel: Some("electric".to_owned()), ..Default::default() };
        assert_eq!(
            DriverError::NotFound("Entity not found".to_owned()),
            context.driver().update_vehicle(&id, patch).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_vehicle_ok() {
        let context = TestContext::setup().await;

        let vehicle = context.driver().create_vehicle(make_fields(2024)).await.unwrap();
        context.driver().delete_vehicle(vehicle.id()).await.unwrap();

        assert_eq!(
            DbError::NotFound,
            db::get_vehicle(&mut context.ex().await, vehicle.id()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_vehicle_not_found() {
        let context = TestContext::setup().await;

        let id = VehicleId::new(MISSING_ID).unwrap();
        assert_eq!(
            DriverError::NotFound("Entity not found".to_owned()),
            context.driver().delete_vehicle(&id).await.unwrap_err()
        );
    }
}
