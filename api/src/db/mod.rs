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

//! Database abstraction in terms of the operations needed by the server.
//!
//! Every vehicle is stored as a JSON document next to its identifier and timestamps.  The
//! document holds the client-supplied attributes only, which keeps partial updates down to a
//! single JSON merge in the database.

use crate::model::{Vehicle, VehicleFields, VehicleId, VehiclePatch};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use time::OffsetDateTime;
#[cfg(feature = "postgres")]
use vehicle_world_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use vehicle_world_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use vehicle_world_core::db::{DbError, DbResult, Executor};


/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            postgres::run_schema(&mut **ex, include_str!("postgres.sql")).await
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(&mut **ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Vehicle {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let document: Json<VehicleFields> =
            row.try_get("document").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;
        let updated_at: OffsetDateTime =
            row.try_get("updated_at").map_err(postgres::map_sqlx_error)?;

        Ok(Vehicle::new(VehicleId::new(id)?, document.0, created_at, updated_at))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Vehicle {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let document: Json<VehicleFields> =
            row.try_get("document").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;
        let updated_at_secs: i64 = row.try_get("updated_at_secs").map_err(sqlite::map_sqlx_error)?;
        let updated_at_nsecs: i64 =
            row.try_get("updated_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        Ok(Vehicle::new(
            VehicleId::new(id)?,
            document.0,
            build_timestamp(created_at_secs, created_at_nsecs)?,
            build_timestamp(updated_at_secs, updated_at_nsecs)?,
        ))
    }
}

/// Checks that a modification of a single row by identifier touched exactly one row.
fn check_one_row(rows_affected: u64, what: &str) -> DbResult<()> {
    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        n => Err(DbError::BackendError(format!("{} affected {} rows instead of one", what, n))),
    }
}

/// Stores a new `vehicle`.
///
/// Fails with `DbError::AlreadyExists` if a vehicle with the same identifier already exists.
pub(crate) async fn create_vehicle(ex: &mut Executor, vehicle: &Vehicle) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO vehicles (id, document, created_at, updated_at)
                VALUES ($1, $2, $3, $4)";
            let done = sqlx::query(query_str)
                .bind(vehicle.id().as_str())
                .bind(Json(vehicle.fields()))
                .bind(vehicle.created_at())
                .bind(vehicle.updated_at())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(*vehicle.created_at())?;
            let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(*vehicle.updated_at())?;

            let query_str = "
                INSERT INTO vehicles
                    (id, document,
                    created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(vehicle.id().as_str())
                .bind(Json(vehicle.fields()))
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .bind(updated_at_secs)
                .bind(updated_at_nsecs)
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Gets the vehicle identified by `id`.
pub(crate) async fn get_vehicle(ex: &mut Executor, id: &VehicleId) -> DbResult<Vehicle> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, document, created_at, updated_at
                FROM vehicles WHERE id = $1";
            let raw_vehicle = sqlx::query(query_str)
                .bind(id.as_str())
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Vehicle::try_from(raw_vehicle)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, document,
                    created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs
                FROM vehicles WHERE id = ?";
            let raw_vehicle = sqlx::query(query_str)
                .bind(id.as_str())
                .fetch_one(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Vehicle::try_from(raw_vehicle)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Merges the fields present in `patch` into the vehicle identified by `id` and marks the vehicle
/// as modified at `updated_at`.
pub(crate) async fn update_vehicle(
    ex: &mut Executor,
    id: &VehicleId,
    patch: &VehiclePatch,
    updated_at: OffsetDateTime,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE vehicles SET document = document || $1, updated_at = $2
                WHERE id = $3";
            let done = sqlx::query(query_str)
                .bind(Json(patch))
                .bind(updated_at)
                .bind(id.as_str())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(updated_at)?;

            let query_str = "
                UPDATE vehicles
                SET document = json_patch(document, ?),
                    updated_at_secs = ?, updated_at_nsecs = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(Json(patch))
                .bind(updated_at_secs)
                .bind(updated_at_nsecs)
                .bind(id.as_str())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    check_one_row(rows_affected, "Update")
}

/// Deletes the vehicle identified by `id`.
pub(crate) async fn delete_vehicle(ex: &mut Executor, id: &VehicleId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM vehicles WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_str())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM vehicles WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.as_str())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    check_one_row(rows_affected, "Deletion")
}
