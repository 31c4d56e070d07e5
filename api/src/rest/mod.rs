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

//! Entry point to the REST server.

use crate::driver::Driver;
use crate::model::VehicleId;
use axum::Router;
use axum::extract::Path;
use axum::handler::Handler;
use axum::middleware::{from_fn, from_fn_with_state};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use vehicle_world_core::rest::guards::{
    SchemaGuard, require_empty_body, require_json_content, require_non_empty_body, validate_body,
};
use vehicle_world_core::rest::{
    RestError, RestResult, bad_request_on_panic, not_found, parse_json_body,
};
use vehicle_world_core::schema::Schema;

mod schema;
#[cfg(test)]
mod testutils;
mod vehicle_delete;
mod vehicle_get;
mod vehicle_patch;
mod vehicle_post;

/// Extracts the identifier of the targeted vehicle from the `path` parameters of a request.
///
/// Malformed identifiers never reach the driver.
fn vehicle_id(path: Option<Path<String>>) -> RestResult<VehicleId> {
    match path {
        Some(Path(id)) => Ok(VehicleId::new(id)?),
        None => Err(RestError::BadRequest("Missing vehicle identifier".to_owned())),
    }
}

/// Creates the router for the application.
///
/// Every API declares its own chain of guards, which run in the listed order before the handler.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::{get, post};

    let read_guards = || from_fn(require_empty_body);
    let write_guards = |schema: Schema| {
        ServiceBuilder::new()
            .layer(from_fn(require_json_content))
            .layer(from_fn(require_non_empty_body))
            .layer(from_fn_with_state(SchemaGuard::new(schema, driver.clock()), validate_body))
    };

    let vehicles = Router::new()
        .route(
            "/vehicles",
            post(vehicle_post::handler.layer(write_guards(schema::create_ruleset())))
                .fallback(not_found),
        )
        .route(
            "/vehicles/:id",
            get(vehicle_get::handler.layer(read_guards()))
                .patch(vehicle_patch::handler.layer(write_guards(schema::update_ruleset())))
                .delete(vehicle_delete::handler.layer(read_guards()))
                .fallback(not_found),
        );

    Router::new()
        .nest("/api/v1", vehicles)
        .fallback(not_found)
        .layer(from_fn(parse_json_body))
        .layer(CatchPanicLayer::custom(bad_request_on_panic))
        .with_state(driver)
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use axum::http;
    use vehicle_world_core::rest::testutils::*;

    #[tokio::test]
    async fn test_unknown_paths() {
        let context = TestContext::setup().await;

        for path in ["/", "/vehicles", "/api/v1", "/api/v2/vehicles", "/api/v1/vehicles/a/b"] {
            OneShotBuilder::new(context.app(), (http::Method::GET, path))
                .send_empty()
                .await
                .expect_status(http::StatusCode::NOT_FOUND)
                .expect_empty()
                .await;
        }
    }

    #[tokio::test]
    async fn test_unknown_methods() {
        let context = TestContext::setup().await;
        let vehicle = context.create_vehicle().await;
        let item = format!("/api/v1/vehicles/{}", vehicle.id().as_str());

        let routes = [
            (http::Method::GET, "/api/v1/vehicles".to_owned()),
            (http::Method::PUT, "/api/v1/vehicles".to_owned()),
            (http::Method::DELETE, "/api/v1/vehicles".to_owned()),
            (http::Method::POST, item.clone()),
            (http::Method::PUT, item),
        ];
        for route in routes {
            OneShotBuilder::new(context.app(), route)
                .send_empty()
                .await
                .expect_status(http::StatusCode::NOT_FOUND)
                .expect_empty()
                .await;
        }

        assert!(context.get_vehicle(vehicle.id()).await.is_some());
    }

    #[tokio::test]
    async fn test_malformed_json_on_any_route() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), (http::Method::GET, "/unknown"))
            .send_raw("application/json", "{")
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("^Bad Request$")
            .await;
    }

    #[tokio::test]
    async fn test_crud_flow() {
        let context = TestContext::setup().await;

        let created = OneShotBuilder::new(context.app(), (http::Method::POST, "/api/v1/vehicles"))
            .send_json(reference_body())
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<serde_json::Value>()
            .await;
        let id = created["data"]["_id"].as_str().unwrap().to_owned();
        let item = format!("/api/v1/vehicles/{}", id);

        OneShotBuilder::new(context.app(), (http::Method::PATCH, item.clone()))
            .send_json(serde_json::json!({"color": "black", "used": false}))
            .await
            .expect_status(http::StatusCode::NO_CONTENT)
            .expect_empty()
            .await;

        let fetched = OneShotBuilder::new(context.app(), (http::Method::GET, item.clone()))
            .send_empty()
            .await
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!(id, fetched["data"]["_id"]);
        assert_eq!("black", fetched["data"]["color"]);
        assert_eq!(false, fetched["data"]["used"]);
        assert_eq!("camry", fetched["data"]["model"]);

        OneShotBuilder::new(context.app(), (http::Method::DELETE, item.clone()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NO_CONTENT)
            .expect_empty()
            .await;

        OneShotBuilder::new(context.app(), (http::Method::GET, item))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_empty()
            .await;
    }
}
