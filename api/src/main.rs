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

//! Entry point to the vehicles service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use std::net::Ipv4Addr;
use std::sync::Arc;
use vehicle_world_api::config::ServerConfig;
use vehicle_world_api::db::init_schema;
use vehicle_world_api::serve;
use vehicle_world_core::db::Db;
use vehicle_world_core::db::postgres::PostgresDb;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env().expect("Invalid configuration");
    let addr = (Ipv4Addr::UNSPECIFIED, config.port);

    let db: Arc<dyn Db + Send + Sync> =
        Arc::from(PostgresDb::connect(config.db).expect("Cannot configure database pool"));
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();

    serve(addr, db.clone()).await.unwrap();
    db.close().await;
}
