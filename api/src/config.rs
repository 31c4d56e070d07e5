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

//! Configuration of the server, as read from the environment.

use vehicle_world_core::db::postgres::PostgresOptions;
use vehicle_world_core::env::get_optional_var;

/// Port to listen on when `SERVER_PORT` is not set.
pub const DEFAULT_PORT: u16 = 3000;

/// Prefix of the environment variables that configure the database connection.
const DB_PREFIX: &str = "VEHICLES_DB";

/// Everything `main` needs to start serving.
#[derive(Debug)]
pub struct ServerConfig {
    /// TCP port to listen on, on all interfaces.
    pub port: u16,

    /// Options to connect to the PostgreSQL database.
    pub db: PostgresOptions,
}

impl ServerConfig {
    /// Builds the configuration from `SERVER_PORT` and the `VEHICLES_DB_*` variables.
    pub fn from_env() -> Result<Self, String> {
        let port = get_optional_var::<u16>("SERVER", "PORT")?.unwrap_or(DEFAULT_PORT);
        let db = PostgresOptions::from_env(DB_PREFIX)?;
        Ok(Self { port, db })
    }
}
