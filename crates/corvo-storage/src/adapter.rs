// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! StorageAdapter implementation for the SQLite backend.

use async_trait::async_trait;

use corvo_core::{AdapterType, CorvoError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::Database;

#[async_trait]
impl PluginAdapter for Database {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CorvoError> {
        self.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CorvoError> {
        self.close().await
    }
}

#[async_trait]
impl StorageAdapter for Database {
    async fn initialize(&self) -> Result<(), CorvoError> {
        // Migrations already ran in `open`; verify the connection is live.
        match self.health_check().await? {
            HealthStatus::Healthy => Ok(()),
            HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => {
                Err(CorvoError::Storage {
                    source: reason.into(),
                })
            }
        }
    }

    async fn close(&self) -> Result<(), CorvoError> {
        Database::close(self).await
    }
}
