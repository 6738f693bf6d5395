//! Health API
//!
//! Database reachability and schema version for probes.

use serde::{Deserialize, Serialize};

use super::LexGraph;

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Warning,
    Error,
}

/// Overall system health report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub timestamp: String,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.overall_status != HealthStatus::Error
    }
}

impl LexGraph {
    /// Run every health check; never fails, problems are reported per check
    pub async fn health(&self) -> HealthReport {
        let checks = vec![self.check_database().await, self.check_schema().await];
        let overall_status = checks
            .iter()
            .map(|c| c.status)
            .fold(HealthStatus::Ok, |worst, s| match (worst, s) {
                (HealthStatus::Error, _) | (_, HealthStatus::Error) => HealthStatus::Error,
                (HealthStatus::Warning, _) | (_, HealthStatus::Warning) => HealthStatus::Warning,
                _ => HealthStatus::Ok,
            });

        HealthReport {
            overall_status,
            checks,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    async fn check_database(&self) -> HealthCheck {
        match self.db.health_check().await {
            Ok(()) => HealthCheck {
                name: "database".to_string(),
                status: HealthStatus::Ok,
                message: None,
            },
            Err(e) => HealthCheck {
                name: "database".to_string(),
                status: HealthStatus::Error,
                message: Some(format!("{:#}", e)),
            },
        }
    }

    async fn check_schema(&self) -> HealthCheck {
        match self.db.migration_status().await {
            Ok(status) if status.needs_migration => HealthCheck {
                name: "schema".to_string(),
                status: HealthStatus::Warning,
                message: Some(format!(
                    "Schema at version {}, expected {}",
                    status.current_version, status.target_version
                )),
            },
            Ok(status) => HealthCheck {
                name: "schema".to_string(),
                status: HealthStatus::Ok,
                message: Some(format!("Schema version {}", status.current_version)),
            },
            Err(e) => HealthCheck {
                name: "schema".to_string(),
                status: HealthStatus::Error,
                message: Some(format!("{:#}", e)),
            },
        }
    }
}
