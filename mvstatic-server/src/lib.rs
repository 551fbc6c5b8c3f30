/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

mod services;
mod web;

use std::sync::Arc;

use mvstatic::config::StaticConfig;
use mvstatic::content_type::{ContentTypeClassifier, MimeGuessClassifier};
use mvstatic::metrics::{LogMetrics, MetricsSink};
use mvstatic::registry::VersionRegistry;
use mvstatic::site::SiteResolver;

pub use services::{configure_static_service, init_static_server, CONNECTION_TIMEOUT};

/// Shared by every worker. Holds only read-only collaborators, all per request
/// state lives in the handler.
pub struct StaticState {
    pub config: StaticConfig,
    pub registry: Arc<dyn VersionRegistry>,
    pub sites: Arc<dyn SiteResolver>,
    pub classifier: Arc<dyn ContentTypeClassifier>,
    pub metrics: Arc<dyn MetricsSink>,
}

impl StaticState {
    /// The standard collaborators: a wikiversions registry, host table,
    /// mime_guess classification and metrics written to the log
    pub fn from_config(config: StaticConfig) -> StaticState {
        StaticState {
            registry: Arc::new(config.registry()),
            sites: Arc::new(config.host_table()),
            classifier: Arc::new(MimeGuessClassifier),
            metrics: Arc::new(LogMetrics),
            config,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> StaticState {
        self.metrics = metrics;
        self
    }
}
