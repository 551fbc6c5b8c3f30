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

use color_eyre::Result;
use log::info;

use mvstatic::config::StaticConfig;
use mvstatic_server::{init_static_server, StaticState};

use super::{cmd_hash, cmd_resolve};
use crate::cli_options::{ConfigArgs, Opt, Subcommands};

pub async fn cli_commands(opt: Opt) -> Result<()> {
    match opt.cmd {
        Subcommands::Serve { config, host, port } => {
            let mut config = load_config(config)?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            info!(
                "serving '{}' from {}",
                config.url_prefix,
                config.deployment_dir.display()
            );
            init_static_server(StaticState::from_config(config)).await?;
        }
        Subcommands::Resolve {
            request_uri,
            request_host,
            if_modified_since,
            config,
        } => {
            let config = load_config(config)?;
            cmd_resolve::handle_resolve(
                &config,
                &request_uri,
                &request_host,
                if_modified_since.as_deref(),
            )
            .await?;
        }
        Subcommands::Hash { files } => cmd_hash::handle_hash(&files).await?,
    }

    Ok(())
}

/// The configuration file if given, otherwise defaults, with any command line
/// overrides applied
pub(crate) fn load_config(args: ConfigArgs) -> Result<StaticConfig> {
    let mut config = match &args.config {
        Some(path) => StaticConfig::from_file(path)?,
        None => StaticConfig::default(),
    };

    if let Some(deployment_dir) = args.deployment_dir {
        config.deployment_dir = deployment_dir;
    }
    if let Some(wikiversions_file) = args.wikiversions_file {
        config.wikiversions_file = wikiversions_file;
    }
    if let Some(url_prefix) = args.url_prefix {
        config.url_prefix = url_prefix;
    }
    if let Some(script_name) = args.script_name {
        config.script_name = script_name;
    }
    if let Some(db_name) = args.db_name {
        config.default_db_name = db_name;
    }
    if let Some(metrics_prefix) = args.metrics_prefix {
        config.metrics_prefix = metrics_prefix;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn overrides_replace_defaults() {
        let args = ConfigArgs {
            deployment_dir: Some(PathBuf::from("/tmp/deploy")),
            url_prefix: Some(String::from("/static")),
            db_name: Some(String::from("dewiki")),
            ..ConfigArgs::default()
        };
        let config = load_config(args).expect("config");
        assert_eq!(config.deployment_dir, PathBuf::from("/tmp/deploy"));
        assert_eq!(config.url_prefix, "/static");
        assert_eq!(config.default_db_name, "dewiki");
        assert_eq!(config.script_name, "/w/static.php");
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        let args = ConfigArgs {
            url_prefix: Some(String::from("static")),
            ..ConfigArgs::default()
        };
        assert!(load_config(args).is_err());
    }
}
