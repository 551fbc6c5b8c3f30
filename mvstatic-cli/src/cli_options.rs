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

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Serve static assets from whichever deployed version holds them
#[derive(Parser, Debug)]
#[command(name = "mvstatic", version, about, long_about = None)]
pub struct Opt {
    #[command(subcommand)]
    pub cmd: Subcommands,
}

#[derive(Subcommand, Debug)]
pub enum Subcommands {
    /// Run the HTTP server
    Serve {
        #[command(flatten)]
        config: ConfigArgs,

        /// Address to listen on
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Resolve a request without a server and print what would be served
    Resolve {
        /// The request URI, for example /w/skins/Vector/main.css?a1b2c
        #[arg(value_name = "REQUEST_URI")]
        request_uri: String,

        /// Host the request was made to, used to select the site
        #[arg(long = "host", value_name = "HOST", default_value = "")]
        request_host: String,

        /// An HTTP date, as sent in an If-Modified-Since header
        #[arg(long, value_name = "DATE")]
        if_modified_since: Option<String>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the validation token for each file
    Hash {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
}

/// Options shared by commands which resolve requests. Each overrides the
/// corresponding setting from the configuration file.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// JSON configuration file
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory containing the php-* version directories
    #[arg(long, value_name = "DIR")]
    pub deployment_dir: Option<PathBuf>,

    /// Path of the wikiversions file, relative to the deployment directory
    #[arg(long, value_name = "FILE")]
    pub wikiversions_file: Option<PathBuf>,

    /// URL path prefix stripped from requests
    #[arg(long, value_name = "PREFIX")]
    pub url_prefix: Option<String>,

    /// Path of this handler, which is rejected when requested directly
    #[arg(long, value_name = "PATH")]
    pub script_name: Option<String>,

    /// Site used for hosts not in the configured host table
    #[arg(long, value_name = "DBNAME")]
    pub db_name: Option<String>,

    /// Prefix for counter names
    #[arg(long, value_name = "PREFIX")]
    pub metrics_prefix: Option<String>,
}
