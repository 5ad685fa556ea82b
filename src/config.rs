// ==============================================================================
// config.rs - Service Configuration
// ==============================================================================
// Description: Command line flags with environment fallbacks (.env supported)
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::store::StoreConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Variant record CRUD service", long_about = None)]
pub struct AppConfig {
    /// Port to listen on
    #[arg(long, env = "RESULT_API_PORT", default_value_t = 8099)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "RESULT_API_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Derived CSV table (created from the source on first load)
    #[arg(long, env = "RESULT_API_STORE_PATH", default_value = "./data.csv")]
    pub store_path: PathBuf,

    /// Original tab-delimited VCF-style source
    #[arg(long, env = "RESULT_API_SOURCE_PATH", default_value = "./data")]
    pub source_path: PathBuf,

    /// Shared secret expected in the Authorization header of POST/PUT/DELETE
    #[arg(long, env = "RESULT_API_SECRET", default_value = "password", hide_env_values = true)]
    pub secret: String,

    /// Page size used when the request omits per_page
    #[arg(long, env = "RESULT_API_DEFAULT_PER_PAGE", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub default_per_page: u32,

    /// Value written to columns a created record does not supply
    #[arg(long, env = "RESULT_API_PLACEHOLDER", default_value = ".")]
    pub placeholder: String,
}

impl AppConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            store_path: self.store_path.clone(),
            source_path: self.source_path.clone(),
        }
    }
}
