//! Configuration for Gradeway
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Gradeway - LTI gateway to xAPI learning records
#[derive(Parser, Debug, Clone)]
#[command(name = "gradeway")]
#[command(about = "LTI tool serving xAPI learning records with LMS grade passback")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// LTI 1.1 consumer key expected on inbound launches
    #[arg(long, env = "LTI_CONSUMER_KEY", default_value = "xapi_viewer_key")]
    pub lti_consumer_key: String,

    /// LTI 1.1 consumer secret used for OAuth signature verification
    #[arg(long, env = "LTI_CONSUMER_SECRET", default_value = "xapi_viewer_secret")]
    pub lti_consumer_secret: String,

    /// LTI 1.3 platform issuer
    #[arg(long, env = "LTI13_ISSUER")]
    pub lti13_issuer: Option<String>,

    /// LTI 1.3 client id assigned by the platform
    #[arg(long, env = "LTI13_CLIENT_ID")]
    pub lti13_client_id: Option<String>,

    /// LTI 1.3 deployment id
    #[arg(long, env = "LTI13_DEPLOYMENT_ID")]
    pub lti13_deployment_id: Option<String>,

    /// Platform JWKS URL (published for completeness; tokens are not yet
    /// verified against it - see lti::launch)
    #[arg(long, env = "LTI13_KEYSET_URL")]
    pub lti13_keyset_url: Option<String>,

    /// Platform OIDC authorization endpoint. When unset, derived from the
    /// issuer for known LMS vendors (Canvas, Moodle, Brightspace).
    #[arg(long, env = "LTI13_AUTH_URL")]
    pub lti13_auth_url: Option<String>,

    /// Platform OAuth2 token endpoint
    #[arg(long, env = "LTI13_TOKEN_URL")]
    pub lti13_token_url: Option<String>,

    /// Tool RSA private key for LTI 1.3 (PEM string or path to a PEM file)
    #[arg(long, env = "LTI13_PRIVATE_KEY")]
    pub lti13_private_key: Option<String>,

    /// LRS endpoint base URL
    #[arg(long, env = "LRS_ENDPOINT", default_value = "http://sql-lrs:8080/xapi")]
    pub lrs_endpoint: String,

    /// LRS API key (HTTP Basic username)
    #[arg(long, env = "LRS_API_KEY", default_value = "my_api_key")]
    pub lrs_api_key: String,

    /// LRS API secret (HTTP Basic password)
    #[arg(long, env = "LRS_API_SECRET", default_value = "my_api_secret")]
    pub lrs_api_secret: String,

    /// Maximum statements fetched per report
    #[arg(long, env = "LRS_STATEMENT_LIMIT", default_value = "100")]
    pub lrs_statement_limit: u32,

    /// Path segment under which the launch endpoint is mounted; used when
    /// generating signature URL variants for LMSes behind rewrites
    #[arg(long, env = "TOOL_ENTRY_PATH", default_value = "/index.php")]
    pub tool_entry_path: String,

    /// Session lifetime in seconds
    #[arg(long, env = "SESSION_LIFETIME_SECONDS", default_value = "3600")]
    pub session_lifetime_seconds: u64,

    /// Network timeout for LRS and passback calls, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECONDS", default_value = "30")]
    pub request_timeout_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Whether LTI 1.3 launches can be accepted at all
    pub fn lti13_configured(&self) -> bool {
        self.lti13_issuer.is_some() && self.lti13_client_id.is_some()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.lti_consumer_key.is_empty() || self.lti_consumer_secret.is_empty() {
            return Err("LTI_CONSUMER_KEY and LTI_CONSUMER_SECRET must be non-empty".to_string());
        }

        if self.lrs_endpoint.is_empty() {
            return Err("LRS_ENDPOINT must be non-empty".to_string());
        }

        if self.lrs_statement_limit == 0 {
            return Err("LRS_STATEMENT_LIMIT must be at least 1".to_string());
        }

        Ok(())
    }
}
