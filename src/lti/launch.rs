//! LTI launch verification
//!
//! Validates an inbound launch POST (LTI 1.1 OAuth 1.0a or LTI 1.3 OIDC/JWT)
//! and produces a normalized [`LaunchContext`], or a typed [`LaunchRejection`].
//!
//! LMS platforms disagree on how the launch URL should be reconstructed
//! behind reverse proxies, so a failed 1.1 signature check is retried against
//! an ordered list of URL variants before rejecting. The variants only change
//! how this tool's own known URL is represented - they do not widen the trust
//! boundary.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Args;
use crate::lti::oauth1::{constant_time_eq, sign_params};

const CLAIM_MESSAGE_TYPE: &str = "https://purl.imsglobal.org/spec/lti/claim/message_type";
const CLAIM_VERSION: &str = "https://purl.imsglobal.org/spec/lti/claim/version";
const CLAIM_DEPLOYMENT_ID: &str = "https://purl.imsglobal.org/spec/lti/claim/deployment_id";
const CLAIM_CONTEXT: &str = "https://purl.imsglobal.org/spec/lti/claim/context";
const CLAIM_RESOURCE_LINK: &str = "https://purl.imsglobal.org/spec/lti/claim/resource_link";
const CLAIM_CUSTOM: &str = "https://purl.imsglobal.org/spec/lti/claim/custom";
const CLAIM_AGS_ENDPOINT: &str = "https://purl.imsglobal.org/spec/lti-ags/claim/endpoint";

/// Maximum allowed clock skew on the OAuth timestamp, in seconds
const TIMESTAMP_WINDOW_SECONDS: i64 = 300;

/// Message types accepted on an LTI 1.1 launch
const VALID_MESSAGE_TYPES: &[&str] = &[
    "basic-lti-launch-request",
    "ContentItemSelectionRequest",
    "ContentItemSelection",
];

/// LTI protocol generation of a verified launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LtiVersion {
    #[serde(rename = "1.1")]
    V11,
    #[serde(rename = "1.3")]
    V13,
}

/// Grade passback descriptor, fixed by the launch's protocol version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradePassback {
    /// No outcome service was offered on this launch
    None,
    /// LTI 1.1 Outcomes: OAuth 1.0a signed POX XML
    OAuth1Outcome {
        service_url: String,
        sourced_id: String,
        consumer_key: String,
        consumer_secret: String,
    },
    /// LTI 1.3 Assignment and Grade Services: bearer-token JSON score
    Lti13Ags {
        line_item_url: String,
        /// Obtained out of band; absent means passback is disabled
        access_token: Option<String>,
        subject_id: String,
    },
}

impl GradePassback {
    /// Whether a grade can actually be transmitted for this launch
    pub fn is_available(&self) -> bool {
        match self {
            GradePassback::None => false,
            GradePassback::OAuth1Outcome { .. } => true,
            GradePassback::Lti13Ags { access_token, .. } => access_token.is_some(),
        }
    }
}

/// Result of a successful launch verification
///
/// Persisted verbatim in the session store for the life of the browsing
/// session; never mutated after creation except full replacement by a new
/// launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchContext {
    pub version: LtiVersion,
    /// Required for the LRS lookup; absence is a valid but degraded state
    pub actor_email: Option<String>,
    pub display_name: String,
    pub context_title: String,
    pub resource_link_title: Option<String>,
    pub resource_link_id: Option<String>,
    /// Optional matching hint from the tool's custom parameters
    pub custom_lab_id: Option<String>,
    pub grade_passback: GradePassback,
}

/// Typed launch failure, terminal for the request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchRejection {
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("invalid LTI message type: {0}")]
    InvalidMessageType(String),

    #[error("invalid consumer key")]
    InvalidConsumerKey,

    #[error("OAuth timestamp expired")]
    TimestampExpired,

    #[error("invalid OAuth signature")]
    InvalidSignature,

    #[error("malformed id_token: {0}")]
    MalformedToken(String),

    #[error("unsupported LTI version: {0}")]
    UnsupportedVersion(String),
}

/// Reconstruct the canonical launch URL from request parts.
///
/// Default ports 80/443 are stripped from the host and any query string is
/// stripped from the path, matching how platforms build the signature base.
pub fn reconstruct_launch_url(scheme: &str, host: &str, path: &str) -> String {
    let host = host
        .strip_suffix(":443")
        .or_else(|| host.strip_suffix(":80"))
        .unwrap_or(host);
    let path = path.split('?').next().unwrap_or("/");
    format!("{}://{}{}", scheme, host, path)
}

/// Ordered URL variants tried when the canonical signature check fails.
///
/// Canonical first, then scheme swaps, trailing-slash changes, the tool's
/// entry-path segment added/removed, and common proxy ports stripped.
/// Duplicates are removed while preserving order, so the first match wins.
pub fn candidate_urls(url: &str, tool_entry_path: &str) -> Vec<String> {
    let mut variants = vec![url.to_string()];

    if let Some(rest) = url.strip_prefix("https://") {
        variants.push(format!("http://{}", rest));
    }
    if let Some(rest) = url.strip_prefix("http://") {
        variants.push(format!("https://{}", rest));
    }

    let trimmed = url.trim_end_matches('/');
    variants.push(trimmed.to_string());
    variants.push(format!("{}/", trimmed));

    if !tool_entry_path.is_empty() && url.contains(tool_entry_path) {
        variants.push(url.replace(tool_entry_path, "/"));
        variants.push(url.replace(tool_entry_path, ""));
    }

    for port in ["8080", "8888", "443", "80"] {
        let needle = format!(":{}", port);
        if url.contains(&needle) {
            variants.push(url.replacen(&needle, "", 1));
        }
    }

    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| !v.is_empty() && seen.insert(v.clone()));
    variants
}

/// Verifies inbound LTI launches against the tool's configured credentials
pub struct LaunchVerifier {
    consumer_key: String,
    consumer_secret: String,
    tool_entry_path: String,
}

impl LaunchVerifier {
    pub fn new(args: &Args) -> Self {
        Self {
            consumer_key: args.lti_consumer_key.clone(),
            consumer_secret: args.lti_consumer_secret.clone(),
            tool_entry_path: args.tool_entry_path.clone(),
        }
    }

    #[cfg(test)]
    pub fn with_credentials(consumer_key: &str, consumer_secret: &str, entry_path: &str) -> Self {
        Self {
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
            tool_entry_path: entry_path.to_string(),
        }
    }

    /// Verify an LTI 1.1 (OAuth 1.0a) launch POST.
    ///
    /// `launch_url` is the canonical reconstruction of this request's URL,
    /// `params` the decoded form body, `now` the current unix time.
    pub fn verify_lti11(
        &self,
        launch_url: &str,
        params: &[(String, String)],
        now: i64,
    ) -> Result<LaunchContext, LaunchRejection> {
        let get = |key: &str| -> Option<&str> {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        let message_type = get("lti_message_type")
            .ok_or_else(|| LaunchRejection::MissingParameter("lti_message_type".into()))?;
        if !VALID_MESSAGE_TYPES.contains(&message_type) {
            return Err(LaunchRejection::InvalidMessageType(message_type.to_string()));
        }

        for required in [
            "oauth_consumer_key",
            "oauth_signature_method",
            "oauth_timestamp",
            "oauth_nonce",
            "oauth_signature",
        ] {
            if get(required).is_none() {
                return Err(LaunchRejection::MissingParameter(required.to_string()));
            }
        }

        let provided_key = get("oauth_consumer_key").unwrap_or_default();
        if !constant_time_eq(provided_key, &self.consumer_key) {
            return Err(LaunchRejection::InvalidConsumerKey);
        }

        let timestamp: i64 = get("oauth_timestamp")
            .unwrap_or_default()
            .parse()
            .unwrap_or(0);
        if (now - timestamp).abs() > TIMESTAMP_WINDOW_SECONDS {
            return Err(LaunchRejection::TimestampExpired);
        }

        let provided_signature = get("oauth_signature").unwrap_or_default();
        let mut verified = false;
        for candidate in candidate_urls(launch_url, &self.tool_entry_path) {
            let expected = sign_params("POST", &candidate, params, &self.consumer_secret);
            if constant_time_eq(provided_signature, &expected) {
                if candidate != launch_url {
                    debug!("launch signature matched URL variant {}", candidate);
                }
                verified = true;
                break;
            }
        }
        if !verified {
            warn!("launch signature did not match any URL variant of {}", launch_url);
            return Err(LaunchRejection::InvalidSignature);
        }

        // Three-way name fallback: full name, given+family, literal "Student"
        let display_name = get("lis_person_name_full")
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                let joined = format!(
                    "{} {}",
                    get("lis_person_name_given").unwrap_or_default(),
                    get("lis_person_name_family").unwrap_or_default()
                );
                let joined = joined.trim().to_string();
                (!joined.is_empty()).then_some(joined)
            })
            .unwrap_or_else(|| "Student".to_string());

        let grade_passback = match (get("lis_outcome_service_url"), get("lis_result_sourcedid")) {
            (Some(url), Some(sourced_id)) if !url.is_empty() && !sourced_id.is_empty() => {
                GradePassback::OAuth1Outcome {
                    service_url: url.to_string(),
                    sourced_id: sourced_id.to_string(),
                    consumer_key: self.consumer_key.clone(),
                    consumer_secret: self.consumer_secret.clone(),
                }
            }
            _ => GradePassback::None,
        };

        Ok(LaunchContext {
            version: LtiVersion::V11,
            actor_email: get("lis_person_contact_email_primary")
                .map(str::to_string)
                .filter(|s| !s.is_empty()),
            display_name,
            context_title: get("context_title").unwrap_or("Course").to_string(),
            resource_link_title: get("resource_link_title").map(str::to_string),
            resource_link_id: get("resource_link_id").map(str::to_string),
            custom_lab_id: get("custom_lab_id")
                .map(str::to_string)
                .filter(|s| !s.is_empty()),
            grade_passback,
        })
    }

    /// Verify an LTI 1.3 launch carrying an `id_token`.
    ///
    /// The token's claims segment is decoded and required claims are checked,
    /// but the platform's signature is NOT verified against its published
    /// JWKS - claims are trusted as-is.
    /// TODO: verify the id_token signature against LTI13_KEYSET_URL before
    /// trusting any claim.
    ///
    /// `session_access_token` is the AGS bearer token previously obtained out
    /// of band, if any.
    pub fn verify_lti13(
        &self,
        id_token: &str,
        session_access_token: Option<&str>,
    ) -> Result<LaunchContext, LaunchRejection> {
        if id_token.is_empty() {
            return Err(LaunchRejection::MissingParameter("id_token".into()));
        }

        let segments: Vec<&str> = id_token.split('.').collect();
        if segments.len() != 3 {
            return Err(LaunchRejection::MalformedToken(
                "expected three dot-separated segments".into(),
            ));
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(segments[1].trim_end_matches('='))
            .map_err(|e| LaunchRejection::MalformedToken(format!("claims segment: {}", e)))?;
        let claims: Value = serde_json::from_slice(&payload_bytes)
            .map_err(|e| LaunchRejection::MalformedToken(format!("claims json: {}", e)))?;

        for required in [CLAIM_MESSAGE_TYPE, CLAIM_VERSION, CLAIM_DEPLOYMENT_ID] {
            if claims.get(required).is_none() {
                return Err(LaunchRejection::MalformedToken(format!(
                    "missing required claim: {}",
                    required
                )));
            }
        }

        let version = claims[CLAIM_VERSION].as_str().unwrap_or_default();
        if version != "1.3.0" {
            return Err(LaunchRejection::UnsupportedVersion(version.to_string()));
        }

        let str_claim = |key: &str| -> Option<String> {
            claims
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .filter(|s| !s.is_empty())
        };

        let subject_id = str_claim("sub");
        let display_name = str_claim("name")
            .or_else(|| str_claim("given_name"))
            .unwrap_or_else(|| "Student".to_string());

        let context_title = claims
            .get(CLAIM_CONTEXT)
            .and_then(|c| c.get("title"))
            .and_then(Value::as_str)
            .unwrap_or("Course")
            .to_string();

        let resource_link = claims.get(CLAIM_RESOURCE_LINK);
        let resource_link_title = resource_link
            .and_then(|r| r.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let resource_link_id = resource_link
            .and_then(|r| r.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let custom_lab_id = claims
            .get(CLAIM_CUSTOM)
            .and_then(|c| c.get("lab_id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let grade_passback = match claims
            .get(CLAIM_AGS_ENDPOINT)
            .and_then(|e| e.get("lineitem"))
            .and_then(Value::as_str)
        {
            Some(line_item_url) if subject_id.is_some() => GradePassback::Lti13Ags {
                line_item_url: line_item_url.to_string(),
                access_token: session_access_token.map(str::to_string),
                subject_id: subject_id.clone().unwrap_or_default(),
            },
            _ => GradePassback::None,
        };

        Ok(LaunchContext {
            version: LtiVersion::V13,
            actor_email: str_claim("email"),
            display_name,
            context_title,
            resource_link_title,
            resource_link_id,
            custom_lab_id,
            grade_passback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn verifier() -> LaunchVerifier {
        LaunchVerifier::with_credentials("test_key", "test_secret", "/index.php")
    }

    fn base_params(now: i64) -> Vec<(String, String)> {
        vec![
            ("lti_message_type".into(), "basic-lti-launch-request".into()),
            ("oauth_consumer_key".into(), "test_key".into()),
            ("oauth_signature_method".into(), "HMAC-SHA1".into()),
            ("oauth_timestamp".into(), now.to_string()),
            ("oauth_nonce".into(), "nonce123".into()),
            ("oauth_version".into(), "1.0".into()),
            ("lis_person_contact_email_primary".into(), "student@example.edu".into()),
            ("lis_person_name_full".into(), "Ada Lovelace".into()),
            ("context_title".into(), "Intro to Computing".into()),
            ("resource_link_title".into(), "Lab 3".into()),
            ("resource_link_id".into(), "rl-1".into()),
        ]
    }

    fn signed_params(url: &str, mut params: Vec<(String, String)>) -> Vec<(String, String)> {
        let sig = sign_params("POST", url, &params, "test_secret");
        params.push(("oauth_signature".into(), sig));
        params
    }

    #[test]
    fn test_valid_launch_accepted() {
        let url = "https://tool.example.edu/launch";
        let params = signed_params(url, base_params(NOW));
        let ctx = verifier().verify_lti11(url, &params, NOW).unwrap();

        assert_eq!(ctx.version, LtiVersion::V11);
        assert_eq!(ctx.actor_email.as_deref(), Some("student@example.edu"));
        assert_eq!(ctx.display_name, "Ada Lovelace");
        assert_eq!(ctx.context_title, "Intro to Computing");
        assert!(matches!(ctx.grade_passback, GradePassback::None));
    }

    #[test]
    fn test_missing_oauth_param_rejected() {
        let url = "https://tool.example.edu/launch";
        let mut params = base_params(NOW);
        params.retain(|(k, _)| k != "oauth_nonce");
        params.push(("oauth_signature".into(), "x".into()));

        let err = verifier().verify_lti11(url, &params, NOW).unwrap_err();
        assert_eq!(err, LaunchRejection::MissingParameter("oauth_nonce".into()));
    }

    #[test]
    fn test_invalid_message_type_rejected() {
        let url = "https://tool.example.edu/launch";
        let mut params = base_params(NOW);
        params[0].1 = "something-else".into();
        let params = signed_params(url, params);

        let err = verifier().verify_lti11(url, &params, NOW).unwrap_err();
        assert!(matches!(err, LaunchRejection::InvalidMessageType(_)));
    }

    #[test]
    fn test_wrong_consumer_key_rejected() {
        let url = "https://tool.example.edu/launch";
        let mut params = base_params(NOW);
        for (k, v) in params.iter_mut() {
            if k == "oauth_consumer_key" {
                *v = "other_key".into();
            }
        }
        let params = signed_params(url, params);

        let err = verifier().verify_lti11(url, &params, NOW).unwrap_err();
        assert_eq!(err, LaunchRejection::InvalidConsumerKey);
    }

    #[test]
    fn test_timestamp_boundary() {
        let url = "https://tool.example.edu/launch";

        // Exactly 300 seconds old: accepted
        let params = signed_params(url, base_params(NOW - 300));
        assert!(verifier().verify_lti11(url, &params, NOW).is_ok());

        // 301 seconds old: rejected
        let params = signed_params(url, base_params(NOW - 301));
        let err = verifier().verify_lti11(url, &params, NOW).unwrap_err();
        assert_eq!(err, LaunchRejection::TimestampExpired);
    }

    #[test]
    fn test_bad_signature_rejected() {
        let url = "https://tool.example.edu/launch";
        let mut params = base_params(NOW);
        params.push(("oauth_signature".into(), "definitely-wrong".into()));

        let err = verifier().verify_lti11(url, &params, NOW).unwrap_err();
        assert_eq!(err, LaunchRejection::InvalidSignature);
    }

    #[test]
    fn test_trailing_slash_variant_verifies() {
        // Platform signed over the trailing-slash form; canonical
        // reconstruction omits it.
        let signed_url = "https://tool.example.edu/launch/";
        let canonical = "https://tool.example.edu/launch";
        let params = signed_params(signed_url, base_params(NOW));

        assert!(verifier().verify_lti11(canonical, &params, NOW).is_ok());
    }

    #[test]
    fn test_scheme_swap_variant_verifies() {
        let signed_url = "http://tool.example.edu/launch";
        let canonical = "https://tool.example.edu/launch";
        let params = signed_params(signed_url, base_params(NOW));

        assert!(verifier().verify_lti11(canonical, &params, NOW).is_ok());
    }

    #[test]
    fn test_entry_path_variant_verifies() {
        let signed_url = "https://tool.example.edu/";
        let canonical = "https://tool.example.edu/index.php";
        let params = signed_params(signed_url, base_params(NOW));

        assert!(verifier().verify_lti11(canonical, &params, NOW).is_ok());
    }

    #[test]
    fn test_proxy_port_variant_verifies() {
        let signed_url = "https://tool.example.edu/launch";
        let canonical = "https://tool.example.edu:8080/launch";
        let params = signed_params(signed_url, base_params(NOW));

        assert!(verifier().verify_lti11(canonical, &params, NOW).is_ok());
    }

    #[test]
    fn test_outcome_descriptor_built_when_offered() {
        let url = "https://tool.example.edu/launch";
        let mut params = base_params(NOW);
        params.push(("lis_outcome_service_url".into(), "https://lms.example.edu/outcomes".into()));
        params.push(("lis_result_sourcedid".into(), "cell-42".into()));
        let params = signed_params(url, params);

        let ctx = verifier().verify_lti11(url, &params, NOW).unwrap();
        match ctx.grade_passback {
            GradePassback::OAuth1Outcome { service_url, sourced_id, .. } => {
                assert_eq!(service_url, "https://lms.example.edu/outcomes");
                assert_eq!(sourced_id, "cell-42");
            }
            other => panic!("expected OAuth1Outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_name_fallback_to_given_family() {
        let url = "https://tool.example.edu/launch";
        let mut params = base_params(NOW);
        params.retain(|(k, _)| k != "lis_person_name_full");
        params.push(("lis_person_name_given".into(), "Grace".into()));
        params.push(("lis_person_name_family".into(), "Hopper".into()));
        let params = signed_params(url, params);

        let ctx = verifier().verify_lti11(url, &params, NOW).unwrap();
        assert_eq!(ctx.display_name, "Grace Hopper");
    }

    #[test]
    fn test_name_fallback_to_student() {
        let url = "https://tool.example.edu/launch";
        let mut params = base_params(NOW);
        params.retain(|(k, _)| k != "lis_person_name_full");
        let params = signed_params(url, params);

        let ctx = verifier().verify_lti11(url, &params, NOW).unwrap();
        assert_eq!(ctx.display_name, "Student");
    }

    fn make_id_token(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{}.{}.signature", header, payload)
    }

    fn lti13_claims() -> Value {
        serde_json::json!({
            CLAIM_MESSAGE_TYPE: "LtiResourceLinkRequest",
            CLAIM_VERSION: "1.3.0",
            CLAIM_DEPLOYMENT_ID: "dep-1",
            "sub": "user-77",
            "email": "student@example.edu",
            "name": "Ada Lovelace",
            CLAIM_CONTEXT: {"id": "c1", "title": "Intro to Computing"},
            CLAIM_RESOURCE_LINK: {"id": "rl-1", "title": "Lab 3"},
            CLAIM_AGS_ENDPOINT: {
                "lineitem": "https://lms.example.edu/line_items/9",
                "scope": ["https://purl.imsglobal.org/spec/lti-ags/scope/score"]
            }
        })
    }

    #[test]
    fn test_lti13_launch_accepted() {
        let token = make_id_token(&lti13_claims());
        let ctx = verifier().verify_lti13(&token, Some("tok")).unwrap();

        assert_eq!(ctx.version, LtiVersion::V13);
        assert_eq!(ctx.actor_email.as_deref(), Some("student@example.edu"));
        assert_eq!(ctx.resource_link_title.as_deref(), Some("Lab 3"));
        match ctx.grade_passback {
            GradePassback::Lti13Ags { line_item_url, access_token, subject_id } => {
                assert_eq!(line_item_url, "https://lms.example.edu/line_items/9");
                assert_eq!(access_token.as_deref(), Some("tok"));
                assert_eq!(subject_id, "user-77");
            }
            other => panic!("expected Lti13Ags, got {:?}", other),
        }
    }

    #[test]
    fn test_lti13_missing_access_token_disables_passback() {
        let token = make_id_token(&lti13_claims());
        let ctx = verifier().verify_lti13(&token, None).unwrap();
        assert!(!ctx.grade_passback.is_available());
    }

    #[test]
    fn test_lti13_malformed_token_rejected() {
        let err = verifier().verify_lti13("only.two", None).unwrap_err();
        assert!(matches!(err, LaunchRejection::MalformedToken(_)));

        let err = verifier()
            .verify_lti13("a.!!!not-base64!!!.c", None)
            .unwrap_err();
        assert!(matches!(err, LaunchRejection::MalformedToken(_)));
    }

    #[test]
    fn test_lti13_missing_claim_rejected() {
        let mut claims = lti13_claims();
        claims.as_object_mut().unwrap().remove(CLAIM_DEPLOYMENT_ID);
        let err = verifier()
            .verify_lti13(&make_id_token(&claims), None)
            .unwrap_err();
        assert!(matches!(err, LaunchRejection::MalformedToken(_)));
    }

    #[test]
    fn test_lti13_wrong_version_rejected() {
        let mut claims = lti13_claims();
        claims[CLAIM_VERSION] = Value::from("1.2.0");
        let err = verifier()
            .verify_lti13(&make_id_token(&claims), None)
            .unwrap_err();
        assert_eq!(err, LaunchRejection::UnsupportedVersion("1.2.0".into()));
    }

    #[test]
    fn test_reconstruct_launch_url_strips_default_ports_and_query() {
        assert_eq!(
            reconstruct_launch_url("https", "tool.example.edu:443", "/launch?x=1"),
            "https://tool.example.edu/launch"
        );
        assert_eq!(
            reconstruct_launch_url("http", "tool.example.edu:80", "/"),
            "http://tool.example.edu/"
        );
        assert_eq!(
            reconstruct_launch_url("https", "tool.example.edu:8443", "/launch"),
            "https://tool.example.edu:8443/launch"
        );
    }

    #[test]
    fn test_candidate_urls_order_and_dedup() {
        let variants = candidate_urls("https://tool.example.edu/index.php", "/index.php");
        assert_eq!(variants[0], "https://tool.example.edu/index.php");
        assert!(variants.contains(&"http://tool.example.edu/index.php".to_string()));
        assert!(variants.contains(&"https://tool.example.edu/".to_string()));
        assert!(variants.contains(&"https://tool.example.edu".to_string()));

        let mut seen = std::collections::HashSet::new();
        assert!(variants.iter().all(|v| seen.insert(v)));
    }
}
