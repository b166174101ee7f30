//! Grade passback to the LMS
//!
//! Transmits a computed grade using the protocol the launch offered:
//! OAuth 1.0a signed POX XML for LTI 1.1 Outcomes, or a bearer-token JSON
//! score for LTI 1.3 AGS. Both paths are fire-and-forget: no retry, no
//! idempotency key - resubmitting simply overwrites the previous grade in
//! the LMS gradebook.

use chrono::Utc;
use rand::RngCore;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Args;
use crate::lti::launch::GradePassback;
use crate::lti::oauth1::{authorization_header, body_hash, sign_params};

/// Outcome of one passback attempt. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct GradeResult {
    /// Normalized grade in [0, 1]
    pub grade: f64,
    pub transmitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_error: Option<String>,
}

impl GradeResult {
    fn sent(grade: f64) -> Self {
        Self {
            grade,
            transmitted: true,
            transport_error: None,
        }
    }

    fn failed(grade: f64, error: impl Into<String>) -> Self {
        Self {
            grade,
            transmitted: false,
            transport_error: Some(error.into()),
        }
    }
}

/// Escape a value for embedding in XML text content
fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Build the LTI 1.1 Outcomes replaceResult envelope
pub fn build_pox_envelope(sourced_id: &str, grade: f64) -> String {
    let message_id = format!("msg_{}", Uuid::new_v4().simple());
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<imsx_POXEnvelopeRequest xmlns="http://www.imsglobal.org/services/ltiv1p1/xsd/imsoms_v1p0">
    <imsx_POXHeader>
        <imsx_POXRequestHeaderInfo>
            <imsx_version>V1.0</imsx_version>
            <imsx_messageIdentifier>{message_id}</imsx_messageIdentifier>
        </imsx_POXRequestHeaderInfo>
    </imsx_POXHeader>
    <imsx_POXBody>
        <replaceResultRequest>
            <resultRecord>
                <sourcedGUID>
                    <sourcedId>{sourced_id}</sourcedId>
                </sourcedGUID>
                <result>
                    <resultScore>
                        <language>en</language>
                        <textString>{score:.4}</textString>
                    </resultScore>
                </result>
            </resultRecord>
        </replaceResultRequest>
    </imsx_POXBody>
</imsx_POXEnvelopeRequest>"#,
        message_id = message_id,
        sourced_id = xml_escape(sourced_id),
        score = grade,
    )
}

/// AGS score object posted to `{line_item_url}/scores`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgsScore {
    pub user_id: String,
    pub score_given: f64,
    pub score_maximum: f64,
    pub activity_progress: String,
    pub grading_progress: String,
    pub timestamp: String,
}

pub fn build_ags_score(subject_id: &str, grade: f64, timestamp: String) -> AgsScore {
    AgsScore {
        user_id: subject_id.to_string(),
        score_given: grade * 100.0,
        score_maximum: 100.0,
        activity_progress: "Completed".to_string(),
        grading_progress: "FullyGraded".to_string(),
        timestamp,
    }
}

/// Signs and transmits grades using the variant the launch context carries
pub struct PassbackClient {
    http_client: reqwest::Client,
}

impl PassbackClient {
    pub fn new(args: &Args) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(args.request_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { http_client }
    }

    /// Submit a grade via whichever protocol the launch offered.
    ///
    /// The grade is clamped to [0, 1] before transmission. Transport
    /// failures come back inside the [`GradeResult`] so the rest of the
    /// report still renders.
    pub async fn submit(&self, passback: &GradePassback, grade: f64) -> GradeResult {
        let grade = grade.clamp(0.0, 1.0);

        match passback {
            GradePassback::None => {
                GradeResult::failed(grade, "Grade passback not available for this launch")
            }
            GradePassback::OAuth1Outcome {
                service_url,
                sourced_id,
                consumer_key,
                consumer_secret,
            } => {
                self.send_oauth1_outcome(service_url, sourced_id, consumer_key, consumer_secret, grade)
                    .await
            }
            GradePassback::Lti13Ags {
                line_item_url,
                access_token,
                subject_id,
            } => match access_token {
                Some(token) => {
                    self.send_ags_score(line_item_url, token, subject_id, grade)
                        .await
                }
                None => GradeResult::failed(grade, "LTI 1.3 grade passback not configured"),
            },
        }
    }

    /// LTI 1.1 Outcomes: two-legged OAuth with a body hash over the XML
    async fn send_oauth1_outcome(
        &self,
        service_url: &str,
        sourced_id: &str,
        consumer_key: &str,
        consumer_secret: &str,
        grade: f64,
    ) -> GradeResult {
        let xml = build_pox_envelope(sourced_id, grade);

        let mut nonce_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let mut oauth: Vec<(String, String)> = vec![
            ("oauth_consumer_key".into(), consumer_key.to_string()),
            ("oauth_nonce".into(), hex::encode(nonce_bytes)),
            ("oauth_signature_method".into(), "HMAC-SHA1".into()),
            ("oauth_timestamp".into(), Utc::now().timestamp().to_string()),
            ("oauth_version".into(), "1.0".into()),
            ("oauth_body_hash".into(), body_hash(xml.as_bytes())),
        ];
        let signature = sign_params("POST", service_url, &oauth, consumer_secret);
        oauth.push(("oauth_signature".into(), signature));
        oauth.sort();

        let response = self
            .http_client
            .post(service_url)
            .header("Content-Type", "application/xml")
            .header("Authorization", authorization_header(&oauth))
            .body(xml)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                // Loose success heuristic: 2xx plus the word "success"
                // somewhere in the POX response, no full XML parsing
                if status.is_success() && (body.contains("success") || body.contains("Success")) {
                    info!("outcome service accepted grade {:.4}", grade);
                    GradeResult::sent(grade)
                } else {
                    warn!("outcome service rejected grade (HTTP {})", status.as_u16());
                    GradeResult::failed(
                        grade,
                        format!("Grade passback failed (HTTP {})", status.as_u16()),
                    )
                }
            }
            Err(e) => GradeResult::failed(grade, format!("Grade passback failed: {}", e)),
        }
    }

    /// LTI 1.3 AGS: bearer-token JSON score
    async fn send_ags_score(
        &self,
        line_item_url: &str,
        access_token: &str,
        subject_id: &str,
        grade: f64,
    ) -> GradeResult {
        let score_url = format!("{}/scores", line_item_url.trim_end_matches('/'));
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let score = build_ags_score(subject_id, grade, timestamp);

        let response = self
            .http_client
            .post(&score_url)
            .header("Content-Type", "application/vnd.ims.lis.v1.score+json")
            .header("Authorization", format!("Bearer {}", access_token))
            .json(&score)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("AGS accepted grade {:.4}", grade);
                GradeResult::sent(grade)
            }
            Ok(resp) => GradeResult::failed(
                grade,
                format!("LTI 1.3 grade passback failed (HTTP {})", resp.status().as_u16()),
            ),
            Err(e) => GradeResult::failed(grade, format!("LTI 1.3 grade passback failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pox_envelope_contents() {
        let xml = build_pox_envelope("cell-42", 0.9);
        assert!(xml.contains("<sourcedId>cell-42</sourcedId>"));
        assert!(xml.contains("<textString>0.9000</textString>"));
        assert!(xml.contains("replaceResultRequest"));
        assert!(xml.contains("<imsx_messageIdentifier>msg_"));
    }

    #[test]
    fn test_pox_envelope_escapes_sourced_id() {
        let xml = build_pox_envelope("a&b<c>\"d\"", 1.0);
        assert!(xml.contains("<sourcedId>a&amp;b&lt;c&gt;&quot;d&quot;</sourcedId>"));
    }

    #[test]
    fn test_pox_message_ids_are_unique() {
        let a = build_pox_envelope("x", 0.5);
        let b = build_pox_envelope("x", 0.5);
        assert_ne!(a, b);
    }

    #[test]
    fn test_grade_formats_to_four_decimals() {
        let xml = build_pox_envelope("x", 1.0 / 3.0);
        assert!(xml.contains("<textString>0.3333</textString>"));
    }

    #[test]
    fn test_ags_score_shape() {
        let score = build_ags_score("user-77", 0.85, "2026-01-05T10:00:00Z".to_string());
        let json = serde_json::to_value(&score).unwrap();

        assert_eq!(json["userId"], "user-77");
        assert_eq!(json["scoreGiven"], 85.0);
        assert_eq!(json["scoreMaximum"], 100.0);
        assert_eq!(json["activityProgress"], "Completed");
        assert_eq!(json["gradingProgress"], "FullyGraded");
        assert_eq!(json["timestamp"], "2026-01-05T10:00:00Z");
    }

    #[tokio::test]
    async fn test_submit_without_passback_reports_unavailable() {
        let args = <Args as clap::Parser>::parse_from(["gradeway"]);
        let client = PassbackClient::new(&args);
        let result = client.submit(&GradePassback::None, 0.7).await;

        assert!(!result.transmitted);
        assert_eq!(result.grade, 0.7);
        assert!(result.transport_error.unwrap().contains("not available"));
    }

    #[tokio::test]
    async fn test_submit_clamps_grade() {
        let args = <Args as clap::Parser>::parse_from(["gradeway"]);
        let client = PassbackClient::new(&args);
        let result = client.submit(&GradePassback::None, 1.7).await;
        assert_eq!(result.grade, 1.0);
    }

    #[tokio::test]
    async fn test_submit_ags_without_token_disabled() {
        let args = <Args as clap::Parser>::parse_from(["gradeway"]);
        let client = PassbackClient::new(&args);
        let passback = GradePassback::Lti13Ags {
            line_item_url: "https://lms.example.edu/line_items/9".to_string(),
            access_token: None,
            subject_id: "user-77".to_string(),
        };
        let result = client.submit(&passback, 0.5).await;
        assert!(!result.transmitted);
        assert!(result.transport_error.unwrap().contains("not configured"));
    }
}
