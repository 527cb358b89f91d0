use reqwest::StatusCode;

use datachat::error::ClientError;
use datachat::gateway::classify_response;
use datachat::model::{
    DurationLimit, ModelName, Performance, QueryAnswer, TranscribePrefs, TranscribeResponse,
    TranscribeTask, UploadOutcome,
};

#[test]
fn forbidden_is_always_a_session_error() {
    // 403 means the session is gone regardless of what the body says.
    let err = classify_response(StatusCode::FORBIDDEN, r#"{"detail":"whatever"}"#).unwrap_err();
    assert_eq!(err, ClientError::Session);
}

#[test]
fn structured_rejection_surfaces_detail() {
    let err = classify_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"detail":"head must be positive"}"#,
    )
    .unwrap_err();
    assert_eq!(
        err,
        ClientError::Api {
            detail: "head must be positive".to_string()
        }
    );
}

#[test]
fn non_string_detail_keeps_its_json_rendering() {
    let err = classify_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"detail":[{"loc":"head"}]}"#,
    )
    .unwrap_err();
    assert_eq!(
        err,
        ClientError::Api {
            detail: r#"[{"loc":"head"}]"#.to_string()
        }
    );
}

#[test]
fn rejection_without_detail_falls_back_to_status() {
    let err = classify_response(StatusCode::INTERNAL_SERVER_ERROR, "{}").unwrap_err();
    assert!(matches!(err, ClientError::Api { .. }));

    let err = classify_response(StatusCode::BAD_GATEWAY, "<html>oops</html>").unwrap_err();
    assert!(matches!(err, ClientError::Api { .. }));
}

#[test]
fn success_requires_valid_json() {
    let value = classify_response(StatusCode::OK, r#"{"token":"abc123"}"#).unwrap();
    assert_eq!(value["token"], "abc123");

    // An empty or non-JSON success body is not a supported case.
    let err = classify_response(StatusCode::OK, "").unwrap_err();
    assert_eq!(err, ClientError::Network);
}

#[test]
fn upload_response_classifies_by_shape() {
    let tabular: UploadOutcome = serde_json::from_str(r#"{"rows":[42,7]}"#).unwrap();
    match tabular {
        UploadOutcome::Tabular { rows } => assert_eq!(rows, vec![42, 7]),
        other => panic!("expected tabular, got {other:?}"),
    }

    let media: UploadOutcome = serde_json::from_str(
        r#"{
            "type": "audio",
            "url": "/media/clip.wav",
            "result": {"duration": 93.5, "lang": "uk", "language": "Ukrainian",
                       "decoded": false, "estimated_cost": 0.561}
        }"#,
    )
    .unwrap();
    match media {
        UploadOutcome::Media {
            media_type,
            url,
            result,
        } => {
            assert_eq!(media_type.as_str(), "audio");
            assert_eq!(url, "/media/clip.wav");
            assert_eq!(result.lang, "uk");
            assert!(!result.decoded);
            assert!(result.segments.is_empty());
        }
        other => panic!("expected media, got {other:?}"),
    }
}

#[test]
fn transcribe_prefs_serialize_to_wire_names() {
    let prefs = TranscribePrefs {
        performance: Performance::Balanced,
        limit: DurationLimit::Head,
        task: TranscribeTask::Translate,
        prompt: "names: Kharkiv".to_string(),
    };
    let json = serde_json::to_value(&prefs).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "performance": "balanced",
            "limit": "head",
            "task": "translate",
            "prompt": "names: Kharkiv"
        })
    );
}

#[test]
fn model_names_use_lowercase_wire_values() {
    assert_eq!(ModelName::Bamboo.as_str(), "bamboo");
    assert_eq!(ModelName::OpenAi.as_str(), "openai");
    assert_eq!(ModelName::parse("openai"), Some(ModelName::OpenAi));
    assert_eq!(ModelName::parse("claude"), None);
}

#[test]
fn query_answer_html_defaults_off() {
    let answer: QueryAnswer = serde_json::from_str(r#"{"answer":"hi"}"#).unwrap();
    assert!(!answer.html);
    assert_eq!(answer.answer_text(), "hi");

    let answer: QueryAnswer = serde_json::from_str(r#"{"answer": 3.5, "html": false}"#).unwrap();
    assert_eq!(answer.answer_text(), "3.5");
}

#[test]
fn transcribe_response_parses_segments() {
    let response: TranscribeResponse = serde_json::from_str(
        r#"{
            "result": {
                "segments": [
                    {"start": 0.0, "end": 4.2, "text": " The stale smell", "token_count": 6},
                    {"start": 4.2, "end": 7.9, "text": " of old beer lingers", "token_count": 8}
                ],
                "duration": 18.3,
                "task": "transcribe",
                "lang": "en",
                "language": "English",
                "decoded": true,
                "limited": false,
                "decode_time": 2.4,
                "estimated_cost": 0.11
            }
        }"#,
    )
    .unwrap();
    let result = response.result;
    assert!(result.decoded);
    assert_eq!(result.segments.len(), 2);
    assert_eq!(result.segments[0].token_count, 6);
    assert_eq!(result.task, TranscribeTask::Transcribe);
}
