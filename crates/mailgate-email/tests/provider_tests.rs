//! Provider adapters against mocked provider APIs

use http::StatusCode;
use mailgate_config::{ProviderConfig, ProviderKind, SendLimits};
use mailgate_email::{
    Address, Attachment, EmailError, MailGunProvider, MailProvider, Message, SendGridProvider,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SENDGRID_PATH: &str = "/v3/mail/send";
const MAILGUN_PATH: &str = "/v3/example.com/messages";

fn minimal_message() -> Message {
    Message::new(
        Address::new("a@x.com"),
        vec![Address::new("b@x.com")],
        "S",
        "B",
    )
}

fn sendgrid(server: &MockServer, limits: SendLimits) -> SendGridProvider {
    let config = ProviderConfig::new(
        ProviderKind::SendGrid,
        format!("{}{}", server.uri(), SENDGRID_PATH),
        "SG.test-key",
    );
    SendGridProvider::new(&config, limits, Duration::from_secs(5)).unwrap()
}

fn mailgun(server: &MockServer, limits: SendLimits) -> MailGunProvider {
    let config = ProviderConfig::new(
        ProviderKind::MailGun,
        format!("{}{}", server.uri(), MAILGUN_PATH),
        "api:key-test",
    );
    MailGunProvider::new(&config, limits, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_sendgrid_minimal_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SENDGRID_PATH))
        .and(header("Authorization", "Bearer SG.test-key"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "from": {"email": "a@x.com"},
            "personalizations": [{"to": [{"email": "b@x.com"}]}],
            "subject": "S",
            "content": [{"type": "text/plain", "value": "B"}]
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let provider = sendgrid(&server, SendLimits::default());
    provider.send(&minimal_message(), &[]).await.unwrap();
}

#[tokio::test]
async fn test_mailgun_minimal_message() {
    let server = MockServer::start().await;

    // base64("api:key-test")
    Mock::given(method("POST"))
        .and(path(MAILGUN_PATH))
        .and(header("Authorization", "Basic YXBpOmtleS10ZXN0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "<20240101.1@example.com>",
            "message": "Queued. Thank you."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = mailgun(&server, SendLimits::default());
    provider.send(&minimal_message(), &[]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&requests[0].body);
    for (name, value) in [("from", "a@x.com"), ("to", "b@x.com"), ("subject", "S"), ("text", "B")] {
        assert!(
            body.contains(&format!("name=\"{}\"\r\n\r\n{}\r\n", name, value)),
            "missing field {} in {}",
            name,
            body
        );
    }
    assert!(!body.contains("name=\"cc\""));
    assert!(!body.contains("name=\"bcc\""));
}

#[tokio::test]
async fn test_mailgun_sends_bcc_and_attachment_parts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MAILGUN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let message = minimal_message()
        .with_cc(vec![Address::new("c@x.com").with_name("Carol")])
        .with_bcc(vec![Address::new("d@x.com")]);
    let attachments = vec![Attachment::from_bytes(
        "notes.txt",
        "text/plain",
        b"hello world".to_vec(),
    )];

    let provider = mailgun(&server, SendLimits::default());
    provider.send(&message, &attachments).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"cc\"\r\n\r\nCarol <c@x.com>\r\n"));
    assert!(body.contains("name=\"bcc\"\r\n\r\nd@x.com\r\n"));
    assert!(body.contains("name=\"attachment\"; filename=\"notes.txt\""));
    assert!(body.contains("hello world"));
}

#[tokio::test]
async fn test_mailgun_display_name_cannot_add_recipients() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MAILGUN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let limits = SendLimits {
        max_recipients: 1,
        ..SendLimits::default()
    };
    let message = Message::new(
        Address::new("a@x.com").with_name("Alice, Mallory <m@x.com>"),
        vec![Address::new("b@x.com").with_name("evil1@attacker.com, evil2@attacker.com, Bob")],
        "S",
        "B",
    );

    mailgun(&server, limits).send(&message, &[]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(
        body.contains(
            "name=\"to\"\r\n\r\n\"evil1@attacker.com, evil2@attacker.com, Bob\" <b@x.com>\r\n"
        ),
        "unexpected body {}",
        body
    );
    assert!(body.contains("name=\"from\"\r\n\r\n\"Alice, Mallory <m@x.com>\" <a@x.com>\r\n"));
}

#[tokio::test]
async fn test_mailgun_malformed_attachment_type_is_sent_as_octet_stream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MAILGUN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let attachments = vec![Attachment::from_bytes(
        "upload.dat",
        "not a mime",
        b"payload".to_vec(),
    )];
    mailgun(&server, SendLimits::default())
        .send(&minimal_message(), &attachments)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(
        "filename=\"upload.dat\"\r\nContent-Type: application/octet-stream\r\n"
    ));
    assert!(body.contains("payload"));
}

#[tokio::test]
async fn test_sendgrid_attachment_is_base64() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SENDGRID_PATH))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let attachments = vec![Attachment::from_bytes("a.txt", "text/plain", b"abc".to_vec())];
    let provider = sendgrid(&server, SendLimits::default());
    provider.send(&minimal_message(), &attachments).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["attachments"],
        json!([{"content": "YWJj", "type": "text/plain", "filename": "a.txt"}])
    );
}

#[tokio::test]
async fn test_auth_failures_are_classified() {
    for (code, status) in [(401, StatusCode::UNAUTHORIZED), (403, StatusCode::FORBIDDEN)] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(code))
            .mount(&server)
            .await;

        let err = sendgrid(&server, SendLimits::default())
            .send(&minimal_message(), &[])
            .await
            .unwrap_err();
        assert_eq!(err, EmailError::ProviderAuth { status });

        let err = mailgun(&server, SendLimits::default())
            .send(&minimal_message(), &[])
            .await
            .unwrap_err();
        assert_eq!(err, EmailError::ProviderAuth { status });
        assert!(err.is_retryable());
    }
}

#[tokio::test]
async fn test_server_error_is_api_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = mailgun(&server, SendLimits::default())
        .send(&minimal_message(), &[])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EmailError::ProviderApi {
            status: StatusCode::INTERNAL_SERVER_ERROR
        }
    );
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_size_exceeded_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let limits = SendLimits {
        max_mail_size: 64,
        ..SendLimits::default()
    };
    // 48 raw bytes encode to 64
    let attachments = vec![Attachment::from_bytes("big.bin", "", vec![7u8; 48])];

    for result in [
        sendgrid(&server, limits)
            .send(&minimal_message(), &attachments)
            .await,
        mailgun(&server, limits)
            .send(&minimal_message(), &attachments)
            .await,
    ] {
        assert_eq!(result, Err(EmailError::MailSizeExceeded { limit: 64 }));
    }
}

#[tokio::test]
async fn test_unreachable_provider() {
    let config = ProviderConfig::new(
        ProviderKind::SendGrid,
        "http://127.0.0.1:1/v3/mail/send",
        "SG.test-key",
    );
    let provider =
        SendGridProvider::new(&config, SendLimits::default(), Duration::from_secs(2)).unwrap();

    let err = provider.send(&minimal_message(), &[]).await.unwrap_err();
    assert_eq!(err, EmailError::ProviderUnavailable);
    assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
}
