//! End-to-end workflow against a mock grading service

use grader_client::{GraderClient, GraderError, Outcome, Overrides};
use mockito::Matcher;
use std::fs;
use tempfile::TempDir;

#[test]
fn upload_then_process_sends_uploaded_uri() {
    let mut server = mockito::Server::new();
    let temp = TempDir::new().unwrap();
    let image = temp.path().join("sheet.jpg");
    fs::write(&image, b"scanned sheet").unwrap();

    let upload = server
        .mock("POST", "/api/upload/image")
        .with_status(200)
        .with_body(r#"{"uri": "abc123"}"#)
        .expect(1)
        .create();
    let process = server
        .mock("POST", "/api/process/image")
        .match_body(Matcher::UrlEncoded("uri".into(), "abc123".into()))
        .with_status(200)
        .with_body(r#"{"uri": "abc123"}"#)
        .expect(1)
        .create();

    let client = GraderClient::new(&server.url(), "token").unwrap();
    let uri = client
        .upload_image(&image, &Overrides::new())
        .unwrap()
        .into_value()
        .unwrap();
    let processed = client.process_image(&Overrides::new().uri(uri)).unwrap();

    assert_eq!(processed.into_value().as_deref(), Some("abc123"));
    upload.assert();
    process.assert();
}

#[test]
fn full_answer_sheet_round_trip() {
    let mut server = mockito::Server::new();
    let temp = TempDir::new().unwrap();
    let image = temp.path().join("sheet.png");
    fs::write(&image, b"png sheet").unwrap();
    let corrected = temp.path().join("corrected.json");
    fs::write(&corrected, br#"{"12": "D"}"#).unwrap();
    let jpeg: Vec<u8> = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0xFF, 0xD9];

    let _upload = server
        .mock("POST", "/api/upload/image")
        .with_status(200)
        .with_body(r#"{"uri": "sheet-77"}"#)
        .create();
    let _process = server
        .mock("POST", "/api/process/image")
        .with_status(200)
        .with_body(r#"{"uri": "sheet-77"}"#)
        .create();
    let _answers = server
        .mock("POST", "/api/download/marked_answers")
        .match_body(Matcher::UrlEncoded("uri".into(), "sheet-77".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"12": "C"}"#)
        .create();
    let _image = server
        .mock("POST", "/api/download/confirmation_image")
        .match_body(Matcher::UrlEncoded("uri".into(), "sheet-77".into()))
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(&jpeg)
        .create();
    let update = server
        .mock("PUT", "/api/update/marked_answers")
        .match_body(Matcher::Regex(r#"name="uri"\r\n\r\nsheet-77\r\n"#.into()))
        .with_status(200)
        .with_body(r#"{"uri": "sheet-77"}"#)
        .expect(1)
        .create();

    let mut client = GraderClient::builder()
        .base_url(&server.url())
        .unwrap()
        .credential("token")
        .unwrap()
        .download_directory(temp.path())
        .build()
        .unwrap();

    let uri = client
        .upload_image(&image, &Overrides::new())
        .unwrap()
        .into_value()
        .unwrap();
    client.set_uri(uri);
    assert!(client.process_image(&Overrides::new()).unwrap().is_success());

    let answers_path = client.download_path("answers.json").unwrap();
    let (response, saved) = client
        .download_marked_answers(&answers_path, &Overrides::new())
        .unwrap()
        .into_parts();
    assert_eq!(response.status(), 200);
    assert_eq!(saved.as_ref(), Some(&answers_path));
    assert_eq!(fs::read(&answers_path).unwrap(), br#"{"12": "C"}"#);

    let image_path = client.download_path("confirmation.jpg").unwrap();
    client
        .download_confirmation_image(&image_path, &Overrides::new())
        .unwrap();
    assert_eq!(fs::read(&image_path).unwrap(), jpeg);

    let updated = client
        .update_marked_answers(&corrected, &Overrides::new())
        .unwrap();
    assert!(matches!(updated, Outcome::Success { ref value, .. } if value == "sheet-77"));
    update.assert();
}

#[test]
fn rejected_download_is_not_an_error() {
    let mut server = mockito::Server::new();
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("answers.json");

    let _mock = server
        .mock("POST", "/api/download/marked_answers")
        .with_status(403)
        .with_body("forbidden")
        .create();

    let client = GraderClient::new(&server.url(), "token").unwrap();
    let outcome = client
        .download_marked_answers(&destination, &Overrides::new().uri("sheet"))
        .unwrap();

    match outcome {
        Outcome::ServerRejected(response) => {
            assert_eq!(response.status(), 403);
            assert_eq!(response.text(), "forbidden");
        }
        Outcome::Success { .. } => panic!("403 should not be a success"),
    }
    assert!(!destination.exists());
}

#[test]
fn unresolvable_uri_points_to_process_step() {
    let mut server = mockito::Server::new();
    let temp = TempDir::new().unwrap();

    let _mock = server
        .mock("POST", "/api/download/marked_answers")
        .with_status(500)
        .create();

    let client = GraderClient::new(&server.url(), "token").unwrap();
    let err = client
        .download_marked_answers(temp.path().join("a.json"), &Overrides::new().uri("stale"))
        .unwrap_err();

    assert!(matches!(err, GraderError::RemoteNotFound { .. }));
    let message = err.to_string();
    assert!(message.contains("stale"));
    assert!(message.contains("process_image"));
}

#[test]
fn validators_available_from_crate_root() {
    let temp = TempDir::new().unwrap();
    let image = temp.path().join("sheet.tiff");
    fs::write(&image, b"tiff").unwrap();

    assert!(grader_client::IMAGE_EXTENSIONS.contains(&"tiff"));
    assert!(grader_client::validate_image_path(&image).is_ok());
    assert!(grader_client::validate_destination(&temp.path().join("a.jpg"), "jpg").is_ok());
    assert_eq!(
        grader_client::validate_url(grader_client::resolve(None, Some("https://actgrader.com")))
            .unwrap(),
        "https://actgrader.com"
    );
    assert!(matches!(
        grader_client::validate_url(Some("")),
        Err(GraderError::InvalidFormat(_))
    ));
    assert!(grader_client::validate_uri(Some("sheet")).is_ok());
    assert!(grader_client::validate_credential(None).is_err());
}
