//! End-to-end transfer tests against the in-memory blob service
//!
//! These exercise the public facade exactly as an application would, with
//! `MemoryTransferClient` standing in for the remote service.

use blobrelay::blob::{AccessMode, TransferOptions};
use blobrelay::transport::{API_NAME_HEADER, CLIENT_REQUEST_ID_HEADER};
use blobrelay::{
    BlobRelayError, BlobTransferClient, DownloadRequest, ErrorKind, MemoryTransferClient,
    UploadRequest,
};
use reqwest::Method;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_test::{assert_err, assert_ok};

const BASE_URL: &str = "https://storage.example";

fn service() -> Arc<MemoryTransferClient> {
    Arc::new(MemoryTransferClient::new(BASE_URL).unwrap())
}

fn direct(service: &Arc<MemoryTransferClient>) -> BlobTransferClient {
    BlobTransferClient::new(service.clone())
}

fn brokered(service: &Arc<MemoryTransferClient>) -> BlobTransferClient {
    let options = TransferOptions {
        access: AccessMode::Brokered,
        ..TransferOptions::default()
    };
    BlobTransferClient::with_options(service.clone(), options)
}

#[cfg(test)]
mod round_trip_tests {
    use super::*;

    #[tokio::test]
    async fn test_avatar_scenario() {
        let service = service();
        let client = direct(&service);
        let avatar: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();

        let location = assert_ok!(
            client
                .upload_blob("avatar.png", "user-123", avatar.clone(), "updateAvatar")
                .await
        );
        assert_eq!(location, "https://storage.example/user-123/avatar.png");

        let contents = assert_ok!(
            client
                .download_blob("avatar.png", "user-123", "getAvatar")
                .await
        );
        assert_eq!(contents.len(), 2048);
        assert_eq!(contents, avatar);
    }

    #[tokio::test]
    async fn test_zero_length_blob() {
        let service = service();
        let client = direct(&service);

        let location = assert_ok!(client.upload_blob("empty.bin", "docs", Vec::new(), "").await);
        assert!(!location.is_empty());

        let contents = assert_ok!(client.download_blob("empty.bin", "docs", "").await);
        assert!(contents.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_various_payloads() {
        let service = service();
        let client = direct(&service);
        let payloads: Vec<Vec<u8>> = vec![
            vec![0],
            vec![0xFF; 3],
            b"plain text\n".to_vec(),
            (0..=255u8).collect(),
            vec![42; 64 * 1024],
        ];

        for (i, payload) in payloads.into_iter().enumerate() {
            let name = format!("payload-{i}.bin");
            assert_ok!(client.upload_blob(&name, "payloads", payload.clone(), "").await);
            let contents = assert_ok!(client.download_blob(&name, "payloads", "").await);
            assert_eq!(contents, payload, "payload {i}");
        }
    }

    #[tokio::test]
    async fn test_upload_overwrites() {
        let service = service();
        let client = direct(&service);

        assert_ok!(client.upload_blob("notes.txt", "docs", b"v1".to_vec(), "").await);
        assert_ok!(client.upload_blob("notes.txt", "docs", b"v2".to_vec(), "").await);

        assert_eq!(service.get("docs", "notes.txt").await, Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn test_names_with_spaces_and_directories() {
        let service = service();
        let client = direct(&service);

        let location = assert_ok!(
            client
                .upload_blob("2024/q1/my report.pdf", "docs", b"%PDF".to_vec(), "")
                .await
        );
        assert_eq!(
            location,
            "https://storage.example/docs/2024/q1/my%20report.pdf"
        );
        let contents = assert_ok!(client.download_blob("2024/q1/my report.pdf", "docs", "").await);
        assert_eq!(contents, b"%PDF");
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_download_missing_blob_is_not_found() {
        let service = service();
        let client = direct(&service);

        let err = assert_err!(client.download_blob("ghost.png", "user-123", "getAvatar").await);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(
            err,
            BlobRelayError::NotFound { ref container, ref name }
                if container == "user-123" && name == "ghost.png"
        ));
    }

    #[tokio::test]
    async fn test_simulated_network_failure_on_upload() {
        let service = service();
        let client = direct(&service);
        service
            .fail_next(BlobRelayError::network("connection reset by peer"))
            .await;

        let err = assert_err!(
            client
                .upload_blob("avatar.png", "user-123", vec![1; 8], "updateAvatar")
                .await
        );
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
        assert_eq!(service.get("user-123", "avatar.png").await, None);
    }

    #[tokio::test]
    async fn test_denied_container_is_auth_failure() {
        let service = service();
        let client = direct(&service);
        service.deny_container("private").await;

        let err = assert_err!(client.upload_blob("a.txt", "private", vec![1], "").await);
        assert_eq!(err.kind(), ErrorKind::AuthFailure);

        let err = assert_err!(client.download_blob("a.txt", "private", "").await);
        assert_eq!(err.kind(), ErrorKind::AuthFailure);
    }

    #[tokio::test]
    async fn test_empty_identifiers_are_rejected_without_a_request() {
        let service = service();
        let client = direct(&service);

        let err = assert_err!(client.upload_blob("a.txt", "", vec![1], "").await);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(service.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_dot_segments_never_reach_transport() {
        let service = service();
        let client = direct(&service);
        service.insert("docs", "b", b"keep".to_vec()).await;

        for name in ["a/../b", "./x", ".."] {
            let err = assert_err!(client.upload_blob(name, "docs", vec![1], "").await);
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{name}");
            let err = assert_err!(client.download_blob(name, "docs", "").await);
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{name}");
        }

        assert!(service.requests().await.is_empty());
        assert_eq!(service.get("docs", "b").await, Some(b"keep".to_vec()));
    }
}

#[cfg(test)]
mod request_shape_tests {
    use super::*;

    #[tokio::test]
    async fn test_api_name_passed_through_unmodified() {
        let service = service();
        let client = direct(&service);

        assert_ok!(
            client
                .upload_blob("a.txt", "docs", b"x".to_vec(), "Update Avatar/v2?")
                .await
        );
        assert_ok!(client.download_blob("a.txt", "docs", "").await);

        let requests = service.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(
            requests[0].header_value(API_NAME_HEADER),
            Some("Update Avatar/v2?")
        );
        assert_eq!(requests[1].method, Method::GET);
        assert_eq!(requests[1].header_value(API_NAME_HEADER), Some(""));
        assert_ne!(
            requests[0].header_value(CLIENT_REQUEST_ID_HEADER),
            requests[1].header_value(CLIENT_REQUEST_ID_HEADER)
        );
    }
}

#[cfg(test)]
mod brokered_tests {
    use super::*;

    #[tokio::test]
    async fn test_brokered_round_trip() {
        let service = service();
        let client = brokered(&service);

        let location = assert_ok!(
            client
                .upload_blob("avatar.png", "user-123", vec![5; 2048], "updateAvatar")
                .await
        );
        assert_eq!(location, "https://storage.example/user-123/avatar.png");

        let contents = assert_ok!(
            client
                .download_blob("avatar.png", "user-123", "getAvatar")
                .await
        );
        assert_eq!(contents, vec![5; 2048]);

        let requests = service.requests().await;
        let methods: Vec<Method> = requests.iter().map(|r| r.method.clone()).collect();
        assert_eq!(
            methods,
            vec![Method::POST, Method::PUT, Method::POST, Method::GET]
        );
        assert_eq!(requests[0].path, "api/resources?type=blob");
        assert!(requests[1].path.contains("sp=w"));
        assert!(requests[3].path.contains("sp=r"));
    }

    #[tokio::test]
    async fn test_brokered_missing_blob_is_not_found() {
        let service = service();
        let client = brokered(&service);

        let err = assert_err!(client.download_blob("ghost.png", "user-123", "").await);
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_broker_failure_surfaces_once() {
        let service = service();
        let client = brokered(&service);
        service.fail_next(BlobRelayError::auth("token expired")).await;

        let err = assert_err!(client.upload_blob("a.txt", "docs", vec![1], "").await);
        assert_eq!(err.kind(), ErrorKind::AuthFailure);
        assert_eq!(service.requests().await.len(), 1);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_uploads_have_no_cross_talk() {
        let service = service();
        let client = direct(&service);

        let completions: Vec<_> = (0..32)
            .map(|i| {
                let contents = format!("blob number {i}").into_bytes();
                client.spawn_upload(UploadRequest::new(
                    format!("blob-{i}.txt"),
                    "bulk",
                    contents,
                    "bulkUpload",
                ))
            })
            .collect();

        let locations = futures::future::join_all(completions).await;
        for (i, location) in locations.into_iter().enumerate() {
            let location = assert_ok!(location);
            assert_eq!(location, format!("https://storage.example/bulk/blob-{i}.txt"));
        }

        for i in 0..32 {
            let contents = assert_ok!(
                client
                    .spawn_download(DownloadRequest::new(format!("blob-{i}.txt"), "bulk", ""))
                    .await
            );
            assert_eq!(contents, format!("blob number {i}").into_bytes());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_completion_handlers_fire_once_per_call() {
        let service = service();
        let client = direct(&service);
        service.insert("docs", "present.txt", b"here".to_vec()).await;

        let (found_tx, found_rx) = oneshot::channel();
        client.download_blob_with_completion(
            DownloadRequest::new("present.txt", "docs", ""),
            move |result| {
                let _ = found_tx.send(result);
            },
        );

        let (missing_tx, missing_rx) = oneshot::channel();
        client.download_blob_with_completion(
            DownloadRequest::new("absent.txt", "docs", ""),
            move |result| {
                let _ = missing_tx.send(result);
            },
        );

        let (upload_tx, upload_rx) = oneshot::channel();
        client.upload_blob_with_completion(
            UploadRequest::new("new.txt", "docs", b"fresh".to_vec(), "save"),
            move |result| {
                let _ = upload_tx.send(result);
            },
        );

        assert_eq!(assert_ok!(found_rx.await.unwrap()), b"here".to_vec());
        assert_eq!(
            assert_err!(missing_rx.await.unwrap()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            assert_ok!(upload_rx.await.unwrap()),
            "https://storage.example/docs/new.txt"
        );
    }
}
