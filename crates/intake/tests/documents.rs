//! Document consistency tests: blob-first writes, compensation, and
//! blob-first deletes.

mod common;

use assert_matches::assert_matches;
use common::*;
use hearth_core::documents::{DocumentType, MAX_UPLOAD_BYTES};
use hearth_core::need::NeedStep;
use hearth_core::types::new_id;
use hearth_intake::memory::FailPoint;
use hearth_intake::{DocumentMetadataInput, IntakeError, UploadFile};

#[tokio::test]
async fn upload_writes_blob_and_row() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;

    let summary = h
        .intake
        .upload_documents(user_id, need.id, vec![pdf("lease.pdf")])
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 1);
    let document = &summary.uploaded[0];
    assert_eq!(
        document.storage_key,
        format!("needs/{}/documents/{}.pdf", need.id, document.id)
    );
    assert_eq!(document.file_name, "lease.pdf");
    assert_eq!(document.mime_type, "application/pdf");
    assert_eq!(document.document_type, DocumentType::UtilityBill);
    let blob = h.objects.get(&document.storage_key).unwrap();
    assert_eq!(blob.content_type, "application/pdf");
    assert_eq!(h.store.documents_of(need.id).len(), 1);
}

#[tokio::test]
async fn client_path_never_reaches_storage_key() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    let file = UploadFile {
        file_name: "../../other/secret.pdf".to_string(),
        ..pdf("ignored")
    };

    let summary = h
        .intake
        .upload_documents(user_id, need.id, vec![file])
        .await
        .unwrap();

    let document = &summary.uploaded[0];
    assert_eq!(document.file_name, "secret.pdf");
    assert!(!document.storage_key.contains("secret"));
    assert!(!document.storage_key.contains(".."));
}

#[tokio::test]
async fn empty_file_rejected_before_any_write() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    let empty = UploadFile {
        bytes: Vec::new(),
        ..pdf("empty.pdf")
    };

    let summary = h
        .intake
        .upload_documents(user_id, need.id, vec![empty])
        .await
        .unwrap();

    assert_eq!(summary.failed_files(), vec!["empty.pdf"]);
    assert!(summary.failed[0].reason.contains("empty"));
    assert!(h.objects.is_empty());
    assert!(h.store.documents_of(need.id).is_empty());
}

#[tokio::test]
async fn oversized_file_rejected_before_any_write() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    let big = UploadFile {
        bytes: vec![0u8; MAX_UPLOAD_BYTES as usize + 1],
        ..pdf("scan.pdf")
    };

    let err = h
        .intake
        .controller()
        .documents()
        .upload(need.id, user_id, big)
        .await
        .unwrap_err();

    assert_matches!(err, IntakeError::Validation(ref fields) if fields.contains("file"));
    assert!(h.objects.is_empty());
}

#[tokio::test]
async fn failed_row_insert_removes_blob() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    h.store.fail(FailPoint::DocumentCreate);

    let err = h
        .intake
        .controller()
        .documents()
        .upload(need.id, user_id, pdf("lease.pdf"))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(h.objects.is_empty());
    assert!(h.store.documents_of(need.id).is_empty());
}

#[tokio::test]
async fn failed_compensation_leaves_orphan_blob_only() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    h.store.fail(FailPoint::DocumentCreate);
    h.objects.fail_deletes(true);

    let err = h
        .intake
        .controller()
        .documents()
        .upload(need.id, user_id, pdf("lease.pdf"))
        .await
        .unwrap_err();

    assert_matches!(err, IntakeError::Store(_));
    assert_eq!(h.objects.len(), 1);
    assert!(h.store.documents_of(need.id).is_empty());
}

#[tokio::test]
async fn failed_blob_write_creates_no_row() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    h.objects.fail_puts(true);

    let err = h
        .intake
        .controller()
        .documents()
        .upload(need.id, user_id, pdf("lease.pdf"))
        .await
        .unwrap_err();

    assert_matches!(err, IntakeError::ObjectStore(_));
    assert!(err.is_retryable());
    assert!(h.store.documents_of(need.id).is_empty());
}

#[tokio::test]
async fn batch_reports_each_file_independently() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    let files = vec![
        pdf("lease.pdf"),
        UploadFile {
            bytes: Vec::new(),
            ..pdf("blank.pdf")
        },
        pdf("bill.pdf"),
    ];

    let summary = h
        .intake
        .upload_documents(user_id, need.id, files)
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed_files(), vec!["blank.pdf"]);
    assert_eq!(h.objects.len(), 2);
    assert_eq!(h.store.documents_of(need.id).len(), 2);
}

#[tokio::test]
async fn delete_removes_blob_then_row() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    let summary = h
        .intake
        .upload_documents(user_id, need.id, vec![pdf("lease.pdf")])
        .await
        .unwrap();
    let document = &summary.uploaded[0];

    h.intake
        .delete_document(user_id, need.id, document.id)
        .await
        .unwrap();

    assert!(!h.objects.contains(&document.storage_key));
    assert!(h.store.documents_of(need.id).is_empty());
}

#[tokio::test]
async fn failed_blob_delete_keeps_row() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    let summary = h
        .intake
        .upload_documents(user_id, need.id, vec![pdf("lease.pdf")])
        .await
        .unwrap();
    let document = &summary.uploaded[0];
    h.objects.fail_deletes(true);

    let err = h
        .intake
        .delete_document(user_id, need.id, document.id)
        .await
        .unwrap_err();

    assert_matches!(err, IntakeError::ObjectStore(_));
    assert!(h.objects.contains(&document.storage_key));
    assert_eq!(h.store.documents_of(need.id).len(), 1);
}

#[tokio::test]
async fn failed_row_delete_leaves_no_dangling_row_reference() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    let summary = h
        .intake
        .upload_documents(user_id, need.id, vec![pdf("lease.pdf")])
        .await
        .unwrap();
    let document = &summary.uploaded[0];
    h.store.fail(FailPoint::DocumentDelete);

    let err = h
        .intake
        .delete_document(user_id, need.id, document.id)
        .await
        .unwrap_err();

    // The blob is already gone; the surviving row is retried by the caller.
    assert!(err.is_retryable());
    assert!(!h.objects.contains(&document.storage_key));

    h.store.recover(FailPoint::DocumentDelete);
    h.intake
        .delete_document(user_id, need.id, document.id)
        .await
        .unwrap();
    assert!(h.store.documents_of(need.id).is_empty());
}

#[tokio::test]
async fn deleting_unknown_document_is_not_found() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;

    let err = h
        .intake
        .delete_document(user_id, need.id, new_id())
        .await
        .unwrap_err();

    assert_matches!(err, IntakeError::NotFound { entity: "document", .. });
}

#[tokio::test]
async fn documents_of_another_need_are_not_reachable() {
    let h = harness();
    let user_id = user();
    let first = draft_at(&h, user_id, NeedStep::Documents).await;
    let summary = h
        .intake
        .upload_documents(user_id, first.id, vec![pdf("lease.pdf")])
        .await
        .unwrap();
    let other = user();
    let second = draft_at(&h, other, NeedStep::Documents).await;

    let err = h
        .intake
        .delete_document(other, second.id, summary.uploaded[0].id)
        .await
        .unwrap_err();

    assert_matches!(err, IntakeError::NotFound { .. });
    assert_eq!(h.objects.len(), 1);
}

#[tokio::test]
async fn metadata_update_retypes_and_renames() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    let summary = h
        .intake
        .upload_documents(user_id, need.id, vec![pdf("lease.pdf")])
        .await
        .unwrap();
    let document = &summary.uploaded[0];

    let updated = h
        .intake
        .update_document(
            user_id,
            need.id,
            document.id,
            &DocumentMetadataInput {
                document_type: "eviction_notice".to_string(),
                file_name: Some("notice.pdf".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.document_type, DocumentType::EvictionNotice);
    assert_eq!(updated.file_name, "notice.pdf");
    assert_eq!(updated.storage_key, document.storage_key);
}

#[tokio::test]
async fn metadata_update_rejects_unknown_type() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Documents).await;
    let summary = h
        .intake
        .upload_documents(user_id, need.id, vec![pdf("lease.pdf")])
        .await
        .unwrap();

    let err = h
        .intake
        .update_document(
            user_id,
            need.id,
            summary.uploaded[0].id,
            &DocumentMetadataInput {
                document_type: "passport".to_string(),
                file_name: None,
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, IntakeError::Validation(ref fields) if fields.contains("document_type"));
    assert_eq!(
        h.store.documents_of(need.id)[0].document_type,
        DocumentType::UtilityBill
    );
}

#[tokio::test]
async fn uploads_require_documents_step_reached() {
    let h = harness();
    let user_id = user();
    let need = draft_at(&h, user_id, NeedStep::Story).await;

    let err = h
        .intake
        .upload_documents(user_id, need.id, vec![pdf("lease.pdf")])
        .await
        .unwrap_err();

    assert_matches!(err, IntakeError::Validation(_));
    assert!(h.objects.is_empty());
}
