mod common;

use common::{package, posting_card, receiver, sender, FakeRegistrar};
use sigep_batch::{ArchiveRenderer, BatchFile, LayoutOptions, PostingSession, Service};
use std::io::Read;
use tempfile::TempDir;
use tokio_test::assert_ok;

#[tokio::test]
async fn test_documents_written_after_close() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = PostingSession::new(posting_card(), FakeRegistrar::default(), ArchiveRenderer::new())
        .with_id_generator(|| 5150u32)
        .with_layout(LayoutOptions {
            labels_per_page: 2,
            ..LayoutOptions::default()
        });
    session.set_sender(sender()).unwrap();
    session.set_receiver(receiver()).unwrap();
    for service in [Service::Pac, Service::Sedex, Service::Sedex10] {
        session.add_package(package(service)).unwrap();
    }
    assert_ok!(session.close_posting_list(None).await);

    let labels_path = temp_dir.path().join("out/labels-5150.zip");
    let manifest_path = temp_dir.path().join("out/posting-list-5150.csv");
    assert_ok!(session.generate_labels_document(&labels_path, None));
    assert_ok!(session.generate_manifest_document(&manifest_path, None));

    let archive_bytes = std::fs::read(&labels_path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(archive_bytes)).unwrap();
    assert_eq!(archive.len(), 2);
    let mut first_page = String::new();
    archive
        .by_name("page-001.txt")
        .unwrap()
        .read_to_string(&mut first_page)
        .unwrap();
    assert!(first_page.contains("TO: Ana Costa"));
    assert!(first_page.contains("Rua da Bahia, 45 - apto 302"));
    assert!(first_page.contains("30160-011"));

    let manifest = std::fs::read_to_string(&manifest_path).unwrap();
    assert_eq!(manifest.lines().next(), Some("posting_card,0067599079"));
    assert!(manifest.contains("batch_id,5150"));
    assert_eq!(manifest.lines().filter(|l| l.starts_with("SX")).count(), 3);
}

#[tokio::test]
async fn test_layout_override_per_call() {
    let mut session = PostingSession::new(posting_card(), FakeRegistrar::default(), ArchiveRenderer::new());
    session.set_sender(sender()).unwrap();
    session.set_receiver(receiver()).unwrap();
    session.add_package(package(Service::Pac)).unwrap();
    session.add_package(package(Service::Pac)).unwrap();
    assert_ok!(session.close_posting_list(None).await);

    let one_per_page = LayoutOptions {
        labels_per_page: 1,
        ..LayoutOptions::default()
    };
    let document = assert_ok!(session.render_labels(Some(&one_per_page)));
    let archive = zip::ZipArchive::new(std::io::Cursor::new(document.bytes)).unwrap();
    assert_eq!(archive.len(), 2);

    let document = assert_ok!(session.render_labels(None));
    let archive = zip::ZipArchive::new(std::io::Cursor::new(document.bytes)).unwrap();
    assert_eq!(archive.len(), 1);
}

#[tokio::test]
async fn test_batch_file_feeds_session() {
    let temp_dir = TempDir::new().unwrap();
    let batch_path = temp_dir.path().join("batch.toml");
    std::fs::write(
        &batch_path,
        r#"
[sender]
name = "ACME Comércio"
street = "Rua Vergueiro"
number = "1000"
city = "São Paulo"
state = "SP"
zip_code = "01504-000"

[receiver]
name = "Ana Costa"
street = "Rua da Bahia"
number = "45"
city = "Belo Horizonte"
state = "MG"
zip_code = "30160011"

[[package]]
service = "sedex"
weight = 1200

[[package]]
service = "pac"
weight = 300
sequence = [2, 1]
"#,
    )
    .unwrap();

    let mut session = PostingSession::new(posting_card(), FakeRegistrar::default(), ArchiveRenderer::new());
    let err = BatchFile::from_file(&batch_path)
        .unwrap()
        .apply(&mut session)
        .unwrap_err();
    assert!(err.to_string().contains("package[1].sequence"));
    assert_eq!(session.packages().len(), 1);
    assert!(session.receiver().is_some());
}
