//! End-to-end: local HTTP server → fetch → extract → sniff → convert → Parquet,
//! driven by the retry scheduler.

mod common;

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use common::archive_server::{self, year_path, Route};
use enem_core::control::CancelToken;
use enem_core::dataset::ColumnarDataset;
use enem_core::fetch::{self, FetchError, FetchOptions};
use enem_core::pipeline::EnemPipeline;
use enem_core::retry::RoundPolicy;
use enem_core::archive::ExtractError;
use enem_core::convert::ConvertError;
use enem_core::scheduler::{RetryScheduler, TaskStatus, YearError, YearOutcome, YearProcessor};
use zip::write::SimpleFileOptions;

fn microdata_zip(rows: usize) -> Vec<u8> {
    let mut csv = String::from("NU_INSCRICAO;SG_UF_PROVA;Q002;Q003;NU_NOTA_MT\n");
    for i in 0..rows {
        let uf = if i % 2 == 0 { "PB" } else { "SP" };
        let q = ["A", "C", "E", "G"][i % 4];
        csv.push_str(&format!("{};{};{};{};{}.5\n", 100_000 + i, uf, q, q, 400 + i));
    }
    let mut out = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut out);
        let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        zip.start_file("LEIA-ME/dicionario.csv", opts).unwrap();
        zip.write_all(b"NOME;DESCRICAO\n").unwrap();
        zip.start_file("DADOS/MICRODADOS_ENEM.csv", opts).unwrap();
        zip.write_all(csv.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    out.into_inner()
}

fn zip_of(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut out);
        for (name, bytes) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }
    out.into_inner()
}

fn is_empty_dir(dir: &std::path::Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

fn quick_fetch() -> FetchOptions {
    FetchOptions {
        head_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(5),
        transfer_timeout: Duration::from_secs(10),
        ..FetchOptions::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_year_fails_after_all_rounds_while_other_succeeds() {
    let mut routes = HashMap::new();
    routes.insert(year_path(2020), Route::Body(microdata_zip(25)));
    let server = archive_server::start(routes);
    let data_dir = tempfile::tempdir().unwrap();

    let pipeline = EnemPipeline::new(server.base_url.clone(), data_dir.path())
        .with_fetch_options(quick_fetch());
    let policy = RoundPolicy {
        max_rounds: 3,
        delay: Duration::ZERO,
    };
    let report = RetryScheduler::new(pipeline, policy).run(&[2020, 2021]).await;

    let outcomes = report.outcomes();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[&2020], YearOutcome::Success);
    assert_eq!(outcomes[&2021], YearOutcome::FailedAfterAllAttempts);
    assert_eq!(report.rounds, 3);
    assert_eq!(report.task(2021).unwrap().attempts, 3);
    assert_eq!(report.task(2021).unwrap().status, TaskStatus::Failed);
    assert_eq!(report.task(2020).unwrap().attempts, 1);
    assert_eq!(server.head_count(&year_path(2020)), 1);
    assert_eq!(server.head_count(&year_path(2021)), 3);

    assert_eq!(ColumnarDataset::shape(data_dir.path(), 2020).unwrap(), (25, 5));
    let dataset = ColumnarDataset::load(data_dir.path(), 2020).unwrap();
    assert_eq!(dataset.table.num_rows(), 25);
    assert_eq!(dataset.table.num_columns(), 5);
    assert_eq!(report.datasets[&2020].rows, 25);
    assert!(!data_dir.path().join("microdados_enem_2021.parquet").exists());
}

#[test]
fn scratch_directory_is_removed_after_success_and_failure() {
    let mut routes = HashMap::new();
    routes.insert(year_path(2020), Route::Body(microdata_zip(10)));
    routes.insert(
        year_path(2019),
        Route::Body(zip_of(&[("LEIA-ME/manual.pdf", b"%PDF-1.4")])),
    );
    routes.insert(
        year_path(2018),
        Route::Body(zip_of(&[("DADOS/MICRODADOS.csv", b"A;B\n1;2\n3;4;5\n")])),
    );
    let server = archive_server::start(routes);
    let data_dir = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pipeline = EnemPipeline::new(server.base_url.clone(), data_dir.path())
        .with_fetch_options(quick_fetch())
        .with_scratch_dir(Some(scratch.path().to_path_buf()));
    let cancel = CancelToken::new();

    let report = pipeline.process(2020, &cancel).unwrap();
    assert_eq!(report.rows, 10);
    assert!(is_empty_dir(scratch.path()));

    match pipeline.process(2019, &cancel) {
        Err(YearError::Extract(ExtractError::NoTabularEntry)) => {}
        other => panic!("expected NoTabularEntry, got {other:?}"),
    }
    assert!(is_empty_dir(scratch.path()));

    match pipeline.process(2018, &cancel) {
        Err(YearError::Convert(ConvertError::Malformed { line: 3, .. })) => {}
        other => panic!("expected Malformed, got {other:?}"),
    }
    assert!(is_empty_dir(scratch.path()));
    assert!(!data_dir.path().join("microdados_enem_2018.parquet").exists());
}

#[test]
fn fetch_reports_missing_empty_and_truncated_bodies() {
    let mut routes = HashMap::new();
    routes.insert("/empty.zip".to_string(), Route::Empty);
    routes.insert(
        "/short.zip".to_string(),
        Route::Truncated {
            body: vec![7u8; 100],
            declared: 1000,
        },
    );
    let server = archive_server::start(routes);
    let cancel = CancelToken::new();
    let mut ignore = |_: u64, _: Option<u64>| {};

    let url = format!("{}missing.zip", server.base_url);
    match fetch::fetch(&url, &quick_fetch(), &cancel, &mut ignore) {
        Err(FetchError::NotAvailable { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected NotAvailable, got {other:?}"),
    }

    let url = format!("{}empty.zip", server.base_url);
    assert!(matches!(
        fetch::fetch(&url, &quick_fetch(), &cancel, &mut ignore),
        Err(FetchError::EmptyBody)
    ));

    let url = format!("{}short.zip", server.base_url);
    match fetch::fetch(&url, &quick_fetch(), &cancel, &mut ignore) {
        Err(FetchError::Truncated { expected, received }) => {
            assert_eq!(expected, 1000);
            assert_eq!(received, 100);
        }
        other => panic!("expected Truncated, got {other:?}"),
    }
}

#[test]
fn absurd_declared_length_is_a_truncation_not_an_abort() {
    let mut routes = HashMap::new();
    routes.insert(
        "/huge.zip".to_string(),
        Route::Truncated {
            body: vec![1u8; 10],
            declared: 1 << 62,
        },
    );
    let server = archive_server::start(routes);
    let url = format!("{}huge.zip", server.base_url);
    let mut ignore = |_: u64, _: Option<u64>| {};
    match fetch::fetch(&url, &quick_fetch(), &CancelToken::new(), &mut ignore) {
        Err(FetchError::Truncated { expected, received }) => {
            assert_eq!(expected, 1 << 62);
            assert_eq!(received, 10);
        }
        other => panic!("expected Truncated, got {other:?}"),
    }
}

#[test]
fn cancelled_token_aborts_fetch() {
    let mut routes = HashMap::new();
    routes.insert(year_path(2020), Route::Body(microdata_zip(5)));
    let server = archive_server::start(routes);
    let cancel = CancelToken::new();
    cancel.cancel();
    let url = format!("{}microdados/microdados_enem_2020.zip", server.base_url);
    let mut ignore = |_: u64, _: Option<u64>| {};
    assert!(matches!(
        fetch::fetch(&url, &quick_fetch(), &cancel, &mut ignore),
        Err(FetchError::Cancelled)
    ));
}
