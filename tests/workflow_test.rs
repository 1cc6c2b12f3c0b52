//! ワークフロー状態機械テスト
//!
//! 遷移条件、失敗時の戻り先、通信回数を検証

mod support;

use salon_optimizer::workflow::{Session, Stage};
use salon_optimizer::{ErrorClass, OptimizerError};
use salon_optimizer_common::{ColumnMapping, ConfidenceTier, OptimizationMethod, UploadedFile};
use support::{spreadsheet, FakeClient};

const NOMBRE_DETECTION: &str = r#"{
    "total_confidence": 92,
    "mapping": {"nombre": "Nombre Completo"},
    "confidence": {"nombre": 92}
}"#;

const HORARIO_DETECTION: &str = r#"{
    "columns": ["Grupo", "Asignatura", "Día", "Bloque", "Aula", "Docente"],
    "mapping": {
        "Grupo": "Grupo", "Materia": "Asignatura", "Dia": "Día", "Hora": "Bloque",
        "Salon": "Aula", "Profesor": "Docente", "Tipo_Salon": null
    },
    "confidence": {
        "Grupo": 100, "Materia": 74, "Dia": 86, "Hora": 73,
        "Salon": 89, "Profesor": 62, "Tipo_Salon": 0
    },
    "total_confidence": 69.1,
    "total_rows": 312
}"#;

/// アップロード済み（Reviewing）のセッション
async fn reviewing_session(client: &FakeClient) -> Session {
    let mut session = Session::default();
    session
        .upload(client, spreadsheet("horario.xlsx"))
        .await
        .expect("アップロード失敗");
    assert_eq!(session.stage(), Stage::Reviewing);
    session
}

/// 10MiBを超えるファイルは拡張子に関係なく拒否され、Idleのまま
#[tokio::test]
async fn test_oversized_file_rejected() {
    let client = FakeClient::with_detection_json(NOMBRE_DETECTION);
    let mut session = Session::default();

    for name in ["grande.xlsx", "grande.XLS", "grande.txt"] {
        let file = UploadedFile::new(name, vec![0u8; 10 * 1024 * 1024 + 1]);
        let err = session.upload(&client, file).await.unwrap_err();

        assert_eq!(err.class(), ErrorClass::Validation);
        assert_eq!(session.stage(), Stage::Idle);
    }

    assert!(session.file().is_none());
    assert_eq!(client.network_calls(), 0);
}

/// 拡張子が .xlsx / .xls 以外は拒否
#[tokio::test]
async fn test_wrong_extension_rejected() {
    let client = FakeClient::with_detection_json(NOMBRE_DETECTION);
    let mut session = Session::default();

    for name in ["horario.csv", "horario.ods", "horario", "horario.xlsx.zip"] {
        let err = session.upload(&client, spreadsheet(name)).await.unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidFile(_)), "{} が拒否されていない", name);
    }

    // 大文字の拡張子は受け付ける
    session.upload(&client, spreadsheet("HORARIO.XLSX")).await.unwrap();
    assert_eq!(session.stage(), Stage::Reviewing);
    assert_eq!(client.upload_calls.get(), 1);
}

/// 確認済みマッピングなしの最適化は通信せずに前提条件エラー
#[tokio::test]
async fn test_optimize_without_mapping_is_precondition_error() {
    let client = FakeClient::with_detection_json(NOMBRE_DETECTION);
    let mut session = Session::default();

    let err = session.optimize(&client).await.unwrap_err();
    assert!(matches!(err, OptimizerError::Precondition(_)));
    assert_eq!(err.class(), ErrorClass::Precondition);
    assert_eq!(session.stage(), Stage::Idle);

    // アップロード失敗後も同様
    client.fail_upload("Error al detectar columnas");
    session.upload(&client, spreadsheet("horario.xlsx")).await.unwrap_err();
    let err = session.optimize(&client).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Precondition);

    assert_eq!(client.optimize_calls.get(), 0);
}

/// アップロード成功でReviewingになり、検出マッピングがそのまま確認済みになる
#[tokio::test]
async fn test_successful_upload_confirms_mapping() {
    let client = FakeClient::with_detection_json(NOMBRE_DETECTION);
    let session = reviewing_session(&client).await;

    let expected: ColumnMapping = vec![("nombre", Some("Nombre Completo"))].into_iter().collect();
    assert_eq!(session.confirmed_mapping(), Some(&expected));

    let review = session.review().expect("レビュー結果がない");
    assert_eq!(review.total.score, 92);
    assert_eq!(review.total.tier, ConfidenceTier::High);
    let nombre = review.rows.iter().find(|r| r.field == "nombre").unwrap();
    assert_eq!(nombre.column.as_option(), Some("Nombre Completo"));
}

/// 最適化失敗でReviewingに戻り、マッピングと手法は変わらず、メッセージが伝わる
#[tokio::test]
async fn test_failed_optimize_returns_to_reviewing() {
    let client = FakeClient::with_detection_json(HORARIO_DETECTION);
    let mut session = reviewing_session(&client).await;
    session.select_method("genetic").unwrap();
    let mapping_before = session.confirmed_mapping().cloned();

    client.fail_optimize("formato inválido");
    let err = session.optimize(&client).await.unwrap_err();

    assert_eq!(err.to_string(), "formato inválido");
    assert_eq!(err.class(), ErrorClass::Server);
    assert!(err.is_retryable());
    assert_eq!(session.stage(), Stage::Reviewing);
    assert_eq!(session.confirmed_mapping().cloned(), mapping_before);
    assert_eq!(session.method(), OptimizationMethod::Genetic);
    // 自動リトライはしない
    assert_eq!(client.optimize_calls.get(), 1);

    // ユーザー操作による再試行
    client.recover();
    let link = session.optimize(&client).await.unwrap();
    assert_eq!(link.id, "101");
    assert_eq!(session.stage(), Stage::Completed);

    let sent = client.sent_requests.borrow();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
}

/// 失敗後に手法を変えて再試行できる
#[tokio::test]
async fn test_change_method_after_failure() {
    let client = FakeClient::with_detection_json(HORARIO_DETECTION);
    let mut session = reviewing_session(&client).await;

    client.fail_optimize("Error en optimización: timeout");
    session.optimize(&client).await.unwrap_err();

    client.recover();
    session.select_method("ml").unwrap();
    session.optimize(&client).await.unwrap();

    let sent = client.sent_requests.borrow();
    assert_eq!(sent[0].method, OptimizationMethod::Greedy);
    assert_eq!(sent[1].method, OptimizationMethod::Ml);
}

/// 未知の手法は拒否され、直前の選択が残る
#[tokio::test]
async fn test_unknown_method_keeps_previous() {
    let client = FakeClient::with_detection_json(HORARIO_DETECTION);
    let mut session = reviewing_session(&client).await;
    assert_eq!(session.method(), OptimizationMethod::Greedy);

    session.select_method("ml").unwrap();
    let err = session.select_method("simulated_annealing").unwrap_err();

    assert!(matches!(err, OptimizerError::UnknownMethod(_)));
    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(session.method(), OptimizationMethod::Ml);
}

/// 手法の選択はReviewingのみ
#[tokio::test]
async fn test_select_method_outside_reviewing() {
    let mut session = Session::default();
    let err = session.select_method("ml").unwrap_err();
    assert!(matches!(err, OptimizerError::Precondition(_)));
    assert_eq!(session.method(), OptimizationMethod::Greedy);
}

/// アップロード失敗でIdleに戻るが、ファイルは保持され再送できる
#[tokio::test]
async fn test_upload_failure_keeps_file() {
    let client = FakeClient::with_detection_json(HORARIO_DETECTION);
    let mut session = Session::default();

    client.fail_upload("Error al detectar columnas: hoja vacía");
    let err = session.upload(&client, spreadsheet("horario.xlsx")).await.unwrap_err();

    assert_eq!(err.to_string(), "Error al detectar columnas: hoja vacía");
    assert_eq!(session.stage(), Stage::Idle);
    assert_eq!(session.file().map(|f| f.name.as_str()), Some("horario.xlsx"));
    assert!(session.detection().is_none());
    assert!(session.confirmed_mapping().is_none());

    client.recover();
    session.retry_upload(&client).await.unwrap();
    assert_eq!(session.stage(), Stage::Reviewing);
    assert_eq!(client.upload_calls.get(), 2);
}

/// 新しいファイルを選ぶと前の検出結果は丸ごと置き換わる
#[tokio::test]
async fn test_new_file_supersedes_previous() {
    let client = FakeClient::with_detection_json(HORARIO_DETECTION);
    let mut session = reviewing_session(&client).await;
    session.edit_mapping("Tipo_Salon", Some("Aula".into())).unwrap();

    session.upload(&client, spreadsheet("otro.xls")).await.unwrap();

    assert_eq!(session.file().map(|f| f.name.as_str()), Some("otro.xls"));
    // 手動修正は新しい検出結果で上書きされる
    assert_eq!(session.confirmed_mapping().and_then(|m| m.column("Tipo_Salon")), None);
}

/// マッピングの手動修正が最適化要求に反映される
#[tokio::test]
async fn test_edited_mapping_is_sent() {
    let client = FakeClient::with_detection_json(HORARIO_DETECTION);
    let mut session = reviewing_session(&client).await;

    session.edit_mapping("Tipo_Salon", Some("Aula".into())).unwrap();
    session.edit_mapping("Profesor", None).unwrap();

    // 存在しない列・未知のフィールドは拒否
    let err = session.edit_mapping("Salon", Some("Edificio".into())).unwrap_err();
    assert!(matches!(err, OptimizerError::InvalidMapping(_)));
    let err = session.edit_mapping("Edificio", Some("Aula".into())).unwrap_err();
    assert!(matches!(err, OptimizerError::InvalidMapping(_)));

    session.optimize(&client).await.unwrap();

    let sent = client.sent_requests.borrow();
    let mapping = &sent[0].column_mapping;
    assert_eq!(mapping.column("Tipo_Salon"), Some("Aula"));
    assert_eq!(mapping.column("Profesor"), None);
    assert_eq!(mapping.column("Salon"), Some("Aula"));
    assert_eq!(sent[0].filepath, "uploads/horario.xlsx");
}

/// 完了後はセッションを変更できない
#[tokio::test]
async fn test_completed_session_is_terminal() {
    let client = FakeClient::with_detection_json(HORARIO_DETECTION);
    let mut session = reviewing_session(&client).await;
    session.optimize(&client).await.unwrap();
    assert_eq!(session.result().map(|r| r.id.as_str()), Some("101"));

    assert!(matches!(
        session.upload(&client, spreadsheet("nuevo.xlsx")).await,
        Err(OptimizerError::Precondition(_))
    ));
    assert!(session.select_method("ml").is_err());
    assert!(session.edit_mapping("Salon", None).is_err());
    assert!(session.optimize(&client).await.is_err());
    assert_eq!(client.network_calls(), 2);

    // 新しいワークフローはIdleから
    session.reset().unwrap();
    assert_eq!(session.stage(), Stage::Idle);
    session.upload(&client, spreadsheet("nuevo.xlsx")).await.unwrap();
    assert_eq!(session.stage(), Stage::Reviewing);
}

/// 検出マッピング→最適化要求の column_mapping でフィールド名・順序が変わらない
#[tokio::test]
async fn test_mapping_roundtrip_into_request() {
    let detection_json = r#"{
        "total_confidence": 88,
        "mapping": {"Salon": "Aula", "Grupo": "Grp", "Dia": null, "Hora": "Bloque Horario"},
        "confidence": {"Salon": 95, "Grupo": 90, "Dia": 0, "Hora": 81}
    }"#;
    let client = FakeClient::with_detection_json(detection_json);
    let mut session = reviewing_session(&client).await;

    let ticket = session.begin_optimization().unwrap();
    let body = serde_json::to_value(ticket.request()).unwrap();

    assert_eq!(
        serde_json::to_string(&ticket.request().column_mapping).unwrap(),
        r#"{"Salon":"Aula","Grupo":"Grp","Dia":null,"Hora":"Bloque Horario"}"#
    );
    assert_eq!(body["method"], "greedy");
    assert_eq!(body["filepath"], "uploads/horario.xlsx");

    let original: serde_json::Value = serde_json::from_str(detection_json).unwrap();
    assert_eq!(body["column_mapping"], original["mapping"]);
}

/// 2段階APIでも通信中の操作は拒否される
#[tokio::test]
async fn test_in_flight_guard_is_authoritative() {
    let client = FakeClient::with_detection_json(HORARIO_DETECTION);
    let mut session = reviewing_session(&client).await;

    let ticket = session.begin_optimization().unwrap();
    assert_eq!(session.stage(), Stage::Optimizing);

    assert!(matches!(session.begin_optimization(), Err(OptimizerError::Busy("optimizing"))));
    assert!(matches!(
        session.begin_upload(spreadsheet("otro.xlsx")),
        Err(OptimizerError::Busy(_))
    ));
    assert!(matches!(session.select_method("ml"), Err(OptimizerError::Busy(_))));

    session
        .finish_optimization(ticket, Err(OptimizerError::Network("reset by peer".into())))
        .unwrap_err();
    assert_eq!(session.stage(), Stage::Reviewing);
}

/// 全体信頼度が Medium の検出結果は確認が必要
#[tokio::test]
async fn test_medium_confidence_needs_review() {
    let client = FakeClient::with_detection_json(HORARIO_DETECTION);
    let session = reviewing_session(&client).await;

    let review = session.review().unwrap();
    assert_eq!(review.total.score, 69);
    assert_eq!(review.total.tier, ConfidenceTier::Medium);
    assert!(review.needs_review());
    assert_eq!(session.detection().and_then(|d| d.total_rows), Some(312));
}

/// 設定で上限を引き上げても 10MiB を超えるファイルは受け付けない
#[tokio::test]
async fn test_configured_limit_capped_at_10mib() {
    let client = FakeClient::with_detection_json(NOMBRE_DETECTION);
    let mut session = Session::new(OptimizationMethod::Greedy, 20 * 1024 * 1024);

    let file = UploadedFile::new("grande.xlsx", vec![0u8; 10 * 1024 * 1024 + 1]);
    let err = session.upload(&client, file).await.unwrap_err();

    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(session.stage(), Stage::Idle);
    assert_eq!(client.network_calls(), 0);
}

/// 小数の全体信頼度は切り上げられず、境界直下は Medium のまま確認対象
#[tokio::test]
async fn test_fractional_total_below_high_needs_review() {
    let client = FakeClient::with_detection_json(
        r#"{
            "total_confidence": 79.6,
            "mapping": {"Grupo": "Grupo", "Hora": "Bloque"},
            "confidence": {"Grupo": 95, "Hora": 59.5}
        }"#,
    );
    let session = reviewing_session(&client).await;

    let review = session.review().unwrap();
    assert_eq!(review.total.score, 79);
    assert_eq!(review.total.tier, ConfidenceTier::Medium);
    assert!(review.needs_review());

    let hora = review.rows.iter().find(|row| row.field == "Hora").unwrap();
    assert_eq!(hora.confidence.tier, ConfidenceTier::Low);
}
