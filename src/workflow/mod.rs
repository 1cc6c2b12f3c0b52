//! ワークフロー状態機械
//!
//! 1セッション = ファイル選択から結果画面への遷移まで（または放棄）。
//! アップロード対象、検出結果、確認済みマッピング、最適化手法を変更できるのは
//! `Session` だけで、各操作は `&mut Session` を受け取る。
//!
//! 通信を伴う遷移は `begin_*` / `finish_*` の2段階で、間の通信は呼び出し側が行える。
//! 通信中（Uploading / Optimizing）の新たな操作は `Busy` で拒否する。
//! UI側でボタンを無効化していても、ここでのガードが最終判断になる。

mod stage;

pub use stage::Stage;

use crate::client::TransferClient;
use crate::error::{OptimizerError, Result};
use salon_optimizer_common::{
    present, ColumnMapping, DetectionResult, OptimizationMethod, OptimizationRequest,
    OptimizationResultRef, ResultsLink, ReviewableMapping, UploadReceipt, UploadedFile,
    MAX_UPLOAD_BYTES,
};
use tracing::{debug, info, warn};

/// アップロード中であることを示す引換券
#[derive(Debug)]
#[must_use = "finish_upload に渡して結果を反映してください"]
pub struct UploadTicket {
    generation: u64,
}

/// 最適化中であることを示す引換券（送信する要求を保持）
#[derive(Debug)]
#[must_use = "finish_optimization に渡して結果を反映してください"]
pub struct OptimizeTicket {
    generation: u64,
    request: OptimizationRequest,
}

impl OptimizeTicket {
    pub fn request(&self) -> &OptimizationRequest {
        &self.request
    }
}

/// 1つのワークフローセッション
#[derive(Debug)]
pub struct Session {
    stage: Stage,
    max_upload_bytes: u64,
    default_method: OptimizationMethod,
    method: OptimizationMethod,
    file: Option<UploadedFile>,
    /// サーバー側の保存パス
    remote_path: Option<String>,
    detection: Option<DetectionResult>,
    review: Option<ReviewableMapping>,
    confirmed: Option<ColumnMapping>,
    result: Option<OptimizationResultRef>,
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(OptimizationMethod::default(), MAX_UPLOAD_BYTES)
    }
}

impl Session {
    /// `max_upload_bytes` は上限を下げる方向にのみ効く（10MiBを超える値は10MiB）
    pub fn new(default_method: OptimizationMethod, max_upload_bytes: u64) -> Self {
        Self {
            stage: Stage::Idle,
            max_upload_bytes: max_upload_bytes.min(MAX_UPLOAD_BYTES),
            default_method,
            method: default_method,
            file: None,
            remote_path: None,
            detection: None,
            review: None,
            confirmed: None,
            result: None,
            generation: 0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    pub fn detection(&self) -> Option<&DetectionResult> {
        self.detection.as_ref()
    }

    pub fn review(&self) -> Option<&ReviewableMapping> {
        self.review.as_ref()
    }

    pub fn confirmed_mapping(&self) -> Option<&ColumnMapping> {
        self.confirmed.as_ref()
    }

    pub fn method(&self) -> OptimizationMethod {
        self.method
    }

    pub fn result(&self) -> Option<&OptimizationResultRef> {
        self.result.as_ref()
    }

    fn transition(&mut self, to: Stage) {
        info!(from = %self.stage, to = %to, "ステージ遷移");
        self.stage = to;
    }

    fn ensure_not_in_flight(&self) -> Result<()> {
        if self.stage.is_in_flight() {
            warn!(stage = %self.stage, "通信中の操作を拒否");
            return Err(OptimizerError::Busy(self.stage.as_str()));
        }
        Ok(())
    }

    fn ensure_reviewing(&self, action: &str) -> Result<()> {
        self.ensure_not_in_flight()?;
        if self.stage != Stage::Reviewing {
            return Err(OptimizerError::Precondition(format!(
                "{}は列検出の確認中のみ可能です（現在: {}）",
                action, self.stage
            )));
        }
        Ok(())
    }

    /// ファイル選択: Idle / Reviewing -> Uploading
    ///
    /// 検証に失敗した場合は状態を変えない。成功すると以前のファイルと検出結果は破棄される。
    pub fn begin_upload(&mut self, file: UploadedFile) -> Result<UploadTicket> {
        self.ensure_not_in_flight()?;
        if self.stage == Stage::Completed {
            return Err(OptimizerError::Precondition(
                "このセッションは完了しています。新しいセッションを開始してください".into(),
            ));
        }

        file.validate(self.max_upload_bytes)
            .map_err(OptimizerError::from_validation)?;

        debug!(file = %file.name, size = file.size, "アップロード対象を設定");
        self.file = Some(file);
        self.remote_path = None;
        self.detection = None;
        self.review = None;
        self.confirmed = None;
        self.generation += 1;
        self.transition(Stage::Uploading);

        Ok(UploadTicket {
            generation: self.generation,
        })
    }

    /// アップロード完了: Uploading -> Reviewing（失敗時は Idle）
    ///
    /// 失敗してもファイルは保持するので、選び直さずに再試行できる。
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        outcome: Result<UploadReceipt>,
    ) -> Result<&ReviewableMapping> {
        if self.stage != Stage::Uploading || ticket.generation != self.generation {
            return Err(OptimizerError::Precondition(
                "対応するアップロードが進行していません".into(),
            ));
        }

        match outcome {
            Ok(receipt) => {
                let review = present(&receipt.detection);
                self.confirmed = Some(receipt.detection.mapping.clone());
                self.remote_path = receipt.filepath;
                self.detection = Some(receipt.detection);
                self.transition(Stage::Reviewing);
                Ok(self.review.insert(review))
            }
            Err(e) => {
                warn!(error = %e, "アップロード失敗");
                self.transition(Stage::Idle);
                Err(e)
            }
        }
    }

    /// 選択したファイルを送信して検出結果を反映する
    pub async fn upload<C: TransferClient>(
        &mut self,
        client: &C,
        file: UploadedFile,
    ) -> Result<&ReviewableMapping> {
        let ticket = self.begin_upload(file)?;
        let outcome = match &self.file {
            Some(file) => client.upload(file).await,
            None => Err(OptimizerError::Precondition("アップロード対象がありません".into())),
        };
        self.finish_upload(ticket, outcome)
    }

    /// 保持しているファイルで再アップロード（Idle に戻った後の再試行用）
    pub async fn retry_upload<C: TransferClient>(&mut self, client: &C) -> Result<&ReviewableMapping> {
        let file = self.file.clone().ok_or_else(|| {
            OptimizerError::Precondition("再送できるファイルがありません".into())
        })?;
        self.upload(client, file).await
    }

    /// 最適化手法の選択（Reviewing のみ）。不明な手法なら現在の選択を維持する
    pub fn select_method(&mut self, id: &str) -> Result<OptimizationMethod> {
        self.ensure_reviewing("手法の選択")?;
        let method: OptimizationMethod = id.parse().map_err(OptimizerError::from_validation)?;
        debug!(from = %self.method, to = %method, "手法を変更");
        self.method = method;
        Ok(method)
    }

    /// 確認済みマッピングの手動修正（Reviewing のみ）
    pub fn edit_mapping(&mut self, field: &str, column: Option<String>) -> Result<()> {
        self.ensure_reviewing("マッピングの修正")?;

        let known_columns = self
            .detection
            .as_ref()
            .map(|d| d.columns.as_slice())
            .unwrap_or(&[]);
        let confirmed = self.confirmed.as_mut().ok_or_else(|| {
            OptimizerError::Precondition("修正できるマッピングがありません".into())
        })?;

        confirmed
            .assign(field, column, known_columns)
            .map_err(OptimizerError::from_validation)?;
        debug!(field = field, column = ?confirmed.column(field), "マッピングを修正");
        Ok(())
    }

    /// 最適化開始: Reviewing -> Optimizing
    ///
    /// 確認済みマッピングがなければ通信せずに `Precondition` で拒否する。
    pub fn begin_optimization(&mut self) -> Result<OptimizeTicket> {
        self.ensure_not_in_flight()?;

        let mapping = match &self.confirmed {
            Some(mapping) if !mapping.is_empty() => mapping.clone(),
            _ => {
                return Err(OptimizerError::Precondition(
                    "確認済みのマッピングがありません。先にファイルをアップロードしてください".into(),
                ))
            }
        };
        if self.stage != Stage::Reviewing {
            return Err(OptimizerError::Precondition(format!(
                "最適化は列検出の確認後にのみ開始できます（現在: {}）",
                self.stage
            )));
        }

        let filepath = match (&self.remote_path, &self.file) {
            (Some(path), _) => path.clone(),
            (None, Some(file)) => file.name.clone(),
            (None, None) => {
                return Err(OptimizerError::Precondition("アップロード済みのファイルがありません".into()))
            }
        };

        let request = OptimizationRequest {
            filepath,
            method: self.method,
            column_mapping: mapping,
        };

        self.generation += 1;
        self.transition(Stage::Optimizing);

        Ok(OptimizeTicket {
            generation: self.generation,
            request,
        })
    }

    /// 最適化完了: Optimizing -> Completed（失敗時は Reviewing）
    pub fn finish_optimization(
        &mut self,
        ticket: OptimizeTicket,
        outcome: Result<OptimizationResultRef>,
    ) -> Result<ResultsLink> {
        if self.stage != Stage::Optimizing || ticket.generation != self.generation {
            return Err(OptimizerError::Precondition(
                "対応する最適化が進行していません".into(),
            ));
        }

        match outcome {
            Ok(result) => {
                let link = ResultsLink::from(&result);
                self.result = Some(result);
                self.transition(Stage::Completed);
                Ok(link)
            }
            Err(e) => {
                warn!(error = %e, method = %self.method, "最適化失敗");
                self.transition(Stage::Reviewing);
                Err(e)
            }
        }
    }

    /// 最適化を1回だけ実行する（自動リトライなし）
    pub async fn optimize<C: TransferClient>(&mut self, client: &C) -> Result<ResultsLink> {
        let ticket = self.begin_optimization()?;
        let outcome = client.start_optimization(ticket.request()).await;
        self.finish_optimization(ticket, outcome)
    }

    /// 新しいワークフローを始める（通信中は不可）
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_not_in_flight()?;
        *self = Session::new(self.default_method, self.max_upload_bytes);
        debug!("セッションを初期化");
        Ok(())
    }
}
