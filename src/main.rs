use clap::Parser;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use salon_optimizer::{cli, config, error, history, render, spreadsheet, workflow};
use salon_optimizer::client::HttpTransferClient;
use salon_optimizer_common::format_file_size;
use cli::{Cli, Commands, MappingEdit};
use config::Config;
use error::{OptimizerError, Result};
use history::HistoryLoader;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use workflow::Session;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "salon_optimizer=debug,salon_opt=debug"
    } else {
        "salon_optimizer=warn,salon_opt=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }

    match cli.command {
        Commands::Run { file, method, map, yes, no_history } => {
            println!("🏫 salon-opt - 教室割当最適化\n");
            let client = HttpTransferClient::from_config(&config)?;
            run_workflow(&client, &config, &file, method.as_deref(), &map, yes, no_history).await?;
        }

        Commands::Detect { file, json } => {
            let client = HttpTransferClient::from_config(&config)?;
            let mut session = Session::new(config.default_method, config.max_upload_bytes);
            let file = spreadsheet::read_spreadsheet(&file, config.max_upload_bytes)?;

            let progress = spinner("列を検出中...");
            let uploaded = session.upload(&client, file).await;
            progress.finish_and_clear();
            let review = uploaded?.clone();

            if json {
                let output = serde_json::json!({
                    "detection": session.detection(),
                    "review": review,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                render::print_review(&review);
                if let Some(rows) = session.detection().and_then(|d| d.total_rows) {
                    println!("\n  行数: {}", rows);
                }
            }
        }

        Commands::History { all, json } => {
            let client = HttpTransferClient::from_config(&config)?;
            let mut loader = if all { HistoryLoader::unlimited() } else { HistoryLoader::new() };
            let entries = loader.load(&client).await;

            if json {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else {
                println!("🕘 最適化履歴");
                render::print_history(entries, client.base_url());
            }
        }

        Commands::Show { id } => {
            let client = HttpTransferClient::from_config(&config)?;
            let optimization = client.fetch_optimization(&id).await?;
            println!("{}", serde_json::to_string_pretty(&optimization)?);
        }

        Commands::Config { set_server, show } => {
            if let Some(url) = set_server {
                config.set_server_url(url)?;
                println!("✔ 接続先を設定しました");
            }

            if show {
                println!("設定:");
                println!("  サーバー: {}", config.server_url());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  デフォルト手法: {}", config.default_method);
                println!("  最大ファイルサイズ: {}", format_file_size(config.max_upload_bytes));
            }
        }
    }

    Ok(())
}

async fn run_workflow(
    client: &HttpTransferClient,
    config: &Config,
    path: &Path,
    method: Option<&str>,
    edits: &[MappingEdit],
    yes: bool,
    no_history: bool,
) -> Result<()> {
    let mut session = Session::new(config.default_method, config.max_upload_bytes);
    let mut history = HistoryLoader::new();

    // 1. ファイル選択
    let file = spreadsheet::read_spreadsheet(path, config.max_upload_bytes)?;
    println!("[1/3] {} ({})", file.name, format_file_size(file.size));

    // 2. アップロードと列検出（履歴の取得は並行して行う）
    let progress = spinner("アップロード・列検出中...");
    let (_, uploaded) = tokio::join!(history.load(client), session.upload(client, file));
    progress.finish_and_clear();

    let mut outcome = uploaded.map(Clone::clone);
    let review = loop {
        match outcome {
            Ok(review) => break review,
            Err(e) => {
                // 失敗時も選択したファイルは保持されている
                if yes || !e.is_retryable() || !confirm(&format!("{}\n再試行しますか?", e), true)? {
                    return Err(e);
                }
                let progress = spinner("再アップロード中...");
                outcome = session.retry_upload(client).await.map(Clone::clone);
                progress.finish_and_clear();
            }
        }
    };

    println!("[2/3] 列検出結果");
    render::print_review(&review);
    println!();

    if let Some(method) = method {
        session.select_method(method)?;
    }
    for edit in edits {
        session.edit_mapping(&edit.field, edit.column.clone())?;
        println!("  ✎ {} → {}", edit.field, edit.column.as_deref().unwrap_or("（未割当）"));
    }

    if !yes {
        let missing = session
            .confirmed_mapping()
            .map(|m| m.missing_mandatory())
            .unwrap_or_default();
        if !missing.is_empty() {
            println!("⚠ 未割当の必須フィールド: {}", missing.join(", "));
        }
        if (review.total.tier.needs_review() || !missing.is_empty())
            && !confirm("信頼度が低いか未割当の項目があります。このまま最適化しますか?", false)?
        {
            println!("中止しました");
            return Ok(());
        }
    }

    // 3. 最適化
    println!("[3/3] 最適化中（手法: {}）", session.method());
    let link = loop {
        let progress = spinner("最適化を実行中...");
        let outcome = session.optimize(client).await;
        progress.finish_and_clear();

        match outcome {
            Ok(link) => break link,
            Err(e) => {
                // 失敗時は Reviewing に戻っているので、同じマッピング・手法で再送できる
                if yes || !e.is_retryable() || !confirm(&format!("{}\n再試行しますか?", e), true)? {
                    return Err(e);
                }
            }
        }
    };

    println!("\n✅ 最適化完了");
    println!("  結果: {}", link.url(client.base_url()));

    if !no_history && !history.is_empty() {
        println!("\n🕘 最近の最適化");
        render::print_history(history.entries(), client.base_url());
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| OptimizerError::Prompt(e.to_string()))
}
