// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Composition root: parses the CLI, wires Postgres repositories and the
//! S1-S8 use cases behind them, and dispatches to a single stage or the
//! full `run_pipeline` chain. Database URL and ingestion settings come from
//! `--database-url`/`--config`, falling back to `ingestion_config.toml` /
//! `db_config.toml` in the current directory when not given.

use ledger_bootstrap::cli::{ValidatedCli, ValidatedCommand};
use ledger_bootstrap::exit_code::{result_to_exit_code, ExitCode};
use ledger_bootstrap::row_source::CsvRowSource;
use ledger_bootstrap::shutdown::ShutdownCoordinator;
use ledger_bootstrap::signals::create_signal_handler;
use ledger_bootstrap::{bootstrap_cli, config as bootstrap_config};

use ledger_domain::value_objects::{ChunkSize, WorkerCount};
use ledger_domain::PipelineError;
use ledger_pipeline::application::commands::{
    BuildProfilesCommand, IngestCommand, LoadLedgerCommand, MirrorMatchCommand, RefreshServingCommand, ResolveIdentityCommand,
    RiskScoreCommand, StandardizeCommand,
};
use ledger_pipeline::application::run_pipeline::{run_pipeline, PipelineCommands, PipelineRunReport, PipelineUseCases};
use ledger_pipeline::application::use_cases::{
    BuildProfilesUseCase, IngestUseCase, LoadLedgerUseCase, MirrorMatchUseCase, RefreshServingUseCase, ResolveIdentityUseCase,
    RiskScoreUseCase, StandardizeUseCase,
};
use ledger_pipeline::infrastructure::adapters::fx_rates::PgFxRateLookup;
use ledger_pipeline::infrastructure::adapters::mapping_registry::MappingRegistry;
use ledger_pipeline::infrastructure::config::rayon_config::RayonPoolManager;
use ledger_pipeline::infrastructure::config::{DbConfig, IngestionConfig};
use ledger_pipeline::infrastructure::repositories::schema::initialize_database;
use ledger_pipeline::infrastructure::repositories::{
    PgAnalyticsRepository, PgFileRegistryRepository, PgLedgerFactRepository, PgMirrorMatchRepository, PgOrganizationRepository,
    PgPipelineRunRepository, PgRawRowRepository, PgRiskOpinionRepository, PgStandardizedRowRepository, PgWatermarkRepository,
};
use ledger_pipeline::infrastructure::runtime::stage_executor::StageRunner;
use ledger_pipeline::infrastructure::runtime::WorkerPool;
use ledger_pipeline::presentation::RunSummary;
use ledger_domain::entities::PipelineRun;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let validated_cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("CLI error: {e}");
            return std::process::ExitCode::from(ExitCode::UsageError.as_i32() as u8);
        }
    };

    init_tracing(validated_cli.verbose);

    let result = run(validated_cli).await;
    if let Err(ref e) = result {
        tracing::error!("pipeline run failed: {e}");
    }
    let exit_code = result_to_exit_code(result);
    std::process::ExitCode::from(exit_code.as_i32() as u8)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { bootstrap_config::LogLevel::Debug } else { bootstrap_config::LogLevel::Info };
    let subscriber = tracing_subscriber::FmtSubscriber::builder().with_max_level(level.to_tracing_level()).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already set");
    }
}

async fn run(cli: ValidatedCli) -> Result<(), PipelineError> {
    let db_config = load_db_config(&cli)?;
    let ingestion_config = load_ingestion_config(&cli)?;
    let workers = WorkerCount::cpu_default();

    let pool = initialize_database(&db_config.database_url, db_config.pool_size(workers))
        .await
        .map_err(|e| PipelineError::database_error(format!("initializing database: {e}")))?;

    let mappings = Arc::new(MappingRegistry::load_from_dir(&ingestion_config.mapping_config_dir)?);
    let fx_rates = Arc::new(PgFxRateLookup::load(&pool).await?);
    let row_source = Arc::new(CsvRowSource::new());

    let runs_repo = Arc::new(PgPipelineRunRepository::new(pool.clone()));
    let stage_runner = Arc::new(StageRunner::new(runs_repo.clone()));
    let worker_pool = WorkerPool::new(workers);
    let transforms = Arc::new(RayonPoolManager::new(workers)?);

    let files_repo = Arc::new(PgFileRegistryRepository::new(pool.clone()));
    let raw_rows_repo = Arc::new(PgRawRowRepository::new(pool.clone()));
    let standardized_rows_repo = Arc::new(PgStandardizedRowRepository::new(pool.clone()));
    let organizations_repo = Arc::new(PgOrganizationRepository::new(pool.clone()));
    let ledger_facts_repo = Arc::new(PgLedgerFactRepository::new(pool.clone()));
    let mirror_matches_repo = Arc::new(PgMirrorMatchRepository::new(pool.clone()));
    let analytics_repo = Arc::new(PgAnalyticsRepository::new(pool.clone()));
    let watermarks_repo = Arc::new(PgWatermarkRepository::new(pool.clone()));
    let risk_opinions_repo = Arc::new(PgRiskOpinionRepository::new(pool.clone()));

    let ingest = Arc::new(IngestUseCase::new(
        files_repo.clone(),
        raw_rows_repo.clone(),
        mappings.clone(),
        row_source,
        stage_runner.clone(),
        worker_pool.clone(),
    ));
    let standardize = Arc::new(StandardizeUseCase::new(
        files_repo.clone(),
        raw_rows_repo.clone(),
        standardized_rows_repo.clone(),
        mappings.clone(),
        fx_rates.clone(),
        stage_runner.clone(),
        transforms.clone(),
    ));
    let resolve_identity = Arc::new(ResolveIdentityUseCase::new(
        standardized_rows_repo.clone(),
        organizations_repo.clone(),
        stage_runner.clone(),
    ));
    let load_ledger = Arc::new(LoadLedgerUseCase::new(
        standardized_rows_repo.clone(),
        ledger_facts_repo.clone(),
        files_repo.clone(),
        stage_runner.clone(),
    ));
    let mirror_match = Arc::new(MirrorMatchUseCase::new(
        ledger_facts_repo.clone(),
        mirror_matches_repo.clone(),
        mappings.clone(),
        stage_runner.clone(),
    ));
    let build_profiles = Arc::new(BuildProfilesUseCase::new(analytics_repo.clone(), watermarks_repo.clone(), stage_runner.clone()));
    let risk_score = Arc::new(RiskScoreUseCase::new(analytics_repo.clone(), risk_opinions_repo.clone(), watermarks_repo.clone(), stage_runner.clone()));
    let refresh_serving = Arc::new(RefreshServingUseCase::new(analytics_repo.clone(), stage_runner.clone()));

    let use_cases =
        PipelineUseCases { ingest, standardize, resolve_identity, load_ledger, mirror_match, build_profiles, risk_score, refresh_serving };

    let shutdown = ShutdownCoordinator::default();
    let cancel = shutdown.token();
    let signal_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            create_signal_handler()
                .wait_for_signal(Box::new(move || shutdown.initiate_shutdown()))
                .await;
        })
    };

    let outcome = dispatch(cli.command, &use_cases, &ingestion_config, &cancel).await;

    shutdown.initiate_shutdown();
    signal_task.abort();
    outcome
}

async fn dispatch(
    command: ValidatedCommand,
    use_cases: &PipelineUseCases,
    ingestion_config: &IngestionConfig,
    cancel: &CancellationToken,
) -> Result<(), PipelineError> {
    match command {
        ValidatedCommand::Ingest { raw_data_root, chunk_rows } => {
            let chunk_size = chunk_size_or(chunk_rows, ingestion_config.ingest_chunk_size()?);
            let run = use_cases.ingest.execute(&raw_data_root, &IngestCommand { chunk_size }, cancel).await?;
            print_run(&run);
            Ok(())
        }
        ValidatedCommand::Standardize { chunk_rows } => {
            let chunk_size = chunk_size_or(chunk_rows, ingestion_config.standardize_chunk_size()?);
            let run = use_cases.standardize.execute(&StandardizeCommand { chunk_size }, cancel).await?;
            print_run(&run);
            Ok(())
        }
        ValidatedCommand::ResolveIdentity { chunk_rows, fuzzy_threshold } => {
            let mut cmd = ResolveIdentityCommand::default();
            if let Some(rows) = chunk_rows {
                cmd.chunk_rows = rows;
            }
            if let Some(threshold) = fuzzy_threshold {
                cmd.fuzzy_threshold = threshold;
            }
            let run = use_cases.resolve_identity.execute(&cmd, cancel).await?;
            print_run(&run);
            Ok(())
        }
        ValidatedCommand::LoadLedger { chunk_rows } => {
            let mut cmd = LoadLedgerCommand::default();
            if let Some(rows) = chunk_rows {
                cmd.chunk_rows = rows;
            }
            let run = use_cases.load_ledger.execute(&cmd, cancel).await?;
            print_run(&run);
            Ok(())
        }
        ValidatedCommand::MirrorMatch { batch_size } => {
            let mut cmd = MirrorMatchCommand::default();
            if let Some(size) = batch_size {
                cmd.batch_size = size;
            }
            let run = use_cases.mirror_match.execute(&cmd, cancel).await?;
            print_run(&run);
            Ok(())
        }
        ValidatedCommand::BuildProfiles { lookback_days } => {
            let mut cmd = BuildProfilesCommand::default();
            if let Some(days) = lookback_days {
                cmd.lookback_days = days;
            }
            let run = use_cases.build_profiles.execute(&cmd, cancel).await?;
            print_run(&run);
            Ok(())
        }
        ValidatedCommand::RiskScore { lookback_days, engine_version, batch_size } => {
            let mut cmd = RiskScoreCommand::default();
            if let Some(days) = lookback_days {
                cmd.lookback_days = days;
            }
            if let Some(version) = engine_version {
                cmd.engine_version = version;
            }
            if let Some(size) = batch_size {
                cmd.batch_size = size;
            }
            let run = use_cases.risk_score.execute(&cmd, cancel).await?;
            print_run(&run);
            Ok(())
        }
        ValidatedCommand::RefreshServing => {
            let run = use_cases.refresh_serving.execute(&RefreshServingCommand, cancel).await?;
            print_run(&run);
            Ok(())
        }
        ValidatedCommand::Run { raw_data_root } => {
            let commands = PipelineCommands {
                ingest: IngestCommand { chunk_size: ingestion_config.ingest_chunk_size()? },
                standardize: StandardizeCommand { chunk_size: ingestion_config.standardize_chunk_size()? },
                resolve_identity: ResolveIdentityCommand::default(),
                load_ledger: LoadLedgerCommand::default(),
                mirror_match: MirrorMatchCommand::default(),
                build_profiles: BuildProfilesCommand { lookback_days: ingestion_config.default_lookback_days },
                risk_score: RiskScoreCommand { lookback_days: ingestion_config.default_lookback_days, ..RiskScoreCommand::default() },
                refresh_serving: RefreshServingCommand,
            };
            let report = run_pipeline(&raw_data_root, use_cases, &commands, cancel).await?;
            print_report(&report);
            Ok(())
        }
    }
}

fn chunk_size_or(rows: Option<usize>, default: ChunkSize) -> ChunkSize {
    match rows {
        Some(rows) => ChunkSize::new(rows).unwrap_or(default),
        None => default,
    }
}

fn print_run(run: &PipelineRun) {
    println!("{}", RunSummary::from(run).to_line());
}

fn print_report(report: &PipelineRunReport) {
    for run in [
        &report.ingest,
        &report.standardize,
        &report.resolve_identity,
        &report.load_ledger,
        &report.mirror_match,
        &report.build_profiles,
        &report.risk_score,
        &report.refresh_serving,
    ] {
        print_run(run);
    }
}

fn load_db_config(cli: &ValidatedCli) -> Result<DbConfig, PipelineError> {
    let path = cli.config.clone().unwrap_or_else(|| PathBuf::from("db_config.toml"));
    let mut config = if path.exists() {
        DbConfig::load(&path)?
    } else {
        let Some(url) = cli.database_url.clone() else {
            return Err(PipelineError::configuration_error(format!(
                "no {} and no --database-url override",
                path.display()
            )));
        };
        DbConfig { database_url: url, max_connections: None, connect_timeout_secs: 10, acquire_timeout_secs: 30 }
    };
    if let Some(ref url) = cli.database_url {
        config.database_url = url.clone();
    }
    Ok(config)
}

fn load_ingestion_config(cli: &ValidatedCli) -> Result<IngestionConfig, PipelineError> {
    let path = ingestion_config_path(cli);
    IngestionConfig::load(&path)
}

fn ingestion_config_path(cli: &ValidatedCli) -> PathBuf {
    match &cli.config {
        Some(path) if path.file_name().and_then(|n| n.to_str()) == Some("db_config.toml") => {
            path.with_file_name("ingestion_config.toml")
        }
        Some(path) => path.clone(),
        None => Path::new("ingestion_config.toml").to_path_buf(),
    }
}
