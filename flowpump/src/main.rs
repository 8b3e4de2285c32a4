// /////////////////////////////////////////////////////////////////////////////
// FlowPump
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Binary entry point. Wires the bootstrap layer (CLI parsing, signal
//! handling) to the application host and a small demonstration pipeline:
//! a TCP line source feeding an uppercasing processor into a logging sink.

use flowpump::application::{Application, Pipeline, ProactorService};
use flowpump::infrastructure::adapters::tcp::TcpLineSource;
use flowpump::infrastructure::metrics::{MetricsRegistry, PipelineMetrics};
use flowpump::infrastructure::{config, logging};
use flowpump_bootstrap::{bootstrap_cli, ExitCode};
use flowpump_domain::traits::Processor;
use flowpump_domain::{Context, Event, PipelineId, ProcessorOutcome, PumpError, Stage};
use std::sync::Arc;

struct UppercaseProcessor;

impl Processor for UppercaseProcessor {
    fn process(&self, _context: &mut Context, event: Event) -> Result<ProcessorOutcome, PumpError> {
        let text = event.value().as_str().unwrap_or_default().to_uppercase();
        Ok(ProcessorOutcome::Forward(Event::new(serde_json::json!(text))))
    }

    fn name(&self) -> &str {
        "uppercase"
    }
}

struct LoggingSink;

impl Processor for LoggingSink {
    fn process(&self, context: &mut Context, event: Event) -> Result<ProcessorOutcome, PumpError> {
        tracing::info!(?event, ?context, "event delivered");
        Ok(ProcessorOutcome::Forward(event))
    }

    fn name(&self) -> &str {
        "logging-sink"
    }
}

#[tokio::main]
async fn main() {
    let (cli, shutdown) = match bootstrap_cli() {
        Ok(parsed) => parsed,
        Err(error) => {
            eprintln!("argument error: {error}");
            std::process::exit(ExitCode::ConfigurationError.as_i32());
        }
    };

    let settings = match config::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("configuration error: {error}");
            std::process::exit(ExitCode::ConfigurationError.as_i32());
        }
    };

    logging::init(cli.verbose || settings.general.verbose);

    let app = match Application::initialize(settings.tick_period(), shutdown.clone()) {
        Ok(app) => app,
        Err(error) => {
            tracing::error!(%error, "failed to initialize application");
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    let metrics_registry = Arc::new(MetricsRegistry::new(settings.metrics_expiration()));
    let _proactor = match ProactorService::new(settings.proactor.worker_threads) {
        Ok(proactor) => proactor,
        Err(error) => {
            tracing::error!(%error, "failed to start proactor pool");
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    let metrics_addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.metrics_http.port));
    let metrics_for_http = metrics_registry.clone();
    tokio::spawn(async move {
        if let Err(error) = flowpump::infrastructure::metrics::http_endpoint::serve(metrics_for_http, metrics_addr).await {
            tracing::error!(%error, "metrics HTTP endpoint stopped");
        }
    });

    let pipeline_metrics_sink = Arc::new(PipelineMetrics::new(metrics_registry));

    let pipeline = Pipeline::build(
        PipelineId::new("echo"),
        vec![Stage::Processor(Box::new(UppercaseProcessor))],
        Box::new(LoggingSink),
        Box::new(flowpump_domain::AlwaysHardErrorHandler),
        app.bus().clone(),
    )
    .expect("echo pipeline definition is valid")
    .with_metrics_sink(pipeline_metrics_sink);

    let source: Arc<dyn flowpump_domain::Source> = Arc::new(TcpLineSource::new("echo-tcp-source", "127.0.0.1:7070"));
    let pipeline = Arc::new(pipeline);

    app.run_init_governor().await;

    let sources_handle = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline.run_sources(vec![source]).await;
        })
    };

    app.run_time_governor().await;

    shutdown.cancel();
    sources_handle.abort();

    app.run_exit_governor().await;

    std::process::exit(ExitCode::Success.as_i32());
}
