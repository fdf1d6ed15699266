// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Galatea CLI entrypoint.
//!
//! By default this serves the canvas HTTP server (REST, WebSocket, and MCP
//! over streamable HTTP at `http://<host>:<port>/mcp`) until interrupted.
//!
//! Use `--mcp` to additionally serve MCP over stdio (intended for tool
//! integrations); the process then lives as long as the stdio client does.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing_subscriber::EnvFilter;

use galatea::server::{idle_watchdog, CanvasState};

const DEFAULT_PORT: u16 = 3031;
const DEFAULT_HOST: &str = "127.0.0.1";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--host <addr>] [--port <port>] [--idle-timeout <secs>]\n  {program} [--host <addr>] [--port <port>] [--idle-timeout <secs>] --mcp\n\nServes the shared canvas over HTTP: REST under /api, viewers at /ws, and MCP\nat /mcp (streamable HTTP). Defaults to {DEFAULT_HOST}:{DEFAULT_PORT}; --port 0 picks an\nephemeral port.\n\n--mcp additionally serves MCP over stdio for tool integrations.\n--idle-timeout exits after that many seconds without any API request, tool\ncall, or viewer activity (0 disables; default disabled)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    host: Option<String>,
    port: Option<u16>,
    idle_timeout_secs: Option<u64>,
}

impl CliOptions {
    fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout_secs {
            None | Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        }
    }
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => {
                if options.mcp {
                    return Err(());
                }
                options.mcp = true;
            }
            "--host" => {
                if options.host.is_some() {
                    return Err(());
                }
                let host = args.next().ok_or(())?;
                options.host = Some(host);
            }
            "--port" => {
                if options.port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.port = Some(port);
            }
            "--idle-timeout" => {
                if options.idle_timeout_secs.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let secs: u64 = raw.parse().map_err(|_| ())?;
                options.idle_timeout_secs = Some(secs);
            }
            _ => return Err(()),
        }
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "galatea".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        // Logs go to stderr: in --mcp mode stdout belongs to the protocol.
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();

        let host = options.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = options.port.unwrap_or(DEFAULT_PORT);
        let idle_timeout = options.idle_timeout();

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        runtime.block_on(async move {
            let state = CanvasState::new();
            let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
            let addr = listener.local_addr()?;
            tracing::info!(%addr, "canvas server listening");

            let config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let shutdown_token = config.cancellation_token.clone();
            let server_shutdown = shutdown_token.clone();

            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp = galatea::mcp::GalateaMcp::new(state.clone());
            let mcp_service = {
                let mcp = mcp.clone();
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config)
            };

            let router = galatea::api::router(state.clone()).nest_service("/mcp", mcp_service);
            let server_handle = tokio::spawn(async move {
                let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                    server_shutdown.cancelled().await;
                });
                if let Err(err) = serve.await {
                    tracing::error!(error = %err, "canvas HTTP server error");
                }
            });

            if options.mcp {
                let stdio = mcp.serve_stdio();
                match idle_timeout {
                    Some(timeout) => {
                        tokio::select! {
                            result = stdio => result?,
                            () = idle_watchdog(state.clone(), timeout) => {}
                        }
                    }
                    None => stdio.await?,
                }
            } else {
                match idle_timeout {
                    Some(timeout) => {
                        tokio::select! {
                            () = idle_watchdog(state.clone(), timeout) => {}
                            _ = tokio::signal::ctrl_c() => {}
                        }
                    }
                    None => {
                        tokio::signal::ctrl_c().await?;
                    }
                }
            }

            tracing::info!("shutting down");
            state.begin_shutdown();
            shutdown_token.cancel();
            let _ = server_handle.await;
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("galatea: {err}");
        std::process::exit(1);
    }
}
