// SPDX-License-Identifier: MIT

//! `lbmd`: the LBM application over a local database
//!
//! Consensus is not part of it: blocks come as JSON files, applied one at
//! a time in height order.

mod logging;
mod opts;
mod query;

use std::path::Path;
use std::sync::Arc;

use clap::Parser as _;
use lbm_app::genesis::AppGenesis;
use lbm_app::msg::AppBlock;
use lbm_app::{App, BlockOutcome};
use lbm_core::block::BlockHeight;
use lbm_db::Database;
use lbm_module::event::ModuleEvent;
use lbm_module_wasm::DynWasmEngine;
use lbm_util_error::WhateverResult;
use lbm_util_error::fmt::FmtCompact as _;
use opts::{Commands, Opts};
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::{OptionExt as _, ResultExt as _};
use tracing::info;

const LOG_TARGET: &str = "lbm::lbmd";

pub struct Lbmd;

#[bon::bon]
impl Lbmd {
    /// Parse the command line and execute it
    ///
    /// Without an `engine` contracts are only registered, never run.
    #[builder(finish_fn = run, start_fn = builder)]
    pub async fn build(engine: Option<DynWasmEngine>) -> WhateverResult<()> {
        logging::init_logging()?;

        let opts = Opts::parse();

        let data_dir = opts
            .data_dir
            .whatever_context("Data dir must be set with --data-dir or LBMD_DATA_DIR")?;
        tokio::fs::create_dir_all(&data_dir)
            .await
            .whatever_context("Failed to create/open data dir")?;
        let db = Arc::new(
            Database::open(data_dir.join("lbm.redb"))
                .await
                .whatever_context("Failed to open database")?,
        );

        let app = App::builder()
            .db(db)
            .bond_denom(opts.bond_denom)
            .maybe_engine(engine)
            .build()
            .await
            .whatever_context("Failed to set up the application")?;

        match opts.command {
            Commands::Init { genesis } => {
                let genesis: AppGenesis = read_json(&genesis).await?;
                app.init_chain(&genesis)
                    .await
                    .whatever_context("Failed to initialize the chain")?;
                info!(target: LOG_TARGET, data_dir = %data_dir.display(), "Chain created");
            }
            Commands::ApplyBlock { block } => {
                let block: AppBlock = read_json(&block).await?;
                let outcome = app
                    .apply_block(&block)
                    .await
                    .whatever_context("Failed to apply block")?;
                print_json(&BlockSummary::new(block.height, &outcome))?;
            }
            Commands::Export => {
                let genesis = app
                    .export_genesis()
                    .await
                    .whatever_context("Failed to export genesis")?;
                print_json(&genesis)?;
            }
            Commands::Query(query) => query::run(&app, query).await?,
        }

        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> WhateverResult<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_whatever_context(|_| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_whatever_context(|_| format!("Failed to parse {}", path.display()))
}

pub(crate) fn print_json(value: &impl Serialize) -> WhateverResult<()> {
    let out = serde_json::to_string_pretty(value).whatever_context("Failed to encode output")?;
    println!("{out}");
    Ok(())
}

#[derive(Serialize)]
struct EventSummary {
    module: String,
    name: &'static str,
}

impl EventSummary {
    fn all(events: &[ModuleEvent]) -> Vec<Self> {
        events
            .iter()
            .map(|e| Self {
                module: e.module_kind.to_string(),
                name: e.name,
            })
            .collect()
    }
}

#[derive(Serialize)]
struct TxSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    events: Vec<EventSummary>,
}

#[derive(Serialize)]
struct BlockSummary {
    height: BlockHeight,
    begin_events: Vec<EventSummary>,
    txs: Vec<TxSummary>,
    end_events: Vec<EventSummary>,
}

impl BlockSummary {
    fn new(height: BlockHeight, outcome: &BlockOutcome) -> Self {
        Self {
            height,
            begin_events: EventSummary::all(&outcome.begin_events),
            txs: outcome
                .txs
                .iter()
                .map(|res| match res {
                    Ok(events) => TxSummary {
                        error: None,
                        events: EventSummary::all(events),
                    },
                    Err(err) => TxSummary {
                        error: Some(err.fmt_compact().to_string()),
                        events: vec![],
                    },
                })
                .collect(),
            end_events: EventSummary::all(&outcome.end_events),
        }
    }
}
