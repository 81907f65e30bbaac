//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod config;

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::{App, Arg};
use holo_translate::access::Access;
use holo_translate::access::memory::MemoryBackend;
use holo_translate::context::ReadContext;
use holo_translate::path::InstancePath;
use holo_translate::tree::{DataTree, Node};
use holo_translate::unit::UnitCollector;
use serde::Deserialize;
use similar::TextDiff;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::config::{Config, LoggingFmtStyle};

// Initial state of the device.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Snapshot {
    config: DataTree,
    operational: DataTree,
    rpc: BTreeMap<String, Node>,
}

// Neutral configuration before and after the transaction.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Transaction {
    before: DataTree,
    after: DataTree,
}

fn init_tracing(config: &config::LoggingStdout) {
    let stdout = config.enabled.then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(config.fmt.show_thread_id)
            .with_file(config.fmt.show_source)
            .with_line_number(config.fmt.show_source)
            .with_ansi(config.fmt.colors);
        let layer = match config.fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(
            "holo_translate=debug".parse().expect("invalid directive"),
        )
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout)
        .init();
}

fn load_json<T: serde::de::DeserializeOwned>(filename: &str) -> T {
    let data = std::fs::read_to_string(filename)
        .unwrap_or_else(|err| panic!("Unable to read {filename}: {err}"));
    serde_json::from_str(&data)
        .unwrap_or_else(|err| panic!("Failed to parse {filename}: {err}"))
}

fn print_tree(tree: &DataTree) -> String {
    serde_json::to_string_pretty(tree).expect("Failed to print data tree")
}

#[tokio::main]
async fn main() {
    // Parse command-line parameters.
    let matches = App::new("Replay transaction")
        .about("Replay a neutral transaction against a simulated device")
        .arg(
            Arg::with_name("CONFIG")
                .long("config")
                .help("Configuration file path")
                .value_name("CONFIG"),
        )
        .arg(
            Arg::with_name("READ")
                .long("read")
                .help("Neutral subtree to read back after the commit")
                .value_name("PATH"),
        )
        .arg(
            Arg::with_name("SNAPSHOT")
                .help("Device snapshot file path")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("TRANSACTION")
                .help("Transaction file path")
                .required(true)
                .index(2),
        )
        .get_matches();
    let config = Config::load(matches.value_of("CONFIG"));
    let read_root = matches.value_of("READ").map(|path| {
        InstancePath::parse(path).expect("Invalid instance path")
    });
    let snapshot: Snapshot =
        load_json(matches.value_of("SNAPSHOT").expect("required argument"));
    let transaction: Transaction =
        load_json(matches.value_of("TRANSACTION").expect("required argument"));

    // Initialize tracing.
    init_tracing(&config.logging.stdout);

    // Set up the simulated device and load the reference units.
    let backend = MemoryBackend::new(snapshot.config)
        .with_operational(snapshot.operational);
    for (operation, reply) in snapshot.rpc {
        backend.set_rpc_reply(&operation, reply);
    }
    let backend = Arc::new(backend);
    let access = Access::new(backend.clone(), config.translate.access.clone());
    let collector = UnitCollector::new();
    let _units = holo_translate_units::register(&collector)
        .expect("Failed to register translation units");
    let registry = collector
        .registry(&access, &config.translate.registry)
        .expect("Failed to build handler registry");
    let initial = print_tree(&backend.config());

    // Commit the transaction.
    match registry
        .commit(&transaction.before, &transaction.after)
        .await
    {
        Ok(report) => {
            for change in &report.changes {
                println!("{} {}: {:?}", change.op, change.path, change.outcome);
            }
        }
        Err(error) => {
            error.log();
            println!("commit failed: {error}");
        }
    }

    // Print the operations received by the device.
    println!();
    println!("journal:");
    for entry in backend.journal().iter().filter(|entry| entry.is_write()) {
        println!("  {entry}");
    }

    // Print the changes to the device configuration.
    let current = print_tree(&backend.config());
    let diff = TextDiff::from_lines(&initial, &current);
    println!();
    print!(
        "{}",
        diff.unified_diff()
            .context_radius(3)
            .header("initial configuration", "final configuration")
    );

    // Read the requested subtree back from the device.
    if let Some(root) = read_root {
        let mut ctx = ReadContext::new();
        match registry.read_tree(&root, &mut ctx).await {
            Ok(tree) => {
                println!();
                println!("{}", print_tree(&tree));
            }
            Err(error) => {
                error.log();
                println!("read failed: {error}");
            }
        }
    }
}
