use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use asset_coverage::catalog::config::{UnknownAssetPolicy, load_catalog_path};
use asset_coverage::catalog::sync::{SyncOptions, sync_catalog};
use asset_coverage::config::load_config;
use asset_coverage::coverage::CoverageTracker;
use asset_coverage::dates::DateSpan;
use asset_coverage::db::{connection, migrate};
use asset_coverage::observations::ObservationStore;
use asset_coverage::registry::{AssetKey, AssetRegistry};
use asset_coverage::repo::SqliteRepo;
use asset_coverage::sources::{SourceMap, refresh_sources, source_id_for};
use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Asset coverage CLI")]
struct Cli {
    /// Store config TOML; without it DATABASE_URL is used.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending schema migrations.
    Migrate,
    Catalog(CatalogCmd),
    Asset(AssetCmd),
    Coverage(CoverageCmd),
}

#[derive(Args)]
struct CatalogCmd {
    #[command(subcommand)]
    sub: CatalogSub,
}

#[derive(Subcommand)]
enum CatalogSub {
    Sync {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        prune: bool,
        /// Fail on identifiers whose asset is not registered instead of skipping them.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args)]
struct AssetCmd {
    #[command(subcommand)]
    sub: AssetSub,
}

#[derive(Subcommand)]
enum AssetSub {
    #[command(group(ArgGroup::new("key").required(true).args(["ticker", "contract", "cusip"])))]
    Resolve {
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        contract: Option<String>,
        #[arg(long)]
        cusip: Option<String>,
        /// Also print the identifier at this source code.
        #[arg(long)]
        source: Option<String>,
    },
}

#[derive(Args)]
struct CoverageCmd {
    #[command(subcommand)]
    sub: CoverageSub,
}

#[derive(Subcommand)]
enum CoverageSub {
    Window {
        #[arg(long)]
        asset: i32,
        #[arg(long = "type")]
        type_id: i32,
    },
    Gaps {
        #[arg(long)]
        asset: i32,
        #[arg(long = "type")]
        type_id: i32,
        #[arg(long, default_value_t = 0)]
        threshold: i32,
    },
    Missing {
        #[arg(long)]
        asset: i32,
        #[arg(long = "type")]
        type_id: i32,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    Skew {
        #[arg(long)]
        expected_days: i32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;
    let repo = SqliteRepo::with_config(&cfg);

    if let Cmd::Migrate = cli.cmd {
        let n = migrate::run_all(&cfg.database_url)?;
        println!("applied {n} migration(s)");
        return Ok(());
    }

    let mut conn = connection::connect(&cfg)?;

    match cli.cmd {
        Cmd::Migrate => {}
        Cmd::Catalog(CatalogCmd {
            sub:
                CatalogSub::Sync {
                    file,
                    dry_run,
                    prune,
                    strict,
                },
        }) => {
            let cat = load_catalog_path(&file)?;
            let opt = SyncOptions {
                dry_run,
                prune,
                unknown_assets: if strict {
                    UnknownAssetPolicy::Error
                } else {
                    UnknownAssetPolicy::Drop
                },
            };
            let diff = sync_catalog(&mut conn, cat, opt)?;
            println!("{diff}");
        }
        Cmd::Asset(AssetCmd {
            sub:
                AssetSub::Resolve {
                    ticker,
                    contract,
                    cusip,
                    source,
                },
        }) => {
            let key = match (ticker, contract, cusip) {
                (Some(t), _, _) => AssetKey::Ticker(t),
                (_, Some(c), _) => AssetKey::ContractAddress(c),
                (_, _, Some(c)) => AssetKey::Cusip(c),
                _ => bail!("one of --ticker, --contract, --cusip is required"),
            };
            let Some(asset) = repo.resolve(&mut conn, &key)? else {
                println!("not found");
                return Ok(());
            };
            println!("{} {} {}", asset.id, asset.uuid, asset.label());
            if let Some(code) = source {
                refresh_sources(&mut conn)?;
                let source_id =
                    source_id_for(&code).with_context(|| format!("unknown source {code}"))?;
                match repo.identifier_for(&mut conn, asset.id, source_id)? {
                    Some(ident) => println!("{code}: {ident}"),
                    None => println!("{code}: (none)"),
                }
            }
        }
        Cmd::Coverage(CoverageCmd { sub }) => match sub {
            CoverageSub::Window { asset, type_id } => {
                match repo.coverage_window(&mut conn, asset, type_id)? {
                    Some(w) => println!("{} .. {}", w.min_date, w.max_date),
                    None => println!("empty"),
                }
            }
            CoverageSub::Gaps {
                asset,
                type_id,
                threshold,
            } => {
                for k in repo.find_gap_days(&mut conn, asset, type_id, threshold)? {
                    println!("{}", k.start_date);
                }
            }
            CoverageSub::Missing {
                asset,
                type_id,
                from,
                to,
            } => {
                let span = DateSpan::new(from, to)?;
                for gap in repo.missing_spans(&mut conn, asset, type_id, span)? {
                    println!("{} .. {}", gap.start(), gap.end());
                }
            }
            CoverageSub::Skew { expected_days } => {
                for o in repo.diff_by_interval_skew(&mut conn, expected_days)? {
                    println!(
                        "{} {} {} .. {} ({}d)",
                        o.key.asset_id,
                        o.key.market_data_type_id,
                        o.key.start_date,
                        o.end_date,
                        o.span_days()
                    );
                }
            }
        },
    }

    Ok(())
}
