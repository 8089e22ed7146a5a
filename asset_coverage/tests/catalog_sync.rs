mod common;

use asset_coverage::catalog::config::{UnknownAssetPolicy, load_catalog_str};
use asset_coverage::catalog::repo::{list_intervals, list_sources};
use asset_coverage::catalog::sync::{SyncOptions, sync_catalog};
use asset_coverage::observations::ObservationStore;
use asset_coverage::repo::SqliteRepo;
use asset_coverage::sources::SourceMap;

use common::day;

const CATALOG: &str = r#"
    [sources.coingecko]
    id = 3
    name = "CoinGecko"

    [[sources.coingecko.identifiers]]
    ticker = "ETH"
    identifier = "ethereum"

    [[sources.coingecko.identifiers]]
    contract = "0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48"
    identifier = "usd-coin"

    [[sources.coingecko.identifiers]]
    ticker = "PEPE"
    identifier = "pepe"

    [sources.kaiko]
    id = 7
    name = "Kaiko"

    [[sources.kaiko.identifiers]]
    ticker = "ETH"
    identifier = "eth"

    [[intervals]]
    id = 1
    code = "1D"

    [[intervals]]
    id = 2
    code = "7d"
"#;

fn seed_assets(conn: &mut diesel::SqliteConnection) -> (i32, i32) {
    use asset_coverage::registry::{AssetDraft, AssetIdentity, AssetRegistry};

    let eth = common::create_ticker(conn, "ETH");
    let usdc = SqliteRepo::new()
        .create(
            conn,
            &AssetDraft::new(
                AssetIdentity::ticker("USDC").with_contract("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
                common::CRYPTO,
            )
            .unwrap(),
            "test",
        )
        .unwrap();
    (eth.id, usdc.id)
}

#[test]
fn first_sync_applies_and_second_is_a_noop() {
    let (_db, mut conn) = common::setup_db();
    let (eth, usdc) = seed_assets(&mut conn);
    let repo = SqliteRepo::new();

    let diff = sync_catalog(&mut conn, load_catalog_str(CATALOG).unwrap(), SyncOptions::default()).unwrap();
    assert_eq!(diff.sources_upsert.len(), 2);
    assert_eq!(diff.intervals_upsert.len(), 2);
    assert_eq!(diff.identifiers_upsert.len(), 3);
    assert_eq!(
        diff.skipped.iter().cloned().collect::<Vec<_>>(),
        vec![("coingecko".to_string(), "ticker PEPE".to_string())]
    );

    let codes: Vec<_> = list_sources(&mut conn).unwrap().into_iter().map(|s| s.code).collect();
    assert_eq!(codes, vec!["coingecko", "kaiko"]);
    let intervals: Vec<_> = list_intervals(&mut conn)
        .unwrap()
        .into_iter()
        .map(|i| (i.code, i.span_days))
        .collect();
    assert_eq!(intervals, vec![("1D".to_string(), 1), ("7D".to_string(), 7)]);

    assert_eq!(repo.identifier_for(&mut conn, eth, 3).unwrap().as_deref(), Some("ethereum"));
    assert_eq!(repo.identifier_for(&mut conn, eth, 7).unwrap().as_deref(), Some("eth"));
    assert_eq!(repo.identifier_for(&mut conn, usdc, 3).unwrap().as_deref(), Some("usd-coin"));
    common::fk_check_empty(&mut conn);

    let again = sync_catalog(&mut conn, load_catalog_str(CATALOG).unwrap(), SyncOptions::default()).unwrap();
    assert!(again.is_noop(), "{again}");
    assert_eq!(again.change_count(), 0);
}

#[test]
fn dry_run_writes_nothing() {
    let (_db, mut conn) = common::setup_db();
    seed_assets(&mut conn);

    let opt = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };
    let diff = sync_catalog(&mut conn, load_catalog_str(CATALOG).unwrap(), opt).unwrap();
    assert_eq!(diff.change_count(), 7);
    assert_eq!(common::count(&mut conn, "sources"), 0);
    assert_eq!(common::count(&mut conn, "market_data_intervals"), 0);
    assert_eq!(common::count(&mut conn, "asset_sources"), 0);
}

#[test]
fn changed_identifier_is_upserted() {
    let (_db, mut conn) = common::setup_db();
    let (eth, _) = seed_assets(&mut conn);
    sync_catalog(&mut conn, load_catalog_str(CATALOG).unwrap(), SyncOptions::default()).unwrap();

    let renamed = CATALOG.replace("identifier = \"ethereum\"", "identifier = \"ethereum-2\"");
    let diff = sync_catalog(&mut conn, load_catalog_str(&renamed).unwrap(), SyncOptions::default()).unwrap();
    assert_eq!(diff.change_count(), 1);
    assert_eq!(diff.identifiers_upsert.keys().copied().collect::<Vec<_>>(), vec![(eth, 3)]);
    assert_eq!(
        SqliteRepo::new().identifier_for(&mut conn, eth, 3).unwrap().as_deref(),
        Some("ethereum-2")
    );
}

#[test]
fn prune_removes_what_the_catalog_no_longer_names() {
    let (_db, mut conn) = common::setup_db();
    let (eth, _) = seed_assets(&mut conn);
    sync_catalog(&mut conn, load_catalog_str(CATALOG).unwrap(), SyncOptions::default()).unwrap();

    let smaller = r#"
        [sources.coingecko]
        id = 3
        name = "CoinGecko"

        [[sources.coingecko.identifiers]]
        ticker = "ETH"
        identifier = "ethereum"

        [[intervals]]
        id = 1
        code = "1D"
    "#;

    // without prune nothing is removed
    let diff = sync_catalog(&mut conn, load_catalog_str(smaller).unwrap(), SyncOptions::default()).unwrap();
    assert!(diff.is_noop(), "{diff}");
    assert_eq!(common::count(&mut conn, "sources"), 2);

    let prune = SyncOptions {
        prune: true,
        ..SyncOptions::default()
    };
    let diff = sync_catalog(&mut conn, load_catalog_str(smaller).unwrap(), prune).unwrap();
    assert_eq!(diff.sources_delete.keys().copied().collect::<Vec<_>>(), vec![7]);
    assert_eq!(diff.intervals_delete.keys().copied().collect::<Vec<_>>(), vec![2]);
    assert_eq!(diff.identifiers_delete.len(), 2);

    assert_eq!(common::count(&mut conn, "sources"), 1);
    assert_eq!(common::count(&mut conn, "market_data_intervals"), 1);
    assert_eq!(common::count(&mut conn, "asset_sources"), 1);
    assert_eq!(
        SqliteRepo::new().identifier_for(&mut conn, eth, 3).unwrap().as_deref(),
        Some("ethereum")
    );
    common::fk_check_empty(&mut conn);
}

#[test]
fn prune_of_a_source_still_holding_observations_rolls_back() {
    let (_db, mut conn) = common::setup_db();
    let (eth, _) = seed_assets(&mut conn);
    sync_catalog(&mut conn, load_catalog_str(CATALOG).unwrap(), SyncOptions::default()).unwrap();
    SqliteRepo::new()
        .upsert_batch(&mut conn, &[common::daily(eth, day(2024, 1, 1), 1.0)])
        .unwrap();

    // drops coingecko, which the observation above references
    let only_kaiko = r#"
        [sources.kaiko]
        id = 7
        name = "Kaiko"

        [[intervals]]
        id = 1
        code = "1D"
    "#;
    let prune = SyncOptions {
        prune: true,
        ..SyncOptions::default()
    };
    assert!(sync_catalog(&mut conn, load_catalog_str(only_kaiko).unwrap(), prune).is_err());

    assert_eq!(common::count(&mut conn, "sources"), 2);
    assert_eq!(common::count(&mut conn, "market_data_intervals"), 2);
    assert_eq!(common::count(&mut conn, "asset_sources"), 3);
}

#[test]
fn strict_policy_fails_on_unregistered_assets() {
    let (_db, mut conn) = common::setup_db();
    seed_assets(&mut conn);

    let strict = SyncOptions {
        unknown_assets: UnknownAssetPolicy::Error,
        ..SyncOptions::default()
    };
    let err = sync_catalog(&mut conn, load_catalog_str(CATALOG).unwrap(), strict).unwrap_err();
    assert!(err.to_string().contains("PEPE"), "{err}");
    assert_eq!(common::count(&mut conn, "sources"), 0);
    assert_eq!(common::count(&mut conn, "asset_sources"), 0);
}

#[test]
fn diff_renders_sections() {
    let (_db, mut conn) = common::setup_db();
    seed_assets(&mut conn);

    let cat = r#"
        [sources.coingecko]
        id = 3
        name = "CoinGecko"

        [[sources.coingecko.identifiers]]
        ticker = "ETH"
        identifier = "ethereum"

        [[sources.coingecko.identifiers]]
        cusip = "037833100"
        identifier = "apple"
    "#;
    let opt = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };
    let diff = sync_catalog(&mut conn, load_catalog_str(cat).unwrap(), opt).unwrap();
    let text = diff.to_string();
    assert!(text.contains("Sources (UPSERT)"), "{text}");
    assert!(text.contains("Identifiers (UPSERT)"), "{text}");
    assert!(text.contains("Unregistered assets (SKIPPED)"), "{text}");
    assert!(text.contains("cusip 037833100"), "{text}");
    assert!(!text.contains("(DELETE)"), "{text}");
}

#[test]
fn one_asset_named_twice_with_different_identifiers_is_rejected() {
    let (_db, mut conn) = common::setup_db();
    let (_, usdc) = seed_assets(&mut conn);

    // ticker and contract both resolve to USDC
    let cat = r#"
        [sources.coingecko]
        id = 3
        name = "CoinGecko"

        [[sources.coingecko.identifiers]]
        ticker = "USDC"
        identifier = "usd-coin"

        [[sources.coingecko.identifiers]]
        contract = "0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48"
        identifier = "bridged-usdc"
    "#;
    let err = sync_catalog(&mut conn, load_catalog_str(cat).unwrap(), SyncOptions::default()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("ticker USDC") && msg.contains("bridged-usdc"), "{msg}");
    assert_eq!(common::count(&mut conn, "sources"), 0);
    assert_eq!(common::count(&mut conn, "asset_sources"), 0);

    // agreeing on the identifier is fine and writes one row
    let agreeing = cat.replace("bridged-usdc", "usd-coin");
    let diff = sync_catalog(&mut conn, load_catalog_str(&agreeing).unwrap(), SyncOptions::default()).unwrap();
    assert_eq!(diff.identifiers_upsert.keys().copied().collect::<Vec<_>>(), vec![(usdc, 3)]);
    assert_eq!(
        SqliteRepo::new().identifier_for(&mut conn, usdc, 3).unwrap().as_deref(),
        Some("usd-coin")
    );
}
