mod common;

use asset_coverage::Error;
use asset_coverage::registry::AssetRegistry;
use asset_coverage::repo::SqliteRepo;
use asset_coverage::sources::SourceMap;
use proptest::prelude::*;

use common::{COINGECKO, CRYPTO};

#[test]
fn eth_is_listed_until_market_data_is_ignored() {
    let (_db, mut conn) = common::setup_db();
    common::seed_min_catalog(&mut conn);
    let repo = SqliteRepo::new();
    let eth = common::create_ticker(&mut conn, "ETH");
    repo.set_identifier(&mut conn, eth.id, COINGECKO, "ETH").unwrap();

    let got = repo.assets_for_source_and_type(&mut conn, COINGECKO, CRYPTO, true).unwrap();
    let got: Vec<_> = got.into_iter().map(|(a, ident)| (a.id, ident)).collect();
    assert_eq!(got, vec![(eth.id, "ETH".to_string())]);

    repo.set_ignore_market_data(&mut conn, eth.id, true, "ops").unwrap();
    assert!(repo.assets_for_source_and_type(&mut conn, COINGECKO, CRYPTO, true).unwrap().is_empty());
    // still mapped when ignored assets are wanted too
    assert_eq!(repo.assets_for_source_and_type(&mut conn, COINGECKO, CRYPTO, false).unwrap().len(), 1);
}

#[test]
fn assets_for_source_filters_by_type_and_source() {
    let (_db, mut conn) = common::setup_db();
    common::seed_min_catalog(&mut conn);
    asset_coverage::catalog::repo::upsert_source(&mut conn, 5, "binance", "Binance").unwrap();
    let repo = SqliteRepo::new();
    let btc = common::create_ticker(&mut conn, "BTC");
    let eth = common::create_ticker(&mut conn, "ETH");
    repo.set_identifier(&mut conn, eth.id, COINGECKO, "ethereum").unwrap();
    repo.set_identifier(&mut conn, btc.id, COINGECKO, "bitcoin").unwrap();
    repo.set_identifier(&mut conn, btc.id, 5, "BTCUSDT").unwrap();

    let ids: Vec<_> = repo
        .assets_for_source_and_type(&mut conn, COINGECKO, CRYPTO, false)
        .unwrap()
        .into_iter()
        .map(|(a, _)| a.id)
        .collect();
    assert_eq!(ids, vec![btc.id, eth.id]);
    assert_eq!(repo.assets_for_source_and_type(&mut conn, 5, CRYPTO, false).unwrap().len(), 1);
    assert!(repo.assets_for_source_and_type(&mut conn, COINGECKO, 2, false).unwrap().is_empty());
    assert!(matches!(
        repo.assets_for_source_and_type(&mut conn, 0, CRYPTO, false).unwrap_err(),
        Error::InvalidArgument(_)
    ));
}

#[test]
fn set_replaces_add_conflicts() {
    let (_db, mut conn) = common::setup_db();
    common::seed_min_catalog(&mut conn);
    let repo = SqliteRepo::new();
    let eth = common::create_ticker(&mut conn, "ETH");

    assert_eq!(repo.identifier_for(&mut conn, eth.id, COINGECKO).unwrap(), None);

    let first = repo.add_identifier(&mut conn, eth.id, COINGECKO, "ETH").unwrap();
    assert_eq!(first.source_identifier, "ETH");

    let err = repo.add_identifier(&mut conn, eth.id, COINGECKO, "ethereum").unwrap_err();
    assert!(matches!(err, Error::ConflictingKey(_)), "{err}");
    assert_eq!(repo.identifier_for(&mut conn, eth.id, COINGECKO).unwrap().as_deref(), Some("ETH"));

    let replaced = repo.set_identifier(&mut conn, eth.id, COINGECKO, "ethereum").unwrap();
    assert_eq!(replaced.source_identifier, "ethereum");
    assert_eq!(common::count(&mut conn, "asset_sources"), 1);
    assert_eq!(
        repo.identifier_for(&mut conn, eth.id, COINGECKO).unwrap().as_deref(),
        Some("ethereum")
    );
}

#[test]
fn writes_reject_bad_input() {
    let (_db, mut conn) = common::setup_db();
    common::seed_min_catalog(&mut conn);
    let repo = SqliteRepo::new();
    let eth = common::create_ticker(&mut conn, "ETH");

    let err = repo.set_identifier(&mut conn, eth.id, COINGECKO, "   ").unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    // unknown source id
    let err = repo.set_identifier(&mut conn, eth.id, 77, "ETH").unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "{err}");
    // unknown asset id
    let err = repo.add_identifier(&mut conn, 9_999, COINGECKO, "ETH").unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "{err}");
    assert_eq!(common::count(&mut conn, "asset_sources"), 0);
}

#[test]
fn remove_is_idempotent() {
    let (_db, mut conn) = common::setup_db();
    common::seed_min_catalog(&mut conn);
    let repo = SqliteRepo::new();
    let eth = common::create_ticker(&mut conn, "ETH");
    repo.set_identifier(&mut conn, eth.id, COINGECKO, "ethereum").unwrap();

    assert_eq!(repo.remove_identifier(&mut conn, eth.id, COINGECKO).unwrap(), 1);
    assert_eq!(repo.remove_identifier(&mut conn, eth.id, COINGECKO).unwrap(), 0);
    assert_eq!(repo.identifier_for(&mut conn, eth.id, COINGECKO).unwrap(), None);
}

#[test]
fn resolve_many_keeps_first_appearance_order() {
    let (_db, mut conn) = common::setup_db();
    common::seed_min_catalog(&mut conn);
    let repo = SqliteRepo::new();
    let btc = common::create_ticker(&mut conn, "BTC");
    let eth = common::create_ticker(&mut conn, "ETH");
    let sol = common::create_ticker(&mut conn, "SOL");
    let ada = common::create_ticker(&mut conn, "ADA");
    repo.set_identifier(&mut conn, btc.id, COINGECKO, "bitcoin").unwrap();
    repo.set_identifier(&mut conn, eth.id, COINGECKO, "ethereum").unwrap();
    repo.set_identifier(&mut conn, sol.id, COINGECKO, "solana").unwrap();
    repo.set_ignore_market_data(&mut conn, sol.id, true, "ops").unwrap();

    // ada has no identifier, eth repeats
    let got: Vec<_> = repo
        .resolve_many(&mut conn, &[sol.id, eth.id, ada.id, btc.id, eth.id], COINGECKO, false)
        .unwrap()
        .into_iter()
        .map(|(_, ident)| ident)
        .collect();
    assert_eq!(got, vec!["solana", "ethereum", "bitcoin"]);

    let got: Vec<_> = repo
        .resolve_many(&mut conn, &[sol.id, eth.id, btc.id], COINGECKO, true)
        .unwrap()
        .into_iter()
        .map(|(a, _)| a.id)
        .collect();
    assert_eq!(got, vec![eth.id, btc.id]);

    assert!(repo.resolve_many(&mut conn, &[], COINGECKO, false).unwrap().is_empty());
    assert!(matches!(
        repo.resolve_many(&mut conn, &[eth.id, 0], COINGECKO, false).unwrap_err(),
        Error::InvalidArgument(_)
    ));
}

#[test]
fn reverse_lookup_prefers_lowest_asset_id() {
    let (_db, mut conn) = common::setup_db();
    common::seed_min_catalog(&mut conn);
    let repo = SqliteRepo::new();
    let weth = common::create_ticker(&mut conn, "WETH");
    let eth = common::create_ticker(&mut conn, "ETH");
    repo.set_identifier(&mut conn, eth.id, COINGECKO, "ethereum").unwrap();
    repo.set_identifier(&mut conn, weth.id, COINGECKO, "ethereum").unwrap();

    let found = repo.asset_for_identifier(&mut conn, COINGECKO, "ethereum").unwrap().unwrap();
    assert_eq!(found.id, weth.id);
    assert!(repo.asset_for_identifier(&mut conn, COINGECKO, "dogecoin").unwrap().is_none());
}

#[test]
fn purging_a_source_drops_its_identifiers() {
    let (_db, mut conn) = common::setup_db();
    common::seed_min_catalog(&mut conn);
    let repo = SqliteRepo::new();
    let eth = common::create_ticker(&mut conn, "ETH");
    repo.set_identifier(&mut conn, eth.id, COINGECKO, "ethereum").unwrap();

    assert_eq!(asset_coverage::catalog::repo::delete_source(&mut conn, COINGECKO).unwrap(), 1);
    assert_eq!(common::count(&mut conn, "asset_sources"), 0);
    common::fk_check_empty(&mut conn);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Whatever sequence of writes runs, each (asset, source) holds at most one
    // identifier and it is the last one set.
    #[test]
    fn one_identifier_per_pair(writes in prop::collection::vec((0usize..3, "[a-z]{1,8}"), 1..24)) {
        let mut conn = common::memory_db();
        common::seed_min_catalog(&mut conn);
        let repo = SqliteRepo::new();
        let assets: Vec<_> = ["AAA", "BBB", "CCC"]
            .iter()
            .map(|t| common::create_ticker(&mut conn, t).id)
            .collect();

        let mut last = std::collections::HashMap::new();
        for (i, ident) in &writes {
            repo.set_identifier(&mut conn, assets[*i], COINGECKO, ident).unwrap();
            last.insert(assets[*i], ident.clone());
        }

        prop_assert_eq!(common::count(&mut conn, "asset_sources") as usize, last.len());
        for (asset, ident) in last {
            let stored = repo.identifier_for(&mut conn, asset, COINGECKO).unwrap();
            prop_assert_eq!(stored, Some(ident));
        }
    }
}
