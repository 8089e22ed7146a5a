//! Diesel table definitions mirroring the embedded migrations under `migrations/`.

diesel::table! {
    asset_sources (asset_id, source_id) {
        asset_id -> Integer,
        source_id -> Integer,
        source_identifier -> Text,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    assets (id) {
        id -> Integer,
        uuid -> Text,
        name -> Nullable<Text>,
        ticker -> Nullable<Text>,
        contract_address -> Nullable<Text>,
        cusip -> Nullable<Text>,
        base_asset_id -> Nullable<Integer>,
        quote_asset_id -> Nullable<Integer>,
        chain_id -> Nullable<Integer>,
        asset_type_id -> Integer,
        decimals -> Nullable<Integer>,
        is_default_quote -> Bool,
        ignore_market_data -> Bool,
        created_by -> Text,
        created_at -> Timestamp,
        updated_by -> Text,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    current_trading_assets (asset_id) {
        asset_id -> Integer,
    }
}

diesel::table! {
    market_data_intervals (id) {
        id -> Integer,
        code -> Text,
        span_days -> Integer,
    }
}

diesel::table! {
    market_observations (asset_id, market_data_type_id, start_date) {
        asset_id -> Integer,
        market_data_type_id -> Integer,
        start_date -> Date,
        end_date -> Date,
        source_id -> Integer,
        interval_id -> Integer,
        open -> Nullable<Double>,
        high -> Nullable<Double>,
        low -> Nullable<Double>,
        close -> Nullable<Double>,
        volume -> Nullable<Double>,
        market_cap -> Nullable<Double>,
        circulating_supply -> Nullable<Double>,
        total_supply -> Nullable<Double>,
        max_supply -> Nullable<Double>,
        sparkline -> Nullable<Text>,
    }
}

diesel::table! {
    sources (id) {
        id -> Integer,
        code -> Text,
        name -> Text,
    }
}

diesel::joinable!(asset_sources -> assets (asset_id));
diesel::joinable!(asset_sources -> sources (source_id));
diesel::joinable!(current_trading_assets -> assets (asset_id));
diesel::joinable!(market_observations -> assets (asset_id));
diesel::joinable!(market_observations -> market_data_intervals (interval_id));
diesel::joinable!(market_observations -> sources (source_id));

diesel::allow_tables_to_appear_in_same_query!(
    asset_sources,
    assets,
    current_trading_assets,
    market_data_intervals,
    market_observations,
    sources,
);
