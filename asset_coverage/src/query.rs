//! Structured asset queries.
//!
//! An [`AssetQuery`] is a list of typed [`AssetClause`]s joined with one explicit
//! [`Combine`] mode, plus ordering and paging. It compiles to a boxed diesel filter,
//! so every value is bound and no SQL text is assembled by hand.
//!
//! ```
//! use asset_coverage::query::{AssetClause, AssetOrder, AssetQuery};
//!
//! // crypto assets on chain 1 that are trading right now and not suppressed
//! let q = AssetQuery::all()
//!     .with(AssetClause::AssetType(1))
//!     .with(AssetClause::Chain(1))
//!     .with(AssetClause::CurrentlyTrading)
//!     .with(AssetClause::MarketDataEnabled)
//!     .order_by(AssetOrder::TickerAsc)
//!     .limit(100);
//! assert_eq!(q.clauses().len(), 4);
//! ```

use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel::sqlite::Sqlite;

use crate::error::{Error, Result, non_empty, positive_id};
use crate::models::Asset;
use crate::schema::{assets, current_trading_assets};

/// One filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetClause {
    /// `asset_type_id = ?`
    AssetType(i32),
    /// `chain_id = ?`
    Chain(i32),
    /// Listed in the externally refreshed `current_trading_assets` relation.
    CurrentlyTrading,
    /// `ignore_market_data` is false.
    MarketDataEnabled,
    /// Exact ticker.
    Ticker(String),
}

/// How clauses are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combine {
    /// Every clause must hold.
    #[default]
    All,
    /// At least one clause must hold.
    Any,
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetOrder {
    /// Surrogate id ascending.
    #[default]
    IdAsc,
    /// Surrogate id descending.
    IdDesc,
    /// Ticker ascending (NULL tickers first), ties by id.
    TickerAsc,
}

/// A filter + order + page over assets. With no clauses every asset matches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetQuery {
    clauses: Vec<AssetClause>,
    combine: Combine,
    order: AssetOrder,
    limit: Option<i64>,
    offset: Option<i64>,
}

type AssetFilter = Box<dyn BoxableExpression<assets::table, Sqlite, SqlType = Bool>>;

impl AssetQuery {
    /// Clauses joined with AND.
    pub fn all() -> Self {
        Self::default()
    }

    /// Clauses joined with OR.
    pub fn any() -> Self {
        Self {
            combine: Combine::Any,
            ..Self::default()
        }
    }

    /// Add a clause.
    pub fn with(mut self, clause: AssetClause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Set ordering.
    pub fn order_by(mut self, order: AssetOrder) -> Self {
        self.order = order;
        self
    }

    /// Cap the number of rows.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skip the first `n` rows.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Clauses in insertion order.
    pub fn clauses(&self) -> &[AssetClause] {
        &self.clauses
    }

    /// Join mode.
    pub fn combine(&self) -> Combine {
        self.combine
    }

    fn validate(&self) -> Result<()> {
        for c in &self.clauses {
            match c {
                AssetClause::AssetType(t) => {
                    positive_id("asset_type_id", *t)?;
                }
                AssetClause::Chain(c) => {
                    positive_id("chain_id", *c)?;
                }
                AssetClause::Ticker(t) => {
                    non_empty("ticker", t)?;
                }
                AssetClause::CurrentlyTrading | AssetClause::MarketDataEnabled => {}
            }
        }
        for (what, v) in [("limit", self.limit), ("offset", self.offset)] {
            if v.is_some_and(|n| n < 0) {
                return Err(Error::InvalidArgument(format!("{what} must be >= 0")));
            }
        }
        Ok(())
    }

    fn clause_expr(clause: &AssetClause) -> AssetFilter {
        match clause {
            AssetClause::AssetType(t) => Box::new(assets::asset_type_id.eq(*t)),
            AssetClause::Chain(c) => Box::new(assets::chain_id.assume_not_null().eq(*c)),
            AssetClause::CurrentlyTrading => Box::new(
                assets::id.eq_any(current_trading_assets::table.select(current_trading_assets::asset_id)),
            ),
            AssetClause::MarketDataEnabled => Box::new(assets::ignore_market_data.eq(false)),
            AssetClause::Ticker(t) => {
                Box::new(assets::ticker.assume_not_null().eq(t.trim().to_string()))
            }
        }
    }

    fn filter(&self) -> Option<AssetFilter> {
        let mut exprs = self.clauses.iter().map(Self::clause_expr);
        let first = exprs.next()?;
        Some(exprs.fold(first, |acc, e| match self.combine {
            Combine::All => Box::new(acc.and(e)),
            Combine::Any => Box::new(acc.or(e)),
        }))
    }

    pub(crate) fn load(&self, conn: &mut SqliteConnection) -> Result<Vec<Asset>> {
        self.validate()?;
        let mut q = assets::table.select(Asset::as_select()).into_boxed();
        if let Some(f) = self.filter() {
            q = q.filter(f);
        }
        q = match self.order {
            AssetOrder::IdAsc => q.order(assets::id.asc()),
            AssetOrder::IdDesc => q.order(assets::id.desc()),
            AssetOrder::TickerAsc => q.order((assets::ticker.asc(), assets::id.asc())),
        };
        if let Some(n) = self.limit {
            q = q.limit(n);
        }
        if let Some(n) = self.offset {
            q = q.offset(n);
        }
        Ok(q.load(conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_paging_is_rejected() {
        let err = AssetQuery::all().limit(-1).validate().unwrap_err();
        assert!(err.to_string().contains("limit"));
        assert!(AssetQuery::all().offset(-3).validate().is_err());
    }

    #[test]
    fn clause_values_are_checked() {
        assert!(AssetQuery::all().with(AssetClause::Chain(0)).validate().is_err());
        assert!(AssetQuery::any().with(AssetClause::Ticker(" ".into())).validate().is_err());
        AssetQuery::any()
            .with(AssetClause::CurrentlyTrading)
            .with(AssetClause::Ticker("ETH".into()))
            .validate()
            .unwrap();
    }

    #[test]
    fn empty_query_has_no_filter() {
        assert!(AssetQuery::any().filter().is_none());
        assert!(AssetQuery::all().with(AssetClause::MarketDataEnabled).filter().is_some());
    }
}
