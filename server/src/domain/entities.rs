//! Listable entity registry
//!
//! Every list endpoint is one [`EntityDef`]: the table it reads, its default
//! ordering and the filters it accepts. All of it is compile-time data; the
//! only runtime input is the database the tables are qualified with.

use crate::data::query::{FilterOperator, FilterSpec, ListQuery, ValueType, validate_filter_map};

use FilterOperator::{Eq, Gte, ILike, In, Lte};

// ============================================================================
// COMMON FILTERS
// ============================================================================

const CHAIN: FilterSpec = FilterSpec::keyed("chain", "chain", Eq, ValueType::UInt64);

const FROM_TIMESTAMP: FilterSpec =
    FilterSpec::keyed("from_timestamp", "timestamp", Gte, ValueType::DateTime);
const TO_TIMESTAMP: FilterSpec =
    FilterSpec::keyed("to_timestamp", "timestamp", Lte, ValueType::DateTime);

const TRANSACTION_HASH: FilterSpec =
    FilterSpec::keyed("transaction_hash", "transaction_hash", Eq, ValueType::String);

// `from` and `to` are keywords, so the columns are quoted and the binds renamed
const FROM: FilterSpec =
    FilterSpec::new("from", "`from`", "from_address", ILike, ValueType::String);
const TO: FilterSpec = FilterSpec::new("to", "`to`", "to_address", ILike, ValueType::String);

const fn block_number(column: &'static str) -> FilterSpec {
    FilterSpec::keyed("block_number", column, Eq, ValueType::UInt32)
}

const fn from_block(column: &'static str) -> FilterSpec {
    FilterSpec::keyed("from_block", column, Gte, ValueType::UInt32)
}

const fn to_block(column: &'static str) -> FilterSpec {
    FilterSpec::keyed("to_block", column, Lte, ValueType::UInt32)
}

const fn ci(key: &'static str) -> FilterSpec {
    FilterSpec::keyed(key, key, ILike, ValueType::String)
}

const fn exact(key: &'static str) -> FilterSpec {
    FilterSpec::keyed(key, key, Eq, ValueType::String)
}

// ============================================================================
// FILTER MAPS
// ============================================================================

const BLOCK_FILTERS: &[FilterSpec] = &[
    CHAIN,
    block_number("number"),
    from_block("number"),
    to_block("number"),
    FROM_TIMESTAMP,
    TO_TIMESTAMP,
    ci("miner"),
    exact("hash"),
];

const CONTRACT_FILTERS: &[FilterSpec] = &[
    CHAIN,
    block_number("block_number"),
    from_block("block_number"),
    to_block("block_number"),
    ci("contract_address"),
    ci("creator"),
    TRANSACTION_HASH,
];

const LOG_FILTERS: &[FilterSpec] = &[
    CHAIN,
    block_number("block_number"),
    from_block("block_number"),
    to_block("block_number"),
    FROM_TIMESTAMP,
    TO_TIMESTAMP,
    ci("address"),
    ci("topic0"),
    TRANSACTION_HASH,
];

const TRANSFER_FILTERS: &[FilterSpec] = &[
    CHAIN,
    block_number("block_number"),
    from_block("block_number"),
    to_block("block_number"),
    FROM_TIMESTAMP,
    TO_TIMESTAMP,
    ci("token_address"),
    FROM,
    TO,
    TRANSACTION_HASH,
];

const TRACE_FILTERS: &[FilterSpec] = &[
    CHAIN,
    block_number("block_number"),
    from_block("block_number"),
    to_block("block_number"),
    TRANSACTION_HASH,
    exact("action_type"),
    FROM,
    TO,
];

const TRANSACTION_FILTERS: &[FilterSpec] = &[
    CHAIN,
    block_number("block_number"),
    from_block("block_number"),
    to_block("block_number"),
    FROM_TIMESTAMP,
    TO_TIMESTAMP,
    exact("hash"),
    FROM,
    TO,
    exact("method"),
];

const WITHDRAWAL_FILTERS: &[FilterSpec] = &[
    CHAIN,
    block_number("block_number"),
    from_block("block_number"),
    to_block("block_number"),
    FROM_TIMESTAMP,
    TO_TIMESTAMP,
    ci("address"),
    FilterSpec::keyed("validator_index", "validator_index", Eq, ValueType::UInt64),
];

const DEX_TRADE_FILTERS: &[FilterSpec] = &[
    CHAIN,
    block_number("block_number"),
    from_block("block_number"),
    to_block("block_number"),
    FROM_TIMESTAMP,
    TO_TIMESTAMP,
    ci("pool_address"),
    exact("dex_name"),
    FilterSpec::keyed("dex_names", "dex_name", In, ValueType::StringArray),
    TRANSACTION_HASH,
];

const TOKEN_FILTERS: &[FilterSpec] = &[
    CHAIN,
    ci("address"),
    ci("name"),
    ci("symbol"),
    exact("type"),
    FilterSpec::keyed("types", "type", In, ValueType::StringArray),
];

// ============================================================================
// ENTITIES
// ============================================================================

/// One listable table
#[derive(Debug)]
pub struct EntityDef {
    /// Short name used in logs
    pub name: &'static str,
    /// Unqualified table name
    pub table: &'static str,
    /// Default ORDER BY clause
    pub order_by: &'static str,
    pub filters: &'static [FilterSpec],
}

impl EntityDef {
    /// Table qualified with the given database
    pub fn qualified_table(&self, database: &str) -> String {
        format!("{}.{}", database, self.table)
    }

    /// Executor input for this entity against an already qualified table
    pub fn list_query<'a>(&'a self, qualified_table: &'a str) -> ListQuery<'a> {
        ListQuery {
            table: qualified_table,
            order_by: self.order_by,
            filters: self.filters,
        }
    }
}

pub static BLOCKS: EntityDef = EntityDef {
    name: "blocks",
    table: "blocks",
    order_by: "timestamp DESC",
    filters: BLOCK_FILTERS,
};

pub static CONTRACTS: EntityDef = EntityDef {
    name: "contracts",
    table: "contracts",
    order_by: "block_number DESC",
    filters: CONTRACT_FILTERS,
};

pub static LOGS: EntityDef = EntityDef {
    name: "logs",
    table: "logs",
    order_by: "timestamp DESC",
    filters: LOG_FILTERS,
};

pub static ERC20_TRANSFERS: EntityDef = EntityDef {
    name: "erc20_transfers",
    table: "erc20_transfers",
    order_by: "timestamp DESC",
    filters: TRANSFER_FILTERS,
};

pub static ERC721_TRANSFERS: EntityDef = EntityDef {
    name: "erc721_transfers",
    table: "erc721_transfers",
    order_by: "timestamp DESC",
    filters: TRANSFER_FILTERS,
};

pub static ERC1155_TRANSFERS: EntityDef = EntityDef {
    name: "erc1155_transfers",
    table: "erc1155_transfers",
    order_by: "timestamp DESC",
    filters: TRANSFER_FILTERS,
};

pub static TRACES: EntityDef = EntityDef {
    name: "traces",
    table: "traces",
    order_by: "block_number DESC",
    filters: TRACE_FILTERS,
};

pub static TRANSACTIONS: EntityDef = EntityDef {
    name: "transactions",
    table: "transactions",
    order_by: "timestamp DESC",
    filters: TRANSACTION_FILTERS,
};

pub static WITHDRAWALS: EntityDef = EntityDef {
    name: "withdrawals",
    table: "withdrawals",
    order_by: "timestamp DESC",
    filters: WITHDRAWAL_FILTERS,
};

pub static DEX_TRADES: EntityDef = EntityDef {
    name: "dex_trades",
    table: "dex_trades",
    order_by: "timestamp DESC",
    filters: DEX_TRADE_FILTERS,
};

pub static TOKENS: EntityDef = EntityDef {
    name: "tokens",
    table: "tokens",
    order_by: "address ASC",
    filters: TOKEN_FILTERS,
};

/// Every registered entity
pub static ENTITIES: &[&EntityDef] = &[
    &BLOCKS,
    &CONTRACTS,
    &LOGS,
    &ERC20_TRANSFERS,
    &ERC721_TRANSFERS,
    &ERC1155_TRANSFERS,
    &TRACES,
    &TRANSACTIONS,
    &WITHDRAWALS,
    &DEX_TRADES,
    &TOKENS,
];

/// Check every filter map once at startup
pub fn validate_all() -> Result<(), String> {
    for entity in ENTITIES {
        validate_filter_map(entity.filters).map_err(|e| format!("{}: {}", entity.name, e))?;
    }
    Ok(())
}
