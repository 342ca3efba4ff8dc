use anyhow::{Context, Result};
use sqlx::PgPool;

/// Initialize ledger schema (idempotent)
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    tracing::info!("Initializing ledger schema...");

    for (name, ddl) in [
        ("accounts", CREATE_ACCOUNTS_TABLE),
        ("entries", CREATE_ENTRIES_TABLE),
        ("transfers", CREATE_TRANSFERS_TABLE),
    ] {
        sqlx::raw_sql(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create {} table", name))?;
    }

    tracing::info!("Ledger schema ready");
    Ok(())
}

/// Name of the non-negative balance check; its violations are reported as
/// insufficient balance
pub const BALANCE_CHECK_CONSTRAINT: &str = "accounts_balance_non_negative";

/// Balances are NUMERIC (exact decimal); the check constraint is the last
/// line of defence for non-negativity.
pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id         BIGSERIAL PRIMARY KEY,
    owner      TEXT NOT NULL,
    balance    NUMERIC NOT NULL CONSTRAINT accounts_balance_non_negative CHECK (balance >= 0),
    currency   TEXT NOT NULL CONSTRAINT accounts_currency_known CHECK (currency IN ('USD', 'EUR', 'RMB')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_accounts_owner ON accounts (owner);
"#;

pub const CREATE_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id         BIGSERIAL PRIMARY KEY,
    account_id BIGINT NOT NULL REFERENCES accounts (id),
    amount     NUMERIC NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_entries_account_id ON entries (account_id);
"#;

pub const CREATE_TRANSFERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transfers (
    id              BIGSERIAL PRIMARY KEY,
    from_account_id BIGINT NOT NULL REFERENCES accounts (id),
    to_account_id   BIGINT NOT NULL REFERENCES accounts (id),
    amount          NUMERIC NOT NULL CONSTRAINT transfers_amount_positive CHECK (amount > 0),
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_transfers_from_account_id ON transfers (from_account_id);
CREATE INDEX IF NOT EXISTS idx_transfers_to_account_id ON transfers (to_account_id);
"#;
