//! SQL schema definitions.

/// Complete schema for the v1 ledger database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Accounts & catalog
-- ============================================================

CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'reader'
        CHECK (role IN ('reader', 'author', 'moderator', 'admin')),
    coin_balance INTEGER NOT NULL DEFAULT 0 CHECK (coin_balance >= 0),
    referred_by TEXT REFERENCES accounts(id),
    created_at INTEGER NOT NULL,
    CHECK (referred_by IS NULL OR referred_by <> id)
);

CREATE TABLE IF NOT EXISTS items (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES accounts(id),
    title TEXT NOT NULL,
    price INTEGER NOT NULL CHECK (price >= 0),
    is_locked INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_items_owner ON items(owner_id);

-- ============================================================
-- Requests
-- ============================================================

CREATE TABLE IF NOT EXISTS deposits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id TEXT NOT NULL REFERENCES accounts(id),
    claimed_amount INTEGER NOT NULL CHECK (claimed_amount > 0),
    coins_requested INTEGER NOT NULL CHECK (coins_requested > 0),
    method TEXT NOT NULL,
    reference_code TEXT NOT NULL UNIQUE,
    transfer_note TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'approved', 'rejected')),
    admin_id TEXT,
    admin_note TEXT,
    created_at INTEGER NOT NULL,
    processed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_deposits_account ON deposits(account_id, created_at);
CREATE INDEX IF NOT EXISTS idx_deposits_status ON deposits(status);

CREATE TABLE IF NOT EXISTS withdrawals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id TEXT NOT NULL REFERENCES accounts(id),
    coins_reserved INTEGER NOT NULL CHECK (coins_reserved > 0),
    payout_amount INTEGER NOT NULL CHECK (payout_amount >= 0),
    bank_name TEXT NOT NULL,
    bank_account TEXT NOT NULL,
    bank_holder TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'approved', 'rejected')),
    admin_id TEXT,
    admin_note TEXT,
    created_at INTEGER NOT NULL,
    processed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_withdrawals_account ON withdrawals(account_id, created_at);
CREATE INDEX IF NOT EXISTS idx_withdrawals_status ON withdrawals(status);

-- ============================================================
-- Purchases
-- ============================================================

CREATE TABLE IF NOT EXISTS chapter_purchases (
    account_id TEXT NOT NULL REFERENCES accounts(id),
    item_id TEXT NOT NULL REFERENCES items(id),
    coins_spent INTEGER NOT NULL CHECK (coins_spent >= 0),
    created_at INTEGER NOT NULL,
    PRIMARY KEY (account_id, item_id)
);

-- ============================================================
-- Earning ledger (insert-only)
-- ============================================================

CREATE TABLE IF NOT EXISTS author_earnings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id TEXT NOT NULL REFERENCES accounts(id),
    payer_id TEXT NOT NULL REFERENCES accounts(id),
    item_id TEXT,
    kind TEXT NOT NULL,
    gross INTEGER NOT NULL CHECK (gross >= 0),
    amount INTEGER NOT NULL CHECK (amount >= 0),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_author_earnings_author ON author_earnings(author_id, created_at);

CREATE TABLE IF NOT EXISTS platform_earnings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    payer_id TEXT NOT NULL REFERENCES accounts(id),
    item_id TEXT,
    kind TEXT NOT NULL,
    gross INTEGER NOT NULL CHECK (gross >= 0),
    platform_amount INTEGER NOT NULL CHECK (platform_amount >= 0),
    tax_amount INTEGER NOT NULL CHECK (tax_amount >= 0),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_platform_earnings_time ON platform_earnings(created_at);

CREATE TABLE IF NOT EXISTS referral_earnings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    referrer_id TEXT NOT NULL REFERENCES accounts(id),
    from_account_id TEXT NOT NULL REFERENCES accounts(id),
    trigger_kind TEXT NOT NULL,
    source_amount INTEGER NOT NULL CHECK (source_amount >= 0),
    rate_bps INTEGER NOT NULL,
    amount INTEGER NOT NULL CHECK (amount > 0),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_referral_earnings_referrer ON referral_earnings(referrer_id);

CREATE TABLE IF NOT EXISTS balance_adjustments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id TEXT NOT NULL REFERENCES accounts(id),
    admin_id TEXT NOT NULL REFERENCES accounts(id),
    delta INTEGER NOT NULL CHECK (delta <> 0),
    reason TEXT NOT NULL,
    balance_after INTEGER NOT NULL CHECK (balance_after >= 0),
    created_at INTEGER NOT NULL
);

-- Earning and adjustment rows are history: refuse edits at the storage level too.
CREATE TRIGGER IF NOT EXISTS author_earnings_no_update BEFORE UPDATE ON author_earnings
BEGIN SELECT RAISE(ABORT, 'author_earnings is append-only'); END;
CREATE TRIGGER IF NOT EXISTS author_earnings_no_delete BEFORE DELETE ON author_earnings
BEGIN SELECT RAISE(ABORT, 'author_earnings is append-only'); END;
CREATE TRIGGER IF NOT EXISTS platform_earnings_no_update BEFORE UPDATE ON platform_earnings
BEGIN SELECT RAISE(ABORT, 'platform_earnings is append-only'); END;
CREATE TRIGGER IF NOT EXISTS platform_earnings_no_delete BEFORE DELETE ON platform_earnings
BEGIN SELECT RAISE(ABORT, 'platform_earnings is append-only'); END;
CREATE TRIGGER IF NOT EXISTS referral_earnings_no_update BEFORE UPDATE ON referral_earnings
BEGIN SELECT RAISE(ABORT, 'referral_earnings is append-only'); END;
CREATE TRIGGER IF NOT EXISTS referral_earnings_no_delete BEFORE DELETE ON referral_earnings
BEGIN SELECT RAISE(ABORT, 'referral_earnings is append-only'); END;
CREATE TRIGGER IF NOT EXISTS balance_adjustments_no_update BEFORE UPDATE ON balance_adjustments
BEGIN SELECT RAISE(ABORT, 'balance_adjustments is append-only'); END;
CREATE TRIGGER IF NOT EXISTS balance_adjustments_no_delete BEFORE DELETE ON balance_adjustments
BEGIN SELECT RAISE(ABORT, 'balance_adjustments is append-only'); END;

-- ============================================================
-- Daily quests
-- ============================================================

CREATE TABLE IF NOT EXISTS daily_quests (
    account_id TEXT NOT NULL REFERENCES accounts(id),
    day INTEGER NOT NULL,
    checked_in INTEGER NOT NULL DEFAULT 0,
    commented INTEGER NOT NULL DEFAULT 0,
    read_minutes INTEGER NOT NULL DEFAULT 0,
    read_completed INTEGER NOT NULL DEFAULT 0,
    coins_earned INTEGER NOT NULL DEFAULT 0 CHECK (coins_earned >= 0),
    PRIMARY KEY (account_id, day)
);
"#;
