//! SQLite data source.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

use cashflow_engine::model::{
    ActivePeriod, BalanceSheetEntry, BankAccount, BankBalance, CashCode, CashPolarity, CashType,
    Category, CategoryKind, Expression, ExpressionStatus, Month, MonthValue, Period, SyntaxType,
    ValueInclusion, VatAccrual, VatPeriod,
};
use cashflow_engine::repository::RepoResult;
use cashflow_engine::{Repository, RepositoryError};

/// Tables read by [`SqliteRepository`]. Dates are `YYYY-MM-DD` text.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,          -- company_name, vat_recurrence_type
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS periods (
    year_number INTEGER PRIMARY KEY,
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS months (
    month_number INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    start_on TEXT,
    display_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS active_period (
    year_number INTEGER NOT NULL,
    month_number INTEGER NOT NULL,
    month_name TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    start_on TEXT
);

CREATE TABLE IF NOT EXISTS categories (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    polarity INTEGER NOT NULL DEFAULT 2,    -- 0=expense, 1=income, 2=neutral
    kind INTEGER NOT NULL DEFAULT 0,        -- 0=cash code, 1=total, 2=expression
    cash_type INTEGER,                      -- 0=trade, 1=tax, 2=money
    display_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS cash_codes (
    code TEXT PRIMARY KEY,
    category_code TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS cash_code_values (
    cash_code TEXT NOT NULL,
    year_number INTEGER NOT NULL,
    month_number INTEGER NOT NULL,
    value REAL NOT NULL DEFAULT 0,
    source TEXT NOT NULL DEFAULT 'invoiced' -- invoiced, activePeriod, orderBook, taxAccrual
);

CREATE TABLE IF NOT EXISTS category_totals (
    category_code TEXT NOT NULL,
    source_code TEXT NOT NULL,
    source_order INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (category_code, source_code)
);

CREATE TABLE IF NOT EXISTS category_expressions (
    category_code TEXT PRIMARY KEY,
    template TEXT NOT NULL,
    format TEXT,
    syntax INTEGER NOT NULL DEFAULT 0       -- 0=both, 1=libre, 2=excel
);

CREATE TABLE IF NOT EXISTS vat_periods (
    kind TEXT NOT NULL,                     -- recurrence, month
    year_number INTEGER NOT NULL,
    start_on TEXT,
    home_sales REAL NOT NULL DEFAULT 0,
    home_purchases REAL NOT NULL DEFAULT 0,
    export_sales REAL NOT NULL DEFAULT 0,
    export_purchases REAL NOT NULL DEFAULT 0,
    home_sales_vat REAL NOT NULL DEFAULT 0,
    home_purchases_vat REAL NOT NULL DEFAULT 0,
    export_sales_vat REAL NOT NULL DEFAULT 0,
    export_purchases_vat REAL NOT NULL DEFAULT 0,
    vat_adjustment REAL NOT NULL DEFAULT 0,
    vat_due REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS vat_accruals (
    kind TEXT NOT NULL,                     -- recurrence, month
    year_number INTEGER NOT NULL,
    home_sales_vat REAL,
    home_purchases_vat REAL,
    export_sales_vat REAL,
    export_purchases_vat REAL,
    vat_due REAL
);

CREATE TABLE IF NOT EXISTS bank_accounts (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    display_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS bank_balances (
    account_code TEXT NOT NULL,
    year_number INTEGER NOT NULL,
    month_number INTEGER NOT NULL,
    balance REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS balance_sheet (
    entry_order INTEGER NOT NULL,
    asset_code TEXT NOT NULL,
    asset_name TEXT NOT NULL,
    year_number INTEGER NOT NULL,
    month_number INTEGER NOT NULL,
    balance REAL
);

CREATE TABLE IF NOT EXISTS event_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    logged_at TEXT NOT NULL,
    category_code TEXT NOT NULL,
    is_error INTEGER NOT NULL,
    message TEXT NOT NULL
);
"#;

const VAT_RECURRENCE: &str = "recurrence";
const VAT_MONTH: &str = "month";

fn db(err: rusqlite::Error) -> RepositoryError {
    RepositoryError::Query(err.to_string())
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let Some(text) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        code: row.get(0)?,
        name: row.get(1)?,
        polarity: CashPolarity::from_code(row.get(2)?),
        kind: CategoryKind::from_code(row.get(3)?),
        cash_type: row.get::<_, Option<i64>>(4)?.and_then(CashType::from_code),
        display_order: row.get(5)?,
    })
}

fn vat_period_row(row: &Row<'_>) -> rusqlite::Result<VatPeriod> {
    Ok(VatPeriod {
        year_number: row.get(0)?,
        start_on: date_column(row, 1)?,
        home_sales: row.get(2)?,
        home_purchases: row.get(3)?,
        export_sales: row.get(4)?,
        export_purchases: row.get(5)?,
        home_sales_vat: row.get(6)?,
        home_purchases_vat: row.get(7)?,
        export_sales_vat: row.get(8)?,
        export_purchases_vat: row.get(9)?,
        vat_adjustment: row.get(10)?,
        vat_due: row.get(11)?,
    })
}

fn vat_accrual_row(row: &Row<'_>) -> rusqlite::Result<VatAccrual> {
    Ok(VatAccrual {
        year_number: row.get(0)?,
        home_sales_vat: row.get(1)?,
        home_purchases_vat: row.get(2)?,
        export_sales_vat: row.get(3)?,
        export_purchases_vat: row.get(4)?,
        vat_due: row.get(5)?,
    })
}

/// [`Repository`] over a database laid out as in [`SCHEMA`].
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open an existing database. A missing file is an error, not an empty source.
    pub fn open(path: &Path) -> RepoResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| RepositoryError::Query(format!("{}: {e}", path.display())))?;
        log::debug!("opened sqlite data source {}", path.display());
        Ok(Self { conn })
    }

    /// Empty in-memory database with the schema created.
    pub fn open_in_memory() -> RepoResult<Self> {
        let repo = Self { conn: Connection::open_in_memory().map_err(db)? };
        repo.create_schema()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn create_schema(&self) -> RepoResult<()> {
        self.conn.execute_batch(SCHEMA).map_err(db)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn rows<T, P, F>(&self, sql: &str, params: P, map: F) -> RepoResult<Vec<T>>
    where
        P: rusqlite::Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql).map_err(db)?;
        let rows = stmt.query_map(params, map).map_err(db)?;
        rows.collect::<rusqlite::Result<Vec<T>>>().map_err(db)
    }

    fn meta(&self, key: &str) -> RepoResult<String> {
        let value = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| row.get::<_, String>(0))
            .optional()
            .map_err(db)?;
        Ok(value.unwrap_or_default())
    }

    fn vat_periods(&self, kind: &str) -> RepoResult<Vec<VatPeriod>> {
        self.rows(
            "SELECT year_number, start_on, home_sales, home_purchases, export_sales, export_purchases,
                    home_sales_vat, home_purchases_vat, export_sales_vat, export_purchases_vat,
                    vat_adjustment, vat_due
             FROM vat_periods WHERE kind = ?1 ORDER BY year_number, start_on",
            [kind],
            vat_period_row,
        )
    }

    fn vat_accruals(&self, kind: &str) -> RepoResult<Vec<VatAccrual>> {
        self.rows(
            "SELECT year_number, home_sales_vat, home_purchases_vat, export_sales_vat,
                    export_purchases_vat, vat_due
             FROM vat_accruals WHERE kind = ?1 ORDER BY year_number, rowid",
            [kind],
            vat_accrual_row,
        )
    }
}

impl Repository for SqliteRepository {
    fn active_period(&self) -> RepoResult<Option<ActivePeriod>> {
        self.conn
            .query_row(
                "SELECT year_number, month_number, month_name, description, start_on
                 FROM active_period LIMIT 1",
                [],
                |row| {
                    Ok(ActivePeriod {
                        year_number: row.get(0)?,
                        month_number: row.get(1)?,
                        month_name: row.get(2)?,
                        description: row.get(3)?,
                        start_on: date_column(row, 4)?,
                    })
                },
            )
            .optional()
            .map_err(db)
    }

    fn active_years(&self) -> RepoResult<Vec<Period>> {
        self.rows(
            "SELECT year_number, description, status FROM periods WHERE is_active <> 0 ORDER BY year_number",
            [],
            |row| Ok(Period { year_number: row.get(0)?, description: row.get(1)?, status: row.get(2)? }),
        )
    }

    fn months(&self) -> RepoResult<Vec<Month>> {
        self.rows(
            "SELECT month_number, name, start_on FROM months ORDER BY display_order, month_number",
            [],
            |row| Ok(Month { month_number: row.get(0)?, name: row.get(1)?, start_on: date_column(row, 2)? }),
        )
    }

    fn company_name(&self) -> RepoResult<String> {
        self.meta("company_name")
    }

    fn categories(&self, cash_type: CashType) -> RepoResult<Vec<Category>> {
        self.rows(
            "SELECT code, name, polarity, kind, cash_type, display_order FROM categories
             WHERE kind = 0 AND cash_type = ?1 ORDER BY display_order, name",
            [cash_type.code()],
            category_row,
        )
    }

    fn cash_codes(&self, category_code: &str) -> RepoResult<Vec<CashCode>> {
        self.rows(
            "SELECT code, description FROM cash_codes WHERE category_code = ?1 ORDER BY description, code",
            [category_code],
            |row| Ok(CashCode { code: row.get(0)?, description: row.get(1)? }),
        )
    }

    fn cash_code_values(
        &self,
        cash_code: &str,
        year_number: i32,
        inclusion: ValueInclusion,
    ) -> RepoResult<Vec<MonthValue>> {
        self.rows(
            "SELECT month_number, SUM(value) FROM cash_code_values
             WHERE cash_code = ?1 AND year_number = ?2
               AND (source = 'invoiced'
                    OR (source = 'activePeriod' AND ?3)
                    OR (source = 'orderBook' AND ?4)
                    OR (source = 'taxAccrual' AND ?5))
             GROUP BY month_number ORDER BY month_number",
            params![cash_code, year_number, inclusion.active_periods, inclusion.order_book, inclusion.tax_accruals],
            |row| Ok(MonthValue { month_number: row.get(0)?, value: row.get(1)? }),
        )
    }

    fn category_totals(&self) -> RepoResult<Vec<Category>> {
        self.rows(
            "SELECT code, name, polarity, kind, cash_type, display_order FROM categories
             WHERE kind = 1 ORDER BY display_order, name",
            [],
            category_row,
        )
    }

    fn category_total_codes(&self, category_code: &str) -> RepoResult<Vec<String>> {
        self.rows(
            "SELECT source_code FROM category_totals WHERE category_code = ?1 ORDER BY source_order, rowid",
            [category_code],
            |row| row.get(0),
        )
    }

    fn category_expressions(&self) -> RepoResult<Vec<Expression>> {
        self.rows(
            "SELECT c.code, c.name, e.template, e.format, e.syntax, c.display_order
             FROM categories c JOIN category_expressions e ON e.category_code = c.code
             WHERE c.kind = 2 ORDER BY c.display_order, c.name",
            [],
            |row| {
                Ok(Expression {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    template: row.get(2)?,
                    format: row.get(3)?,
                    syntax: SyntaxType::from_code(row.get(4)?),
                    display_order: row.get(5)?,
                })
            },
        )
    }

    fn category_code_from_name(&self, name: &str) -> RepoResult<Option<String>> {
        self.conn
            .query_row("SELECT code FROM categories WHERE name = ?1 LIMIT 1", [name], |row| row.get(0))
            .optional()
            .map_err(db)
    }

    fn report_expression_status(&self, category_code: &str, status: &ExpressionStatus) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO event_log (logged_at, category_code, is_error, message) VALUES (?1, ?2, ?3, ?4)",
                params![Utc::now().to_rfc3339(), category_code, status.is_error(), status.message()],
            )
            .map_err(db)?;
        Ok(())
    }

    fn vat_recurrence_type(&self) -> RepoResult<String> {
        Ok(self.meta("vat_recurrence_type")?.to_uppercase())
    }

    fn vat_recurrence(&self) -> RepoResult<Vec<VatPeriod>> {
        self.vat_periods(VAT_RECURRENCE)
    }

    fn vat_recurrence_accruals(&self) -> RepoResult<Vec<VatAccrual>> {
        self.vat_accruals(VAT_RECURRENCE)
    }

    fn vat_period_totals(&self) -> RepoResult<Vec<VatPeriod>> {
        self.vat_periods(VAT_MONTH)
    }

    fn vat_period_accruals(&self) -> RepoResult<Vec<VatAccrual>> {
        self.vat_accruals(VAT_MONTH)
    }

    fn bank_accounts(&self) -> RepoResult<Vec<BankAccount>> {
        self.rows("SELECT code, name FROM bank_accounts ORDER BY display_order, code", [], |row| {
            Ok(BankAccount { code: row.get(0)?, name: row.get(1)? })
        })
    }

    fn bank_balances(&self, account_code: &str) -> RepoResult<Vec<BankBalance>> {
        self.rows(
            "SELECT year_number, month_number, balance FROM bank_balances
             WHERE account_code = ?1 ORDER BY year_number, month_number",
            [account_code],
            |row| Ok(BankBalance { year_number: row.get(0)?, month_number: row.get(1)?, balance: row.get(2)? }),
        )
    }

    fn balance_sheet(&self) -> RepoResult<Vec<BalanceSheetEntry>> {
        self.rows(
            "SELECT asset_code, asset_name, year_number, month_number, balance
             FROM balance_sheet ORDER BY entry_order",
            [],
            |row| {
                Ok(BalanceSheetEntry {
                    asset_code: row.get(0)?,
                    asset_name: row.get(1)?,
                    year_number: row.get(2)?,
                    month_number: row.get(3)?,
                    balance: row.get(4)?,
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteRepository {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.connection()
            .execute_batch(
                r#"
                INSERT INTO meta VALUES ('company_name', 'Acme Ltd'), ('vat_recurrence_type', 'quarterly');
                INSERT INTO periods VALUES (2026, '', '', 1), (2025, '2025-26', 'Current', 1), (2023, '', '', 0);
                INSERT INTO months VALUES (4, 'Apr', '2025-04-01', 1), (5, 'May', '2025-05-01', 2), (1, 'Jan', NULL, 10);
                INSERT INTO active_period VALUES (2025, 5, 'May', '2025-26', '2025-05-01');
                INSERT INTO categories VALUES
                    ('TR2', 'Purchases', 0, 0, 0, 2),
                    ('TR1', 'Sales', 1, 0, 0, 1),
                    ('MN1', 'Loans', 2, 0, 2, 1),
                    ('GP', 'Gross Profit', 2, 1, NULL, 1),
                    ('MG', 'Margin', 2, 2, NULL, 1);
                INSERT INTO cash_codes VALUES ('S2', 'TR1', 'Services'), ('S1', 'TR1', 'Goods');
                INSERT INTO cash_code_values VALUES
                    ('S1', 2025, 4, 100, 'invoiced'),
                    ('S1', 2025, 4, 25, 'orderBook'),
                    ('S1', 2025, 5, 7, 'activePeriod'),
                    ('S1', 2025, 5, 3, 'taxAccrual');
                INSERT INTO category_totals VALUES ('GP', 'TR2', 1), ('GP', 'TR1', 2);
                INSERT INTO category_expressions VALUES ('MG', '[Gross Profit]/[Sales]', 'Pct1', 0);
                INSERT INTO vat_periods (kind, year_number, start_on, vat_due) VALUES
                    ('recurrence', 2025, '2025-04-01', 12.5), ('month', 2025, '2025-05-01', 4);
                INSERT INTO vat_accruals (kind, year_number, vat_due) VALUES ('recurrence', 2025, 2);
                INSERT INTO bank_accounts VALUES ('B1', 'Current', 1);
                INSERT INTO bank_balances VALUES ('B1', 2025, 5, 900), ('B1', 2025, 4, 1000);
                INSERT INTO balance_sheet VALUES (2, 'CASH', 'Cash', 2025, 4, NULL), (1, 'DEBT', 'Debtors', 2025, 4, 50);
                "#,
            )
            .unwrap();
        repo
    }

    #[test]
    fn test_calendar_and_meta() {
        let repo = seeded();
        let years: Vec<i32> = repo.active_years().unwrap().iter().map(|p| p.year_number).collect();
        assert_eq!(years, vec![2025, 2026]);
        let months: Vec<u32> = repo.months().unwrap().iter().map(|m| m.month_number).collect();
        assert_eq!(months, vec![4, 5, 1]);
        assert_eq!(repo.months().unwrap()[0].start_on, NaiveDate::from_ymd_opt(2025, 4, 1));
        assert_eq!(repo.company_name().unwrap(), "Acme Ltd");
        assert_eq!(repo.vat_recurrence_type().unwrap(), "QUARTERLY");
        assert_eq!(repo.active_period().unwrap().unwrap().month_name, "May");
    }

    #[test]
    fn test_categories_and_codes() {
        let repo = seeded();
        let trade: Vec<String> = repo.categories(CashType::Trade).unwrap().into_iter().map(|c| c.code).collect();
        assert_eq!(trade, vec!["TR1", "TR2"]);
        assert_eq!(repo.categories(CashType::Money).unwrap()[0].polarity, CashPolarity::Neutral);
        let codes: Vec<String> = repo.cash_codes("TR1").unwrap().into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["S1", "S2"]);
        assert_eq!(repo.category_totals().unwrap()[0].kind, CategoryKind::Total);
        assert_eq!(repo.category_total_codes("GP").unwrap(), vec!["TR2", "TR1"]);
        assert_eq!(repo.category_code_from_name("Sales").unwrap().as_deref(), Some("TR1"));
        assert_eq!(repo.category_code_from_name("Nope").unwrap(), None);

        let exprs = repo.category_expressions().unwrap();
        assert_eq!(exprs.len(), 1);
        assert_eq!(exprs[0].template, "[Gross Profit]/[Sales]");
        assert_eq!(exprs[0].format.as_deref(), Some("Pct1"));
    }

    #[test]
    fn test_value_sources_follow_inclusion() {
        let repo = seeded();
        let none = repo.cash_code_values("S1", 2025, ValueInclusion::NONE).unwrap();
        assert_eq!(none, vec![MonthValue { month_number: 4, value: 100.0 }]);

        let trade = ValueInclusion { active_periods: true, order_book: true, tax_accruals: false };
        assert_eq!(
            repo.cash_code_values("S1", 2025, trade).unwrap(),
            vec![MonthValue { month_number: 4, value: 125.0 }, MonthValue { month_number: 5, value: 7.0 }]
        );

        let tax = ValueInclusion { active_periods: true, order_book: false, tax_accruals: true };
        assert_eq!(repo.cash_code_values("S1", 2025, tax).unwrap()[1].value, 10.0);
    }

    #[test]
    fn test_vat_bank_and_balance_sheet() {
        let repo = seeded();
        assert_eq!(repo.vat_recurrence().unwrap()[0].vat_due, 12.5);
        assert_eq!(repo.vat_period_totals().unwrap()[0].vat_due, 4.0);
        assert_eq!(repo.vat_recurrence_accruals().unwrap()[0].vat_due, Some(2.0));
        assert_eq!(repo.vat_recurrence_accruals().unwrap()[0].home_sales_vat, None);
        assert!(repo.vat_period_accruals().unwrap().is_empty());

        let balances = repo.bank_balances("B1").unwrap();
        assert_eq!(balances[0].month_number, 4);
        assert_eq!(balances[1].balance, 900.0);

        let sheet = repo.balance_sheet().unwrap();
        assert_eq!(sheet[0].asset_code, "DEBT");
        assert_eq!(sheet[1].balance, None);
    }

    #[test]
    fn test_expression_status_is_logged() {
        let repo = seeded();
        repo.report_expression_status("MG", &ExpressionStatus::Ok).unwrap();
        repo.report_expression_status("MG", &ExpressionStatus::Error("missing [Sales]".into())).unwrap();

        let logged: Vec<(String, bool, String)> = repo
            .rows("SELECT category_code, is_error, message FROM event_log ORDER BY id", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .unwrap();
        assert_eq!(
            logged,
            vec![
                ("MG".to_string(), false, "OK".to_string()),
                ("MG".to_string(), true, "missing [Sales]".to_string()),
            ]
        );
    }

    #[test]
    fn test_bad_date_is_an_error() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.connection().execute("INSERT INTO months VALUES (1, 'Jan', '01/01/2025', 0)", []).unwrap();
        assert!(matches!(repo.months(), Err(RepositoryError::Query(_))));
    }

    #[test]
    fn test_missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SqliteRepository::open(&dir.path().join("absent.db")).is_err());
    }
}
