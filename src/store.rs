// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite-backed purchase record store.
//!
//! Every mutation runs in a transaction and bumps `records_version` in the
//! settings table; cached reports are keyed on that version.

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::engine::MAX_INSTALLMENTS;
use crate::error::SkippedRecord;
use crate::models::{
    CascadeReport, Category, EntryKind, ExpenseType, NewExpense, PaymentMethod, PurchaseRecord,
    Snapshot,
};

/// What the engine needs from wherever purchase records live.
pub trait RecordStore {
    /// All records plus the version they were read at, read consistently.
    fn snapshot(&self) -> Result<Snapshot>;
    fn list_records(&self, filter: &RecordFilter) -> Result<Vec<PurchaseRecord>>;
    fn list_categories(&self) -> Result<Vec<Category>>;
    fn list_types(&self) -> Result<Vec<ExpenseType>>;
    fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>>;
    fn version(&self) -> Result<u64>;
}

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub id: Option<i64>,
    /// Purchase month, `YYYY-MM`.
    pub month: Option<String>,
    pub category: Option<String>,
    pub expense_type: Option<String>,
    pub payment_method: Option<String>,
    pub limit: Option<usize>,
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

const RECORD_SQL: &str = "SELECT e.id, e.date, e.amount, e.installments, t.category_id, e.type_id, \
     e.payment_method_id, e.description, c.name, t.name, p.name \
     FROM expenses e \
     LEFT JOIN types t ON e.type_id=t.id \
     LEFT JOIN categories c ON t.category_id=c.id \
     LEFT JOIN payment_methods p ON e.payment_method_id=p.id \
     WHERE 1=1";

fn read_version(conn: &Connection) -> Result<u64> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='records_version'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    match v {
        Some(s) => s
            .parse::<u64>()
            .with_context(|| format!("Invalid records_version '{}'", s)),
        None => Ok(0),
    }
}

fn bump_version(conn: &Connection) -> Result<u64> {
    let next = read_version(conn)? + 1;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('records_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![next.to_string()],
    )?;
    Ok(next)
}

fn check_installments(e: &NewExpense) -> Result<()> {
    if e.installment_count > MAX_INSTALLMENTS {
        bail!(
            "{} installments exceeds the maximum of {}",
            e.installment_count,
            MAX_INSTALLMENTS
        );
    }
    Ok(())
}

fn ensure_changed(changed: usize, what: &str, id: i64) -> Result<()> {
    if changed == 0 {
        bail!("{} #{} not found", what, id);
    }
    Ok(())
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteStore { conn }
    }

    fn load(&self, filter: &RecordFilter) -> Result<(Vec<PurchaseRecord>, Vec<SkippedRecord>)> {
        let mut sql = String::from(RECORD_SQL);
        let mut params_vec: Vec<String> = Vec::new();

        if let Some(id) = filter.id {
            sql.push_str(" AND e.id=?");
            params_vec.push(id.to_string());
        }
        if let Some(month) = &filter.month {
            sql.push_str(" AND substr(e.date,1,7)=?");
            params_vec.push(month.clone());
        }
        if let Some(cat) = &filter.category {
            sql.push_str(" AND c.name=?");
            params_vec.push(cat.clone());
        }
        if let Some(t) = &filter.expense_type {
            sql.push_str(" AND t.name=?");
            params_vec.push(t.clone());
        }
        if let Some(p) = &filter.payment_method {
            sql.push_str(" AND p.name=?");
            params_vec.push(p.clone());
        }
        sql.push_str(" ORDER BY e.date DESC, e.id DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params_vec.push(limit.to_string());
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;

        let mut records = Vec::new();
        let mut rejected = Vec::new();
        while let Some(r) = rows.next()? {
            let id: i64 = r.get(0)?;
            let amount_s: String = r.get(2)?;
            let unit_value = match amount_s.trim().parse::<Decimal>() {
                Ok(d) => d,
                Err(_) => {
                    warn!(id, amount = %amount_s, "stored amount is not a decimal");
                    rejected.push(SkippedRecord {
                        id,
                        reason: format!("stored amount '{}' is not a decimal", amount_s),
                    });
                    continue;
                }
            };
            records.push(PurchaseRecord {
                id,
                purchase_date: r.get(1)?,
                unit_value,
                installment_count: r.get(3)?,
                category_id: r.get(4)?,
                type_id: r.get(5)?,
                payment_method_id: r.get(6)?,
                description: r.get(7)?,
                category: r.get(8)?,
                expense_type: r.get(9)?,
                payment_method: r.get(10)?,
            });
        }
        Ok((records, rejected))
    }

    // Categories

    pub fn add_category(&self, kind: EntryKind, name: &str, description: Option<&str>) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO categories(kind, name, description) VALUES (?1, ?2, ?3)",
            params![kind.as_str(), name, description],
        )
        .with_context(|| format!("Category '{}' already exists for kind {}", name, kind))?;
        let id = tx.last_insert_rowid();
        bump_version(&tx)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update_category(&self, id: i64, name: &str, description: Option<&str>) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx
            .execute(
                "UPDATE categories SET name=?1, description=?2 WHERE id=?3",
                params![name, description, id],
            )
            .with_context(|| format!("Category '{}' already exists", name))?;
        ensure_changed(changed, "Category", id)?;
        bump_version(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Removes a category, its types and every expense filed under those types.
    pub fn delete_category(&self, id: i64) -> Result<CascadeReport> {
        let tx = self.conn.unchecked_transaction()?;
        let expenses = tx.execute(
            "DELETE FROM expenses WHERE type_id IN (SELECT id FROM types WHERE category_id=?1)",
            params![id],
        )?;
        let types = tx.execute("DELETE FROM types WHERE category_id=?1", params![id])?;
        let categories = tx.execute("DELETE FROM categories WHERE id=?1", params![id])?;
        ensure_changed(categories, "Category", id)?;
        bump_version(&tx)?;
        tx.commit()?;
        let report = CascadeReport {
            categories,
            types,
            expenses,
            ..Default::default()
        };
        info!(id, types, expenses, "category deleted with cascade");
        Ok(report)
    }

    // Types

    pub fn add_type(
        &self,
        kind: EntryKind,
        name: &str,
        description: Option<&str>,
        category_id: Option<i64>,
    ) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO types(kind, name, description, category_id) VALUES (?1, ?2, ?3, ?4)",
            params![kind.as_str(), name, description, category_id],
        )
        .with_context(|| format!("Type '{}' already exists for kind {}", name, kind))?;
        let id = tx.last_insert_rowid();
        bump_version(&tx)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update_type(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        category_id: Option<i64>,
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx
            .execute(
                "UPDATE types SET name=?1, description=?2, category_id=?3 WHERE id=?4",
                params![name, description, category_id, id],
            )
            .with_context(|| format!("Type '{}' already exists", name))?;
        ensure_changed(changed, "Type", id)?;
        bump_version(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Removes a type and its expenses.
    pub fn delete_type(&self, id: i64) -> Result<CascadeReport> {
        let tx = self.conn.unchecked_transaction()?;
        let expenses = tx.execute("DELETE FROM expenses WHERE type_id=?1", params![id])?;
        let types = tx.execute("DELETE FROM types WHERE id=?1", params![id])?;
        ensure_changed(types, "Type", id)?;
        bump_version(&tx)?;
        tx.commit()?;
        info!(id, expenses, "type deleted with cascade");
        Ok(CascadeReport {
            types,
            expenses,
            ..Default::default()
        })
    }

    // Payment methods

    pub fn add_payment_method(&self, name: &str, description: Option<&str>) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO payment_methods(name, description) VALUES (?1, ?2)",
            params![name, description],
        )
        .with_context(|| format!("Payment method '{}' already exists", name))?;
        let id = tx.last_insert_rowid();
        bump_version(&tx)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update_payment_method(&self, id: i64, name: &str, description: Option<&str>) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx
            .execute(
                "UPDATE payment_methods SET name=?1, description=?2 WHERE id=?3",
                params![name, description, id],
            )
            .with_context(|| format!("Payment method '{}' already exists", name))?;
        ensure_changed(changed, "Payment method", id)?;
        bump_version(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Removes a payment method and the expenses paid with it.
    pub fn delete_payment_method(&self, id: i64) -> Result<CascadeReport> {
        let tx = self.conn.unchecked_transaction()?;
        let expenses = tx.execute(
            "DELETE FROM expenses WHERE payment_method_id=?1",
            params![id],
        )?;
        let payment_methods = tx.execute("DELETE FROM payment_methods WHERE id=?1", params![id])?;
        ensure_changed(payment_methods, "Payment method", id)?;
        bump_version(&tx)?;
        tx.commit()?;
        info!(id, expenses, "payment method deleted with cascade");
        Ok(CascadeReport {
            payment_methods,
            expenses,
            ..Default::default()
        })
    }

    // Expenses

    pub fn add_expense(&self, e: &NewExpense) -> Result<i64> {
        check_installments(e)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO expenses(date, amount, description, type_id, payment_method_id, installments)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                e.date.to_string(),
                e.unit_value.to_string(),
                e.description,
                e.type_id,
                e.payment_method_id,
                e.installment_count
            ],
        )?;
        let id = tx.last_insert_rowid();
        bump_version(&tx)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update_expense(&self, id: i64, e: &NewExpense) -> Result<()> {
        check_installments(e)?;
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE expenses SET date=?1, amount=?2, description=?3, type_id=?4,
             payment_method_id=?5, installments=?6 WHERE id=?7",
            params![
                e.date.to_string(),
                e.unit_value.to_string(),
                e.description,
                e.type_id,
                e.payment_method_id,
                e.installment_count,
                id
            ],
        )?;
        ensure_changed(changed, "Expense", id)?;
        bump_version(&tx)?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_expense(&self, id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute("DELETE FROM expenses WHERE id=?1", params![id])?;
        ensure_changed(changed, "Expense", id)?;
        bump_version(&tx)?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_record(&self, id: i64) -> Result<Option<PurchaseRecord>> {
        let filter = RecordFilter {
            id: Some(id),
            ..Default::default()
        };
        let (records, _) = self.load(&filter)?;
        Ok(records.into_iter().next())
    }

    /// Inserts the starter categories, types and payment methods.
    ///
    /// Existing names are left alone, so running it twice is harmless.
    /// Returns how many rows were added.
    pub fn seed_defaults(&self) -> Result<usize> {
        const CATEGORIES: &[(&str, &str, &str)] = &[
            ("expense", "Alimentação", "Despesas com alimentação e restaurantes"),
            ("expense", "Transporte", "Despesas com transporte público ou combustível"),
            ("income", "Salário", "Rendimentos mensais do trabalho"),
            ("income", "Freelance", "Rendimentos de trabalhos autônomos"),
            ("investment", "Ações", "Investimento em mercado de ações"),
            ("investment", "Renda Fixa", "Investimento em títulos de renda fixa"),
        ];
        const TYPES: &[(&str, &str, &str, &str)] = &[
            ("expense", "Supermercado", "Gastos com compras de supermercado", "Alimentação"),
            ("expense", "Posto de Gasolina", "Gastos com combustível", "Transporte"),
            ("income", "Bônus", "Recebimentos extras além do salário", "Salário"),
            ("investment", "Tesouro Direto", "Investimentos no Tesouro Nacional", "Renda Fixa"),
        ];
        const PAYMENTS: &[(&str, &str)] = &[
            ("Cartão de Crédito", "Pagamentos feitos com cartão de crédito"),
            ("Cartão de Débito", "Pagamentos feitos com cartão de débito"),
            ("Dinheiro", "Pagamentos realizados em dinheiro"),
            ("Transferência Bancária", "Pagamentos realizados por transferência"),
        ];

        let tx = self.conn.unchecked_transaction()?;
        let mut added = 0;
        for (kind, name, description) in CATEGORIES {
            added += tx.execute(
                "INSERT OR IGNORE INTO categories(kind, name, description) VALUES (?1, ?2, ?3)",
                params![kind, name, description],
            )?;
        }
        for (kind, name, description, category) in TYPES {
            added += tx.execute(
                "INSERT OR IGNORE INTO types(kind, name, description, category_id)
                 SELECT ?1, ?2, ?3, id FROM categories WHERE kind=?1 AND name=?4",
                params![kind, name, description, category],
            )?;
        }
        for (name, description) in PAYMENTS {
            added += tx.execute(
                "INSERT OR IGNORE INTO payment_methods(name, description) VALUES (?1, ?2)",
                params![name, description],
            )?;
        }
        if added > 0 {
            bump_version(&tx)?;
        }
        tx.commit()?;
        info!(added, "default records seeded");
        Ok(added)
    }
}

impl RecordStore for SqliteStore<'_> {
    fn snapshot(&self) -> Result<Snapshot> {
        // One read transaction so the version matches the rows.
        let tx = self.conn.unchecked_transaction()?;
        let version = read_version(&tx)?;
        let (records, rejected) = self.load(&RecordFilter::default())?;
        tx.commit()?;
        Ok(Snapshot {
            version,
            records,
            rejected,
        })
    }

    fn list_records(&self, filter: &RecordFilter) -> Result<Vec<PurchaseRecord>> {
        Ok(self.load(filter)?.0)
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt =
            self.conn
                .prepare("SELECT id, kind, name, description FROM categories ORDER BY kind, name")?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<String>>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, kind, name, description) = row?;
            out.push(Category {
                id,
                kind: kind.parse()?,
                name,
                description,
            });
        }
        Ok(out)
    }

    fn list_types(&self) -> Result<Vec<ExpenseType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, name, description, category_id FROM types ORDER BY kind, name",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<String>>(3)?,
                r.get::<_, Option<i64>>(4)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, kind, name, description, category_id) = row?;
            out.push(ExpenseType {
                id,
                kind: kind.parse()?,
                name,
                description,
                category_id,
            });
        }
        Ok(out)
    }

    fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM payment_methods ORDER BY name")?;
        let rows = stmt.query_map([], |r| {
            Ok(PaymentMethod {
                id: r.get(0)?,
                name: r.get(1)?,
                description: r.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn version(&self) -> Result<u64> {
        read_version(self.conn)
    }
}
