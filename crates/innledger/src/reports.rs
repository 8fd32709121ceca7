//! Linear-scan aggregation over facade loads.
//!
//! Missing or non-numeric amounts count as zero; after boundary coercion
//! that only applies to legacy data written before validation existed.

use innledger_types::{Collection, DatasetKind, Record, Tenant};

use crate::Ledger;

impl Ledger {
    /// Sum of `amount` across sales records.
    #[must_use]
    pub fn total_sales(&self, tenant: &Tenant) -> f64 {
        self.sum_amounts(DatasetKind::Sales, tenant)
    }

    /// Sum of `amount` across expenditure records.
    #[must_use]
    pub fn total_expenditures(&self, tenant: &Tenant) -> f64 {
        self.sum_amounts(DatasetKind::Expenditures, tenant)
    }

    /// Money still owed: account sales pending payment plus outstanding
    /// dues still pending.
    #[must_use]
    pub fn pending_dues(&self, tenant: &Tenant) -> f64 {
        let sales = self.load(DatasetKind::Sales, tenant);
        let from_sales: f64 = records_of(&sales)
            .iter()
            .filter(|r| r.str_field("payment_type") == Some("Account"))
            .filter(|r| r.str_field("status") == Some("Pending"))
            .map(amount)
            .sum();

        let dues = self.load(DatasetKind::OutstandingDues, tenant);
        let from_dues: f64 = records_of(&dues)
            .iter()
            .filter(|r| r.str_field("status") == Some("Pending"))
            .map(amount)
            .sum();

        from_sales + from_dues
    }

    /// Records whose `date` falls inside `[start, end]`, both inclusive,
    /// compared on the `YYYY-MM-DD` prefix.
    #[must_use]
    pub fn records_in_range(
        &self,
        kind: DatasetKind,
        tenant: &Tenant,
        start: &str,
        end: &str,
    ) -> Vec<Record> {
        let data = self.load(kind, tenant);
        records_of(&data)
            .iter()
            .filter(|r| {
                r.str_field("date").is_some_and(|date| {
                    let day = date.get(..10).unwrap_or(date);
                    start <= day && day <= end
                })
            })
            .cloned()
            .collect()
    }

    fn sum_amounts(&self, kind: DatasetKind, tenant: &Tenant) -> f64 {
        let data = self.load(kind, tenant);
        records_of(&data).iter().map(amount).sum()
    }
}

fn records_of(data: &Collection) -> &[Record] {
    data.as_records().unwrap_or(&[])
}

fn amount(record: &Record) -> f64 {
    record.f64_field("amount").unwrap_or(0.0)
}
