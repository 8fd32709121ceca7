//! Back-dated entry helpers.
//!
//! The close-out flow lets staff enter sales and expenses for past days
//! after the fact. A cash sale sourced from an advance payment settles that
//! payment: the advance-payment record flips to completed and takes the
//! sale's date as its completion date.

use innledger_error::Result;
use innledger_types::{DatasetKind, Record, Tenant};
use tracing::warn;

use crate::Ledger;

impl Ledger {
    /// Record a sale dated in the past, settling the advance payment it
    /// draws on when it names one.
    ///
    /// # Errors
    ///
    /// Returns an error when the sale fails validation or either affected
    /// collection cannot be persisted.
    pub fn try_record_historical_sale(&self, tenant: &Tenant, mut sale: Record) -> Result<()> {
        // Normalize up front so the captured settlement date matches what
        // the stored sale will carry. Idempotent under re-normalization.
        sale.normalize_dates(DatasetKind::Sales.schema().date);
        let settlement = advance_settlement(&sale);
        self.try_add_record(DatasetKind::Sales, tenant, sale)?;
        if let Some((source_id, date)) = settlement {
            self.complete_advance_payment(tenant, &source_id, date.as_deref())?;
        }
        Ok(())
    }

    /// Logging wrapper over [`Self::try_record_historical_sale`].
    pub fn record_historical_sale(&self, tenant: &Tenant, sale: Record) -> bool {
        match self.try_record_historical_sale(tenant, sale) {
            Ok(()) => true,
            Err(err) => {
                warn!(tenant = %tenant, error = %err, "historical sale refused");
                false
            }
        }
    }

    pub fn record_historical_expenditure(&self, tenant: &Tenant, record: Record) -> bool {
        self.add_record(DatasetKind::Expenditures, tenant, record)
    }

    pub fn record_historical_advance_payment(&self, tenant: &Tenant, record: Record) -> bool {
        self.add_record(DatasetKind::AdvancePayments, tenant, record)
    }

    pub fn record_historical_outstanding_due(&self, tenant: &Tenant, record: Record) -> bool {
        self.add_record(DatasetKind::OutstandingDues, tenant, record)
    }

    pub fn record_historical_room_service(&self, tenant: &Tenant, record: Record) -> bool {
        self.add_record(DatasetKind::RoomServices, tenant, record)
    }

    pub fn record_historical_complementary_room(&self, tenant: &Tenant, record: Record) -> bool {
        self.add_record(DatasetKind::ComplementaryRooms, tenant, record)
    }

    fn complete_advance_payment(
        &self,
        tenant: &Tenant,
        source_id: &str,
        date: Option<&str>,
    ) -> Result<()> {
        let mut data = self.load(DatasetKind::AdvancePayments, tenant);
        let Some(records) = data.as_records_mut() else {
            return Ok(());
        };
        let Some(record) = records.iter_mut().find(|r| r.id() == Some(source_id)) else {
            warn!(
                tenant = %tenant,
                source_id, "advance payment to settle not found"
            );
            return Ok(());
        };
        record.set("status", "Completed");
        if let Some(date) = date {
            record.set("completion_date", date);
        }
        self.try_save(DatasetKind::AdvancePayments, tenant, &data)
    }
}

fn advance_settlement(sale: &Record) -> Option<(String, Option<String>)> {
    if sale.str_field("payment_type") != Some("Cash")
        || sale.str_field("source") != Some("advance_payment")
    {
        return None;
    }
    let id = sale.str_field("source_id")?.to_owned();
    Some((id, sale.str_field("date").map(str::to_owned)))
}
