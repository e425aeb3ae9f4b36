//! Named database procedures for plan assignment and invoicing.
//!
//! Proration and invoice math live behind these calls; this crate
//! asserts only the call shapes and return columns.

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel::sql_types::{Numeric, Text, Uuid as SqlUuid};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize, QueryableByName)]
pub struct AssignPlanResult {
    #[diesel(sql_type = Text)]
    pub message: String,
}

#[derive(Debug, Serialize, QueryableByName)]
pub struct SwitchPlanResult {
    #[diesel(sql_type = Text)]
    pub message: String,
    #[diesel(sql_type = Numeric)]
    pub invoice_amount: BigDecimal,
}

#[derive(Debug, Serialize, QueryableByName)]
pub struct GenerateInvoiceResult {
    #[diesel(sql_type = Numeric)]
    pub amount: BigDecimal,
}

pub fn assign_new_plan(
    conn: &mut PgConnection,
    user_id: Uuid,
    package_id: Uuid,
) -> QueryResult<AssignPlanResult> {
    diesel::sql_query("SELECT message FROM assign_new_plan($1, $2)")
        .bind::<SqlUuid, _>(user_id)
        .bind::<SqlUuid, _>(package_id)
        .get_result(conn)
}

pub fn switch_plan(
    conn: &mut PgConnection,
    subscription_id: Uuid,
    new_package_id: Uuid,
) -> QueryResult<SwitchPlanResult> {
    diesel::sql_query("SELECT message, invoice_amount FROM switch_plan($1, $2)")
        .bind::<SqlUuid, _>(subscription_id)
        .bind::<SqlUuid, _>(new_package_id)
        .get_result(conn)
}

pub fn generate_invoice(
    conn: &mut PgConnection,
    subscription_id: Uuid,
) -> QueryResult<GenerateInvoiceResult> {
    diesel::sql_query("SELECT amount FROM generate_invoice($1)")
        .bind::<SqlUuid, _>(subscription_id)
        .get_result(conn)
}
