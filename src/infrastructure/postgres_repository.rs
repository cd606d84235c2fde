// PostgreSQL repository implementation
use crate::application::crm_repository::CrmRepository;
use crate::domain::period::PeriodFilter;
use crate::domain::project::{Project, ProjectStatus, SupportTicket, TicketStatus};
use crate::domain::role::VisibilityScope;
use crate::infrastructure::config::DatabaseSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// Create the connection pool, logging statements slower than 5 seconds
pub async fn create_pool(database_url: &str, settings: &DatabaseSettings) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(database_url)
        .context("Invalid database URL")?
        .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5));

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect_with(connect_options)
        .await
        .context("Failed to connect to PostgreSQL")
}

#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: i64,
    customer_id: i64,
    customer_name: String,
    salesperson_id: i64,
    salesperson_name: String,
    status: String,
    payment_status: Option<String>,
    lead_source: Option<String>,
    order_value: BigDecimal,
    project_cost: BigDecimal,
    amount_received: BigDecimal,
    loan_bank: Option<String>,
    booked_on: NaiveDate,
}

#[derive(Debug, FromRow)]
struct TicketRow {
    id: i64,
    project_id: i64,
    salesperson_id: i64,
    status: String,
    raised_on: NaiveDate,
}

impl ProjectRow {
    fn into_project(self) -> Option<Project> {
        let status = match self.status.parse::<ProjectStatus>() {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Skipping project {}: {}", self.id, e);
                return None;
            }
        };

        Some(Project {
            id: self.id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            salesperson_id: self.salesperson_id,
            salesperson_name: self.salesperson_name,
            status,
            payment_status: self.payment_status,
            lead_source: self.lead_source,
            order_value: self.order_value,
            project_cost: self.project_cost,
            amount_received: self.amount_received,
            loan_bank: self.loan_bank,
            booked_on: self.booked_on,
        })
    }
}

impl TicketRow {
    fn into_ticket(self) -> Option<SupportTicket> {
        let status = match self.status.parse::<TicketStatus>() {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Skipping ticket {}: {}", self.id, e);
                return None;
            }
        };

        Some(SupportTicket {
            id: self.id,
            project_id: self.project_id,
            salesperson_id: self.salesperson_id,
            status,
            raised_on: self.raised_on,
        })
    }
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrmRepository for PostgresRepository {
    async fn fetch_projects(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> Result<Vec<Project>> {
        // The FY window only narrows the scan; the exact period predicate runs below
        let (from, until) = period.date_window().unzip();

        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT p.id,
                   p.customer_id,
                   c.name AS customer_name,
                   p.salesperson_id,
                   u.name AS salesperson_name,
                   p.project_status AS status,
                   p.payment_status,
                   p.lead_source,
                   p.order_value,
                   COALESCE(p.project_cost, 0) AS project_cost,
                   COALESCE(p.amount_received, 0) AS amount_received,
                   p.loan_bank,
                   p.booked_on
            FROM projects p
            INNER JOIN customers c ON c.id = p.customer_id
            INNER JOIN users u ON u.id = p.salesperson_id
            WHERE ($1::bigint IS NULL OR p.salesperson_id = $1)
              AND ($2::date IS NULL OR p.booked_on >= $2)
              AND ($3::date IS NULL OR p.booked_on < $3)
            "#,
        )
        .bind(scope.salesperson_id())
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query projects")?;

        let total = rows.len();
        let projects: Vec<Project> = rows
            .into_iter()
            .filter_map(ProjectRow::into_project)
            .filter(|p| period.matches(p.booked_on))
            .collect();

        tracing::debug!(
            "Loaded {} of {} scanned projects for scope {:?}",
            projects.len(),
            total,
            scope
        );
        Ok(projects)
    }

    async fn fetch_tickets(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> Result<Vec<SupportTicket>> {
        let (from, until) = period.date_window().unzip();

        let rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT t.id,
                   t.project_id,
                   p.salesperson_id,
                   t.status,
                   t.created_at::date AS raised_on
            FROM support_tickets t
            INNER JOIN projects p ON p.id = t.project_id
            WHERE ($1::bigint IS NULL OR p.salesperson_id = $1)
              AND ($2::date IS NULL OR t.created_at::date >= $2)
              AND ($3::date IS NULL OR t.created_at::date < $3)
            "#,
        )
        .bind(scope.salesperson_id())
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query support tickets")?;

        Ok(rows
            .into_iter()
            .filter_map(TicketRow::into_ticket)
            .filter(|t| period.matches(t.raised_on))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> ProjectRow {
        ProjectRow {
            id: 1,
            customer_id: 3,
            customer_name: "Rao".to_string(),
            salesperson_id: 2,
            salesperson_name: "Asha".to_string(),
            status: status.to_string(),
            payment_status: None,
            lead_source: Some("Referral".to_string()),
            order_value: BigDecimal::from(10),
            project_cost: BigDecimal::from(8),
            amount_received: BigDecimal::from(0),
            loan_bank: None,
            booked_on: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let project = row("Under Installation").into_project().unwrap();
        assert_eq!(project.status, ProjectStatus::UnderInstallation);
        assert!(row("ON_HOLD").into_project().is_none());
    }
}
