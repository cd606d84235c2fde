// Aggregations over a scoped, period-filtered project snapshot.
// Every revenue/pipeline figure goes through ProjectStatus::is_revenue / is_pipeline.
use crate::domain::dashboard::{
    LeadSourceRevenueRow, LoanByBankRow, PaymentBucketRow, SalesPerformanceRow, StageRow,
    TicketSummary, TileData, WordCloudEntry, YearOverYearRow,
};
use crate::domain::period::{FinancialYear, PeriodFilter};
use crate::domain::project::{PaymentBucket, Project, ProjectStatus, SupportTicket, TicketStatus};
use crate::domain::tile_link::{ProjectListQuery, TileAmount, TileLink, TileMetric};
use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

const UNKNOWN_LEAD_SOURCE: &str = "Unknown";

pub fn revenue_by_lead_source(projects: &[Project]) -> Vec<LeadSourceRevenueRow> {
    let mut groups: BTreeMap<String, (BigDecimal, i64)> = BTreeMap::new();

    for project in projects.iter().filter(|p| p.status.is_revenue()) {
        let label = project
            .lead_source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_LEAD_SOURCE)
            .to_string();

        let entry = groups.entry(label).or_insert_with(|| (BigDecimal::zero(), 0));
        entry.0 += &project.order_value;
        entry.1 += 1;
    }

    let mut rows: Vec<LeadSourceRevenueRow> = groups
        .into_iter()
        .map(|(lead_source_label, (revenue, project_count))| LeadSourceRevenueRow {
            lead_source_label,
            revenue,
            project_count,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.lead_source_label.cmp(&b.lead_source_label))
    });
    rows
}

/// One row per pipeline stage in lifecycle order, empty stages included
pub fn pipeline_by_stage(projects: &[Project]) -> Vec<StageRow> {
    ProjectStatus::pipeline_stages()
        .into_iter()
        .map(|status| {
            let (project_count, order_value) = projects
                .iter()
                .filter(|p| p.status == status)
                .fold((0i64, BigDecimal::zero()), |(count, sum), p| {
                    (count + 1, sum + &p.order_value)
                });

            StageRow {
                status,
                label: status.label(),
                project_count,
                order_value,
            }
        })
        .collect()
}

/// Customers weighted by summed profit on revenue projects. Grouped by
/// customer id; namesakes stay separate words.
pub fn profitability_word_cloud(projects: &[Project], limit: usize) -> Vec<WordCloudEntry> {
    let mut weights: HashMap<i64, (&str, BigDecimal)> = HashMap::new();

    for project in projects.iter().filter(|p| p.status.is_revenue()) {
        let entry = weights
            .entry(project.customer_id)
            .or_insert_with(|| (project.customer_name.as_str(), BigDecimal::zero()));
        entry.1 += project.profit();
    }

    let mut entries: Vec<WordCloudEntry> = weights
        .into_values()
        .filter(|(_, weight)| *weight > BigDecimal::zero())
        .map(|(text, weight)| WordCloudEntry {
            text: text.to_string(),
            weight,
        })
        .collect();

    entries.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.text.cmp(&b.text)));
    entries.truncate(limit);
    entries
}

pub fn year_over_year(projects: &[Project]) -> Vec<YearOverYearRow> {
    let mut years: BTreeMap<FinancialYear, (BigDecimal, BigDecimal)> = BTreeMap::new();

    for project in projects.iter().filter(|p| p.status.is_revenue()) {
        let entry = years
            .entry(FinancialYear::containing(project.booked_on))
            .or_insert_with(|| (BigDecimal::zero(), BigDecimal::zero()));
        entry.0 += &project.order_value;
        entry.1 += project.profit();
    }

    let mut rows = Vec::with_capacity(years.len());
    let mut previous: Option<BigDecimal> = None;

    for (fy, (total_project_value, total_profit)) in years {
        let value_change_pct = previous
            .as_ref()
            .and_then(|prev| percent_change(prev, &total_project_value));
        previous = Some(total_project_value.clone());

        rows.push(YearOverYearRow {
            fy: fy.to_string(),
            total_project_value,
            total_profit,
            value_change_pct,
        });
    }

    rows
}

fn percent_change(previous: &BigDecimal, current: &BigDecimal) -> Option<f64> {
    if previous.is_zero() {
        return None;
    }
    let ratio = ((current - previous) / previous).to_f64()?;
    Some(round2(ratio * 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Every project lands in exactly one of Fully Paid, Partial and the residual
/// N/A bucket, whatever its stage. All three rows are always present.
pub fn payment_status_buckets(projects: &[Project]) -> Vec<PaymentBucketRow> {
    let mut rows: Vec<PaymentBucketRow> = PaymentBucket::ALL
        .into_iter()
        .map(|bucket| PaymentBucketRow {
            bucket,
            label: bucket.label(),
            project_count: 0,
            outstanding: BigDecimal::zero(),
        })
        .collect();

    for project in projects {
        let bucket = project.payment_bucket();
        if let Some(row) = rows.iter_mut().find(|r| r.bucket == bucket) {
            row.project_count += 1;
            row.outstanding += project.outstanding();
        }
    }

    rows
}

pub fn loan_by_bank(projects: &[Project]) -> Vec<LoanByBankRow> {
    let mut banks: BTreeMap<String, (i64, BigDecimal)> = BTreeMap::new();

    for project in projects.iter().filter(|p| p.status.is_revenue()) {
        let Some(bank) = project.loan_bank.as_deref().map(str::trim).filter(|b| !b.is_empty()) else {
            continue;
        };
        let entry = banks
            .entry(bank.to_string())
            .or_insert_with(|| (0, BigDecimal::zero()));
        entry.0 += 1;
        entry.1 += &project.order_value;
    }

    let mut rows: Vec<LoanByBankRow> = banks
        .into_iter()
        .map(|(bank, (project_count, loan_value))| LoanByBankRow {
            bank,
            project_count,
            loan_value,
        })
        .collect();

    rows.sort_by(|a, b| b.loan_value.cmp(&a.loan_value).then_with(|| a.bank.cmp(&b.bank)));
    rows
}

pub fn sales_team_performance(projects: &[Project]) -> Vec<SalesPerformanceRow> {
    let mut team: BTreeMap<i64, SalesPerformanceRow> = BTreeMap::new();

    for project in projects {
        let row = team
            .entry(project.salesperson_id)
            .or_insert_with(|| SalesPerformanceRow {
                salesperson_id: project.salesperson_id,
                salesperson_name: project.salesperson_name.clone(),
                pipeline_value: BigDecimal::zero(),
                revenue: BigDecimal::zero(),
                project_count: 0,
                confirmed_count: 0,
                conversion_pct: 0.0,
            });

        row.project_count += 1;
        if project.status.is_pipeline() {
            row.pipeline_value += &project.order_value;
        }
        if project.status.is_revenue() {
            row.revenue += &project.order_value;
            row.confirmed_count += 1;
        }
    }

    let mut rows: Vec<SalesPerformanceRow> = team
        .into_values()
        .map(|mut row| {
            // a row exists only once a project was counted, so project_count >= 1
            row.conversion_pct =
                round2(row.confirmed_count as f64 * 100.0 / row.project_count as f64);
            row
        })
        .collect();

    rows.sort_by(|a, b| match b.revenue.cmp(&a.revenue) {
        Ordering::Equal => a.salesperson_name.cmp(&b.salesperson_name),
        other => other,
    });
    rows
}

pub fn ticket_summary(tickets: &[SupportTicket]) -> TicketSummary {
    TicketSummary {
        open: tickets.iter().filter(|t| t.status == TicketStatus::Open).count() as i64,
        in_progress: tickets
            .iter()
            .filter(|t| t.status == TicketStatus::InProgress)
            .count() as i64,
    }
}

/// Tile value computed with the very predicate the projects list applies to
/// the tile's link, so the drill-down shows the same number of rows.
pub fn tile(metric: TileMetric, period: &PeriodFilter, projects: &[Project]) -> TileData {
    let query = ProjectListQuery::for_metric(metric, period);

    let (count, amount) = projects
        .iter()
        .filter(|p| query.matches(p))
        .fold((0i64, BigDecimal::zero()), |(count, sum), p| {
            let value = match metric.amount() {
                TileAmount::OrderValue => p.order_value.clone(),
                TileAmount::Outstanding => p.outstanding(),
            };
            (count + 1, sum + value)
        });

    TileData {
        id: format!("tile-{}", metric.slug()),
        title: metric.title(),
        count,
        amount,
        amount_kind: metric.amount(),
        link: TileLink::for_metric(metric, period),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    pub fn project(
        id: i64,
        salesperson_id: i64,
        status: ProjectStatus,
        order_value: i64,
        booked_on: (i32, u32, u32),
    ) -> Project {
        Project {
            id,
            customer_id: id,
            customer_name: format!("Customer {}", id),
            salesperson_id,
            salesperson_name: format!("Sales {}", salesperson_id),
            status,
            payment_status: None,
            lead_source: None,
            order_value: BigDecimal::from(order_value),
            project_cost: BigDecimal::from(order_value * 8 / 10),
            amount_received: BigDecimal::zero(),
            loan_bank: None,
            booked_on: NaiveDate::from_ymd_opt(booked_on.0, booked_on.1, booked_on.2).unwrap(),
        }
    }

    /// A mixed book across two financial years and two salespeople
    pub fn snapshot() -> Vec<Project> {
        let mut projects = vec![
            project(1, 10, ProjectStatus::Confirmed, 500_000, (2024, 4, 15)),
            project(2, 10, ProjectStatus::UnderInstallation, 300_000, (2024, 7, 2)),
            project(3, 11, ProjectStatus::Completed, 200_000, (2024, 11, 20)),
            project(4, 11, ProjectStatus::CompletedSubsidyCredited, 150_000, (2025, 2, 5)),
            project(5, 10, ProjectStatus::SubmittedForSubsidy, 120_000, (2024, 5, 9)),
            project(6, 11, ProjectStatus::Lost, 900_000, (2024, 6, 1)),
            project(7, 10, ProjectStatus::Lead, 80_000, (2024, 8, 30)),
            project(8, 11, ProjectStatus::Confirmed, 400_000, (2023, 9, 12)),
            project(9, 10, ProjectStatus::ProposalSent, 60_000, (2023, 12, 1)),
        ];

        projects[0].lead_source = Some("Referral".to_string());
        projects[0].payment_status = Some("PARTIAL".to_string());
        projects[0].amount_received = BigDecimal::from(200_000);
        projects[0].loan_bank = Some("SBI".to_string());

        projects[1].lead_source = Some("Website".to_string());
        projects[1].payment_status = Some("FULLY_PAID".to_string());
        projects[1].amount_received = BigDecimal::from(300_000);

        projects[2].lead_source = Some("Referral".to_string());
        projects[2].payment_status = Some("Fully Paid".to_string());
        projects[2].amount_received = BigDecimal::from(200_000);
        projects[2].loan_bank = Some("HDFC".to_string());

        projects[3].payment_status = Some("PENDING".to_string());
        projects[3].loan_bank = Some("SBI".to_string());

        projects[5].lead_source = Some("Website".to_string());
        projects[5].payment_status = Some("PARTIAL".to_string());

        projects[7].customer_id = 1;
        projects[7].customer_name = "Customer 1".to_string();
        projects
    }
}
