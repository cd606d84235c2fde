// Dashboard domain model - aggregate rows and per-widget results
use crate::domain::period::PeriodFilter;
use crate::domain::project::{PaymentBucket, ProjectStatus};
use crate::domain::role::{Role, Widget, WidgetKind};
use crate::domain::tile_link::{TileAmount, TileLink};
use bigdecimal::BigDecimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSourceRevenueRow {
    pub lead_source_label: String,
    pub revenue: BigDecimal,
    pub project_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRow {
    pub status: ProjectStatus,
    pub label: &'static str,
    pub project_count: i64,
    pub order_value: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCloudEntry {
    pub text: String,
    pub weight: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearOverYearRow {
    pub fy: String,
    pub total_project_value: BigDecimal,
    pub total_profit: BigDecimal,
    pub value_change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBucketRow {
    pub bucket: PaymentBucket,
    pub label: &'static str,
    pub project_count: i64,
    pub outstanding: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanByBankRow {
    pub bank: String,
    pub project_count: i64,
    pub loan_value: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPerformanceRow {
    pub salesperson_id: i64,
    pub salesperson_name: String,
    pub pipeline_value: BigDecimal,
    pub revenue: BigDecimal,
    pub project_count: i64,
    pub confirmed_count: i64,
    /// Share of the salesperson's projects that reached a revenue stage
    pub conversion_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub open: i64,
    pub in_progress: i64,
}

/// A Quick Access tile: one aggregate and the link that reproduces it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileData {
    pub id: String,
    pub title: &'static str,
    pub count: i64,
    pub amount: BigDecimal,
    pub amount_kind: TileAmount,
    pub link: TileLink,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum WidgetData {
    Tile(TileData),
    PaymentStatus(Vec<PaymentBucketRow>),
    RevenueByLeadSource(Vec<LeadSourceRevenueRow>),
    PipelineByStage(Vec<StageRow>),
    YearOverYear(Vec<YearOverYearRow>),
    WordCloud(Vec<WordCloudEntry>),
    LoanByBank(Vec<LoanByBankRow>),
    SalesTeamPerformance(Vec<SalesPerformanceRow>),
    Tickets(TicketSummary),
}

impl WidgetData {
    pub fn is_empty(&self) -> bool {
        match self {
            WidgetData::Tile(_) | WidgetData::Tickets(_) => false,
            WidgetData::PaymentStatus(rows) => rows.iter().all(|r| r.project_count == 0),
            WidgetData::RevenueByLeadSource(rows) => rows.is_empty(),
            WidgetData::PipelineByStage(rows) => rows.iter().all(|r| r.project_count == 0),
            WidgetData::YearOverYear(rows) => rows.is_empty(),
            WidgetData::WordCloud(rows) => rows.is_empty(),
            WidgetData::LoanByBank(rows) => rows.is_empty(),
            WidgetData::SalesTeamPerformance(rows) => rows.is_empty(),
        }
    }
}

/// Outcome of one widget; a failure stays local to the widget
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum WidgetState {
    Ready { data: WidgetData },
    Empty,
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetResult {
    pub id: String,
    pub title: &'static str,
    pub kind: WidgetKind,
    #[serde(flatten)]
    pub state: WidgetState,
}

impl WidgetResult {
    pub fn from_outcome(widget: Widget, outcome: anyhow::Result<WidgetData>) -> Self {
        let state = match outcome {
            Ok(data) if data.is_empty() => WidgetState::Empty,
            Ok(data) => WidgetState::Ready { data },
            Err(e) => WidgetState::Error {
                message: e.to_string(),
            },
        };

        Self {
            id: widget.id(),
            title: widget.title(),
            kind: widget.kind(),
            state,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub role: Role,
    pub period: PeriodFilter,
    pub widgets: Vec<WidgetResult>,
}

impl Dashboard {
    pub fn new(role: Role, period: PeriodFilter, widgets: Vec<WidgetResult>) -> Self {
        Self {
            role,
            period,
            widgets,
        }
    }
}
