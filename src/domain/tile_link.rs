// Quick Access tiles and their drill-down links into the projects list
use crate::domain::period::PeriodFilter;
use crate::domain::project::{PaymentBucket, Project, ProjectStatus};
use serde::Serialize;
use std::collections::BTreeSet;

pub const PROJECTS_PATH: &str = "/projects";

/// Aggregate behind a Quick Access tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileMetric {
    Pipeline,
    Revenue,
    PendingInstallation,
    UnderInstallation,
    SubsidyPending,
    Completed,
    PaymentFullyPaid,
    PaymentPartial,
    PaymentNotApplicable,
}

/// What a tile sums alongside its project count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TileAmount {
    OrderValue,
    Outstanding,
}

impl TileMetric {
    pub const ALL: [TileMetric; 9] = [
        TileMetric::Pipeline,
        TileMetric::Revenue,
        TileMetric::PendingInstallation,
        TileMetric::UnderInstallation,
        TileMetric::SubsidyPending,
        TileMetric::Completed,
        TileMetric::PaymentFullyPaid,
        TileMetric::PaymentPartial,
        TileMetric::PaymentNotApplicable,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            TileMetric::Pipeline => "pipeline",
            TileMetric::Revenue => "revenue",
            TileMetric::PendingInstallation => "pending-installation",
            TileMetric::UnderInstallation => "under-installation",
            TileMetric::SubsidyPending => "subsidy-pending",
            TileMetric::Completed => "completed",
            TileMetric::PaymentFullyPaid => "payment-fully-paid",
            TileMetric::PaymentPartial => "payment-partial",
            TileMetric::PaymentNotApplicable => "payment-na",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TileMetric::Pipeline => "Pipeline",
            TileMetric::Revenue => "Revenue",
            TileMetric::PendingInstallation => "Pending Installation",
            TileMetric::UnderInstallation => "Under Installation",
            TileMetric::SubsidyPending => "Subsidy Pending",
            TileMetric::Completed => "Completed",
            TileMetric::PaymentFullyPaid => "Fully Paid",
            TileMetric::PaymentPartial => "Partially Paid",
            TileMetric::PaymentNotApplicable => "Payment N/A",
        }
    }

    pub fn amount(&self) -> TileAmount {
        match self {
            TileMetric::PaymentPartial | TileMetric::PaymentNotApplicable => TileAmount::Outstanding,
            _ => TileAmount::OrderValue,
        }
    }

    /// The metric's implicit list filter, before the period is applied
    pub fn params(&self) -> MetricParams {
        let statuses = |list: &[ProjectStatus]| MetricParams {
            statuses: list.iter().copied().collect(),
            payment_buckets: BTreeSet::new(),
        };
        // payment buckets span every stage, LOST included
        let payment = |bucket: PaymentBucket| MetricParams {
            statuses: ProjectStatus::ALL.into_iter().collect(),
            payment_buckets: [bucket].into_iter().collect(),
        };

        match self {
            TileMetric::Pipeline => statuses(&ProjectStatus::pipeline_stages()),
            TileMetric::Revenue => statuses(&ProjectStatus::REVENUE),
            TileMetric::PendingInstallation => statuses(&[ProjectStatus::Confirmed]),
            TileMetric::UnderInstallation => statuses(&[ProjectStatus::UnderInstallation]),
            TileMetric::SubsidyPending => statuses(&[ProjectStatus::SubmittedForSubsidy]),
            TileMetric::Completed => statuses(&[
                ProjectStatus::Completed,
                ProjectStatus::CompletedSubsidyCredited,
            ]),
            TileMetric::PaymentFullyPaid => payment(PaymentBucket::FullyPaid),
            TileMetric::PaymentPartial => payment(PaymentBucket::Partial),
            TileMetric::PaymentNotApplicable => payment(PaymentBucket::NotApplicable),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricParams {
    pub statuses: BTreeSet<ProjectStatus>,
    pub payment_buckets: BTreeSet<PaymentBucket>,
}

/// Filters of the projects list view, as carried in its query string.
///
/// Status and payment values are kept verbatim so an unrecognised value keeps
/// filtering (and matches nothing) instead of silently widening the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectListQuery {
    pub statuses: BTreeSet<String>,
    pub payment_statuses: BTreeSet<String>,
    pub period: PeriodFilter,
}

impl ProjectListQuery {
    pub fn new(params: &MetricParams, period: &PeriodFilter) -> Self {
        Self {
            statuses: params.statuses.iter().map(|s| s.as_str().to_string()).collect(),
            payment_statuses: params
                .payment_buckets
                .iter()
                .map(|b| b.as_str().to_string())
                .collect(),
            period: period.clone(),
        }
    }

    pub fn for_metric(metric: TileMetric, period: &PeriodFilter) -> Self {
        Self::new(&metric.params(), period)
    }

    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let values = |key: &str| -> BTreeSet<String> {
            pairs
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .collect()
        };

        Self {
            statuses: values("status"),
            payment_statuses: values("paymentStatus"),
            period: PeriodFilter::from_query(pairs),
        }
    }

    /// Query pairs in the fixed order status, paymentStatus, fy, quarter, month
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        pairs.extend(self.statuses.iter().map(|v| ("status", v.clone())));
        pairs.extend(self.payment_statuses.iter().map(|v| ("paymentStatus", v.clone())));
        pairs.extend(self.period.query_pairs());
        pairs
    }

    pub fn to_query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// List-view predicate. Without an explicit status filter the list hides
    /// LOST projects; an explicit status filter replaces that default.
    pub fn matches(&self, project: &Project) -> bool {
        let status_ok = if self.statuses.is_empty() {
            project.status.is_pipeline()
        } else {
            self.statuses.contains(project.status.as_str())
        };

        let payment_ok = self.payment_statuses.is_empty()
            || self.payment_statuses.contains(project.payment_bucket().as_str());

        status_ok && payment_ok && self.period.matches(project.booked_on)
    }
}

/// Deep link reproducing a tile's aggregate as a filtered projects list
pub fn build_projects_url(params: &MetricParams, period: &PeriodFilter) -> String {
    let query = ProjectListQuery::new(params, period).to_query_string();
    if query.is_empty() {
        PROJECTS_PATH.to_string()
    } else {
        format!("{}?{}", PROJECTS_PATH, query)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLink {
    pub path: &'static str,
    pub query: TileLinkQuery,
    pub href: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLinkQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub payment_status: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fy: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quarter: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub month: Vec<String>,
}

impl TileLink {
    pub fn for_metric(metric: TileMetric, period: &PeriodFilter) -> Self {
        let params = metric.params();
        let list = ProjectListQuery::new(&params, period);

        let query = TileLinkQuery {
            status: list.statuses.iter().cloned().collect(),
            payment_status: list.payment_statuses.iter().cloned().collect(),
            fy: period.financial_years().iter().cloned().collect(),
            quarter: period.quarters().iter().cloned().collect(),
            month: period.months().iter().cloned().collect(),
        };

        Self {
            path: PROJECTS_PATH,
            query,
            href: build_projects_url(&params, period),
        }
    }
}
