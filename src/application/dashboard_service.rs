// Dashboard service - Use case for composing role-scoped dashboards
use crate::application::aggregation;
use crate::application::crm_repository::CrmRepository;
use crate::domain::dashboard::{
    Dashboard, LeadSourceRevenueRow, LoanByBankRow, PaymentBucketRow, SalesPerformanceRow,
    StageRow, TileData, WidgetData, WidgetResult, WordCloudEntry, YearOverYearRow,
};
use crate::domain::period::PeriodFilter;
use crate::domain::project::Project;
use crate::domain::role::{Role, VisibilityScope, Widget};
use crate::domain::tile_link::{ProjectListQuery, TileMetric};
use anyhow::Context;
use futures::future::join_all;
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn CrmRepository>,
    word_cloud_limit: usize,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn CrmRepository>, word_cloud_limit: usize) -> Self {
        Self {
            repository,
            word_cloud_limit,
        }
    }

    /// Evaluate every widget of `role` concurrently. A widget whose query
    /// fails is reported in the error state; the others are unaffected.
    pub async fn get_dashboard(
        &self,
        role: Role,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> Dashboard {
        let widgets = role.widgets();

        let results = join_all(widgets.iter().map(|widget| async move {
            let outcome = self.evaluate(*widget, scope, period).await;
            if let Err(e) = &outcome {
                tracing::warn!("Widget {} failed for {}: {:#}", widget.id(), role, e);
            }
            WidgetResult::from_outcome(*widget, outcome)
        }))
        .await;

        Dashboard::new(role, period.clone(), results)
    }

    pub async fn evaluate(
        &self,
        widget: Widget,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<WidgetData> {
        let data = match widget {
            Widget::Tile(metric) => WidgetData::Tile(self.tile(metric, scope, period).await?),
            Widget::PaymentStatus => WidgetData::PaymentStatus(self.payment_status(scope, period).await?),
            Widget::RevenueByLeadSource => {
                WidgetData::RevenueByLeadSource(self.revenue_by_lead_source(scope, period).await?)
            }
            Widget::PipelineByStage => {
                WidgetData::PipelineByStage(self.pipeline_by_stage(scope, period).await?)
            }
            Widget::YearOverYear => WidgetData::YearOverYear(self.year_over_year(scope, period).await?),
            Widget::ProfitabilityWordCloud => {
                WidgetData::WordCloud(self.word_cloud(scope, period).await?)
            }
            Widget::LoanByBank => WidgetData::LoanByBank(self.loan_by_bank(scope, period).await?),
            Widget::SalesTeamPerformance => {
                WidgetData::SalesTeamPerformance(self.sales_team_performance(scope, period).await?)
            }
            Widget::OpenTickets => {
                let tickets = self
                    .repository
                    .fetch_tickets(scope, period)
                    .await
                    .context("Failed to load support tickets")?;
                WidgetData::Tickets(aggregation::ticket_summary(&tickets))
            }
        };

        tracing::debug!("Widget {} evaluated", widget.id());
        Ok(data)
    }

    async fn projects(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<Project>> {
        self.repository
            .fetch_projects(scope, period)
            .await
            .context("Failed to load projects")
    }

    pub async fn tile(
        &self,
        metric: TileMetric,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<TileData> {
        let projects = self.projects(scope, period).await?;
        Ok(aggregation::tile(metric, period, &projects))
    }

    pub async fn quick_access(
        &self,
        role: Role,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<TileData>> {
        let projects = self.projects(scope, period).await?;
        Ok(role
            .widgets()
            .into_iter()
            .filter_map(|widget| match widget {
                Widget::Tile(metric) => Some(aggregation::tile(metric, period, &projects)),
                _ => None,
            })
            .collect())
    }

    pub async fn revenue_by_lead_source(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<LeadSourceRevenueRow>> {
        let projects = self.projects(scope, period).await?;
        Ok(aggregation::revenue_by_lead_source(&projects))
    }

    pub async fn pipeline_by_stage(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<StageRow>> {
        let projects = self.projects(scope, period).await?;
        Ok(aggregation::pipeline_by_stage(&projects))
    }

    pub async fn word_cloud(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<WordCloudEntry>> {
        let projects = self.projects(scope, period).await?;
        Ok(aggregation::profitability_word_cloud(&projects, self.word_cloud_limit))
    }

    pub async fn year_over_year(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<YearOverYearRow>> {
        let projects = self.projects(scope, period).await?;
        Ok(aggregation::year_over_year(&projects))
    }

    pub async fn payment_status(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<PaymentBucketRow>> {
        let projects = self.projects(scope, period).await?;
        Ok(aggregation::payment_status_buckets(&projects))
    }

    pub async fn loan_by_bank(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<LoanByBankRow>> {
        let projects = self.projects(scope, period).await?;
        Ok(aggregation::loan_by_bank(&projects))
    }

    pub async fn sales_team_performance(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<SalesPerformanceRow>> {
        let projects = self.projects(scope, period).await?;
        Ok(aggregation::sales_team_performance(&projects))
    }

    /// Projects list view, the drill-down target of every tile link
    pub async fn list_projects(
        &self,
        scope: VisibilityScope,
        query: &ProjectListQuery,
    ) -> anyhow::Result<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .projects(scope, &query.period)
            .await?
            .into_iter()
            .filter(|p| query.matches(p))
            .collect();

        projects.sort_by(|a, b| b.booked_on.cmp(&a.booked_on).then_with(|| a.id.cmp(&b.id)));
        Ok(projects)
    }
}
