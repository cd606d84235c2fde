// Repository trait for CRM record access
use crate::domain::period::PeriodFilter;
use crate::domain::project::{Project, SupportTicket};
use crate::domain::role::VisibilityScope;
use async_trait::async_trait;

#[async_trait]
pub trait CrmRepository: Send + Sync {
    /// Projects visible under `scope` whose booking date falls in `period`.
    /// Implementations must return exactly the rows for which
    /// `period.matches(project.booked_on)` holds.
    async fn fetch_projects(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<Project>>;

    /// Support tickets on projects visible under `scope`, raised within `period`
    async fn fetch_tickets(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<SupportTicket>>;
}
