// In-memory repository - used when no database is configured, and by tests
use crate::application::crm_repository::CrmRepository;
use crate::domain::period::PeriodFilter;
use crate::domain::project::{Project, SupportTicket};
use crate::domain::role::VisibilityScope;
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct MemoryRepository {
    projects: Vec<Project>,
    tickets: Vec<SupportTicket>,
    #[cfg(test)]
    fail_tickets: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            projects,
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn with_tickets(self, tickets: Vec<SupportTicket>) -> Self {
        Self {
            tickets,
            ..self
        }
    }

    #[cfg(test)]
    pub fn failing_tickets(self) -> Self {
        Self {
            fail_tickets: true,
            ..self
        }
    }
}

#[async_trait]
impl CrmRepository for MemoryRepository {
    async fn fetch_projects(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<Project>> {
        Ok(self
            .projects
            .iter()
            .filter(|p| scope.allows(p.salesperson_id) && period.matches(p.booked_on))
            .cloned()
            .collect())
    }

    async fn fetch_tickets(
        &self,
        scope: VisibilityScope,
        period: &PeriodFilter,
    ) -> anyhow::Result<Vec<SupportTicket>> {
        #[cfg(test)]
        {
            if self.fail_tickets {
                anyhow::bail!("ticket store unavailable");
            }
        }

        Ok(self
            .tickets
            .iter()
            .filter(|t| scope.allows(t.salesperson_id) && period.matches(t.raised_on))
            .cloned()
            .collect())
    }
}
