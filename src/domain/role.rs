// Roles, visibility scope and the static role -> widget table
use crate::domain::tile_link::TileMetric;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Sales,
    Operations,
    Finance,
    Management,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Sales => "SALES",
            Role::Operations => "OPERATIONS",
            Role::Finance => "FINANCE",
            Role::Management => "MANAGEMENT",
        }
    }

    /// Rows a user of this role may aggregate over
    pub fn scope_for(&self, user_id: i64) -> VisibilityScope {
        match self {
            Role::Sales => VisibilityScope::Salesperson(user_id),
            _ => VisibilityScope::All,
        }
    }

    /// Whether a user holding this role may open the dashboard layout of `other`
    pub fn can_view(&self, other: Role) -> bool {
        *self == other || *self == Role::Admin
    }

    /// Ordered widgets for this role's dashboard
    pub fn widgets(&self) -> Vec<Widget> {
        use TileMetric::*;
        use Widget::*;

        match self {
            // company-wide; read/write vs read-only is enforced elsewhere
            Role::Admin | Role::Management => vec![
                Tile(Pipeline),
                Tile(Revenue),
                Tile(PendingInstallation),
                Tile(UnderInstallation),
                Tile(SubsidyPending),
                Tile(Completed),
                PaymentStatus,
                RevenueByLeadSource,
                PipelineByStage,
                YearOverYear,
                ProfitabilityWordCloud,
                LoanByBank,
                SalesTeamPerformance,
                OpenTickets,
            ],
            Role::Sales => vec![
                Tile(Pipeline),
                Tile(Revenue),
                Tile(PendingInstallation),
                RevenueByLeadSource,
                PipelineByStage,
                SalesTeamPerformance,
            ],
            Role::Operations => vec![
                Tile(PendingInstallation),
                Tile(UnderInstallation),
                Tile(SubsidyPending),
                Tile(Completed),
                PipelineByStage,
                OpenTickets,
            ],
            Role::Finance => vec![
                Tile(Revenue),
                Tile(PaymentFullyPaid),
                Tile(PaymentPartial),
                Tile(PaymentNotApplicable),
                PaymentStatus,
                ProfitabilityWordCloud,
                LoanByBank,
                YearOverYear,
            ],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "SALES" => Ok(Role::Sales),
            "OPERATIONS" => Ok(Role::Operations),
            "FINANCE" => Ok(Role::Finance),
            "MANAGEMENT" => Ok(Role::Management),
            _ => Err(format!("unknown role '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityScope {
    All,
    Salesperson(i64),
}

impl VisibilityScope {
    pub fn salesperson_id(&self) -> Option<i64> {
        match self {
            VisibilityScope::All => None,
            VisibilityScope::Salesperson(id) => Some(*id),
        }
    }

    pub fn allows(&self, salesperson_id: i64) -> bool {
        match self {
            VisibilityScope::All => true,
            VisibilityScope::Salesperson(id) => *id == salesperson_id,
        }
    }

    pub fn cache_tag(&self) -> String {
        match self {
            VisibilityScope::All => "all".to_string(),
            VisibilityScope::Salesperson(id) => format!("sp:{}", id),
        }
    }
}

/// Authenticated caller, as asserted by the upstream gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: i64,
    pub role: Role,
    pub name: Option<String>,
}

impl UserIdentity {
    pub fn scope(&self) -> VisibilityScope {
        self.role.scope_for(self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Widget {
    Tile(TileMetric),
    PaymentStatus,
    RevenueByLeadSource,
    PipelineByStage,
    YearOverYear,
    ProfitabilityWordCloud,
    LoanByBank,
    SalesTeamPerformance,
    OpenTickets,
}

impl Widget {
    pub fn id(&self) -> String {
        match self {
            Widget::Tile(metric) => format!("tile-{}", metric.slug()),
            Widget::PaymentStatus => "payment-status".to_string(),
            Widget::RevenueByLeadSource => "revenue-by-lead-source".to_string(),
            Widget::PipelineByStage => "pipeline-by-stage".to_string(),
            Widget::YearOverYear => "year-over-year".to_string(),
            Widget::ProfitabilityWordCloud => "wordcloud".to_string(),
            Widget::LoanByBank => "loan-by-bank".to_string(),
            Widget::SalesTeamPerformance => "sales-team-performance".to_string(),
            Widget::OpenTickets => "open-tickets".to_string(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Widget::Tile(metric) => metric.title(),
            Widget::PaymentStatus => "Payment Status",
            Widget::RevenueByLeadSource => "Revenue by Lead Source",
            Widget::PipelineByStage => "Pipeline by Stage",
            Widget::YearOverYear => "Year over Year",
            Widget::ProfitabilityWordCloud => "Profitability",
            Widget::LoanByBank => "Loans by Bank",
            Widget::SalesTeamPerformance => "Sales Team Performance",
            Widget::OpenTickets => "Open Tickets",
        }
    }

    pub fn kind(&self) -> WidgetKind {
        match self {
            Widget::Tile(_) | Widget::OpenTickets => WidgetKind::Tile,
            Widget::ProfitabilityWordCloud => WidgetKind::WordCloud,
            Widget::SalesTeamPerformance => WidgetKind::Table,
            _ => WidgetKind::Chart,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKind {
    Tile,
    Chart,
    WordCloud,
    Table,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_for_roles() {
        assert_eq!(Role::Sales.scope_for(42), VisibilityScope::Salesperson(42));
        assert_eq!(Role::Finance.scope_for(42), VisibilityScope::All);
        assert_eq!(Role::Management.scope_for(42), VisibilityScope::All);
    }

    #[test]
    fn test_admin_and_management_share_widgets() {
        assert_eq!(Role::Admin.widgets(), Role::Management.widgets());
    }

    #[test]
    fn test_finance_widgets() {
        let widgets = Role::Finance.widgets();
        assert!(widgets.contains(&Widget::Tile(TileMetric::Revenue)));
        assert!(widgets.contains(&Widget::PaymentStatus));
        assert!(widgets.contains(&Widget::ProfitabilityWordCloud));
        assert!(widgets.contains(&Widget::LoanByBank));
        assert!(!widgets.contains(&Widget::SalesTeamPerformance));
    }

    #[test]
    fn test_widget_ids_are_unique_per_role() {
        for role in [Role::Admin, Role::Sales, Role::Operations, Role::Finance, Role::Management] {
            let widgets = role.widgets();
            let mut ids: Vec<String> = widgets.iter().map(Widget::id).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), widgets.len(), "duplicate widget id for {}", role);
        }
    }

    #[test]
    fn test_role_parsing_and_access() {
        assert_eq!("finance".parse::<Role>(), Ok(Role::Finance));
        assert!("intern".parse::<Role>().is_err());
        assert!(Role::Admin.can_view(Role::Sales));
        assert!(!Role::Sales.can_view(Role::Management));
        assert!(Role::Sales.can_view(Role::Sales));
    }
}
