// Project and support ticket domain models
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Project lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Lead,
    SiteSurvey,
    ProposalSent,
    Confirmed,
    UnderInstallation,
    SubmittedForSubsidy,
    Completed,
    CompletedSubsidyCredited,
    Lost,
}

impl ProjectStatus {
    /// Lifecycle order
    pub const ALL: [ProjectStatus; 9] = [
        ProjectStatus::Lead,
        ProjectStatus::SiteSurvey,
        ProjectStatus::ProposalSent,
        ProjectStatus::Confirmed,
        ProjectStatus::UnderInstallation,
        ProjectStatus::SubmittedForSubsidy,
        ProjectStatus::Completed,
        ProjectStatus::CompletedSubsidyCredited,
        ProjectStatus::Lost,
    ];

    pub const REVENUE: [ProjectStatus; 4] = [
        ProjectStatus::Confirmed,
        ProjectStatus::UnderInstallation,
        ProjectStatus::Completed,
        ProjectStatus::CompletedSubsidyCredited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Lead => "LEAD",
            ProjectStatus::SiteSurvey => "SITE_SURVEY",
            ProjectStatus::ProposalSent => "PROPOSAL_SENT",
            ProjectStatus::Confirmed => "CONFIRMED",
            ProjectStatus::UnderInstallation => "UNDER_INSTALLATION",
            ProjectStatus::SubmittedForSubsidy => "SUBMITTED_FOR_SUBSIDY",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::CompletedSubsidyCredited => "COMPLETED_SUBSIDY_CREDITED",
            ProjectStatus::Lost => "LOST",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Lead => "Lead",
            ProjectStatus::SiteSurvey => "Site Survey",
            ProjectStatus::ProposalSent => "Proposal Sent",
            ProjectStatus::Confirmed => "Confirmed",
            ProjectStatus::UnderInstallation => "Under Installation",
            ProjectStatus::SubmittedForSubsidy => "Submitted for Subsidy",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::CompletedSubsidyCredited => "Completed - Subsidy Credited",
            ProjectStatus::Lost => "Lost",
        }
    }

    /// Counts toward "Revenue": Confirmed, Under Installation, Completed, Completed-Subsidy-Credited
    pub fn is_revenue(&self) -> bool {
        Self::REVENUE.contains(self)
    }

    /// Counts toward "Pipeline": every stage except Lost
    pub fn is_pipeline(&self) -> bool {
        *self != ProjectStatus::Lost
    }

    pub fn pipeline_stages() -> Vec<ProjectStatus> {
        Self::ALL.into_iter().filter(|s| s.is_pipeline()).collect()
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown project status '{}'", s))
    }
}

/// Payment grouping used by the dashboard. Anything that is not fully or
/// partially paid, including a missing status, falls into `NotApplicable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PaymentBucket {
    #[serde(rename = "FULLY_PAID")]
    FullyPaid,
    #[serde(rename = "PARTIAL")]
    Partial,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl PaymentBucket {
    pub const ALL: [PaymentBucket; 3] = [
        PaymentBucket::FullyPaid,
        PaymentBucket::Partial,
        PaymentBucket::NotApplicable,
    ];

    pub fn classify(payment_status: Option<&str>) -> Self {
        let normalized = payment_status
            .map(|s| s.trim().to_ascii_uppercase().replace([' ', '-'], "_"))
            .unwrap_or_default();

        match normalized.as_str() {
            "FULLY_PAID" => PaymentBucket::FullyPaid,
            "PARTIAL" => PaymentBucket::Partial,
            _ => PaymentBucket::NotApplicable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentBucket::FullyPaid => "FULLY_PAID",
            PaymentBucket::Partial => "PARTIAL",
            PaymentBucket::NotApplicable => "N/A",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentBucket::FullyPaid => "Fully Paid",
            PaymentBucket::Partial => "Partial",
            PaymentBucket::NotApplicable => "N/A",
        }
    }
}

impl FromStr for PaymentBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == s)
            .ok_or_else(|| format!("unknown payment bucket '{}'", s))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub salesperson_id: i64,
    pub salesperson_name: String,
    pub status: ProjectStatus,
    pub payment_status: Option<String>,
    pub lead_source: Option<String>,
    pub order_value: BigDecimal,
    pub project_cost: BigDecimal,
    pub amount_received: BigDecimal,
    pub loan_bank: Option<String>,
    pub booked_on: NaiveDate,
}

impl Project {
    pub fn payment_bucket(&self) -> PaymentBucket {
        PaymentBucket::classify(self.payment_status.as_deref())
    }

    pub fn profit(&self) -> BigDecimal {
        &self.order_value - &self.project_cost
    }

    /// Unpaid balance, never negative
    pub fn outstanding(&self) -> BigDecimal {
        let balance = &self.order_value - &self.amount_received;
        if balance < BigDecimal::zero() {
            BigDecimal::zero()
        } else {
            balance
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "OPEN" => Ok(TicketStatus::Open),
            "IN_PROGRESS" => Ok(TicketStatus::InProgress),
            "RESOLVED" => Ok(TicketStatus::Resolved),
            "CLOSED" => Ok(TicketStatus::Closed),
            _ => Err(format!("unknown ticket status '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: i64,
    pub project_id: i64,
    pub salesperson_id: i64,
    pub status: TicketStatus,
    pub raised_on: NaiveDate,
}
