use serde::Serialize;

use super::domain::{ApplicationStatus, LoanApplication};

/// Portfolio counters shown on the farmer and creditor dashboards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub pending: usize,
    pub under_review: usize,
    pub approved: usize,
    pub rejected: usize,
    pub requested_amount: u64,
    pub approved_amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_credit_score: Option<f64>,
}

impl ApplicationStats {
    pub fn from_applications(applications: &[LoanApplication]) -> Self {
        let mut stats = ApplicationStats {
            total: applications.len(),
            ..ApplicationStats::default()
        };

        let mut score_total: u64 = 0;
        for application in applications {
            match application.status {
                ApplicationStatus::Pending => stats.pending += 1,
                ApplicationStatus::UnderReview => stats.under_review += 1,
                ApplicationStatus::Approved => {
                    stats.approved += 1;
                    let approved = application
                        .decision
                        .as_ref()
                        .and_then(|record| record.approved_amount)
                        .unwrap_or(application.request.amount);
                    stats.approved_amount = stats.approved_amount.saturating_add(approved);
                }
                ApplicationStatus::Rejected => stats.rejected += 1,
            }
            stats.requested_amount = stats
                .requested_amount
                .saturating_add(application.request.amount);
            score_total = score_total.saturating_add(u64::from(application.snapshot.credit_score));
        }

        if !applications.is_empty() {
            stats.average_credit_score = Some(score_total as f64 / applications.len() as f64);
        }

        stats
    }
}
