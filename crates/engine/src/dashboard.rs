use api_types::{dashboard::DashboardSummary, planner::Activity};
use chrono::NaiveDate;

use crate::{EngineError, Money, backend::DashboardApi};

/// Landing summary for the signed-in farmer.
#[derive(Debug, Default)]
pub struct Dashboard {
    summary: Option<DashboardSummary>,
    loading: bool,
}

impl Dashboard {
    pub fn summary(&self) -> Option<&DashboardSummary> {
        self.summary.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn balance(&self) -> Money {
        self.summary
            .as_ref()
            .map_or(Money::ZERO, |s| Money::new(s.balance_minor))
    }

    /// Open activities from `today` on, soonest first.
    pub fn upcoming(&self, today: NaiveDate, limit: usize) -> Vec<&Activity> {
        let Some(summary) = &self.summary else {
            return Vec::new();
        };
        let mut open: Vec<&Activity> = summary
            .upcoming_activities
            .iter()
            .filter(|a| !a.completed && a.deadline >= today)
            .collect();
        open.sort_by_key(|a| a.planned_date);
        open.truncate(limit);
        open
    }

    pub fn begin(&mut self) {
        self.loading = true;
    }

    /// A failed refresh keeps the previous summary on screen.
    pub fn finish(&mut self, result: Result<DashboardSummary, EngineError>) -> Result<(), EngineError> {
        self.loading = false;
        self.summary = Some(result?);
        Ok(())
    }

    pub async fn load<A: DashboardApi + Sync + ?Sized>(
        &mut self,
        api: &A,
        farmer_id: &str,
    ) -> Result<(), EngineError> {
        self.begin();
        let result = api.dashboard(farmer_id).await.map_err(EngineError::from);
        self.finish(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::planner::ActivityKind;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn activity(name: &str, planned: u32, deadline: u32, completed: bool) -> Activity {
        Activity {
            id: None,
            season_id: None,
            name: name.to_string(),
            kind: ActivityKind::Other,
            planned_date: day(planned),
            deadline: day(deadline),
            notes: None,
            completed,
            completed_at: None,
        }
    }

    #[test]
    fn upcoming_skips_done_and_overdue() {
        let mut dashboard = Dashboard::default();
        dashboard
            .finish(Ok(DashboardSummary {
                balance_minor: 12_050,
                upcoming_activities: vec![
                    activity("late", 1, 2, false),
                    activity("done", 5, 6, true),
                    activity("second", 9, 12, false),
                    activity("first", 4, 10, false),
                ],
                ..DashboardSummary::default()
            }))
            .unwrap();
        let names: Vec<_> = dashboard
            .upcoming(day(5), 5)
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, ["first", "second"]);
        assert_eq!(dashboard.balance().to_string(), "KES 120.50");
    }

    #[test]
    fn failed_refresh_keeps_summary() {
        let mut dashboard = Dashboard::default();
        dashboard.finish(Ok(DashboardSummary::default())).unwrap();
        dashboard.begin();
        assert!(dashboard.finish(Err(EngineError::NoSession)).is_err());
        assert!(dashboard.summary().is_some());
        assert!(!dashboard.is_loading());
    }
}
