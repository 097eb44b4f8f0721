//! Season diary: seasons, their activities, completion toggles.
use api_types::planner::{Activity, ActivityUpdate, Season};

use crate::{
    EngineError,
    backend::DiaryApi,
    guard::SubmitGuard,
    listing::{Faceted, ListController},
};

impl Faceted for Season {
    fn category(&self) -> Option<&str> {
        Some(&self.crop)
    }

    fn facet(&self) -> Option<&str> {
        None
    }
}

/// Activity load for one season. Responses for a season that is no longer
/// selected are ignored, the same way listings drop stale pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFetch {
    pub seq: u64,
    pub season_id: String,
}

#[derive(Debug)]
pub struct Diary {
    pub seasons: ListController<Season>,
    selected: Option<String>,
    activities: Vec<Activity>,
    activities_seq: u64,
    loading: bool,
    guard: SubmitGuard,
}

impl Diary {
    pub fn new(farmer_id: &str, page_size: u32) -> Self {
        Self {
            seasons: ListController::new(page_size).scoped(farmer_id),
            selected: None,
            activities: Vec::new(),
            activities_seq: 0,
            loading: false,
            guard: SubmitGuard::default(),
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn select(&mut self, season_id: &str) -> ActivityFetch {
        self.focus(season_id);
        self.issue(season_id.to_string())
    }

    /// Selects a season without loading it; the next [`reload`](Self::reload)
    /// does. Loads still running for another season are dropped.
    pub fn focus(&mut self, season_id: &str) {
        if self.selected.as_deref() != Some(season_id) {
            self.activities.clear();
            self.activities_seq += 1;
            self.loading = false;
            self.selected = Some(season_id.to_string());
        }
    }

    /// Re-fetches activities of the selected season.
    pub fn reload(&mut self) -> Option<ActivityFetch> {
        let season_id = self.selected.clone()?;
        Some(self.issue(season_id))
    }

    fn issue(&mut self, season_id: String) -> ActivityFetch {
        self.activities_seq += 1;
        self.loading = true;
        ActivityFetch {
            seq: self.activities_seq,
            season_id,
        }
    }

    pub fn apply_activities(
        &mut self,
        fetch: &ActivityFetch,
        result: Result<Vec<Activity>, EngineError>,
    ) -> Result<(), EngineError> {
        if fetch.seq != self.activities_seq {
            return Ok(());
        }
        self.loading = false;
        let mut activities = result?;
        activities.sort_by_key(|a| a.planned_date);
        self.activities = activities;
        Ok(())
    }

    /// PATCH body that flips completion of the activity at `index`.
    pub fn begin_toggle(&mut self, index: usize) -> Result<(String, ActivityUpdate), EngineError> {
        let activity = self
            .activities
            .get(index)
            .ok_or_else(|| EngineError::validation("No such activity."))?;
        let Some(id) = activity.id.clone() else {
            return Err(EngineError::validation("This activity has not been saved."));
        };
        let update = ActivityUpdate {
            completed: Some(!activity.completed),
            ..ActivityUpdate::default()
        };
        self.guard.try_start()?;
        Ok((id, update))
    }

    /// After the toggle the season's activities are reloaded, success or not.
    pub fn finish_toggle(
        &mut self,
        result: Result<Activity, EngineError>,
    ) -> (Result<Activity, EngineError>, Option<ActivityFetch>) {
        self.guard.finish();
        if let Err(err) = &result {
            tracing::warn!(error = %err, "activity update failed");
        }
        (result, self.reload())
    }

    pub async fn toggle<A: DiaryApi + Sync + ?Sized>(
        &mut self,
        api: &A,
        index: usize,
    ) -> Result<Activity, EngineError> {
        let (id, update) = self.begin_toggle(index)?;
        let result = api.update_activity(&id, &update).await.map_err(EngineError::from);
        let (result, fetch) = self.finish_toggle(result);
        if let Some(fetch) = fetch {
            let loaded = api
                .season_activities(&fetch.season_id)
                .await
                .map_err(EngineError::from);
            self.apply_activities(&fetch, loaded)?;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::planner::ActivityKind;
    use chrono::NaiveDate;

    fn activity(id: &str, day: u32, completed: bool) -> Activity {
        let date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        Activity {
            id: Some(id.to_string()),
            season_id: Some("s1".to_string()),
            name: format!("Task {id}"),
            kind: ActivityKind::Weeding,
            planned_date: date,
            deadline: date,
            notes: None,
            completed,
            completed_at: None,
        }
    }

    #[test]
    fn activities_of_deselected_season_are_ignored() {
        let mut diary = Diary::new("f1", 10);
        let first = diary.select("s1");
        let second = diary.select("s2");
        diary
            .apply_activities(&first, Ok(vec![activity("a1", 1, false)]))
            .unwrap();
        assert!(diary.activities().is_empty());
        diary
            .apply_activities(&second, Ok(vec![activity("b2", 4, false), activity("b1", 2, false)]))
            .unwrap();
        assert_eq!(diary.activities()[0].id.as_deref(), Some("b1"));
    }

    #[test]
    fn focus_switches_season_without_a_request() {
        let mut diary = Diary::new("f1", 10);
        let stale = diary.select("s1");
        diary.focus("s2");
        assert_eq!(diary.selected(), Some("s2"));
        assert!(!diary.is_loading());

        diary
            .apply_activities(&stale, Ok(vec![activity("a1", 1, false)]))
            .unwrap();
        assert!(diary.activities().is_empty());

        let fetch = diary.reload().unwrap();
        assert_eq!(fetch.season_id, "s2");
        assert!(fetch.seq > stale.seq);
    }

    #[test]
    fn toggle_flips_completion_and_reloads() {
        let mut diary = Diary::new("f1", 10);
        let fetch = diary.select("s1");
        diary
            .apply_activities(&fetch, Ok(vec![activity("a1", 1, false)]))
            .unwrap();
        let (id, update) = diary.begin_toggle(0).unwrap();
        assert_eq!(id, "a1");
        assert_eq!(update.completed, Some(true));
        assert!(diary.begin_toggle(0).is_err());

        let (result, reload) = diary.finish_toggle(Ok(activity("a1", 1, true)));
        assert!(result.is_ok());
        assert_eq!(reload.map(|f| f.season_id).as_deref(), Some("s1"));
        assert!(!diary.is_busy());
    }
}
