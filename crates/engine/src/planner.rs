//! Farm plan wizard: form, generated plan review, save.
use api_types::planner::{Activity, GeneratedPlan, PlanRequest, SavePlan, SavedPlan};
use chrono::NaiveDate;

use crate::{EngineError, backend::PlannerApi, guard::SubmitGuard};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw form inputs, kept as typed so "adjust" can bring them back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanForm {
    pub crop: String,
    pub location: String,
    pub acreage: String,
    pub planting_date: String,
}

impl PlanForm {
    pub fn parse(&self) -> Result<PlanRequest, EngineError> {
        let crop = self.crop.trim();
        if crop.is_empty() {
            return Err(EngineError::validation("Choose a crop."));
        }
        let location = self.location.trim();
        if location.is_empty() {
            return Err(EngineError::validation("Enter the farm location."));
        }
        let acreage: f64 = self
            .acreage
            .trim()
            .parse()
            .map_err(|_| EngineError::validation("Acreage must be a number."))?;
        if !acreage.is_finite() || acreage <= 0.0 {
            return Err(EngineError::validation("Acreage must be greater than zero."));
        }
        let planting_date = parse_date(&self.planting_date)?;
        Ok(PlanRequest {
            crop: crop.to_string(),
            location: location.to_string(),
            acreage,
            planting_date,
        })
    }
}

pub fn parse_date(input: &str) -> Result<NaiveDate, EngineError> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| {
        EngineError::validation(format!("Dates look like 2025-03-01, got '{input}'."))
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanStage {
    Form,
    Review(GeneratedPlan),
}

#[derive(Debug, Clone)]
pub struct PlanWizard {
    pub form: PlanForm,
    stage: PlanStage,
    guard: SubmitGuard,
    error: Option<String>,
}

impl Default for PlanWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanWizard {
    pub fn new() -> Self {
        Self {
            form: PlanForm::default(),
            stage: PlanStage::Form,
            guard: SubmitGuard::default(),
            error: None,
        }
    }

    pub fn stage(&self) -> &PlanStage {
        &self.stage
    }

    pub fn plan(&self) -> Option<&GeneratedPlan> {
        match &self.stage {
            PlanStage::Review(plan) => Some(plan),
            PlanStage::Form => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn begin_generate(&mut self) -> Result<PlanRequest, EngineError> {
        if self.stage != PlanStage::Form {
            return Err(EngineError::validation("A plan is already under review."));
        }
        let request = self.form.parse().inspect_err(|err| {
            self.error = Some(err.alert_message());
        })?;
        self.guard.try_start()?;
        self.error = None;
        Ok(request)
    }

    /// Moves to review only when the backend produced a plan.
    pub fn finish_generate(
        &mut self,
        result: Result<GeneratedPlan, EngineError>,
    ) -> Result<(), EngineError> {
        self.guard.finish();
        match result {
            Ok(plan) => {
                tracing::info!(activities = plan.activities.len(), "plan generated");
                self.stage = PlanStage::Review(plan);
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.alert_message());
                Err(err)
            }
        }
    }

    /// Drops the generated plan and returns to the form with its inputs.
    pub fn adjust(&mut self) {
        if self.guard.is_busy() {
            return;
        }
        self.stage = PlanStage::Form;
        self.error = None;
    }

    pub fn set_planned_date(&mut self, index: usize, date: NaiveDate) -> Result<(), EngineError> {
        self.activity_mut(index)?.planned_date = date;
        Ok(())
    }

    pub fn set_deadline(&mut self, index: usize, date: NaiveDate) -> Result<(), EngineError> {
        self.activity_mut(index)?.deadline = date;
        Ok(())
    }

    fn activity_mut(&mut self, index: usize) -> Result<&mut Activity, EngineError> {
        match &mut self.stage {
            PlanStage::Review(plan) => plan
                .activities
                .get_mut(index)
                .ok_or_else(|| EngineError::validation("No such activity.")),
            PlanStage::Form => Err(EngineError::validation("Generate a plan first.")),
        }
    }

    pub fn begin_save(&mut self, farmer_id: &str) -> Result<SavePlan, EngineError> {
        let PlanStage::Review(plan) = &self.stage else {
            return Err(EngineError::validation("Generate a plan first."));
        };
        if let Some(activity) = plan.activities.iter().find(|a| a.deadline < a.planned_date) {
            let err = EngineError::validation(format!(
                "{}: the deadline is before the planned date.",
                activity.name
            ));
            self.error = Some(err.alert_message());
            return Err(err);
        }
        let body = SavePlan {
            farmer_id: farmer_id.to_string(),
            season: plan.season.clone(),
            activities: plan.activities.clone(),
        };
        self.guard.try_start()?;
        Ok(body)
    }

    /// On success the wizard resets and `on_saved` gets the stored ids.
    /// On failure the reviewed plan stays as it was.
    pub fn finish_save<F>(
        &mut self,
        result: Result<SavedPlan, EngineError>,
        on_saved: F,
    ) -> Result<(), EngineError>
    where
        F: FnOnce(SavedPlan),
    {
        self.guard.finish();
        match result {
            Ok(saved) => {
                tracing::info!(season = %saved.season_id, "plan saved");
                *self = Self::new();
                on_saved(saved);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "saving plan failed");
                self.error = Some(err.alert_message());
                Err(err)
            }
        }
    }

    pub async fn generate<A: PlannerApi + Sync + ?Sized>(
        &mut self,
        api: &A,
    ) -> Result<(), EngineError> {
        let request = self.begin_generate()?;
        let result = api.generate_plan(&request).await.map_err(EngineError::from);
        self.finish_generate(result)
    }

    pub async fn save<A, F>(&mut self, api: &A, farmer_id: &str, on_saved: F) -> Result<(), EngineError>
    where
        A: PlannerApi + Sync + ?Sized,
        F: FnOnce(SavedPlan),
    {
        let body = self.begin_save(farmer_id)?;
        let result = api.save_plan(&body).await.map_err(EngineError::from);
        self.finish_save(result, on_saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::planner::{ActivityKind, SeasonDraft};

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn form() -> PlanForm {
        PlanForm {
            crop: "Maize".to_string(),
            location: "Eldoret".to_string(),
            acreage: "2.5".to_string(),
            planting_date: "2025-03-01".to_string(),
        }
    }

    fn plan() -> GeneratedPlan {
        GeneratedPlan {
            season: SeasonDraft {
                crop: "Maize".to_string(),
                location: "Eldoret".to_string(),
                acreage: 2.5,
                start_date: date("2025-03-01"),
                expected_harvest: date("2025-07-15"),
            },
            activities: vec![Activity {
                id: None,
                season_id: None,
                name: "Planting".to_string(),
                kind: ActivityKind::Planting,
                planned_date: date("2025-03-01"),
                deadline: date("2025-03-05"),
                notes: None,
                completed: false,
                completed_at: None,
            }],
        }
    }

    fn reviewing() -> PlanWizard {
        let mut wizard = PlanWizard::new();
        wizard.form = form();
        wizard.begin_generate().unwrap();
        wizard.finish_generate(Ok(plan())).unwrap();
        wizard
    }

    #[test]
    fn form_is_parsed_into_a_request() {
        let request = form().parse().unwrap();
        assert_eq!(request.acreage, 2.5);
        assert_eq!(request.planting_date, date("2025-03-01"));
    }

    #[test]
    fn bad_acreage_stays_on_form() {
        let mut wizard = PlanWizard::new();
        wizard.form = PlanForm {
            acreage: "two".to_string(),
            ..form()
        };
        assert!(wizard.begin_generate().is_err());
        assert_eq!(wizard.stage(), &PlanStage::Form);
        assert!(!wizard.is_busy());
    }

    #[test]
    fn failed_generate_does_not_reach_review() {
        let mut wizard = PlanWizard::new();
        wizard.form = form();
        wizard.begin_generate().unwrap();
        let err = EngineError::validation("planner unavailable");
        assert!(wizard.finish_generate(Err(err)).is_err());
        assert_eq!(wizard.stage(), &PlanStage::Form);
    }

    #[test]
    fn adjust_discards_plan_and_keeps_inputs() {
        let mut wizard = reviewing();
        wizard.adjust();
        assert_eq!(wizard.stage(), &PlanStage::Form);
        assert_eq!(wizard.form, form());
    }

    #[test]
    fn deadline_before_planned_date_blocks_save() {
        let mut wizard = reviewing();
        wizard.set_deadline(0, date("2025-02-27")).unwrap();
        assert!(wizard.begin_save("f1").is_err());
        assert!(!wizard.is_busy());
    }

    #[test]
    fn edited_dates_are_sent_on_save() {
        let mut wizard = reviewing();
        wizard.set_planned_date(0, date("2025-03-02")).unwrap();
        let body = wizard.begin_save("f1").unwrap();
        assert_eq!(body.farmer_id, "f1");
        assert_eq!(body.activities[0].planned_date, date("2025-03-02"));
        assert!(wizard.set_deadline(3, date("2025-03-09")).is_err());
    }

    #[test]
    fn successful_save_resets_and_calls_back() {
        let mut wizard = reviewing();
        wizard.begin_save("f1").unwrap();
        let mut seen = None;
        wizard
            .finish_save(
                Ok(SavedPlan {
                    season_id: "s1".to_string(),
                    activity_ids: vec!["a1".to_string()],
                }),
                |saved| seen = Some(saved.season_id),
            )
            .unwrap();
        assert_eq!(seen.as_deref(), Some("s1"));
        assert_eq!(wizard.stage(), &PlanStage::Form);
        assert_eq!(wizard.form, PlanForm::default());
    }

    #[test]
    fn failed_save_keeps_review() {
        let mut wizard = reviewing();
        wizard.begin_save("f1").unwrap();
        let err = EngineError::validation("season overlaps");
        assert!(wizard.finish_save(Err(err), |_| {}).is_err());
        assert!(wizard.plan().is_some());
    }
}
