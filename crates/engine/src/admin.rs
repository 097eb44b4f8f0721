//! Review queues for farmer groups and farmer registrations.
use api_types::admin::{ApprovalStatus, Decision, Farmer, Group};

use crate::{
    EngineError,
    backend::AdminApi,
    guard::SubmitGuard,
    listing::{Faceted, FetchRequest, ListController},
};

impl Faceted for Group {
    fn category(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn facet(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

impl Faceted for Farmer {
    fn category(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn facet(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

/// Records an admin can approve or reject.
pub trait Reviewable {
    fn review_id(&self) -> &str;
    fn review_status(&self) -> ApprovalStatus;
}

impl Reviewable for Group {
    fn review_id(&self) -> &str {
        &self.id
    }

    fn review_status(&self) -> ApprovalStatus {
        self.status
    }
}

impl Reviewable for Farmer {
    fn review_id(&self) -> &str {
        &self.id
    }

    fn review_status(&self) -> ApprovalStatus {
        self.status
    }
}

/// One review list plus the guard for its approve/reject actions.
#[derive(Debug)]
pub struct ReviewQueue<T> {
    pub list: ListController<T>,
    guard: SubmitGuard,
}

impl<T: Reviewable> ReviewQueue<T> {
    /// Opens on pending records, which is what an admin usually works through.
    pub fn new(page_size: u32) -> Self {
        Self {
            list: ListController::new(page_size).with_facet(ApprovalStatus::Pending.as_str()),
            guard: SubmitGuard::default(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn begin_decision(
        &mut self,
        index: usize,
        status: ApprovalStatus,
    ) -> Result<(String, Decision), EngineError> {
        if status == ApprovalStatus::Pending {
            return Err(EngineError::validation("Approve or reject."));
        }
        let item = self
            .list
            .items()
            .get(index)
            .ok_or_else(|| EngineError::validation("Nothing selected."))?;
        if item.review_status() == status {
            return Err(EngineError::validation(format!(
                "Already {}.",
                status.as_str()
            )));
        }
        let id = item.review_id().to_string();
        self.guard.try_start()?;
        Ok((id, Decision { status }))
    }

    /// Ends the decision and refetches the list when it went through.
    pub fn finish_decision<R>(
        &mut self,
        result: Result<R, EngineError>,
    ) -> Result<FetchRequest, EngineError> {
        self.guard.finish();
        match result {
            Ok(_) => Ok(self.list.refresh()),
            Err(err) => {
                tracing::warn!(error = %err, "review decision failed");
                Err(err)
            }
        }
    }
}

#[derive(Debug)]
pub struct AdminConsole {
    pub groups: ReviewQueue<Group>,
    pub farmers: ReviewQueue<Farmer>,
}

impl AdminConsole {
    pub fn new(page_size: u32) -> Self {
        Self {
            groups: ReviewQueue::new(page_size),
            farmers: ReviewQueue::new(page_size),
        }
    }

    pub async fn decide_group<A: AdminApi + Sync + ?Sized>(
        &mut self,
        api: &A,
        index: usize,
        status: ApprovalStatus,
    ) -> Result<FetchRequest, EngineError> {
        let (id, decision) = self.groups.begin_decision(index, status)?;
        let result = api.decide_group(&id, &decision).await.map_err(EngineError::from);
        self.groups.finish_decision(result)
    }

    pub async fn decide_farmer<A: AdminApi + Sync + ?Sized>(
        &mut self,
        api: &A,
        index: usize,
        status: ApprovalStatus,
    ) -> Result<FetchRequest, EngineError> {
        let (id, decision) = self.farmers.begin_decision(index, status)?;
        let result = api.decide_farmer(&id, &decision).await.map_err(EngineError::from);
        self.farmers.finish_decision(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::Paginated;

    fn group(id: &str, status: ApprovalStatus) -> Group {
        Group {
            id: id.to_string(),
            name: format!("Group {id}"),
            region: Some("Kisumu".to_string()),
            members: 12,
            status,
        }
    }

    fn loaded(groups: Vec<Group>) -> ReviewQueue<Group> {
        let mut queue = ReviewQueue::<Group>::new(10);
        let fetch = queue.list.initial_fetch();
        let total = groups.len() as u64;
        queue
            .list
            .apply(
                fetch.seq,
                Ok(Paginated {
                    data: groups,
                    total,
                    page: 1,
                    limit: 10,
                }),
            )
            .unwrap();
        queue
    }

    #[test]
    fn queue_starts_on_pending() {
        let mut queue = ReviewQueue::<Farmer>::new(10);
        assert_eq!(queue.list.filters().facet.as_deref(), Some("pending"));
        assert!(!queue.list.is_loading());

        let fetch = queue.list.initial_fetch();
        assert_eq!(fetch.seq, 1);
        assert_eq!(fetch.query.facet.as_deref(), Some("pending"));
        assert_eq!(fetch.query.page, 1);
    }

    #[test]
    fn approve_is_guarded_and_refetches() {
        let mut queue = loaded(vec![group("g1", ApprovalStatus::Pending)]);
        let (id, decision) = queue.begin_decision(0, ApprovalStatus::Approved).unwrap();
        assert_eq!(id, "g1");
        assert_eq!(decision.status, ApprovalStatus::Approved);
        assert!(matches!(
            queue.begin_decision(0, ApprovalStatus::Rejected),
            Err(EngineError::InFlight)
        ));

        let fetch = queue
            .finish_decision(Ok(group("g1", ApprovalStatus::Approved)))
            .unwrap();
        assert!(fetch.seq > 1);
        assert!(!queue.is_busy());
    }

    #[test]
    fn repeating_current_status_is_refused() {
        let mut queue = loaded(vec![group("g1", ApprovalStatus::Rejected)]);
        assert!(queue.begin_decision(0, ApprovalStatus::Rejected).is_err());
        assert!(queue.begin_decision(3, ApprovalStatus::Approved).is_err());
        assert!(!queue.is_busy());
    }
}
